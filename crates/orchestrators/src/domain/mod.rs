//! Domain-layer orchestrators: stateless business workflows

pub mod content_analysis;
pub mod fallback_analysis;

pub use content_analysis::{ContentAnalysisOrchestrator, ContentAnalyzer, CONTENT_ANALYSIS};
pub use fallback_analysis::{FallbackAnalysisOrchestrator, FALLBACK_ANALYSIS};
