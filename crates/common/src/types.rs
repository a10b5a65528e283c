//! Common types for the orchestration framework
//!
//! This module defines the closed enumerations shared by every orchestrator:
//! the layer taxonomy, the orchestration type and the error taxonomy.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// Why an orchestrator exists, and therefore which lifecycle shape to expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Business workflows and task coordination, near-stateless
    Domain,
    /// Cross-component coordination, may own a coordination loop
    Application,
    /// Resilience, health and telemetry, owns background loops
    Infrastructure,
}

impl Layer {
    /// All layers, ordered from business logic down to infrastructure
    pub const ALL: [Layer; 3] = [Layer::Domain, Layer::Application, Layer::Infrastructure];
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Domain => write!(f, "domain"),
            Layer::Application => write!(f, "application"),
            Layer::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "domain" => Ok(Layer::Domain),
            "application" => Ok(Layer::Application),
            "infrastructure" => Ok(Layer::Infrastructure),
            _ => Err(format!("Unknown layer: {}", s)),
        }
    }
}

/// Coordination style of an orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationType {
    Sequential,
    Parallel,
    Hierarchical,
    Adaptive,
    Feedback,
    Monitoring,
    Coordination,
    Lifecycle,
    BusinessLogic,
}

impl fmt::Display for OrchestrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrchestrationType::Sequential => "sequential",
            OrchestrationType::Parallel => "parallel",
            OrchestrationType::Hierarchical => "hierarchical",
            OrchestrationType::Adaptive => "adaptive",
            OrchestrationType::Feedback => "feedback",
            OrchestrationType::Monitoring => "monitoring",
            OrchestrationType::Coordination => "coordination",
            OrchestrationType::Lifecycle => "lifecycle",
            OrchestrationType::BusinessLogic => "business_logic",
        };
        f.write_str(name)
    }
}

impl FromStr for OrchestrationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "sequential" => Ok(OrchestrationType::Sequential),
            "parallel" => Ok(OrchestrationType::Parallel),
            "hierarchical" => Ok(OrchestrationType::Hierarchical),
            "adaptive" => Ok(OrchestrationType::Adaptive),
            "feedback" => Ok(OrchestrationType::Feedback),
            "monitoring" => Ok(OrchestrationType::Monitoring),
            "coordination" => Ok(OrchestrationType::Coordination),
            "lifecycle" => Ok(OrchestrationType::Lifecycle),
            "business_logic" | "businesslogic" => Ok(OrchestrationType::BusinessLogic),
            _ => Err(format!("Unknown orchestration type: {}", s)),
        }
    }
}

/// Closed error taxonomy carried by failed outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad or unknown operation or parameters
    Validation,
    /// Unknown orchestrator name
    NotFound,
    /// Bounded wait exceeded
    Timeout,
    /// A required collaborator could not be reached
    Unavailable,
    /// Programming fault, runaway recursion or a panic in an orchestrator body
    Internal,
}

impl ErrorCategory {
    /// Stable lowercase name used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Unavailable => "unavailable",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "validation" => Ok(ErrorCategory::Validation),
            "not_found" | "notfound" => Ok(ErrorCategory::NotFound),
            "timeout" => Ok(ErrorCategory::Timeout),
            "unavailable" => Ok(ErrorCategory::Unavailable),
            "internal" => Ok(ErrorCategory::Internal),
            _ => Err(format!("Unknown error category: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_parse_and_display() {
        for layer in Layer::ALL {
            assert_eq!(layer.to_string().parse::<Layer>().unwrap(), layer);
        }
        assert_eq!("Infrastructure".parse::<Layer>().unwrap(), Layer::Infrastructure);
        assert!("transport".parse::<Layer>().is_err());
    }

    #[test]
    fn test_orchestration_type_parse() {
        assert_eq!(
            "business-logic".parse::<OrchestrationType>().unwrap(),
            OrchestrationType::BusinessLogic
        );
        assert_eq!(OrchestrationType::BusinessLogic.to_string(), "business_logic");
        assert!("random".parse::<OrchestrationType>().is_err());
    }

    #[test]
    fn test_error_category_serde() {
        let json = serde_json::to_string(&ErrorCategory::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
        let parsed: ErrorCategory = serde_json::from_str("\"unavailable\"").unwrap();
        assert_eq!(parsed, ErrorCategory::Unavailable);
    }
}
