//! Lightweight content analysis used when richer analyzers are unreachable
//!
//! Everything here is computed locally from the URL and whatever text the
//! caller supplied, so it never depends on an external collaborator.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use url::Url;

use common::{Error, Layer, OrchestrationType, Outcome, Params, Result};
use orchestrator_core::{OrchestrationContext, Orchestrator};

/// Registry name of [`FallbackAnalysisOrchestrator`]
pub const FALLBACK_ANALYSIS: &str = "fallback-analysis";

const MAX_KEYWORDS: usize = 5;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "her", "was", "one", "our",
    "out", "his", "has", "had", "how", "its", "who", "did", "get", "may", "him", "she", "too", "use",
    "this", "that", "with", "have", "from", "they", "will", "would", "there", "their", "what",
    "about", "which", "when", "your", "were", "been", "than", "then", "them", "into", "just", "also",
    "www", "com", "http", "https", "html", "watch",
];

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "amazing", "love", "best", "awesome", "happy", "helpful", "win",
    "success", "improve", "improved", "fantastic", "like", "enjoy", "recommend", "positive",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "hate", "worst", "poor", "sad", "broken", "fail", "failure", "bug",
    "problem", "angry", "negative", "wrong", "useless", "scam", "disappointing",
];

/// Content platform inferred from the URL host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Youtube,
    Twitter,
    Reddit,
    Tiktok,
    Instagram,
    Web,
}

impl Platform {
    pub fn detect(url: &Url) -> Self {
        let host = url.host_str().unwrap_or_default().to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        let matches = |domain: &str| host == domain || host.ends_with(&format!(".{}", domain));

        if matches("youtube.com") || host == "youtu.be" {
            Platform::Youtube
        } else if matches("twitter.com") || matches("x.com") {
            Platform::Twitter
        } else if matches("reddit.com") || host == "redd.it" {
            Platform::Reddit
        } else if matches("tiktok.com") {
            Platform::Tiktok
        } else if matches("instagram.com") {
            Platform::Instagram
        } else {
            Platform::Web
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Youtube => "youtube",
            Platform::Twitter => "twitter",
            Platform::Reddit => "reddit",
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Web => "web",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

/// Word-list sentiment, score in `[-1, 1]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub score: f64,
    pub positive_hits: usize,
    pub negative_hits: usize,
}

/// Result payload of a fallback analysis
#[derive(Debug, Clone, Serialize)]
pub struct ContentAnalysis {
    pub url: String,
    pub platform: Platform,
    pub title: Option<String>,
    pub word_count: usize,
    pub keywords: Vec<String>,
    pub sentiment: Sentiment,
    pub analysis_mode: &'static str,
    pub analyzed_at: DateTime<Utc>,
}

/// Parses and checks a content URL; only http(s) URLs with a host are accepted
pub fn parse_content_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::Validation(format!("invalid url '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        "http" | "https" => Err(Error::Validation(format!("url '{}' has no host", raw))),
        scheme => Err(Error::Validation(format!("unsupported url scheme '{}'", scheme))),
    }
}

/// Runs the local analysis
///
/// Without any supplied text the URL path segments stand in for the content.
pub fn analyze(url: &Url, title: Option<&str>, content: Option<&str>) -> ContentAnalysis {
    let mut text = String::new();
    for part in [title, content].into_iter().flatten() {
        text.push_str(part);
        text.push(' ');
    }
    if text.trim().is_empty() {
        text = url.path().replace(['/', '-', '_', '.'], " ");
    }

    let words = tokenize(&text);

    ContentAnalysis {
        url: url.to_string(),
        platform: Platform::detect(url),
        title: title.map(str::to_string),
        word_count: words.len(),
        keywords: top_keywords(&words, MAX_KEYWORDS),
        sentiment: sentiment(&words),
        analysis_mode: "fallback",
        analyzed_at: Utc::now(),
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|word| word.trim_matches('\'').to_lowercase())
        .filter(|word| !word.is_empty())
        .collect()
}

fn top_keywords(words: &[String], limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in words {
        if word.chars().count() < 3 || STOPWORDS.contains(&word.as_str()) {
            continue;
        }
        if word.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        *counts.entry(word.as_str()).or_default() += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(limit).map(|(word, _)| word.to_string()).collect()
}

fn sentiment(words: &[String]) -> Sentiment {
    let positive_hits = words.iter().filter(|w| POSITIVE_WORDS.contains(&w.as_str())).count();
    let negative_hits = words.iter().filter(|w| NEGATIVE_WORDS.contains(&w.as_str())).count();
    let total = positive_hits + negative_hits;

    let score = if total == 0 {
        0.0
    } else {
        (positive_hits as f64 - negative_hits as f64) / total as f64
    };

    let label = if score > 0.2 {
        SentimentLabel::Positive
    } else if score < -0.2 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };

    Sentiment {
        label,
        score,
        positive_hits,
        negative_hits,
    }
}

/// Stateless domain orchestrator producing a [`ContentAnalysis`]
///
/// Params: `url` (required), `title` and `content` (optional).
#[derive(Debug, Default)]
pub struct FallbackAnalysisOrchestrator;

impl FallbackAnalysisOrchestrator {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, params: &Params) -> Result<serde_json::Value> {
        let url = parse_content_url(params.require_str("url")?)?;
        let analysis = analyze(&url, params.get_str("title"), params.get_str("content"));
        debug!(
            platform = %analysis.platform,
            word_count = analysis.word_count,
            "Fallback analysis complete"
        );
        Ok(serde_json::to_value(analysis)?)
    }
}

#[async_trait]
impl Orchestrator for FallbackAnalysisOrchestrator {
    fn name(&self) -> &str {
        FALLBACK_ANALYSIS
    }

    fn layer(&self) -> Layer {
        Layer::Domain
    }

    fn orchestration_type(&self) -> OrchestrationType {
        OrchestrationType::BusinessLogic
    }

    async fn orchestrate(&self, _context: &OrchestrationContext, params: &Params) -> Outcome {
        self.run(params).into()
    }

    fn can_orchestrate(&self, _context: &OrchestrationContext, params: &Params) -> bool {
        params
            .get_str("url")
            .map(|raw| parse_content_url(raw).is_ok())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ErrorCategory;
    use serde_json::json;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_platform_detection() {
        assert_eq!(Platform::detect(&url("https://www.youtube.com/watch?v=abc")), Platform::Youtube);
        assert_eq!(Platform::detect(&url("https://youtu.be/abc")), Platform::Youtube);
        assert_eq!(Platform::detect(&url("https://x.com/someone/status/1")), Platform::Twitter);
        assert_eq!(Platform::detect(&url("https://mobile.twitter.com/a")), Platform::Twitter);
        assert_eq!(Platform::detect(&url("https://old.reddit.com/r/rust")), Platform::Reddit);
        assert_eq!(Platform::detect(&url("https://www.tiktok.com/@a/video/1")), Platform::Tiktok);
        assert_eq!(Platform::detect(&url("https://instagram.com/p/1")), Platform::Instagram);
        assert_eq!(Platform::detect(&url("https://notx.com/page")), Platform::Web);
        assert_eq!(Platform::detect(&url("http://x")), Platform::Web);
    }

    #[test]
    fn test_url_validation() {
        assert!(parse_content_url("http://x").is_ok());
        assert!(matches!(parse_content_url("not a url"), Err(Error::Validation(_))));
        assert!(matches!(parse_content_url("ftp://files.example.com/a"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_keywords_and_sentiment() {
        let analysis = analyze(
            &url("https://blog.example.com/post"),
            Some("Async Rust runtimes"),
            Some("Rust async runtimes are great. I love async Rust, the tooling is excellent."),
        );

        assert_eq!(analysis.platform, Platform::Web);
        assert_eq!(analysis.word_count, 16);
        assert_eq!(analysis.keywords[..3], ["async", "rust", "runtimes"]);
        assert_eq!(analysis.sentiment.label, SentimentLabel::Positive);
        assert_eq!(analysis.sentiment.positive_hits, 3);
        assert_eq!(analysis.analysis_mode, "fallback");
    }

    #[test]
    fn test_url_path_used_without_text() {
        let analysis = analyze(&url("https://example.com/terrible-broken-release"), None, None);
        assert_eq!(analysis.word_count, 3);
        assert_eq!(analysis.sentiment.label, SentimentLabel::Negative);
        assert!(analysis.keywords.contains(&"release".to_string()));
    }

    #[tokio::test]
    async fn test_orchestrate() {
        let orchestrator = FallbackAnalysisOrchestrator::new();
        let context = OrchestrationContext::new("tenant");

        let outcome = orchestrator
            .orchestrate(&context, &Params::new().with("url", "http://x"))
            .await;
        let data = outcome.data().unwrap();
        assert_eq!(data["analysis_mode"], json!("fallback"));
        assert_eq!(data["platform"], json!("web"));

        let missing = orchestrator.orchestrate(&context, &Params::new()).await;
        assert_eq!(missing.error_category(), Some(ErrorCategory::Validation));

        assert!(orchestrator.can_orchestrate(&context, &Params::new().with("url", "https://a.io")));
        assert!(!orchestrator.can_orchestrate(&context, &Params::new().with("url", "nope")));
    }
}
