use async_trait::async_trait;

/// Turns extracted document text and a user query into an analysis.
///
/// Analyzers carry per-job conversation state and are never shared between
/// jobs; an [`AnalyzerFactory`] builds a fresh one for every job.
#[async_trait]
pub trait DocumentAnalyzer: Send {
    async fn analyze(&mut self, text: &str, query: &str) -> Result<String, AnalysisError>;
}

pub trait AnalyzerFactory: Send + Sync {
    fn create(&self) -> Box<dyn DocumentAnalyzer>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("rate limited by analysis provider: {0}")]
    RateLimited(String),
    #[error("analysis quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("transient analysis failure: {0}")]
    Transient(String),
    #[error("invalid analysis response: {0}")]
    InvalidResponse(String),
    #[error("analysis request rejected: {0}")]
    Rejected(String),
}

impl AnalysisError {
    /// Only transient failures are worth another attempt; rate-limit and quota
    /// errors end the job immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, AnalysisError::Transient(_))
    }
}
