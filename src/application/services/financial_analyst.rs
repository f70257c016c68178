use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{
    AnalysisError, AnalyzerFactory, ChatMessage, DocumentAnalyzer, LlmClient, LlmClientError,
};

use super::retrying_analyzer::{RetryPolicy, RetryingAnalyzer};

const ANALYST_PERSONA: &str = "You are a senior financial analyst. You analyze uploaded financial \
documents and give grounded, clear investment insights. Use only information found in the \
provided document and say plainly when something is uncertain or missing.";

const EXPECTED_OUTPUT: &str = "Respond with a concise financial analysis in four sections: \
Summary, Opportunities, Risks, and Recommendation. The recommendation must state a confidence \
level (low, medium or high).";

/// Single-job analyst conversation on top of a shared [`LlmClient`].
pub struct FinancialAnalyst {
    llm_client: Arc<dyn LlmClient>,
    max_document_chars: usize,
    transcript: Vec<ChatMessage>,
}

impl FinancialAnalyst {
    pub fn new(llm_client: Arc<dyn LlmClient>, max_document_chars: usize) -> Self {
        Self {
            llm_client,
            max_document_chars,
            transcript: Vec::new(),
        }
    }

    /// Messages exchanged by the most recent `analyze` call.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    fn task_prompt(&self, text: &str, query: &str) -> String {
        let document = truncate_chars(text, self.max_document_chars);
        format!(
            "Read the financial document below, then answer the user query.\n\
             Cover key performance highlights, major risks and a balanced investment view.\n\n\
             User query: {query}\n\n\
             {EXPECTED_OUTPUT}\n\n\
             --- DOCUMENT START ---\n{document}\n--- DOCUMENT END ---"
        )
    }
}

#[async_trait]
impl DocumentAnalyzer for FinancialAnalyst {
    async fn analyze(&mut self, text: &str, query: &str) -> Result<String, AnalysisError> {
        self.transcript = vec![
            ChatMessage::system(ANALYST_PERSONA),
            ChatMessage::user(self.task_prompt(text, query)),
        ];

        let analysis = self
            .llm_client
            .complete(&self.transcript)
            .await
            .map_err(AnalysisError::from)?;

        if analysis.trim().is_empty() {
            return Err(AnalysisError::InvalidResponse(
                "model returned an empty analysis".to_string(),
            ));
        }

        self.transcript.push(ChatMessage::assistant(analysis.clone()));
        Ok(analysis)
    }
}

impl From<LlmClientError> for AnalysisError {
    fn from(e: LlmClientError) -> Self {
        match e {
            LlmClientError::RateLimited(msg) => AnalysisError::RateLimited(msg),
            LlmClientError::QuotaExceeded(msg) => AnalysisError::QuotaExceeded(msg),
            LlmClientError::Unavailable(msg) => AnalysisError::Transient(msg),
            LlmClientError::InvalidResponse(msg) => AnalysisError::InvalidResponse(msg),
            LlmClientError::ApiRequestFailed(msg) | LlmClientError::Configuration(msg) => {
                AnalysisError::Rejected(msg)
            }
        }
    }
}

/// Builds one retry-wrapped [`FinancialAnalyst`] per job.
pub struct FinancialAnalystFactory {
    llm_client: Arc<dyn LlmClient>,
    retry_policy: RetryPolicy,
    max_document_chars: usize,
}

impl FinancialAnalystFactory {
    pub fn new(
        llm_client: Arc<dyn LlmClient>,
        retry_policy: RetryPolicy,
        max_document_chars: usize,
    ) -> Self {
        Self {
            llm_client,
            retry_policy,
            max_document_chars,
        }
    }
}

impl AnalyzerFactory for FinancialAnalystFactory {
    fn create(&self) -> Box<dyn DocumentAnalyzer> {
        let analyst = FinancialAnalyst::new(Arc::clone(&self.llm_client), self.max_document_chars);
        Box::new(RetryingAnalyzer::new(Box::new(analyst), self.retry_policy))
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
