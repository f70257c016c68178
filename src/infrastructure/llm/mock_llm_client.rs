use crate::application::ports::{ChatMessage, LlmClient, LlmClientError};

/// Offline stand-in that answers with a fixed report shape. Selected with the
/// `mock` provider.
pub struct MockLlmClient;

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmClientError> {
        let prompt_chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
        Ok(format!(
            "Summary: mock analysis of a {prompt_chars}-character prompt.\n\
             Opportunities: none identified.\n\
             Risks: none identified.\n\
             Recommendation: hold (confidence: low)."
        ))
    }
}
