mod document_analyzer;
mod job_queue;
mod job_repository;
mod llm_client;
mod repository_error;
mod staging_store;
mod text_extractor;
mod user_repository;

pub use document_analyzer::{AnalysisError, AnalyzerFactory, DocumentAnalyzer};
pub use job_queue::{Delivery, JobQueue, QueueError};
pub use job_repository::JobRepository;
pub use llm_client::{ChatMessage, LlmClient, LlmClientError};
pub use repository_error::RepositoryError;
pub use staging_store::{StagingStore, StagingStoreError};
pub use text_extractor::{ExtractionError, TextExtractor};
pub use user_repository::UserRepository;
