use async_trait::async_trait;

use crate::domain::{Submitter, User, UserId};

use super::RepositoryError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Looks the submitter up by email, creating the user on first sight. A user
    /// stored without a name picks up the submitter's name.
    async fn find_or_create(&self, submitter: &Submitter) -> Result<User, RepositoryError>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
}
