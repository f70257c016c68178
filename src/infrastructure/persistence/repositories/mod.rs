mod memory_repository;
mod pg_job_repository;
mod pg_user_repository;

pub use memory_repository::{InMemoryJobRepository, InMemoryUserRepository};
pub use pg_job_repository::PgJobRepository;
pub use pg_user_repository::PgUserRepository;
