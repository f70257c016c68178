mod pg_pool;
mod repositories;

pub use repositories::InMemoryJobRepository;
pub use repositories::InMemoryUserRepository;
pub use repositories::PgJobRepository;
pub use repositories::PgUserRepository;

pub use pg_pool::{create_pool, run_migrations};
