pub mod config;
pub mod handlers;
pub mod router;
pub mod shutdown;
pub mod state;

pub use config::{Environment, Settings};
pub use router::create_router;
pub use shutdown::shutdown_signal;
pub use state::AppState;
