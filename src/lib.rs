//! Pomodoro Shell - a Pomodoro timer host with an offline-first asset cache
//!
//! The timer state machine persists its progress after every change and
//! restores it at startup. The offline cache keeps the application shell
//! servable when the network is gone.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod notify;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::{create_router, ServerContext};
pub use cache::OfflineCacheManager;
pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
pub use utils::signals::shutdown_signal;
