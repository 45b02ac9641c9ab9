//! Offline asset cache
//!
//! Serves the application shell from versioned cache partitions, falling back
//! to the network or an offline page, and handles the supplementary sync,
//! push and notification events.

pub mod clients;
pub mod events;
pub mod manager;
pub mod network;
pub mod storage;
pub mod types;

// Re-export main types
pub use clients::{ClientRegistry, Clients, WindowClient};
pub use events::{ClickOutcome, NotificationClick, PushPayload, REMINDER_TAG, SYNC_TAG};
pub use manager::{
    ActivationReport, CacheNames, CacheSettings, InstallReport, OfflineCacheManager, Strategy,
};
pub use network::{HttpNetwork, Network};
pub use storage::CacheStorage;
pub use types::{AssetRequest, AssetResponse, Destination, FetchDisposition, ResponseSource, Served};
