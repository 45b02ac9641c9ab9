//! Host environment signals (connectivity, installability)

use serde::Serialize;

/// Events the host environment pushes into the application
pub trait HostSignals: Send + Sync {
    fn on_connectivity_change(&self, online: bool);
    fn on_installable(&self);
}

/// Last known host environment flags, shown by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostState {
    pub online: bool,
    pub installable: bool,
}

impl HostState {
    pub fn new() -> Self {
        Self {
            online: true,
            installable: false,
        }
    }
}

impl Default for HostState {
    fn default() -> Self {
        Self::new()
    }
}
