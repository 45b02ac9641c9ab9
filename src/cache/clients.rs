//! Open application windows controlled by the cache manager

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex,
};

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowClient {
    pub id: u64,
    pub url: String,
    pub focused: bool,
    pub controlled: bool,
}

/// Window management capability offered by the host
#[async_trait]
pub trait Clients: Send + Sync {
    async fn windows(&self) -> Vec<WindowClient>;
    async fn focus(&self, id: u64) -> Option<WindowClient>;
    async fn open_window(&self, url: &Url) -> Option<WindowClient>;
    /// Take control of every open window; returns how many were claimed
    async fn claim(&self) -> usize;
}

/// Oldest windows are forgotten past this many
pub const MAX_CLIENTS: usize = 32;

/// In-memory record of the windows the host has served
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<Vec<WindowClient>>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a page the host navigated to. Pages are keyed by URL without
    /// query or fragment; re-registering one returns the existing client.
    pub fn register(&self, url: &Url) -> WindowClient {
        let mut page = url.clone();
        page.set_query(None);
        page.set_fragment(None);

        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = clients.iter().find(|c| c.url == page.as_str()) {
            return existing.clone();
        }
        if clients.len() >= MAX_CLIENTS {
            let evicted = clients.remove(0);
            debug!("Forgetting window {} at {}", evicted.id, evicted.url);
        }
        let client = WindowClient {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            url: page.to_string(),
            focused: false,
            controlled: false,
        };
        clients.push(client.clone());
        client
    }

    pub fn len(&self) -> usize {
        self.clients.lock().map(|clients| clients.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Clients for ClientRegistry {
    async fn windows(&self) -> Vec<WindowClient> {
        self.clients
            .lock()
            .map(|clients| clients.clone())
            .unwrap_or_default()
    }

    async fn focus(&self, id: u64) -> Option<WindowClient> {
        let mut clients = self.clients.lock().ok()?;
        if !clients.iter().any(|c| c.id == id) {
            return None;
        }
        for client in clients.iter_mut() {
            client.focused = client.id == id;
        }
        clients.iter().find(|c| c.id == id).cloned()
    }

    async fn open_window(&self, url: &Url) -> Option<WindowClient> {
        info!("Opening window at {}", url);
        let mut client = self.register(url);
        client.focused = true;
        client.controlled = true;
        // The window shows the full target even though it is tracked by page.
        client.url = url.to_string();

        let mut clients = self.clients.lock().ok()?;
        for existing in clients.iter_mut() {
            existing.focused = existing.id == client.id;
            if existing.id == client.id {
                existing.controlled = true;
            }
        }
        Some(client)
    }

    async fn claim(&self) -> usize {
        let Ok(mut clients) = self.clients.lock() else {
            return 0;
        };
        for client in clients.iter_mut() {
            client.controlled = true;
        }
        clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(path: &str) -> Url {
        Url::parse("http://localhost:3000").unwrap().join(path).unwrap()
    }

    #[test]
    fn query_variants_share_one_client() {
        let registry = ClientRegistry::new();

        let first = registry.register(&page("/settings?tab=1"));
        let second = registry.register(&page("/settings?tab=2#top"));

        assert_eq!(first.id, second.id);
        assert_eq!(first.url, "http://localhost:3000/settings");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_is_bounded() {
        let registry = ClientRegistry::new();

        for i in 0..MAX_CLIENTS + 10 {
            registry.register(&page(&format!("/page/{i}")));
        }

        assert_eq!(registry.len(), MAX_CLIENTS);
        let newest = registry.register(&page(&format!("/page/{}", MAX_CLIENTS + 9)));
        assert_eq!(newest.id as usize, MAX_CLIENTS + 10);
    }

    #[tokio::test]
    async fn focus_marks_only_one_window() {
        let registry = ClientRegistry::new();
        let a = registry.register(&page("/"));
        let b = registry.register(&page("/stats"));

        registry.focus(b.id).await.unwrap();

        let windows = registry.windows().await;
        assert!(!windows.iter().find(|c| c.id == a.id).unwrap().focused);
        assert!(windows.iter().find(|c| c.id == b.id).unwrap().focused);
    }
}
