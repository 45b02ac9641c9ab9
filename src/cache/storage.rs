//! Named cache partitions

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use super::types::AssetResponse;

#[derive(Debug)]
struct Partition {
    name: String,
    entries: HashMap<String, AssetResponse>,
}

/// Ordered set of named partitions, each mapping request key to response.
/// Lookups across partitions search in creation order.
#[derive(Debug, Default)]
pub struct CacheStorage {
    partitions: RwLock<Vec<Partition>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the partition if it does not exist yet
    pub async fn open(&self, name: &str) {
        let mut partitions = self.partitions.write().await;
        if !partitions.iter().any(|p| p.name == name) {
            debug!("Creating cache partition {}", name);
            partitions.push(Partition {
                name: name.to_string(),
                entries: HashMap::new(),
            });
        }
    }

    pub async fn put(&self, name: &str, key: &str, response: AssetResponse) {
        self.put_all(name, vec![(key.to_string(), response)]).await;
    }

    pub async fn put_all(&self, name: &str, entries: Vec<(String, AssetResponse)>) {
        let mut partitions = self.partitions.write().await;
        let index = match partitions.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                partitions.push(Partition {
                    name: name.to_string(),
                    entries: HashMap::new(),
                });
                partitions.len() - 1
            }
        };
        partitions[index].entries.extend(entries);
    }

    pub async fn match_in(&self, name: &str, key: &str) -> Option<AssetResponse> {
        let partitions = self.partitions.read().await;
        partitions
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.entries.get(key).cloned())
    }

    /// First match across all partitions
    pub async fn match_any(&self, key: &str) -> Option<AssetResponse> {
        let partitions = self.partitions.read().await;
        partitions.iter().find_map(|p| p.entries.get(key).cloned())
    }

    pub async fn keys(&self) -> Vec<String> {
        let partitions = self.partitions.read().await;
        partitions.iter().map(|p| p.name.clone()).collect()
    }

    /// Drop a whole partition. Returns true if it existed.
    pub async fn delete(&self, name: &str) -> bool {
        let mut partitions = self.partitions.write().await;
        let before = partitions.len();
        partitions.retain(|p| p.name != name);
        partitions.len() != before
    }

    pub async fn entry_count(&self, name: &str) -> usize {
        let partitions = self.partitions.read().await;
        partitions
            .iter()
            .find(|p| p.name == name)
            .map_or(0, |p| p.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(text: &'static str) -> AssetResponse {
        AssetResponse::new(200, Some("text/plain"), text)
    }

    #[tokio::test]
    async fn match_any_prefers_older_partitions() {
        let storage = CacheStorage::new();
        storage.put("first", "/a", body("one")).await;
        storage.put("second", "/a", body("two")).await;

        assert_eq!(storage.match_any("/a").await, Some(body("one")));
        assert_eq!(storage.match_in("second", "/a").await, Some(body("two")));
        assert_eq!(storage.keys().await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn delete_removes_every_entry() {
        let storage = CacheStorage::new();
        storage.open("empty").await;
        storage
            .put_all(
                "old",
                vec![("/a".to_string(), body("a")), ("/b".to_string(), body("b"))],
            )
            .await;
        assert_eq!(storage.entry_count("old").await, 2);

        assert!(storage.delete("old").await);
        assert!(!storage.delete("old").await);
        assert_eq!(storage.match_any("/a").await, None);
        assert_eq!(storage.keys().await, vec!["empty"]);
    }
}
