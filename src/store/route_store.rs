//! Durable CRUD over route definitions.

use std::path::PathBuf;

use tokio::sync::RwLock;

use crate::observability::metrics;
use crate::store::{
    NewRoute, RouteDefinition, RouteDocument, RouteFile, RouteId, RoutePatch, StoreError,
};

/// The authoritative route registry.
///
/// Shared via `Arc` between the admin interface and the dispatcher. The lock
/// brackets each read-modify-write cycle on the backing file; readers take
/// the shared side so they never see a write in progress.
#[derive(Debug)]
pub struct RouteStore {
    file: RwLock<RouteFile>,
}

impl RouteStore {
    /// Open the store at `path`.
    ///
    /// Never fails. An unreadable file is logged, replaced by an empty
    /// document, and the server keeps running.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let file = RouteFile::new(path);

        match file.read_existing().await {
            Ok(Some(document)) => {
                tracing::info!(
                    path = %file.path().display(),
                    routes = document.routes.len(),
                    "Route store loaded"
                );
            }
            Ok(None) => {
                tracing::info!(path = %file.path().display(), "Creating empty route store");
                if let Err(e) = file.save(&RouteDocument::default()).await {
                    tracing::error!(error = %e, "Failed to create route store file");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read route store, starting empty");
                if let Err(e) = file.save(&RouteDocument::default()).await {
                    tracing::error!(error = %e, "Failed to persist empty route store");
                }
            }
        }

        Self {
            file: RwLock::new(file),
        }
    }

    /// All definitions in stored order.
    pub async fn list(&self) -> Result<Vec<RouteDefinition>, StoreError> {
        let file = self.file.read().await;
        Ok(file.load().await?.routes)
    }

    pub async fn get(&self, id: RouteId) -> Result<RouteDefinition, StoreError> {
        let file = self.file.read().await;
        file.load()
            .await?
            .find(id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    /// Append a new definition with the next free id.
    pub async fn create(&self, new_route: NewRoute) -> Result<RouteDefinition, StoreError> {
        let created = self
            .transact(move |document| {
                let route = new_route.into_definition(document.next_id()?)?;
                document.routes.push(route.clone());
                Ok(route)
            })
            .await?;

        tracing::info!(id = created.id, method = %created.method, path = %created.path, "Route created");
        Ok(created)
    }

    /// Replace the definition for `id` in place; `id` itself never changes.
    pub async fn update(
        &self,
        id: RouteId,
        patch: RoutePatch,
    ) -> Result<RouteDefinition, StoreError> {
        let updated = self
            .transact(move |document| {
                let slot = document.find_mut(id).ok_or(StoreError::NotFound(id))?;
                let replacement = patch.apply(slot)?;
                *slot = replacement.clone();
                Ok(replacement)
            })
            .await?;

        tracing::info!(id, method = %updated.method, path = %updated.path, "Route updated");
        Ok(updated)
    }

    /// Remove the definition for `id`. Returns whether anything was removed.
    pub async fn delete(&self, id: RouteId) -> Result<bool, StoreError> {
        let removed = self
            .transact(move |document| {
                let before = document.routes.len();
                document.routes.retain(|route| route.id != id);
                Ok(document.routes.len() != before)
            })
            .await?;

        if removed {
            tracing::info!(id, "Route deleted");
        } else {
            tracing::debug!(id, "Delete of unknown route");
        }
        Ok(removed)
    }

    /// Run `mutate` against a fresh read of the document and persist the
    /// result, all under the write lock.
    ///
    /// Nothing is written when `mutate` or the read fails.
    async fn transact<T, F>(&self, mutate: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut RouteDocument) -> Result<T, StoreError>,
    {
        let file = self.file.write().await;
        let mut document = file.load().await?;
        let outcome = mutate(&mut document)?;

        if let Err(e) = file.save(&document).await {
            tracing::error!(error = %e, "Failed to persist route store");
            metrics::record_persistence_failure();
            return Err(e.into());
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn new_route(method: &str, path: &str, status: u16) -> NewRoute {
        NewRoute {
            method: Some(method.into()),
            path: Some(path.into()),
            status: Some(status),
            response: Some(json!({ "path": path })),
            headers: None,
        }
    }

    async fn open_temp() -> (TempDir, RouteStore) {
        let dir = TempDir::new().unwrap();
        let store = RouteStore::open(dir.path().join("db.json")).await;
        (dir, store)
    }

    #[tokio::test]
    async fn ids_start_at_one_and_follow_max() {
        let (_dir, store) = open_temp().await;

        let first = store.create(new_route("GET", "/a", 200)).await.unwrap();
        let second = store.create(new_route("GET", "/b", 200)).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        store.delete(1).await.unwrap();
        let third = store.create(new_route("GET", "/c", 200)).await.unwrap();
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn id_reuses_slot_after_highest_is_deleted() {
        let (_dir, store) = open_temp().await;
        store.create(new_route("GET", "/a", 200)).await.unwrap();
        store.create(new_route("GET", "/b", 200)).await.unwrap();

        store.delete(2).await.unwrap();
        let next = store.create(new_route("GET", "/c", 200)).await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn created_route_reads_back_equal() {
        let (_dir, store) = open_temp().await;
        let created = store.create(new_route("PUT", "items/1", 202)).await.unwrap();

        assert_eq!(store.get(created.id).await.unwrap(), created);
        assert_eq!(store.list().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn create_without_required_fields_writes_nothing() {
        let (_dir, store) = open_temp().await;

        let err = store.create(NewRoute::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_preserves_id_and_position() {
        let (_dir, store) = open_temp().await;
        store.create(new_route("GET", "/a", 200)).await.unwrap();
        store.create(new_route("GET", "/b", 200)).await.unwrap();

        let patch: RoutePatch =
            serde_json::from_value(json!({ "id": 55, "path": "/renamed", "status": 500 }))
                .unwrap();
        let updated = store.update(1, patch).await.unwrap();

        assert_eq!(updated.id, 1);
        assert_eq!(updated.path, "/renamed");
        let routes = store.list().await.unwrap();
        assert_eq!(routes[0], updated);
        assert_eq!(routes[1].path, "/b");
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let (_dir, store) = open_temp().await;
        let err = store.update(9, RoutePatch::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(9)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, store) = open_temp().await;
        let created = store.create(new_route("GET", "/a", 200)).await.unwrap();

        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
        assert!(matches!(
            store.get(created.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let _store = RouteStore::open(&path).await;

        let raw = std::fs::read_to_string(&path).unwrap();
        let document: RouteDocument = serde_json::from_str(&raw).unwrap();
        assert!(document.routes.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_resets_to_empty_on_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, "[[[ definitely not a route document").unwrap();

        let store = RouteStore::open(&path).await;
        assert!(store.list().await.unwrap().is_empty());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(serde_json::from_str::<RouteDocument>(&raw).is_ok());
    }

    #[tokio::test]
    async fn unwritable_location_does_not_abort_open() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "regular file").unwrap();

        let store = RouteStore::open(blocker.join("db.json")).await;
        let err = store.create(new_route("GET", "/a", 200)).await.unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
    }

    #[tokio::test]
    async fn external_writes_are_observed() {
        let (dir, store) = open_temp().await;
        store.create(new_route("GET", "/a", 200)).await.unwrap();

        let external = RouteFile::new(dir.path().join("db.json"));
        let mut document = external.load().await.unwrap();
        document.routes[0].status = 204;
        external.save(&document).await.unwrap();

        assert_eq!(store.get(1).await.unwrap().status, 204);
        let next = store.create(new_route("GET", "/b", 200)).await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let (_dir, store) = open_temp().await;
        let store = Arc::new(store);

        let handles: Vec<_> = (0..25)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create(new_route("GET", &format!("/r{i}"), 200))
                        .await
                        .unwrap()
                        .id
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();

        assert_eq!(ids, (1..=25).collect::<Vec<_>>());
        assert_eq!(store.list().await.unwrap().len(), 25);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_update_and_delete_both_persist() {
        for _ in 0..20 {
            let (dir, store) = open_temp().await;
            let store = Arc::new(store);
            for path in ["/a", "/b", "/c"] {
                store.create(new_route("GET", path, 200)).await.unwrap();
            }

            let updater = {
                let store = store.clone();
                tokio::spawn(async move {
                    let patch: RoutePatch =
                        serde_json::from_value(json!({ "status": 418 })).unwrap();
                    store.update(2, patch).await.unwrap()
                })
            };
            let deleter = {
                let store = store.clone();
                tokio::spawn(async move { store.delete(3).await.unwrap() })
            };

            assert_eq!(updater.await.unwrap().status, 418);
            assert!(deleter.await.unwrap());

            let reopened = RouteStore::open(dir.path().join("db.json")).await;
            let routes = reopened.list().await.unwrap();
            let ids: Vec<_> = routes.iter().map(|route| route.id).collect();
            assert_eq!(ids, vec![1, 2]);
            assert_eq!(routes[1].status, 418);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_update_and_delete_on_same_id_serialize() {
        for _ in 0..20 {
            let (_dir, store) = open_temp().await;
            let store = Arc::new(store);
            store.create(new_route("GET", "/a", 200)).await.unwrap();
            store.create(new_route("GET", "/b", 200)).await.unwrap();

            let updater = {
                let store = store.clone();
                tokio::spawn(async move {
                    let patch: RoutePatch =
                        serde_json::from_value(json!({ "status": 503 })).unwrap();
                    store.update(1, patch).await
                })
            };
            let deleter = {
                let store = store.clone();
                tokio::spawn(async move { store.delete(1).await.unwrap() })
            };

            let updated = updater.await.unwrap();
            assert!(deleter.await.unwrap());

            // Either the update ran first and was then deleted, or it found
            // nothing. The deletion always wins and `/b` is untouched.
            match updated {
                Ok(route) => assert_eq!(route.status, 503),
                Err(err) => assert!(matches!(err, StoreError::NotFound(1))),
            }
            let routes = store.list().await.unwrap();
            assert_eq!(routes.len(), 1);
            assert_eq!(routes[0].id, 2);
            assert_eq!(routes[0].status, 200);
        }
    }

    #[tokio::test]
    async fn reopened_store_sees_same_collection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let store = RouteStore::open(&path).await;
        store.create(new_route("GET", "/a", 200)).await.unwrap();
        store.create(new_route("DELETE", "b", 204)).await.unwrap();
        let before = store.list().await.unwrap();
        drop(store);

        let reopened = RouteStore::open(&path).await;
        assert_eq!(reopened.list().await.unwrap(), before);
    }
}
