use chrono::Utc;
use pkg_constants::state::{INITIAL_RESOURCE_VERSION, REGISTRY_PREFIX};
use pkg_types::resource::Resource;
use pkg_types::selector::LabelSelector;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::Backend;
use crate::error::StoreError;

/// Typed access to named, namespaced objects on top of a [`Backend`].
///
/// Objects are stored as JSON under `/registry/<plural>/<namespace>/<name>`.
/// The client owns the server-populated metadata: `create` assigns the uid,
/// the first resource version and the creation timestamp, and `update`
/// rejects writes based on a stale resource version.
#[derive(Clone)]
pub struct ObjectClient {
    backend: Arc<dyn Backend>,
}

impl ObjectClient {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    fn key<T: Resource>(namespace: &str, name: &str) -> String {
        format!("{}/{}/{}/{}", REGISTRY_PREFIX, T::PLURAL, namespace, name)
    }

    fn prefix<T: Resource>(namespace: &str) -> String {
        format!("{}/{}/{}/", REGISTRY_PREFIX, T::PLURAL, namespace)
    }

    fn not_found<T: Resource>(namespace: &str, name: &str) -> StoreError {
        StoreError::NotFound {
            kind: T::KIND.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    async fn read<T: Resource>(&self, namespace: &str, name: &str) -> Result<Option<T>, StoreError> {
        match self.backend.get(&Self::key::<T>(namespace, name)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn write<T: Resource>(&self, obj: &T) -> Result<(), StoreError> {
        let meta = obj.meta();
        let data = serde_json::to_vec(obj)?;
        self.backend
            .put(&Self::key::<T>(&meta.namespace, &meta.name), &data)
            .await
    }

    pub async fn get<T: Resource>(&self, namespace: &str, name: &str) -> Result<T, StoreError> {
        self.read(namespace, name)
            .await?
            .ok_or_else(|| Self::not_found::<T>(namespace, name))
    }

    /// All objects of kind `T` in `namespace` whose labels satisfy `selector`.
    ///
    /// Selection happens client-side over a prefix scan, so any selector the
    /// object model can express is supported regardless of the backend. An
    /// entry that does not decode fails the whole list.
    pub async fn list<T: Resource>(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<T>, StoreError> {
        let entries = self.backend.list_prefix(&Self::prefix::<T>(namespace)).await?;
        let mut items = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let obj: T = serde_json::from_slice(&value)
                .inspect_err(|e| warn!("Undecodable {} at {}: {}", T::KIND, key, e))?;
            if selector.matches(&obj.meta().labels) {
                items.push(obj);
            }
        }
        Ok(items)
    }

    /// Store a new object. Returns the stored copy with server fields set.
    pub async fn create<T: Resource>(&self, obj: &T) -> Result<T, StoreError> {
        let meta = obj.meta();
        if self.read::<T>(&meta.namespace, &meta.name).await?.is_some() {
            return Err(StoreError::AlreadyExists {
                kind: T::KIND.to_string(),
                namespace: meta.namespace.clone(),
                name: meta.name.clone(),
            });
        }
        let mut stored = obj.clone();
        let stored_meta = stored.meta_mut();
        stored_meta.uid = Some(Uuid::new_v4().to_string());
        stored_meta.resource_version = INITIAL_RESOURCE_VERSION;
        stored_meta.creation_timestamp = Some(Utc::now());
        self.write(&stored).await?;
        debug!("Created {} {}/{}", T::KIND, meta.namespace, meta.name);
        Ok(stored)
    }

    /// Replace an existing object. `obj` must carry the resource version it
    /// was read at.
    pub async fn update<T: Resource>(&self, obj: &T) -> Result<T, StoreError> {
        let meta = obj.meta();
        let current = self
            .read::<T>(&meta.namespace, &meta.name)
            .await?
            .ok_or_else(|| Self::not_found::<T>(&meta.namespace, &meta.name))?;
        let current_meta = current.meta();
        if current_meta.resource_version != meta.resource_version {
            return Err(StoreError::Conflict {
                kind: T::KIND.to_string(),
                namespace: meta.namespace.clone(),
                name: meta.name.clone(),
                expected: meta.resource_version,
                found: current_meta.resource_version,
            });
        }
        let mut stored = obj.clone();
        let stored_meta = stored.meta_mut();
        stored_meta.uid = current_meta.uid.clone();
        stored_meta.creation_timestamp = current_meta.creation_timestamp;
        stored_meta.resource_version = current_meta.resource_version + 1;
        self.write(&stored).await?;
        debug!("Updated {} {}/{}", T::KIND, meta.namespace, meta.name);
        Ok(stored)
    }

    pub async fn delete<T: Resource>(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let key = Self::key::<T>(namespace, name);
        if self.backend.get(&key).await?.is_none() {
            return Err(Self::not_found::<T>(namespace, name));
        }
        self.backend.delete(&key).await?;
        debug!("Deleted {} {}/{}", T::KIND, namespace, name);
        Ok(())
    }
}
