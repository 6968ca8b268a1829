use async_trait::async_trait;

use crate::error::StoreError;

/// Raw key/value storage underneath the object client.
///
/// Keys are UTF-8 paths (`/registry/<kind>/<namespace>/<name>`), values are
/// JSON-encoded objects. Deleting a missing key is not an error at this
/// layer.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// All entries whose key starts with `prefix`, in key order.
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;
}
