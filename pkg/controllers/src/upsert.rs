use pkg_state::objects::ObjectClient;
use pkg_types::meta::ObjectMeta;
use pkg_types::resource::Resource;
use std::fmt;

use crate::error::ReconcileError;

/// What `create_or_update` did to the stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    Unchanged,
    Created,
    Updated,
}

impl OperationResult {
    pub fn changed(self) -> bool {
        self != OperationResult::Unchanged
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationResult::Unchanged => write!(f, "unchanged"),
            OperationResult::Created => write!(f, "created"),
            OperationResult::Updated => write!(f, "updated"),
        }
    }
}

/// Fetch `namespace/name` (or start from an empty object carrying that
/// identity), apply `mutate`, and write back only if a managed field changed.
///
/// `mutate` must derive the object from its captured inputs alone; it may
/// not rename the object. Fetch errors other than not-found and write
/// conflicts are returned as-is, the next pass retries.
pub async fn create_or_update<T, F>(
    client: &ObjectClient,
    namespace: &str,
    name: &str,
    mutate: F,
) -> Result<(T, OperationResult), ReconcileError>
where
    T: Resource,
    F: FnOnce(&mut T) -> Result<(), ReconcileError>,
{
    let (mut obj, exists) = match client.get::<T>(namespace, name).await {
        Ok(obj) => (obj, true),
        Err(e) if e.is_not_found() => {
            let mut obj = T::default();
            *obj.meta_mut() = ObjectMeta::new(namespace, name);
            (obj, false)
        }
        Err(e) => return Err(e.into()),
    };

    let before = obj.clone();
    mutate(&mut obj)?;

    let meta = obj.meta();
    if meta.namespace != namespace || meta.name != name {
        return Err(ReconcileError::IdentityChanged {
            kind: T::KIND.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
    }

    if !exists {
        let stored = client.create(&obj).await?;
        return Ok((stored, OperationResult::Created));
    }
    if before.managed_eq(&obj) {
        return Ok((obj, OperationResult::Unchanged));
    }
    let stored = client.update(&obj).await?;
    Ok((stored, OperationResult::Updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{GetFault, TestStore, client_for};
    use pkg_state::StoreError;
    use pkg_types::configmap::ConfigMap;
    use std::sync::Arc;

    fn set_x(value: &'static str) -> impl FnOnce(&mut ConfigMap) -> Result<(), ReconcileError> {
        move |cm| {
            cm.data.insert("x".to_string(), value.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn absent_object_is_created() {
        let store = Arc::new(TestStore::new());
        let client = client_for(&store);

        let (cm, op) = create_or_update::<ConfigMap, _>(&client, "ns", "cm", set_x("1"))
            .await
            .unwrap();
        assert_eq!(op, OperationResult::Created);
        assert_eq!(cm.data.get("x").map(String::as_str), Some("1"));

        let stored: ConfigMap = client.get("ns", "cm").await.unwrap();
        assert_eq!(stored.data.get("x").map(String::as_str), Some("1"));
        assert_eq!(store.puts(), 1);
    }

    #[tokio::test]
    async fn identical_mutation_issues_no_write() {
        let store = Arc::new(TestStore::new());
        let client = client_for(&store);
        create_or_update::<ConfigMap, _>(&client, "ns", "cm", set_x("1"))
            .await
            .unwrap();
        let writes = store.puts();

        let (_, op) = create_or_update::<ConfigMap, _>(&client, "ns", "cm", set_x("1"))
            .await
            .unwrap();
        assert_eq!(op, OperationResult::Unchanged);
        assert!(!op.changed());
        assert_eq!(store.puts(), writes);
    }

    #[tokio::test]
    async fn changed_mutation_updates() {
        let store = Arc::new(TestStore::new());
        let client = client_for(&store);
        create_or_update::<ConfigMap, _>(&client, "ns", "cm", set_x("1"))
            .await
            .unwrap();

        let (cm, op) = create_or_update::<ConfigMap, _>(&client, "ns", "cm", set_x("2"))
            .await
            .unwrap();
        assert_eq!(op, OperationResult::Updated);
        assert_eq!(cm.metadata.resource_version, 2);

        let stored: ConfigMap = client.get("ns", "cm").await.unwrap();
        assert_eq!(stored.data.get("x").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn renaming_mutation_is_rejected() {
        let store = Arc::new(TestStore::new());
        let client = client_for(&store);

        let err = create_or_update::<ConfigMap, _>(&client, "ns", "cm", |cm| {
            cm.metadata.name = "other".to_string();
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ReconcileError::IdentityChanged { .. }));
        assert_eq!(store.puts(), 0);
    }

    #[tokio::test]
    async fn mutation_errors_abort_without_writing() {
        let store = Arc::new(TestStore::new());
        let client = client_for(&store);

        let err = create_or_update::<ConfigMap, _>(&client, "ns", "cm", |_| {
            Err(ReconcileError::Render {
                what: "payload".to_string(),
                message: "bad".to_string(),
            })
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ReconcileError::Render { .. }));
        assert_eq!(store.puts(), 0);
    }

    #[tokio::test]
    async fn fetch_failure_propagates_without_writing() {
        let store = Arc::new(TestStore::new().fail_gets(GetFault::Unavailable));
        let client = client_for(&store);

        let err = create_or_update::<ConfigMap, _>(&client, "ns", "cm", set_x("1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Store(StoreError::Backend(_))));
        assert_eq!(store.puts(), 0);
    }

    #[tokio::test]
    async fn concurrent_write_conflict_propagates() {
        let store = Arc::new(TestStore::new().fail_gets(GetFault::ConcurrentWrite));
        let client = client_for(&store);
        client
            .create(&ConfigMap {
                metadata: ObjectMeta::new("ns", "cm"),
                ..Default::default()
            })
            .await
            .unwrap();
        let writes = store.puts();

        let err = create_or_update::<ConfigMap, _>(&client, "ns", "cm", set_x("2"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Store(StoreError::Conflict {
                expected: 1,
                found: 2,
                ..
            })
        ));
        assert_eq!(store.puts(), writes);

        let stored: ConfigMap = client.get("ns", "cm").await.unwrap();
        assert_eq!(stored.metadata.resource_version, 2);
        assert!(stored.data.is_empty());
    }
}
