//! Instrumented backend for controller tests: counts writes and can inject
//! read or delete failures or simulate daemon pods draining away.

use async_trait::async_trait;
use pkg_state::StoreError;
use pkg_state::backend::Backend;
use pkg_state::memory::MemoryStore;
use pkg_state::objects::ObjectClient;
use pkg_types::daemonset::DaemonSet;
use pkg_types::meta::ObjectMeta;
use pkg_types::pod::Pod;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy)]
pub enum DeleteFault {
    Gone,
    Unavailable,
}

#[derive(Debug, Clone, Copy)]
pub enum GetFault {
    Unavailable,
    /// The first read of an existing object is followed by another writer
    /// bumping its resource version.
    ConcurrentWrite,
}

#[derive(Default)]
pub struct TestStore {
    inner: MemoryStore,
    /// Pods disappear once they have been listed this many times.
    drain_after: Option<usize>,
    delete_fault: Option<DeleteFault>,
    get_fault: Option<GetFault>,
    raced: AtomicBool,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    pod_lists: AtomicUsize,
}

impl TestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain_after(mut self, lists: usize) -> Self {
        self.drain_after = Some(lists);
        self
    }

    pub fn fail_deletes(mut self, fault: DeleteFault) -> Self {
        self.delete_fault = Some(fault);
        self
    }

    pub fn fail_gets(mut self, fault: GetFault) -> Self {
        self.get_fault = Some(fault);
        self
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn pod_lists(&self) -> usize {
        self.pod_lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for TestStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self.get_fault {
            Some(GetFault::Unavailable) => Err(StoreError::Backend("store unavailable".to_string())),
            Some(GetFault::ConcurrentWrite) => {
                let current = self.inner.get(key).await?;
                if let Some(bytes) = &current {
                    if !self.raced.swap(true, Ordering::SeqCst) {
                        let mut obj: serde_json::Value = serde_json::from_slice(bytes)?;
                        let version = obj["metadata"]["resource_version"].as_u64().unwrap_or(0);
                        obj["metadata"]["resource_version"] = (version + 1).into();
                        self.inner.put(key, &serde_json::to_vec(&obj)?).await?;
                    }
                }
                Ok(current)
            }
            None => self.inner.get(key).await,
        }
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        match self.delete_fault {
            Some(DeleteFault::Gone) => Err(StoreError::Gone {
                kind: "DaemonSet".to_string(),
                namespace: String::new(),
                name: key.to_string(),
            }),
            Some(DeleteFault::Unavailable) => {
                Err(StoreError::Backend("store unavailable".to_string()))
            }
            None => self.inner.delete(key).await,
        }
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        if prefix.starts_with("/registry/pods/") {
            let seen = self.pod_lists.fetch_add(1, Ordering::SeqCst);
            if self.drain_after.is_some_and(|n| seen >= n) {
                for (key, _) in self.inner.list_prefix(prefix).await? {
                    self.inner.delete(&key).await?;
                }
            }
        }
        self.inner.list_prefix(prefix).await
    }
}

pub fn client_for(store: &Arc<TestStore>) -> ObjectClient {
    ObjectClient::new(store.clone())
}

pub fn daemonset(ns: &str, name: &str, app: Option<&str>) -> DaemonSet {
    let mut ds = DaemonSet {
        metadata: ObjectMeta::new(ns, name),
        ..Default::default()
    };
    if let Some(app) = app {
        ds.metadata
            .labels
            .insert("app".to_string(), app.to_string());
    }
    ds
}

pub fn pod(ns: &str, name: &str, app: &str) -> Pod {
    let mut pod = Pod {
        metadata: ObjectMeta::new(ns, name),
        ..Default::default()
    };
    pod.metadata
        .labels
        .insert("app".to_string(), app.to_string());
    pod
}
