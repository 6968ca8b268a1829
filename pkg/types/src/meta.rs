use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// --- Owner reference ---

/// Link from a dependent object to the object that owns it, used for
/// garbage-collection linkage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub uid: String,
}

// --- Object metadata ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    #[serde(default)]
    pub owner_references: Vec<OwnerReference>,
    /// Assigned by the store on create.
    #[serde(default)]
    pub uid: Option<String>,
    /// Bumped by the store on every write; used for optimistic concurrency.
    #[serde(default)]
    pub resource_version: u64,
    #[serde(default)]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            ..Default::default()
        }
    }

    /// Reset every field that only the store is allowed to populate.
    pub fn clear_server_fields(&mut self) {
        self.uid = None;
        self.resource_version = 0;
        self.creation_timestamp = None;
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_server_fields_keeps_user_fields() {
        let mut meta = ObjectMeta::new("ns", "obj");
        meta.labels.insert("app".to_string(), "x".to_string());
        meta.uid = Some("uid-1".to_string());
        meta.resource_version = 7;
        meta.creation_timestamp = Some(Utc::now());

        meta.clear_server_fields();

        assert_eq!(meta.uid, None);
        assert_eq!(meta.resource_version, 0);
        assert_eq!(meta.creation_timestamp, None);
        assert_eq!(meta.label("app"), Some("x"));
        assert_eq!(meta.name, "obj");
    }
}
