use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::meta::{ObjectMeta, OwnerReference};

/// A named, namespaced object kept in the state store.
///
/// `Default` must yield an empty object that a mutation function can fill in.
pub trait Resource:
    Clone + PartialEq + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Kind name, e.g. `DaemonSet`.
    const KIND: &'static str;
    /// Lower-case plural used in registry keys, e.g. `daemonsets`.
    const PLURAL: &'static str;
    const API_VERSION: &'static str;

    fn meta(&self) -> &ObjectMeta;
    fn meta_mut(&mut self) -> &mut ObjectMeta;

    /// Reset store-populated data so two objects can be compared on the
    /// fields a controller manages.
    fn clear_server_fields(&mut self) {
        self.meta_mut().clear_server_fields();
    }

    /// Equality over managed fields only.
    fn managed_eq(&self, other: &Self) -> bool {
        let mut a = self.clone();
        let mut b = other.clone();
        a.clear_server_fields();
        b.clear_server_fields();
        a == b
    }

    fn owner_reference(&self) -> OwnerReference {
        let meta = self.meta();
        OwnerReference {
            api_version: Self::API_VERSION.to_string(),
            kind: Self::KIND.to_string(),
            name: meta.name.clone(),
            uid: meta.uid.clone().unwrap_or_default(),
        }
    }
}
