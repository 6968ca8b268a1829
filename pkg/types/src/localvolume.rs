//! Fleet definitions: the user-facing objects that decide which nodes run
//! the diskmaker and which storage classes it provisions.

use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;
use crate::pod::{NodeSelector, Toleration};
use crate::resource::Resource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeMode {
    #[default]
    Filesystem,
    Block,
}

impl std::fmt::Display for VolumeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VolumeMode::Filesystem => write!(f, "Filesystem"),
            VolumeMode::Block => write!(f, "Block"),
        }
    }
}

// --- LocalVolume ---

/// Explicit device list for one storage class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageClassDevice {
    pub storage_class_name: String,
    #[serde(default)]
    pub volume_mode: VolumeMode,
    #[serde(default)]
    pub fs_type: String,
    #[serde(default)]
    pub device_paths: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalVolumeSpec {
    /// `None` selects every node
    #[serde(default)]
    pub node_selector: Option<NodeSelector>,
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
    #[serde(default)]
    pub storage_class_devices: Vec<StorageClassDevice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalVolume {
    pub metadata: ObjectMeta,
    pub spec: LocalVolumeSpec,
}

impl Resource for LocalVolume {
    const KIND: &'static str = "LocalVolume";
    const PLURAL: &'static str = "localvolumes";
    const API_VERSION: &'static str = "local.storage.openshift.io/v1";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

// --- LocalVolumeSet ---

/// Device discovery rule: every matching disk on a selected node becomes a
/// volume of `storage_class_name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalVolumeSetSpec {
    pub storage_class_name: String,
    #[serde(default)]
    pub volume_mode: VolumeMode,
    #[serde(default)]
    pub fs_type: String,
    #[serde(default)]
    pub node_selector: Option<NodeSelector>,
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalVolumeSet {
    pub metadata: ObjectMeta,
    pub spec: LocalVolumeSetSpec,
}

impl Resource for LocalVolumeSet {
    const KIND: &'static str = "LocalVolumeSet";
    const PLURAL: &'static str = "localvolumesets";
    const API_VERSION: &'static str = "local.storage.openshift.io/v1alpha1";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}
