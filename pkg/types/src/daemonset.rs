use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::meta::ObjectMeta;
use crate::pod::PodSpec;
use crate::resource::Resource;

// --- DaemonSet status ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonSetStatus {
    pub desired_number_scheduled: u32,
    pub current_number_scheduled: u32,
    pub number_ready: u32,
}

// --- Pod template ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodTemplate {
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Changing a template annotation rolls every daemon pod.
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    pub spec: PodSpec,
}

// --- DaemonSet spec ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonSetSpec {
    /// Pods carrying all of these labels belong to the daemon set
    #[serde(default)]
    pub selector: HashMap<String, String>,
    pub template: PodTemplate,
}

// --- DaemonSet ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaemonSet {
    pub metadata: ObjectMeta,
    pub spec: DaemonSetSpec,
    #[serde(default)]
    pub status: DaemonSetStatus,
}

impl Resource for DaemonSet {
    const KIND: &'static str = "DaemonSet";
    const PLURAL: &'static str = "daemonsets";
    const API_VERSION: &'static str = "apps/v1";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn clear_server_fields(&mut self) {
        self.metadata.clear_server_fields();
        self.status = DaemonSetStatus::default();
    }
}
