//! Desired contents of the two managed objects: the `local-provisioner`
//! config map and the `diskmaker-manager` daemon set.

use pkg_constants::nodedaemon::{
    APP_LABEL_KEY, DATA_HASH_ANNOTATION_KEY, DISKMAKER_NAME, PROVISIONER_CONFIGMAP_NAME,
    STORAGE_CLASS_MAP_KEY,
};
use pkg_constants::paths::{DEVICE_DIR, LOCAL_DISKS_HOST_DIR, PROVISIONER_CONFIG_MOUNT};
use pkg_types::configmap::ConfigMap;
use pkg_types::daemonset::DaemonSet;
use pkg_types::localvolume::VolumeMode;
use pkg_types::pod::{ContainerSpec, PodSpec};
use pkg_types::volume::{Volume, VolumeMount, VolumeSource};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::aggregate::DesiredState;
use crate::error::ReconcileError;

/// Settings for the diskmaker pods that do not come from fleet definitions.
#[derive(Debug, Clone)]
pub struct DiskMakerSettings {
    pub image: String,
    pub service_account: Option<String>,
}

/// Per-storage-class entry of the `storageClassMap` payload read by the
/// provisioner on each node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MountConfig {
    pub host_dir: String,
    pub mount_dir: String,
    pub volume_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs_type: Option<String>,
}

impl MountConfig {
    fn new(storage_class: &str, volume_mode: VolumeMode, fs_type: &str) -> Self {
        let dir = format!("{}/{}", LOCAL_DISKS_HOST_DIR, storage_class);
        Self {
            host_dir: dir.clone(),
            mount_dir: dir,
            volume_mode: volume_mode.to_string(),
            fs_type: (volume_mode == VolumeMode::Filesystem && !fs_type.is_empty())
                .then(|| fs_type.to_string()),
        }
    }
}

/// Storage classes served on the fleet, keyed by class name. When two
/// definitions name the same class the later one wins.
pub fn storage_class_map(desired: &DesiredState) -> BTreeMap<String, MountConfig> {
    let mut classes = BTreeMap::new();
    for set in &desired.volume_sets {
        let spec = &set.spec;
        classes.insert(
            spec.storage_class_name.clone(),
            MountConfig::new(&spec.storage_class_name, spec.volume_mode, &spec.fs_type),
        );
    }
    for lv in &desired.volumes {
        for device in &lv.spec.storage_class_devices {
            classes.insert(
                device.storage_class_name.clone(),
                MountConfig::new(&device.storage_class_name, device.volume_mode, &device.fs_type),
            );
        }
    }
    classes
}

/// Full data payload of the provisioner config map.
pub fn provisioner_config_data(desired: &DesiredState) -> Result<HashMap<String, String>, ReconcileError> {
    let rendered = serde_yaml::to_string(&storage_class_map(desired)).map_err(|e| {
        ReconcileError::Render {
            what: STORAGE_CLASS_MAP_KEY.to_string(),
            message: e.to_string(),
        }
    })?;
    Ok(HashMap::from([(STORAGE_CLASS_MAP_KEY.to_string(), rendered)]))
}

/// Mutation applied to the provisioner config map: replaces the payload and
/// the owner references, keeps everything else.
pub fn configmap_mutate_fn(
    data: HashMap<String, String>,
    desired: &DesiredState,
) -> impl FnOnce(&mut ConfigMap) -> Result<(), ReconcileError> + use<> {
    let owner_refs = desired.owner_refs.clone();
    move |cm| {
        cm.metadata
            .labels
            .insert(APP_LABEL_KEY.to_string(), DISKMAKER_NAME.to_string());
        cm.metadata.owner_references = owner_refs;
        cm.data = data;
        Ok(())
    }
}

/// Mutation applied to the diskmaker daemon set. `data_hash` is the
/// fingerprint of the config map data the pods will read; it lands on the
/// pod template so a config change rolls every daemon pod.
pub fn daemonset_mutate_fn(
    namespace: &str,
    desired: &DesiredState,
    settings: &DiskMakerSettings,
    data_hash: String,
) -> impl FnOnce(&mut DaemonSet) -> Result<(), ReconcileError> + use<> {
    let namespace = namespace.to_string();
    let tolerations = desired.tolerations.clone();
    let owner_refs = desired.owner_refs.clone();
    let node_selector = desired.node_selector.clone();
    let settings = settings.clone();
    move |ds| {
        let selector = HashMap::from([(APP_LABEL_KEY.to_string(), DISKMAKER_NAME.to_string())]);

        let meta = &mut ds.metadata;
        meta.labels.extend(selector.clone());
        meta.annotations
            .insert(DATA_HASH_ANNOTATION_KEY.to_string(), data_hash.clone());
        meta.owner_references = owner_refs;

        ds.spec.selector = selector.clone();
        let template = &mut ds.spec.template;
        template.labels.extend(selector);
        template
            .annotations
            .insert(DATA_HASH_ANNOTATION_KEY.to_string(), data_hash);
        template.spec = PodSpec {
            containers: vec![diskmaker_container(&namespace, &settings.image)],
            node_selector,
            tolerations,
            volumes: diskmaker_volumes(),
            service_account_name: settings.service_account,
        };
        Ok(())
    }
}

fn diskmaker_container(namespace: &str, image: &str) -> ContainerSpec {
    ContainerSpec {
        name: DISKMAKER_NAME.to_string(),
        image: image.to_string(),
        command: vec![],
        args: vec!["lv-manager".to_string()],
        env: HashMap::from([("WATCH_NAMESPACE".to_string(), namespace.to_string())]),
        volume_mounts: vec![
            VolumeMount {
                name: "provisioner-config".to_string(),
                mount_path: PROVISIONER_CONFIG_MOUNT.to_string(),
                read_only: true,
            },
            VolumeMount {
                name: "local-disks".to_string(),
                mount_path: LOCAL_DISKS_HOST_DIR.to_string(),
                read_only: false,
            },
            VolumeMount {
                name: "device-dir".to_string(),
                mount_path: DEVICE_DIR.to_string(),
                read_only: false,
            },
        ],
        privileged: true,
    }
}

fn diskmaker_volumes() -> Vec<Volume> {
    vec![
        Volume {
            name: "provisioner-config".to_string(),
            source: VolumeSource::ConfigMap {
                name: PROVISIONER_CONFIGMAP_NAME.to_string(),
            },
        },
        Volume {
            name: "local-disks".to_string(),
            source: VolumeSource::HostPath {
                path: LOCAL_DISKS_HOST_DIR.to_string(),
            },
        },
        Volume {
            name: "device-dir".to_string(),
            source: VolumeSource::HostPath {
                path: DEVICE_DIR.to_string(),
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_types::localvolume::{
        LocalVolume, LocalVolumeSet, LocalVolumeSetSpec, LocalVolumeSpec, StorageClassDevice,
    };
    use pkg_types::meta::ObjectMeta;

    fn desired() -> DesiredState {
        let set = LocalVolumeSet {
            metadata: ObjectMeta::new("ns", "fast"),
            spec: LocalVolumeSetSpec {
                storage_class_name: "fast-fs".to_string(),
                fs_type: "xfs".to_string(),
                ..Default::default()
            },
        };
        let lv = LocalVolume {
            metadata: ObjectMeta::new("ns", "raw"),
            spec: LocalVolumeSpec {
                storage_class_devices: vec![StorageClassDevice {
                    storage_class_name: "raw-block".to_string(),
                    volume_mode: VolumeMode::Block,
                    fs_type: "ext4".to_string(),
                    device_paths: vec!["/dev/sdb".to_string()],
                }],
                ..Default::default()
            },
        };
        DesiredState::from_definitions(vec![set], vec![lv])
    }

    #[test]
    fn storage_classes_from_both_definition_kinds() {
        let classes = storage_class_map(&desired());
        assert_eq!(
            classes["fast-fs"],
            MountConfig {
                host_dir: "/mnt/local-storage/fast-fs".to_string(),
                mount_dir: "/mnt/local-storage/fast-fs".to_string(),
                volume_mode: "Filesystem".to_string(),
                fs_type: Some("xfs".to_string()),
            }
        );
        assert_eq!(classes["raw-block"].volume_mode, "Block");
        assert_eq!(classes["raw-block"].fs_type, None);
    }

    #[test]
    fn payload_is_camel_case_yaml() {
        let data = provisioner_config_data(&desired()).unwrap();
        let yaml = &data[STORAGE_CLASS_MAP_KEY];
        assert!(yaml.contains("hostDir: /mnt/local-storage/fast-fs"));
        assert!(yaml.contains("volumeMode: Block"));
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn daemonset_mutation_sets_hash_and_template() {
        let settings = DiskMakerSettings {
            image: "diskmaker:test".to_string(),
            service_account: Some("local-storage-admin".to_string()),
        };
        let mut ds = DaemonSet {
            metadata: ObjectMeta::new("ns", DISKMAKER_NAME),
            ..Default::default()
        };
        ds.metadata
            .labels
            .insert("team".to_string(), "storage".to_string());

        let mutate = daemonset_mutate_fn("ns", &desired(), &settings, "abc123".to_string());
        mutate(&mut ds).unwrap();

        assert_eq!(
            ds.metadata.annotations.get(DATA_HASH_ANNOTATION_KEY).map(String::as_str),
            Some("abc123")
        );
        assert_eq!(
            ds.spec.template.annotations.get(DATA_HASH_ANNOTATION_KEY).map(String::as_str),
            Some("abc123")
        );
        assert_eq!(ds.metadata.label("team"), Some("storage"));
        assert_eq!(ds.metadata.label(APP_LABEL_KEY), Some(DISKMAKER_NAME));
        assert_eq!(ds.metadata.owner_references.len(), 2);

        let container = &ds.spec.template.spec.containers[0];
        assert_eq!(container.image, "diskmaker:test");
        assert_eq!(container.env["WATCH_NAMESPACE"], "ns");
        assert_eq!(ds.spec.template.spec.volumes.len(), 3);
        assert_eq!(
            ds.spec.template.spec.service_account_name.as_deref(),
            Some("local-storage-admin")
        );
    }
}
