//! Node daemon fleet constants: managed object names, legacy identifiers,
//! and the drain backoff schedule.

// ─── Managed objects ──────────────────────────────────────────────────────

/// Name of the diskmaker-manager daemon set.
pub const DISKMAKER_NAME: &str = "diskmaker-manager";

/// Name of the shared provisioner config map.
pub const PROVISIONER_CONFIGMAP_NAME: &str = "local-provisioner";

/// Config map key holding the storage class map (YAML).
pub const STORAGE_CLASS_MAP_KEY: &str = "storageClassMap";

/// Annotation carrying the fingerprint of the provisioner config map data.
pub const DATA_HASH_ANNOTATION_KEY: &str = "local.storage.openshift.io/configMapDataHash";

/// Label key used to identify daemon pods.
pub const APP_LABEL_KEY: &str = "app";

/// Default diskmaker image when neither the config file nor the environment sets one.
pub const DEFAULT_DISKMAKER_IMAGE: &str = "quay.io/openshift/origin-local-storage-diskmaker:latest";

/// Environment variable overriding the diskmaker image.
pub const DISKMAKER_IMAGE_ENV: &str = "DISKMAKER_IMAGE";

/// Namespace watched when none is configured.
pub const DEFAULT_NAMESPACE: &str = "openshift-local-storage";

/// Default interval between reconciliation passes, in seconds.
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 30;

// ─── Legacy generation ────────────────────────────────────────────────────

/// Exact name of the retired static-provisioner daemon set.
pub const OLD_PROVISIONER_NAME: &str = "localvolumeset-local-provisioner";

/// `app` label prefix of retired per-LocalVolume diskmaker daemon sets.
pub const OLD_LV_DISKMAKER_PREFIX: &str = "local-volume-diskmaker-";

/// `app` label prefix of retired per-LocalVolume provisioner daemon sets.
pub const OLD_LV_PROVISIONER_PREFIX: &str = "local-volume-provisioner-";

// ─── Drain backoff ────────────────────────────────────────────────────────

/// First wait between drain checks, in milliseconds.
pub const DRAIN_BACKOFF_INITIAL_MS: u64 = 1_000;

/// Growth factor applied to the wait after each check.
pub const DRAIN_BACKOFF_FACTOR: f64 = 1.7;

/// Random extra fraction added to each wait (1.0 means up to double).
pub const DRAIN_BACKOFF_JITTER: f64 = 1.0;

/// Upper bound for a single wait, in milliseconds.
pub const DRAIN_BACKOFF_CAP_MS: u64 = 120_000;

/// Maximum number of drain checks before giving up.
pub const DRAIN_BACKOFF_STEPS: u32 = 20;
