//! Filesystem path constants.

// ─── Operator ──────────────────────────────────────────────────────────────

/// Default config file path for the operator.
pub const DEFAULT_OPERATOR_CONFIG: &str = "/etc/lso/config.yaml";

/// Default data directory for the SlateDB state store.
pub const DEFAULT_OPERATOR_DATA_DIR: &str = "/tmp/lso-data";

// ─── Node ─────────────────────────────────────────────────────────────────

/// Host directory under which per-storage-class symlinks are created.
pub const LOCAL_DISKS_HOST_DIR: &str = "/mnt/local-storage";

/// Host device directory scanned by the diskmaker.
pub const DEVICE_DIR: &str = "/dev";

/// Mount path of the provisioner config map inside the diskmaker container.
pub const PROVISIONER_CONFIG_MOUNT: &str = "/etc/provisioner/config";
