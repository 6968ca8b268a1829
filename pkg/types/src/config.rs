use serde::{Deserialize, Serialize};

/// Operator configuration file (YAML).
///
/// Example `config.yaml`:
/// ```yaml
/// namespace: openshift-local-storage
/// data-dir: /var/lib/lso/data
/// diskmaker-image: quay.io/openshift/origin-local-storage-diskmaker:4.6
/// resync-interval-secs: 30
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorConfigFile {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default, alias = "data-dir")]
    pub data_dir: Option<String>,
    #[serde(default, alias = "diskmaker-image")]
    pub diskmaker_image: Option<String>,
    #[serde(default, alias = "resync-interval-secs")]
    pub resync_interval_secs: Option<u64>,
    /// Keep state in memory instead of SlateDB (useful for local runs)
    #[serde(default, alias = "in-memory")]
    pub in_memory: Option<bool>,
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg: OperatorConfigFile = load_config_file("/nonexistent/lso/config.yaml").unwrap();
        assert!(cfg.namespace.is_none());
        assert!(cfg.data_dir.is_none());
    }

    #[test]
    fn parses_kebab_case_keys() {
        let cfg: OperatorConfigFile = serde_yaml::from_str(
            "namespace: openshift-local-storage\ndata-dir: /data\nresync-interval-secs: 5\nin-memory: true\n",
        )
        .unwrap();
        assert_eq!(cfg.namespace.as_deref(), Some("openshift-local-storage"));
        assert_eq!(cfg.data_dir.as_deref(), Some("/data"));
        assert_eq!(cfg.resync_interval_secs, Some(5));
        assert_eq!(cfg.in_memory, Some(true));
    }
}
