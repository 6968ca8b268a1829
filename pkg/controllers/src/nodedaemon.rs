use pkg_constants::nodedaemon::{DEFAULT_RESYNC_INTERVAL_SECS, DISKMAKER_NAME, PROVISIONER_CONFIGMAP_NAME};
use pkg_state::objects::ObjectClient;
use pkg_types::configmap::ConfigMap;
use pkg_types::daemonset::DaemonSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::aggregate::aggregate;
use crate::diskmaker::{
    DiskMakerSettings, configmap_mutate_fn, daemonset_mutate_fn, provisioner_config_data,
};
use crate::error::ReconcileError;
use crate::fingerprint::fingerprint;
use crate::legacy::{CleanupReport, LegacyCleaner};
use crate::upsert::{OperationResult, create_or_update};

/// Trigger for one pass: the fleet definition (or namespace) that changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub namespace: String,
    pub name: String,
}

impl Request {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// Outcome of one pass. The upsert outcomes are `None` when there was
/// nothing to manage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub cleanup: CleanupReport,
    pub configmap: Option<OperationResult>,
    pub daemonset: Option<OperationResult>,
    /// Fingerprint written to the daemon set.
    pub data_hash: Option<String>,
}

/// Reconciles every LocalVolume and LocalVolumeSet of a namespace into a
/// single diskmaker daemon set and its provisioner config map.
///
/// Holds no cached cluster state between passes apart from the legacy
/// cleanup latch, so passes can be abandoned or repeated at any point.
pub struct DaemonReconciler {
    client: ObjectClient,
    cleaner: LegacyCleaner,
    settings: DiskMakerSettings,
    resync_interval: Duration,
}

impl DaemonReconciler {
    pub fn new(client: ObjectClient, settings: DiskMakerSettings) -> Self {
        Self {
            client,
            cleaner: LegacyCleaner::default(),
            settings,
            resync_interval: Duration::from_secs(DEFAULT_RESYNC_INTERVAL_SECS),
        }
    }

    pub fn with_cleaner(mut self, cleaner: LegacyCleaner) -> Self {
        self.cleaner = cleaner;
        self
    }

    pub fn with_resync_interval(mut self, interval: Duration) -> Self {
        self.resync_interval = interval;
        self
    }

    pub fn cleaner(&self) -> &LegacyCleaner {
        &self.cleaner
    }

    /// Start the trigger loop as a background task: one pass for `request`
    /// every resync interval. Errors are logged and the pass is retried on
    /// the next tick.
    pub fn start(self, request: Request) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "DaemonReconciler started for {} (interval={}s)",
                request.namespace,
                self.resync_interval.as_secs()
            );
            let mut interval = tokio::time::interval(self.resync_interval);
            loop {
                interval.tick().await;
                if let Err(e) = self.reconcile(&request).await {
                    warn!("DaemonReconciler reconcile error in {}: {}", request.namespace, e);
                }
            }
        })
    }

    /// One full pass. Any error aborts the pass; nothing is rolled back
    /// because every step is safe to repeat.
    pub async fn reconcile(&self, request: &Request) -> Result<ReconcileReport, ReconcileError> {
        let ns = request.namespace.as_str();
        debug!("Reconciling node daemons for {}/{}", ns, request.name);

        // do a one-time delete of the old per-volume daemon sets
        let cleanup = self.cleaner.cleanup_once(&self.client, ns).await?;

        let desired = aggregate(&self.client, ns).await?;
        if desired.is_empty() {
            debug!("No LocalVolumes or LocalVolumeSets in {}, nothing to do", ns);
            return Ok(ReconcileReport {
                cleanup,
                ..Default::default()
            });
        }

        let data = provisioner_config_data(&desired)?;
        let (configmap, cm_op) = create_or_update::<ConfigMap, _>(
            &self.client,
            ns,
            PROVISIONER_CONFIGMAP_NAME,
            configmap_mutate_fn(data, &desired),
        )
        .await?;
        if cm_op.changed() {
            info!("Provisioner configmap {}/{} {}", ns, PROVISIONER_CONFIGMAP_NAME, cm_op);
        }

        let data_hash = fingerprint(&configmap.data);

        let mutate = daemonset_mutate_fn(ns, &desired, &self.settings, data_hash.clone());
        let (_, ds_op) =
            create_or_update::<DaemonSet, _>(&self.client, ns, DISKMAKER_NAME, mutate).await?;
        if ds_op.changed() {
            info!("DaemonSet {}/{} {} (configMapDataHash={})", ns, DISKMAKER_NAME, ds_op, data_hash);
        }

        Ok(ReconcileReport {
            cleanup,
            configmap: Some(cm_op),
            daemonset: Some(ds_op),
            data_hash: Some(data_hash),
        })
    }
}
