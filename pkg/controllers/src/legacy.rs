//! One-time retirement of the previous daemon-set generation.
//!
//! The old operator ran one diskmaker and one provisioner daemon set per
//! LocalVolume (`app` label `local-volume-diskmaker-<lv>` /
//! `local-volume-provisioner-<lv>`) plus a shared static provisioner named
//! `localvolumeset-local-provisioner`. They are deleted, then the cleaner
//! waits until no pod carries one of their `app` labels, because deleting a
//! daemon set does not stop its pods synchronously.

use pkg_constants::nodedaemon::{
    APP_LABEL_KEY, OLD_LV_DISKMAKER_PREFIX, OLD_LV_PROVISIONER_PREFIX, OLD_PROVISIONER_NAME,
};
use pkg_state::objects::ObjectClient;
use pkg_types::daemonset::DaemonSet;
use pkg_types::pod::Pod;
use pkg_types::selector::{LabelSelector, Operator, Requirement};
use pkg_types::validate::validate_label_value;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{debug, error, info, warn};

use crate::backoff::Backoff;
use crate::error::ReconcileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CleanupPhase {
    Pending = 0,
    Deleting = 1,
    AwaitingDrain = 2,
    Done = 3,
}

impl CleanupPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => CleanupPhase::Deleting,
            2 => CleanupPhase::AwaitingDrain,
            3 => CleanupPhase::Done,
            _ => CleanupPhase::Pending,
        }
    }
}

/// What one `cleanup_once` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// The latch was already set; nothing was scanned.
    pub skipped: bool,
    pub deleted: usize,
    /// Pod listings issued while waiting for the drain.
    pub polls: u32,
}

/// Legacy migration state machine:
/// `Pending -> Deleting -> AwaitingDrain -> Done`.
///
/// `Done` is the latch. It lives only as long as this value, so a restarted
/// process runs the migration again; with nothing left to delete that run
/// finishes after a single pod listing.
pub struct LegacyCleaner {
    phase: AtomicU8,
    backoff: Backoff,
}

impl Default for LegacyCleaner {
    fn default() -> Self {
        Self::new(Backoff::drain())
    }
}

impl LegacyCleaner {
    pub fn new(backoff: Backoff) -> Self {
        Self {
            phase: AtomicU8::new(CleanupPhase::Pending as u8),
            backoff,
        }
    }

    pub fn phase(&self) -> CleanupPhase {
        CleanupPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    pub fn is_done(&self) -> bool {
        self.phase() == CleanupPhase::Done
    }

    fn set_phase(&self, phase: CleanupPhase) {
        self.phase.store(phase as u8, Ordering::SeqCst);
    }

    /// Run the migration unless it already completed. On any error the
    /// phase falls back to `Pending` and the next call starts over.
    pub async fn cleanup_once(
        &self,
        client: &ObjectClient,
        namespace: &str,
    ) -> Result<CleanupReport, ReconcileError> {
        if self.is_done() {
            return Ok(CleanupReport {
                skipped: true,
                ..Default::default()
            });
        }

        match self.run(client, namespace).await {
            Ok(report) => {
                self.set_phase(CleanupPhase::Done);
                info!(
                    "Legacy daemon sets retired in {} (deleted={}, polls={})",
                    namespace, report.deleted, report.polls
                );
                Ok(report)
            }
            Err(e) => {
                self.set_phase(CleanupPhase::Pending);
                Err(e)
            }
        }
    }

    async fn run(&self, client: &ObjectClient, namespace: &str) -> Result<CleanupReport, ReconcileError> {
        self.set_phase(CleanupPhase::Deleting);

        let daemonsets: Vec<DaemonSet> = client
            .list(namespace, &LabelSelector::everything())
            .await
            .inspect_err(|e| error!("Could not list daemon sets in {}: {}", namespace, e))?;

        // The static provisioner is always watched: its pods may outlive a
        // daemon set that is already gone.
        let mut retiring = BTreeSet::from([OLD_PROVISIONER_NAME.to_string()]);
        let mut deleted = 0;
        for ds in &daemonsets {
            let name = ds.metadata.name.as_str();
            let legacy_app = ds.metadata.label(APP_LABEL_KEY).filter(|app| is_legacy_app(app));
            if legacy_app.is_none() && name != OLD_PROVISIONER_NAME {
                continue;
            }
            if let Some(app) = legacy_app {
                match validate_label_value(app) {
                    Ok(()) => {
                        retiring.insert(app.to_string());
                    }
                    Err(e) => warn!(
                        "Not waiting on pods of {}/{}, unusable app label: {}",
                        namespace, name, e
                    ),
                }
            }

            info!("Deleting legacy daemon set {}/{}", namespace, name);
            match client.delete::<DaemonSet>(namespace, name).await {
                Ok(()) => deleted += 1,
                Err(e) if e.is_not_found() => {
                    debug!("Legacy daemon set {}/{} already gone", namespace, name);
                }
                Err(e) => {
                    error!("Could not delete daemon set {}/{}: {}", namespace, name, e);
                    return Err(e.into());
                }
            }
        }

        self.set_phase(CleanupPhase::AwaitingDrain);
        let selector = retirement_selector(&retiring)?;
        let polls = self.await_drain(client, namespace, &selector).await?;
        Ok(CleanupReport {
            skipped: false,
            deleted,
            polls,
        })
    }

    async fn await_drain(
        &self,
        client: &ObjectClient,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<u32, ReconcileError> {
        let mut attempts = self.backoff.attempts();
        let mut remaining = 0;
        while attempts.next().await {
            remaining = match client.list::<Pod>(namespace, selector).await {
                Ok(pods) => pods.len(),
                Err(e) if e.is_not_found() => 0,
                Err(e) => return Err(e.into()),
            };
            info!(
                "Waiting for 0 pods matching {} in {} (found {})",
                selector, namespace, remaining
            );
            if remaining == 0 {
                return Ok(attempts.made());
            }
        }
        error!(
            "Could not confirm that legacy pods in {} were deleted after {} checks",
            namespace,
            attempts.made()
        );
        Err(ReconcileError::BackoffExhausted {
            attempts: attempts.made(),
            remaining,
        })
    }
}

fn is_legacy_app(app: &str) -> bool {
    app.starts_with(OLD_LV_DISKMAKER_PREFIX) || app.starts_with(OLD_LV_PROVISIONER_PREFIX)
}

fn retirement_selector(apps: &BTreeSet<String>) -> Result<LabelSelector, ReconcileError> {
    let requirement = Requirement::new(APP_LABEL_KEY, Operator::In, apps.iter().cloned())
        .map_err(|e| {
            error!("Failed to compose label selector {} in {:?}: {}", APP_LABEL_KEY, apps, e);
            ReconcileError::MalformedSelector(e.to_string())
        })?;
    Ok(LabelSelector::everything().add(requirement))
}
