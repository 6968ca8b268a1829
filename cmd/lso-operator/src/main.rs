use clap::Parser;
use pkg_constants::nodedaemon::{
    DEFAULT_DISKMAKER_IMAGE, DEFAULT_NAMESPACE, DEFAULT_RESYNC_INTERVAL_SECS, DISKMAKER_IMAGE_ENV,
};
use pkg_constants::paths::{DEFAULT_OPERATOR_CONFIG, DEFAULT_OPERATOR_DATA_DIR};
use pkg_controllers::diskmaker::DiskMakerSettings;
use pkg_controllers::nodedaemon::{DaemonReconciler, Request};
use pkg_state::backend::Backend;
use pkg_state::client::StateStore;
use pkg_state::memory::MemoryStore;
use pkg_state::objects::ObjectClient;
use pkg_types::config::{OperatorConfigFile, load_config_file};
use pkg_types::validate::validate_name;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "lso-operator",
    about = "Local storage operator: keeps the diskmaker node daemons in sync"
)]
struct Cli {
    /// Path to YAML config file
    #[arg(long, short, default_value = DEFAULT_OPERATOR_CONFIG)]
    config: String,

    /// Namespace holding the LocalVolume / LocalVolumeSet objects
    #[arg(long, short)]
    namespace: Option<String>,

    /// Directory for SlateDB state storage
    #[arg(long)]
    data_dir: Option<String>,

    /// Keep state in memory instead of SlateDB
    #[arg(long)]
    in_memory: bool,

    /// Diskmaker container image
    #[arg(long)]
    diskmaker_image: Option<String>,

    /// Service account for diskmaker pods
    #[arg(long)]
    service_account: Option<String>,

    /// Seconds between reconciliation passes
    #[arg(long)]
    resync_interval_secs: Option<u64>,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Abort the reconcile loop and wait until it has unwound, so no pass is
/// still inside the store when it gets closed.
async fn stop_reconciler(handle: JoinHandle<()>) {
    handle.abort();
    if let Err(e) = handle.await {
        if !e.is_cancelled() {
            warn!("Reconciler task failed during shutdown: {}", e);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    // Load config file (returns defaults if file not found)
    let file_cfg: OperatorConfigFile = load_config_file(&cli.config)?;
    info!("Config file: {}", cli.config);

    // Merge: CLI args > environment > config file > defaults
    let namespace = cli
        .namespace
        .or(file_cfg.namespace)
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
    validate_name(&namespace)?;
    let image = cli
        .diskmaker_image
        .or_else(|| std::env::var(DISKMAKER_IMAGE_ENV).ok())
        .or(file_cfg.diskmaker_image)
        .unwrap_or_else(|| DEFAULT_DISKMAKER_IMAGE.to_string());
    let resync = cli
        .resync_interval_secs
        .or(file_cfg.resync_interval_secs)
        .unwrap_or(DEFAULT_RESYNC_INTERVAL_SECS);
    let in_memory = cli.in_memory || file_cfg.in_memory.unwrap_or(false);
    let data_dir = cli
        .data_dir
        .or(file_cfg.data_dir)
        .unwrap_or_else(|| DEFAULT_OPERATOR_DATA_DIR.to_string());

    info!("Starting lso-operator");
    info!("  Namespace: {}", namespace);
    info!("  Image:     {}", image);
    info!("  Resync:    {}s", resync);
    if in_memory {
        info!("  State:     in-memory");
    } else {
        info!("  Data dir:  {}", data_dir);
    }

    let mut slate: Option<StateStore> = None;
    let backend: Arc<dyn Backend> = if in_memory {
        Arc::new(MemoryStore::new())
    } else {
        let store = StateStore::new(&data_dir).await?;
        slate = Some(store.clone());
        Arc::new(store)
    };

    let settings = DiskMakerSettings {
        image,
        service_account: cli.service_account,
    };
    let reconciler = DaemonReconciler::new(ObjectClient::new(backend), settings)
        .with_resync_interval(Duration::from_secs(resync));
    let request = Request::new(&namespace, &namespace);

    let result = if cli.once {
        match reconciler.reconcile(&request).await {
            Ok(report) => {
                info!(
                    "Pass complete: configmap={:?} daemonset={:?} legacy_deleted={}",
                    report.configmap, report.daemonset, report.cleanup.deleted
                );
                Ok(())
            }
            Err(e) => {
                error!("Pass failed: {}", e);
                Err(e.into())
            }
        }
    } else {
        let mut handle = reconciler.start(request);
        let exited = tokio::select! {
            _ = tokio::signal::ctrl_c() => None,
            res = &mut handle => Some(res),
        };
        match exited {
            Some(res) => res.map_err(|e| anyhow::anyhow!("reconciler task exited: {}", e)),
            None => {
                info!("Received Ctrl-C, shutting down");
                stop_reconciler(handle).await;
                Ok(())
            }
        }
    };

    if let Some(store) = slate {
        store.close().await?;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn stop_waits_for_the_loop_to_unwind() {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = DropFlag(dropped.clone());
        let handle: JoinHandle<()> = tokio::spawn(async move {
            let _flag = flag;
            loop {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        stop_reconciler(handle).await;
        assert!(dropped.load(Ordering::SeqCst));
    }
}
