use std::sync::Arc;
use tokio::sync::broadcast;

use crate::clients::LiveRoutingClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{LifecycleService, SeaOrmLifecycleService, Telemetry, broadcaster};

/// Build a shared HTTP client with a bounded timeout so a slow or hung
/// collaborator cannot stall an admin request indefinitely.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("AudixAdmin/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub lifecycle: Arc<dyn LifecycleService>,

    pub live: Arc<LiveRoutingClient>,

    pub telemetry: Arc<Telemetry>,

    /// Pre-serialized snapshot frames fanned out to WebSocket subscribers.
    pub snapshot_tx: broadcast::Sender<String>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client =
            build_shared_http_client(config.live.request_timeout_seconds.into())?;
        let live = Arc::new(LiveRoutingClient::new(
            http_client,
            &config.live.base_url,
            &config.live.token,
        ));

        let lifecycle = Arc::new(SeaOrmLifecycleService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn LifecycleService + Send + Sync + 'static>;

        let telemetry = Arc::new(Telemetry::new());
        let (snapshot_tx, _) = broadcast::channel(config.general.snapshot_buffer_size);

        broadcaster::start(telemetry.clone(), snapshot_tx.clone());

        Ok(Self {
            config,
            store,
            lifecycle,
            live,
            telemetry,
            snapshot_tx,
        })
    }
}
