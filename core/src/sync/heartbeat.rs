use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use super::poller::{self, Cadence, PollError, PollHandle};
use super::store::{Snapshot, ViewStateStore};
use crate::api::CloudStatus;
use crate::client::ApiClient;

/// Fixed heartbeat cadence.
pub const HEARTBEAT_PERIOD: Duration = Duration::from_secs(10);

/// Process-wide infrastructure heartbeat.
///
/// One poller over the shared [`CloudStatus`] value. It is started when
/// the shell comes up and stopped when the shell goes down; screen
/// navigation never touches it. The store has exactly one writer (this
/// poller) and any number of subscribing readers.
pub struct CloudStatusHeartbeat {
    store: Arc<ViewStateStore<CloudStatus>>,
    handle: PollHandle,
}

impl CloudStatusHeartbeat {
    /// Start polling the heartbeat endpoint every [`HEARTBEAT_PERIOD`].
    pub fn start(client: ApiClient) -> Result<Self, PollError> {
        let store = Arc::new(ViewStateStore::new());
        let handle = poller::start(
            "cloud-status",
            Cadence::Every(HEARTBEAT_PERIOD),
            store.clone(),
            move || {
                let client = client.clone();
                async move { client.cloud_status().await }
            },
        )?;
        info!("heartbeat started period={}s", HEARTBEAT_PERIOD.as_secs());
        Ok(Self { store, handle })
    }

    /// Watch handle for shell components that show the status.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<CloudStatus>> {
        self.store.subscribe()
    }

    /// Current status snapshot.
    pub fn snapshot(&self) -> Snapshot<CloudStatus> {
        self.store.snapshot()
    }

    /// Shell teardown.
    pub fn stop(mut self) {
        self.handle.stop();
        info!("heartbeat stopped");
    }
}
