use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::poller::Refresher;
use crate::client::ApiClient;

/// How long a resolved command stays visible before being pruned.
pub const COMMAND_TTL: Duration = Duration::from_secs(5);

/// Acknowledgement state of one issued command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AckState {
    /// Sent, backend has not answered yet.
    Pending,
    /// Backend accepted the command.
    Acked,
    /// Backend rejected it or the request failed.
    Failed,
}

/// One issued remote action, kept only for the display window.
#[derive(Clone, Debug)]
pub struct Command {
    /// Job name the command targets.
    pub name: String,
    /// When the command was issued.
    pub issued_at: Instant,
    /// Where the acknowledgement stands.
    pub state: AckState,
}

/// One-shot user-facing notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// A job trigger was acknowledged.
    JobTriggered {
        /// Job name.
        job: String,
        /// Confirmation line from the backend.
        message: String,
    },
    /// A job trigger failed.
    JobFailed {
        /// Job name.
        job: String,
        /// What went wrong.
        error: String,
    },
}

/// What `trigger` did with the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Backend acknowledged the trigger.
    Acked,
    /// Trigger was sent but failed; polled job state is untouched.
    Failed,
    /// Rejected locally: the same job already has a trigger pending.
    AlreadyPending,
}

/// Issues batch-job triggers and tracks their acknowledgement.
///
/// A successful trigger asks the job-list poller for one out-of-band
/// cycle; the regular poll stays the sole source of truth for job
/// state, so a failed trigger changes nothing beyond a notice.
pub struct CommandDispatcher {
    client: ApiClient,
    commands: Mutex<Vec<Command>>,
    notices: mpsc::UnboundedSender<Notice>,
    target: Mutex<Option<Refresher>>,
}

impl CommandDispatcher {
    /// New dispatcher plus the receiving end of its notice stream.
    pub fn new(client: ApiClient) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            client,
            commands: Mutex::new(Vec::new()),
            notices: tx,
            target: Mutex::new(None),
        };
        (dispatcher, rx)
    }

    /// Point acknowledged triggers at `refresher` for the forced extra
    /// cycle, or detach with `None` when the owning screen goes away.
    pub async fn point_at(&self, refresher: Option<Refresher>) {
        *self.target.lock().await = refresher;
    }

    /// Trigger `job_name` once. A duplicate for a job whose previous
    /// trigger is still unanswered is rejected, not queued.
    pub async fn trigger(&self, job_name: &str) -> TriggerOutcome {
        {
            let mut cmds = self.commands.lock().await;
            prune(&mut cmds);
            if cmds
                .iter()
                .any(|c| c.name == job_name && c.state == AckState::Pending)
            {
                debug!("trigger rejected job={} still pending", job_name);
                return TriggerOutcome::AlreadyPending;
            }
            // A resolved entry for the same job is superseded.
            cmds.retain(|c| c.name != job_name);
            cmds.push(Command {
                name: job_name.to_string(),
                issued_at: Instant::now(),
                state: AckState::Pending,
            });
        }

        match self.client.trigger_job(job_name).await {
            Ok(receipt) => {
                self.resolve(job_name, AckState::Acked).await;
                info!("job triggered name={} msg={}", job_name, receipt.message);
                let _ = self.notices.send(Notice::JobTriggered {
                    job: job_name.to_string(),
                    message: receipt.message,
                });
                if let Some(refresher) = self.target.lock().await.as_ref() {
                    refresher.request();
                }
                TriggerOutcome::Acked
            }
            Err(e) => {
                self.resolve(job_name, AckState::Failed).await;
                warn!("job trigger failed name={} err={}", job_name, e);
                let _ = self.notices.send(Notice::JobFailed {
                    job: job_name.to_string(),
                    error: e.to_string(),
                });
                TriggerOutcome::Failed
            }
        }
    }

    /// Commands still inside their display window, oldest first.
    pub async fn commands(&self) -> Vec<Command> {
        let mut cmds = self.commands.lock().await;
        prune(&mut cmds);
        cmds.clone()
    }

    async fn resolve(&self, job_name: &str, state: AckState) {
        let mut cmds = self.commands.lock().await;
        if let Some(cmd) = cmds
            .iter_mut()
            .find(|c| c.name == job_name && c.state == AckState::Pending)
        {
            cmd.state = state;
        }
    }
}

/// Drop resolved commands older than the display window. Pending ones
/// stay until their request resolves, however long that takes.
fn prune(cmds: &mut Vec<Command>) {
    cmds.retain(|c| c.state == AckState::Pending || c.issued_at.elapsed() < COMMAND_TTL);
}
