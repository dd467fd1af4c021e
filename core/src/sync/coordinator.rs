use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::command::CommandDispatcher;
use super::poller::{self, Cadence, PollError, PollHandle};
use super::store::{Snapshot, ViewStateStore};
use crate::api::{
    routes, BatchJob, CustomerData, DashboardData, FraudAlert, RiskAssessment, Summarize,
    Transaction,
};
use crate::client::ApiClient;

/// Rows requested for the transactions screen.
pub const TRANSACTION_LIMIT: u32 = 50;
/// Rows requested for the customers screen.
pub const CUSTOMER_LIMIT: u32 = 20;

/// The console screens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScreenId {
    /// Headline stats plus transaction analytics.
    Dashboard,
    /// Latest transaction rows.
    Transactions,
    /// Open fraud alerts.
    Fraud,
    /// Customer rows plus segment analytics.
    Customers,
    /// Per-band risk assessment.
    Risk,
    /// Batch jobs, the screen that can also trigger them.
    Monitor,
}

impl ScreenId {
    /// Every screen, in rotation order.
    pub const ALL: [ScreenId; 6] = [
        ScreenId::Dashboard,
        ScreenId::Transactions,
        ScreenId::Fraud,
        ScreenId::Customers,
        ScreenId::Risk,
        ScreenId::Monitor,
    ];

    /// Stable lowercase name used in logs and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            ScreenId::Dashboard => "dashboard",
            ScreenId::Transactions => "transactions",
            ScreenId::Fraud => "fraud",
            ScreenId::Customers => "customers",
            ScreenId::Risk => "risk",
            ScreenId::Monitor => "monitor",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScreenId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScreenId::ALL
            .iter()
            .copied()
            .find(|id| id.name() == s)
            .ok_or_else(|| format!("unknown screen '{s}' (one of: dashboard, transactions, fraud, customers, risk, monitor)"))
    }
}

/// Poll schedule for one screen.
#[derive(Clone, Copy, Debug)]
pub struct ScreenPlan {
    /// Which screen this is for.
    pub screen: ScreenId,
    /// How often it polls.
    pub cadence: Cadence,
    /// Primary route it reads (display only; joint screens read more).
    pub route: &'static str,
}

/// The single source of truth for which screen polls what, how often.
pub fn plan(screen: ScreenId) -> ScreenPlan {
    let (cadence, route) = match screen {
        ScreenId::Dashboard => (
            Cadence::Every(Duration::from_secs(30)),
            routes::DASHBOARD_STATS,
        ),
        ScreenId::Transactions => (Cadence::Once, routes::TRANSACTIONS),
        ScreenId::Fraud => (
            Cadence::Every(Duration::from_secs(15)),
            routes::FRAUD_ALERTS,
        ),
        ScreenId::Customers => (Cadence::Once, routes::CUSTOMERS),
        ScreenId::Risk => (Cadence::Once, routes::RISK_ASSESSMENT),
        ScreenId::Monitor => (Cadence::Every(Duration::from_secs(3)), routes::BATCH_JOBS),
    };
    ScreenPlan {
        screen,
        cadence,
        route,
    }
}

/// Owns the per-screen stores and the single active poller.
///
/// Navigation goes through [`Coordinator::show`]: the previous screen's
/// poller is stopped before the next one starts, so two pollers for data
/// screens never run at once and no timer leaks across navigation. The
/// heartbeat is not owned here and keeps running regardless.
pub struct Coordinator {
    client: ApiClient,
    dispatcher: Arc<CommandDispatcher>,
    active: Option<(ScreenId, PollHandle)>,
    /// Dashboard screen state.
    pub dashboard: Arc<ViewStateStore<DashboardData>>,
    /// Transactions screen state.
    pub transactions: Arc<ViewStateStore<Vec<Transaction>>>,
    /// Fraud screen state.
    pub fraud: Arc<ViewStateStore<Vec<FraudAlert>>>,
    /// Customers screen state.
    pub customers: Arc<ViewStateStore<CustomerData>>,
    /// Risk screen state.
    pub risk: Arc<ViewStateStore<RiskAssessment>>,
    /// Monitor screen state.
    pub monitor: Arc<ViewStateStore<Vec<BatchJob>>>,
}

impl Coordinator {
    /// Coordinator over `client`, routing acknowledged triggers through
    /// `dispatcher` to the monitor poller while that screen is shown.
    pub fn new(client: ApiClient, dispatcher: Arc<CommandDispatcher>) -> Self {
        Self {
            client,
            dispatcher,
            active: None,
            dashboard: Arc::new(ViewStateStore::new()),
            transactions: Arc::new(ViewStateStore::new()),
            fraud: Arc::new(ViewStateStore::new()),
            customers: Arc::new(ViewStateStore::new()),
            risk: Arc::new(ViewStateStore::new()),
            monitor: Arc::new(ViewStateStore::new()),
        }
    }

    /// Currently shown screen, if any.
    pub fn active_screen(&self) -> Option<ScreenId> {
        self.active.as_ref().map(|(screen, _)| *screen)
    }

    /// Navigate to `screen`. Stops whatever was showing first.
    pub async fn show(&mut self, screen: ScreenId) -> Result<(), PollError> {
        self.hide().await;

        let plan = plan(screen);
        let client = self.client.clone();
        let handle = match screen {
            ScreenId::Dashboard => poller::start(
                screen.name(),
                plan.cadence,
                self.dashboard.clone(),
                move || {
                    let client = client.clone();
                    async move { client.dashboard_data().await }
                },
            )?,
            ScreenId::Transactions => poller::start(
                screen.name(),
                plan.cadence,
                self.transactions.clone(),
                move || {
                    let client = client.clone();
                    async move { client.transactions(TRANSACTION_LIMIT).await }
                },
            )?,
            ScreenId::Fraud => {
                poller::start(screen.name(), plan.cadence, self.fraud.clone(), move || {
                    let client = client.clone();
                    async move { client.fraud_alerts().await }
                })?
            }
            ScreenId::Customers => poller::start(
                screen.name(),
                plan.cadence,
                self.customers.clone(),
                move || {
                    let client = client.clone();
                    async move { client.customer_data(CUSTOMER_LIMIT).await }
                },
            )?,
            ScreenId::Risk => {
                poller::start(screen.name(), plan.cadence, self.risk.clone(), move || {
                    let client = client.clone();
                    async move { client.risk_assessment().await }
                })?
            }
            ScreenId::Monitor => poller::start(
                screen.name(),
                plan.cadence,
                self.monitor.clone(),
                move || {
                    let client = client.clone();
                    async move { client.batch_jobs().await }
                },
            )?,
        };

        if screen == ScreenId::Monitor {
            self.dispatcher.point_at(Some(handle.refresher())).await;
        }
        info!("screen shown name={} cadence={}", screen.name(), plan.cadence);
        self.active = Some((screen, handle));
        Ok(())
    }

    /// Stop the active screen's poller, if any.
    pub async fn hide(&mut self) {
        if let Some((screen, mut handle)) = self.active.take() {
            if screen == ScreenId::Monitor {
                self.dispatcher.point_at(None).await;
            }
            handle.stop();
            info!("screen hidden name={}", screen.name());
        }
    }

    /// One-line digest of the active screen's state for the shell log.
    pub fn active_summary(&self) -> Option<String> {
        let (screen, _) = self.active.as_ref()?;
        let line = match screen {
            ScreenId::Dashboard => describe(&self.dashboard.snapshot()),
            ScreenId::Transactions => describe(&self.transactions.snapshot()),
            ScreenId::Fraud => describe(&self.fraud.snapshot()),
            ScreenId::Customers => describe(&self.customers.snapshot()),
            ScreenId::Risk => describe(&self.risk.snapshot()),
            ScreenId::Monitor => describe(&self.monitor.snapshot()),
        };
        Some(format!("{} {}", screen.name(), line))
    }
}

fn describe<T: Summarize>(snap: &Snapshot<T>) -> String {
    let tag = if snap.failures > 0 {
        format!("[{} fails={}]", snap.freshness, snap.failures)
    } else {
        format!("[{}]", snap.freshness)
    };
    match (&snap.payload, &snap.last_error) {
        (Some(payload), _) => format!("{tag} {}", payload.summary()),
        (None, Some(e)) => format!("{tag} {e}"),
        (None, None) => tag,
    }
}
