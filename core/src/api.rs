use serde::{Deserialize, Serialize};
use std::fmt;

/// Route paths for the backend API, all relative to the base address.
pub mod routes {
    /// Headline dashboard figures.
    pub const DASHBOARD_STATS: &str = "/api/dashboard/stats";
    /// Transaction rows, newest first (`?limit=N`).
    pub const TRANSACTIONS: &str = "/api/transactions";
    /// Daily trends and category breakdown.
    pub const TRANSACTION_ANALYTICS: &str = "/api/transactions/analytics";
    /// High-score fraud alerts.
    pub const FRAUD_ALERTS: &str = "/api/fraud/alerts";
    /// Customer rows (`?limit=N`).
    pub const CUSTOMERS: &str = "/api/customers";
    /// Segment and risk distributions.
    pub const CUSTOMER_ANALYTICS: &str = "/api/customers/analytics";
    /// Per-risk-band assessment metrics.
    pub const RISK_ASSESSMENT: &str = "/api/risk/assessment";
    /// Infrastructure heartbeat value.
    pub const CLOUD_STATUS: &str = "/api/cloud/status";
    /// Active and recent batch jobs.
    pub const BATCH_JOBS: &str = "/api/spark/jobs";
    /// Batch-job trigger command (`?job_name=X`).
    pub const JOB_TRIGGER: &str = "/api/spark/jobs/trigger";
}

/// Headline figures shown on the dashboard screen.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Count of all recorded transactions.
    pub total_transactions: u64,
    /// Sum of debit amounts.
    pub total_volume: f64,
    /// Distinct customers with at least one transaction.
    pub active_customers: u64,
    /// Transactions scoring past the fraud cutoff.
    pub fraud_alerts: u64,
    /// Mean transaction amount.
    pub avg_transaction: f64,
    /// Customers rated high risk.
    pub high_risk_accounts: u64,
}

/// One ledger transaction row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id (`TXN...`).
    pub id: String,
    /// Owning customer id (`CUST...`).
    pub customer_id: String,
    /// Amount in account currency.
    pub amount: f64,
    /// `debit` or `credit` (passed through, not interpreted).
    pub transaction_type: String,
    /// Merchant label.
    pub merchant: String,
    /// Spending category label.
    pub category: String,
    /// ISO-8601 timestamp string from the backend.
    pub timestamp: String,
    /// Fraud score 0..=100.
    pub fraud_score: f64,
    /// Location label.
    pub location: String,
}

/// One point of daily transaction volume.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DailyTrend {
    /// Calendar date (backend-formatted).
    pub date: String,
    /// Transactions that day.
    pub count: u64,
    /// Volume that day.
    pub volume: f64,
}

/// Aggregate volume for one spending category.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryVolume {
    /// Category label.
    pub category: String,
    /// Transactions in the category.
    pub count: u64,
    /// Total volume in the category.
    pub volume: f64,
}

/// Analytics payload for the transactions feed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionAnalytics {
    /// Last-30-days daily series.
    pub daily_trends: Vec<DailyTrend>,
    /// Per-category totals, largest first.
    pub category_breakdown: Vec<CategoryVolume>,
}

/// One fraud alert row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FraudAlert {
    /// Offending transaction id.
    pub transaction_id: String,
    /// Owning customer id.
    pub customer_id: String,
    /// Transaction amount.
    pub amount: f64,
    /// Fraud score that raised the alert.
    pub fraud_score: f64,
    /// Human-readable reason line.
    pub reason: String,
    /// ISO-8601 timestamp string.
    pub timestamp: String,
    /// Alert workflow status (passed through).
    pub status: String,
}

/// One customer row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Customer {
    /// Customer id (`CUST...`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Current balance.
    pub account_balance: f64,
    /// Risk band label (`Low`/`Medium`/`High`).
    pub risk_level: String,
    /// Commercial segment label.
    pub segment: String,
    /// ISO-8601 join date string.
    pub join_date: String,
}

/// Customer counts and balances per segment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SegmentSlice {
    /// Segment label.
    pub segment: String,
    /// Customers in the segment.
    pub count: u64,
    /// Mean balance in the segment.
    pub avg_balance: f64,
}

/// Customer count per risk band.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskSlice {
    /// Risk band label.
    pub risk_level: String,
    /// Customers in the band.
    pub count: u64,
}

/// Analytics payload for the customers feed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomerAnalytics {
    /// Per-segment distribution.
    pub segment_distribution: Vec<SegmentSlice>,
    /// Per-risk-band distribution.
    pub risk_distribution: Vec<RiskSlice>,
}

/// Assessment metrics for one risk band.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskMetric {
    /// Risk band label.
    pub risk_level: String,
    /// Transactions attributed to the band.
    pub transaction_count: u64,
    /// Mean fraud score in the band.
    pub avg_fraud_score: f64,
    /// Total amount moved in the band.
    pub total_amount: f64,
}

/// Risk assessment payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// One entry per risk band.
    pub risk_metrics: Vec<RiskMetric>,
}

/// Coarse health reported by the heartbeat endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudState {
    /// Everything nominal.
    Active,
    /// Degraded but up.
    Warning,
}

impl fmt::Display for CloudState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudState::Active => write!(f, "active"),
            CloudState::Warning => write!(f, "warning"),
        }
    }
}

/// Shared infrastructure heartbeat value. Published whole; readers never
/// see a mix of fields from two different checks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CloudStatus {
    /// Coarse health.
    pub status: CloudState,
    /// Reporting region, e.g. `us-east-1`.
    pub region: String,
    /// Uptime percentage over the reporting window.
    pub uptime: f64,
    /// ISO-8601 timestamp of the backend-side check.
    pub last_check: String,
}

/// One batch job, running or recently finished.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchJob {
    /// Job id (`job_...`).
    pub job_id: String,
    /// Job name, one of the trigger catalog.
    pub job_name: String,
    /// `running`, `completed`, ... (passed through).
    pub status: String,
    /// Progress 0..=100.
    pub progress: f64,
    /// ISO-8601 start timestamp string.
    pub started_at: String,
    /// Wall-clock seconds, present once finished.
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Backend acknowledgement for a job trigger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TriggerReceipt {
    /// Confirmation line from the backend.
    pub message: String,
}

/// Joint payload for the dashboard screen; both halves land as one unit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DashboardData {
    /// Headline figures.
    pub stats: DashboardStats,
    /// Transaction analytics for the charts.
    pub analytics: TransactionAnalytics,
}

/// Joint payload for the customers screen.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomerData {
    /// Segment/risk distributions.
    pub analytics: CustomerAnalytics,
    /// Sample of customer rows.
    pub customers: Vec<Customer>,
}

/// Batch jobs the console knows how to trigger.
pub const JOB_CATALOG: [&str; 4] = [
    "Transaction Aggregation",
    "Fraud Detection",
    "Customer Segmentation",
    "Risk Analysis",
];

/// One-line digest of a payload for log output. This is the whole
/// presentation layer of the headless shell.
pub trait Summarize {
    /// Short human-readable digest (row counts, headline figures).
    fn summary(&self) -> String;
}

impl Summarize for DashboardData {
    fn summary(&self) -> String {
        format!(
            "{} txns, volume {:.2}, {} fraud alerts",
            self.stats.total_transactions, self.stats.total_volume, self.stats.fraud_alerts
        )
    }
}

impl Summarize for Vec<Transaction> {
    fn summary(&self) -> String {
        format!("{} transactions", self.len())
    }
}

impl Summarize for Vec<FraudAlert> {
    fn summary(&self) -> String {
        let top = self.iter().map(|a| a.fraud_score).fold(0.0_f64, f64::max);
        format!("{} alerts, top score {:.1}", self.len(), top)
    }
}

impl Summarize for CustomerData {
    fn summary(&self) -> String {
        format!(
            "{} customers, {} segments",
            self.customers.len(),
            self.analytics.segment_distribution.len()
        )
    }
}

impl Summarize for RiskAssessment {
    fn summary(&self) -> String {
        format!("{} risk bands", self.risk_metrics.len())
    }
}

impl Summarize for Vec<BatchJob> {
    fn summary(&self) -> String {
        let running = self.iter().filter(|j| j.status == "running").count();
        format!("{} jobs, {} running", self.len(), running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_status_decodes_backend_shape() {
        let body = r#"{"status":"active","region":"us-east-1","uptime":99.98,"last_check":"2024-01-01T00:00:00Z"}"#;
        let s: CloudStatus = serde_json::from_str(body).unwrap();
        assert_eq!(s.status, CloudState::Active);
        assert_eq!(s.region, "us-east-1");
    }

    #[test]
    fn cloud_state_rejects_unknown_values() {
        let body = r#"{"status":"down","region":"r","uptime":1.0,"last_check":"t"}"#;
        assert!(serde_json::from_str::<CloudStatus>(body).is_err());
    }

    #[test]
    fn batch_job_duration_defaults_to_none() {
        let body = r#"{"job_id":"job_1","job_name":"Fraud Detection","status":"running","progress":40.0,"started_at":"t"}"#;
        let j: BatchJob = serde_json::from_str(body).unwrap();
        assert!(j.duration.is_none());
    }

    #[test]
    fn job_summary_counts_running() {
        let jobs = vec![
            BatchJob {
                job_id: "job_1".into(),
                job_name: "Fraud Detection".into(),
                status: "running".into(),
                progress: 10.0,
                started_at: "t".into(),
                duration: None,
            },
            BatchJob {
                job_id: "job_2".into(),
                job_name: "Risk Analysis".into(),
                status: "completed".into(),
                progress: 100.0,
                started_at: "t".into(),
                duration: Some(10.0),
            },
        ];
        assert_eq!(jobs.summary(), "2 jobs, 1 running");
    }
}
