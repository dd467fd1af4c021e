use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{
    routes, BatchJob, CloudStatus, Customer, CustomerAnalytics, CustomerData, DashboardData,
    DashboardStats, FraudAlert, RiskAssessment, Transaction, TransactionAnalytics, TriggerReceipt,
};
use crate::error::{FetchError, FetchResult};

/// Typed HTTP client for the backend API.
///
/// Bodies are fetched as text and decoded separately so a malformed
/// response surfaces as [`FetchError::Decode`] rather than a transport
/// error.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base: String,
}

impl ApiClient {
    /// New client against `base`, e.g. `http://127.0.0.1:8000`.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            http: Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Base address this client talks to.
    pub fn base(&self) -> &str {
        &self.base
    }

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> FetchResult<T> {
        let url = format!("{}{}", self.base, path_and_query);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        debug!("get ok path={} bytes={}", path_and_query, body.len());
        Ok(serde_json::from_str(&body)?)
    }

    /// Headline dashboard figures.
    pub async fn dashboard_stats(&self) -> FetchResult<DashboardStats> {
        self.get_json(routes::DASHBOARD_STATS).await
    }

    /// Latest transactions, newest first.
    pub async fn transactions(&self, limit: u32) -> FetchResult<Vec<Transaction>> {
        self.get_json(&format!("{}?limit={}", routes::TRANSACTIONS, limit))
            .await
    }

    /// Daily trends and category breakdown.
    pub async fn transaction_analytics(&self) -> FetchResult<TransactionAnalytics> {
        self.get_json(routes::TRANSACTION_ANALYTICS).await
    }

    /// Open fraud alerts.
    pub async fn fraud_alerts(&self) -> FetchResult<Vec<FraudAlert>> {
        self.get_json(routes::FRAUD_ALERTS).await
    }

    /// Customer rows.
    pub async fn customers(&self, limit: u32) -> FetchResult<Vec<Customer>> {
        self.get_json(&format!("{}?limit={}", routes::CUSTOMERS, limit))
            .await
    }

    /// Segment and risk distributions.
    pub async fn customer_analytics(&self) -> FetchResult<CustomerAnalytics> {
        self.get_json(routes::CUSTOMER_ANALYTICS).await
    }

    /// Per-risk-band assessment metrics.
    pub async fn risk_assessment(&self) -> FetchResult<RiskAssessment> {
        self.get_json(routes::RISK_ASSESSMENT).await
    }

    /// Infrastructure heartbeat value.
    pub async fn cloud_status(&self) -> FetchResult<CloudStatus> {
        self.get_json(routes::CLOUD_STATUS).await
    }

    /// Active and recent batch jobs.
    pub async fn batch_jobs(&self) -> FetchResult<Vec<BatchJob>> {
        self.get_json(routes::BATCH_JOBS).await
    }

    /// Joint dashboard payload; fails as a whole if either half fails.
    pub async fn dashboard_data(&self) -> FetchResult<DashboardData> {
        let (stats, analytics) =
            tokio::try_join!(self.dashboard_stats(), self.transaction_analytics())?;
        Ok(DashboardData { stats, analytics })
    }

    /// Joint customers payload.
    pub async fn customer_data(&self, limit: u32) -> FetchResult<CustomerData> {
        let (analytics, customers) =
            tokio::try_join!(self.customer_analytics(), self.customers(limit))?;
        Ok(CustomerData {
            analytics,
            customers,
        })
    }

    /// Ask the backend to start `job_name`. The name is passed as a query
    /// parameter, so spaces and punctuation survive intact.
    pub async fn trigger_job(&self, job_name: &str) -> FetchResult<TriggerReceipt> {
        let url = format!("{}{}", self.base, routes::JOB_TRIGGER);
        let response = self
            .http
            .post(&url)
            .query(&[("job_name", job_name)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        debug!("trigger ok job={} bytes={}", job_name, body.len());
        Ok(serde_json::from_str(&body)?)
    }
}
