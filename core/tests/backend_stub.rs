//! Client and dispatcher behavior against a real HTTP stub backend.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::time::timeout;

use bw_core::api::{routes, BatchJob, CloudState, CloudStatus, TriggerReceipt};
use bw_core::client::ApiClient;
use bw_core::error::FetchError;
use bw_core::sync::command::{AckState, CommandDispatcher, Notice, TriggerOutcome};
use bw_core::sync::coordinator::{Coordinator, ScreenId};
use bw_core::sync::heartbeat::CloudStatusHeartbeat;

#[derive(Clone)]
struct Stub {
    jobs: Arc<Mutex<Vec<BatchJob>>>,
    jobs_calls: Arc<AtomicU32>,
    trigger_calls: Arc<AtomicU32>,
    fail_trigger: Arc<AtomicBool>,
    slow_trigger: Arc<AtomicBool>,
}

impl Stub {
    fn new(seed: Vec<BatchJob>) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(seed)),
            jobs_calls: Arc::new(AtomicU32::new(0)),
            trigger_calls: Arc::new(AtomicU32::new(0)),
            fail_trigger: Arc::new(AtomicBool::new(false)),
            slow_trigger: Arc::new(AtomicBool::new(false)),
        }
    }
}

fn seed_job(id: &str, name: &str) -> BatchJob {
    BatchJob {
        job_id: id.to_string(),
        job_name: name.to_string(),
        status: "running".to_string(),
        progress: 40.0,
        started_at: "2024-01-01T00:00:00Z".to_string(),
        duration: None,
    }
}

async fn cloud_status() -> Json<CloudStatus> {
    Json(CloudStatus {
        status: CloudState::Active,
        region: "us-east-1".to_string(),
        uptime: 99.95,
        last_check: "2024-01-01T00:00:00Z".to_string(),
    })
}

async fn batch_jobs(State(stub): State<Stub>) -> Json<Vec<BatchJob>> {
    stub.jobs_calls.fetch_add(1, Ordering::SeqCst);
    Json(stub.jobs.lock().unwrap().clone())
}

#[derive(Deserialize)]
struct TriggerParams {
    job_name: String,
}

async fn trigger(
    State(stub): State<Stub>,
    Query(params): Query<TriggerParams>,
) -> Result<Json<TriggerReceipt>, StatusCode> {
    stub.trigger_calls.fetch_add(1, Ordering::SeqCst);
    if stub.slow_trigger.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    if stub.fail_trigger.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let mut jobs = stub.jobs.lock().unwrap();
    let job_id = format!("job_{}", jobs.len() + 1);
    jobs.push(BatchJob {
        job_id,
        job_name: params.job_name.clone(),
        status: "running".to_string(),
        progress: 0.0,
        started_at: "2024-01-01T00:00:00Z".to_string(),
        duration: None,
    });
    Ok(Json(TriggerReceipt {
        message: format!("Spark job \"{}\" triggered successfully", params.job_name),
    }))
}

async fn not_json() -> &'static str {
    "plain text, not a payload"
}

async fn serve(stub: Stub) -> String {
    let app = Router::new()
        .route(routes::CLOUD_STATUS, get(cloud_status))
        .route(routes::BATCH_JOBS, get(batch_jobs))
        .route(routes::JOB_TRIGGER, post(trigger))
        .route(routes::RISK_ASSESSMENT, get(not_json))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn wait_for(cond: impl Fn() -> bool) {
    timeout(Duration::from_secs(3), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

#[tokio::test]
async fn typed_getters_decode_and_classify_errors() {
    let stub = Stub::new(vec![seed_job("job_1", "Transaction Aggregation")]);
    let base = serve(stub).await;
    let client = ApiClient::new(&base);

    let status = client.cloud_status().await.unwrap();
    assert_eq!(status.status, CloudState::Active);
    assert_eq!(status.region, "us-east-1");

    let jobs = client.batch_jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].job_name, "Transaction Aggregation");

    // Unknown route answers 404.
    match client.transactions(5).await {
        Err(FetchError::Status(404)) => {}
        other => panic!("expected status error, got {other:?}"),
    }

    // A 200 with a malformed body is a decode error.
    assert!(matches!(
        client.risk_assessment().await,
        Err(FetchError::Decode(_))
    ));
}

#[tokio::test]
async fn acked_trigger_refetches_job_list_before_next_tick() {
    let stub = Stub::new(vec![seed_job("job_1", "Transaction Aggregation")]);
    let base = serve(stub.clone()).await;
    let client = ApiClient::new(&base);

    let (dispatcher, mut notices) = CommandDispatcher::new(client.clone());
    let dispatcher = Arc::new(dispatcher);
    let mut coordinator = Coordinator::new(client, dispatcher.clone());
    coordinator.show(ScreenId::Monitor).await.unwrap();

    let monitor = coordinator.monitor.clone();
    wait_for(move || monitor.snapshot().payload.is_some()).await;
    let calls_before = stub.jobs_calls.load(Ordering::SeqCst);

    let outcome = dispatcher.trigger("Fraud Detection").await;
    assert_eq!(outcome, TriggerOutcome::Acked);
    let notice = timeout(Duration::from_secs(1), notices.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(notice, Notice::JobTriggered { ref job, .. } if job == "Fraud Detection"));

    // The forced cycle lands well inside the 3s monitor cadence.
    let monitor = coordinator.monitor.clone();
    wait_for(move || {
        monitor
            .snapshot()
            .payload
            .map(|jobs| jobs.iter().any(|j| j.job_name == "Fraud Detection"))
            .unwrap_or(false)
    })
    .await;
    assert_eq!(stub.jobs_calls.load(Ordering::SeqCst), calls_before + 1);

    coordinator.hide().await;
}

#[tokio::test]
async fn failed_trigger_emits_notice_and_leaves_store_alone() {
    let stub = Stub::new(vec![seed_job("job_1", "Risk Analysis")]);
    stub.fail_trigger.store(true, Ordering::SeqCst);
    let base = serve(stub.clone()).await;
    let client = ApiClient::new(&base);

    let (dispatcher, mut notices) = CommandDispatcher::new(client.clone());
    let dispatcher = Arc::new(dispatcher);
    let mut coordinator = Coordinator::new(client, dispatcher.clone());
    coordinator.show(ScreenId::Monitor).await.unwrap();

    let monitor = coordinator.monitor.clone();
    wait_for(move || monitor.snapshot().payload.is_some()).await;
    let before = coordinator.monitor.snapshot();
    let calls_before = stub.jobs_calls.load(Ordering::SeqCst);

    let outcome = dispatcher.trigger("Customer Segmentation").await;
    assert_eq!(outcome, TriggerOutcome::Failed);
    let notice = timeout(Duration::from_secs(1), notices.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(notice, Notice::JobFailed { ref job, .. } if job == "Customer Segmentation"));

    // No forced refetch, same published payload.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(stub.jobs_calls.load(Ordering::SeqCst), calls_before);
    let after = coordinator.monitor.snapshot();
    assert!(Arc::ptr_eq(
        before.payload.as_ref().unwrap(),
        after.payload.as_ref().unwrap()
    ));

    let commands = dispatcher.commands().await;
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].state, AckState::Failed);

    coordinator.hide().await;
}

#[tokio::test]
async fn duplicate_trigger_while_pending_is_rejected() {
    let stub = Stub::new(Vec::new());
    stub.slow_trigger.store(true, Ordering::SeqCst);
    let base = serve(stub.clone()).await;
    let client = ApiClient::new(&base);

    let (dispatcher, _notices) = CommandDispatcher::new(client);
    let dispatcher = Arc::new(dispatcher);

    let first = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.trigger("Risk Analysis").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = dispatcher.trigger("Risk Analysis").await;
    assert_eq!(second, TriggerOutcome::AlreadyPending);

    assert_eq!(first.await.unwrap(), TriggerOutcome::Acked);
    assert_eq!(stub.trigger_calls.load(Ordering::SeqCst), 1);

    // Once resolved, the same job can be triggered again.
    stub.slow_trigger.store(false, Ordering::SeqCst);
    assert_eq!(
        dispatcher.trigger("Risk Analysis").await,
        TriggerOutcome::Acked
    );
    assert_eq!(stub.trigger_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn retrigger_supersedes_the_resolved_entry_for_the_same_job() {
    let stub = Stub::new(Vec::new());
    stub.fail_trigger.store(true, Ordering::SeqCst);
    let base = serve(stub.clone()).await;
    let client = ApiClient::new(&base);

    let (dispatcher, _notices) = CommandDispatcher::new(client);
    assert_eq!(
        dispatcher.trigger("Fraud Detection").await,
        TriggerOutcome::Failed
    );

    stub.fail_trigger.store(false, Ordering::SeqCst);
    assert_eq!(
        dispatcher.trigger("Fraud Detection").await,
        TriggerOutcome::Acked
    );
    assert_eq!(stub.trigger_calls.load(Ordering::SeqCst), 2);

    // One entry per job name: the retrigger replaced the failed one.
    let commands = dispatcher.commands().await;
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].name, "Fraud Detection");
    assert_eq!(commands[0].state, AckState::Acked);
}

#[tokio::test]
async fn heartbeat_first_value_lands_promptly() {
    let stub = Stub::new(Vec::new());
    let base = serve(stub).await;
    let client = ApiClient::new(&base);

    let heartbeat = CloudStatusHeartbeat::start(client).unwrap();
    let mut rx = heartbeat.subscribe();
    timeout(Duration::from_secs(2), async {
        while rx.borrow_and_update().payload.is_none() {
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("no heartbeat value arrived");

    let snap = heartbeat.snapshot();
    let status = snap.payload.expect("payload present");
    assert_eq!(status.status, CloudState::Active);
    heartbeat.stop();
}
