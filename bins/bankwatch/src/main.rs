use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::time::{interval, interval_at, Instant, Interval};
use tracing::{info, warn};

use bw_core::cfg::{self, AppId};
use bw_core::client::ApiClient;
use bw_core::logx;
use bw_core::sync::command::{CommandDispatcher, Notice};
use bw_core::sync::coordinator::{Coordinator, ScreenId};
use bw_core::sync::heartbeat::CloudStatusHeartbeat;

const APP: AppId = AppId {
    qualifier: "com",
    organization: "local",
    application: env!("CARGO_PKG_NAME"), // <- no literal; comes from crate name
};

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"), version, about = "Bank ops console, headless shell")]
struct Cli {
    /// Screen to show at start
    #[arg(long, default_value = "dashboard", value_parser = ScreenId::from_str)]
    screen: ScreenId,
    /// Rotate through all screens every N seconds
    #[arg(long)]
    rotate: Option<u64>,
    /// Trigger this batch job shortly after start
    #[arg(long)]
    trigger: Option<String>,
    /// Log level override (info,debug,trace)
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let c = cfg::load_or_init(&APP)?;
    let level = cli.log.as_deref().unwrap_or(&c.log_level);
    logx::init(level);

    info!("{} boot backend={}", APP.application, c.backend_url);
    let client = ApiClient::new(&c.backend_url);

    let heartbeat = CloudStatusHeartbeat::start(client.clone())?;
    let (dispatcher, mut notices) = CommandDispatcher::new(client.clone());
    let dispatcher = Arc::new(dispatcher);
    let mut coordinator = Coordinator::new(client, dispatcher.clone());
    coordinator.show(cli.screen).await?;

    if let Some(job) = cli.trigger.clone() {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            // Give the first poll a moment to land.
            tokio::time::sleep(Duration::from_millis(500)).await;
            let outcome = dispatcher.trigger(&job).await;
            info!("startup trigger job={} outcome={:?}", job, outcome);
        });
    }

    let mut next_idx = ScreenId::ALL
        .iter()
        .position(|s| *s == cli.screen)
        .unwrap_or(0);
    let mut rotate = cli.rotate.map(|secs| {
        let period = Duration::from_secs(secs.max(1));
        interval_at(Instant::now() + period, period)
    });
    let mut summary = interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c, shutting down");
                break;
            }
            Some(notice) = notices.recv() => match notice {
                Notice::JobTriggered { job, message } => info!("toast ok job={} msg={}", job, message),
                Notice::JobFailed { job, error } => warn!("toast fail job={} err={}", job, error),
            },
            _ = summary.tick() => {
                let view = coordinator
                    .active_summary()
                    .unwrap_or_else(|| "idle".to_string());
                match heartbeat.snapshot().payload {
                    Some(status) => info!(
                        "view {} | cloud {} uptime={:.2}",
                        view, status.status, status.uptime
                    ),
                    None => info!("view {} | cloud pending", view),
                }
            }
            _ = next_rotation(&mut rotate) => {
                next_idx = (next_idx + 1) % ScreenId::ALL.len();
                coordinator.show(ScreenId::ALL[next_idx]).await?;
            }
        }
    }

    coordinator.hide().await;
    heartbeat.stop();
    info!("{} stopped", APP.application);
    Ok(())
}

async fn next_rotation(tick: &mut Option<Interval>) {
    match tick {
        Some(iv) => {
            iv.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
