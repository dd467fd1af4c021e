use std::str::FromStr;

use clap::{Parser, Subcommand};
use tracing::info;

use bw_core::api::Summarize;
use bw_core::cfg::{self, AppId};
use bw_core::client::ApiClient;
use bw_core::logx;
use bw_core::sync::coordinator::{self, ScreenId, CUSTOMER_LIMIT, TRANSACTION_LIMIT};

const APP: AppId = AppId {
    qualifier: "com",
    organization: "local",
    application: env!("CARGO_PKG_NAME"),
};

#[derive(Parser)]
#[command(name=env!("CARGO_PKG_NAME"), version, about="Bankwatch backend probe")]
struct Cli {
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the per-screen poll schedule
    Plan,
    /// Fetch one screen's data and print its digest
    Fetch {
        /// Screen whose data to fetch
        #[arg(value_parser = ScreenId::from_str)]
        screen: ScreenId,
    },
    /// Trigger a batch job and print the acknowledgement
    Trigger {
        /// Job name, e.g. "Fraud Detection"
        job: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    logx::init(level);

    let c = cfg::load_or_init(&APP)?;

    match cli.cmd {
        Command::Plan => {
            for screen in ScreenId::ALL {
                let plan = coordinator::plan(screen);
                println!("{:<13} {:<30} {}", screen.name(), plan.route, plan.cadence);
            }
        }
        Command::Fetch { screen } => {
            let client = ApiClient::new(&c.backend_url);
            info!("fetch screen={} backend={}", screen.name(), client.base());
            let line = match screen {
                ScreenId::Dashboard => client.dashboard_data().await?.summary(),
                ScreenId::Transactions => client.transactions(TRANSACTION_LIMIT).await?.summary(),
                ScreenId::Fraud => client.fraud_alerts().await?.summary(),
                ScreenId::Customers => client.customer_data(CUSTOMER_LIMIT).await?.summary(),
                ScreenId::Risk => client.risk_assessment().await?.summary(),
                ScreenId::Monitor => client.batch_jobs().await?.summary(),
            };
            println!("{} {}", screen.name(), line);
        }
        Command::Trigger { job } => {
            let client = ApiClient::new(&c.backend_url);
            let receipt = client.trigger_job(&job).await?;
            println!("{}", receipt.message);
        }
    }
    Ok(())
}
