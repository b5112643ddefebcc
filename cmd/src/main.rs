use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use abi::config::{Config, LogConfig};
use abi::errors::Result;
use social::SocialCore;

#[derive(Debug, Parser)]
#[command(version, about = "maintenance tasks for the social store")]
struct Cli {
    /// yaml config file
    #[arg(short, long, default_value = "./abi/fixtures/social.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// add the missing half of one-sided friendships
    Reconcile {
        /// only repair around this user
        #[arg(long)]
        user: Option<String>,
    },
}

fn init_tracing(log: &LogConfig) -> Option<WorkerGuard> {
    let builder = tracing_subscriber::FmtSubscriber::builder()
        .with_line_number(true)
        .with_max_level(log.level());

    match &log.output {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "social.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            builder.with_writer(writer).with_ansi(false).init();
            Some(guard)
        }
        None => {
            builder.init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    // keep the guard alive so buffered lines reach the file
    let _guard = init_tracing(&config.log);

    let store = db::store(&config).await?;
    let core = SocialCore::new(store, &config);

    match cli.command {
        Command::Reconcile { user } => {
            let repaired = match user {
                Some(user_id) => core.relationships.reconcile(&user_id).await?,
                None => core.relationships.reconcile_all().await?,
            };
            info!("reconcile done, {} friendship edges repaired", repaired);
        }
    }

    Ok(())
}
