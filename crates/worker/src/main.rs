use anyhow::Result;
use clap::Parser;
use common::config::Settings;
use db::PgStore;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use youtube::{RedisLeases, WebSubClient};

mod jobs;

use jobs::resubscribe::Resubscriber;

#[derive(Debug, Parser)]
#[command(name = "yt-resub")]
#[command(about = "Keeps YouTube WebSub hub subscriptions alive", version)]
struct Args {
    /// Run a single sweep and exit.
    #[arg(long)]
    once: bool,
    #[arg(long, default_value_t = 3600)]
    interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let args = Args::parse();
    let settings = Settings::from_env()?;

    let pool = db::connect(&settings.database_url, 5).await?;
    db::ensure_schema(&pool).await?;

    let redis = redis::Client::open(settings.redis_url.as_str())?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let resubscriber = Resubscriber::new(
        PgStore::new(pool),
        WebSubClient::new(client, settings.hub.clone()),
        RedisLeases::new(redis),
        settings.resub_batch_size,
        chrono::Duration::seconds(settings.lease_renew_secs),
    );

    if args.once {
        resubscriber.sweep().await?;
        return Ok(());
    }

    info!(
        interval_secs = args.interval_secs,
        batch_size = settings.resub_batch_size,
        "worker starting"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval_secs.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = resubscriber.sweep().await {
                    error!(error = %err, "resubscription sweep failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("worker shutting down");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["yt-resub"]).unwrap();

        assert!(!args.once);
        assert_eq!(args.interval_secs, 3600);
    }

    #[test]
    fn test_args_once_with_interval() {
        let args =
            Args::try_parse_from(["yt-resub", "--once", "--interval-secs", "60"]).unwrap();

        assert!(args.once);
        assert_eq!(args.interval_secs, 60);
    }

    #[test]
    fn test_args_rejects_bad_interval() {
        assert!(Args::try_parse_from(["yt-resub", "--interval-secs", "soon"]).is_err());
    }
}
