//! mhtrack - a package sensor for Matkahuolto parcel tracking.
//!
//! Logs in to the Matkahuolto web service, refreshes the user's shipments on
//! a fixed interval and prints the resulting sensor state as one JSON line
//! per refresh on stdout.

mod cache;
mod config;

use std::future::Future;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use mhtrack_core::{ApiClient, PackageSensor, SensorState};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cache::SnapshotCache;
use config::Config;

const USAGE: &str = "Usage: mhtrack [--config <path>] [--once]";

struct Args {
    config: Option<PathBuf>,
    once: bool,
}

fn parse_args() -> Result<Option<Args>> {
    let mut args = Args {
        config: None,
        once: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config needs a path\n{}", USAGE))?;
                args.config = Some(PathBuf::from(path));
            }
            "--once" => args.once = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(None);
            }
            other => bail!("Unknown argument {:?}\n{}", other, USAGE),
        }
    }
    Ok(Some(args))
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
    // Logs go to stderr; stdout carries sensor output only.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn publish(state: &SensorState) -> Result<()> {
    let line = serde_json::to_string(state)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()?;
    Ok(())
}

fn open_cache(config: &Config) -> Option<SnapshotCache> {
    match config.cache_dir().and_then(SnapshotCache::new) {
        Ok(cache) => Some(cache),
        Err(e) => {
            warn!(error = %e, "Snapshot cache disabled");
            None
        }
    }
}

async fn refresh(sensor: &mut PackageSensor, cache: Option<&SnapshotCache>) -> Result<()> {
    let state = sensor.update().await?;
    if state.available {
        if let Some(cache) = cache {
            if let Err(e) = cache.save(state) {
                warn!(error = %e, "Failed to cache sensor snapshot");
            }
        }
    }
    publish(state)
}

#[derive(Debug, PartialEq, Eq)]
enum Exit {
    Interrupted,
    Finished,
}

/// Refresh on every tick until `shutdown` resolves, or after one cycle with
/// `once`. `shutdown` is raced against the whole cycle, in-flight requests
/// included.
async fn run<S: Future>(
    sensor: &mut PackageSensor,
    cache: Option<&SnapshotCache>,
    ticker: &mut Interval,
    shutdown: S,
    once: bool,
) -> Exit {
    tokio::pin!(shutdown);

    loop {
        let cycle = async {
            ticker.tick().await;
            refresh(&mut *sensor, cache).await
        };

        tokio::select! {
            _ = &mut shutdown => return Exit::Interrupted,
            result = cycle => {
                if let Err(e) = result {
                    error!(error = %e, "Refresh failed");
                }
                if once {
                    return Exit::Finished;
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let Some(args) = parse_args()? else {
        return Ok(());
    };

    init_tracing();

    let config = Config::load(args.config.as_deref())?;
    config.validate()?;
    info!(
        username = config.username.as_deref().unwrap_or_default(),
        language = %config.language,
        interval_secs = config.scan_interval_secs,
        "mhtrack starting"
    );

    let mut client = ApiClient::new(config.credentials(), config.client_settings())
        .context("Failed to create API client")?;
    client
        .authenticate()
        .await
        .context("Initial login to Matkahuolto failed")?;

    let mut sensor = PackageSensor::new(client, config.sensor_options());

    let cache = open_cache(&config);
    if let Some(cache) = &cache {
        match cache.load() {
            Ok(Some(cached)) => {
                info!(age_minutes = cached.age_minutes(), "Restoring previous snapshot");
                sensor.restore(cached.data);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring unreadable snapshot"),
        }
    }

    let mut ticker = interval(config.scan_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    if run(&mut sensor, cache.as_ref(), &mut ticker, tokio::signal::ctrl_c(), args.once).await
        == Exit::Interrupted
    {
        info!("Interrupted");
    }

    info!("mhtrack shutting down");
    Ok(())
}
