//! Market Bites: binary entrypoint.
//! Boots the Axum HTTP server, wires stores, providers and workers, and
//! starts the periodic ingestion job.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use market_bites::config::AppConfig;
use market_bites::ingest::scheduler::{spawn_refresh_scheduler, RefreshSchedulerCfg};
use market_bites::metrics::Metrics;
use market_bites::App;

/// `RUST_LOG` filter (default `market_bites=info,warn`); JSON lines when
/// `LOG_FORMAT=json`, compact text otherwise.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("market_bites=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    // Shuttle may have installed a subscriber already.
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::load_default().context("loading market_bites config")?;
    let metrics = Metrics::init().context("initialising metrics")?;
    let app = App::from_env(config).await?;

    if env_flag("POPULATE_ON_START") {
        let ingest = app.ingest.clone();
        tokio::spawn(async move {
            let (news, social) = ingest.populate().await;
            tracing::info!(
                target: "ingest",
                news_stored = news.stored,
                social_stored = social.stored,
                "initial populate finished"
            );
        });
    }

    if env_flag("INGEST_DISABLED") {
        tracing::warn!(target: "ingest", "refresh scheduler disabled");
    } else {
        spawn_refresh_scheduler(
            app.ingest.clone(),
            RefreshSchedulerCfg {
                interval_secs: app.config.ingest.interval_secs,
                run_immediately: true,
            },
        );
    }

    let router = app.router().merge(metrics.router());
    Ok(router.into())
}
