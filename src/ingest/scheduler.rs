// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ingest::IngestPipeline;

#[derive(Clone, Copy, Debug)]
pub struct RefreshSchedulerCfg {
    pub interval_secs: u64,
    /// Run one cycle right away instead of waiting a full interval.
    pub run_immediately: bool,
}

/// Spawn the periodic refresh job. Cycles never overlap: the next tick is
/// awaited only after the previous cycle finished, and missed ticks are skipped.
pub fn spawn_refresh_scheduler(
    pipeline: Arc<IngestPipeline>,
    cfg: RefreshSchedulerCfg,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = Duration::from_secs(cfg.interval_secs.max(1));
        let start = if cfg.run_immediately {
            tokio::time::Instant::now()
        } else {
            tokio::time::Instant::now() + period
        };
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let report = pipeline.refresh_cycle().await;
            counter!("ingest_runs_total").increment(1);

            tracing::info!(
                target: "ingest",
                social_stored = report.social.stored,
                news_stored = report.news.stored,
                failed = report.social.failed + report.news.failed,
                "refresh tick"
            );
        }
    })
}
