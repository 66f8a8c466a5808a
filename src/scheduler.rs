//! Fixed-interval refresh loop.
//!
//! Each cycle fetches a fresh snapshot, extracts arrivals against the clock at
//! extraction time, and hands the outcome to a [`DisplaySink`]. Cycles share no
//! state; a failed cycle is logged and the loop moves on.

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::arrivals::{ArrivalList, ExtractRequest, extract};
use crate::error::{ConfigError, FeedError};
use crate::fetch::SnapshotSource;

/// Receives the outcome of every refresh cycle.
pub trait DisplaySink {
    fn render(&mut self, cycle: usize, outcome: &Result<ArrivalList, FeedError>) -> Result<()>;
}

/// Runs one fetch → extract pipeline.
pub async fn refresh<S>(source: &S, request: &ExtractRequest) -> Result<ArrivalList, FeedError>
where
    S: SnapshotSource + ?Sized,
{
    let snapshot = source.fetch().await?;
    extract(&snapshot, request, Utc::now())
}

/// Counts of how a [`RefreshScheduler::run`] went.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct RefreshScheduler {
    interval: Duration,
    cycles: usize,
}

impl RefreshScheduler {
    /// A scheduler that refreshes every `interval`, forever.
    pub fn new(interval: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(Self {
            interval,
            cycles: 0,
        })
    }

    /// Stop after `cycles` refreshes; 0 means run until the process exits.
    pub fn with_cycles(mut self, cycles: usize) -> Self {
        self.cycles = cycles;
        self
    }

    #[tracing::instrument(
        skip_all,
        fields(source = %source.describe(), stop_id = %request.target_stop(), interval_secs = self.interval.as_secs())
    )]
    pub async fn run<S, D>(&self, source: &S, request: &ExtractRequest, sink: &mut D) -> RunSummary
    where
        S: SnapshotSource + ?Sized,
        D: DisplaySink + ?Sized,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut summary = RunSummary::default();
        let mut auth_failures = 0usize;

        if self.cycles == 0 {
            info!("Refreshing until stopped. Press Ctrl+C to stop.");
        }

        while self.cycles == 0 || summary.cycles < self.cycles {
            ticker.tick().await;
            summary.cycles += 1;
            let cycle = summary.cycles;

            let outcome = refresh(source, request).await;

            match &outcome {
                Ok(list) => {
                    summary.succeeded += 1;
                    auth_failures = 0;
                    debug!(cycle, arrivals = list.len(), "Refresh cycle complete");
                }
                Err(e @ FeedError::Auth { .. }) => {
                    summary.failed += 1;
                    auth_failures += 1;
                    error!(
                        cycle,
                        error = %e,
                        kind = e.kind(),
                        consecutive = auth_failures,
                        "Feed rejected credential; check the API key"
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(cycle, error = %e, kind = e.kind(), "Refresh cycle failed, skipping");
                }
            }

            if let Err(e) = sink.render(cycle, &outcome) {
                error!(cycle, error = %e, "Display sink failed");
            }
        }

        info!(
            cycles = summary.cycles,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Refresh loop finished"
        );
        summary
    }
}
