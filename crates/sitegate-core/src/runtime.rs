//! Trigger loop for the long-running daemon.
//!
//! Turns the three trigger sources (first pass, interval tick, settings
//! write) into [`TriggerKind`]s and hands each to its own reconciliation
//! task. A failing pass is logged by the reconciler and never stops the loop;
//! the next tick re-attempts.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::reconciler::Reconciler;
use crate::trigger::TriggerKind;

/// Counts of passes started during one [`run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub dispatched: usize,
    pub failed: usize,
}

/// Run until `shutdown` resolves, then wait for passes still in flight.
pub async fn run<F>(
    reconciler: Reconciler,
    initial: TriggerKind,
    interval: Duration,
    shutdown: F,
) -> RunStats
where
    F: Future<Output = ()>,
{
    let mut changes = reconciler.store().subscribe();
    let mut changes_open = true;
    let mut tasks = JoinSet::new();
    let mut stats = RunStats::default();

    info!(%initial, interval_secs = interval.as_secs(), "SiteGate daemon started");
    dispatch(&mut tasks, &mut stats, &reconciler, initial);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            _ = ticker.tick() => {
                dispatch(&mut tasks, &mut stats, &reconciler, TriggerKind::Alarm);
            }
            change = changes.recv(), if changes_open => match change {
                Ok(change) => {
                    debug!(keys = ?change.keys, "Settings changed");
                    dispatch(&mut tasks, &mut stats, &reconciler, TriggerKind::SettingsChanged);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed settings notifications");
                    dispatch(&mut tasks, &mut stats, &reconciler, TriggerKind::SettingsChanged);
                }
                Err(RecvError::Closed) => {
                    warn!("Settings notifications closed, relying on the interval");
                    changes_open = false;
                }
            },
        }

        while let Some(joined) = tasks.try_join_next() {
            record(&mut stats, joined);
        }
    }

    while let Some(joined) = tasks.join_next().await {
        record(&mut stats, joined);
    }
    info!(dispatched = stats.dispatched, failed = stats.failed, "SiteGate daemon stopped");
    stats
}

fn dispatch(
    tasks: &mut JoinSet<bool>,
    stats: &mut RunStats,
    reconciler: &Reconciler,
    trigger: TriggerKind,
) {
    let reconciler = reconciler.clone();
    stats.dispatched += 1;
    tasks.spawn(async move { reconciler.reconcile(trigger).await.is_ok() });
}

fn record(stats: &mut RunStats, joined: Result<bool, tokio::task::JoinError>) {
    match joined {
        Ok(true) => {}
        Ok(false) => stats.failed += 1,
        Err(e) => {
            warn!(error = %e, "Reconciliation task aborted");
            stats.failed += 1;
        }
    }
}
