use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use sitegate_core::{runtime, App, Clock, FixedClock, SystemClock, TriggerKind};

#[derive(Args)]
pub struct RunArgs {
    /// Seconds between periodic reconciliations (overrides daemon.interval_secs)
    #[arg(long)]
    interval: Option<u64>,
}

#[derive(Args)]
pub struct ReconcileArgs {
    /// Evaluate the window at this hour instead of the local time
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
    hour: Option<u8>,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

pub(crate) fn clock(hour: Option<u8>) -> Arc<dyn Clock> {
    match hour {
        Some(hour) => Arc::new(FixedClock(hour)),
        None => Arc::new(SystemClock),
    }
}

pub async fn run(app: App, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let interval = args
        .interval
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| app.config.daemon.interval());

    let reconciler = app.reconciler(Arc::new(SystemClock))?;
    let watcher = app.store.spawn_watcher(app.config.daemon.settings_poll());

    let stats = runtime::run(
        reconciler,
        TriggerKind::initial(app.first_run),
        interval,
        async {
            let _ = tokio::signal::ctrl_c().await;
        },
    )
    .await;
    watcher.abort();

    eprintln!(
        "stopped after {} reconciliation(s), {} failed",
        stats.dispatched, stats.failed
    );
    Ok(())
}

pub async fn reconcile(app: App, args: ReconcileArgs) -> Result<(), Box<dyn std::error::Error>> {
    let reconciler = app.reconciler(clock(args.hour))?;
    let report = reconciler.reconcile(TriggerKind::Manual).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.should_block {
        println!(
            "blocking at {:02}:00: {} rule(s) active in {}",
            report.hour,
            report.added.len(),
            report.owned
        );
    } else {
        println!(
            "not blocking at {:02}:00: removed {} rule(s)",
            report.hour,
            report.removed.len()
        );
    }
    Ok(())
}
