use std::time::Duration;

use canchita_engine::{events::EventProducers, LifecycleApi, SqliteDatabase};
use chrono::Utc;
use log::*;
use tokio::task::JoinHandle;

/// Starts the cancellation sweep worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every tick, under-filled open matches with kickoff inside the next hour are cancelled and their
/// players refunded. The refund guard in the backend makes a re-run over the same match harmless.
pub fn start_cancellation_worker(
    db: SqliteDatabase,
    producers: EventProducers,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = LifecycleApi::new(db, producers);
        info!("🕰️ Match cancellation sweep worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Running cancellation sweep");
            match api.run_cancellation_sweep(Utc::now()).await {
                Ok(reports) if reports.is_empty() => trace!("🕰️ No matches needed cancelling"),
                Ok(reports) => {
                    info!("🕰️ {} under-filled matches cancelled", reports.len());
                    for report in &reports {
                        debug!(
                            "🕰️ Cancelled match {} ({} refunds issued)",
                            report.game.id,
                            report.refunds.len()
                        );
                    }
                },
                Err(e) => error!("🕰️ Error running cancellation sweep: {e}"),
            }
        }
    })
}

/// Starts the kickoff reminder worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_reminder_worker(db: SqliteDatabase, producers: EventProducers, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = LifecycleApi::new(db, producers);
        info!("🕰️ Kickoff reminder worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Running reminder sweep");
            match api.run_reminder_sweep(Utc::now()).await {
                Ok(0) => trace!("🕰️ No reminders were due"),
                Ok(sent) => info!("🕰️ {sent} kickoff reminders sent"),
                Err(e) => error!("🕰️ Error running reminder sweep: {e}"),
            }
        }
    })
}
