use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    cce_api::errors::LifecycleApiError,
    db::traits::{CancellationReport, LifecycleManagement},
    events::{EventProducers, MatchCancelledEvent, MatchReminderEvent, Refund},
};

/// `LifecycleApi` runs the two periodic sweeps: cancelling under-filled matches shortly before
/// kickoff (with refunds), and sending kickoff reminders.
pub struct LifecycleApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for LifecycleApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LifecycleApi")
    }
}

impl<B> LifecycleApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> LifecycleApi<B>
where B: LifecycleManagement
{
    /// Cancel every open, under-filled match whose kickoff is within the next hour. Each cancellation
    /// is one backend transaction (status flip, booking release, guarded refunds); a sweep that dies
    /// halfway simply leaves the rest for the next run.
    pub async fn run_cancellation_sweep(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<CancellationReport>, LifecycleApiError> {
        let candidates = self
            .db
            .matches_pending_cancellation(now)
            .await
            .map_err(|e| LifecycleApiError::DatabaseError(e.to_string()))?;
        if candidates.is_empty() {
            trace!("🕰️ No under-filled matches due for cancellation");
            return Ok(Vec::new());
        }
        info!("🕰️ {} under-filled matches are due for cancellation", candidates.len());
        let mut reports = Vec::with_capacity(candidates.len());
        for game in candidates {
            let report = self
                .db
                .cancel_match_with_refunds(game.id)
                .await
                .map_err(|e| LifecycleApiError::DatabaseError(e.to_string()))?;
            self.call_match_cancelled_hook(&report).await;
            reports.push(report);
        }
        Ok(reports)
    }

    /// Publish every due kickoff reminder and mark it sent. Marking happens after publication whether or
    /// not any handler is subscribed; a reminder is attempted at most once.
    pub async fn run_reminder_sweep(&self, now: DateTime<Utc>) -> Result<usize, LifecycleApiError> {
        let due =
            self.db.due_reminders(now).await.map_err(|e| LifecycleApiError::DatabaseError(e.to_string()))?;
        let count = due.len();
        if count > 0 {
            info!("🕰️ {count} kickoff reminders are due");
        }
        for reminder in due {
            for emitter in &self.producers.match_reminder_producer {
                let event = MatchReminderEvent {
                    game: reminder.game.clone(),
                    recipient_tokens: reminder.recipient_tokens.clone(),
                };
                emitter.publish_event(event).await;
            }
            self.db
                .mark_reminder_sent(reminder.event_id)
                .await
                .map_err(|e| LifecycleApiError::DatabaseError(e.to_string()))?;
        }
        Ok(count)
    }

    async fn call_match_cancelled_hook(&self, report: &CancellationReport) {
        for emitter in &self.producers.match_cancelled_producer {
            let event = MatchCancelledEvent {
                game: report.game.clone(),
                refunds: report
                    .refunds
                    .iter()
                    .map(|(user_id, amount)| Refund { user_id: *user_id, amount: *amount })
                    .collect(),
                recipient_tokens: report.recipient_tokens.clone(),
            };
            emitter.publish_event(event).await;
        }
    }
}
