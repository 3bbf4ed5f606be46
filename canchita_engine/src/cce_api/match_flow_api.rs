use std::fmt::Debug;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use cnc_common::Money;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    cce_api::errors::MatchFlowApiError,
    db::traits::{BatchSlotOutcome, CreatedMatch, JoinOutcome, LeaveOutcome, MatchManagement},
    db_types::{DailyMatch, GameType, MatchPlayer, MatchTeam, NewMatch},
    events::{EventProducers, PlayerJoinedEvent},
    helpers::{date_for_weekday, monday_of, parse_slot_time, slot_end, TargetWeek},
};

/// A batch-creation request: one field, one game type, and the cross product of the requested weekdays
/// and `HH:MM` slot strings within the target week.
#[derive(Debug, Clone)]
pub struct MatchBatchTemplate {
    pub name: String,
    pub field_id: i64,
    pub game_type: GameType,
    pub week: TargetWeek,
    pub days: Vec<Weekday>,
    pub slots: Vec<String>,
    pub price: Money,
}

/// A slot that was skipped because it was unavailable, not because anything failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedSlot {
    pub schedule_date: NaiveDate,
    pub start_time: NaiveTime,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub created: Vec<CreatedMatch>,
    pub skipped: Vec<SkippedSlot>,
}

/// A match with its two teams and current roster.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRoster {
    pub game: DailyMatch,
    pub teams: Vec<MatchTeam>,
    pub players: Vec<MatchPlayer>,
}

/// `MatchFlowApi` drives the match and team capacity engine: batch slot creation, the three join
/// flavours, leaving, and roster queries.
pub struct MatchFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B: Debug> Debug for MatchFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MatchFlowApi ({:?})", self.db)
    }
}

impl<B> MatchFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> MatchFlowApi<B>
where B: MatchManagement
{
    /// Expand a batch template into concrete slots and create each one. Unavailable slots are collected
    /// in the report rather than aborting the batch; a malformed template aborts before any slot is
    /// attempted.
    pub async fn create_match_batch(
        &self,
        template: MatchBatchTemplate,
        today: NaiveDate,
    ) -> Result<BatchReport, MatchFlowApiError> {
        let mut starts = Vec::with_capacity(template.slots.len());
        for slot in &template.slots {
            let start = parse_slot_time(slot).map_err(|e| MatchFlowApiError::InvalidTemplate(e.to_string()))?;
            starts.push(start);
        }
        let monday = monday_of(template.week, today);
        let mut created = Vec::new();
        let mut skipped = Vec::new();
        for day in &template.days {
            let date = date_for_weekday(monday, *day);
            for &start in &starts {
                let new_match = NewMatch {
                    name: template.name.clone(),
                    field_id: template.field_id,
                    game_type: template.game_type,
                    schedule_date: date,
                    start_time: start,
                    end_time: slot_end(start),
                    price: template.price,
                };
                let outcome = self
                    .db
                    .create_match_slot(new_match)
                    .await
                    .map_err(|e| MatchFlowApiError::DatabaseError(e.to_string()))?;
                match outcome {
                    BatchSlotOutcome::Created(m) => created.push(m),
                    BatchSlotOutcome::FieldBooked => skipped.push(SkippedSlot {
                        schedule_date: date,
                        start_time: start,
                        reason: "field already booked for this hour".to_string(),
                    }),
                    BatchSlotOutcome::SlotTaken => skipped.push(SkippedSlot {
                        schedule_date: date,
                        start_time: start,
                        reason: "a match already exists in this slot".to_string(),
                    }),
                }
            }
        }
        info!(
            "🏟️ Batch for field {} complete. {} matches created, {} slots skipped",
            template.field_id,
            created.len(),
            skipped.len()
        );
        Ok(BatchReport { created, skipped })
    }

    /// Free join. On success the rest of the roster is notified via the player-joined hook.
    pub async fn join_match(
        &self,
        match_id: i64,
        team_id: i64,
        user_id: i64,
    ) -> Result<JoinOutcome, MatchFlowApiError> {
        let outcome = self
            .db
            .join_match(match_id, team_id, user_id)
            .await
            .map_err(|e| MatchFlowApiError::DatabaseError(e.to_string()))?;
        if let JoinOutcome::Joined(seat) = &outcome {
            debug!("🏟️ Player {user_id} joined match {match_id} on team {team_id}");
            self.call_player_joined_hook(match_id, seat.player_id).await;
        }
        Ok(outcome)
    }

    /// Join backed by an already-completed order for `payment_id`. Idempotent: if the webhook seated the
    /// player first, the existing seat is returned.
    pub async fn paid_join(
        &self,
        match_id: i64,
        team_id: i64,
        user_id: i64,
        payment_id: &str,
    ) -> Result<JoinOutcome, MatchFlowApiError> {
        let outcome = self
            .db
            .paid_join(match_id, team_id, user_id, payment_id)
            .await
            .map_err(|e| MatchFlowApiError::DatabaseError(e.to_string()))?;
        if let JoinOutcome::Joined(seat) = &outcome {
            debug!("🏟️ Player {user_id} took a paid seat in match {match_id} (payment {payment_id})");
            self.call_player_joined_hook(match_id, seat.player_id).await;
        }
        Ok(outcome)
    }

    /// Join funded by consuming one entry from the user's bono pack.
    pub async fn bono_join(
        &self,
        match_id: i64,
        team_id: i64,
        user_id: i64,
        bono_id: i64,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome, MatchFlowApiError> {
        let outcome = self
            .db
            .bono_join(match_id, team_id, user_id, bono_id, now)
            .await
            .map_err(|e| MatchFlowApiError::DatabaseError(e.to_string()))?;
        if let JoinOutcome::Joined(seat) = &outcome {
            debug!("🏟️ Player {user_id} joined match {match_id} using bono {bono_id}");
            self.call_player_joined_hook(match_id, seat.player_id).await;
        }
        Ok(outcome)
    }

    pub async fn leave_match(&self, match_id: i64, user_id: i64) -> Result<LeaveOutcome, MatchFlowApiError> {
        self.db.leave_match(match_id, user_id).await.map_err(|e| MatchFlowApiError::DatabaseError(e.to_string()))
    }

    pub async fn roster(&self, match_id: i64) -> Result<MatchRoster, MatchFlowApiError> {
        let game = self
            .db
            .fetch_match(match_id)
            .await
            .map_err(|e| MatchFlowApiError::DatabaseError(e.to_string()))?
            .ok_or(MatchFlowApiError::MatchNotFound(match_id))?;
        let teams =
            self.db.fetch_teams(match_id).await.map_err(|e| MatchFlowApiError::DatabaseError(e.to_string()))?;
        let players =
            self.db.fetch_roster(match_id).await.map_err(|e| MatchFlowApiError::DatabaseError(e.to_string()))?;
        Ok(MatchRoster { game, teams, players })
    }

    async fn call_player_joined_hook(&self, match_id: i64, player_id: i64) {
        if self.producers.player_joined_producer.is_empty() {
            return;
        }
        let game = match self.db.fetch_match(match_id).await {
            Ok(Some(g)) => g,
            Ok(None) => return,
            Err(e) => {
                warn!("🏟️ Could not load match {match_id} for the player-joined hook: {e}");
                return;
            },
        };
        let recipient_tokens = match self.db.roster_device_tokens(match_id, Some(player_id)).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("🏟️ Could not load roster tokens for match {match_id}: {e}");
                Vec::new()
            },
        };
        for emitter in &self.producers.player_joined_producer {
            let event =
                PlayerJoinedEvent { game: game.clone(), player_id, recipient_tokens: recipient_tokens.clone() };
            emitter.publish_event(event).await;
        }
    }
}
