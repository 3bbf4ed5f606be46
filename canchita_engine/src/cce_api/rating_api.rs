use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    cce_api::errors::RatingApiError,
    db::traits::{MatchManagement, MvpTally, RatingManagement, RatingSubmitOutcome},
    db_types::{MatchRating, RatingEntry, UserStats},
    events::{EventProducers, MvpAwardedEvent},
};

/// Votes needed to be congratulated as MVP: 75 percent of the match's participants, rounded up.
pub fn mvp_threshold(participants: usize) -> i64 {
    ((3 * participants + 3) / 4) as i64
}

/// `RatingApi` handles post-match peer ratings, derived reputation aggregates and MVP awards.
pub struct RatingApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for RatingApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RatingApi")
    }
}

impl<B> RatingApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> RatingApi<B>
where B: RatingManagement + MatchManagement
{
    /// Store one rater's batch, then recompute every participant's aggregate and run the MVP check.
    ///
    /// Scores outside 1..=5, self-ratings and an MVP vote that does not name one of the rated players
    /// reject the whole batch up front. Preconditions (match ended, rater participated, no prior batch)
    /// are enforced in the backend transaction and come back as outcomes.
    pub async fn submit_ratings(
        &self,
        match_id: i64,
        rater_id: i64,
        entries: &[RatingEntry],
        mvp_vote: i64,
        now: DateTime<Utc>,
    ) -> Result<RatingSubmitOutcome, RatingApiError> {
        for entry in entries {
            if entry.rated_id == rater_id {
                return Err(RatingApiError::SelfRating(rater_id));
            }
            if !entry.is_valid() {
                return Err(RatingApiError::InvalidRating(entry.rated_id));
            }
        }
        // With self-entries excluded, this also rules out voting for oneself.
        if !entries.iter().any(|e| e.rated_id == mvp_vote) {
            return Err(RatingApiError::InvalidMvpVote(mvp_vote));
        }
        let outcome = self
            .db
            .submit_rating_batch(match_id, rater_id, entries, mvp_vote, now)
            .await
            .map_err(|e| RatingApiError::DatabaseError(e.to_string()))?;
        if let RatingSubmitOutcome::Submitted { inserted } = &outcome {
            debug!("📊️ {inserted} ratings stored for match {match_id}; recomputing participant stats");
            let roster =
                self.db.fetch_roster(match_id).await.map_err(|e| RatingApiError::DatabaseError(e.to_string()))?;
            for seat in &roster {
                self.db
                    .recompute_stats(seat.player_id)
                    .await
                    .map_err(|e| RatingApiError::DatabaseError(e.to_string()))?;
            }
            self.check_mvp_threshold(match_id, roster.len()).await?;
        }
        Ok(outcome)
    }

    pub async fn ratings_for_match(&self, match_id: i64) -> Result<Vec<MatchRating>, RatingApiError> {
        self.db.fetch_ratings_for_match(match_id).await.map_err(|e| RatingApiError::DatabaseError(e.to_string()))
    }

    /// The user's aggregate; a zeroed aggregate if nobody has rated them yet.
    pub async fn stats(&self, user_id: i64) -> Result<UserStats, RatingApiError> {
        let stats =
            self.db.fetch_stats(user_id).await.map_err(|e| RatingApiError::DatabaseError(e.to_string()))?;
        Ok(stats.unwrap_or_else(|| UserStats::empty(user_id)))
    }

    pub async fn mvp_tallies(&self, match_id: i64) -> Result<Vec<MvpTally>, RatingApiError> {
        self.db.mvp_tallies(match_id).await.map_err(|e| RatingApiError::DatabaseError(e.to_string()))
    }

    /// Congratulate every candidate at or above the threshold, once per (match, candidate). The
    /// `mvp_awards` record is what stops a later batch from re-firing the congratulation.
    async fn check_mvp_threshold(&self, match_id: i64, participants: usize) -> Result<(), RatingApiError> {
        let threshold = mvp_threshold(participants);
        let tallies =
            self.db.mvp_tallies(match_id).await.map_err(|e| RatingApiError::DatabaseError(e.to_string()))?;
        for tally in tallies.into_iter().filter(|t| t.votes >= threshold) {
            let first_award = self
                .db
                .record_mvp_award(match_id, tally.user_id)
                .await
                .map_err(|e| RatingApiError::DatabaseError(e.to_string()))?;
            if !first_award {
                continue;
            }
            info!("📊️ User {} is MVP of match {match_id} with {} votes", tally.user_id, tally.votes);
            // The aggregate includes the award count, so refresh it now that the award landed.
            self.db
                .recompute_stats(tally.user_id)
                .await
                .map_err(|e| RatingApiError::DatabaseError(e.to_string()))?;
            let recipient_tokens = match self.db.user_device_tokens(tally.user_id).await {
                Ok(tokens) => tokens,
                Err(e) => {
                    warn!("📊️ Could not load device tokens for MVP {}: {e}", tally.user_id);
                    Vec::new()
                },
            };
            for emitter in &self.producers.mvp_awarded_producer {
                let event = MvpAwardedEvent {
                    match_id,
                    user_id: tally.user_id,
                    votes: tally.votes,
                    recipient_tokens: recipient_tokens.clone(),
                };
                emitter.publish_event(event).await;
            }
        }
        Ok(())
    }
}
