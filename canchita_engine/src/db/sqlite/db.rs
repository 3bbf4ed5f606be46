use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use cnc_common::Money;
use log::*;
use sqlx::SqlitePool;

use crate::{
    db::{
        sqlite::{bonos, matches, new_pool, notifications, orders, ratings, wallets, SqliteDatabaseError},
        traits::{
            AppliedEffect,
            BatchSlotOutcome,
            CancellationReport,
            CreatedMatch,
            DebitOutcome,
            DueReminder,
            JoinOutcome,
            LeaveOutcome,
            LifecycleManagement,
            MatchManagement,
            MvpTally,
            PaymentOutcome,
            PaymentTracking,
            RatingManagement,
            RatingSubmitOutcome,
            WalletManagement,
        },
    },
    db_types::{
        DailyMatch,
        MatchPlayer,
        MatchRating,
        MatchStatus,
        MatchTeam,
        NewMatch,
        NewOrder,
        Order,
        OrderStatusType,
        PaymentConfirmation,
        PaymentPurpose,
        RatingEntry,
        SeatPayment,
        UserStats,
        Wallet,
        WalletTransaction,
        EVENT_MATCH_REMINDER,
    },
    helpers::draw_team_pair,
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SqliteDatabaseError::QueryError(e.to_string()))?;
        Ok(())
    }

    /// Reconstruct the business effect a completed order produced, without re-running it. Used to answer
    /// duplicate payment notifications.
    async fn reconstruct_effect(
        &self,
        order: &Order,
        conn: &mut sqlx::SqliteConnection,
    ) -> Result<AppliedEffect, SqliteDatabaseError> {
        let payment_id = order.payment_id.clone().unwrap_or_default();
        let effect = match &order.purpose.0 {
            PaymentPurpose::MatchJoin { .. } => {
                match matches::fetch_membership_by_payment_id(&payment_id, &mut *conn).await? {
                    Some(seat) => AppliedEffect::MatchJoined { order: order.clone(), seat: Some(seat) },
                    None => {
                        let reference = format!("payment:{payment_id}");
                        match wallets::fetch_credit_by_reference(order.user_id, &reference, conn).await? {
                            Some(refund) => AppliedEffect::SeatUnavailable { order: order.clone(), refund },
                            None => AppliedEffect::MatchJoined { order: order.clone(), seat: None },
                        }
                    },
                }
            },
            PaymentPurpose::BonoPurchase { .. } => {
                let bono = bonos::fetch_bono_by_payment_id(&payment_id, conn).await?.ok_or_else(|| {
                    SqliteDatabaseError::QueryError(format!(
                        "Order #{} is completed but no bono references payment {payment_id}",
                        order.id
                    ))
                })?;
                AppliedEffect::BonoGranted { order: order.clone(), bono }
            },
            PaymentPurpose::WalletTopUp => {
                let reference = format!("payment:{payment_id}");
                let entry =
                    wallets::fetch_credit_by_reference(order.user_id, &reference, conn).await?.ok_or_else(|| {
                        SqliteDatabaseError::QueryError(format!(
                            "Order #{} is completed but no ledger entry references payment {payment_id}",
                            order.id
                        ))
                    })?;
                AppliedEffect::WalletCredited { order: order.clone(), entry }
            },
        };
        Ok(effect)
    }

    /// The capacity-checked seat insertion shared by every join flavour. Must run inside the caller's
    /// transaction; returns the violated precondition as a value.
    async fn seat_player(
        &self,
        match_id: i64,
        team_id: i64,
        user_id: i64,
        position: Option<&str>,
        payment_status: SeatPayment,
        payment_id: Option<&str>,
        amount: Money,
        conn: &mut sqlx::SqliteConnection,
    ) -> Result<JoinOutcome, SqliteDatabaseError> {
        let game = matches::fetch_match(match_id, &mut *conn)
            .await?
            .ok_or(SqliteDatabaseError::MatchNotFound(match_id))?;
        if game.status != MatchStatus::Open {
            return Ok(JoinOutcome::MatchNotOpen);
        }
        let team =
            matches::fetch_team(team_id, &mut *conn).await?.ok_or(SqliteDatabaseError::TeamNotFound(team_id))?;
        if team.match_id != match_id {
            return Ok(JoinOutcome::TeamMismatch);
        }
        if matches::fetch_membership(match_id, user_id, &mut *conn).await?.is_some() {
            return Ok(JoinOutcome::AlreadyJoined);
        }
        if !matches::try_increment_team_count(team_id, &mut *conn).await? {
            return Ok(JoinOutcome::TeamFull);
        }
        if !matches::try_increment_match_count(match_id, &mut *conn).await? {
            return Ok(JoinOutcome::MatchFull);
        }
        let seat =
            matches::insert_member(match_id, team_id, user_id, position, payment_status, payment_id, amount, conn)
                .await?;
        if matches::confirm_if_full(match_id, conn).await? {
            debug!("🏟️ Match {match_id} reached capacity and is now confirmed");
        }
        Ok(JoinOutcome::Joined(seat))
    }
}

impl MatchManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn create_match_slot(&self, new_match: NewMatch) -> Result<BatchSlotOutcome, Self::Error> {
        // Draw the identities before any await so the RNG handle does not cross a suspension point.
        let [home, away] = draw_team_pair(&mut rand::thread_rng());
        let mut tx = self.pool.begin().await?;
        if matches::booking_overlaps(new_match.field_id, new_match.schedule_date, new_match.start_time, &mut tx)
            .await?
        {
            tx.rollback().await?;
            return Ok(BatchSlotOutcome::FieldBooked);
        }
        if matches::slot_taken(new_match.field_id, new_match.schedule_date, new_match.start_time, &mut tx).await? {
            tx.rollback().await?;
            return Ok(BatchSlotOutcome::SlotTaken);
        }
        let booking_id = matches::insert_booking(
            new_match.field_id,
            new_match.schedule_date,
            new_match.start_time,
            new_match.end_time,
            &mut tx,
        )
        .await?;
        let game = matches::insert_match(&new_match, booking_id, &mut tx).await?;
        let per_side = new_match.game_type.players_per_side();
        let team_a = matches::insert_team(game.id, home.0, home.1, home.2, per_side, &mut tx).await?;
        let team_b = matches::insert_team(game.id, away.0, away.1, away.2, per_side, &mut tx).await?;
        let reminder_at = game.kickoff() - Duration::hours(1);
        notifications::insert_event(game.id, EVENT_MATCH_REMINDER, reminder_at, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Match #{} created on field {} for {} {} ({} vs {})",
            game.id, game.field_id, game.schedule_date, game.start_time, team_a.name, team_b.name
        );
        Ok(BatchSlotOutcome::Created(CreatedMatch { game, teams: [team_a, team_b] }))
    }

    async fn fetch_match(&self, match_id: i64) -> Result<Option<DailyMatch>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        matches::fetch_match(match_id, &mut conn).await
    }

    async fn fetch_teams(&self, match_id: i64) -> Result<Vec<MatchTeam>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        matches::fetch_teams(match_id, &mut conn).await
    }

    async fn fetch_roster(&self, match_id: i64) -> Result<Vec<MatchPlayer>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        matches::fetch_roster(match_id, &mut conn).await
    }

    async fn join_match(&self, match_id: i64, team_id: i64, user_id: i64) -> Result<JoinOutcome, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let outcome =
            self.seat_player(match_id, team_id, user_id, None, SeatPayment::Free, None, Money::from(0), &mut tx).await?;
        match &outcome {
            JoinOutcome::Joined(_) => tx.commit().await?,
            _ => tx.rollback().await?,
        }
        Ok(outcome)
    }

    async fn paid_join(
        &self,
        match_id: i64,
        team_id: i64,
        user_id: i64,
        payment_id: &str,
    ) -> Result<JoinOutcome, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_payment_id(payment_id, &mut tx).await?;
        let order = match order {
            Some(o) if o.status == OrderStatusType::Completed && o.user_id == user_id => o,
            _ => {
                tx.rollback().await?;
                return Ok(JoinOutcome::PaymentNotVerified);
            },
        };
        // The webhook may have seated the player already; answer idempotently.
        if let Some(seat) = matches::fetch_membership_by_payment_id(payment_id, &mut tx).await? {
            tx.rollback().await?;
            return Ok(JoinOutcome::Joined(seat));
        }
        let position = match &order.purpose.0 {
            PaymentPurpose::MatchJoin { position, .. } => position.clone(),
            _ => None,
        };
        let outcome = self
            .seat_player(
                match_id,
                team_id,
                user_id,
                position.as_deref(),
                SeatPayment::Completed,
                Some(payment_id),
                order.total,
                &mut tx,
            )
            .await?;
        match &outcome {
            JoinOutcome::Joined(_) => tx.commit().await?,
            _ => tx.rollback().await?,
        }
        Ok(outcome)
    }

    async fn bono_join(
        &self,
        match_id: i64,
        team_id: i64,
        user_id: i64,
        bono_id: i64,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let bono = bonos::fetch_bono(bono_id, &mut tx).await?.ok_or(SqliteDatabaseError::BonoNotFound(bono_id))?;
        if bono.user_id != user_id {
            tx.rollback().await?;
            return Err(SqliteDatabaseError::BonoNotFound(bono_id));
        }
        if bono.is_expired(now) {
            tx.rollback().await?;
            return Ok(JoinOutcome::BonoExpired);
        }
        if !bonos::consume_entry(bono_id, &mut tx).await? {
            tx.rollback().await?;
            return Ok(JoinOutcome::BonoExhausted);
        }
        let outcome =
            self.seat_player(match_id, team_id, user_id, None, SeatPayment::Bono, None, Money::from(0), &mut tx).await?;
        match &outcome {
            JoinOutcome::Joined(_) => tx.commit().await?,
            // Rolls back the consumed entry along with everything else.
            _ => tx.rollback().await?,
        }
        Ok(outcome)
    }

    async fn leave_match(&self, match_id: i64, user_id: i64) -> Result<LeaveOutcome, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let seat = match matches::fetch_membership(match_id, user_id, &mut tx).await? {
            Some(s) => s,
            None => {
                tx.rollback().await?;
                return Ok(LeaveOutcome::NotJoined);
            },
        };
        matches::delete_member(match_id, user_id, &mut tx).await?;
        matches::decrement_counts(match_id, seat.team_id, &mut tx).await?;
        if matches::reopen_if_unfilled(match_id, &mut tx).await? {
            debug!("🗃️ Match {match_id} lost a player and reopened");
        }
        tx.commit().await?;
        debug!("🗃️ Player {user_id} left match {match_id}");
        Ok(LeaveOutcome::Left)
    }

    async fn roster_device_tokens(&self, match_id: i64, except_user: Option<i64>) -> Result<Vec<String>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::roster_tokens(match_id, except_user, &mut conn).await
    }
}

impl PaymentTracking for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn insert_order(&self, order: NewOrder) -> Result<Order, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(&order, &mut conn).await
    }

    async fn attach_payment_id(&self, order_id: i64, payment_id: &str) -> Result<(), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::attach_payment_id(order_id, payment_id, &mut conn).await
    }

    async fn fetch_order_by_payment_id(&self, payment_id: &str) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_payment_id(payment_id, &mut conn).await
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_user(user_id, &mut conn).await
    }

    async fn apply_payment(&self, confirmation: &PaymentConfirmation) -> Result<PaymentOutcome, Self::Error> {
        let payment_id = confirmation.payment_id.as_str();
        let mut tx = self.pool.begin().await?;
        let order = match orders::fetch_order_by_payment_id(payment_id, &mut tx).await? {
            Some(o) => o,
            None => {
                tx.rollback().await?;
                return Ok(PaymentOutcome::UnknownPayment);
            },
        };
        if order.status == OrderStatusType::Completed {
            let effect = self.reconstruct_effect(&order, &mut tx).await?;
            tx.rollback().await?;
            debug!("🗃️ Payment {payment_id} already applied to order #{}; returning existing effect", order.id);
            return Ok(PaymentOutcome::AlreadyApplied(effect));
        }
        if !confirmation.status.is_approved() {
            let terminal = matches!(
                confirmation.status,
                crate::db_types::GatewayPaymentStatus::Rejected | crate::db_types::GatewayPaymentStatus::Cancelled
            );
            orders::record_gateway_status(order.id, terminal, &confirmation.raw, &mut tx).await?;
            tx.commit().await?;
            debug!("🗃️ Payment {payment_id} observed with status '{}'; no effect applied", confirmation.status);
            return Ok(PaymentOutcome::NotYetApproved(confirmation.status.to_string()));
        }
        orders::complete_order(order.id, &confirmation.raw, &mut tx).await?;
        let effect = match order.purpose.0.clone() {
            PaymentPurpose::MatchJoin { match_id, team_id, position } => {
                let seated = self
                    .seat_player(
                        match_id,
                        team_id,
                        order.user_id,
                        position.as_deref(),
                        SeatPayment::Completed,
                        Some(payment_id),
                        order.total,
                        &mut tx,
                    )
                    .await?;
                match seated {
                    JoinOutcome::Joined(seat) => {
                        AppliedEffect::MatchJoined { order: order.clone(), seat: Some(seat) }
                    },
                    JoinOutcome::AlreadyJoined => {
                        let seat = matches::fetch_membership(match_id, order.user_id, &mut tx).await?;
                        AppliedEffect::MatchJoined { order: order.clone(), seat }
                    },
                    // The seat vanished while the money was in flight; park the funds on the wallet.
                    _ => {
                        let reference = format!("payment:{payment_id}");
                        let refund = wallets::credit(
                            order.user_id,
                            order.total,
                            &format!("Seat unavailable for match {match_id}; amount returned to wallet"),
                            "seat_unavailable",
                            Some(&reference),
                            &mut tx,
                        )
                        .await?;
                        warn!("🗃️ Payment {payment_id} approved but seat in match {match_id} unavailable; credited wallet");
                        AppliedEffect::SeatUnavailable { order: order.clone(), refund }
                    },
                }
            },
            PaymentPurpose::BonoPurchase { bono_type, entries, valid_days } => {
                let bono = match bonos::fetch_bono_by_payment_id(payment_id, &mut tx).await? {
                    Some(b) => b,
                    None => {
                        bonos::insert_bono(
                            order.user_id,
                            &bono_type,
                            entries,
                            valid_days,
                            Some(payment_id),
                            Utc::now(),
                            &mut tx,
                        )
                        .await?
                    },
                };
                AppliedEffect::BonoGranted { order: order.clone(), bono }
            },
            PaymentPurpose::WalletTopUp => {
                let reference = format!("payment:{payment_id}");
                let entry = match wallets::fetch_credit_by_reference(order.user_id, &reference, &mut tx).await? {
                    Some(e) => e,
                    None => {
                        wallets::credit(
                            order.user_id,
                            order.total,
                            "Wallet top-up via checkout",
                            "gateway_topup",
                            Some(&reference),
                            &mut tx,
                        )
                        .await?
                    },
                };
                AppliedEffect::WalletCredited { order: order.clone(), entry }
            },
        };
        tx.commit().await?;
        info!("🗃️ Payment {payment_id} applied to order #{}", order.id);
        Ok(PaymentOutcome::Applied(effect))
    }
}

impl WalletManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn credit_wallet(
        &self,
        user_id: i64,
        amount: Money,
        description: &str,
        source: &str,
        source_reference: Option<&str>,
    ) -> Result<WalletTransaction, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let entry = wallets::credit(user_id, amount, description, source, source_reference, &mut tx).await?;
        tx.commit().await?;
        Ok(entry)
    }

    async fn debit_wallet(
        &self,
        user_id: i64,
        amount: Money,
        description: &str,
        source: &str,
        source_reference: Option<&str>,
    ) -> Result<DebitOutcome, Self::Error> {
        let mut tx = self.pool.begin().await?;
        match wallets::debit(user_id, amount, description, source, source_reference, &mut tx).await {
            Ok(entry) => {
                tx.commit().await?;
                Ok(DebitOutcome::Debited(entry))
            },
            Err(SqliteDatabaseError::InsufficientFunds { requested, available, .. }) => {
                tx.rollback().await?;
                Ok(DebitOutcome::InsufficientFunds { requested, available })
            },
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            },
        }
    }

    async fn fetch_wallet(&self, user_id: i64) -> Result<Option<Wallet>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        wallets::fetch_wallet(user_id, &mut conn).await
    }

    async fn wallet_history(&self, user_id: i64) -> Result<Vec<WalletTransaction>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        wallets::history(user_id, &mut conn).await
    }

    async fn credit_exists(&self, user_id: i64, source_reference: &str) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        wallets::credit_exists(user_id, source_reference, &mut conn).await
    }
}

impl RatingManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn submit_rating_batch(
        &self,
        match_id: i64,
        rater_id: i64,
        entries: &[RatingEntry],
        mvp_vote: i64,
        now: DateTime<Utc>,
    ) -> Result<RatingSubmitOutcome, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let game = match matches::fetch_match(match_id, &mut tx).await? {
            Some(g) => g,
            None => {
                tx.rollback().await?;
                return Ok(RatingSubmitOutcome::MatchNotFound);
            },
        };
        if now < game.full_time() {
            tx.rollback().await?;
            return Ok(RatingSubmitOutcome::MatchNotFinished);
        }
        if matches::fetch_membership(match_id, rater_id, &mut tx).await?.is_none() {
            tx.rollback().await?;
            return Ok(RatingSubmitOutcome::NotParticipant);
        }
        // The duplicate-batch check shares the insert transaction, so two racing submissions cannot
        // both pass it.
        if ratings::rater_has_submitted(match_id, rater_id, &mut tx).await? {
            tx.rollback().await?;
            return Ok(RatingSubmitOutcome::AlreadyRated);
        }
        let mut inserted = 0usize;
        for entry in entries {
            ratings::insert_rating(match_id, rater_id, entry, entry.rated_id == mvp_vote, &mut tx).await?;
            inserted += 1;
        }
        tx.commit().await?;
        debug!("📊️ Stored {inserted} ratings from user {rater_id} for match {match_id}");
        Ok(RatingSubmitOutcome::Submitted { inserted })
    }

    async fn fetch_ratings_for_match(&self, match_id: i64) -> Result<Vec<MatchRating>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        ratings::fetch_ratings_for_match(match_id, &mut conn).await
    }

    async fn recompute_stats(&self, user_id: i64) -> Result<UserStats, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let stats = ratings::recompute_stats(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(stats)
    }

    async fn fetch_stats(&self, user_id: i64) -> Result<Option<UserStats>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        ratings::fetch_stats(user_id, &mut conn).await
    }

    async fn mvp_tallies(&self, match_id: i64) -> Result<Vec<MvpTally>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        ratings::mvp_tallies(match_id, &mut conn).await
    }

    async fn record_mvp_award(&self, match_id: i64, user_id: i64) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        ratings::record_mvp_award(match_id, user_id, &mut conn).await
    }

    async fn user_device_tokens(&self, user_id: i64) -> Result<Vec<String>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::user_tokens(user_id, &mut conn).await
    }
}

impl LifecycleManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn matches_pending_cancellation(&self, now: DateTime<Utc>) -> Result<Vec<DailyMatch>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        // The one-hour look-ahead can cross midnight, so the window is computed on full timestamps and
        // the query only narrows by date before the exact comparison below.
        let window_start = now.naive_utc();
        let window_end = window_start + Duration::hours(1);
        let games = sqlx::query_as::<_, DailyMatch>(
            "SELECT id, name, field_id, game_type, schedule_date, start_time, end_time, price, max_players, \
             player_count, status, created_at, updated_at FROM daily_matches \
             WHERE status = $1 AND schedule_date IN ($2, $3) AND player_count < max_players",
        )
        .bind(MatchStatus::Open)
        .bind(window_start.date())
        .bind(window_end.date())
        .fetch_all(&mut *conn)
        .await?;
        let games = games
            .into_iter()
            .filter(|g| {
                let kickoff = g.schedule_date.and_time(g.start_time);
                kickoff > window_start && kickoff <= window_end
            })
            .collect();
        Ok(games)
    }

    async fn cancel_match_with_refunds(&self, match_id: i64) -> Result<CancellationReport, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let game =
            matches::fetch_match(match_id, &mut tx).await?.ok_or(SqliteDatabaseError::MatchNotFound(match_id))?;
        let recipient_tokens = notifications::roster_tokens(match_id, None, &mut tx).await?;
        if game.status != MatchStatus::Open {
            // A previous sweep already handled this match; retrying is a no-op.
            tx.rollback().await?;
            return Ok(CancellationReport { game, refunds: Vec::new(), recipient_tokens });
        }
        matches::set_match_status(match_id, MatchStatus::Cancelled, &mut tx).await?;
        matches::cancel_booking_for_match(match_id, &mut tx).await?;
        let roster = matches::fetch_roster(match_id, &mut tx).await?;
        let reference = format!("match:{match_id}");
        let description = format!(
            "Refund for cancelled match '{}' on {} {}",
            game.name, game.schedule_date, game.start_time
        );
        let mut refunds = Vec::with_capacity(roster.len());
        for seat in &roster {
            // Guarded per player so a retried cancellation can never double-credit anyone.
            if wallets::credit_exists(seat.player_id, &reference, &mut tx).await? {
                continue;
            }
            wallets::credit(seat.player_id, game.price, &description, "match_refund", Some(&reference), &mut tx)
                .await?;
            refunds.push((seat.player_id, game.price));
        }
        let game = matches::fetch_match(match_id, &mut tx)
            .await?
            .ok_or(SqliteDatabaseError::MatchNotFound(match_id))?;
        tx.commit().await?;
        info!("🕰️ Match #{match_id} cancelled; {} refunds of {} issued", refunds.len(), game.price);
        Ok(CancellationReport { game, refunds, recipient_tokens })
    }

    async fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<DueReminder>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let events = notifications::due_events(now, &mut conn).await?;
        let mut due = Vec::with_capacity(events.len());
        for event in events {
            let Some(game) = matches::fetch_match(event.match_id, &mut conn).await? else {
                continue;
            };
            let recipient_tokens = notifications::roster_tokens(event.match_id, None, &mut conn).await?;
            due.push(DueReminder { event_id: event.id, game, scheduled_at: event.scheduled_at, recipient_tokens });
        }
        Ok(due)
    }

    async fn mark_reminder_sent(&self, event_id: i64) -> Result<(), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::mark_sent(event_id, &mut conn).await
    }
}
