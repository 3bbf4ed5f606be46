use std::fmt::Debug;

use log::*;

use crate::{
    cce_api::errors::OrderFlowApiError,
    db::traits::{AppliedEffect, MatchManagement, PaymentOutcome, PaymentTracking},
    db_types::{NewOrder, Order, PaymentConfirmation},
    events::{EventProducers, PlayerJoinedEvent},
};

/// `OrderFlowApi` is the primary API for tracking checkout orders and applying gateway payment
/// notifications to them.
///
/// [`Self::apply_payment`] is the single funnel for every payment signal (webhook, merchant-order
/// resource, client polling) and is idempotent: applying the same payment twice returns the original
/// effect without re-running it.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: PaymentTracking + MatchManagement
{
    /// Record a new pending order. The purpose travels inside the order row so the payment
    /// notification alone is enough to apply the right effect later.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, OrderFlowApiError> {
        let order =
            self.db.insert_order(order).await.map_err(|e| OrderFlowApiError::DatabaseError(e.to_string()))?;
        debug!("💳️ Order #{} created for user {} ({})", order.id, order.user_id, order.total);
        Ok(order)
    }

    /// Attach the gateway's payment id once the checkout preference reports it.
    pub async fn attach_payment_id(&self, order_id: i64, payment_id: &str) -> Result<(), OrderFlowApiError> {
        self.db
            .attach_payment_id(order_id, payment_id)
            .await
            .map_err(|e| OrderFlowApiError::DatabaseError(e.to_string()))
    }

    pub async fn order_for_payment(&self, payment_id: &str) -> Result<Option<Order>, OrderFlowApiError> {
        self.db
            .fetch_order_by_payment_id(payment_id)
            .await
            .map_err(|e| OrderFlowApiError::DatabaseError(e.to_string()))
    }

    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowApiError> {
        self.db.fetch_orders_for_user(user_id).await.map_err(|e| OrderFlowApiError::DatabaseError(e.to_string()))
    }

    /// Apply one observed payment state to its order. Only a first-time approved application runs the
    /// purpose effect and fires hooks; duplicates and not-yet-approved states are quiet.
    pub async fn apply_payment(
        &self,
        confirmation: PaymentConfirmation,
    ) -> Result<PaymentOutcome, OrderFlowApiError> {
        let payment_id = confirmation.payment_id.clone();
        let outcome = self
            .db
            .apply_payment(&confirmation)
            .await
            .map_err(|e| OrderFlowApiError::DatabaseError(e.to_string()))?;
        match &outcome {
            PaymentOutcome::Applied(effect) => {
                info!("💳️ Payment {payment_id} applied");
                self.call_payment_applied_hooks(effect).await;
            },
            PaymentOutcome::AlreadyApplied(_) => {
                debug!("💳️ Payment {payment_id} was already applied; no hooks fired");
            },
            PaymentOutcome::NotYetApproved(status) => {
                debug!("💳️ Payment {payment_id} is '{status}'; waiting for approval");
            },
            PaymentOutcome::UnknownPayment => {
                warn!("💳️ Payment {payment_id} does not match any order");
            },
        }
        Ok(outcome)
    }

    async fn call_payment_applied_hooks(&self, effect: &AppliedEffect) {
        let AppliedEffect::MatchJoined { seat: Some(seat), .. } = effect else {
            return;
        };
        if self.producers.player_joined_producer.is_empty() {
            return;
        }
        let game = match self.db.fetch_match(seat.match_id).await {
            Ok(Some(g)) => g,
            Ok(None) => return,
            Err(e) => {
                warn!("💳️ Could not load match {} for the player-joined hook: {e}", seat.match_id);
                return;
            },
        };
        let recipient_tokens = match self.db.roster_device_tokens(seat.match_id, Some(seat.player_id)).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("💳️ Could not load roster tokens for match {}: {e}", seat.match_id);
                Vec::new()
            },
        };
        for emitter in &self.producers.player_joined_producer {
            let event = PlayerJoinedEvent {
                game: game.clone(),
                player_id: seat.player_id,
                recipient_tokens: recipient_tokens.clone(),
            };
            emitter.publish_event(event).await;
        }
    }
}
