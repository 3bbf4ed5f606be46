use crate::db::traits::PaymentOutcome;
use crate::db_types::{NewOrder, Order, PaymentConfirmation};

/// Payment order tracker contract: bridges the gateway's duplicate-prone, out-of-order notification model
/// to an idempotent internal effect.
#[allow(async_fn_in_trait)]
pub trait PaymentTracking: Clone {
    type Error: std::error::Error;

    /// Create a `Pending` order carrying the typed purpose needed to apply the payment's effect later
    /// without re-deriving it from request parameters.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, Self::Error>;

    /// Record the gateway-assigned payment id against an order once known.
    async fn attach_payment_id(&self, order_id: i64, payment_id: &str) -> Result<(), Self::Error>;

    async fn fetch_order_by_payment_id(&self, payment_id: &str) -> Result<Option<Order>, Self::Error>;

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, Self::Error>;

    /// Apply a gateway payment to its order, exactly once.
    ///
    /// * Already applied: the existing result is returned and no side effect re-runs.
    /// * Not approved: the observed status is persisted and a retryable outcome is returned.
    /// * Approved: in one transaction the order is marked `Completed`, the gateway response is merged,
    ///   and the purpose-specific effect runs (seat the player / grant the bono / credit the wallet).
    async fn apply_payment(&self, confirmation: &PaymentConfirmation) -> Result<PaymentOutcome, Self::Error>;
}
