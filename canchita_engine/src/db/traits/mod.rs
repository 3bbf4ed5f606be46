//! Database backend contracts.
//!
//! These traits define what a storage backend must expose to power the engine's flows. The flow APIs in
//! [`crate::cce_api`] are generic over them, and the SQLite backend in [`crate::db::sqlite`] implements
//! all five on one pool-backed handle.
//!
//! * [`MatchManagement`] — match/team creation and the capacity-checked join/leave state machine.
//! * [`PaymentTracking`] — order intents and idempotent application of gateway payments.
//! * [`WalletManagement`] — the per-user ledger used for refunds and top-ups.
//! * [`RatingManagement`] — post-match peer ratings, stats recompute and MVP awards.
//! * [`LifecycleManagement`] — the queries and transactions behind the two background sweeps.
mod data_objects;
mod lifecycle_management;
mod match_management;
mod payment_tracking;
mod rating_management;
mod wallet_management;

pub use data_objects::{
    AppliedEffect,
    BatchSlotOutcome,
    CancellationReport,
    CreatedMatch,
    DebitOutcome,
    DueReminder,
    JoinOutcome,
    LeaveOutcome,
    MvpTally,
    PaymentOutcome,
    RatingSubmitOutcome,
};
pub use lifecycle_management::LifecycleManagement;
pub use match_management::MatchManagement;
pub use payment_tracking::PaymentTracking;
pub use rating_management::RatingManagement;
pub use wallet_management::WalletManagement;
