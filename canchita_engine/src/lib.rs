//! Canchita booking engine
//!
//! Core logic for a sports-facility booking and pickup-match backend: scheduled match creation with two
//! auto-generated teams, capacity-checked joins, payment tracking against an external checkout gateway,
//! a per-user wallet ledger used for refunds, post-match peer ratings with MVP voting, and the periodic
//! sweeps that cancel under-filled matches and send kickoff reminders.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should never need to
//!    access the database directly; use the public API instead. The exception is the data types used in the
//!    database, which are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@cce_api`]). Flow APIs are generic over the backend traits in `db::traits`,
//!    so the match, order, wallet, rating and lifecycle flows can be driven against any conforming store.
//!
//! The engine also emits events when notable actions occur (a player joins, a match is cancelled, an MVP is
//! awarded, a reminder falls due). Subscribers receive them through a small async pub-sub so that
//! notification delivery stays fire-and-forget and never blocks or rolls back a business transaction.
mod db;

pub mod cce_api;
pub mod db_types;
pub mod events;
pub mod helpers;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use db::traits::{
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
};
pub use cce_api::{
    errors::{LifecycleApiError, MatchFlowApiError, OrderFlowApiError, RatingApiError, WalletApiError},
    lifecycle_api::LifecycleApi,
    match_flow_api::{BatchReport, MatchBatchTemplate, MatchFlowApi, MatchRoster, SkippedSlot},
    order_flow_api::OrderFlowApi,
    rating_api::{mvp_threshold, RatingApi},
    wallet_api::WalletApi,
};
