//! The engine's public flow APIs.
//!
//! Each API is generic over the backend trait(s) it needs and receives its backend and event producers
//! at construction. Business outcomes (full match, duplicate payment, overdraw) are values; error enums
//! carry genuine faults only.

pub mod errors;
pub mod lifecycle_api;
pub mod match_flow_api;
pub mod order_flow_api;
pub mod rating_api;
pub mod wallet_api;
