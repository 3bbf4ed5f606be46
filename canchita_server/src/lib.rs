//! # Canchita server
//! This module hosts the HTTP surface for the Canchita booking backend. It is responsible for:
//! Exposing the match, order, wallet and rating flows over REST.
//! Receiving payment notifications from the checkout gateway and funnelling them into the order flow.
//! Running the periodic sweeps that cancel under-filled matches and send kickoff reminders.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following route groups:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/...`: The match, order, wallet and rating endpoints.
//! * `/gateway/webhook`: The webhook route for payment notifications from the checkout gateway.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod sweep_worker;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
