//! Push notification dispatch.
//!
//! The engine publishes events when something roster-visible happens (a player joins, a match gets
//! cancelled, a reminder falls due, an MVP is crowned). This module turns those events into push
//! messages addressed at device tokens, posted to an Expo-style push endpoint.
//!
//! Delivery is strictly fire-and-forget: a push failure is logged and dropped, never surfaced to the
//! business flow that triggered it.

use std::{future::Future, sync::Arc};

use canchita_engine::events::{
    EventHooks,
    MatchCancelledEvent,
    MatchReminderEvent,
    MvpAwardedEvent,
    PlayerJoinedEvent,
};
use futures::FutureExt;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde_json::{json, Value};

use crate::{config::PushConfig, errors::ServerError};

/// Delivers one push message to a set of device tokens. An empty token list is a no-op. Returns the
/// number of messages handed to the transport; failures are logged, never propagated.
///
/// The future is required to be `Send` because deliveries run on detached event-handler tasks.
pub trait PushNotifier {
    fn send(&self, tokens: &[String], title: &str, body: &str, data: Value) -> impl Future<Output = usize> + Send;
}

/// Posts push messages to an Expo-style `/push/send` endpoint.
#[derive(Clone)]
pub struct ExpoPushNotifier {
    url: String,
    client: Arc<Client>,
}

impl ExpoPushNotifier {
    pub fn new(config: &PushConfig) -> Result<Self, ServerError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        if !config.access_token.reveal().is_empty() {
            let bearer = format!("Bearer {}", config.access_token.reveal());
            let val = HeaderValue::from_str(&bearer).map_err(|e| ServerError::InitializeError(e.to_string()))?;
            headers.insert("Authorization", val);
        }
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self { url: config.url.clone(), client: Arc::new(client) })
    }
}

impl PushNotifier for ExpoPushNotifier {
    async fn send(&self, tokens: &[String], title: &str, body: &str, data: Value) -> usize {
        if tokens.is_empty() {
            trace!("📬️ No recipients for '{title}'. Nothing to send.");
            return 0;
        }
        let messages = tokens
            .iter()
            .map(|token| json!({ "to": token, "title": title, "body": body, "data": data }))
            .collect::<Vec<Value>>();
        match self.client.post(&self.url).json(&messages).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("📬️ Sent '{title}' to {} devices", tokens.len());
                tokens.len()
            },
            Ok(response) => {
                warn!("📬️ Push endpoint rejected '{title}'. Status {}.", response.status());
                0
            },
            Err(e) => {
                warn!("📬️ Could not reach the push endpoint for '{title}'. {e}");
                0
            },
        }
    }
}

/// Drops every message. Used when push delivery is disabled in the configuration.
#[derive(Clone, Default)]
pub struct NullNotifier;

impl PushNotifier for NullNotifier {
    async fn send(&self, tokens: &[String], title: &str, _body: &str, _data: Value) -> usize {
        trace!("📬️ Push disabled; dropping '{title}' for {} recipients", tokens.len());
        0
    }
}

/// Wire the engine's event hooks to a push notifier. Each hook clones the notifier into a detached
/// future, so slow or failing deliveries never hold up the event channel.
pub fn build_event_hooks<P>(notifier: P) -> EventHooks
where P: PushNotifier + Clone + Send + Sync + 'static {
    let mut hooks = EventHooks::default();
    let n = notifier.clone();
    hooks.on_player_joined(move |ev: PlayerJoinedEvent| {
        let n = n.clone();
        async move {
            let body = format!("A new player joined {} on {}.", ev.game.name, ev.game.schedule_date);
            n.send(&ev.recipient_tokens, "New teammate!", &body, json!({ "match_id": ev.game.id })).await;
        }
        .boxed()
    });
    let n = notifier.clone();
    hooks.on_match_cancelled(move |ev: MatchCancelledEvent| {
        let n = n.clone();
        async move {
            let body = format!(
                "{} on {} was cancelled for lack of players. {} refunds were issued to wallets.",
                ev.game.name,
                ev.game.schedule_date,
                ev.refunds.len()
            );
            n.send(&ev.recipient_tokens, "Match cancelled", &body, json!({ "match_id": ev.game.id })).await;
        }
        .boxed()
    });
    let n = notifier.clone();
    hooks.on_match_reminder(move |ev: MatchReminderEvent| {
        let n = n.clone();
        async move {
            let body = format!("{} kicks off at {}. See you on the field!", ev.game.name, ev.game.start_time);
            n.send(&ev.recipient_tokens, "Kickoff in one hour", &body, json!({ "match_id": ev.game.id })).await;
        }
        .boxed()
    });
    hooks.on_mvp_awarded(move |ev: MvpAwardedEvent| {
        let n = notifier.clone();
        async move {
            let body = format!("Your teammates voted you MVP with {} votes. Congratulations!", ev.votes);
            n.send(&ev.recipient_tokens, "You are the MVP! 🏆", &body, json!({ "match_id": ev.match_id })).await;
        }
        .boxed()
    });
    hooks
}
