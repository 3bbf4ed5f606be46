use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    MatchCancelledEvent,
    MatchReminderEvent,
    MvpAwardedEvent,
    PlayerJoinedEvent,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub player_joined_producer: Vec<EventProducer<PlayerJoinedEvent>>,
    pub match_cancelled_producer: Vec<EventProducer<MatchCancelledEvent>>,
    pub match_reminder_producer: Vec<EventProducer<MatchReminderEvent>>,
    pub mvp_awarded_producer: Vec<EventProducer<MvpAwardedEvent>>,
}

pub struct EventHandlers {
    pub on_player_joined: Option<EventHandler<PlayerJoinedEvent>>,
    pub on_match_cancelled: Option<EventHandler<MatchCancelledEvent>>,
    pub on_match_reminder: Option<EventHandler<MatchReminderEvent>>,
    pub on_mvp_awarded: Option<EventHandler<MvpAwardedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        Self {
            on_player_joined: hooks.on_player_joined.map(|f| EventHandler::new(buffer_size, f)),
            on_match_cancelled: hooks.on_match_cancelled.map(|f| EventHandler::new(buffer_size, f)),
            on_match_reminder: hooks.on_match_reminder.map(|f| EventHandler::new(buffer_size, f)),
            on_mvp_awarded: hooks.on_mvp_awarded.map(|f| EventHandler::new(buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_player_joined {
            result.player_joined_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_match_cancelled {
            result.match_cancelled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_match_reminder {
            result.match_reminder_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_mvp_awarded {
            result.mvp_awarded_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_player_joined {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_match_cancelled {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_match_reminder {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_mvp_awarded {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_player_joined: Option<Handler<PlayerJoinedEvent>>,
    pub on_match_cancelled: Option<Handler<MatchCancelledEvent>>,
    pub on_match_reminder: Option<Handler<MatchReminderEvent>>,
    pub on_mvp_awarded: Option<Handler<MvpAwardedEvent>>,
}

impl EventHooks {
    pub fn on_player_joined<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PlayerJoinedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_player_joined = Some(Arc::new(f));
        self
    }

    pub fn on_match_cancelled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MatchCancelledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_match_cancelled = Some(Arc::new(f));
        self
    }

    pub fn on_match_reminder<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MatchReminderEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_match_reminder = Some(Arc::new(f));
        self
    }

    pub fn on_mvp_awarded<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MvpAwardedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_mvp_awarded = Some(Arc::new(f));
        self
    }
}
