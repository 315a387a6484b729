use futures_util::future::{Future, FutureExt};
use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tempvoice_cache::{Cache, VoiceTransition};
use tempvoice_framework::prelude::*;
use tempvoice_models::discord::{
    application::interaction::Interaction,
    gateway::event::Event,
    id::{marker::ApplicationMarker, Id},
};
use tower::Service;
use twilight_http::Client as Http;

use super::voice_rooms;
use crate::commands;

/// A unit of work for the sequential worker
#[derive(Debug)]
pub enum Work {
    Voice(VoiceTransition),
    Interaction(Box<Interaction>),
}

/// Feed a gateway event into the cache and pick out what the worker has to act upon
pub fn route_event(cache: &Cache, event: &Event) -> Option<Work> {
    match event {
        Event::VoiceStateUpdate(update) => cache.voice_transition(&update.0).map(Work::Voice),
        Event::InteractionCreate(interaction) => {
            Some(Work::Interaction(Box::new(interaction.0.clone())))
        }
        event => {
            if cache.update(event).is_err() {
                tracing::warn!(kind = ?event.kind(), "Failed to update cache");
            }
            None
        }
    }
}

pub struct EventHandlerRef {
    bot: BotContext,
    http: Arc<Http>,
    application_id: Id<ApplicationMarker>,
}

#[derive(Clone)]
pub struct EventHandler(Arc<EventHandlerRef>);

impl EventHandler {
    pub fn new(bot: &BotContext, http: Arc<Http>, application_id: Id<ApplicationMarker>) -> Self {
        Self(Arc::new(EventHandlerRef {
            bot: bot.clone(),
            http,
            application_id,
        }))
    }
}

#[allow(clippy::type_complexity)]
impl Service<Work> for EventHandler {
    type Response = ();
    type Error = RoomError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, work: Work) -> Self::Future {
        let eh = self.0.clone();

        async move {
            match work {
                Work::Voice(transition) => {
                    if let Err(err) = voice_rooms::handle_transition(&eh.bot, transition).await {
                        if let RoomError::Resource(ResourceError::Transport(_)) = &err {
                            eh.bot
                                .stats
                                .authority_failures
                                .with_label_values(&["transport"])
                                .inc();
                        }
                        return Err(err);
                    }
                }
                Work::Interaction(interaction) => {
                    commands::handle_interaction(
                        &eh.bot,
                        &eh.http,
                        eh.application_id,
                        &interaction,
                    )
                    .await?;
                }
            }
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempvoice_models::discord::{
        channel::{Channel, ChannelType},
        gateway::payload::incoming::{ChannelCreate, ChannelDelete},
    };

    fn voice_channel(id: u64) -> Channel {
        serde_json::from_value(serde_json::json!({
            "id": id.to_string(),
            "guild_id": "1",
            "type": 2,
            "name": "Room",
            "user_limit": 5,
        }))
        .unwrap()
    }

    #[test]
    fn other_events_only_feed_the_cache() {
        let cache = Cache::new();
        let channel = voice_channel(20);
        assert_eq!(channel.kind, ChannelType::GuildVoice);
        let work = route_event(&cache, &Event::ChannelCreate(Box::new(ChannelCreate(channel.clone()))));
        assert!(work.is_none());
        assert!(cache.channel(ChannelId::new(20)).is_some());

        let work = route_event(&cache, &Event::ChannelDelete(Box::new(ChannelDelete(channel))));
        assert!(work.is_none());
        assert!(cache.channel(ChannelId::new(20)).is_none());
        assert!(route_event(&cache, &Event::GatewayHeartbeatAck).is_none());
    }
}
