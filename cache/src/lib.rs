#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::implicit_hasher
)]

mod event;
mod models;
mod resource;

use dashmap::DashMap;
use std::{collections::HashSet, sync::Arc};
use tempvoice_models::id::{ChannelId, GuildId, UserId};

pub use event::UpdateCache;
pub use models::{channel::CachedChannel, voice::VoiceTransition};
pub use resource::ResourceCache;

pub struct CacheRef {
    channels: DashMap<ChannelId, Arc<CachedChannel>>,
    guild_channels: DashMap<GuildId, HashSet<ChannelId>>,
    voice_states: DashMap<(GuildId, UserId), ChannelId>,
    /// Members of every occupied voice channel, in the order they joined
    occupants: DashMap<ChannelId, Vec<UserId>>,
    display_names: DashMap<(GuildId, UserId), String>,
}

/// The platform side state the bot observes through the gateway
#[derive(Clone)]
pub struct Cache(Arc<CacheRef>);

#[derive(Debug, Clone)]
pub struct CacheError;

impl Cache {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(CacheRef {
            channels: DashMap::new(),
            guild_channels: DashMap::new(),
            voice_states: DashMap::new(),
            occupants: DashMap::new(),
            display_names: DashMap::new(),
        }))
    }

    /// Get an immutable reference to a channel
    pub fn channel(&self, channel_id: ChannelId) -> Option<Arc<CachedChannel>> {
        self.0
            .channels
            .get(&channel_id)
            .map(|c| Arc::clone(c.value()))
    }

    /// The voice channel a member currently sits in
    pub fn voice_channel(&self, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
        self.0
            .voice_states
            .get(&(guild_id, user_id))
            .map(|c| *c.value())
    }

    /// The members of a voice channel, longest present first
    pub fn occupants(&self, channel_id: ChannelId) -> Vec<UserId> {
        self.0
            .occupants
            .get(&channel_id)
            .map_or_else(Vec::new, |o| o.value().clone())
    }

    pub fn display_name(&self, guild_id: GuildId, user_id: UserId) -> Option<String> {
        self.0
            .display_names
            .get(&(guild_id, user_id))
            .map(|n| n.value().clone())
    }

    /// Update a resource inside a cache
    pub fn update<T: UpdateCache>(&self, value: &T) -> Result<(), CacheError> {
        value.update(self)
    }

    pub fn cache_channel(&self, channel: CachedChannel) -> Arc<CachedChannel> {
        let channel = Arc::new(channel);
        self.0
            .guild_channels
            .entry(channel.guild_id)
            .or_default()
            .insert(channel.id);
        self.0.channels.insert(channel.id, Arc::clone(&channel));
        channel
    }

    pub fn cache_display_name(&self, guild_id: GuildId, user_id: UserId, name: String) {
        self.0.display_names.insert((guild_id, user_id), name);
    }

    /// Record where a member sits now and report the move, if there was one
    pub fn record_voice_state(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        channel_id: Option<ChannelId>,
    ) -> Option<VoiceTransition> {
        let key = (guild_id, user_id);
        let previous = match channel_id {
            Some(channel_id) => self.0.voice_states.insert(key, channel_id),
            None => self.0.voice_states.remove(&key).map(|(_, c)| c),
        };
        if previous == channel_id {
            return None;
        }

        if let Some(previous) = previous {
            self.leave_channel(previous, user_id);
        }
        if let Some(current) = channel_id {
            let mut occupants = self.0.occupants.entry(current).or_default();
            if !occupants.contains(&user_id) {
                occupants.push(user_id);
            }
        }

        Some(VoiceTransition {
            guild_id,
            user_id,
            previous,
            current: channel_id,
        })
    }

    fn leave_channel(&self, channel_id: ChannelId, user_id: UserId) {
        if let Some(mut occupants) = self.0.occupants.get_mut(&channel_id) {
            occupants.retain(|u| *u != user_id);
        }
        self.0
            .occupants
            .remove_if(&channel_id, |_, occupants| occupants.is_empty());
    }

    fn delete_channel(&self, channel_id: ChannelId) {
        if let Some((_, channel)) = self.0.channels.remove(&channel_id) {
            if let Some(mut channels) = self.0.guild_channels.get_mut(&channel.guild_id) {
                channels.remove(&channel_id);
            }
        }
        if self.0.occupants.remove(&channel_id).is_some() {
            self.0.voice_states.retain(|_, c| *c != channel_id);
        }
    }

    fn delete_guild(&self, guild_id: GuildId) {
        if let Some((_, ids)) = self.0.guild_channels.remove(&guild_id) {
            for id in ids {
                self.0.channels.remove(&id);
                self.0.occupants.remove(&id);
            }
        }
        self.0.voice_states.retain(|(g, _), _| *g != guild_id);
        self.0.display_names.retain(|(g, _), _| *g != guild_id);
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}
