use tempvoice_models::{
    discord::{
        channel::ChannelType,
        gateway::{
            event::Event,
            payload::incoming::{
                ChannelCreate, ChannelDelete, ChannelUpdate, GuildCreate, GuildDelete,
                VoiceStateUpdate,
            },
        },
        guild::Member,
        voice::VoiceState,
    },
    id::{ChannelId, GuildId, UserId},
};
use tracing::debug;

use super::{Cache, CacheError, CachedChannel, VoiceTransition};

pub trait UpdateCache {
    fn update(&self, cache: &Cache) -> Result<(), CacheError>;
}

impl UpdateCache for Event {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        match self {
            Event::ChannelCreate(v) => c.update::<ChannelCreate>(v),
            Event::ChannelDelete(v) => c.update::<ChannelDelete>(v),
            Event::ChannelUpdate(v) => c.update::<ChannelUpdate>(v),
            Event::GuildCreate(v) => c.update::<GuildCreate>(v),
            Event::GuildDelete(v) => c.update::<GuildDelete>(v),
            Event::VoiceStateUpdate(v) => c.update::<VoiceStateUpdate>(v),
            _ => Ok(()),
        }
    }
}

fn is_voice(kind: ChannelType) -> bool {
    matches!(kind, ChannelType::GuildVoice | ChannelType::GuildCategory)
}

fn member_name(member: &Member) -> String {
    member
        .nick
        .clone()
        .unwrap_or_else(|| member.user.name.clone())
}

impl Cache {
    /// Feed a voice state into the cache, returning the transition it describes
    pub fn voice_transition(&self, state: &VoiceState) -> Option<VoiceTransition> {
        let guild_id = GuildId(state.guild_id?);
        let user_id = UserId(state.user_id);
        if let Some(member) = &state.member {
            self.cache_display_name(guild_id, user_id, member_name(member));
        }
        self.record_voice_state(guild_id, user_id, state.channel_id.map(ChannelId))
    }
}

impl UpdateCache for ChannelCreate {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        if let (Some(guild_id), true) = (self.guild_id, is_voice(self.kind)) {
            c.cache_channel(CachedChannel::from_channel(GuildId(guild_id), self));
        }
        Ok(())
    }
}

impl UpdateCache for ChannelDelete {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        c.delete_channel(ChannelId(self.id));
        Ok(())
    }
}

impl UpdateCache for ChannelUpdate {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        if let (Some(guild_id), true) = (self.guild_id, is_voice(self.kind)) {
            c.cache_channel(CachedChannel::from_channel(GuildId(guild_id), self));
        }
        Ok(())
    }
}

impl UpdateCache for GuildCreate {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        let guild_id = GuildId(self.id);
        debug!(id = %guild_id, "Received event for Guild Create for");
        for channel in self.channels.iter().filter(|ch| is_voice(ch.kind)) {
            c.cache_channel(CachedChannel::from_channel(guild_id, channel));
        }
        for member in &self.members {
            c.cache_display_name(guild_id, UserId(member.user.id), member_name(member));
        }
        for state in &self.voice_states {
            if let Some(channel_id) = state.channel_id {
                c.record_voice_state(guild_id, UserId(state.user_id), Some(ChannelId(channel_id)));
            }
        }
        Ok(())
    }
}

impl UpdateCache for GuildDelete {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        c.delete_guild(GuildId(self.id));
        Ok(())
    }
}

impl UpdateCache for VoiceStateUpdate {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        c.voice_transition(&self.0);
        Ok(())
    }
}
