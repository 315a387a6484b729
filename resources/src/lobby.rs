use backend::{Authority, Route};
use std::sync::Arc;
use tempvoice_models::{
    guild::GuildRecord,
    id::{ChannelId, GuildId},
    room::{NewVoiceRoomLobby, VoiceRoomLobby, VoiceRoomLobbyPatch},
};

use crate::{manager::Resource, ResourceError, ResourceManager};

impl Resource for VoiceRoomLobby {
    type Key = ChannelId;
    type Scope = GuildId;
    type Create = NewVoiceRoomLobby;
    type Patch = VoiceRoomLobbyPatch;

    const NAME: &'static str = "voice_lobby";

    fn item_route(guild_id: GuildId, channel_id: ChannelId) -> Route {
        Route::VoiceLobby {
            guild_id: guild_id.get(),
            channel_id: channel_id.get(),
        }
    }

    fn collection_route(guild_id: GuildId) -> Route {
        Route::VoiceLobbies {
            guild_id: guild_id.get(),
        }
    }
}

/// The lobbies of one guild
pub struct VoiceRoomLobbyResourceManager {
    guild_id: GuildId,
    lobbies: ResourceManager<VoiceRoomLobby>,
    records: Arc<ResourceManager<GuildRecord>>,
}

impl VoiceRoomLobbyResourceManager {
    pub(crate) fn new(
        guild_id: GuildId,
        authority: Arc<dyn Authority>,
        records: Arc<ResourceManager<GuildRecord>>,
    ) -> Self {
        Self {
            guild_id,
            lobbies: ResourceManager::new(guild_id, authority),
            records,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn cached(&self, channel_id: ChannelId) -> Option<Arc<VoiceRoomLobby>> {
        self.lobbies.cached(channel_id)
    }

    pub async fn fetch(&self, channel_id: ChannelId) -> Result<Arc<VoiceRoomLobby>, ResourceError> {
        self.lobbies.get(channel_id).await
    }

    /// Configure a channel as a lobby. The guild record lists its lobbies, so it is evicted
    pub async fn create(
        &self,
        lobby: &NewVoiceRoomLobby,
    ) -> Result<Arc<VoiceRoomLobby>, ResourceError> {
        let created = self.lobbies.create(lobby.channel_id, lobby).await?;
        self.records.evict(self.guild_id);
        Ok(created)
    }

    pub async fn update(
        &self,
        channel_id: ChannelId,
        patch: &VoiceRoomLobbyPatch,
    ) -> Result<Arc<VoiceRoomLobby>, ResourceError> {
        self.lobbies.update(channel_id, patch).await
    }

    pub async fn delete(&self, channel_id: ChannelId) -> Result<(), ResourceError> {
        self.lobbies.delete(channel_id).await?;
        self.records.evict(self.guild_id);
        Ok(())
    }

    pub fn evict(&self, channel_id: ChannelId) {
        self.lobbies.evict(channel_id);
    }
}
