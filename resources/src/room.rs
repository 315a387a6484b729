use backend::{Authority, Route};
use std::sync::Arc;
use tempvoice_models::{
    id::{ChannelId, GuildId},
    room::{NewVoiceRoom, VoiceRoom, VoiceRoomPatch},
};

use crate::{manager::Resource, ResourceError, ResourceManager, VoiceRoomLobbyResourceManager};

impl Resource for VoiceRoom {
    type Key = ChannelId;
    type Scope = GuildId;
    type Create = NewVoiceRoom;
    type Patch = VoiceRoomPatch;

    const NAME: &'static str = "voice_room";

    fn item_route(guild_id: GuildId, channel_id: ChannelId) -> Route {
        Route::VoiceRoom {
            guild_id: guild_id.get(),
            channel_id: channel_id.get(),
        }
    }

    fn collection_route(guild_id: GuildId) -> Route {
        Route::VoiceRooms {
            guild_id: guild_id.get(),
        }
    }
}

/// The active rooms of one guild.
///
/// The authority keeps the `opened_rooms` list of every lobby, so registering or deleting a room
/// evicts the cached copy of its lobby.
pub struct ActiveVoiceRoomResourceManager {
    rooms: ResourceManager<VoiceRoom>,
    lobbies: Arc<VoiceRoomLobbyResourceManager>,
}

impl ActiveVoiceRoomResourceManager {
    pub(crate) fn new(
        guild_id: GuildId,
        authority: Arc<dyn Authority>,
        lobbies: Arc<VoiceRoomLobbyResourceManager>,
    ) -> Self {
        Self {
            rooms: ResourceManager::new(guild_id, authority),
            lobbies,
        }
    }

    pub fn cached(&self, channel_id: ChannelId) -> Option<Arc<VoiceRoom>> {
        self.rooms.cached(channel_id)
    }

    pub async fn fetch(&self, channel_id: ChannelId) -> Result<Arc<VoiceRoom>, ResourceError> {
        self.rooms.get(channel_id).await
    }

    pub async fn register(&self, room: &NewVoiceRoom) -> Result<Arc<VoiceRoom>, ResourceError> {
        let registered = self.rooms.create(room.channel_id, room).await?;
        self.lobbies.evict(room.lobby_id);
        Ok(registered)
    }

    pub async fn update(
        &self,
        channel_id: ChannelId,
        patch: &VoiceRoomPatch,
    ) -> Result<Arc<VoiceRoom>, ResourceError> {
        self.rooms.update(channel_id, patch).await
    }

    /// Delete the room record. Deleting a room the authority no longer knows succeeds.
    ///
    /// A room missing from the cache is looked up first to learn which lobby to evict.
    pub async fn delete(&self, channel_id: ChannelId) -> Result<(), ResourceError> {
        let lobby_id = match self.rooms.get(channel_id).await {
            Ok(room) => room.lobby_id,
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err),
        };
        self.rooms.delete(channel_id).await?;
        self.lobbies.evict(lobby_id);
        Ok(())
    }

    pub fn evict(&self, channel_id: ChannelId) {
        self.rooms.evict(channel_id);
    }
}
