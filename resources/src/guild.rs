use backend::{Authority, Route};
use dashmap::DashMap;
use std::{ops::Deref, sync::Arc};
use tempvoice_models::{
    guild::{GuildPatch, GuildRecord, NewGuild},
    id::GuildId,
};

use crate::{
    manager::Resource, ActiveVoiceRoomResourceManager, GuildMemberResourceManager, ResourceError,
    ResourceManager, VoiceRoomLobbyResourceManager,
};

impl Resource for GuildRecord {
    type Key = GuildId;
    type Scope = ();
    type Create = NewGuild;
    type Patch = GuildPatch;

    const NAME: &'static str = "guild";

    fn item_route(_: (), guild_id: GuildId) -> Route {
        Route::Guild {
            guild_id: guild_id.get(),
        }
    }

    fn collection_route(_: ()) -> Route {
        Route::Guilds
    }
}

struct GuildScope {
    lobbies: Arc<VoiceRoomLobbyResourceManager>,
    rooms: Arc<ActiveVoiceRoomResourceManager>,
    members: Arc<GuildMemberResourceManager>,
}

/// A guild record together with the managers of everything scoped by the guild
#[derive(Clone)]
pub struct Guild {
    pub record: Arc<GuildRecord>,
    pub lobbies: Arc<VoiceRoomLobbyResourceManager>,
    pub rooms: Arc<ActiveVoiceRoomResourceManager>,
    pub members: Arc<GuildMemberResourceManager>,
}

impl Deref for Guild {
    type Target = GuildRecord;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

/// Entry point of the resource layer.
///
/// Every guild id maps to exactly one set of scoped managers for the lifetime of the process,
/// even across evictions of the guild record, so the lobby, room and member caches of a guild
/// are never duplicated.
pub struct GuildResourceManager {
    authority: Arc<dyn Authority>,
    records: Arc<ResourceManager<GuildRecord>>,
    scopes: DashMap<GuildId, Arc<GuildScope>>,
}

impl GuildResourceManager {
    pub fn new(authority: Arc<dyn Authority>) -> Self {
        Self {
            records: Arc::new(ResourceManager::new((), Arc::clone(&authority))),
            authority,
            scopes: DashMap::new(),
        }
    }

    /// The guild as last cached, without any I/O
    pub fn cached(&self, guild_id: GuildId) -> Option<Guild> {
        self.records
            .cached(guild_id)
            .map(|record| self.compose(guild_id, record))
    }

    pub async fn get(&self, guild_id: GuildId) -> Result<Guild, ResourceError> {
        let record = self.records.get(guild_id).await?;
        Ok(self.compose(guild_id, record))
    }

    pub async fn create(&self, guild_id: GuildId) -> Result<Guild, ResourceError> {
        let record = self
            .records
            .create(guild_id, &NewGuild { id: guild_id })
            .await?;
        Ok(self.compose(guild_id, record))
    }

    pub async fn update(&self, guild_id: GuildId, patch: &GuildPatch) -> Result<Guild, ResourceError> {
        let record = self.records.update(guild_id, patch).await?;
        Ok(self.compose(guild_id, record))
    }

    /// Delete the guild record and drop every cache scoped by it
    pub async fn delete(&self, guild_id: GuildId) -> Result<(), ResourceError> {
        self.records.delete(guild_id).await?;
        self.scopes.remove(&guild_id);
        Ok(())
    }

    pub fn evict(&self, guild_id: GuildId) {
        self.records.evict(guild_id);
    }

    fn compose(&self, guild_id: GuildId, record: Arc<GuildRecord>) -> Guild {
        let scope = self.scope(guild_id);
        Guild {
            record,
            lobbies: Arc::clone(&scope.lobbies),
            rooms: Arc::clone(&scope.rooms),
            members: Arc::clone(&scope.members),
        }
    }

    fn scope(&self, guild_id: GuildId) -> Arc<GuildScope> {
        let scope = self.scopes.entry(guild_id).or_insert_with(|| {
            let lobbies = Arc::new(VoiceRoomLobbyResourceManager::new(
                guild_id,
                Arc::clone(&self.authority),
                Arc::clone(&self.records),
            ));
            let rooms = Arc::new(ActiveVoiceRoomResourceManager::new(
                guild_id,
                Arc::clone(&self.authority),
                Arc::clone(&lobbies),
            ));
            let members = Arc::new(GuildMemberResourceManager::new(
                guild_id,
                Arc::clone(&self.authority),
            ));
            Arc::new(GuildScope {
                lobbies,
                rooms,
                members,
            })
        });
        Arc::clone(scope.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempvoice_models::{
        id::{ChannelId, UserId},
        room::{NewVoiceRoom, NewVoiceRoomLobby, VoiceRoomPatch},
    };
    use test_utils::MemoryAuthority;

    const GUILD: GuildId = GuildId::new(1);
    const LOBBY: ChannelId = ChannelId::new(10);
    const ROOM: ChannelId = ChannelId::new(20);
    const NIA: UserId = UserId::new(3);

    fn setup() -> (MemoryAuthority, GuildResourceManager) {
        let authority = MemoryAuthority::new();
        authority.seed_guild(1);
        authority.seed_lobby(1, 10, 5);
        let guilds = GuildResourceManager::new(Arc::new(authority.clone()));
        (authority, guilds)
    }

    #[tokio::test]
    async fn one_scope_per_guild_across_evictions() {
        let (_, guilds) = setup();
        let first = guilds.get(GUILD).await.unwrap();
        guilds.evict(GUILD);
        let second = guilds.get(GUILD).await.unwrap();
        assert!(Arc::ptr_eq(&first.lobbies, &second.lobbies));
        assert!(Arc::ptr_eq(&first.rooms, &second.rooms));
        assert!(Arc::ptr_eq(&first.members, &second.members));
    }

    #[tokio::test]
    async fn cached_guild_reads_skip_the_authority() {
        let (authority, guilds) = setup();
        let guild = guilds.get(GUILD).await.unwrap();
        assert!(guild.is_lobby(LOBBY));
        guilds.get(GUILD).await.unwrap();
        assert_eq!(authority.call_count(), 1);
    }

    #[tokio::test]
    async fn lobby_changes_refresh_the_guild_record() {
        let (_, guilds) = setup();
        let guild = guilds.get(GUILD).await.unwrap();
        let new = NewVoiceRoomLobby {
            channel_id: ChannelId::new(11),
            user_limit: 3,
            can_rename: true,
            can_lock: true,
            can_adjust_limit: false,
        };
        guild.lobbies.create(&new).await.unwrap();
        assert!(guilds.cached(GUILD).is_none());

        let guild = guilds.get(GUILD).await.unwrap();
        assert!(guild.is_lobby(ChannelId::new(11)));

        guild.lobbies.delete(ChannelId::new(11)).await.unwrap();
        let guild = guilds.get(GUILD).await.unwrap();
        assert!(!guild.is_lobby(ChannelId::new(11)));
    }

    #[tokio::test]
    async fn a_room_cannot_become_a_lobby() {
        let (_, guilds) = setup();
        let guild = guilds.get(GUILD).await.unwrap();
        guild
            .rooms
            .register(&NewVoiceRoom::new(ROOM, LOBBY, NIA))
            .await
            .unwrap();

        let new = NewVoiceRoomLobby {
            channel_id: ROOM,
            user_limit: 3,
            can_rename: true,
            can_lock: true,
            can_adjust_limit: true,
        };
        let err = guild.lobbies.create(&new).await.unwrap_err();
        assert_eq!(err.code(), Some(&backend::ErrorCode::LobbyIsActiveRoom));
        assert!(guild.lobbies.cached(ROOM).is_none());
    }

    #[tokio::test]
    async fn room_lifecycle_keeps_the_lobby_in_step() {
        let (authority, guilds) = setup();
        let guild = guilds.get(GUILD).await.unwrap();
        let lobby = guild.lobbies.fetch(LOBBY).await.unwrap();
        assert!(lobby.opened_rooms.is_empty());

        guild
            .rooms
            .register(&NewVoiceRoom::new(ROOM, LOBBY, NIA))
            .await
            .unwrap();
        let lobby = guild.lobbies.fetch(LOBBY).await.unwrap();
        assert_eq!(lobby.opened_rooms, vec![ROOM]);

        guild.rooms.delete(ROOM).await.unwrap();
        let lobby = guild.lobbies.fetch(LOBBY).await.unwrap();
        assert!(lobby.opened_rooms.is_empty());
        assert_eq!(authority.room_count(), 0);
    }

    #[tokio::test]
    async fn deleting_an_uncached_room_refreshes_its_lobby() {
        let (authority, guilds) = setup();
        let guild = guilds.get(GUILD).await.unwrap();
        guild
            .rooms
            .register(&NewVoiceRoom::new(ROOM, LOBBY, NIA))
            .await
            .unwrap();
        guild.rooms.evict(ROOM);
        let lobby = guild.lobbies.fetch(LOBBY).await.unwrap();
        assert_eq!(lobby.opened_rooms, vec![ROOM]);

        guild.rooms.delete(ROOM).await.unwrap();
        assert_eq!(authority.room_count(), 0);
        assert!(guild.lobbies.cached(LOBBY).is_none());
        let lobby = guild.lobbies.fetch(LOBBY).await.unwrap();
        assert!(lobby.opened_rooms.is_empty());

        authority.clear_calls();
        guild.rooms.delete(ROOM).await.unwrap();
        assert_eq!(authority.call_count(), 1);
    }

    #[tokio::test]
    async fn room_updates_cache_the_authority_answer() {
        let (authority, guilds) = setup();
        let guild = guilds.get(GUILD).await.unwrap();
        guild
            .rooms
            .register(&NewVoiceRoom::new(ROOM, LOBBY, NIA))
            .await
            .unwrap();

        // The authority changed ownership on its own; the patch only touches the lock.
        authority.patch_room(1, 20, &json!({"current_owner_id": "4"}));
        let updated = guild
            .rooms
            .update(ROOM, &VoiceRoomPatch::locked(true))
            .await
            .unwrap();
        assert_eq!(updated.current_owner_id, UserId::new(4));

        authority.clear_calls();
        let cached = guild.rooms.fetch(ROOM).await.unwrap();
        assert_eq!(cached, updated);
        assert_eq!(authority.call_count(), 0);
    }

    #[tokio::test]
    async fn deleting_the_guild_drops_its_scope() {
        let (_, guilds) = setup();
        let first = guilds.get(GUILD).await.unwrap();
        guilds.delete(GUILD).await.unwrap();
        assert!(guilds.cached(GUILD).is_none());
        assert!(matches!(guilds.get(GUILD).await, Err(err) if err.is_not_found()));

        guilds.create(GUILD).await.unwrap();
        let second = guilds.get(GUILD).await.unwrap();
        assert!(!Arc::ptr_eq(&first.rooms, &second.rooms));
    }
}
