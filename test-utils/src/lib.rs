//! Shared testing utilities for the voice room crates.
//!
//! [`MemoryAuthority`] speaks the same routes and envelopes as the remote authority while
//! keeping every document in memory. Tests seed it, hand it to the resource managers as an
//! `Arc<dyn Authority>` and then inspect both its documents and the calls it received.
//!
//! ```rust,ignore
//! let authority = MemoryAuthority::new();
//! authority.seed_guild(1);
//! authority.seed_lobby(1, 10, 5);
//! let guilds = GuildResourceManager::new(Arc::new(authority.clone()));
//! ```

use backend::{Authority, BackendError, ErrorCode, Method, Route};
use futures_util::future::{self, BoxFuture, FutureExt};
use serde_json::{json, Map, Value};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

type Documents = HashMap<(u64, u64), Value>;

#[derive(Default)]
struct State {
    guilds: HashMap<u64, Value>,
    lobbies: Documents,
    rooms: Documents,
    members: Documents,
    calls: Vec<(Method, Route)>,
    offline: bool,
}

/// An in-memory remote authority
#[derive(Clone, Default)]
pub struct MemoryAuthority(Arc<Mutex<State>>);

fn not_found(code: ErrorCode) -> BackendError {
    BackendError::api(404, code, "Not found")
}

fn conflict(code: ErrorCode) -> BackendError {
    BackendError::api(409, code, "Conflict")
}

fn id_of(value: &Value, field: &str) -> u64 {
    value[field]
        .as_str()
        .and_then(|s| s.parse().ok())
        .or_else(|| value[field].as_u64())
        .unwrap_or_default()
}

fn merge(doc: &mut Value, patch: &Value) {
    if let (Some(doc), Some(patch)) = (doc.as_object_mut(), patch.as_object()) {
        for (k, v) in patch {
            doc.insert(k.clone(), v.clone());
        }
    }
}

fn push_id(doc: &mut Value, field: &str, id: u64) {
    if let Some(list) = doc[field].as_array_mut() {
        list.push(json!(id.to_string()));
    }
}

fn pull_id(doc: &mut Value, field: &str, id: u64) {
    if let Some(list) = doc[field].as_array_mut() {
        list.retain(|v| v.as_str() != Some(id.to_string().as_str()));
    }
}

impl MemoryAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_guild(&self, guild_id: u64) {
        let mut state = self.0.lock().unwrap();
        state.guilds.insert(
            guild_id,
            json!({
                "id": guild_id.to_string(),
                "room_name_template": "{user}'s room",
                "voice_lobbies": [],
            }),
        );
    }

    pub fn seed_lobby(&self, guild_id: u64, channel_id: u64, user_limit: u16) {
        self.seed_lobby_with(guild_id, channel_id, user_limit, true, true, true);
    }

    pub fn seed_lobby_with(
        &self,
        guild_id: u64,
        channel_id: u64,
        user_limit: u16,
        can_rename: bool,
        can_lock: bool,
        can_adjust_limit: bool,
    ) {
        let mut state = self.0.lock().unwrap();
        if let Some(guild) = state.guilds.get_mut(&guild_id) {
            push_id(guild, "voice_lobbies", channel_id);
        }
        state.lobbies.insert(
            (guild_id, channel_id),
            json!({
                "channel_id": channel_id.to_string(),
                "guild_id": guild_id.to_string(),
                "user_limit": user_limit,
                "can_rename": can_rename,
                "can_lock": can_lock,
                "can_adjust_limit": can_adjust_limit,
                "opened_rooms": [],
            }),
        );
    }

    /// Delete a lobby behind the back of every cache
    pub fn drop_lobby(&self, guild_id: u64, channel_id: u64) {
        let mut state = self.0.lock().unwrap();
        state.lobbies.remove(&(guild_id, channel_id));
        if let Some(guild) = state.guilds.get_mut(&guild_id) {
            pull_id(guild, "voice_lobbies", channel_id);
        }
    }

    /// Change a room document behind the back of every cache
    pub fn patch_room(&self, guild_id: u64, channel_id: u64, patch: &Value) {
        let mut state = self.0.lock().unwrap();
        if let Some(room) = state.rooms.get_mut(&(guild_id, channel_id)) {
            merge(room, patch);
        }
    }

    pub fn room(&self, guild_id: u64, channel_id: u64) -> Option<Value> {
        self.0.lock().unwrap().rooms.get(&(guild_id, channel_id)).cloned()
    }

    pub fn lobby(&self, guild_id: u64, channel_id: u64) -> Option<Value> {
        self.0.lock().unwrap().lobbies.get(&(guild_id, channel_id)).cloned()
    }

    pub fn member(&self, guild_id: u64, member_id: u64) -> Option<Value> {
        self.0.lock().unwrap().members.get(&(guild_id, member_id)).cloned()
    }

    pub fn room_count(&self) -> usize {
        self.0.lock().unwrap().rooms.len()
    }

    /// Every following request fails like an unreachable server
    pub fn set_offline(&self, offline: bool) {
        self.0.lock().unwrap().offline = offline;
    }

    pub fn calls(&self) -> Vec<(Method, Route)> {
        self.0.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.0.lock().unwrap().calls.len()
    }

    pub fn clear_calls(&self) {
        self.0.lock().unwrap().calls.clear();
    }

    fn handle(
        &self,
        method: &Method,
        route: Route,
        body: Option<Value>,
    ) -> Result<Option<Value>, BackendError> {
        let mut guard = self.0.lock().unwrap();
        let state = &mut *guard;
        state.calls.push((method.clone(), route));
        if state.offline {
            return Err(BackendError::Timeout(Duration::from_secs(10)));
        }
        let body = body.unwrap_or_else(|| Value::Object(Map::new()));

        match route {
            Route::Guilds => {
                let guild_id = id_of(&body, "id");
                if state.guilds.contains_key(&guild_id) {
                    return Err(conflict(ErrorCode::Other("guild_already_exists".into())));
                }
                let mut doc = json!({"room_name_template": "{user}'s room", "voice_lobbies": []});
                merge(&mut doc, &body);
                state.guilds.insert(guild_id, doc.clone());
                Ok(Some(doc))
            }
            Route::Guild { guild_id } => {
                let guild = state.guilds.get_mut(&guild_id);
                match (method.as_str(), guild) {
                    (_, None) => Err(not_found(ErrorCode::GuildNotFound)),
                    ("GET", Some(doc)) => Ok(Some(doc.clone())),
                    ("PATCH", Some(doc)) => {
                        merge(doc, &body);
                        Ok(Some(doc.clone()))
                    }
                    ("DELETE", Some(_)) => {
                        state.guilds.remove(&guild_id);
                        Ok(None)
                    }
                    _ => Err(BackendError::api(405, ErrorCode::Other("method".into()), "")),
                }
            }
            Route::VoiceLobbies { guild_id } => {
                let channel_id = id_of(&body, "channel_id");
                if !state.guilds.contains_key(&guild_id) {
                    return Err(not_found(ErrorCode::GuildNotFound));
                }
                if state.lobbies.contains_key(&(guild_id, channel_id)) {
                    return Err(conflict(ErrorCode::LobbyAlreadyExists));
                }
                if state.rooms.contains_key(&(guild_id, channel_id)) {
                    return Err(conflict(ErrorCode::LobbyIsActiveRoom));
                }
                let mut doc = json!({"guild_id": guild_id.to_string(), "opened_rooms": []});
                merge(&mut doc, &body);
                state.lobbies.insert((guild_id, channel_id), doc.clone());
                if let Some(guild) = state.guilds.get_mut(&guild_id) {
                    push_id(guild, "voice_lobbies", channel_id);
                }
                Ok(Some(doc))
            }
            Route::VoiceLobby {
                guild_id,
                channel_id,
            } => {
                let key = (guild_id, channel_id);
                match (method.as_str(), state.lobbies.get_mut(&key)) {
                    (_, None) => Err(not_found(ErrorCode::LobbyNotFound)),
                    ("GET", Some(doc)) => Ok(Some(doc.clone())),
                    ("PATCH", Some(doc)) => {
                        merge(doc, &body);
                        Ok(Some(doc.clone()))
                    }
                    ("DELETE", Some(_)) => {
                        state.lobbies.remove(&key);
                        if let Some(guild) = state.guilds.get_mut(&guild_id) {
                            pull_id(guild, "voice_lobbies", channel_id);
                        }
                        Ok(None)
                    }
                    _ => Err(BackendError::api(405, ErrorCode::Other("method".into()), "")),
                }
            }
            Route::VoiceRooms { guild_id } => {
                let channel_id = id_of(&body, "channel_id");
                let lobby_id = id_of(&body, "lobby_id");
                if state.rooms.contains_key(&(guild_id, channel_id)) {
                    return Err(conflict(ErrorCode::RoomAlreadyExists));
                }
                if state.lobbies.contains_key(&(guild_id, channel_id)) {
                    return Err(conflict(ErrorCode::LobbyIsActiveRoom));
                }
                match state.lobbies.get_mut(&(guild_id, lobby_id)) {
                    Some(lobby) => push_id(lobby, "opened_rooms", channel_id),
                    None => return Err(not_found(ErrorCode::LobbyNotFound)),
                }
                let mut doc = json!({"guild_id": guild_id.to_string()});
                merge(&mut doc, &body);
                state.rooms.insert((guild_id, channel_id), doc.clone());
                Ok(Some(doc))
            }
            Route::VoiceRoom {
                guild_id,
                channel_id,
            } => {
                let key = (guild_id, channel_id);
                match (method.as_str(), state.rooms.get_mut(&key)) {
                    (_, None) => Err(not_found(ErrorCode::RoomNotFound)),
                    ("GET", Some(doc)) => Ok(Some(doc.clone())),
                    ("PATCH", Some(doc)) => {
                        merge(doc, &body);
                        Ok(Some(doc.clone()))
                    }
                    ("DELETE", Some(doc)) => {
                        let lobby_id = id_of(doc, "lobby_id");
                        state.rooms.remove(&key);
                        if let Some(lobby) = state.lobbies.get_mut(&(guild_id, lobby_id)) {
                            pull_id(lobby, "opened_rooms", channel_id);
                        }
                        Ok(None)
                    }
                    _ => Err(BackendError::api(405, ErrorCode::Other("method".into()), "")),
                }
            }
            Route::Members { guild_id } => {
                let member_id = id_of(&body, "member_id");
                if state.members.contains_key(&(guild_id, member_id)) {
                    return Err(conflict(ErrorCode::Other("member_already_exists".into())));
                }
                let mut doc = json!({
                    "guild_id": guild_id.to_string(),
                    "voice_seconds": 0,
                    "message_count": 0,
                    "points": 0,
                });
                merge(&mut doc, &body);
                state.members.insert((guild_id, member_id), doc.clone());
                Ok(Some(doc))
            }
            Route::Member {
                guild_id,
                member_id,
            } => {
                let key = (guild_id, member_id);
                match (method.as_str(), state.members.get_mut(&key)) {
                    (_, None) => Err(not_found(ErrorCode::MemberNotFound)),
                    ("GET", Some(doc)) => Ok(Some(doc.clone())),
                    ("PATCH", Some(doc)) => {
                        merge(doc, &body);
                        Ok(Some(doc.clone()))
                    }
                    ("DELETE", Some(_)) => {
                        state.members.remove(&key);
                        Ok(None)
                    }
                    _ => Err(BackendError::api(405, ErrorCode::Other("method".into()), "")),
                }
            }
        }
    }
}

impl Authority for MemoryAuthority {
    fn request(
        &self,
        method: Method,
        route: Route,
        body: Option<Value>,
    ) -> BoxFuture<'_, Result<Option<Value>, BackendError>> {
        future::ready(self.handle(&method, route, body)).boxed()
    }
}
