use serde::{Deserialize, Serialize};

use crate::id::{ChannelId, GuildId, UserId};

/// Discord caps voice channel capacity at this value
pub const MAX_USER_LIMIT: u16 = 99;
/// Capacity of a locked room
pub const LOCKED_USER_LIMIT: u16 = 1;

/// A channel which spawns a new [`VoiceRoom`] for every member joining it
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VoiceRoomLobby {
    /// The id of the lobby channel
    pub channel_id: ChannelId,
    /// The id of the guild the lobby belongs to
    pub guild_id: GuildId,
    /// The capacity of the rooms spawned by this lobby
    pub user_limit: u16,
    /// Whether owners may rename their rooms
    pub can_rename: bool,
    /// Whether owners may lock their rooms
    pub can_lock: bool,
    /// Whether owners may adjust the capacity of their rooms
    pub can_adjust_limit: bool,
    /// The rooms currently open off this lobby. Maintained by the authority
    #[serde(default)]
    pub opened_rooms: Vec<ChannelId>,
}

/// The actions a lobby may allow or forbid on its rooms
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoomAction {
    Rename,
    Lock,
    AdjustLimit,
}

impl VoiceRoomLobby {
    pub fn permits(&self, action: RoomAction) -> bool {
        match action {
            RoomAction::Rename => self.can_rename,
            RoomAction::Lock => self.can_lock,
            RoomAction::AdjustLimit => self.can_adjust_limit,
        }
    }

    /// The capacity a room of this lobby should have in the given lock state
    pub fn room_capacity(&self, locked: bool) -> u16 {
        if locked {
            LOCKED_USER_LIMIT
        } else {
            self.user_limit
        }
    }
}

pub fn valid_user_limit(user_limit: u16) -> bool {
    user_limit > 0 && user_limit <= MAX_USER_LIMIT
}

#[derive(Clone, Debug, Serialize)]
pub struct NewVoiceRoomLobby {
    pub channel_id: ChannelId,
    pub user_limit: u16,
    pub can_rename: bool,
    pub can_lock: bool,
    pub can_adjust_limit: bool,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct VoiceRoomLobbyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_limit: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_rename: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_lock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_adjust_limit: Option<bool>,
}

impl VoiceRoomLobbyPatch {
    pub fn is_empty(&self) -> bool {
        self.user_limit.is_none()
            && self.can_rename.is_none()
            && self.can_lock.is_none()
            && self.can_adjust_limit.is_none()
    }
}

/// A channel created off a lobby and owned by a member
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VoiceRoom {
    /// The id of the room channel
    pub channel_id: ChannelId,
    /// The id of the guild the room belongs to
    pub guild_id: GuildId,
    /// The lobby this room was spawned from
    pub lobby_id: ChannelId,
    /// The member who joined the lobby
    pub creator_id: UserId,
    /// The member currently controlling the room
    pub current_owner_id: UserId,
    pub is_locked: bool,
}

impl VoiceRoom {
    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.current_owner_id == user_id
    }

    pub fn is_creator(&self, user_id: UserId) -> bool {
        self.creator_id == user_id
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NewVoiceRoom {
    pub channel_id: ChannelId,
    pub lobby_id: ChannelId,
    pub creator_id: UserId,
    pub current_owner_id: UserId,
    pub is_locked: bool,
}

impl NewVoiceRoom {
    /// A fresh, unlocked room owned by its creator
    pub fn new(channel_id: ChannelId, lobby_id: ChannelId, creator_id: UserId) -> Self {
        Self {
            channel_id,
            lobby_id,
            creator_id,
            current_owner_id: creator_id,
            is_locked: false,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct VoiceRoomPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_owner_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,
}

impl VoiceRoomPatch {
    pub fn owner(user_id: UserId) -> Self {
        Self {
            current_owner_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn locked(is_locked: bool) -> Self {
        Self {
            is_locked: Some(is_locked),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby() -> VoiceRoomLobby {
        VoiceRoomLobby {
            channel_id: ChannelId::new(10),
            guild_id: GuildId::new(1),
            user_limit: 5,
            can_rename: true,
            can_lock: false,
            can_adjust_limit: true,
            opened_rooms: Vec::new(),
        }
    }

    #[test]
    fn lobby_permissions() {
        let lobby = lobby();
        assert!(lobby.permits(RoomAction::Rename));
        assert!(!lobby.permits(RoomAction::Lock));
        assert!(lobby.permits(RoomAction::AdjustLimit));
    }

    #[test]
    fn capacity_follows_lock_state() {
        let lobby = lobby();
        assert_eq!(lobby.room_capacity(true), 1);
        assert_eq!(lobby.room_capacity(false), 5);
    }

    #[test]
    fn patches_only_carry_set_fields() {
        let patch = serde_json::to_value(VoiceRoomPatch::locked(true)).unwrap();
        assert_eq!(patch, serde_json::json!({"is_locked": true}));
        assert!(VoiceRoomLobbyPatch::default().is_empty());
    }

    #[test]
    fn user_limit_bounds() {
        assert!(!valid_user_limit(0));
        assert!(valid_user_limit(1));
        assert!(valid_user_limit(99));
        assert!(!valid_user_limit(100));
    }
}
