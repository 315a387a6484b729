use serde::{Deserialize, Serialize};

use crate::id::{GuildId, UserId};

/// A member's activity profile inside a guild. The counters are computed by the authority
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GuildMember {
    pub member_id: UserId,
    pub guild_id: GuildId,
    #[serde(default)]
    pub voice_seconds: u64,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default)]
    pub points: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewGuildMember {
    pub member_id: UserId,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct GuildMemberPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u64>,
}
