use tempvoice_models::id::{ChannelId, GuildId, UserId};

/// A member moving between voice channels of a guild. At least one side is set and both differ
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct VoiceTransition {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub previous: Option<ChannelId>,
    pub current: Option<ChannelId>,
}
