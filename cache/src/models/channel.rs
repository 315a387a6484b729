use tempvoice_models::{
    discord::channel::{Channel, ChannelType},
    id::{ChannelId, GuildId},
};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CachedChannel {
    pub id: ChannelId,
    pub guild_id: GuildId,
    pub name: String,
    pub kind: ChannelType,
    pub parent_id: Option<ChannelId>,
    pub user_limit: Option<u16>,
}

impl CachedChannel {
    pub fn from_channel(guild_id: GuildId, channel: &Channel) -> Self {
        Self {
            id: ChannelId(channel.id),
            guild_id,
            name: channel.name.clone().unwrap_or_default(),
            kind: channel.kind,
            parent_id: channel.parent_id.map(ChannelId),
            user_limit: channel.user_limit.and_then(|l| u16::try_from(l).ok()),
        }
    }
}
