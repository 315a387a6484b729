use std::sync::Arc;
use tempvoice_framework::prelude::*;
use tempvoice_models::{
    discord::channel::ChannelType,
    room::{valid_user_limit, NewVoiceRoomLobby, VoiceRoomLobby, VoiceRoomLobbyPatch},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LobbySettings {
    pub user_limit: i64,
    pub can_rename: bool,
    pub can_lock: bool,
    pub can_adjust_limit: bool,
}

impl Default for LobbySettings {
    fn default() -> Self {
        Self {
            user_limit: 5,
            can_rename: true,
            can_lock: true,
            can_adjust_limit: true,
        }
    }
}

fn lobby_limit(user_limit: i64) -> Result<u16, RoomError> {
    match u16::try_from(user_limit) {
        Ok(limit) if valid_user_limit(limit) => Ok(limit),
        _ => Err(Rejection::InvalidLobbyLimit.into()),
    }
}

/// The guild, registering it with the authority the first time a lobby is set up
async fn guild_or_register(bot: &BotContext, guild_id: GuildId) -> Result<Guild, RoomError> {
    match bot.guilds.get(guild_id).await {
        Ok(guild) => Ok(guild),
        Err(err) if err.is_not_found() => {
            tracing::info!(guild = %guild_id, "Registering guild");
            Ok(bot.guilds.create(guild_id).await?)
        }
        Err(err) => Err(err.into()),
    }
}

/// Turn a voice channel into a lobby
pub async fn setup(
    bot: &BotContext,
    guild_id: GuildId,
    channel_id: ChannelId,
    settings: LobbySettings,
) -> Result<Arc<VoiceRoomLobby>, RoomError> {
    let user_limit = lobby_limit(settings.user_limit)?;
    if let Some(channel) = bot.cache.channel(channel_id) {
        if channel.kind != ChannelType::GuildVoice {
            return Err(Rejection::NotVoiceChannel.into());
        }
    }

    let guild = guild_or_register(bot, guild_id).await?;
    if guild.rooms.cached(channel_id).is_some() {
        return Err(Rejection::ChannelIsRoom.into());
    }
    let lobby = guild
        .lobbies
        .create(&NewVoiceRoomLobby {
            channel_id,
            user_limit,
            can_rename: settings.can_rename,
            can_lock: settings.can_lock,
            can_adjust_limit: settings.can_adjust_limit,
        })
        .await?;
    tracing::info!(guild = %guild_id, lobby = %channel_id, "Lobby set up");
    Ok(lobby)
}

pub async fn edit(
    bot: &BotContext,
    guild_id: GuildId,
    channel_id: ChannelId,
    user_limit: Option<i64>,
    patch: VoiceRoomLobbyPatch,
) -> Result<Arc<VoiceRoomLobby>, RoomError> {
    let patch = VoiceRoomLobbyPatch {
        user_limit: user_limit.map(lobby_limit).transpose()?,
        ..patch
    };

    let guild = bot.guilds.get(guild_id).await?;
    if !guild.is_lobby(channel_id) {
        return Err(Rejection::NotALobby.into());
    }
    if patch.is_empty() {
        return Ok(guild.lobbies.fetch(channel_id).await?);
    }
    Ok(guild.lobbies.update(channel_id, &patch).await?)
}

/// Stop a channel from being a lobby. Rooms it opened are closed the next time they are touched
pub async fn remove(bot: &BotContext, guild_id: GuildId, channel_id: ChannelId) -> Result<(), RoomError> {
    let guild = bot.guilds.get(guild_id).await?;
    if !guild.is_lobby(channel_id) {
        return Err(Rejection::NotALobby.into());
    }
    guild.lobbies.delete(channel_id).await?;
    tracing::info!(guild = %guild_id, lobby = %channel_id, "Lobby removed");
    Ok(())
}
