use std::sync::Arc;
use tempvoice_cache::VoiceTransition;
use tempvoice_framework::prelude::*;
use tempvoice_models::room::{NewVoiceRoom, VoiceRoom, VoiceRoomLobby, VoiceRoomPatch};

/// Drive the room lifecycle from a member moving between voice channels
pub async fn handle_transition(bot: &BotContext, transition: VoiceTransition) -> Result<(), RoomError> {
    let VoiceTransition {
        guild_id,
        user_id,
        previous,
        current,
    } = transition;
    bot.stats.voice_events.inc();

    let left = match previous {
        Some(channel_id) => on_leave(bot, guild_id, user_id, channel_id).await,
        None => Ok(()),
    };
    let joined = match current {
        Some(channel_id) => on_join(bot, guild_id, user_id, channel_id).await,
        None => Ok(()),
    };
    left.and(joined)
}

/// The guild, or `None` when it was never set up for voice rooms
async fn guild(bot: &BotContext, guild_id: GuildId) -> Result<Option<Guild>, RoomError> {
    match bot.guilds.get(guild_id).await {
        Ok(guild) => Ok(Some(guild)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err.into()),
    }
}

async fn on_join(
    bot: &BotContext,
    guild_id: GuildId,
    user_id: UserId,
    channel_id: ChannelId,
) -> Result<(), RoomError> {
    let guild = match guild(bot, guild_id).await? {
        Some(guild) => guild,
        None => return Ok(()),
    };
    if !guild.is_lobby(channel_id) {
        return Ok(());
    }

    create_room(bot, &guild, user_id, channel_id).await?;
    Ok(())
}

async fn on_leave(
    bot: &BotContext,
    guild_id: GuildId,
    user_id: UserId,
    channel_id: ChannelId,
) -> Result<(), RoomError> {
    let guild = match guild(bot, guild_id).await? {
        Some(guild) => guild,
        None => return Ok(()),
    };
    if guild.is_lobby(channel_id) {
        return Ok(());
    }
    let room = match guild.rooms.fetch(channel_id).await {
        Ok(room) => room,
        Err(err) if err.is_not_found() => return Ok(()),
        Err(err) => return Err(err.into()),
    };

    let remaining = bot
        .cache
        .occupants(channel_id)
        .into_iter()
        .filter(|occupant| *occupant != user_id)
        .collect::<Vec<_>>();
    match remaining.first() {
        None => teardown(bot, &guild, channel_id).await,
        Some(next) if room.is_owner(user_id) => {
            if governing_lobby(bot, &guild, &room).await?.is_none() {
                return Ok(());
            }
            let room = guild
                .rooms
                .update(channel_id, &VoiceRoomPatch::owner(*next))
                .await?;
            bot.stats.rooms.handoffs.inc();
            tracing::info!(guild = %guild_id, channel = %channel_id, from = %user_id, to = %room.current_owner_id, "Handed off room");
            Ok(())
        }
        Some(_) => Ok(()),
    }
}

/// Look the lobby a room was opened from up again on the authority.
///
/// A room whose lobby vanished is torn down and `None` is returned.
pub async fn governing_lobby(
    bot: &BotContext,
    guild: &Guild,
    room: &VoiceRoom,
) -> Result<Option<Arc<VoiceRoomLobby>>, RoomError> {
    guild.lobbies.evict(room.lobby_id);
    match guild.lobbies.fetch(room.lobby_id).await {
        Ok(lobby) => Ok(Some(lobby)),
        Err(err) if err.is_not_found() => {
            tracing::warn!(guild = %guild.id, channel = %room.channel_id, lobby = %room.lobby_id, "Lobby vanished, tearing down room");
            if let Err(err) = teardown(bot, guild, room.channel_id).await {
                tracing::error!(channel = %room.channel_id, err = ?err, "Could not tear down orphaned room");
            }
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Provision a room for a member who joined a lobby.
///
/// The channel is created first, then the record is registered and the member moved in. A later
/// step failing rolls back the ones before it.
pub async fn create_room(
    bot: &BotContext,
    guild: &Guild,
    user_id: UserId,
    lobby_id: ChannelId,
) -> Result<Arc<VoiceRoom>, RoomError> {
    let guild_id = guild.id;
    if let Some(remaining) = bot.cooldowns.remaining(guild_id, user_id) {
        bot.stats.rooms.rejected_creations.inc();
        let rejection = Rejection::Cooldown(remaining);
        if let Err(err) = bot.platform.move_member(guild_id, user_id, None).await {
            tracing::warn!(guild = %guild_id, user = %user_id, err = %err, "Could not disconnect member");
        }
        if let Err(err) = bot.platform.notify_member(user_id, rejection.to_string()).await {
            tracing::debug!(user = %user_id, err = %err, "Could not notify member");
        }
        return Err(rejection.into());
    }

    let lobby = guild.lobbies.fetch(lobby_id).await?;
    guild.members.fetch(user_id, true).await?;

    let display_name = bot
        .cache
        .display_name(guild_id, user_id)
        .unwrap_or_else(|| "Member".into());
    let channel = NewChannel {
        guild_id,
        name: guild.room_name(&display_name),
        parent_id: bot.cache.channel(lobby_id).and_then(|c| c.parent_id),
        user_limit: lobby.user_limit,
    };
    let channel_id = bot.platform.create_voice_channel(channel).await?;

    let room = match guild
        .rooms
        .register(&NewVoiceRoom::new(channel_id, lobby_id, user_id))
        .await
    {
        Ok(room) => room,
        Err(err) => {
            discard_channel(bot, channel_id).await;
            return Err(RoomError::partial(Stage::RegisterRoom, err));
        }
    };

    if let Err(err) = bot
        .platform
        .move_member(guild_id, user_id, Some(channel_id))
        .await
    {
        discard_channel(bot, channel_id).await;
        if let Err(err) = guild.rooms.delete(channel_id).await {
            tracing::error!(guild = %guild_id, channel = %channel_id, err = ?err, "Could not roll back room record");
        }
        return Err(RoomError::partial(Stage::MoveMember, err));
    }

    bot.cooldowns.mark(guild_id, user_id);
    bot.opened.insert(channel_id);
    bot.stats.rooms.created.inc();
    bot.stats.rooms.active.inc();
    tracing::info!(guild = %guild_id, lobby = %lobby_id, channel = %channel_id, owner = %user_id, "Created room");
    Ok(room)
}

async fn discard_channel(bot: &BotContext, channel_id: ChannelId) {
    if let Err(err) = bot.platform.delete_channel(channel_id).await {
        if !err.is_unknown_channel() {
            tracing::error!(channel = %channel_id, err = ?err, "Could not roll back channel");
        }
    }
}

/// Delete a room's channel and then its record.
///
/// Runs at most once at a time per room, and a room that is already gone on either side counts
/// as torn down, so repeated calls for the same room all succeed.
pub async fn teardown(bot: &BotContext, guild: &Guild, channel_id: ChannelId) -> Result<(), RoomError> {
    if !bot.teardowns.insert(channel_id) {
        tracing::debug!(channel = %channel_id, "Teardown already in flight");
        return Ok(());
    }
    let known = guild.rooms.cached(channel_id).is_some();
    let res = delete_room(bot, guild, channel_id).await;
    bot.teardowns.remove(&channel_id);

    if res.is_ok() {
        if bot.opened.remove(&channel_id).is_some() {
            bot.stats.rooms.active.dec();
        }
        if known {
            bot.stats.rooms.deleted.inc();
            tracing::info!(guild = %guild.id, channel = %channel_id, "Tore down room");
        }
    }
    res
}

async fn delete_room(bot: &BotContext, guild: &Guild, channel_id: ChannelId) -> Result<(), RoomError> {
    match bot.platform.delete_channel(channel_id).await {
        Ok(()) => {}
        Err(err) if err.is_unknown_channel() => {
            tracing::debug!(channel = %channel_id, "Channel was already deleted");
        }
        Err(err) => return Err(err.into()),
    }
    guild.rooms.delete(channel_id).await?;
    Ok(())
}
