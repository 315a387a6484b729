use std::sync::Arc;
use tempvoice_framework::prelude::*;
use tempvoice_models::{
    guild::MAX_CHANNEL_NAME_LENGTH,
    room::{RoomAction, VoiceRoom, VoiceRoomLobby, VoiceRoomPatch},
};

use crate::services::voice_rooms::{self, teardown};

/// What the room looks like after a control ran
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoomPanel {
    pub channel_id: ChannelId,
    pub name: Option<String>,
    pub owner_id: UserId,
    pub creator_id: UserId,
    pub is_locked: bool,
    pub user_limit: u16,
}

impl RoomPanel {
    fn new(bot: &BotContext, room: &VoiceRoom, user_limit: u16) -> Self {
        Self {
            channel_id: room.channel_id,
            name: bot.cache.channel(room.channel_id).map(|c| c.name.clone()),
            owner_id: room.current_owner_id,
            creator_id: room.creator_id,
            is_locked: room.is_locked,
            user_limit,
        }
    }

    /// The capacity the room is known to have
    fn current(bot: &BotContext, room: &VoiceRoom, lobby: &VoiceRoomLobby) -> Self {
        let user_limit = if room.is_locked {
            lobby.room_capacity(true)
        } else {
            bot.cache
                .channel(room.channel_id)
                .and_then(|c| c.user_limit)
                .unwrap_or(lobby.user_limit)
        };
        Self::new(bot, room, user_limit)
    }
}

struct Resolved {
    guild: Guild,
    room: Arc<VoiceRoom>,
}

/// The room the invoker currently sits in
async fn resolve(bot: &BotContext, guild_id: GuildId, invoker: UserId) -> Result<Resolved, RoomError> {
    let channel_id = bot
        .cache
        .voice_channel(guild_id, invoker)
        .ok_or(Rejection::NotInRoom)?;
    let guild = match bot.guilds.get(guild_id).await {
        Ok(guild) => guild,
        Err(err) if err.is_not_found() => return Err(Rejection::NotInRoom.into()),
        Err(err) => return Err(err.into()),
    };
    let room = match guild.rooms.fetch(channel_id).await {
        Ok(room) => room,
        Err(err) if err.is_not_found() => return Err(Rejection::NotInRoom.into()),
        Err(err) => return Err(err.into()),
    };
    Ok(Resolved { guild, room })
}

/// The lobby the room was opened from. A room whose lobby vanished is gone once this returns
async fn governing_lobby(bot: &BotContext, resolved: &Resolved) -> Result<Arc<VoiceRoomLobby>, RoomError> {
    voice_rooms::governing_lobby(bot, &resolved.guild, &resolved.room)
        .await?
        .ok_or_else(|| Rejection::LobbyMissing.into())
}

fn ensure_owner(room: &VoiceRoom, invoker: UserId) -> Result<(), RoomError> {
    if room.is_owner(invoker) {
        Ok(())
    } else {
        Err(Rejection::NotOwner.into())
    }
}

fn ensure_permitted(lobby: &VoiceRoomLobby, action: RoomAction) -> Result<(), RoomError> {
    if lobby.permits(action) {
        Ok(())
    } else {
        Err(Rejection::ActionDisabled(action).into())
    }
}

pub async fn rename(
    bot: &BotContext,
    guild_id: GuildId,
    invoker: UserId,
    name: &str,
) -> Result<RoomPanel, RoomError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_CHANNEL_NAME_LENGTH {
        return Err(Rejection::InvalidName.into());
    }

    let resolved = resolve(bot, guild_id, invoker).await?;
    ensure_owner(&resolved.room, invoker)?;
    let lobby = governing_lobby(bot, &resolved).await?;
    ensure_permitted(&lobby, RoomAction::Rename)?;

    let room = &resolved.room;
    bot.platform
        .set_name(room.channel_id, name.to_string())
        .await?;
    bot.stats.controls.with_label_values(&["rename"]).inc();

    let mut panel = RoomPanel::current(bot, room, &lobby);
    panel.name = Some(name.to_string());
    Ok(panel)
}

/// Lock an unlocked room or unlock a locked one.
///
/// A locked room has a capacity of 1, an unlocked one the capacity of its lobby.
pub async fn toggle_lock(
    bot: &BotContext,
    guild_id: GuildId,
    invoker: UserId,
) -> Result<RoomPanel, RoomError> {
    let resolved = resolve(bot, guild_id, invoker).await?;
    ensure_owner(&resolved.room, invoker)?;
    let lobby = governing_lobby(bot, &resolved).await?;
    ensure_permitted(&lobby, RoomAction::Lock)?;

    let Resolved { guild, room } = resolved;
    let locked = !room.is_locked;
    let capacity = lobby.room_capacity(locked);
    let updated = guild
        .rooms
        .update(room.channel_id, &VoiceRoomPatch::locked(locked))
        .await?;

    if let Err(err) = bot.platform.set_user_limit(room.channel_id, capacity).await {
        if let Err(err) = guild
            .rooms
            .update(room.channel_id, &VoiceRoomPatch::locked(room.is_locked))
            .await
        {
            tracing::error!(channel = %room.channel_id, err = ?err, "Could not roll back lock state");
        }
        return Err(RoomError::partial(Stage::ApplyLock, err));
    }
    bot.stats
        .controls
        .with_label_values(&[if locked { "lock" } else { "unlock" }])
        .inc();

    Ok(RoomPanel::new(bot, &updated, capacity))
}

/// Change the capacity of an unlocked room. The limit must exceed 1 and stay within the lobby's
pub async fn set_limit(
    bot: &BotContext,
    guild_id: GuildId,
    invoker: UserId,
    limit: i64,
) -> Result<RoomPanel, RoomError> {
    if limit <= 1 {
        return Err(Rejection::LimitTooLow.into());
    }

    let resolved = resolve(bot, guild_id, invoker).await?;
    ensure_owner(&resolved.room, invoker)?;
    let lobby = governing_lobby(bot, &resolved).await?;
    ensure_permitted(&lobby, RoomAction::AdjustLimit)?;

    let room = &resolved.room;
    if room.is_locked {
        return Err(Rejection::Locked.into());
    }
    let limit = match u16::try_from(limit) {
        Ok(limit) if limit <= lobby.user_limit => limit,
        _ => {
            return Err(Rejection::LimitTooHigh {
                ceiling: lobby.user_limit,
            }
            .into())
        }
    };

    bot.platform.set_user_limit(room.channel_id, limit).await?;
    bot.stats.controls.with_label_values(&["limit"]).inc();
    Ok(RoomPanel::new(bot, room, limit))
}

/// Hand the room back to the member who created it
pub async fn reclaim(
    bot: &BotContext,
    guild_id: GuildId,
    invoker: UserId,
) -> Result<RoomPanel, RoomError> {
    let resolved = resolve(bot, guild_id, invoker).await?;
    let room = &resolved.room;
    if !room.is_creator(invoker) {
        return Err(Rejection::NotCreator.into());
    }
    if room.is_owner(invoker) {
        return Err(Rejection::AlreadyOwner.into());
    }
    let lobby = governing_lobby(bot, &resolved).await?;

    let updated = resolved
        .guild
        .rooms
        .update(room.channel_id, &VoiceRoomPatch::owner(invoker))
        .await?;
    bot.stats.controls.with_label_values(&["reclaim"]).inc();
    tracing::info!(guild = %guild_id, channel = %room.channel_id, owner = %invoker, "Reclaimed room");
    Ok(RoomPanel::current(bot, &updated, &lobby))
}

/// Tear the room down right away, whoever is still inside
pub async fn close(bot: &BotContext, guild_id: GuildId, invoker: UserId) -> Result<(), RoomError> {
    let resolved = resolve(bot, guild_id, invoker).await?;
    ensure_owner(&resolved.room, invoker)?;

    teardown(bot, &resolved.guild, resolved.room.channel_id).await?;
    bot.stats.controls.with_label_values(&["close"]).inc();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, Op, GUILD, LOBBY, NIA, VIC};
    use backend::Method;

    fn authority_writes(h: &Harness) -> usize {
        h.authority
            .calls()
            .iter()
            .filter(|(method, _)| *method != Method::GET)
            .count()
    }

    #[tokio::test]
    async fn locking_and_unlocking_follow_the_lobby() {
        let h = Harness::new();
        let room = h.open_room(NIA).await;

        let panel = toggle_lock(&h.bot, GUILD, NIA).await.unwrap();
        assert!(panel.is_locked);
        assert_eq!(panel.user_limit, 1);
        assert_eq!(h.capacity_of(room), Some(1));
        assert_eq!(h.room(room).unwrap()["is_locked"], true);

        let panel = toggle_lock(&h.bot, GUILD, NIA).await.unwrap();
        assert!(!panel.is_locked);
        assert_eq!(panel.user_limit, 5);
        assert_eq!(h.capacity_of(room), Some(5));
        assert_eq!(h.room(room).unwrap()["is_locked"], false);
    }

    #[tokio::test]
    async fn a_refused_capacity_change_restores_the_lock_state() {
        let h = Harness::new();
        let room = h.open_room(NIA).await;
        h.channels.fail_next(Op::SetLimit);

        let err = toggle_lock(&h.bot, GUILD, NIA).await.unwrap_err();
        assert!(matches!(
            err,
            RoomError::Partial {
                stage: Stage::ApplyLock,
                ..
            }
        ));
        assert_eq!(h.room(room).unwrap()["is_locked"], false);
        assert_eq!(h.capacity_of(room), Some(5));
    }

    #[tokio::test]
    async fn only_the_owner_controls_the_room() {
        let h = Harness::new();
        let room = h.open_room(NIA).await;
        h.move_to(VIC, Some(room)).await.unwrap();
        h.authority.clear_calls();

        let err = toggle_lock(&h.bot, GUILD, VIC).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::NotOwner));
        let err = rename(&h.bot, GUILD, VIC, "Mine now").await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::NotOwner));
        let err = close(&h.bot, GUILD, VIC).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::NotOwner));

        assert_eq!(authority_writes(&h), 0);
        assert!(h.channels.deleted().is_empty());
        assert_eq!(h.room(room).unwrap()["is_locked"], false);
    }

    #[tokio::test]
    async fn controls_need_a_room() {
        let h = Harness::new();
        let err = toggle_lock(&h.bot, GUILD, NIA).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::NotInRoom));

        h.move_to(NIA, Some(ChannelId::new(11))).await.unwrap();
        let err = reclaim(&h.bot, GUILD, NIA).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::NotInRoom));
    }

    #[tokio::test]
    async fn disabled_actions_are_refused() {
        let h = Harness::with_lobby(false, false, false);
        let room = h.open_room(NIA).await;
        h.authority.clear_calls();

        let err = toggle_lock(&h.bot, GUILD, NIA).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::ActionDisabled(RoomAction::Lock)));
        let err = rename(&h.bot, GUILD, NIA, "Quiet corner").await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::ActionDisabled(RoomAction::Rename)));
        let err = set_limit(&h.bot, GUILD, NIA, 3).await.unwrap_err();
        assert_eq!(
            err.rejection(),
            Some(Rejection::ActionDisabled(RoomAction::AdjustLimit))
        );

        assert_eq!(authority_writes(&h), 0);
        assert_eq!(h.capacity_of(room), Some(5));
    }

    #[tokio::test]
    async fn limits_stay_between_two_and_the_lobby_limit() {
        let h = Harness::new();
        let room = h.open_room(NIA).await;

        let err = set_limit(&h.bot, GUILD, NIA, 1).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::LimitTooLow));
        let err = set_limit(&h.bot, GUILD, NIA, 6).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::LimitTooHigh { ceiling: 5 }));
        let err = set_limit(&h.bot, GUILD, NIA, i64::MAX).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::LimitTooHigh { ceiling: 5 }));
        assert_eq!(h.capacity_of(room), Some(5));

        let panel = set_limit(&h.bot, GUILD, NIA, 3).await.unwrap();
        assert_eq!(panel.user_limit, 3);
        assert_eq!(h.capacity_of(room), Some(3));
    }

    #[tokio::test]
    async fn locked_rooms_keep_their_capacity() {
        let h = Harness::new();
        let room = h.open_room(NIA).await;
        toggle_lock(&h.bot, GUILD, NIA).await.unwrap();

        let err = set_limit(&h.bot, GUILD, NIA, 3).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::Locked));
        assert_eq!(h.capacity_of(room), Some(1));
    }

    #[tokio::test]
    async fn renaming_trims_and_bounds_the_name() {
        let h = Harness::new();
        let room = h.open_room(NIA).await;

        let err = rename(&h.bot, GUILD, NIA, "   ").await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::InvalidName));
        let err = rename(&h.bot, GUILD, NIA, &"a".repeat(101)).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::InvalidName));

        let panel = rename(&h.bot, GUILD, NIA, "  Study hall ").await.unwrap();
        assert_eq!(panel.name.as_deref(), Some("Study hall"));
        assert_eq!(h.channels.channel(room).unwrap().name, "Study hall");
    }

    #[tokio::test]
    async fn a_refused_rename_reports_the_platform() {
        let h = Harness::new();
        let room = h.open_room(NIA).await;
        h.channels.fail_next(Op::SetName);

        let err = rename(&h.bot, GUILD, NIA, "Study hall").await.unwrap_err();
        assert!(matches!(err, RoomError::Platform(_)));
        assert_eq!(h.channels.channel(room).unwrap().name, "Nia's room");
    }

    #[tokio::test]
    async fn reclaiming_while_owner_changes_nothing() {
        let h = Harness::new();
        let room = h.open_room(NIA).await;
        h.authority.clear_calls();

        let err = reclaim(&h.bot, GUILD, NIA).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::AlreadyOwner));
        assert_eq!(h.owner_of(room), Some(NIA));
        assert_eq!(authority_writes(&h), 0);
    }

    #[tokio::test]
    async fn creators_reclaim_their_rooms() {
        let h = Harness::new();
        let room = h.open_room(NIA).await;
        h.move_to(VIC, Some(room)).await.unwrap();
        h.move_to(NIA, Some(ChannelId::new(11))).await.unwrap();
        assert_eq!(h.owner_of(room), Some(VIC));

        let err = reclaim(&h.bot, GUILD, VIC).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::NotCreator));

        h.move_to(NIA, Some(room)).await.unwrap();
        let panel = reclaim(&h.bot, GUILD, NIA).await.unwrap();
        assert_eq!(panel.owner_id, NIA);
        assert_eq!(panel.creator_id, NIA);
        assert_eq!(h.owner_of(room), Some(NIA));
    }

    #[tokio::test]
    async fn closing_tears_the_room_down() {
        let h = Harness::new();
        let room = h.open_room(NIA).await;
        h.move_to(VIC, Some(room)).await.unwrap();

        close(&h.bot, GUILD, NIA).await.unwrap();
        assert_eq!(h.channels.deleted(), vec![room]);
        assert!(h.room(room).is_none());

        let err = close(&h.bot, GUILD, NIA).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::NotInRoom));
    }

    #[tokio::test]
    async fn rooms_of_a_vanished_lobby_are_torn_down() {
        let h = Harness::new();
        let room = h.open_room(NIA).await;
        h.authority.drop_lobby(GUILD.get(), LOBBY.get());

        let err = toggle_lock(&h.bot, GUILD, NIA).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::LobbyMissing));
        assert_eq!(h.channels.deleted(), vec![room]);
        assert!(h.room(room).is_none());
    }

    #[tokio::test]
    async fn lobby_changes_reach_existing_rooms() {
        let h = Harness::new();
        let room = h.open_room(NIA).await;
        crate::commands::lobby::edit(&h.bot, GUILD, LOBBY, Some(8), Default::default())
            .await
            .unwrap();

        let panel = set_limit(&h.bot, GUILD, NIA, 8).await.unwrap();
        assert_eq!(panel.user_limit, 8);
        assert_eq!(h.capacity_of(room), Some(8));
    }
}
