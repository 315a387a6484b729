use futures_util::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tempvoice_cache::{Cache, CachedChannel};
use tempvoice_framework::{error::PlatformErrorKind, prelude::*};
use tempvoice_models::{discord::channel::ChannelType, stats::BotStats};
use test_utils::MemoryAuthority;

use crate::services::voice_rooms;

pub const GUILD: GuildId = GuildId::new(1);
pub const CATEGORY: ChannelId = ChannelId::new(5);
pub const LOBBY: ChannelId = ChannelId::new(10);
pub const NIA: UserId = UserId::new(3);
pub const VIC: UserId = UserId::new(4);
pub const WES: UserId = UserId::new(5);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Op {
    Create,
    Delete,
    SetName,
    SetLimit,
    Move,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LiveChannel {
    pub name: String,
    pub user_limit: u16,
    pub parent_id: Option<ChannelId>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    channels: HashMap<ChannelId, LiveChannel>,
    created: Vec<ChannelId>,
    deleted: Vec<ChannelId>,
    moves: Vec<(UserId, Option<ChannelId>)>,
    notices: Vec<(UserId, String)>,
    failing: Option<Op>,
}

/// A channel provisioner which keeps its channels in memory and records every call
#[derive(Default)]
pub struct RecordingChannels(Mutex<State>);

impl RecordingChannels {
    /// Make the next call of the given kind fail
    pub fn fail_next(&self, op: Op) {
        self.0.lock().unwrap().failing = Some(op);
    }

    pub fn channel(&self, channel_id: ChannelId) -> Option<LiveChannel> {
        self.0.lock().unwrap().channels.get(&channel_id).cloned()
    }

    pub fn created(&self) -> Vec<ChannelId> {
        self.0.lock().unwrap().created.clone()
    }

    pub fn deleted(&self) -> Vec<ChannelId> {
        self.0.lock().unwrap().deleted.clone()
    }

    pub fn moves(&self) -> Vec<(UserId, Option<ChannelId>)> {
        self.0.lock().unwrap().moves.clone()
    }

    pub fn notices(&self) -> Vec<(UserId, String)> {
        self.0.lock().unwrap().notices.clone()
    }

    fn run<T>(&self, op: Op, f: impl FnOnce(&mut State) -> Result<T, PlatformError>) -> Result<T, PlatformError> {
        let mut state = self.0.lock().unwrap();
        if state.failing == Some(op) {
            state.failing = None;
            return Err(PlatformError::new(PlatformErrorKind::Request));
        }
        f(&mut state)
    }

    fn edit(
        &self,
        op: Op,
        channel_id: ChannelId,
        f: impl FnOnce(&mut LiveChannel),
    ) -> BoxFuture<'_, Result<(), PlatformError>> {
        let res = self.run(op, |state| match state.channels.get_mut(&channel_id) {
            Some(channel) => {
                f(channel);
                Ok(())
            }
            None => Err(PlatformError::new(PlatformErrorKind::UnknownChannel)),
        });
        future::ready(res).boxed()
    }
}

impl ChannelProvisioner for RecordingChannels {
    fn create_voice_channel(&self, channel: NewChannel) -> BoxFuture<'_, Result<ChannelId, PlatformError>> {
        let res = self.run(Op::Create, |state| {
            state.next_id += 1;
            let id = ChannelId::new(100 + state.next_id);
            state.channels.insert(
                id,
                LiveChannel {
                    name: channel.name,
                    user_limit: channel.user_limit,
                    parent_id: channel.parent_id,
                },
            );
            state.created.push(id);
            Ok(id)
        });
        future::ready(res).boxed()
    }

    fn delete_channel(&self, channel_id: ChannelId) -> BoxFuture<'_, Result<(), PlatformError>> {
        let res = self.run(Op::Delete, |state| {
            if state.channels.remove(&channel_id).is_none() {
                return Err(PlatformError::new(PlatformErrorKind::UnknownChannel));
            }
            state.deleted.push(channel_id);
            Ok(())
        });
        future::ready(res).boxed()
    }

    fn set_name(&self, channel_id: ChannelId, name: String) -> BoxFuture<'_, Result<(), PlatformError>> {
        self.edit(Op::SetName, channel_id, |channel| channel.name = name)
    }

    fn set_user_limit(
        &self,
        channel_id: ChannelId,
        user_limit: u16,
    ) -> BoxFuture<'_, Result<(), PlatformError>> {
        self.edit(Op::SetLimit, channel_id, |channel| channel.user_limit = user_limit)
    }

    fn move_member(
        &self,
        _guild_id: GuildId,
        user_id: UserId,
        channel_id: Option<ChannelId>,
    ) -> BoxFuture<'_, Result<(), PlatformError>> {
        let res = self.run(Op::Move, |state| {
            state.moves.push((user_id, channel_id));
            Ok(())
        });
        future::ready(res).boxed()
    }

    fn notify_member(&self, user_id: UserId, content: String) -> BoxFuture<'_, Result<(), PlatformError>> {
        self.0.lock().unwrap().notices.push((user_id, content));
        future::ready(Ok(())).boxed()
    }
}

/// A bot wired to an in-memory authority and channel provisioner.
///
/// Guild 1 has a lobby 10 with a limit of 5 inside category 5.
pub struct Harness {
    pub bot: BotContext,
    pub authority: MemoryAuthority,
    pub channels: Arc<RecordingChannels>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_lobby(true, true, true)
    }

    pub fn with_lobby(can_rename: bool, can_lock: bool, can_adjust_limit: bool) -> Self {
        let authority = MemoryAuthority::new();
        authority.seed_guild(GUILD.get());
        authority.seed_lobby_with(
            GUILD.get(),
            LOBBY.get(),
            5,
            can_rename,
            can_lock,
            can_adjust_limit,
        );
        let channels = Arc::new(RecordingChannels::default());
        let cache = Cache::new();
        cache.cache_channel(CachedChannel {
            id: LOBBY,
            guild_id: GUILD,
            name: "Join to create".into(),
            kind: ChannelType::GuildVoice,
            parent_id: Some(CATEGORY),
            user_limit: None,
        });
        for (user_id, name) in [(NIA, "Nia"), (VIC, "Vic"), (WES, "Wes")] {
            cache.cache_display_name(GUILD, user_id, name.into());
        }

        let bot = BotContext::new(
            Arc::clone(&channels) as Arc<dyn ChannelProvisioner>,
            Arc::new(authority.clone()),
            cache,
            Duration::from_secs(15),
            Arc::new(BotStats::new()),
        );
        Self {
            bot,
            authority,
            channels,
        }
    }

    /// Move a member as the gateway would report it, then run the handler
    pub async fn move_to(&self, user_id: UserId, channel_id: Option<ChannelId>) -> Result<(), RoomError> {
        match self.bot.cache.record_voice_state(GUILD, user_id, channel_id) {
            Some(transition) => voice_rooms::handle_transition(&self.bot, transition).await,
            None => Ok(()),
        }
    }

    /// Join the lobby and follow the bot's move into the new room
    pub async fn open_room(&self, user_id: UserId) -> ChannelId {
        self.move_to(user_id, Some(LOBBY)).await.unwrap();
        let room = *self.channels.created().last().unwrap();
        self.move_to(user_id, Some(room)).await.unwrap();
        room
    }

    pub fn room(&self, channel_id: ChannelId) -> Option<Value> {
        self.authority.room(GUILD.get(), channel_id.get())
    }

    pub fn owner_of(&self, channel_id: ChannelId) -> Option<UserId> {
        self.room(channel_id)
            .and_then(|room| room["current_owner_id"].as_str()?.parse().ok())
            .map(UserId::new)
    }

    pub fn capacity_of(&self, channel_id: ChannelId) -> Option<u16> {
        self.channels.channel(channel_id).map(|c| c.user_limit)
    }
}
