use futures_util::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tempvoice_models::{
    discord::channel::ChannelType,
    id::{ChannelId, GuildId, UserId},
};
use twilight_http::Client as Http;

use crate::error::PlatformError;

/// A voice channel to be created
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewChannel {
    pub guild_id: GuildId,
    pub name: String,
    pub parent_id: Option<ChannelId>,
    pub user_limit: u16,
}

/// The channel side effects of the room lifecycle
pub trait ChannelProvisioner: Send + Sync {
    fn create_voice_channel(&self, channel: NewChannel) -> BoxFuture<'_, Result<ChannelId, PlatformError>>;

    fn delete_channel(&self, channel_id: ChannelId) -> BoxFuture<'_, Result<(), PlatformError>>;

    fn set_name(&self, channel_id: ChannelId, name: String) -> BoxFuture<'_, Result<(), PlatformError>>;

    fn set_user_limit(
        &self,
        channel_id: ChannelId,
        user_limit: u16,
    ) -> BoxFuture<'_, Result<(), PlatformError>>;

    /// Move a member to a voice channel. `None` disconnects them
    fn move_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        channel_id: Option<ChannelId>,
    ) -> BoxFuture<'_, Result<(), PlatformError>>;

    /// Send a member a direct message
    fn notify_member(&self, user_id: UserId, content: String) -> BoxFuture<'_, Result<(), PlatformError>>;
}

/// [`ChannelProvisioner`] backed by the discord http api
#[derive(Clone)]
pub struct DiscordChannels {
    http: Arc<Http>,
}

impl DiscordChannels {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

impl ChannelProvisioner for DiscordChannels {
    fn create_voice_channel(&self, channel: NewChannel) -> BoxFuture<'_, Result<ChannelId, PlatformError>> {
        async move {
            let mut request = self
                .http
                .create_guild_channel(channel.guild_id.0, &channel.name)?
                .kind(ChannelType::GuildVoice)
                .user_limit(channel.user_limit);
            if let Some(parent_id) = channel.parent_id {
                request = request.parent_id(parent_id.0);
            }
            let created = request.await?.model().await?;
            tracing::debug!(guild = %channel.guild_id, channel = %created.id, "Created voice channel");
            Ok(ChannelId(created.id))
        }
        .boxed()
    }

    fn delete_channel(&self, channel_id: ChannelId) -> BoxFuture<'_, Result<(), PlatformError>> {
        async move {
            self.http.delete_channel(channel_id.0).await?;
            Ok(())
        }
        .boxed()
    }

    fn set_name(&self, channel_id: ChannelId, name: String) -> BoxFuture<'_, Result<(), PlatformError>> {
        async move {
            self.http.update_channel(channel_id.0).name(&name)?.await?;
            Ok(())
        }
        .boxed()
    }

    fn set_user_limit(
        &self,
        channel_id: ChannelId,
        user_limit: u16,
    ) -> BoxFuture<'_, Result<(), PlatformError>> {
        async move {
            self.http
                .update_channel(channel_id.0)
                .user_limit(user_limit)?
                .await?;
            Ok(())
        }
        .boxed()
    }

    fn move_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        channel_id: Option<ChannelId>,
    ) -> BoxFuture<'_, Result<(), PlatformError>> {
        async move {
            self.http
                .update_guild_member(guild_id.0, user_id.0)
                .channel_id(channel_id.map(|c| c.0))
                .await?;
            Ok(())
        }
        .boxed()
    }

    fn notify_member(&self, user_id: UserId, content: String) -> BoxFuture<'_, Result<(), PlatformError>> {
        async move {
            let channel = self.http.create_private_channel(user_id.0).await?.model().await?;
            self.http.create_message(channel.id).content(&content)?.await?;
            Ok(())
        }
        .boxed()
    }
}
