use backend::Authority;
use dashmap::DashSet;
use std::{ops::Deref, sync::Arc, time::Duration};
use tempvoice_cache::Cache;
use tempvoice_models::{id::ChannelId, stats::BotStats};
use tempvoice_resources::GuildResourceManager;

use crate::{cooldown::Cooldowns, platform::ChannelProvisioner};

pub struct BotContextRef {
    /// The channel side effects of every transition
    pub platform: Arc<dyn ChannelProvisioner>,
    /// What the gateway told us about channels and voice states
    pub cache: Cache,
    /// Entry point to every record kept by the remote authority
    pub guilds: GuildResourceManager,
    pub cooldowns: Cooldowns,
    /// Rooms whose teardown is in flight
    pub teardowns: DashSet<ChannelId>,
    /// Rooms opened by this process, the ones the active gauge counts
    pub opened: DashSet<ChannelId>,
    pub stats: Arc<BotStats>,
}

#[derive(Clone)]
pub struct BotContext(Arc<BotContextRef>);

impl BotContext {
    pub fn new(
        platform: Arc<dyn ChannelProvisioner>,
        authority: Arc<dyn Authority>,
        cache: Cache,
        creation_cooldown: Duration,
        stats: Arc<BotStats>,
    ) -> Self {
        Self(Arc::new(BotContextRef {
            platform,
            cache,
            guilds: GuildResourceManager::new(authority),
            cooldowns: Cooldowns::new(creation_cooldown),
            teardowns: DashSet::new(),
            opened: DashSet::new(),
            stats,
        }))
    }
}

impl Deref for BotContext {
    type Target = BotContextRef;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
