use dashmap::DashMap;
use std::time::{Duration, Instant};
use tempvoice_models::id::{GuildId, UserId};

/// Per member window during which no further room may be created.
///
/// Held in process memory only, so a restart forgets every window.
pub struct Cooldowns {
    window: Duration,
    expirations: DashMap<(GuildId, UserId), Instant>,
}

impl Cooldowns {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            expirations: DashMap::new(),
        }
    }

    /// The time left on the member's window, if one is running
    pub fn remaining(&self, guild_id: GuildId, user_id: UserId) -> Option<Duration> {
        let key = (guild_id, user_id);
        let remaining = self
            .expirations
            .get(&key)
            .and_then(|expiration| expiration.checked_duration_since(Instant::now()))
            .filter(|remaining| !remaining.is_zero());
        if remaining.is_none() {
            self.expirations.remove(&key);
        }
        remaining
    }

    pub fn mark(&self, guild_id: GuildId, user_id: UserId) {
        self.expirations
            .insert((guild_id, user_id), Instant::now() + self.window);
    }

    /// Forget every window which already ran out
    pub fn purge(&self) {
        let now = Instant::now();
        self.expirations.retain(|_, expiration| *expiration > now);
    }

    pub fn is_empty(&self) -> bool {
        self.expirations.is_empty()
    }
}
