use serde::{Deserialize, Serialize};

use crate::id::{ChannelId, GuildId};

/// Placeholder inside [`GuildRecord::room_name_template`] replaced by the creator's name
pub const USER_PLACEHOLDER: &str = "{user}";
/// Discord refuses channel names longer than this
pub const MAX_CHANNEL_NAME_LENGTH: usize = 100;

fn default_room_name_template() -> String {
    format!("{}'s room", USER_PLACEHOLDER)
}

/// The authority's document for a guild served by the bot
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GuildRecord {
    /// The id of the guild
    pub id: GuildId,
    /// The name given to freshly created rooms
    #[serde(default = "default_room_name_template")]
    pub room_name_template: String,
    /// The channels configured as lobbies. Maintained by the authority
    #[serde(default)]
    pub voice_lobbies: Vec<ChannelId>,
}

impl GuildRecord {
    pub fn is_lobby(&self, channel_id: ChannelId) -> bool {
        self.voice_lobbies.contains(&channel_id)
    }

    /// Render the name of a new room for a member
    pub fn room_name(&self, display_name: &str) -> String {
        let name = self.room_name_template.replace(USER_PLACEHOLDER, display_name);
        let name = name.trim();
        if name.is_empty() {
            return "Voice Room".into();
        }
        name.chars().take(MAX_CHANNEL_NAME_LENGTH).collect()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NewGuild {
    pub id: GuildId,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct GuildPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_name_template: Option<String>,
}
