use std::fmt::{Display, Formatter, Result as FmtResult};

/// The resource paths exposed by the remote authority
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Route {
    Guilds,
    Guild { guild_id: u64 },
    VoiceLobbies { guild_id: u64 },
    VoiceLobby { guild_id: u64, channel_id: u64 },
    VoiceRooms { guild_id: u64 },
    VoiceRoom { guild_id: u64, channel_id: u64 },
    Members { guild_id: u64 },
    Member { guild_id: u64, member_id: u64 },
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Route::Guilds => f.write_str("/guilds"),
            Route::Guild { guild_id } => write!(f, "/guilds/{}", guild_id),
            Route::VoiceLobbies { guild_id } => write!(f, "/guilds/{}/voice-lobbies", guild_id),
            Route::VoiceLobby {
                guild_id,
                channel_id,
            } => write!(f, "/guilds/{}/voice-lobbies/{}", guild_id, channel_id),
            Route::VoiceRooms { guild_id } => write!(f, "/guilds/{}/voice-rooms", guild_id),
            Route::VoiceRoom {
                guild_id,
                channel_id,
            } => write!(f, "/guilds/{}/voice-rooms/{}", guild_id, channel_id),
            Route::Members { guild_id } => write!(f, "/guilds/{}/members", guild_id),
            Route::Member {
                guild_id,
                member_id,
            } => write!(f, "/guilds/{}/members/{}", guild_id, member_id),
        }
    }
}
