#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_panics_doc
)]

pub mod error;
mod guild;
mod lobby;
mod manager;
mod member;
mod room;

pub use error::ResourceError;
pub use guild::{Guild, GuildResourceManager};
pub use lobby::VoiceRoomLobbyResourceManager;
pub use manager::{Resource, ResourceManager};
pub use member::GuildMemberResourceManager;
pub use room::ActiveVoiceRoomResourceManager;
