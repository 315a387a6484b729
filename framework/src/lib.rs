#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::similar_names
)]

pub mod configuration;
pub mod context;
pub mod cooldown;
pub mod error;
pub mod extensions;
pub mod platform;
pub mod respond;

pub mod prelude {
    pub use crate::{
        context::BotContext,
        error::{PlatformError, Rejection, RoomError, Stage},
        extensions::{Color, EmbedExtensions},
        platform::{ChannelProvisioner, NewChannel},
        respond::Responder,
    };
    pub use tempvoice_models::id::{ChannelId, GuildId, UserId};
    pub use tempvoice_resources::{Guild, ResourceError};
}
