#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod guild;
pub mod id;
pub mod member;
pub mod room;
pub mod stats;

pub use twilight_model as discord;
