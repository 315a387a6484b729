mod event_handler;
pub mod voice_rooms;

pub use event_handler::{route_event, EventHandler, Work};
