pub mod channel;
pub mod voice;
