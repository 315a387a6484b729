use twilight_util::builder::embed::{EmbedBuilder, EmbedFooterBuilder};

#[repr(u32)]
pub enum Color {
    Red = 0x00E7_4C3C,
    Green = 0x002E_CC71,
    Blue = 0x0034_98DB,
}

pub trait EmbedExtensions {
    fn default_data(self) -> Self;
}

impl EmbedExtensions for EmbedBuilder {
    fn default_data(self) -> Self {
        self.color(Color::Blue as u32)
            .footer(EmbedFooterBuilder::new("Voice Rooms"))
    }
}
