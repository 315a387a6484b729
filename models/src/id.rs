use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use twilight_model::id::{
    marker::{ChannelMarker, GuildMarker, UserMarker},
    Id,
};

macro_rules! discord_id {
    ($name:ident, $marker:ty) => {
        #[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub Id<$marker>);

        impl $name {
            /// Panics if `n` is zero, which Discord never hands out.
            pub const fn new(n: u64) -> Self {
                Self(Id::new(n))
            }

            pub const fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                Display::fmt(&self.0, f)
            }
        }

        impl From<Id<$marker>> for $name {
            fn from(id: Id<$marker>) -> Self {
                Self(id)
            }
        }
    };
}

discord_id!(GuildId, GuildMarker);
discord_id!(ChannelId, ChannelMarker);
discord_id!(UserId, UserMarker);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_travel_as_strings() {
        let id = ChannelId::new(811_430_029_512_130_590);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"811430029512130590\"");
        let back: ChannelId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
