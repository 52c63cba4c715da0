use std::fmt;

use serde::{Deserialize, Serialize};

/// Discord snowflake as sent by bot clients, either a JSON string or number
#[derive(Deserialize)]
#[serde(untagged)]
pub enum RawSnowflake {
    Number(u64),
    Text(String),
}

impl TryFrom<RawSnowflake> for u64 {
    type Error = String;

    fn try_from(raw: RawSnowflake) -> Result<Self, Self::Error> {
        match raw {
            RawSnowflake::Number(id) => Ok(id),
            RawSnowflake::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| format!("'{text}' is not a valid snowflake")),
        }
    }
}

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "RawSnowflake", into = "String")]
        pub struct $name(pub u64);

        impl TryFrom<RawSnowflake> for $name {
            type Error = String;

            fn try_from(raw: RawSnowflake) -> Result<Self, Self::Error> {
                u64::try_from(raw).map(Self)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// Discord guild (server) id
    GuildId
);

snowflake!(
    /// Discord voice channel id
    ChannelId
);
