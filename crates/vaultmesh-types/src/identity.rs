//! Time-ordered identifiers.
//!
//! Every entity ID in the system is a 26-character Crockford-Base32
//! time-ordered string (`^[0-9A-HJKMNP-TV-Z]{26}$`). ULID's native text
//! encoding already satisfies that regex, so each ID newtype just wraps a
//! [`ulid::Ulid`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Ulid);

        impl $name {
            /// Generate a new, time-ordered ID.
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            pub fn as_ulid(&self) -> Ulid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Ulid::from_string(s)?))
            }
        }

        impl From<Ulid> for $name {
            fn from(u: Ulid) -> Self {
                Self(u)
            }
        }
    };
}

define_id_type!(VaultId);
define_id_type!(PowChallengeId);
define_id_type!(EngagementKeyId);
define_id_type!(ChannelId);
define_id_type!(InboxMessageId);
define_id_type!(SecretUpdateId);

/// A session token is an opaque 32+ random byte value, hex-encoded.
/// It is not time-ordered and deliberately not a ULID-backed type — it
/// must not leak issuance order to a holder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Matches `^[0-9A-HJKMNP-TV-Z]{26}$`.
pub fn is_valid_entity_id(s: &str) -> bool {
    Ulid::from_string(s).is_ok()
}
