//! Shared domain enums and value types used across every crate in the core.

use serde::{Deserialize, Serialize};

/// The two PoW algorithms a challenge may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowAlgorithm {
    Pow564b,
    Pow5217a,
}

impl PowAlgorithm {
    pub fn wire_name(self) -> &'static str {
        match self {
            PowAlgorithm::Pow564b => "pow5-64b",
            PowAlgorithm::Pow5217a => "pow5-217a",
        }
    }

    pub fn header_len(self) -> usize {
        match self {
            PowAlgorithm::Pow564b => 64,
            PowAlgorithm::Pow5217a => 217,
        }
    }

    /// Byte range that is the caller's free nonce region (excluded from the
    /// `solvedHeader == header` comparison).
    pub fn nonce_region(self) -> std::ops::Range<usize> {
        match self {
            PowAlgorithm::Pow564b => 0..28,
            PowAlgorithm::Pow5217a => 117..145,
        }
    }

    /// Byte range the solver searches over.
    pub fn counter_region(self) -> std::ops::Range<usize> {
        match self {
            PowAlgorithm::Pow564b => 28..32,
            PowAlgorithm::Pow5217a => 145..149,
        }
    }
}

impl std::str::FromStr for PowAlgorithm {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pow5-64b" => Ok(PowAlgorithm::Pow564b),
            "pow5-217a" => Ok(PowAlgorithm::Pow5217a),
            _ => Err(()),
        }
    }
}

/// Why a PoW challenge was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowPurpose {
    Registration,
    Messaging,
    Generic,
}

/// Purpose tag on an engagement key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementKeyPurpose {
    Send,
    Receive,
    Manual,
}

/// Channel status state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Pending,
    Saved,
    Ignored,
}

impl ChannelStatus {
    /// All named transitions are allowed; the only thing that is never
    /// allowed is staying in a status that was never reachable
    /// (there is no such state here), so this exists to make the allowed
    /// set explicit and testable rather than to reject anything.
    pub fn transition_allowed(_from: ChannelStatus, _to: ChannelStatus) -> bool {
        true
    }
}

/// A `name@domain` address, parsed and validated against the vault name
/// regex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub domain: String,
}

impl Address {
    pub fn parse(s: &str) -> Option<Self> {
        let (name, domain) = s.split_once('@')?;
        if name.is_empty() || domain.is_empty() {
            return None;
        }
        Some(Address {
            name: name.to_string(),
            domain: domain.to_string(),
        })
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.domain)
    }
}

/// `^[a-z][a-z0-9]{0,29}$`
pub fn is_valid_vault_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    if name.len() > 30 {
        return false;
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_name_validation() {
        assert!(is_valid_vault_name("alice"));
        assert!(is_valid_vault_name("a"));
        assert!(is_valid_vault_name("a1b2c3"));
        assert!(!is_valid_vault_name("Alice"));
        assert!(!is_valid_vault_name("1alice"));
        assert!(!is_valid_vault_name(""));
        assert!(!is_valid_vault_name(&"a".repeat(31)));
    }

    #[test]
    fn address_parse_round_trip() {
        let addr = Address::parse("alice@keypears.com").unwrap();
        assert_eq!(addr.name, "alice");
        assert_eq!(addr.domain, "keypears.com");
        assert_eq!(addr.to_string(), "alice@keypears.com");
    }

    #[test]
    fn address_parse_rejects_missing_at() {
        assert!(Address::parse("alice").is_none());
    }

    #[test]
    fn pow_algorithm_header_lengths() {
        assert_eq!(PowAlgorithm::Pow564b.header_len(), 64);
        assert_eq!(PowAlgorithm::Pow5217a.header_len(), 217);
    }
}
