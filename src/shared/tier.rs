//! Account Tiers
//!
//! Entitlement levels form a closed, totally ordered set:
//! `Basic < Premium < Moderator`. Authorization compares tiers with the
//! derived `Ord`, never by string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::SharedError;

/// Number of active documents a Basic account may hold
pub const FREE_TIER_MAX_DOCUMENTS: i64 = 3;

/// Account entitlement level
///
/// Variant order is significant: it defines the comparison used by
/// `allows` and by every tier gate in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountTier {
    Basic,
    Premium,
    Moderator,
}

impl AccountTier {
    /// All tiers in ascending order
    pub const ALL: [AccountTier; 3] = [Self::Basic, Self::Premium, Self::Moderator];

    /// Storage and wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "BASIC",
            Self::Premium => "PREMIUM",
            Self::Moderator => "MODERATOR",
        }
    }

    /// Whether this tier satisfies `required`
    pub fn allows(&self, required: AccountTier) -> bool {
        *self >= required
    }

    /// Whether accounts on this tier are subject to the free-tier document cap
    pub fn is_capped(&self) -> bool {
        *self == Self::Basic
    }
}

impl Default for AccountTier {
    fn default() -> Self {
        Self::Basic
    }
}

impl fmt::Display for AccountTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountTier {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BASIC" => Ok(Self::Basic),
            "PREMIUM" => Ok(Self::Premium),
            "MODERATOR" => Ok(Self::Moderator),
            _ => Err(SharedError::unknown_variant("account tier", s)),
        }
    }
}
