//! License status as reported by the remote licensing authority.
//!
//! These values mirror remote truth; nothing here is computed locally.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state reported by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseState {
    /// Provisioned but never activated.
    New,
    /// Activated and current.
    Active,
    /// Past its term.
    Expired,
    /// No license has been generated for the handle.
    NotGenerated,
}

impl LicenseState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::NotGenerated => "not_generated",
        }
    }
}

impl fmt::Display for LicenseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "not_generated" => Ok(Self::NotGenerated),
            other => Err(Error::UnknownStatus(other.to_string())),
        }
    }
}

/// A status answer. The authority replies with either a validity flag or a
/// lifecycle state, depending on the endpoint revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LicenseStatus {
    Validity { valid: bool },
    State { status: LicenseState },
}

impl LicenseStatus {
    /// True only for an explicit `valid: true` or an `active` state.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Validity { valid } => *valid,
            Self::State { status } => *status == LicenseState::Active,
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validity { valid: true } => f.write_str("valid"),
            Self::Validity { valid: false } => f.write_str("invalid"),
            Self::State { status } => write!(f, "{status}"),
        }
    }
}
