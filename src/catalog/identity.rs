//! Account identity
//!
//! An [`Identity`] is the numeric account id whose catalog is collected. It can
//! be given directly or extracted from a profile URL.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

/// Profile URL shapes, tried in order
static PROFILE_URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"space\.bilibili\.com/(\d+)",
        r"uid=(\d+)",
        r"/(\d+)/?$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Numeric account identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Parse a bare numeric identity
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(Error::invalid_identity(input))
        }
    }

    /// Extract the identity from a profile URL
    ///
    /// Returns `None` when no known URL shape matches.
    pub fn from_profile_url(url: &str) -> Option<Self> {
        let url = url.trim();
        PROFILE_URL_PATTERNS
            .iter()
            .find_map(|pattern| pattern.captures(url))
            .and_then(|captures| captures.get(1))
            .map(|m| Self(m.as_str().to_string()))
    }

    /// Accept either a bare identity or a profile URL
    pub fn resolve(input: &str) -> Result<Self> {
        Self::parse(input).or_else(|_| {
            Self::from_profile_url(input).ok_or_else(|| Error::invalid_identity(input))
        })
    }

    /// The identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::resolve(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}
