//! Account keys scoping every storage path.
//!
//! An [`AccountKey`] is the only thing that selects a directory under the
//! storage root, so its normalization decides which inputs share credentials.

use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;
use crate::jid;

/// A normalized account identifier (phone number or group id).
///
/// Normalization trims whitespace, drops a leading `+` and any `@server`
/// suffix. Keys that would escape or alias a directory are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountKey(String);

impl AccountKey {
    pub fn new(raw: &str) -> Result<Self, StoreError> {
        let trimmed = raw.trim();
        let user = match trimmed.split_once('@') {
            Some((user, _server)) => user,
            None => trimmed,
        };
        let user = user.strip_prefix('+').unwrap_or(user).trim();

        if !is_plain_component(user) {
            return Err(StoreError::InvalidAccountKey(raw.to_string()));
        }
        Ok(Self(user.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full JID for this account.
    pub fn jid(&self) -> String {
        jid::normalize(&self.0)
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for AccountKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// True for a single path component that cannot escape or alias its parent.
pub(crate) fn is_plain_component(s: &str) -> bool {
    !(s.is_empty() || s == "." || s == "..")
        && !s.chars().any(|c| matches!(c, '/' | '\\' | ':' | '\0'))
}
