//! Caller identity.

use serde::{Deserialize, Serialize};

use crate::constants::MAX_PRINCIPAL_LEN;
use crate::error::{EquipmentError, Result};

/// Identity of the party that performed a registration.
///
/// The registry treats this as opaque: it may be an on-chain address, a user
/// ID, or an account name depending on the host. It is always supplied by the
/// transport layer and never inferred by the registry itself.
///
/// Surrounding whitespace is trimmed; the result must be non-empty and at most
/// [`MAX_PRINCIPAL_LEN`] bytes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Creates a principal from a raw identity string.
    pub fn new(identity: impl AsRef<str>) -> Result<Self> {
        let trimmed = identity.as_ref().trim();

        if trimmed.is_empty() {
            return Err(EquipmentError::InvalidPrincipal(
                "identity cannot be empty".into(),
            ));
        }

        if trimmed.len() > MAX_PRINCIPAL_LEN {
            return Err(EquipmentError::InvalidPrincipal(format!(
                "identity is {} bytes, maximum {}",
                trimmed.len(),
                MAX_PRINCIPAL_LEN
            )));
        }

        if trimmed.chars().any(char::is_control) {
            return Err(EquipmentError::InvalidPrincipal(
                "identity contains control characters".into(),
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Principal {
    type Error = EquipmentError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.0
    }
}

impl std::str::FromStr for Principal {
    type Err = EquipmentError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Principal({})", self.0)
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
