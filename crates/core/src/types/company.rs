//! Buying-organization identity and the backend account handle derived from it.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CompanyId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CompanyIdError {
    /// The input string is empty (or whitespace only).
    #[error("company identity cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("company identity must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains control characters.
    #[error("company identity cannot contain control characters")]
    ControlCharacter,
}

/// The buying organization's identity as asserted in the cXML `Header/From`
/// credential.
///
/// This is the key the bridge uses to find or provision a backend customer.
///
/// ## Constraints
///
/// - Surrounding whitespace is trimmed
/// - Length: 1-256 characters after trimming
/// - No control characters
///
/// ## Examples
///
/// ```
/// use punchout_bridge_core::CompanyId;
///
/// assert!(CompanyId::parse("AcmeCorp").is_ok());
/// assert_eq!(CompanyId::parse("  AcmeCorp \n").unwrap().as_str(), "AcmeCorp");
///
/// assert!(CompanyId::parse("").is_err());
/// assert!(CompanyId::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct CompanyId(String);

impl CompanyId {
    /// Maximum length of a company identity.
    pub const MAX_LENGTH: usize = 256;

    /// Parse a `CompanyId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`], or contains control characters.
    pub fn parse(s: &str) -> Result<Self, CompanyIdError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(CompanyIdError::Empty);
        }

        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(CompanyIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if trimmed.chars().any(char::is_control) {
            return Err(CompanyIdError::ControlCharacter);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a constant that already satisfies the constraints above.
    pub(crate) fn from_static(value: &'static str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CompanyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CompanyId {
    type Error = CompanyIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CompanyId> for String {
    fn from(id: CompanyId) -> Self {
        id.0
    }
}

impl core::str::FromStr for CompanyId {
    type Err = CompanyIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Synthetic login handle for the backend customer that represents a
/// buying organization.
///
/// The handle is a pure function of the [`CompanyId`], so the same
/// organization always maps to the same backend account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AccountHandle(String);

impl AccountHandle {
    /// Prefix of every synthetic handle.
    pub const PREFIX: &'static str = "punchout_";

    /// Domain of every synthetic handle.
    pub const DOMAIN: &'static str = "punchout.local";

    /// Derive the handle for a company.
    ///
    /// ```
    /// use punchout_bridge_core::{AccountHandle, CompanyId};
    ///
    /// let company = CompanyId::parse("AcmeCorp").unwrap();
    /// assert_eq!(
    ///     AccountHandle::for_company(&company).as_str(),
    ///     "punchout_AcmeCorp@punchout.local"
    /// );
    /// ```
    #[must_use]
    pub fn for_company(company: &CompanyId) -> Self {
        Self(format!("{}{}@{}", Self::PREFIX, company.as_str(), Self::DOMAIN))
    }

    /// Returns the handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let id = CompanyId::parse("  AcmeCorp\t").unwrap();
        assert_eq!(id.as_str(), "AcmeCorp");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(CompanyId::parse(""), Err(CompanyIdError::Empty));
        assert_eq!(CompanyId::parse(" \n "), Err(CompanyIdError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "a".repeat(CompanyId::MAX_LENGTH + 1);
        assert!(matches!(
            CompanyId::parse(&long),
            Err(CompanyIdError::TooLong { .. })
        ));
        assert!(CompanyId::parse(&"a".repeat(CompanyId::MAX_LENGTH)).is_ok());
    }

    #[test]
    fn test_parse_control_character() {
        assert_eq!(
            CompanyId::parse("Acme\u{0}Corp"),
            Err(CompanyIdError::ControlCharacter)
        );
    }

    #[test]
    fn test_handle_is_deterministic() {
        let a = AccountHandle::for_company(&CompanyId::parse("Globex").unwrap());
        let b = AccountHandle::for_company(&CompanyId::parse(" Globex ").unwrap());
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "punchout_Globex@punchout.local");
    }

    #[test]
    fn test_serde_rejects_empty() {
        let parsed: Result<CompanyId, _> = serde_json::from_str("\"\"");
        assert!(parsed.is_err());

        let parsed: CompanyId = serde_json::from_str("\"Initech\"").unwrap();
        assert_eq!(parsed.as_str(), "Initech");
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"Initech\"");
    }
}
