//! Profile display name type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`DisplayName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DisplayNameError {
    /// The input is empty after trimming.
    #[error("display name cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("display name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length in characters.
        max: usize,
    },
    /// The input contains control characters.
    #[error("display name cannot contain control characters")]
    ControlCharacter,
}

/// The public name shown for an account.
///
/// ## Constraints
///
/// - Surrounding whitespace is trimmed
/// - 1-64 characters after trimming
/// - No control characters
///
/// ## Examples
///
/// ```
/// use ecofinds_core::DisplayName;
///
/// assert_eq!(DisplayName::parse("  ada ").unwrap().as_str(), "ada");
/// assert!(DisplayName::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Maximum length in characters.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `DisplayName` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, too long, or contains
    /// control characters.
    pub fn parse(s: &str) -> Result<Self, DisplayNameError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DisplayNameError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(DisplayNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if trimmed.chars().any(char::is_control) {
            return Err(DisplayNameError::ControlCharacter);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `DisplayName` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DisplayName {
    type Error = DisplayNameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<DisplayName> for String {
    fn from(name: DisplayName) -> Self {
        name.0
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
