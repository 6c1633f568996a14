//! Renaming suffix and the random token source

use std::fmt;
use std::str::FromStr;

/// Random bytes per generated token (two hex characters each)
pub const TOKEN_BYTES: usize = 4;

/// Suffix appended to every renamed identifier, as `<name>-<suffix>`
///
/// Either drawn from [`Suffix::random`] or supplied by the caller. The
/// infallible [`Suffix::new`] accepts any string; [`Suffix::from_str`] is the
/// checked constructor for untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Suffix(String);

impl Suffix {
    /// Wrap a caller-chosen suffix without checking it
    #[inline]
    #[must_use]
    pub fn new(suffix: impl Into<String>) -> Self {
        Self(suffix.into())
    }

    /// Fresh random token: 8 lowercase hex characters
    ///
    /// Draws from the thread-local CSPRNG; holds no shared state.
    #[must_use]
    pub fn random() -> Self {
        let bytes: [u8; TOKEN_BYTES] = rand::random();
        Self(hex::encode(bytes))
    }

    /// Suffix text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renamed form of `name`
    #[inline]
    #[must_use]
    pub fn apply(&self, name: &str) -> String {
        format!("{name}-{}", self.0)
    }
}

/// Generate a new random suffix
#[inline]
#[must_use]
pub fn new_token() -> Suffix {
    Suffix::random()
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Suffix {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Suffix {
    type Err = SuffixError;

    /// Accepts `[A-Za-z0-9_.-]+`
    ///
    /// `:` and `/` are rejected since they would split short-form mount
    /// strings differently after renaming.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(SuffixError::Empty);
        }
        if let Some(ch) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
        {
            return Err(SuffixError::InvalidCharacter {
                suffix: s.to_string(),
                ch,
            });
        }
        Ok(Self(s.to_string()))
    }
}

/// Rejected caller-supplied suffix
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuffixError {
    /// Empty suffix
    #[error("suffix must not be empty")]
    Empty,

    /// Character outside `[A-Za-z0-9_.-]`
    #[error("invalid character {ch:?} in suffix '{suffix}'")]
    InvalidCharacter {
        /// Offending suffix
        suffix: String,
        /// First invalid character
        ch: char,
    },
}
