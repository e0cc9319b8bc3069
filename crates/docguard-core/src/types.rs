//! Strong type definitions for docguard.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Opaque token naming the remote document the current page is displaying.
///
/// Captured once per page load and never mutated afterwards. The absence of
/// an identity is represented as `Option::None` by callers, never as an empty
/// token.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentIdentity(String);

impl DocumentIdentity {
    /// Create an identity from a raw token.
    ///
    /// Surrounding whitespace is stripped; a token that is empty afterwards
    /// is rejected.
    pub fn new(token: impl AsRef<str>) -> Result<Self> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoreError::EmptyIdentity);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Lenient constructor for candidate sources: empty means "not found".
    pub fn from_candidate(token: Option<impl AsRef<str>>) -> Option<Self> {
        token.and_then(|t| Self::new(t).ok())
    }

    /// Get the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DocumentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentIdentity({})", self.0)
    }
}

impl fmt::Display for DocumentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DocumentIdentity {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<DocumentIdentity> for String {
    fn from(id: DocumentIdentity) -> Self {
        id.0
    }
}
