use std::fmt;

use thiserror::Error;

/// Which half of the key was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPart {
    Source,
    Target,
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Source => f.write_str("source"),
            KeyPart::Target => f.write_str("target"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidKeyError {
    #[error("{0} identifier is empty")]
    Empty(KeyPart),
}

/// The (source, target) identifier pair scoping one streaming session.
///
/// Both halves are opaque to this crate; construction only rejects blank values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    source: String,
    target: String,
}

impl SessionKey {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<Self, InvalidKeyError> {
        let source = source.into();
        let target = target.into();
        if source.trim().is_empty() {
            return Err(InvalidKeyError::Empty(KeyPart::Source));
        }
        if target.trim().is_empty() {
            return Err(InvalidKeyError::Empty(KeyPart::Target));
        }
        Ok(Self { source, target })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}
