//! SHA-256 content digests for recompute-skip decisions.

use sha2::{Digest, Sha256};
use std::fmt;

/// A hex-encoded SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{hash:x}"))
    }

    pub fn builder() -> ContentHashBuilder {
        ContentHashBuilder {
            hasher: Sha256::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Feeds named fields in a stable order to produce a deterministic digest.
pub struct ContentHashBuilder {
    hasher: Sha256,
}

impl ContentHashBuilder {
    pub fn field(self, name: &str, value: &str) -> Self {
        self.field_bytes(name, value.as_bytes())
    }

    /// Length-prefixed so that adjacent fields cannot run together.
    pub fn field_bytes(mut self, name: &str, value: &[u8]) -> Self {
        self.hasher.update(name.as_bytes());
        self.hasher.update(b":");
        self.hasher.update(value.len().to_le_bytes());
        self.hasher.update(value);
        self.hasher.update(b"\n");
        self
    }

    pub fn build(self) -> ContentHash {
        ContentHash(format!("{:x}", self.hasher.finalize()))
    }
}
