//! SHA-256 fingerprints over ordered components.

use sha2::{Digest, Sha256};

/// Hex SHA-256 of `data`.
pub fn sha256_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Accumulates components into one digest.
///
/// Each component is NUL-terminated, so `["ab"]` and `["a", "b"]` differ.
#[derive(Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_str(&mut self, component: &str) -> &mut Self {
        self.hasher.update(component.as_bytes());
        self.hasher.update([0u8]);
        self
    }

    /// Add a path together with the digest of its contents.
    pub fn update_content(&mut self, label: &str, contents: &[u8]) -> &mut Self {
        self.update_str(label).update_str(&sha256_bytes(contents))
    }

    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}
