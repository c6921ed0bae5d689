//! Key types: symmetric keys and X25519 key pair generation

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::KEY_SIZE;

/// A 256-bit symmetric encryption key.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a long-term X25519 key pair for file encryption.
///
/// The secret half must only ever be persisted through
/// [`crate::vault::encrypt_private_key`].
pub fn generate_encryption_keypair() -> (StaticSecret, PublicKey) {
    let secret = StaticSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);
    (secret, public)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keypairs_differ() {
        let (_, pub1) = generate_encryption_keypair();
        let (_, pub2) = generate_encryption_keypair();
        assert_ne!(pub1.as_bytes(), pub2.as_bytes(), "random keys must differ");
    }

    #[test]
    fn symmetric_key_debug_is_redacted() {
        let key = SymmetricKey::from_bytes([7u8; KEY_SIZE]);
        let rendered = format!("{key:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains('7'));
    }
}
