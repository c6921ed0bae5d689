//! X25519 key establishment for the three public-key encryption modes
//!
//! Every construction feeds [`derive_exchange_key`] with its own domain
//! string and returns the 32-byte value stored in the header's key slot:
//!
//! ```text
//! Mutual     ikm = DH(sender, recipient) ‖ DH(ephemeral, recipient)
//! Anonymous  ikm = DH(ephemeral, recipient)
//! Self       ikm = DH(ephemeral, own public)
//! ```
//!
//! A fresh ephemeral pair is generated per file, so the mutual mode gets
//! forward secrecy per file and the anonymous/self modes never reuse a
//! nonce-key pairing across files. Shared secrets live only long enough to
//! be hashed; `x25519_dalek::SharedSecret` zeroizes itself on drop.

use rand::rngs::OsRng;
use x25519_dalek::{EphemeralSecret, PublicKey, SharedSecret, StaticSecret};

use sealkit_core::{SealError, SealResult};

use crate::kdf::derive_exchange_key;
use crate::keys::SymmetricKey;
use crate::{KEY_SIZE, SALT_SIZE};

pub const DOMAIN_MUTUAL: &[u8] = b"sealkit.exchange.mutual.v1";
pub const DOMAIN_ANONYMOUS: &[u8] = b"sealkit.exchange.anonymous.v1";
pub const DOMAIN_SELF: &[u8] = b"sealkit.exchange.self.v1";

/// Result of encryption-side key establishment: the derived file key plus
/// the ephemeral public key that goes into the header's key slot.
pub struct EstablishedKey {
    pub key_slot: [u8; KEY_SIZE],
    pub key: SymmetricKey,
}

/// Reject the all-zero output of a small-order or identity peer point.
fn contributory(shared: SharedSecret, err: SealError) -> SealResult<SharedSecret> {
    if shared.was_contributory() {
        Ok(shared)
    } else {
        Err(err)
    }
}

fn weak_input() -> SealError {
    SealError::Validation("key exchange rejected a low-order public key".into())
}

/// Mutual mode, encryption side: binds the sender's long-term identity and a
/// fresh ephemeral contribution.
pub fn establish_mutual_encrypt(
    sender_secret: &StaticSecret,
    recipient_public: &PublicKey,
    salt: &[u8; SALT_SIZE],
) -> SealResult<EstablishedKey> {
    let long_term = contributory(sender_secret.diffie_hellman(recipient_public), weak_input())?;

    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = PublicKey::from(&ephemeral);
    let fresh = contributory(ephemeral.diffie_hellman(recipient_public), weak_input())?;

    let key = derive_exchange_key(
        &[long_term.as_bytes(), fresh.as_bytes()],
        salt,
        DOMAIN_MUTUAL,
    )?;
    Ok(EstablishedKey {
        key_slot: *ephemeral_public.as_bytes(),
        key,
    })
}

/// Mutual mode, decryption side. `key_slot` is the ephemeral public key
/// recovered from the file header.
pub fn establish_mutual_decrypt(
    recipient_secret: &StaticSecret,
    sender_public: &PublicKey,
    key_slot: &[u8; KEY_SIZE],
    salt: &[u8; SALT_SIZE],
) -> SealResult<SymmetricKey> {
    let long_term = contributory(
        recipient_secret.diffie_hellman(sender_public),
        SealError::FileCrypto,
    )?;
    let ephemeral_public = PublicKey::from(*key_slot);
    let fresh = contributory(
        recipient_secret.diffie_hellman(&ephemeral_public),
        SealError::FileCrypto,
    )?;

    derive_exchange_key(
        &[long_term.as_bytes(), fresh.as_bytes()],
        salt,
        DOMAIN_MUTUAL,
    )
}

/// Anonymous mode, encryption side: a throwaway key pair is the only sender
/// contribution, so the sender's identity is not authenticated.
pub fn establish_anonymous_encrypt(
    recipient_public: &PublicKey,
    salt: &[u8; SALT_SIZE],
) -> SealResult<EstablishedKey> {
    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = PublicKey::from(&ephemeral);
    let shared = contributory(ephemeral.diffie_hellman(recipient_public), weak_input())?;

    let key = derive_exchange_key(&[shared.as_bytes()], salt, DOMAIN_ANONYMOUS)?;
    Ok(EstablishedKey {
        key_slot: *ephemeral_public.as_bytes(),
        key,
    })
}

/// Anonymous mode, decryption side.
pub fn establish_anonymous_decrypt(
    recipient_secret: &StaticSecret,
    key_slot: &[u8; KEY_SIZE],
    salt: &[u8; SALT_SIZE],
) -> SealResult<SymmetricKey> {
    let ephemeral_public = PublicKey::from(*key_slot);
    let shared = contributory(
        recipient_secret.diffie_hellman(&ephemeral_public),
        SealError::FileCrypto,
    )?;

    derive_exchange_key(&[shared.as_bytes()], salt, DOMAIN_ANONYMOUS)
}

/// Self-only mode, encryption side: the ephemeral key is exchanged against
/// the caller's own public key, binding the file to the caller's long-term
/// pair without naming any recipient.
pub fn establish_self_encrypt(
    own_secret: &StaticSecret,
    salt: &[u8; SALT_SIZE],
) -> SealResult<EstablishedKey> {
    let own_public = PublicKey::from(own_secret);

    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = PublicKey::from(&ephemeral);
    let shared = contributory(ephemeral.diffie_hellman(&own_public), weak_input())?;

    let key = derive_exchange_key(&[shared.as_bytes()], salt, DOMAIN_SELF)?;
    Ok(EstablishedKey {
        key_slot: *ephemeral_public.as_bytes(),
        key,
    })
}

/// Self-only mode, decryption side.
pub fn establish_self_decrypt(
    own_secret: &StaticSecret,
    key_slot: &[u8; KEY_SIZE],
    salt: &[u8; SALT_SIZE],
) -> SealResult<SymmetricKey> {
    let ephemeral_public = PublicKey::from(*key_slot);
    let shared = contributory(
        own_secret.diffie_hellman(&ephemeral_public),
        SealError::FileCrypto,
    )?;

    derive_exchange_key(&[shared.as_bytes()], salt, DOMAIN_SELF)
}
