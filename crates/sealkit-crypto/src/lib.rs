//! sealkit-crypto: chunked authenticated file encryption
//!
//! Pipeline: plaintext → fixed-size chunks → XChaCha20-Poly1305 per chunk
//! (counter-derived nonces, header-bound AAD) → `<input>.sealed`
//!
//! Key establishment, one of four:
//! ```text
//! Password   Argon2id(password, salt, params-from-header)
//! Mutual     HKDF(DH(sender, recipient) ‖ DH(ephemeral, recipient), salt)
//! Anonymous  HKDF(DH(ephemeral, recipient), salt)
//! Self       HKDF(DH(ephemeral, own public), salt)
//! ```
//! Every mode writes the same 90-byte header: in password mode the
//! ephemeral-key slot is filled with a throwaway public key, so the file
//! format does not reveal which mode produced it.
//!
//! The private-key vault stores a 32-byte secret under a password-derived
//! key with a key-commitment block, closing the multi-key ciphertext
//! confusion hole.

pub mod batch;
pub mod chunk;
pub mod exchange;
pub mod file;
pub mod header;
pub mod kdf;
pub mod keys;
pub mod stream;
pub mod vault;

pub use batch::{decrypt_files, encrypt_files};
pub use exchange::EstablishedKey;
pub use file::{decrypt_file, encrypt_file, DecryptKey, EncryptKey};
pub use header::{FileHeader, HEADER_SIZE};
pub use kdf::{derive_exchange_key, derive_password_key, KdfParams};
pub use keys::{generate_encryption_keypair, SymmetricKey};
pub use vault::{decrypt_private_key, encrypt_private_key};

/// Size of a symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of a KDF salt
pub const SALT_SIZE: usize = 16;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Plaintext bytes per chunk (256 KiB). Pinned at format version 1.
pub const CHUNK_SIZE: usize = 256 * 1024;

/// Extension appended to encrypted output files
pub const ENCRYPTED_EXTENSION: &str = "sealed";
