//! Per-file encryption and decryption
//!
//! Builds the header, establishes the file key for the selected mode, and
//! runs the chunk stream. Inputs are opened read-only (shared read);
//! outputs are created fresh and removed again if the operation fails
//! partway, so no half-written ciphertext or plaintext is left behind.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use rand::RngCore;
use secrecy::SecretString;
use tracing::debug;
use x25519_dalek::{PublicKey, StaticSecret};

use sealkit_core::{SealError, SealResult};

use crate::exchange::{
    establish_anonymous_decrypt, establish_anonymous_encrypt, establish_mutual_decrypt,
    establish_mutual_encrypt, establish_self_decrypt, establish_self_encrypt, EstablishedKey,
};
use crate::header::{FileHeader, HEADER_SIZE};
use crate::kdf::{derive_password_key, KdfParams};
use crate::keys::{generate_encryption_keypair, SymmetricKey};
use crate::stream::{decrypt_stream, encrypt_stream};
use crate::{ENCRYPTED_EXTENSION, NONCE_SIZE, SALT_SIZE};

/// Key material for encryption. The variant selects the key-establishment
/// mode, so a request cannot be built without usable material.
pub enum EncryptKey<'a> {
    /// Argon2id from a password; no key pair involved.
    Password(&'a SecretString),
    /// Sender-authenticated: both long-term keys plus a per-file ephemeral.
    Mutual {
        sender_secret: &'a StaticSecret,
        recipient_public: &'a PublicKey,
    },
    /// Ephemeral-only; the sender is not authenticated.
    Anonymous { recipient_public: &'a PublicKey },
    /// Bound to the caller's own key pair, no recipient named.
    Own { secret: &'a StaticSecret },
}

/// Key material for decryption, mirroring [`EncryptKey`].
pub enum DecryptKey<'a> {
    Password(&'a SecretString),
    Mutual {
        recipient_secret: &'a StaticSecret,
        sender_public: &'a PublicKey,
    },
    Anonymous { recipient_secret: &'a StaticSecret },
    Own { secret: &'a StaticSecret },
}

/// `<input>` → `<input>.sealed`
pub fn encrypted_output_path(input: &Path) -> PathBuf {
    let mut name = input.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(ENCRYPTED_EXTENSION);
    input.with_file_name(name)
}

/// `<input>.sealed` → `<input>`, or `<input>.decrypted` when the input does
/// not carry the encrypted extension.
pub fn decrypted_output_path(input: &Path) -> PathBuf {
    if input.extension().is_some_and(|ext| ext == ENCRYPTED_EXTENSION) {
        input.with_extension("")
    } else {
        let mut name = input.file_name().unwrap_or_default().to_os_string();
        name.push(".decrypted");
        input.with_file_name(name)
    }
}

fn require_regular_file(path: &Path) -> SealResult<()> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(SealError::Validation(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    Ok(())
}

/// Encrypt one file with the default KDF cost parameters.
pub fn encrypt_file(input: &Path, key: &EncryptKey<'_>) -> SealResult<PathBuf> {
    encrypt_file_with(input, key, &KdfParams::default())
}

/// Encrypt one file, writing `<input>.sealed`. Returns the output path.
///
/// `params` is recorded in the header even for key-exchange modes, so the
/// header layout never reveals the mode; it is only consumed when `key` is
/// [`EncryptKey::Password`].
pub fn encrypt_file_with(
    input: &Path,
    key: &EncryptKey<'_>,
    params: &KdfParams,
) -> SealResult<PathBuf> {
    require_regular_file(input)?;
    let output = encrypted_output_path(input);

    let result = write_encrypted(input, &output, key, params);
    if result.is_err() {
        let _ = std::fs::remove_file(&output);
    }
    result.map(|()| {
        debug!(input = %input.display(), output = %output.display(), "encrypted file");
        output
    })
}

fn write_encrypted(
    input: &Path,
    output: &Path,
    key: &EncryptKey<'_>,
    params: &KdfParams,
) -> SealResult<()> {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut base_nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut base_nonce);

    let (key_slot, file_key) = match key {
        EncryptKey::Password(password) => {
            let file_key = derive_password_key(password, &salt, params)?;
            // Throwaway public key as filler: indistinguishable from the
            // real ephemeral key a key-exchange mode would store here.
            let (_, filler) = generate_encryption_keypair();
            (*filler.as_bytes(), file_key)
        }
        EncryptKey::Mutual {
            sender_secret,
            recipient_public,
        } => {
            let EstablishedKey { key_slot, key } =
                establish_mutual_encrypt(sender_secret, recipient_public, &salt)?;
            (key_slot, key)
        }
        EncryptKey::Anonymous { recipient_public } => {
            let EstablishedKey { key_slot, key } =
                establish_anonymous_encrypt(recipient_public, &salt)?;
            (key_slot, key)
        }
        EncryptKey::Own { secret } => {
            let EstablishedKey { key_slot, key } = establish_self_encrypt(secret, &salt)?;
            (key_slot, key)
        }
    };

    let header = FileHeader {
        salt,
        key_slot,
        base_nonce,
        kdf: *params,
    }
    .encode();

    let mut reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(output)?);
    encrypt_stream(&mut reader, &mut writer, &file_key, &header)
}

/// Decrypt one `.sealed` file. Returns the output path.
pub fn decrypt_file(input: &Path, key: &DecryptKey<'_>) -> SealResult<PathBuf> {
    require_regular_file(input)?;
    let output = decrypted_output_path(input);

    let result = write_decrypted(input, &output, key);
    if result.is_err() {
        let _ = std::fs::remove_file(&output);
    }
    result.map(|()| {
        debug!(input = %input.display(), output = %output.display(), "decrypted file");
        output
    })
}

fn write_decrypted(input: &Path, output: &Path, key: &DecryptKey<'_>) -> SealResult<()> {
    let mut reader = BufReader::new(File::open(input)?);

    let mut header_bytes = [0u8; HEADER_SIZE];
    reader
        .read_exact(&mut header_bytes)
        .map_err(|_| SealError::Tamper("file too short to hold a header".into()))?;
    let header = FileHeader::decode(&header_bytes)?;

    let file_key: SymmetricKey = match key {
        DecryptKey::Password(password) => {
            derive_password_key(password, &header.salt, &header.kdf)?
        }
        DecryptKey::Mutual {
            recipient_secret,
            sender_public,
        } => establish_mutual_decrypt(
            recipient_secret,
            sender_public,
            &header.key_slot,
            &header.salt,
        )?,
        DecryptKey::Anonymous { recipient_secret } => {
            establish_anonymous_decrypt(recipient_secret, &header.key_slot, &header.salt)?
        }
        DecryptKey::Own { secret } => {
            establish_self_decrypt(secret, &header.key_slot, &header.salt)?
        }
    };

    let mut writer = BufWriter::new(File::create(output)?);
    decrypt_stream(&mut reader, &mut writer, &file_key, &header_bytes)
}
