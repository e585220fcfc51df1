//! Chrome os_crypt compatible decryption.
//!
//! Decrypts Chrome's encrypted cookie values on macOS.
//! Based on Chromium's `components/os_crypt/sync/os_crypt_mac.mm`.
//!
//! ## Value layout
//! - `v10`/`v11` prefix, then AES-128-CBC ciphertext (IV = 16 spaces,
//!   PKCS#7 padding) under the PBKDF2 key.
//! - Databases at schema 24+ prefix the plaintext with SHA-256(host_key).
//! - Anything without a known prefix is stored as plaintext.

use crate::base::error::{Error, Result};
use crate::cookies::chromedb::{encryption, HOST_DIGEST_DB_VERSION, HOST_DIGEST_LEN};

/// Encryption version from the value prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionVersion {
    V10,
    V11,
}

/// Get the encryption version from the prefix.
pub fn encryption_version(data: &[u8]) -> Option<EncryptionVersion> {
    if data.starts_with(encryption::V10_PREFIX) {
        Some(EncryptionVersion::V10)
    } else if data.starts_with(encryption::V11_PREFIX) {
        Some(EncryptionVersion::V11)
    } else {
        None
    }
}

/// Check if encrypted data has a known Chrome encryption prefix.
pub fn is_encrypted(data: &[u8]) -> bool {
    encryption_version(data).is_some()
}

/// Whether decrypted plaintexts start with the SHA-256(host_key) digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostDigest {
    /// Schema 24 and later: always present.
    Present,
    /// Older schemas: never present.
    Absent,
    /// Schema unknown: recognized from the bytes.
    Detect,
}

impl HostDigest {
    /// Policy for the `meta.version` of a cookie database.
    pub fn for_db_version(version: Option<i64>) -> Self {
        match version {
            Some(v) if v >= i64::from(HOST_DIGEST_DB_VERSION) => HostDigest::Present,
            Some(_) => HostDigest::Absent,
            None => HostDigest::Detect,
        }
    }
}

/// Decrypt one `encrypted_value` column of a database with unknown schema.
///
/// Values without a recognized prefix are decoded leniently as plaintext
/// and never fail.
pub fn decrypt_cookie_value(key: &[u8; 16], host_key: &str, encrypted: &[u8]) -> Result<String> {
    decrypt_cookie_value_with(key, host_key, encrypted, HostDigest::Detect)
}

/// [`decrypt_cookie_value`] with the digest handling fixed by the schema.
pub fn decrypt_cookie_value_with(
    key: &[u8; 16],
    host_key: &str,
    encrypted: &[u8],
    digest: HostDigest,
) -> Result<String> {
    if encrypted.is_empty() {
        return Ok(String::new());
    }
    if !is_encrypted(encrypted) {
        return Ok(lossy_trimmed(encrypted));
    }

    let ciphertext = &encrypted[encryption::V10_PREFIX.len()..];
    if ciphertext.is_empty() {
        return Ok(String::new());
    }

    let plaintext = decrypt_aes_cbc(key, &encryption::AES_CBC_IV, ciphertext)?;
    let value = match digest {
        HostDigest::Absent => &plaintext[..],
        HostDigest::Detect => strip_host_digest(host_key, &plaintext),
        HostDigest::Present => plaintext.get(HOST_DIGEST_LEN..).ok_or_else(|| {
            Error::cookie_decryption_failed("plaintext shorter than the host digest")
        })?,
    };
    Ok(lossy_trimmed(value))
}

/// Encrypt a value the way Chrome stores it. Used to build fixtures.
pub fn encrypt_cookie_value(
    key: &[u8; 16],
    host_key: &str,
    value: &str,
    with_host_digest: bool,
) -> Result<Vec<u8>> {
    use boring::symm::{encrypt, Cipher};

    let mut plaintext = Vec::with_capacity(HOST_DIGEST_LEN + value.len());
    if with_host_digest {
        plaintext.extend_from_slice(&boring::sha::sha256(host_key.as_bytes()));
    }
    plaintext.extend_from_slice(value.as_bytes());

    let ciphertext = encrypt(
        Cipher::aes_128_cbc(),
        key,
        Some(&encryption::AES_CBC_IV),
        &plaintext,
    )
    .map_err(|e| Error::cookie_decryption_failed(e.to_string()))?;

    let mut out = encryption::V10_PREFIX.to_vec();
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt AES-CBC encrypted data with PKCS7 padding.
fn decrypt_aes_cbc(key: &[u8; 16], iv: &[u8; 16], data: &[u8]) -> Result<Vec<u8>> {
    use boring::symm::{Cipher, Crypter, Mode};

    if data.len() % 16 != 0 {
        return Err(Error::cookie_decryption_failed(format!(
            "ciphertext length {} is not a multiple of the block size",
            data.len()
        )));
    }

    let fail = |e: boring::error::ErrorStack| Error::cookie_decryption_failed(e.to_string());

    let mut crypter =
        Crypter::new(Cipher::aes_128_cbc(), Mode::Decrypt, key, Some(iv)).map_err(fail)?;
    crypter.pad(true);

    let mut plaintext = vec![0u8; data.len() + 16];
    let count = crypter.update(data, &mut plaintext).map_err(fail)?;
    let rest = crypter.finalize(&mut plaintext[count..]).map_err(fail)?;
    plaintext.truncate(count + rest);

    Ok(plaintext)
}

/// Drop the 32-byte host digest when present.
///
/// The digest is recognized exactly when it equals SHA-256(host_key). A
/// longer plaintext whose first 32 bytes are not text is also treated as
/// digest-prefixed, which covers host keys normalized differently.
fn strip_host_digest<'a>(host_key: &str, plaintext: &'a [u8]) -> &'a [u8] {
    if plaintext.len() < HOST_DIGEST_LEN {
        return plaintext;
    }
    let (head, tail) = plaintext.split_at(HOST_DIGEST_LEN);
    if head == boring::sha::sha256(host_key.as_bytes()) {
        return tail;
    }
    if !tail.is_empty() && std::str::from_utf8(head).is_err() {
        return tail;
    }
    plaintext
}

fn lossy_trimmed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_matches('\0').to_string()
}
