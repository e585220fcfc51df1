//! Cookie encryption key sources.
//!
//! Chrome on macOS keeps a random "Safe Storage" password in the login
//! keychain and derives the AES key from it with PBKDF2. The [`KeySource`]
//! trait lets the cookie reader ask for that key without knowing where the
//! password came from.
//!
//! ## Platform Support
//! - **macOS**: Keychain via `security-framework`
//! - anything else: [`Error::PlatformNotSupported`]

#[cfg(target_os = "macos")]
pub mod macos;

use crate::base::error::{Error, Result};
use crate::cookies::chromedb::encryption;
use zeroize::Zeroizing;

/// AES-128 key material, wiped on drop.
pub type CookieKey = Zeroizing<[u8; 16]>;

/// Something that can produce the cookie encryption key.
pub trait KeySource {
    fn key(&self) -> Result<CookieKey>;
}

/// Derive a 16-byte AES key from a password using PBKDF2-HMAC-SHA1.
///
/// This matches Chromium's key derivation in `os_crypt`.
pub fn derive_key(password: &[u8], iterations: u32) -> Result<CookieKey> {
    use boring::hash::MessageDigest;
    use boring::pkcs5::pbkdf2_hmac;

    let mut key = Zeroizing::new([0u8; 16]);
    pbkdf2_hmac(
        password,
        encryption::CHROME_SALT,
        iterations as usize,
        MessageDigest::sha1(),
        &mut key[..],
    )
    .map_err(|e| Error::cookie_decryption_failed(format!("PBKDF2 failed: {e}")))?;

    Ok(key)
}

/// Key derived from a known safe-storage password.
pub struct PasswordKey {
    password: Zeroizing<Vec<u8>>,
}

impl PasswordKey {
    pub fn new(password: impl AsRef<[u8]>) -> Self {
        Self {
            password: Zeroizing::new(password.as_ref().to_vec()),
        }
    }
}

impl KeySource for PasswordKey {
    fn key(&self) -> Result<CookieKey> {
        derive_key(&self.password, encryption::MACOS_ITERATIONS)
    }
}

/// Key derived from the password stored in the OS keychain.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeychainKey;

impl KeySource for KeychainKey {
    fn key(&self) -> Result<CookieKey> {
        get_chrome_key()
    }
}

/// Get the Chrome encryption key from the system keychain.
pub fn get_chrome_key() -> Result<CookieKey> {
    #[cfg(target_os = "macos")]
    {
        macos::get_keychain_key()
    }

    #[cfg(not(target_os = "macos"))]
    {
        Err(Error::PlatformNotSupported(
            "keychain access is only implemented for macOS".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_known_vector() {
        let key = derive_key(b"peanuts", 1).unwrap();
        let expected: [u8; 16] = [
            0xfd, 0x62, 0x1f, 0xe5, 0xa2, 0xb4, 0x02, 0x53, 0x9d, 0xfa, 0x14, 0x7c, 0xa9, 0x27,
            0x27, 0x78,
        ];
        assert_eq!(*key, expected);
    }

    #[test]
    fn test_derive_key_empty() {
        let key = derive_key(b"", 1).unwrap();
        let expected: [u8; 16] = [
            0xd0, 0xd0, 0xec, 0x9c, 0x7d, 0x77, 0xd4, 0x3a, 0xc5, 0x41, 0x87, 0xfa, 0x48, 0x18,
            0xd1, 0x7f,
        ];
        assert_eq!(*key, expected);
    }

    #[test]
    fn test_derive_key_iterations_matter() {
        let one = derive_key(b"test_password", 1).unwrap();
        let macos = derive_key(b"test_password", 1003).unwrap();
        assert_ne!(*one, *macos);
    }

    #[test]
    fn test_password_key_uses_macos_iterations() {
        let from_source = PasswordKey::new("secret").key().unwrap();
        let direct = derive_key(b"secret", 1003).unwrap();
        assert_eq!(*from_source, *direct);
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_keychain_unsupported_off_macos() {
        assert!(matches!(
            KeychainKey.key(),
            Err(Error::PlatformNotSupported(_))
        ));
    }
}
