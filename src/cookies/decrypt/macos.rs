//! macOS Keychain access for Chrome cookie decryption.
//!
//! ## Chrome's Keychain Entry
//! - Service: "Chrome Safe Storage", falling back to "Chromium Safe Storage"
//! - Account: "Chrome" / "Chromium"
//! - Key derivation: PBKDF2-HMAC-SHA1 with 1003 iterations

use super::{derive_key, CookieKey};
use crate::base::error::{Error, Result};
use crate::cookies::chromedb::{encryption, keyring};
use tracing::debug;
use zeroize::Zeroizing;

/// errSecItemNotFound
const ERR_SEC_ITEM_NOT_FOUND: i32 = -25300;

/// Get the encryption key from the macOS Keychain.
///
/// Entries are tried in order; the first non-empty password wins.
pub fn get_keychain_key() -> Result<CookieKey> {
    use security_framework::passwords::get_generic_password;

    for (service, account) in keyring::MACOS_ENTRIES {
        match get_generic_password(service, account) {
            Ok(password) => {
                let password = Zeroizing::new(password);
                let trimmed = trim_ascii(&password);
                if trimmed.is_empty() {
                    continue;
                }
                debug!(service, "read safe-storage password from keychain");
                return derive_key(trimmed, encryption::MACOS_ITERATIONS);
            }
            Err(e) if e.code() == ERR_SEC_ITEM_NOT_FOUND => {
                debug!(service, "keychain entry not found");
            }
            Err(e) => {
                debug!(service, error = %e, "keychain access denied");
            }
        }
    }

    Err(Error::KeyringUnavailable {
        services: keyring::MACOS_ENTRIES
            .iter()
            .map(|(s, _)| *s)
            .collect::<Vec<_>>()
            .join(", "),
    })
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_ascii() {
        assert_eq!(trim_ascii(b"  pass\n"), b"pass");
        assert_eq!(trim_ascii(b"\n"), b"");
    }
}
