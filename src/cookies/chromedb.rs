//! Chromium cookie database constants and path resolution.
//!
//! ## Reference Files
//! - `net/extras/sqlite/sqlite_persistent_cookie_store.cc`
//! - `components/os_crypt/sync/os_crypt_mac.mm`
//!
//! ## Database Version
//! Since schema version 24 Chromium prepends SHA-256(host_key) to the
//! plaintext before encrypting a cookie value.

use crate::base::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Chromium cookie database schema version that introduced the host digest.
pub const HOST_DIGEST_DB_VERSION: i32 = 24;

/// Length of the SHA-256 host digest prefix.
pub const HOST_DIGEST_LEN: usize = 32;

/// Encryption constants.
///
/// Reference: `components/os_crypt/sync/os_crypt_mac.mm`
pub mod encryption {
    pub const V10_PREFIX: &[u8] = b"v10";

    pub const V11_PREFIX: &[u8] = b"v11";

    /// Salt used for all PBKDF2 key derivation
    pub const CHROME_SALT: &[u8] = b"saltysalt";

    /// PBKDF2 iterations for macOS
    pub const MACOS_ITERATIONS: u32 = 1003;

    /// AES-CBC IV (16 space characters)
    pub const AES_CBC_IV: [u8; 16] = [0x20; 16];
}

/// Browser user data directory paths.
pub mod paths {
    /// macOS Chrome user data path, relative to the home directory
    pub const MACOS_CHROME: &str = "Library/Application Support/Google/Chrome";

    /// Cookie database file name inside a profile directory
    pub const COOKIES_FILE: &str = "Cookies";

    pub const DEFAULT_PROFILE: &str = "Default";
}

/// Keychain (service, account) pairs, tried in order.
pub mod keyring {
    pub const MACOS_CHROME_SERVICE: &str = "Chrome Safe Storage";
    pub const MACOS_CHROME_ACCOUNT: &str = "Chrome";

    pub const MACOS_CHROMIUM_SERVICE: &str = "Chromium Safe Storage";
    pub const MACOS_CHROMIUM_ACCOUNT: &str = "Chromium";

    pub const MACOS_ENTRIES: &[(&str, &str)] = &[
        (MACOS_CHROME_SERVICE, MACOS_CHROME_ACCOUNT),
        (MACOS_CHROMIUM_SERVICE, MACOS_CHROMIUM_ACCOUNT),
    ];
}

/// Where to look for a Chrome cookie database.
#[derive(Debug, Clone)]
pub struct CookieDbLocation {
    profile: String,
    profile_dir: Option<PathBuf>,
    user_data_dir: Option<PathBuf>,
}

impl Default for CookieDbLocation {
    fn default() -> Self {
        Self {
            profile: paths::DEFAULT_PROFILE.to_string(),
            profile_dir: None,
            user_data_dir: None,
        }
    }
}

impl CookieDbLocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile name under the user data directory (default: "Default").
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        let profile = profile.into();
        if !profile.trim().is_empty() {
            self.profile = profile;
        }
        self
    }

    /// A profile directory, a user data directory, or the database file itself.
    pub fn with_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = Some(dir.into());
        self
    }

    /// Override the Chrome user data directory (tests, non-standard installs).
    pub fn with_user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Resolve the database file.
    ///
    /// An explicit directory is checked as `<dir>/Cookies`,
    /// `<dir>/<profile>/Cookies`, then `<dir>/Default/Cookies`. Without one,
    /// the default user data directory is used with a fallback to the
    /// `Default` profile.
    pub fn resolve(&self) -> Result<PathBuf> {
        if let Some(root) = &self.profile_dir {
            let root = expand_home(root);
            if root.is_file() {
                return Ok(root);
            }
            let candidates = [
                root.join(paths::COOKIES_FILE),
                root.join(&self.profile).join(paths::COOKIES_FILE),
                root.join(paths::DEFAULT_PROFILE).join(paths::COOKIES_FILE),
            ];
            return candidates
                .into_iter()
                .find(|p| p.is_file())
                .ok_or_else(|| Error::cookie_db_not_found(&root));
        }

        let base = match &self.user_data_dir {
            Some(dir) => dir.clone(),
            None => chrome_user_data_dir().ok_or_else(|| {
                Error::cookie_db_not_found(Path::new("~").join(paths::MACOS_CHROME))
            })?,
        };
        let db_path = base.join(&self.profile).join(paths::COOKIES_FILE);
        if db_path.is_file() {
            return Ok(db_path);
        }
        if self.profile != paths::DEFAULT_PROFILE {
            let fallback = base.join(paths::DEFAULT_PROFILE).join(paths::COOKIES_FILE);
            if fallback.is_file() {
                return Ok(fallback);
            }
        }
        Err(Error::cookie_db_not_found(db_path))
    }
}

/// Default Chrome user data directory.
pub fn chrome_user_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(paths::MACOS_CHROME))
}

/// Expand a leading `~/` against the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
