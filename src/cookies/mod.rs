//! Browser session cookies.
//!
//! | Chromium (C++) | sessiontap (Rust) | Responsibility |
//! |----------------|-------------------|----------------|
//! | `SqlitePersistentCookieStore` | [`browser`] | Snapshot + query of the `cookies` table |
//! | `os_crypt::OSCrypt` | [`oscrypt`] | v10/v11 value decryption |
//! | `KeychainPassword` | [`decrypt`] | Safe-storage password and PBKDF2 key |
//!
//! [`credentials`] sits on top and resolves a site's token pair from
//! arguments, the environment, or the store.
//!
//! ```rust,no_run
//! use sessiontap::cookies::browser::{ChromeCookieReader, CookieQuery, CookieSource};
//! use sessiontap::cookies::chromedb::CookieDbLocation;
//!
//! let reader = ChromeCookieReader::new(CookieDbLocation::new());
//! let cookies = reader.read_cookies(&CookieQuery::for_hosts(["linux.do"]))?;
//! println!("Found {} cookies", cookies.len());
//! # Ok::<(), sessiontap::base::Error>(())
//! ```

pub mod browser;
pub mod chromedb;
pub mod credentials;
pub mod decrypt;
pub mod oscrypt;

pub use browser::{ChromeCookieReader, CookieQuery, CookieSource, StoredCookie};
pub use credentials::{Credential, CredentialResolver, CredentialSource, CredentialSpec};
