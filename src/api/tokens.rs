//! Keychain-backed credential storage for the Riffle session.
//!
//! The platform issues a short-lived access token and a long-lived
//! refresh token on login. Both are persisted in the system keychain
//! under fixed entry names so a session survives process restarts.
//! Tokens are never written to disk in plaintext.

use std::sync::Mutex;

use zeroize::Zeroize;

/// Keychain service name for the Riffle terminal client.
const SERVICE_NAME: &str = "com.riffle.cli";

/// Fixed entry key for the access token.
const ACCESS_KEY: &str = "access_token";

/// Fixed entry key for the refresh token.
const REFRESH_KEY: &str = "refresh_token";

/// A pair of credentials returned by a login or refresh response.
///
/// Either side may be absent: a refresh response sometimes rotates only
/// the access token, and some auth backends never hand out a refresh
/// token at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPair {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

impl TokenPair {
    /// Build a pair from whatever fields the server returned.
    pub fn new(access: Option<String>, refresh: Option<String>) -> Self {
        Self { access, refresh }
    }
}

/// Persistent storage for the session credential pair.
///
/// `save` is a partial update: only the fields present in the pair are
/// written, the other entry is left untouched. `clear` removes both
/// unconditionally. Storage failures are logged rather than propagated;
/// a missing token is indistinguishable from a failed read, and every
/// caller already handles the absent case.
pub trait TokenStore: Send + Sync {
    /// Write the non-absent fields of the pair.
    fn save(&self, pair: &TokenPair);

    /// Remove both tokens unconditionally.
    fn clear(&self);

    /// The stored access token, if any.
    fn access(&self) -> Option<String>;

    /// The stored refresh token, if any.
    fn refresh(&self) -> Option<String>;

    /// Whether a session exists: true iff an access token is stored.
    fn is_authenticated(&self) -> bool {
        self.access().is_some()
    }
}

/// System keychain implementation used by the CLI binary.
///
/// Uses one keychain entry per token under the `com.riffle.cli`
/// service. `NoEntry` maps to an absent token (user never logged in or
/// was logged out).
pub struct KeyringTokenStore;

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self
    }

    fn read(key: &str) -> Option<String> {
        let entry = match keyring::Entry::new(SERVICE_NAME, key) {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Keychain entry open failed for {}: {}", key, e);
                return None;
            }
        };
        match entry.get_password() {
            Ok(token) => Some(token),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                log::warn!("Keychain read failed for {}: {}", key, e);
                None
            }
        }
    }

    fn write(key: &str, value: &str) {
        match keyring::Entry::new(SERVICE_NAME, key) {
            Ok(entry) => {
                if let Err(e) = entry.set_password(value) {
                    log::warn!("Keychain write failed for {}: {}", key, e);
                }
            }
            Err(e) => log::warn!("Keychain entry open failed for {}: {}", key, e),
        }
    }

    fn delete(key: &str) {
        let entry = match keyring::Entry::new(SERVICE_NAME, key) {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Keychain entry open failed for {}: {}", key, e);
                return;
            }
        };
        match entry.delete_credential() {
            Ok(()) => {}
            Err(keyring::Error::NoEntry) => {} // already absent, idempotent
            Err(e) => log::warn!("Keychain delete failed for {}: {}", key, e),
        }
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn save(&self, pair: &TokenPair) {
        if let Some(ref access) = pair.access {
            Self::write(ACCESS_KEY, access);
        }
        if let Some(ref refresh) = pair.refresh {
            Self::write(REFRESH_KEY, refresh);
        }
    }

    fn clear(&self) {
        Self::delete(ACCESS_KEY);
        Self::delete(REFRESH_KEY);
    }

    fn access(&self) -> Option<String> {
        Self::read(ACCESS_KEY)
    }

    fn refresh(&self) -> Option<String> {
        Self::read(REFRESH_KEY)
    }
}

/// In-memory implementation for tests and throwaway sessions.
///
/// Token strings are zeroed before being dropped on `clear`.
#[derive(Default)]
pub struct MemoryTokenStore {
    inner: Mutex<TokenPair>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a known pair already stored (test setup helper).
    pub fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Self {
        let store = Self::new();
        store.save(&TokenPair::new(
            access.map(str::to_string),
            refresh.map(str::to_string),
        ));
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, pair: &TokenPair) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(ref access) = pair.access {
            inner.access = Some(access.clone());
        }
        if let Some(ref refresh) = pair.refresh {
            inner.refresh = Some(refresh.clone());
        }
    }

    fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(ref mut access) = inner.access {
            access.zeroize();
        }
        if let Some(ref mut refresh) = inner.refresh {
            refresh.zeroize();
        }
        *inner = TokenPair::default();
    }

    fn access(&self) -> Option<String> {
        self.inner.lock().unwrap().access.clone()
    }

    fn refresh(&self) -> Option<String> {
        self.inner.lock().unwrap().refresh.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_stores_both_fields() {
        let store = MemoryTokenStore::new();
        store.save(&TokenPair::new(
            Some("A".to_string()),
            Some("R".to_string()),
        ));
        assert_eq!(store.access().as_deref(), Some("A"));
        assert_eq!(store.refresh().as_deref(), Some("R"));
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_save_is_a_partial_update() {
        let store = MemoryTokenStore::with_tokens(Some("A"), Some("R"));

        // A refresh response that rotates only the access token must
        // leave the stored refresh token untouched.
        store.save(&TokenPair::new(Some("A2".to_string()), None));
        assert_eq!(store.access().as_deref(), Some("A2"));
        assert_eq!(store.refresh().as_deref(), Some("R"));
    }

    #[test]
    fn test_clear_removes_both_unconditionally() {
        let store = MemoryTokenStore::with_tokens(Some("A"), Some("R"));
        store.clear();
        assert_eq!(store.access(), None);
        assert_eq!(store.refresh(), None);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_not_authenticated_with_refresh_only() {
        let store = MemoryTokenStore::with_tokens(None, Some("R"));
        assert!(!store.is_authenticated());
    }
}
