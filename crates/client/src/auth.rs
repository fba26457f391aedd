//! Bearer-token storage.
//!
//! The UI shell persists the token (local storage, keychain, etc.); the
//! client library only needs to read it per request and drop it on a 401.
//! The trait seam keeps the persistence mechanism out of this crate.

use std::sync::Mutex;

use secrecy::SecretString;

/// Source of the bearer token attached to authenticated requests.
pub trait TokenStore: Send + Sync {
    /// Current token, if the user is signed in.
    fn token(&self) -> Option<SecretString>;

    /// Replace the stored token after a successful sign-in.
    fn store(&self, token: SecretString);

    /// Drop the token (sign-out, or server rejected it with 401).
    fn clear(&self);
}

/// In-memory token store.
#[derive(Default)]
pub struct MemoryTokenStore {
    inner: Mutex<Option<SecretString>>,
}

impl MemoryTokenStore {
    /// Create a store pre-seeded with a token.
    #[must_use]
    pub fn with_token(token: SecretString) -> Self {
        Self {
            inner: Mutex::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<SecretString> {
        self.inner.lock().map_or(None, |guard| guard.clone())
    }

    fn store(&self, token: SecretString) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = Some(token);
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = None;
        }
    }
}
