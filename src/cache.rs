//! In-memory cache of VAPID authorization headers.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use sha2::{Digest, Sha256};

/// Identity of a cached header: the (private key, public key, audience,
/// subject) tuple, digested with length prefixes so field boundaries are
/// unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Derive the key for a signer tuple.
    pub fn new(private_key: &str, public_key: &str, audience: &str, subject: &str) -> Self {
        let mut hasher = Sha256::new();
        for field in [private_key, public_key, audience, subject] {
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }
        Self(hasher.finalize().into())
    }
}

/// Entry in the header cache with the expiry claimed by its token.
struct CacheEntry {
    header: String,
    expires_at: SystemTime,
}

/// Concurrent map from signer tuple to authorization header.
///
/// Entries are only ever replaced, never evicted.
#[derive(Default)]
pub struct TokenCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl TokenCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve the header for `key` if its token expires after `valid_until`.
    pub fn retrieve(&self, key: &CacheKey, valid_until: SystemTime) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).and_then(|entry| {
            if entry.expires_at > valid_until {
                Some(entry.header.clone())
            } else {
                None
            }
        })
    }

    /// Store a header, replacing any previous entry for `key`.
    pub fn store(&self, key: CacheKey, header: String, expires_at: SystemTime) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, CacheEntry { header, expires_at });
    }

    /// Number of cached headers.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the cache holds no headers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache").field("len", &self.len()).finish()
    }
}
