//! OAuth token cache for the rewards ledger.

use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Safety margin subtracted from the ledger's `expires_in`.
///
/// A token that is about to expire is useless for a request already in
/// flight, so it is treated as expired this long before the ledger
/// would reject it.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// In-process cache for the ledger's client-credentials token.
///
/// Callers pass the current [`Instant`] explicitly, which keeps expiry
/// behavior testable without a real clock. Two tasks that miss at the
/// same time will both fetch a fresh token; the second write wins and
/// both tokens are valid, so no coordination is needed beyond the lock.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    /// Create an empty token cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: RwLock::const_new(None),
        }
    }

    /// Get the cached token if it is still valid at `now`.
    pub async fn get(&self, now: Instant) -> Option<String> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|cached| cached.expires_at > now)
            .map(|cached| cached.token.clone())
    }

    /// Store a freshly issued token.
    ///
    /// `expires_in` is the lifetime in seconds reported by the ledger;
    /// the cached entry expires [`EXPIRY_MARGIN`] earlier.
    pub async fn store(&self, token: String, expires_in: u64, now: Instant) {
        let lifetime = Duration::from_secs(expires_in).saturating_sub(EXPIRY_MARGIN);
        let cached = CachedToken {
            token,
            expires_at: now + lifetime,
        };
        *self.slot.write().await = Some(cached);
    }

    /// Drop the cached token, forcing the next caller to fetch.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}
