//! Time-boxed session token cache with single-flight refresh.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::ProviderError;

/// A cached token and its expiry.
#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Process-wide cache for a provider session token.
///
/// The lock is held across a refresh, so concurrent callers that find the
/// token expired wait for the one refresh in flight instead of each
/// authenticating on their own.
#[derive(Debug)]
pub struct SessionCache {
    ttl: Duration,
    state: Mutex<Option<CachedToken>>,
}

impl SessionCache {
    /// Creates an empty cache whose entries live at most `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(None),
        }
    }

    /// Returns the cached token, running `refresh` first if it is missing or expired.
    ///
    /// `refresh` yields the new token and, optionally, the lifetime the
    /// issuer granted; the shorter of that and the cache TTL applies.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<String, ProviderError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(String, Option<Duration>), ProviderError>>,
    {
        let mut state = self.state.lock().await;
        if let Some(cached) = state.as_ref() {
            if Instant::now() < cached.expires_at {
                return Ok(cached.token.clone());
            }
            debug!("Session token expired");
        }

        let (token, granted) = refresh().await?;
        let lifetime = granted.map_or(self.ttl, |g| g.min(self.ttl));
        info!(lifetime_secs = lifetime.as_secs(), "Session token refreshed");

        *state = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token)
    }

    /// Drops the cached token so the next call re-authenticates.
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
