//! Token refresh capability and the shared token holder.
//!
//! The executor stays source-agnostic: on a 401 it calls the configured
//! [`TokenRefresher`] and rebuilds the request through its factory, which
//! picks the fresh token up from wherever the connector stores it,
//! typically a [`TokenCell`].

use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::info;

use crate::SourceError;

/// Auth-refresh capability invoked by the request executor on 401.
pub trait TokenRefresher: Send + Sync {
    fn refresh<'a>(&'a self)
        -> Pin<Box<dyn Future<Output = Result<(), SourceError>> + Send + 'a>>;
}

#[derive(Debug, Clone)]
struct TokenEntry {
    value: String,
    expires_at: Instant,
}

/// Shared access-token holder with double-checked refresh.
///
/// The common case is a cheap read-locked freshness check. Only a caller
/// that observes a stale token takes the async mutex, re-checks under it,
/// and runs the refresh; concurrent callers that lost the race find a fresh
/// token on re-check and return without a second remote call.
#[derive(Debug)]
pub struct TokenCell {
    entry: RwLock<Option<TokenEntry>>,
    refresh_lock: Mutex<()>,
}

impl Default for TokenCell {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCell {
    pub fn new() -> Self {
        Self {
            entry: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Current token if present, fresh or not.
    pub fn current(&self) -> Option<String> {
        self.entry
            .read()
            .expect("token cell lock is not poisoned")
            .as_ref()
            .map(|entry| entry.value.clone())
    }

    pub fn is_fresh(&self) -> bool {
        self.entry
            .read()
            .expect("token cell lock is not poisoned")
            .as_ref()
            .map(|entry| entry.expires_at > Instant::now())
            .unwrap_or(false)
    }

    /// Stores a token valid for `ttl` from now.
    pub fn store(&self, value: impl Into<String>, ttl: Duration) {
        let mut entry = self
            .entry
            .write()
            .expect("token cell lock is not poisoned");
        *entry = Some(TokenEntry {
            value: value.into(),
            expires_at: Instant::now() + ttl,
        });
    }

    /// Invalidates the held token so the next caller refreshes.
    pub fn clear(&self) {
        let mut entry = self
            .entry
            .write()
            .expect("token cell lock is not poisoned");
        *entry = None;
    }

    /// Returns a fresh token, running `refresh` at most once across
    /// concurrent stale callers.
    pub async fn ensure_fresh<F, Fut>(&self, refresh: F) -> Result<String, SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(String, Duration), SourceError>>,
    {
        if self.is_fresh() {
            if let Some(token) = self.current() {
                return Ok(token);
            }
        }

        let _guard = self.refresh_lock.lock().await;

        // Re-check under the lock: another caller may have refreshed while
        // this one was waiting.
        if self.is_fresh() {
            if let Some(token) = self.current() {
                return Ok(token);
            }
        }

        info!("access token stale, refreshing");
        let (value, ttl) = refresh().await?;
        self.store(value.clone(), ttl);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn stored_token_is_fresh_until_ttl() {
        let cell = TokenCell::new();
        assert!(!cell.is_fresh());

        cell.store("tok", Duration::from_secs(60));
        assert!(cell.is_fresh());
        assert_eq!(cell.current().as_deref(), Some("tok"));

        cell.clear();
        assert!(!cell.is_fresh());
        assert!(cell.current().is_none());
    }

    #[tokio::test]
    async fn concurrent_stale_callers_refresh_once() {
        let cell = Arc::new(TokenCell::new());
        let refreshes = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cell = Arc::clone(&cell);
            let refreshes = Arc::clone(&refreshes);
            handles.push(tokio::spawn(async move {
                cell.ensure_fresh(|| async {
                    refreshes.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok((String::from("fresh"), Duration::from_secs(60)))
                })
                .await
            }));
        }

        for handle in handles {
            let token = handle.await.expect("join").expect("refresh");
            assert_eq!(token, "fresh");
        }
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fresh_token_skips_refresh() {
        let cell = TokenCell::new();
        cell.store("tok", Duration::from_secs(60));

        let token = cell
            .ensure_fresh(|| async { Err(SourceError::internal("must not be called")) })
            .await
            .expect("fresh path");
        assert_eq!(token, "tok");
    }
}
