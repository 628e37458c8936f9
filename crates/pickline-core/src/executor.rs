//! Resilient HTTP request executor.
//!
//! Wraps one outbound call with a rate-limiter gate, differentiated retry
//! budgets, and an auth-refresh hook. The policy table, evaluated on the
//! response status:
//!
//! | Status | Action |
//! |--------|--------|
//! | 200–299 | return immediately |
//! | 401 | refresh token on a separate budget, retry |
//! | 409 / 423 | transient budget, `base·attempt + jitter(200–800ms)` |
//! | 429 | rate-limit budget, `Retry-After` or `base·2^used`, capped |
//! | 500–599 | transient budget, `base·2^(attempt-1)` |
//! | other 4xx | return immediately |
//! | transport failure | transient budget, exponential wait |
//!
//! The executor never errors on exhaustion: it returns the last-seen
//! response (or `None` when no attempt produced one) and lets the caller
//! treat a terminal non-2xx as data.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;
use tracing::{error, warn};

use crate::auth::TokenRefresher;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-instance executor policy. Budgets are independent: a 429 never
/// starves the transient budget and vice versa.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    /// Base backoff duration the exponential waits scale from.
    pub base_wait: Duration,
    /// Steady request cadence enforced before every attempt.
    pub permits_per_second: f64,
    /// Transient budget: 5xx, 409/423, transport failures.
    pub max_transient_retries: u32,
    /// 429 budget, tracked separately.
    pub max_rate_limit_retries: u32,
    /// 401 refresh budget, tracked separately.
    pub max_auth_retries: u32,
    /// Upper bound on any single computed wait.
    pub max_wait: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            base_wait: Duration::from_secs(1),
            permits_per_second: 5.0,
            max_transient_retries: 3,
            max_rate_limit_retries: 5,
            max_auth_retries: 2,
            max_wait: Duration::from_millis(300_000),
        }
    }
}

impl ExecutorConfig {
    pub fn new(base_wait: Duration, permits_per_second: f64) -> Self {
        Self {
            base_wait,
            permits_per_second,
            ..Self::default()
        }
    }
}

/// Resilient request executor. One instance per source; the limiter and
/// budget counters are never shared across sources.
pub struct RequestExecutor {
    client: Arc<dyn HttpClient>,
    limiter: DirectRateLimiter,
    config: ExecutorConfig,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

impl RequestExecutor {
    pub fn new(client: Arc<dyn HttpClient>, config: ExecutorConfig) -> Self {
        let limiter = RateLimiter::direct(quota_per_second(config.permits_per_second));
        Self {
            client,
            limiter,
            config,
            refresher: None,
        }
    }

    /// Attaches the auth-refresh hook invoked on 401.
    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub const fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Executes one logical call. `request_factory` runs fresh on every
    /// attempt so a just-refreshed token is picked up without caller
    /// intervention.
    pub async fn execute<F>(&self, request_factory: F) -> Option<HttpResponse>
    where
        F: Fn() -> HttpRequest + Send + Sync,
    {
        let cfg = &self.config;
        let mut last: Option<HttpResponse> = None;
        let mut attempt: u32 = 1;
        let mut auth_retries: u32 = 0;
        let mut rate_limit_retries: u32 = 0;

        while attempt <= cfg.max_transient_retries {
            self.limiter.until_ready().await;

            let request = request_factory();
            match self.client.execute(request).await {
                Ok(response) => {
                    if response.is_success() {
                        return Some(response);
                    }

                    match response.status {
                        401 => {
                            let Some(refresher) = &self.refresher else {
                                warn!("401 unauthorized and no refresher configured");
                                return Some(response);
                            };
                            auth_retries += 1;
                            if auth_retries > cfg.max_auth_retries {
                                error!(
                                    retries = auth_retries,
                                    "401 unauthorized, auth budget exhausted"
                                );
                                return Some(response);
                            }
                            warn!(
                                attempt = auth_retries,
                                max = cfg.max_auth_retries,
                                "401 unauthorized, refreshing token"
                            );
                            if let Err(err) = refresher.refresh().await {
                                warn!(error = %err, "token refresh failed");
                                return Some(response);
                            }
                            // Does not consume the transient budget.
                            last = Some(response);
                        }
                        409 | 423 => {
                            if attempt >= cfg.max_transient_retries {
                                error!(
                                    status = response.status,
                                    attempt, "lock conflict, transient budget exhausted"
                                );
                                return Some(response);
                            }
                            let wait = conflict_wait(cfg.base_wait, attempt);
                            warn!(
                                status = response.status,
                                wait_ms = wait.as_millis() as u64,
                                attempt,
                                max = cfg.max_transient_retries,
                                "lock conflict, retrying"
                            );
                            last = Some(response);
                            tokio::time::sleep(wait).await;
                            attempt += 1;
                        }
                        429 => {
                            rate_limit_retries += 1;
                            if rate_limit_retries > cfg.max_rate_limit_retries {
                                error!(
                                    retries = rate_limit_retries,
                                    "429 too many requests, rate-limit budget exhausted"
                                );
                                return Some(response);
                            }
                            let wait =
                                rate_limit_wait(&response, cfg.base_wait, rate_limit_retries)
                                    .min(cfg.max_wait);
                            warn!(
                                wait_ms = wait.as_millis() as u64,
                                attempt = rate_limit_retries,
                                max = cfg.max_rate_limit_retries,
                                "429 too many requests, retrying"
                            );
                            // Does not consume the transient budget.
                            last = Some(response);
                            tokio::time::sleep(wait).await;
                        }
                        500..=599 => {
                            if attempt >= cfg.max_transient_retries {
                                error!(
                                    status = response.status,
                                    attempt, "server error, transient budget exhausted"
                                );
                                return Some(response);
                            }
                            let wait = transient_wait(cfg.base_wait, attempt);
                            warn!(
                                status = response.status,
                                wait_ms = wait.as_millis() as u64,
                                attempt,
                                max = cfg.max_transient_retries,
                                "server error, retrying"
                            );
                            last = Some(response);
                            tokio::time::sleep(wait).await;
                            attempt += 1;
                        }
                        // Remaining 4xx are non-retryable.
                        _ => return Some(response),
                    }
                }
                Err(err) => {
                    let wait = transient_wait(cfg.base_wait, attempt);
                    warn!(
                        error = %err,
                        wait_ms = wait.as_millis() as u64,
                        attempt,
                        max = cfg.max_transient_retries,
                        "transport failure, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }

        last
    }
}

/// Exponential wait for 5xx and transport failures: `base · 2^(attempt-1)`.
pub fn transient_wait(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << (attempt.saturating_sub(1)).min(31))
}

/// Randomized wait for optimistic-lock conflicts: `base·attempt + 200–800ms`.
/// Linear escalation, gentler than the 5xx doubling.
pub fn conflict_wait(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt.max(1)) + Duration::from_millis(fastrand::u64(200..800))
}

/// Wait for a 429: server-directed `Retry-After` when parseable, else
/// `base · 2^budget_used`. Callers cap the result.
pub fn rate_limit_wait(response: &HttpResponse, base: Duration, budget_used: u32) -> Duration {
    let fallback = base.saturating_mul(1u32 << budget_used.min(31));
    match response.header("retry-after") {
        Some(value) => parse_retry_after(value, fallback),
        None => fallback,
    }
}

/// Parses `Retry-After` as either integer seconds or an HTTP-date. A date
/// yields `max(date - now, default)`; unparseable values yield `default`.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Duration::from_secs(seconds);
    }

    // HTTP-dates carry an obsolete zone name; Rfc2822 wants an offset.
    let normalized = value.replace("GMT", "+0000").replace("UTC", "+0000");
    match OffsetDateTime::parse(&normalized, &Rfc2822) {
        Ok(when) => {
            let delta_ms = (when - OffsetDateTime::now_utc()).whole_milliseconds();
            if delta_ms > default.as_millis() as i128 {
                Duration::from_millis(delta_ms as u64)
            } else {
                default
            }
        }
        Err(_) => default,
    }
}

fn quota_per_second(permits_per_second: f64) -> Quota {
    let safe_permits = if permits_per_second > 0.0 {
        permits_per_second
    } else {
        1.0
    };
    let period = Duration::from_secs_f64((1.0 / safe_permits).max(0.001));

    Quota::with_period(period)
        .expect("period is always greater than zero")
        .allow_burst(NonZeroU32::new(1).expect("burst of one is non-zero"))
}
