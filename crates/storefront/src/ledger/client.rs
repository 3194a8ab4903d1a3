//! Rewards ledger HTTP client implementation.
//!
//! Talks three dialects: form-encoded OAuth for tokens, JSON for the
//! employee directory, and bare-token XML for the gamification
//! endpoints. Directory listings are cached via `moka` (5-minute TTL).

use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use moka::future::Cache;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};

use perkstore_core::{Email, Points};

use crate::config::LedgerConfig;

use super::LedgerError;
use super::token::TokenCache;
use super::types::{BalanceReading, DebitOutcome, DirectoryUser, TokenResponse, UserListResponse};

static POINTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<points>(\d+)</points>").expect("Invalid regex"));

/// Page size for directory listing requests.
const DIRECTORY_PAGE_SIZE: usize = 1000;

/// Cache key for the (single) directory listing entry.
const DIRECTORY_CACHE_KEY: &str = "directory";

/// Per-request timeout. Debits especially must not hang checkout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// LedgerClient
// =============================================================================

/// Client for the external rewards ledger.
///
/// Cheap to clone; all state lives behind an `Arc`.
#[derive(Clone)]
pub struct LedgerClient {
    inner: Arc<LedgerClientInner>,
}

struct LedgerClientInner {
    client: reqwest::Client,
    token_url: String,
    user_list_url: String,
    points_url: String,
    withdraw_url: String,
    client_id: String,
    client_secret: SecretString,
    token_cache: TokenCache,
    directory_cache: Cache<&'static str, Arc<Vec<DirectoryUser>>>,
}

impl LedgerClient {
    /// Create a new ledger client.
    #[must_use]
    pub fn new(config: &LedgerConfig) -> Self {
        let directory_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let token_url = format!("https://{}/api/v3/token", config.account_domain);
        let user_list_url = format!("https://{}/api/v2/user/list", config.api_domain);
        // Gamification endpoints live on the api- prefixed host
        let points_url = format!("https://api-{}/gamification/points", config.api_domain);
        let withdraw_url = format!(
            "https://api-{}/gamification/points/withdraw",
            config.api_domain
        );

        Self {
            inner: Arc::new(LedgerClientInner {
                client: reqwest::Client::new(),
                token_url,
                user_list_url,
                points_url,
                withdraw_url,
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                token_cache: TokenCache::new(),
                directory_cache,
            }),
        }
    }

    // =========================================================================
    // Token
    // =========================================================================

    /// Get a valid bearer token, fetching a fresh one if the cached
    /// token expired.
    async fn token(&self) -> Result<String, LedgerError> {
        let now = Instant::now();
        if let Some(token) = self.inner.token_cache.get(now).await {
            debug!("Using cached ledger token");
            return Ok(token);
        }

        debug!("Requesting new ledger token");
        let response = self
            .inner
            .client
            .post(&self.inner.token_url)
            .timeout(REQUEST_TIMEOUT)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.inner.client_id.as_str()),
                ("client_secret", self.inner.client_secret.expose_secret()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(LedgerError::Api {
                status: status.as_u16(),
                message: truncate(&body, 500),
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)?;
        self.inner
            .token_cache
            .store(parsed.access_token.clone(), parsed.expires_in, now)
            .await;

        Ok(parsed.access_token)
    }

    // =========================================================================
    // Directory
    // =========================================================================

    /// Find an employee in the ledger directory by email.
    ///
    /// Matching is case-insensitive because both sides are normalized
    /// [`Email`] values.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be obtained or the
    /// directory listing fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn find_user_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<DirectoryUser>, LedgerError> {
        let directory = self.directory().await?;
        Ok(directory.iter().find(|u| &u.email == email).cloned())
    }

    /// Get the full directory, from cache when fresh.
    async fn directory(&self) -> Result<Arc<Vec<DirectoryUser>>, LedgerError> {
        if let Some(cached) = self.inner.directory_cache.get(DIRECTORY_CACHE_KEY).await {
            debug!("Cache hit for ledger directory");
            return Ok(cached);
        }

        let users = Arc::new(self.fetch_directory().await?);
        self.inner
            .directory_cache
            .insert(DIRECTORY_CACHE_KEY, Arc::clone(&users))
            .await;

        Ok(users)
    }

    /// Fetch every directory page from the ledger.
    async fn fetch_directory(&self) -> Result<Vec<DirectoryUser>, LedgerError> {
        let token = self.token().await?;
        let mut users = Vec::new();
        let mut page = 1_usize;

        loop {
            let response = self
                .inner
                .client
                .post(&self.inner.user_list_url)
                .timeout(REQUEST_TIMEOUT)
                .header("Authorization", format!("Bearer {token}"))
                .header("Accept", "application/json")
                .json(&serde_json::json!({
                    "page": page,
                    "pageSize": DIRECTORY_PAGE_SIZE,
                }))
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;

            if !status.is_success() {
                return Err(LedgerError::Api {
                    status: status.as_u16(),
                    message: truncate(&body, 500),
                });
            }

            let parsed: UserListResponse = serde_json::from_str(&body)?;
            let profiles = parsed
                .user_profiles
                .map_or_else(Vec::new, super::types::OneOrMany::into_vec);
            let page_len = profiles.len();

            users.extend(
                profiles
                    .into_iter()
                    .filter_map(super::types::UserProfile::into_directory_user),
            );

            if page_len < DIRECTORY_PAGE_SIZE {
                break;
            }
            page += 1;
        }

        debug!(count = users.len(), "Fetched ledger directory");
        Ok(users)
    }

    // =========================================================================
    // Balance
    // =========================================================================

    /// Read an employee's point balance.
    ///
    /// Never errors: every failure mode collapses to
    /// [`BalanceReading::Unavailable`] with the cause preserved for
    /// logs. A missing `<points>` element is also `Unavailable`; an
    /// answer that cannot be parsed is not a zero balance.
    #[instrument(skip(self))]
    pub async fn get_balance(&self, ledger_user_id: &str) -> BalanceReading {
        let token = match self.token().await {
            Ok(t) => t,
            Err(e) => {
                return BalanceReading::Unavailable {
                    reason: format!("token acquisition failed: {e}"),
                };
            }
        };

        let url = format!("{}?userIds={ledger_user_id}", self.inner.points_url);
        let response = self
            .inner
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            // Gamification auth is the raw token, not a Bearer scheme
            .header("Authorization", token)
            .header("Accept", "application/xml")
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                return BalanceReading::Unavailable {
                    reason: format!("transport error: {e}"),
                };
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                return BalanceReading::Unavailable {
                    reason: format!("failed to read response: {e}"),
                };
            }
        };

        if !status.is_success() {
            return BalanceReading::Unavailable {
                reason: format!("ledger returned {status}: {}", truncate(&body, 200)),
            };
        }

        parse_points_xml(&body)
    }

    // =========================================================================
    // Debit
    // =========================================================================

    /// Withdraw points from an employee's balance.
    ///
    /// Never errors and never retries. Failures before the request is
    /// delivered classify as [`DebitOutcome::Declined`]; a timeout or a
    /// lost response classifies as [`DebitOutcome::Unknown`] because the
    /// ledger may have applied the debit. Callers own the consequences
    /// of each outcome.
    #[instrument(skip(self, reason), fields(amount = amount.as_i64()))]
    pub async fn debit(
        &self,
        ledger_user_id: &str,
        amount: Points,
        reason: &str,
    ) -> DebitOutcome {
        let token = match self.token().await {
            Ok(t) => t,
            // No token means nothing was sent; the debit definitely
            // did not happen.
            Err(e) => {
                return DebitOutcome::Declined {
                    reason: format!("token acquisition failed: {e}"),
                };
            }
        };

        let xml = withdraw_request_xml(ledger_user_id, amount, reason);

        let response = self
            .inner
            .client
            .post(&self.inner.withdraw_url)
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", token)
            .header("Content-Type", "application/xml")
            .header("Accept", "application/xml")
            .body(xml)
            .send()
            .await;

        match response {
            Ok(r) => {
                let status = r.status();
                if status.is_success() {
                    DebitOutcome::Debited
                } else {
                    let body = r.text().await.unwrap_or_default();
                    DebitOutcome::Declined {
                        reason: format!("ledger returned {status}: {}", truncate(&body, 200)),
                    }
                }
            }
            Err(e) if e.is_connect() => DebitOutcome::Declined {
                reason: format!("connection failed: {e}"),
            },
            Err(e) if e.is_timeout() => {
                warn!(error = %e, "Debit request timed out; outcome unknown");
                DebitOutcome::Unknown {
                    reason: format!("request timed out: {e}"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Debit transport error after send; outcome unknown");
                DebitOutcome::Unknown {
                    reason: format!("transport error: {e}"),
                }
            }
        }
    }
}

// =============================================================================
// Wire helpers
// =============================================================================

/// Extract a balance from the gamification points XML.
fn parse_points_xml(xml: &str) -> BalanceReading {
    POINTS_RE
        .captures(xml)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .map_or_else(
            || BalanceReading::Unavailable {
                reason: format!("no <points> element in response: {}", truncate(xml, 200)),
            },
            |points| BalanceReading::Known(Points::new(points)),
        )
}

/// Build the withdrawal request body.
fn withdraw_request_xml(ledger_user_id: &str, amount: Points, reason: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<withdrawGamificationPoints>
  <userId>{}</userId>
  <amount>{}</amount>
  <reason>{}</reason>
</withdrawGamificationPoints>"#,
        escape_xml(ledger_user_id),
        amount.as_i64(),
        escape_xml(reason),
    )
}

/// Escape XML text content.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_points_xml_known() {
        let xml = "<response><points>1250</points></response>";
        assert_eq!(
            parse_points_xml(xml),
            BalanceReading::Known(Points::new(1250))
        );
    }

    #[test]
    fn test_parse_points_xml_zero_is_known() {
        let xml = "<response><points>0</points></response>";
        assert_eq!(parse_points_xml(xml), BalanceReading::Known(Points::ZERO));
    }

    #[test]
    fn test_parse_points_xml_missing_element_is_unavailable() {
        let xml = "<response><status>ok</status></response>";
        assert!(matches!(
            parse_points_xml(xml),
            BalanceReading::Unavailable { .. }
        ));
    }

    #[test]
    fn test_parse_points_xml_garbage_is_unavailable() {
        assert!(matches!(
            parse_points_xml("<html>Sign in</html>"),
            BalanceReading::Unavailable { .. }
        ));
    }

    #[test]
    fn test_withdraw_xml_shape() {
        let xml = withdraw_request_xml("u-77", Points::new(300), "Order 12");
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains("<userId>u-77</userId>"));
        assert!(xml.contains("<amount>300</amount>"));
        assert!(xml.contains("<reason>Order 12</reason>"));
    }

    #[test]
    fn test_withdraw_xml_escapes_reason() {
        let xml = withdraw_request_xml("u-1", Points::new(10), "Gifts & <toys>");
        assert!(xml.contains("<reason>Gifts &amp; &lt;toys&gt;</reason>"));
    }

    #[test]
    fn test_constructed_urls() {
        let config = LedgerConfig {
            account_domain: "acme.example.com".to_string(),
            api_domain: "learn.example.com".to_string(),
            client_id: "id".to_string(),
            client_secret: SecretString::from("secret"),
        };
        let client = LedgerClient::new(&config);

        assert_eq!(
            client.inner.token_url,
            "https://acme.example.com/api/v3/token"
        );
        assert_eq!(
            client.inner.user_list_url,
            "https://learn.example.com/api/v2/user/list"
        );
        assert_eq!(
            client.inner.points_url,
            "https://api-learn.example.com/gamification/points"
        );
        assert_eq!(
            client.inner.withdraw_url,
            "https://api-learn.example.com/gamification/points/withdraw"
        );
    }
}
