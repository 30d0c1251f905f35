//! Bearer token providers
//!
//! The dispatch engine treats token acquisition as an opaque collaborator:
//! anything implementing [`TokenProvider`] can authenticate Data API calls.
//! Two providers ship with the crate: a fixed token, and the OAuth2
//! client-credentials grant against the account manager.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{Error, Result};

/// Default account manager token endpoint
pub const DEFAULT_OAUTH_URL: &str = "https://account.demandware.com/dwsso/oauth2/access_token";

/// Tokens are refreshed this long before they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Source of a valid bearer token
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a token valid for at least the next request
    async fn bearer_token(&self) -> Result<String>;
}

/// Provider returning a fixed token
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Create a provider for a fixed token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// OAuth token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// Cached access token
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN >= self.expires_at
    }
}

/// OAuth2 client-credentials provider with an in-memory token cache
pub struct ClientCredentialsProvider {
    http_client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    current_token: RwLock<Option<CachedToken>>,
}

impl ClientCredentialsProvider {
    /// Create a provider for the given client
    #[must_use]
    pub fn new(
        http_client: Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            current_token: RwLock::new(None),
        }
    }

    /// Check if a cached, unexpired token is available
    pub fn has_valid_token(&self) -> bool {
        self.current_token
            .read()
            .as_ref()
            .is_some_and(|t| !t.is_expired())
    }

    /// Drop the cached token so the next call fetches a fresh one
    pub fn invalidate(&self) {
        *self.current_token.write() = None;
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            // Body may echo client details; report the status only.
            return Err(Error::Transport(format!("Token endpoint returned {status}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("Failed to parse token response: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(1800));
        info!(expires_in = lifetime.as_secs(), "Obtained Data API access token");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    async fn bearer_token(&self) -> Result<String> {
        {
            let token = self.current_token.read();
            if let Some(ref t) = *token {
                if !t.is_expired() {
                    return Ok(t.access_token.clone());
                }
            }
        }

        debug!("Access token missing or expiring, requesting a new one");
        let fresh = self.fetch_token().await?;
        let access_token = fresh.access_token.clone();
        *self.current_token.write() = Some(fresh);
        Ok(access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ClientCredentialsProvider {
        ClientCredentialsProvider::new(Client::new(), "http://127.0.0.1:9/token", "id", "secret")
    }

    #[tokio::test]
    async fn static_provider_returns_token() {
        let tokens = StaticTokenProvider::new("abc");
        assert_eq!(tokens.bearer_token().await.unwrap(), "abc");
    }

    #[test]
    fn new_provider_has_no_valid_token() {
        assert!(!provider().has_valid_token());
    }

    #[tokio::test]
    async fn cached_token_is_reused() {
        // GIVEN: a cached token far from expiry
        let tokens = provider();
        *tokens.current_token.write() = Some(CachedToken {
            access_token: "cached".to_string(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        });

        // THEN: no network round-trip is needed
        assert!(tokens.has_valid_token());
        assert_eq!(tokens.bearer_token().await.unwrap(), "cached");
    }

    #[test]
    fn token_inside_margin_counts_as_expired() {
        let tokens = provider();
        *tokens.current_token.write() = Some(CachedToken {
            access_token: "stale".to_string(),
            expires_at: Instant::now() + Duration::from_secs(30),
        });
        assert!(!tokens.has_valid_token());

        tokens.invalidate();
        assert!(tokens.current_token.read().is_none());
    }

    #[tokio::test]
    async fn unreachable_token_endpoint_is_transport_error() {
        let err = provider().bearer_token().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
