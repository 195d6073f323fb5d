//! Platform authentication: static bearer token or `OAuth2` client credentials.

use crate::error::{ApiError, ApiResult};
use reqwest::RequestBuilder;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Credentials used to obtain the bearer token.
///
/// The [`Debug`] impl redacts tokens and secrets.
#[derive(Clone)]
pub enum ApiCredentials {
    /// A pre-issued bearer token.
    Bearer { token: String },

    /// `OAuth2` client credentials grant against `token_endpoint`.
    ClientCredentials {
        client_id: String,
        client_secret: String,
        token_endpoint: String,
    },
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"[REDACTED]")
                .finish(),
            Self::ClientCredentials {
                client_id,
                token_endpoint,
                ..
            } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .field("token_endpoint", token_endpoint)
                .finish(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// Authentication handler shared by every API call.
///
/// The token obtained by [`ApiAuth::authenticate`] is cached and reused;
/// clones share the cache.
#[derive(Debug, Clone)]
pub struct ApiAuth {
    credentials: ApiCredentials,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    http_client: reqwest::Client,
}

impl ApiAuth {
    #[must_use]
    pub fn new(credentials: ApiCredentials, http_client: reqwest::Client) -> Self {
        Self {
            credentials,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Obtain the bearer credential up front.
    ///
    /// Called once before a batch starts so that bad credentials fail the
    /// process instead of every record.
    pub async fn authenticate(&self) -> ApiResult<()> {
        self.bearer_token().await.map(|_| ())
    }

    /// The bearer token to send, fetching a new one when none is cached.
    pub async fn bearer_token(&self) -> ApiResult<String> {
        match &self.credentials {
            ApiCredentials::Bearer { token } => Ok(token.clone()),
            ApiCredentials::ClientCredentials {
                client_id,
                client_secret,
                token_endpoint,
            } => {
                {
                    let cache = self.cached_token.read().await;
                    if let Some(cached) = cache.as_ref() {
                        if !cached.is_expired() {
                            return Ok(cached.access_token.clone());
                        }
                    }
                }

                debug!(token_endpoint = %token_endpoint, "Requesting client credentials token");
                let response = self
                    .http_client
                    .post(token_endpoint)
                    .basic_auth(client_id, Some(client_secret))
                    .form(&[("grant_type", "client_credentials")])
                    .send()
                    .await
                    .map_err(|e| ApiError::Auth(format!("token request failed: {e}")))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "<no body>".to_string());
                    return Err(ApiError::Auth(format!(
                        "token endpoint returned {status}: {body}"
                    )));
                }

                let token: TokenResponse = response
                    .json()
                    .await
                    .map_err(|e| ApiError::Auth(format!("failed to parse token response: {e}")))?;

                // Treat the token as expired 30s before the platform does.
                let expires_at = token
                    .expires_in
                    .map(|secs| Instant::now() + Duration::from_secs(secs.saturating_sub(30)));

                let access_token = token.access_token.clone();
                *self.cached_token.write().await = Some(CachedToken {
                    access_token: token.access_token,
                    expires_at,
                });

                info!(client_id = %client_id, "Obtained platform access token");
                Ok(access_token)
            }
        }
    }

    /// Attach the bearer credential to a request.
    pub async fn apply(&self, builder: RequestBuilder) -> ApiResult<RequestBuilder> {
        let token = self.bearer_token().await?;
        Ok(builder.bearer_auth(token))
    }

    /// Drop the cached token so the next call re-authenticates.
    pub async fn invalidate(&self) {
        *self.cached_token.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = ApiCredentials::ClientCredentials {
            client_id: "client-1".into(),
            client_secret: "s3cret".into(),
            token_endpoint: "https://login.example.com/oauth/token".into(),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("client-1"));
        assert!(!rendered.contains("s3cret"));

        let bearer = ApiCredentials::Bearer {
            token: "abc123".into(),
        };
        assert!(!format!("{bearer:?}").contains("abc123"));
    }

    #[tokio::test]
    async fn test_bearer_token_is_static() {
        let auth = ApiAuth::new(
            ApiCredentials::Bearer {
                token: "tok".into(),
            },
            reqwest::Client::new(),
        );
        assert_eq!(auth.bearer_token().await.unwrap(), "tok");
        auth.authenticate().await.unwrap();
    }

    #[test]
    fn test_cached_token_expiry() {
        let fresh = CachedToken {
            access_token: "a".into(),
            expires_at: Some(Instant::now() + Duration::from_secs(60)),
        };
        assert!(!fresh.is_expired());

        let never = CachedToken {
            access_token: "a".into(),
            expires_at: None,
        };
        assert!(!never.is_expired());
    }
}
