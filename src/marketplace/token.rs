//! eBay OAuth client-credentials token exchange.
//!
//! Auth: `POST {token_url}` with `Authorization: Basic base64(id:secret)`
//! and form body `grant_type=client_credentials&scope={scope}`.
//! The response JSON carries `access_token` and `expires_in` (seconds).
//!
//! A single attempt is made per run; any failure is an `Auth` error and
//! ends the run.

use anyhow::Context;
use async_trait::async_trait;
use base64::prelude::*;
use reqwest::{header, Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info};

use crate::config::{EbayConfig, EbayCredentials};
use crate::types::QuoteError;

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// Short-lived bearer token for the Browse API.
pub struct AccessToken {
    value: SecretString,
    pub expires_in_secs: Option<u64>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_in_secs: Option<u64>) -> Self {
        Self {
            value: SecretString::new(value.into()),
            expires_in_secs,
        }
    }

    pub fn bearer(&self) -> &str {
        self.value.expose_secret()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("expires_in_secs", &self.expires_in_secs)
            .finish()
    }
}

/// Exchanges credentials for a bearer token.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(&self) -> Result<AccessToken, QuoteError>;
}

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// eBay identity client holding injected credentials.
pub struct EbayTokenProvider {
    http: Client,
    token_url: String,
    scope: String,
    credentials: EbayCredentials,
}

impl EbayTokenProvider {
    pub fn new(cfg: &EbayConfig, credentials: EbayCredentials) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .user_agent(concat!("slabwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for eBay identity")?;

        Ok(Self {
            http,
            token_url: cfg.token_url.clone(),
            scope: cfg.scope.clone(),
            credentials,
        })
    }
}

#[async_trait]
impl TokenProvider for EbayTokenProvider {
    async fn fetch_token(&self) -> Result<AccessToken, QuoteError> {
        debug!(url = %self.token_url, client_id = %self.credentials.client_id, "Requesting eBay access token");

        let resp = self
            .http
            .post(&self.token_url)
            .header(header::AUTHORIZATION, basic_auth_header(&self.credentials))
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| QuoteError::Auth(format!("token endpoint unreachable: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| QuoteError::Auth(format!("failed to read token response: {e}")))?;

        let token = parse_token_response(status, &body)?;
        info!(expires_in_secs = ?token.expires_in_secs, "eBay authentication successful");
        Ok(token)
    }
}

/// `Basic base64(client_id:client_secret)`.
pub fn basic_auth_header(credentials: &EbayCredentials) -> String {
    let raw = format!("{}:{}", credentials.client_id, credentials.secret());
    format!("Basic {}", BASE64_STANDARD.encode(raw))
}

/// Interpret the token endpoint's reply.
fn parse_token_response(status: StatusCode, body: &str) -> Result<AccessToken, QuoteError> {
    let parsed: Option<TokenResponse> = serde_json::from_str(body).ok();

    if !status.is_success() {
        let detail = parsed
            .and_then(|r| r.error_description.or(r.error))
            .unwrap_or_else(|| body.chars().take(200).collect());
        return Err(QuoteError::Auth(format!("token endpoint returned {status}: {detail}")));
    }

    let parsed = parsed
        .ok_or_else(|| QuoteError::Auth("token response was not valid JSON".to_string()))?;

    match parsed.access_token {
        Some(token) if !token.is_empty() => Ok(AccessToken::new(token, parsed.expires_in)),
        _ => Err(QuoteError::Auth(
            "token response did not contain access_token".to_string(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
