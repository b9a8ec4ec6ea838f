//! Google service-account authentication for the Firestore REST API

use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::DomainError;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Service-account key as downloaded from the Google Cloud console
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"[hidden]")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parse a service-account key from its JSON text
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        serde_json::from_str(json).map_err(|e| {
            DomainError::credential(format!("Invalid service account credentials: {}", e))
        })
    }

    /// Read a service-account key from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            DomainError::credential(format!(
                "Failed to read credentials file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&json)
    }

    /// Load credentials from an environment variable holding the JSON blob,
    /// falling back to a file on disk
    pub fn load(env_var: &str, path: impl AsRef<Path>) -> Result<Self, DomainError> {
        match std::env::var(env_var) {
            Ok(json) if !json.trim().is_empty() => {
                debug!(env_var = %env_var, "Loading service account from environment");
                Self::from_json(&json)
            }
            _ => {
                debug!(path = %path.as_ref().display(), "Loading service account from file");
                Self::from_file(path)
            }
        }
    }
}

/// Supplies the `Authorization` header value for Firestore requests
#[async_trait]
pub trait TokenProvider: Send + Sync + Debug {
    async fn authorization(&self) -> Result<String, DomainError>;
}

/// Fixed token, used against the Firestore emulator
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    header: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            header: format!("Bearer {}", token.into()),
        }
    }

    /// The emulator accepts the literal `owner` token and bypasses security rules
    pub fn emulator() -> Self {
        Self::new("owner")
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn authorization(&self) -> Result<String, DomainError> {
        Ok(self.header.clone())
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    header: String,
    expires_at: DateTime<Utc>,
}

/// Exchanges a signed service-account assertion for an OAuth2 access token
///
/// The token is cached and refreshed shortly before it expires.
pub struct ServiceAccountTokenProvider {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    http: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
}

impl Debug for ServiceAccountTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountTokenProvider")
            .field("key", &self.key)
            .field("encoding_key", &"[hidden]")
            .finish()
    }
}

impl ServiceAccountTokenProvider {
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Result<Self, DomainError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            DomainError::credential(format!("Invalid service account private key: {}", e))
        })?;

        Ok(Self {
            key,
            encoding_key,
            http,
            cached: RwLock::new(None),
        })
    }

    fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, DomainError> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| DomainError::credential(format!("Failed to sign assertion: {}", e)))
    }

    async fn fetch_token(&self) -> Result<CachedToken, DomainError> {
        let now = Utc::now();
        let assertion = self.sign_assertion(now)?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| DomainError::credential(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::credential(format!(
                "Token exchange rejected: HTTP {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DomainError::credential(format!("Invalid token response: {}", e)))?;

        debug!(expires_in = token.expires_in, "Obtained Firestore access token");

        Ok(CachedToken {
            header: format!("Bearer {}", token.access_token),
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn authorization(&self) -> Result<String, DomainError> {
        let fresh_until = Utc::now() + Duration::seconds(REFRESH_MARGIN_SECS);

        if let Some(token) = self.cached.read().await.as_ref() {
            if token.expires_at > fresh_until {
                return Ok(token.header.clone());
            }
        }

        let mut cached = self.cached.write().await;

        // Another request may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref() {
            if token.expires_at > fresh_until {
                return Ok(token.header.clone());
            }
        }

        let token = self.fetch_token().await?;
        let header = token.header.clone();
        *cached = Some(token);

        Ok(header)
    }
}
