//! OAuth2 access tokens for the Firestore REST API.
//!
//! Service accounts authenticate with the JWT-bearer grant: a short-lived
//! RS256 assertion signed with the account's private key is exchanged at the
//! key's `token_uri` for a bearer token. The token is cached and refreshed
//! when it gets close to expiry.
//!
//! Against the Firestore emulator no exchange happens; the emulator accepts
//! the fixed `owner` token.

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::credentials::{CredentialError, ServiceAccountKey};

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
pub const EMULATOR_TOKEN: &str = "owner";

const ASSERTION_LIFETIME_SECS: u64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Claims of the signed assertion sent to the token endpoint.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub scope: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
}

impl AssertionClaims {
    pub fn new(key: &ServiceAccountKey, issued_at: u64) -> Self {
        AssertionClaims {
            iss: key.client_email.clone(),
            sub: key.client_email.clone(),
            scope: DATASTORE_SCOPE.to_string(),
            aud: key.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        }
    }
}

/// Signs the JWT-bearer assertion for `key`, issued at `issued_at` (unix seconds).
pub fn sign_assertion(key: &ServiceAccountKey, issued_at: u64) -> Result<String, CredentialError> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key =
        EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(CredentialError::InvalidKey)?;
    jsonwebtoken::encode(&header, &AssertionClaims::new(key, issued_at), &encoding_key)
        .map_err(CredentialError::InvalidKey)
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// A bearer token and the instant it stops being usable.
#[derive(Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Exchanges a service-account key for an access token.
pub async fn fetch_token(
    http: &reqwest::Client,
    key: &ServiceAccountKey,
) -> Result<AccessToken, CredentialError> {
    let issued_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let assertion = sign_assertion(key, issued_at)?;

    info!(token_uri = %key.token_uri, "Requesting access token");
    let response = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .map_err(|e| {
            error!(error = ?e, token_uri = %key.token_uri, "Token request failed");
            CredentialError::Transport {
                token_uri: key.token_uri.clone(),
                source: e,
            }
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| CredentialError::Transport {
        token_uri: key.token_uri.clone(),
        source: e,
    })?;

    if !status.is_success() {
        error!(status = status.as_u16(), body = %body, "Token endpoint rejected credentials");
        return Err(CredentialError::Rejected {
            token_uri: key.token_uri.clone(),
            status: status.as_u16(),
            body,
        });
    }

    let token: TokenResponse =
        serde_json::from_str(&body).map_err(|e| CredentialError::MalformedToken {
            token_uri: key.token_uri.clone(),
            reason: e.to_string(),
        })?;
    if token.access_token.is_empty() {
        return Err(CredentialError::MalformedToken {
            token_uri: key.token_uri.clone(),
            reason: "empty access_token".to_string(),
        });
    }

    let lifetime = Duration::from_secs(token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS));
    debug!(expires_in_secs = lifetime.as_secs(), "Access token obtained");
    Ok(AccessToken {
        value: token.access_token,
        expires_at: Instant::now() + lifetime,
    })
}

/// Supplies the bearer token for each Firestore request.
pub enum Authenticator {
    ServiceAccount {
        key: ServiceAccountKey,
        http: reqwest::Client,
        cached: Mutex<Option<AccessToken>>,
    },
    Emulator,
}

impl Authenticator {
    pub fn service_account(key: ServiceAccountKey, http: reqwest::Client) -> Self {
        Authenticator::ServiceAccount {
            key,
            http,
            cached: Mutex::new(None),
        }
    }

    pub fn emulator() -> Self {
        Authenticator::Emulator
    }

    /// Returns a usable token, fetching a new one when the cache is empty or stale.
    pub async fn bearer_token(&self) -> Result<String, CredentialError> {
        match self {
            Authenticator::Emulator => Ok(EMULATOR_TOKEN.to_string()),
            Authenticator::ServiceAccount { key, http, cached } => {
                let mut cached = cached.lock().await;
                if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
                    return Ok(token.value.clone());
                }
                let token = fetch_token(http, key).await?;
                let value = token.value.clone();
                *cached = Some(token);
                Ok(value)
            }
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authenticator::ServiceAccount { key, .. } => f
                .debug_struct("ServiceAccount")
                .field("client_email", &key.client_email)
                .finish_non_exhaustive(),
            Authenticator::Emulator => f.write_str("Emulator"),
        }
    }
}
