//! Service-account key loading.
//!
//! The key file is the JSON document downloaded from the Firebase console
//! (`serviceAccountKey.json`). It is read once, handed to the
//! [`Authenticator`](crate::auth::Authenticator) and never logged: the
//! `Debug` impl redacts the key material.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Credential file read when no `--credentials` is given.
pub const DEFAULT_CREDENTIALS_FILE: &str = "serviceAccountKey.json";

/// Google's OAuth2 token endpoint, used when the key omits `token_uri`.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Anything that prevents building an authenticated client. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Cannot read credential file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential file {path} is not a valid service account key: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Credential file {path} has an empty `{field}` field")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("Invalid service account private key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    #[error("Invalid Firestore endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Token request to {token_uri} failed: {source}")]
    Transport {
        token_uri: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Credentials rejected by {token_uri} ({status}): {body}")]
    Rejected {
        token_uri: String,
        status: u16,
        body: String,
    },

    #[error("Malformed token response from {token_uri}: {reason}")]
    MalformedToken { token_uri: String, reason: String },
}

/// A Google service-account key as downloaded from the console.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Reads and validates a key file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CredentialError> {
        let path_ref = path.as_ref();
        info!(credentials_path = ?path_ref, "Loading service account key");

        let content = fs::read_to_string(path_ref).map_err(|e| {
            error!(error = ?e, credentials_path = ?path_ref, "Failed to read service account key");
            CredentialError::Read {
                path: path_ref.to_path_buf(),
                source: e,
            }
        })?;

        let key: ServiceAccountKey = serde_json::from_str(&content).map_err(|e| {
            error!(error = %e, credentials_path = ?path_ref, "Failed to parse service account key");
            CredentialError::Parse {
                path: path_ref.to_path_buf(),
                source: e,
            }
        })?;

        for (field, value) in [
            ("client_email", &key.client_email),
            ("private_key", &key.private_key),
            ("token_uri", &key.token_uri),
        ] {
            if value.trim().is_empty() {
                error!(credentials_path = ?path_ref, field, "Service account key field is empty");
                return Err(CredentialError::MissingField {
                    path: path_ref.to_path_buf(),
                    field,
                });
            }
        }

        info!(
            key_project = key.project_id.as_deref().unwrap_or("<none>"),
            "Service account key loaded"
        );
        Ok(key)
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}
