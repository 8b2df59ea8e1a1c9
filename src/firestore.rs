//! Firestore REST client: implements `DocumentStore` with set-with-merge
//! commits against Cloud Firestore or its emulator.
//!
//! [`FirestoreClient`] is the authenticated handle the seeder writes through.
//! It is built once by [`FirestoreClient::connect`], which authenticates
//! eagerly so bad credentials fail before any data is touched.
//!
//! ## Merge writes
//!
//! `set_merge` issues the same request the Firebase SDKs send for
//! `set(data, {merge: true})`: a single `documents:commit` write whose
//! `updateMask` lists every leaf field path of the body. Nested objects are
//! merged field by field; arrays and scalars replace whatever was stored.
//! Fields missing from the body are left alone.
//!
//! ## Endpoints
//!
//! - Production: `https://firestore.googleapis.com`, OAuth2 bearer tokens.
//! - Emulator: `http://$FIRESTORE_EMULATOR_HOST`, fixed `owner` token.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Url;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;
use tracing::{debug, error, info};

use crate::auth::Authenticator;
use crate::contract::{DocumentStore, StoreError};
use crate::credentials::{CredentialError, ServiceAccountKey};
use crate::load_config::ProjectId;

pub const PRODUCTION_BASE_URL: &str = "https://firestore.googleapis.com";
pub const EMULATOR_HOST_ENV: &str = "FIRESTORE_EMULATOR_HOST";

const DEFAULT_DATABASE: &str = "(default)";
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

static SIMPLE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex is valid"));

/// Where requests go and how they authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub base_url: String,
    pub emulator: bool,
}

impl Endpoints {
    pub fn production() -> Self {
        Endpoints {
            base_url: PRODUCTION_BASE_URL.to_string(),
            emulator: false,
        }
    }

    pub fn emulator(host: &str) -> Self {
        Endpoints {
            base_url: format!("http://{host}"),
            emulator: true,
        }
    }

    /// Production unless `FIRESTORE_EMULATOR_HOST` is set to something non-blank.
    pub fn from_env() -> Self {
        match std::env::var(EMULATOR_HOST_ENV) {
            Ok(host) if !host.trim().is_empty() => {
                info!(host = %host.trim(), "Using Firestore emulator");
                Endpoints::emulator(host.trim())
            }
            _ => Endpoints::production(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FirestoreError {
    #[error("Invalid document path {collection}/{document_id}: {reason}")]
    InvalidPath {
        collection: String,
        document_id: String,
        reason: &'static str,
    },

    #[error("Document {collection}/{document_id} must be a JSON object")]
    NotAnObject {
        collection: String,
        document_id: String,
    },

    #[error("Firestore request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Firestore returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Auth(#[from] CredentialError),
}

/// Authenticated Firestore handle bound to one project.
#[derive(Debug)]
pub struct FirestoreClient {
    http: reqwest::Client,
    commit_url: Url,
    project: ProjectId,
    auth: Authenticator,
}

impl FirestoreClient {
    /// Builds the client and proves the credentials work by fetching a token.
    pub async fn connect(
        project: ProjectId,
        key: ServiceAccountKey,
        endpoints: &Endpoints,
    ) -> Result<Self, CredentialError> {
        let commit_url = commit_url(&endpoints.base_url, &project)?;
        let http = reqwest::Client::new();
        let auth = if endpoints.emulator {
            Authenticator::emulator()
        } else {
            Authenticator::service_account(key, http.clone())
        };

        auth.bearer_token().await?;
        info!(
            project_id = %project,
            base_url = %endpoints.base_url,
            emulator = endpoints.emulator,
            "Firestore client initialised"
        );

        Ok(FirestoreClient {
            http,
            commit_url,
            project,
            auth,
        })
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    /// Full resource name of `collection/document_id` in this project.
    pub fn document_name(&self, collection: &str, document_id: &str) -> Result<String, FirestoreError> {
        for (segment, part) in [(collection, "collection name"), (document_id, "document id")] {
            let problem = if segment.is_empty() {
                Some("empty")
            } else if segment.contains('/') {
                Some("contains '/'")
            } else {
                None
            };
            if let Some(problem) = problem {
                error!(collection, document_id, part, problem, "Rejected document path");
                return Err(FirestoreError::InvalidPath {
                    collection: collection.to_string(),
                    document_id: document_id.to_string(),
                    reason: problem,
                });
            }
        }
        Ok(format!(
            "projects/{}/databases/{DEFAULT_DATABASE}/documents/{collection}/{document_id}",
            self.project
        ))
    }
}

fn commit_url(base_url: &str, project: &ProjectId) -> Result<Url, CredentialError> {
    let invalid = |reason: String| CredentialError::InvalidEndpoint {
        url: base_url.to_string(),
        reason,
    };
    let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("URL cannot carry a path".to_string()))?
        .pop_if_empty()
        .extend([
            "v1",
            "projects",
            project.as_str(),
            "databases",
            DEFAULT_DATABASE,
            "documents:commit",
        ]);
    Ok(url)
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn set_merge(
        &self,
        collection: &str,
        document_id: &str,
        body: &Value,
    ) -> Result<(), StoreError> {
        let fields = body.as_object().ok_or_else(|| FirestoreError::NotAnObject {
            collection: collection.to_string(),
            document_id: document_id.to_string(),
        })?;
        let name = self.document_name(collection, document_id)?;
        let mask = field_mask(fields);

        let payload = json!({
            "writes": [{
                "update": { "name": name, "fields": encode_fields(fields) },
                "updateMask": { "fieldPaths": mask },
            }]
        });

        let token = self.auth.bearer_token().await.map_err(FirestoreError::from)?;
        debug!(document = %name, field_paths = mask.len(), "Committing merge write");

        let response = self
            .http
            .post(self.commit_url.clone())
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(FirestoreError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(document = %name, status = status.as_u16(), body = %body, "Firestore rejected merge write");
            return Err(FirestoreError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        info!(document = %name, "Merge write committed");
        Ok(())
    }
}

/// Leaf field paths of `fields`, in document order, as a merge mask.
///
/// Nested objects contribute their own leaves; an empty nested object is a
/// leaf itself so it gets written as an empty map.
pub fn field_mask(fields: &Map<String, Value>) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths(fields, &mut Vec::new(), &mut paths);
    paths
}

fn collect_paths(fields: &Map<String, Value>, prefix: &mut Vec<String>, out: &mut Vec<String>) {
    for (key, value) in fields {
        prefix.push(quote_segment(key));
        match value {
            Value::Object(nested) if !nested.is_empty() => collect_paths(nested, prefix, out),
            _ => out.push(prefix.join(".")),
        }
        prefix.pop();
    }
}

/// Quotes a field path segment with backticks unless it is a plain identifier.
pub fn quote_segment(segment: &str) -> String {
    if SIMPLE_SEGMENT.is_match(segment) {
        return segment.to_string();
    }
    let escaped = segment.replace('\\', "\\\\").replace('`', "\\`");
    format!("`{escaped}`")
}

/// Converts a JSON object into Firestore's typed `fields` map.
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Converts one JSON value into a Firestore `Value`.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => json!({ "integerValue": i.to_string() }),
            (None, Some(f)) if is_safe_integer(f) => json!({ "integerValue": (f as i64).to_string() }),
            (None, Some(f)) => json!({ "doubleValue": f }),
            (None, None) => json!({ "stringValue": n.to_string() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Whole-valued floats such as `3.0` or `1e2` are stored as integers, like the
/// Firebase SDKs do for any safe JavaScript integer.
fn is_safe_integer(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER
}
