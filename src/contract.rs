//! # contract: storage interface for the seeding pipeline
//!
//! This module defines the single trait ([`DocumentStore`]) the upload loop
//! writes through. The production implementation is
//! [`FirestoreClient`](crate::firestore::FirestoreClient); tests substitute
//! the generated `MockDocumentStore` or a hand-written in-memory store.
//!
//! ## Semantics
//! - `set_merge` is an upsert: it creates the document when absent and
//!   otherwise overwrites only the fields present in `body`.
//! - Writes are independent and idempotent for identical input.
//! - Errors are boxed trait objects so any backend can report its own
//!   failure type.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; the mock is exported under the
//!   `test-export-mocks` feature so integration tests can use it.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde_json::Value;

/// Error returned by a [`DocumentStore`] write.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// A document database that supports merge-upserts keyed by collection and id.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write `body` to `collection/document_id`, merging into any existing document.
    ///
    /// `body` must be a JSON object; implementors reject anything else.
    async fn set_merge(
        &self,
        collection: &str,
        document_id: &str,
        body: &Value,
    ) -> Result<(), StoreError>;
}
