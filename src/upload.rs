//! Upload loop: writes every blog record to the `blogs` collection.
//!
//! This module drives the only real work the seeder does. Given a
//! [`DocumentStore`] and the data file, it:
//!   - Loads the `blogs` mapping (see [`crate::data`])
//!   - Issues one merge-upsert per record, in file order, awaiting each write
//!     before starting the next
//!   - Prints a progress transcript and returns a report of what was written
//!
//! # Error Handling
//! The loop is fail-fast. The first data or write error stops it; records
//! already written stay written, and the returned [`UploadError`] says how
//! many there were. Nothing is retried.
//!
//! # Navigation
//! - Main entrypoint: [`upload_blogs`]
//! - Writing an already loaded collection: [`upload_collection`]

use std::path::Path;
use tracing::{error, info};

use crate::contract::{DocumentStore, StoreError};
use crate::data::{self, BlogCollection, BlogSummary, DataError};

/// Firestore collection every record is written to.
pub const BLOGS_COLLECTION: &str = "blogs";

/// Ids of the records written, in write order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Failed to write {collection}/{document_id} after {committed} successful writes: {source}")]
    Write {
        collection: &'static str,
        document_id: String,
        committed: usize,
        #[source]
        source: StoreError,
    },
}

impl UploadError {
    /// Number of records written before the loop aborted.
    pub fn committed(&self) -> usize {
        match self {
            UploadError::Data(_) => 0,
            UploadError::Write { committed, .. } => *committed,
        }
    }
}

/// Loads the data file and uploads every record in it.
pub async fn upload_blogs<S>(store: &S, data_path: &Path) -> Result<UploadReport, UploadError>
where
    S: DocumentStore + ?Sized,
{
    println!("📁 Reading {}...", data_path.display());
    let blogs = data::load_blogs(data_path)?;
    println!("✅ JSON loaded successfully\n");
    println!("📊 Found blogs: {}\n", blogs.len());

    let report = upload_collection(store, &blogs).await?;

    println!("🎉 All data uploaded successfully!");
    println!("\n✨ You can now run the Flutter app with: flutter run\n");
    Ok(report)
}

/// Writes each record of `blogs` sequentially with merge semantics.
pub async fn upload_collection<S>(
    store: &S,
    blogs: &BlogCollection,
) -> Result<UploadReport, UploadError>
where
    S: DocumentStore + ?Sized,
{
    info!(records = blogs.len(), collection = BLOGS_COLLECTION, "[UPLOAD] Starting upload loop");
    let mut report = UploadReport::default();

    for (blog_id, body) in blogs {
        println!("📝 Uploading blog: {blog_id}...");

        if let Err(e) = store.set_merge(BLOGS_COLLECTION, blog_id, body).await {
            error!(
                blog_id = %blog_id,
                committed = report.uploaded.len(),
                error = %e,
                "[UPLOAD][ERROR] Write failed, aborting upload loop"
            );
            return Err(UploadError::Write {
                collection: BLOGS_COLLECTION,
                document_id: blog_id.clone(),
                committed: report.uploaded.len(),
                source: e,
            });
        }

        let summary = BlogSummary::of(body);
        info!(
            blog_id = %blog_id,
            title = summary.title(),
            content_blocks = summary.content_blocks,
            "[UPLOAD] Record written"
        );
        println!("✅ Successfully uploaded: {blog_id}");
        println!("   Title: {}", summary.title());
        println!("   Content Blocks: {}", summary.content_blocks);
        println!("   Read Time: {} mins\n", summary.read_time());

        report.uploaded.push(blog_id.clone());
    }

    info!(uploaded = report.uploaded.len(), "[UPLOAD] Upload loop complete");
    Ok(report)
}
