//! Blog data file loading.
//!
//! The data file holds a single `blogs` object mapping record ids to record
//! bodies. Bodies are opaque: they are written to Firestore untouched, and
//! only a few fields are peeked at for the progress transcript.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Data file read when no `--data` is given.
pub const DEFAULT_DATA_FILE: &str = "firebase_data.json";

/// Record id → record body, in file order.
pub type BlogCollection = IndexMap<String, Value>;

#[derive(Debug, Deserialize)]
struct BlogData {
    blogs: BlogCollection,
}

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Cannot read data file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid data file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads `path` and returns its `blogs` mapping.
pub fn load_blogs<P: AsRef<Path>>(path: P) -> Result<BlogCollection, DataError> {
    let path_ref = path.as_ref();
    info!(data_path = ?path_ref, "Loading blog data");

    let content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, data_path = ?path_ref, "Failed to read blog data file");
        DataError::Read {
            path: path_ref.to_path_buf(),
            source: e,
        }
    })?;

    let data: BlogData = serde_json::from_str(&content).map_err(|e| {
        error!(error = %e, data_path = ?path_ref, "Failed to parse blog data file");
        DataError::Parse {
            path: path_ref.to_path_buf(),
            source: e,
        }
    })?;

    info!(data_path = ?path_ref, blogs = data.blogs.len(), "Blog data loaded");
    Ok(data.blogs)
}

/// The fields of a record body shown in the upload transcript.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlogSummary<'a> {
    pub title: Option<&'a str>,
    pub content_blocks: usize,
    pub read_time_minutes: Option<&'a Value>,
}

impl<'a> BlogSummary<'a> {
    pub fn of(body: &'a Value) -> Self {
        BlogSummary {
            title: body.get("title").and_then(Value::as_str),
            content_blocks: body
                .get("contentBlocks")
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
            read_time_minutes: body.get("readTimeMinutes"),
        }
    }

    pub fn title(&self) -> &str {
        self.title.unwrap_or(MISSING)
    }

    pub fn read_time(&self) -> ReadTime<'a> {
        ReadTime(self.read_time_minutes)
    }
}

const MISSING: &str = "(missing)";

/// Renders `readTimeMinutes` as written in the file: strings without quotes.
pub struct ReadTime<'a>(Option<&'a Value>);

impl fmt::Display for ReadTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => f.write_str(MISSING),
            Some(Value::String(s)) => f.write_str(s),
            Some(other) => write!(f, "{other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_reads_transcript_fields() {
        let body = json!({ "title": "A", "contentBlocks": [1, 2], "readTimeMinutes": 3 });
        let summary = BlogSummary::of(&body);
        assert_eq!(summary.title(), "A");
        assert_eq!(summary.content_blocks, 2);
        assert_eq!(summary.read_time().to_string(), "3");
    }

    #[test]
    fn summary_defaults_missing_fields() {
        let body = json!({ "contentBlocks": "not a list" });
        let summary = BlogSummary::of(&body);
        assert_eq!(summary.title(), "(missing)");
        assert_eq!(summary.content_blocks, 0);
        assert_eq!(summary.read_time().to_string(), "(missing)");
    }

    #[test]
    fn read_time_prints_strings_bare() {
        let body = json!({ "readTimeMinutes": "5" });
        assert_eq!(BlogSummary::of(&body).read_time().to_string(), "5");
    }
}
