use thiserror::Error;

use crate::credentials::CredentialError;
use crate::upload::UploadError;

/// Result type alias for a seeding run
pub type Result<T, E = SeedError> = std::result::Result<T, E>;

/// Why a seeding run failed.
///
/// The two variants are the two failure tiers: credential problems stop the
/// run before any data is read, upload problems stop it part way through.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Firebase initialization error: {0}")]
    Credentials(#[from] CredentialError),

    #[error("Error uploading data: {0}")]
    Upload(#[from] UploadError),
}

impl SeedError {
    /// True for failures that happen before any write is attempted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SeedError::Credentials(_))
    }

    pub fn exit_code(&self) -> i32 {
        1
    }
}
