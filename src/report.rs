//! Exit reporting: turns a run outcome into console guidance and an exit code.
//!
//! The model is binary: `0` when every record was written, `1` for anything
//! else. Credential failures get setup instructions, upload failures get the
//! troubleshooting checklist.

use tracing::{error, info};

use crate::error::SeedError;
use crate::upload::UploadReport;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for an outcome, without printing anything.
pub fn exit_code<T>(outcome: &Result<T, SeedError>) -> i32 {
    match outcome {
        Ok(_) => EXIT_SUCCESS,
        Err(e) => e.exit_code(),
    }
}

/// Prints the guidance for `outcome` and returns its exit code.
pub fn report_outcome(outcome: &Result<UploadReport, SeedError>) -> i32 {
    match outcome {
        Ok(report) => {
            info!(uploaded = report.uploaded.len(), "Seeding run succeeded");
        }
        Err(e @ SeedError::Credentials(_)) => {
            error!(error = %e, "Seeding run failed before upload");
            eprintln!("❌ {e}");
            print_setup_instructions();
        }
        Err(e @ SeedError::Upload(upload)) => {
            error!(error = %e, committed = upload.committed(), "Seeding run aborted");
            eprintln!("❌ {e}");
            print_troubleshooting();
        }
    }
    exit_code(outcome)
}

pub fn print_setup_instructions() {
    println!("\n⚠️  SETUP REQUIRED:\n");
    println!("1. Create a service account key in the Firebase console:");
    println!("   Project settings > Service accounts > Generate new private key\n");
    println!("2. Save it next to this tool as:");
    println!("   serviceAccountKey.json\n");
    println!("3. Then run this tool again:");
    println!("   blog-seeder\n");
}

pub fn print_troubleshooting() {
    println!("\n⚠️  Troubleshooting:\n");
    println!("- Make sure firebase_data.json exists in this directory");
    println!("- Make sure firebase.json is valid");
    println!("- Make sure serviceAccountKey.json belongs to the target project");
    println!("- Check your internet connection\n");
}
