///
/// This module implements the CLI interface for blog-seeder: argument parsing
/// and the stage-by-stage driver shared by `main()` and the integration tests.
///
/// ## Pipeline
/// 1. Resolve the project id from `firebase.json` ([`resolve_project_id`]).
/// 2. Load the service-account key and connect ([`FirestoreClient::connect`]).
///    Failure here is fatal and happens before any data is read.
/// 3. Load the data file and upload every blog ([`upload_blogs`]).
///
/// Every stage returns a typed result; [`run`] propagates them as
/// [`crate::error::SeedError`] and leaves exit-code mapping to [`crate::report`].
///
/// ## How To Use
/// - For command-line users: run the `blog-seeder` binary, optionally with `--help`.
/// - For programmatic/integration use: call [`run`] or [`run_with`] with a constructed [`Cli`].
use clap::Parser;
use std::path::PathBuf;

use crate::credentials::{ServiceAccountKey, DEFAULT_CREDENTIALS_FILE};
use crate::data::DEFAULT_DATA_FILE;
use crate::error::Result;
use crate::firestore::{Endpoints, FirestoreClient};
use crate::load_config::{resolve_project_id, DEFAULT_CONFIG_FILE};
use crate::upload::{upload_blogs, UploadReport};

/// CLI for blog-seeder: load blog records into Firestore.
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "blog-seeder",
    version,
    about = "Seed the Firestore `blogs` collection from a local JSON file using merge-upserts"
)]
pub struct Cli {
    /// FlutterFire config holding flutter.platforms.android.default.projectId.
    /// Relative paths resolve against the current working directory.
    #[clap(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Service account key downloaded from the Firebase console.
    /// Relative paths resolve against the current working directory.
    #[clap(long, default_value = DEFAULT_CREDENTIALS_FILE)]
    pub credentials: PathBuf,

    /// JSON file with a top-level `blogs` object.
    /// Relative paths resolve against the current working directory.
    #[clap(long, default_value = DEFAULT_DATA_FILE)]
    pub data: PathBuf,
}

impl Default for Cli {
    fn default() -> Self {
        Cli {
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
            credentials: PathBuf::from(DEFAULT_CREDENTIALS_FILE),
            data: PathBuf::from(DEFAULT_DATA_FILE),
        }
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<UploadReport> {
    run_with(cli, &Endpoints::from_env()).await
}

/// Same as [`run`], against explicit Firestore endpoints.
pub async fn run_with(cli: Cli, endpoints: &Endpoints) -> Result<UploadReport> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let project = resolve_project_id(&cli.config);
    println!("\n📱 Firebase Project: {project}\n");

    let key = ServiceAccountKey::from_file(&cli.credentials)?;
    let client = FirestoreClient::connect(project, key, endpoints).await?;
    tracing::info!(project_id = %client.project(), "Credentials accepted, starting upload");

    let report = upload_blogs(&client, &cli.data).await?;
    tracing::info!(uploaded = report.uploaded.len(), "Upload finished");
    Ok(report)
}
