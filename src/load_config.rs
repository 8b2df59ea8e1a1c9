/// `load_config` module: resolves the Firebase project the seeder writes to.
///
/// The project id lives deep inside the FlutterFire `firebase.json` file at
/// `flutter.platforms.android.default.projectId`. Resolution never fails: a
/// missing or broken file, or a missing field, falls back to
/// [`DEFAULT_PROJECT_ID`].
///
/// # Errors
/// None are returned. Read and parse failures print a console line and are
/// logged at `error`; a missing field is logged at `warn` only.
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

/// Project used when `firebase.json` does not name one.
pub const DEFAULT_PROJECT_ID: &str = "migynaeblogs";

/// Config file read when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "firebase.json";

const PROJECT_ID_POINTER: &str = "/flutter/platforms/android/default/projectId";

/// Identifier of the destination Firebase project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        ProjectId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        ProjectId(DEFAULT_PROJECT_ID.to_string())
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reads the project id from a `firebase.json` file, falling back to the default.
pub fn resolve_project_id<P: AsRef<Path>>(path: P) -> ProjectId {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Resolving Firebase project from config file");

    let config: Value = match fs::read_to_string(path_ref)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
    {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, config_path = ?path_ref, "Failed to load Firebase config, using default project");
            eprintln!("❌ Could not read {}", path_ref.display());
            return ProjectId::default();
        }
    };

    project_id_from_config(&config).unwrap_or_else(|| {
        warn!(
            config_path = ?path_ref,
            default = DEFAULT_PROJECT_ID,
            "No projectId in Firebase config, using default project"
        );
        ProjectId::default()
    })
}

/// Extracts a non-empty `projectId` string from an already parsed config.
pub fn project_id_from_config(config: &Value) -> Option<ProjectId> {
    let id = config
        .pointer(PROJECT_ID_POINTER)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())?;
    info!(project_id = id, "Project id found in Firebase config");
    Some(ProjectId::new(id))
}
