//! Environment configuration helpers

use std::path::PathBuf;
use tracing::debug;

/// Load a `.env` file from the current directory or its parents
///
/// Returns the path that was loaded. A missing file is not an error; variables
/// already set in the process environment are never overwritten.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!(path = %path.display(), "Loaded .env");
            Some(path)
        }
        Err(e) => {
            debug!("No .env loaded: {}", e);
            None
        }
    }
}

/// Read an environment variable, treating blank values as unset
pub fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
