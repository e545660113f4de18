//! Writing results to the results directory

use crate::error::Result;
use crate::result::ValuationResult;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default results directory, relative to the working directory
pub const DEFAULT_RESULTS_DIR: &str = "data/result";

/// Writes rendered results as `<input stem>.<ext>`
#[derive(Debug, Clone)]
pub struct ResultWriter {
    dir: PathBuf,
}

impl Default for ResultWriter {
    fn default() -> Self {
        Self::new(DEFAULT_RESULTS_DIR)
    }
}

impl ResultWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Output path for an input file
    ///
    /// Sampled results get the sample number appended: `<stem>_<n>.<ext>`.
    pub fn path_for(&self, input_path: &Path, extension: &str, sample: Option<usize>) -> PathBuf {
        let stem = input_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "result".to_string());

        let file_name = match sample {
            Some(n) => format!("{stem}_{n}.{extension}"),
            None => format!("{stem}.{extension}"),
        };
        self.dir.join(file_name)
    }

    /// Render and write a result, creating the directory if needed
    pub async fn write(
        &self,
        input_path: &Path,
        result: &ValuationResult,
        sample: Option<usize>,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(input_path, result.output_extension(), sample);
        tokio::fs::write(&path, result.render()).await?;

        info!(path = %path.display(), "Wrote valuation result");
        Ok(path)
    }
}
