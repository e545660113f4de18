//! Template source selection and file loading

use crate::{BuiltinTemplate, PromptError, Result, ValuationTemplate};
use std::path::PathBuf;
use tracing::debug;

/// Where a valuation template comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// One of the embedded templates
    Builtin(BuiltinTemplate),
    /// A Jinja file on disk, read on [`TemplateSource::load`]
    File(PathBuf),
}

impl Default for TemplateSource {
    fn default() -> Self {
        TemplateSource::Builtin(BuiltinTemplate::default())
    }
}

impl TemplateSource {
    /// Read (if needed) and compile the template
    ///
    /// File templates are named after their file stem.
    pub fn load(&self) -> Result<ValuationTemplate> {
        match self {
            TemplateSource::Builtin(builtin) => builtin.template(),
            TemplateSource::File(path) => {
                debug!(path = %path.display(), "Loading template file");
                let content =
                    std::fs::read_to_string(path).map_err(|e| PromptError::FileLoadError {
                        path: path.display().to_string(),
                        detail: e.to_string(),
                    })?;

                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("template");
                ValuationTemplate::new(name, content)
            }
        }
    }
}

impl From<BuiltinTemplate> for TemplateSource {
    fn from(builtin: BuiltinTemplate) -> Self {
        TemplateSource::Builtin(builtin)
    }
}

impl From<PathBuf> for TemplateSource {
    fn from(path: PathBuf) -> Self {
        TemplateSource::File(path)
    }
}
