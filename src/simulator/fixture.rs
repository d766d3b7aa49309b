//! Dataset fixtures on disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AuditError, AuditResult};
use crate::models::Dataset;

use super::DatasetSource;

/// Encoding of a fixture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureFormat {
    /// YAML (`.yaml`, `.yml`).
    Yaml,
    /// JSON (`.json`).
    Json,
}

impl FixtureFormat {
    /// Infers the format from the file extension. Unknown extensions are
    /// read as YAML, which also accepts JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => FixtureFormat::Json,
            _ => FixtureFormat::Yaml,
        }
    }
}

/// A dataset stored in a YAML or JSON file with one list per table.
///
/// ```text
/// workers:
///   - worker_id: W1
///     name: Asha Rao
///     joined_at: 2024-06-01T09:00:00Z
///     current_status: active
/// orders: [...]
/// termination_status: [...]
/// termination_logs: [...]
/// review_counts: [...]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSource {
    path: PathBuf,
    format: FixtureFormat,
}

impl FixtureSource {
    /// A fixture at `path`, format inferred from its extension.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = FixtureFormat::from_path(&path);
        Self { path, format }
    }

    /// Overrides the inferred format.
    pub fn with_format(mut self, format: FixtureFormat) -> Self {
        self.format = format;
        self
    }

    /// The fixture path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_error(&self, message: impl ToString) -> AuditError {
        AuditError::DatasetLoad {
            path: self.path.display().to_string(),
            message: message.to_string(),
        }
    }
}

impl DatasetSource for FixtureSource {
    fn describe(&self) -> String {
        format!("fixture {}", self.path.display())
    }

    fn load(&self) -> AuditResult<Dataset> {
        let content = fs::read_to_string(&self.path).map_err(|e| self.load_error(e))?;
        match self.format {
            FixtureFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| self.load_error(e)),
            FixtureFormat::Json => serde_json::from_str(&content).map_err(|e| self.load_error(e)),
        }
    }
}
