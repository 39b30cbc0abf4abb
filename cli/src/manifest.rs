use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::CliError;

pub const DEFAULT_MANIFEST: &str = "literate.toml";

/// Project manifest: which documents make up the project and which ids to
/// build by default.
///
/// ```toml
/// documents = ["README.md", "docs/server.md"]
/// ids = ["backend"]
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Markdown documents, relative to the manifest, merged in order.
    #[serde(default)]
    pub documents: Vec<PathBuf>,

    /// Id filter applied to every document.
    #[serde(default)]
    pub ids: Vec<String>,

    /// Directory the manifest was loaded from.
    #[serde(skip)]
    root: PathBuf,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest: Manifest = toml::from_str(&content).map_err(|source| CliError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
        manifest.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        debug!(path = %path.display(), documents = manifest.documents.len(), "loaded manifest");
        Ok(manifest)
    }

    /// Document paths resolved against the manifest's directory.
    pub fn document_paths(&self) -> Vec<PathBuf> {
        self.documents.iter().map(|doc| self.root.join(doc)).collect()
    }
}
