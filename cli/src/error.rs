use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid manifest '{}': {source}", .path.display())]
    Manifest {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("no documents given and none listed in '{}'", .0.display())]
    NoDocuments(PathBuf),

    #[error("cannot encode result: {0}")]
    Json(#[from] serde_json::Error),
}
