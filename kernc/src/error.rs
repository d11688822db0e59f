use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io failed for '{path}': '{source}'")]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unrecognized source {0}")]
    UnrecognizedSource(PathBuf),
    #[error("Missing file '{0}'")]
    FileExpected(PathBuf),
    #[error(transparent)]
    YamlSerError(#[from] serde_yaml::Error),
    #[error(transparent)]
    Source(#[from] ufo2kernir::error::Error),
    #[error(transparent)]
    Backend(#[from] kernbe::error::Error),
    #[error("{failed} of {total} sources failed")]
    SourcesFailed { failed: usize, total: usize },
}
