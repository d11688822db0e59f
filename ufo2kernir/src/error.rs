use std::path::PathBuf;

use kernir::error::Error as IrError;
use norad::error::{DesignSpaceLoadError, FontLoadError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to load UFO {0:?}")]
    UfoLoad(PathBuf, #[source] FontLoadError),
    #[error("Unable to load designspace {0:?}")]
    DesignSpaceLoad(PathBuf, #[source] DesignSpaceLoadError),
    #[error("No source sits at the default location of {0:?}")]
    NoDefaultMaster(PathBuf),
    #[error("Designspace {0:?} has no sources")]
    NoSources(PathBuf),
    #[error("Failed to convert to IR")]
    IrError(#[from] IrError),
}
