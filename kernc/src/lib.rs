//! Writes a kern feature file for each UFO or designspace it is given.

mod args;
mod config;
mod error;

pub use args::Args;
pub use config::{load_options, Config};
pub use error::Error;

use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};

use kernir::source::KerningSource;
use log::{error, info};
use rayon::prelude::*;
use ufo2kernir::source::{DesignSpaceSource, UfoSource};

/// Load the kerning of a source, picking the reader by extension.
pub fn kerning_source(source: &Path) -> Result<Box<dyn KerningSource>, Error> {
    if !source.exists() {
        return Err(Error::FileExpected(source.to_path_buf()));
    }
    let ext = source
        .extension()
        .and_then(OsStr::to_str)
        .ok_or_else(|| Error::UnrecognizedSource(source.to_path_buf()))?;
    match ext {
        "designspace" => Ok(Box::new(DesignSpaceSource::load(source)?)),
        "ufo" => Ok(Box::new(UfoSource::load(source)?)),
        _ => Err(Error::UnrecognizedSource(source.to_path_buf())),
    }
}

/// Write the feature for one source, returning where it went.
///
/// Nothing is written if the source cannot be turned into a feature.
pub fn write_feature(config: &Config, source_path: &Path) -> Result<PathBuf, Error> {
    let source = kerning_source(source_path)?;
    let name = source_path
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("source");
    let feature = kernbe::write_kern_feature(name, source.as_ref(), &config.options)?;

    let output_file = config.output_file(source_path);
    fs::write(&output_file, feature.text).map_err(|source| Error::FileIo {
        path: output_file.clone(),
        source,
    })?;
    info!("Wrote {output_file:?}");
    Ok(output_file)
}

/// Write features for every source of the run, in parallel.
///
/// A failing source does not stop the others; the results come back in
/// the order of the sources.
pub fn run(config: &Config) -> Vec<Result<PathBuf, Error>> {
    config
        .args
        .sources
        .par_iter()
        .map(|source| {
            let result = write_feature(config, source);
            if let Err(e) = &result {
                error!("{source:?}: {e}");
            }
            result
        })
        .collect()
}
