//! Settings of a single kernc run

use std::{
    fs,
    path::{Path, PathBuf},
};

use kernbe::options::KernOptions;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{Args, Error};

/// The arguments of a run and the options they resolve to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub args: Args,
    pub options: KernOptions,
}

impl Config {
    /// Resolve options from the config file if one is given, else from the flags.
    pub fn new(args: Args) -> Result<Config, Error> {
        let options = match args.config.as_deref() {
            Some(path) => load_options(path)?,
            None => args.kern_options(),
        };
        Ok(Config { args, options })
    }

    /// Where the feature for `source` goes: next to it, under the output name.
    pub fn output_file(&self, source: &Path) -> PathBuf {
        let dir = source.parent().unwrap_or(Path::new("."));
        dir.join(&self.args.output_name)
    }
}

/// Read [`KernOptions`] from YAML; absent keys take their defaults.
pub fn load_options(path: &Path) -> Result<KernOptions, Error> {
    if !path.is_file() {
        return Err(Error::FileExpected(path.to_path_buf()));
    }
    let yml = fs::read_to_string(path).map_err(|source| Error::FileIo {
        path: path.to_path_buf(),
        source,
    })?;
    let options = serde_yaml::from_str(&yml)?;
    info!("Options from {path:?}: {options:?}");
    Ok(options)
}
