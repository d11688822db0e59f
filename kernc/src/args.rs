//! Command line arguments

use std::path::PathBuf;

use clap::Parser;
use kernbe::options::{KernOptions, DEFAULT_MIN_VALUE, DEFAULT_SUBTABLE_SIZE};
use serde::{Deserialize, Serialize};

/// Which kerning shall we write a feature for?
#[derive(Serialize, Deserialize, Parser, Debug, Clone, PartialEq)]
pub struct Args {
    /// UFOs or designspaces
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Pairs whose value is below this (in absolute terms) are trimmed
    #[arg(long)]
    #[clap(default_value_t = DEFAULT_MIN_VALUE)]
    pub min_value: u32,

    /// Split large lookups into subtables
    #[arg(long)]
    #[clap(default_value = "false")]
    pub write_subtables: bool,

    /// Estimated maximum size of a subtable, in bytes
    #[arg(long)]
    #[clap(default_value_t = DEFAULT_SUBTABLE_SIZE)]
    pub subtable_size: usize,

    /// Write trimmed pairs to the output file, commented out
    #[arg(long)]
    #[clap(default_value = "false")]
    pub write_trimmed_pairs: bool,

    /// Dissolve groups holding a single glyph
    #[arg(long)]
    #[clap(default_value = "false")]
    pub dissolve_single: bool,

    /// Ignore pairs with an operand ending in this suffix
    #[arg(long)]
    pub ignore_suffix: Option<String>,

    /// Write when the file was created into its header
    #[arg(long)]
    #[clap(default_value = "false")]
    pub write_timestamp: bool,

    /// Name of the output file, written next to each source
    #[arg(long)]
    #[clap(default_value = "kern.fea")]
    pub output_name: PathBuf,

    /// A YAML file of options; replaces the option flags
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// The options the flags describe.
    pub fn kern_options(&self) -> KernOptions {
        KernOptions {
            min_value: self.min_value,
            write_subtables: self.write_subtables,
            subtable_size: self.subtable_size,
            write_trimmed_pairs: self.write_trimmed_pairs,
            dissolve_single: self.dissolve_single,
            ignore_suffix: self.ignore_suffix.clone(),
            write_timestamp: self.write_timestamp,
        }
    }

    /// Manually create args for testing
    #[cfg(test)]
    pub fn for_test(sources: &[PathBuf], output_name: PathBuf) -> Args {
        Args {
            sources: sources.to_vec(),
            min_value: DEFAULT_MIN_VALUE,
            write_subtables: false,
            subtable_size: DEFAULT_SUBTABLE_SIZE,
            write_trimmed_pairs: false,
            dissolve_single: false,
            ignore_suffix: None,
            write_timestamp: false,
            output_name,
            config: None,
        }
    }
}
