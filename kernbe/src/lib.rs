//! Turns the kerning of a [`KerningSource`] into a kern feature file.
//!
//! The work happens in stages: [`sanitize`](sanitize::sanitize) drops what
//! refers to missing glyphs or groups, [`KernClassifier`] sorts the rest into
//! buckets, [`SubtablePartitioner`](subtables::SubtablePartitioner) splits the
//! large ones if asked to and [`FeatureEmitter`] writes the text.

pub mod classify;
pub mod error;
pub mod fea;
pub mod options;
pub mod sanitize;
pub mod subtables;

use log::{debug, info};

use kernir::source::KerningSource;

use crate::{
    classify::KernClassifier,
    error::Error,
    fea::{FeatureEmitter, KernFeature},
    options::KernOptions,
    sanitize::sanitize,
};

/// Write the kern feature for a source.
///
/// `name` identifies the source in errors.
pub fn write_kern_feature(
    name: &str,
    source: &dyn KerningSource,
    options: &KernOptions,
) -> Result<KernFeature, Error> {
    let kerning = source.kerning();
    if kerning.is_empty() {
        return Err(Error::NoKerning(name.to_string()));
    }
    if kerning.values().all(|value| value.is_zero()) {
        return Err(Error::AllKerningZero);
    }

    let sanitized = sanitize(source);
    let classifier = KernClassifier::new(source, sanitized, options);
    let classified = classifier.classify();
    debug!(
        "{name}: {} groups, {} pairs processed, {} skipped",
        classified.groups.len(),
        classified.processed,
        classified.unprocessed
    );
    let feature = FeatureEmitter::new(source, options).emit(&classified);
    info!("{name}: wrote kern feature, {} bytes", feature.text.len());
    Ok(feature)
}
