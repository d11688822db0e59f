//! [`KerningSource`] adapters for UFO and designspace.

use std::{collections::HashSet, path::Path};

use indexmap::IndexMap;
use log::{debug, info};
use norad::designspace::DesignSpaceDocument;
use ordered_float::OrderedFloat;
use smol_str::SmolStr;

use kernir::{
    groups::is_group,
    ir::{KernValue, Location, RawGroups, RawKerning},
    source::KerningSource,
    types::GlyphName,
};

use crate::{
    axes::{is_default, to_user_location, KernAxis},
    error::Error,
    toir::{
        lookup_kerning_value, to_glyph_set, to_master_kerning, to_raw_groups, to_raw_kerning,
        MasterKerning, SideGroups,
    },
};

fn load_ufo(path: &Path) -> Result<norad::Font, Error> {
    norad::Font::load(path).map_err(|e| Error::UfoLoad(path.to_path_buf(), e))
}

/// Kerning of a single UFO.
#[derive(Debug, Clone)]
pub struct UfoSource {
    glyphs: HashSet<GlyphName>,
    groups: RawGroups,
    kerning: RawKerning,
    postscript_font_name: Option<String>,
}

impl UfoSource {
    pub fn load(path: &Path) -> Result<UfoSource, Error> {
        let font = load_ufo(path)?;
        let source = UfoSource {
            glyphs: to_glyph_set(&font),
            groups: to_raw_groups(&font),
            kerning: to_raw_kerning(&to_master_kerning(&font)),
            postscript_font_name: font.font_info.postscript_font_name.clone(),
        };
        debug!(
            "{:?}: {} glyphs, {} groups, {} kerning pairs",
            path,
            source.glyphs.len(),
            source.groups.len(),
            source.kerning.len()
        );
        Ok(source)
    }
}

impl KerningSource for UfoSource {
    fn all_glyphs(&self) -> &HashSet<GlyphName> {
        &self.glyphs
    }

    fn groups(&self) -> &RawGroups {
        &self.groups
    }

    fn kerning(&self) -> &RawKerning {
        &self.kerning
    }

    fn postscript_font_name(&self) -> Option<&str> {
        self.postscript_font_name.as_deref()
    }
}

/// One master of a designspace.
struct Master {
    location: Location,
    glyphs: HashSet<GlyphName>,
    groups: RawGroups,
    kerning: MasterKerning,
}

impl Master {
    fn has_glyphs_of(&self, (first, second): (&str, &str)) -> bool {
        [first, second]
            .into_iter()
            .filter(|item| !is_group(item))
            .all(|glyph| self.glyphs.contains(glyph))
    }
}

/// Kerning of every master of a designspace, merged into variable values.
///
/// Glyph set, groups and font name come from the default master.
#[derive(Debug, Clone)]
pub struct DesignSpaceSource {
    glyphs: HashSet<GlyphName>,
    groups: RawGroups,
    kerning: RawKerning,
    postscript_font_name: Option<String>,
    locations: Vec<Location>,
}

impl DesignSpaceSource {
    pub fn load(path: &Path) -> Result<DesignSpaceSource, Error> {
        let designspace = DesignSpaceDocument::load(path)
            .map_err(|e| Error::DesignSpaceLoad(path.to_path_buf(), e))?;
        if designspace.sources.is_empty() {
            return Err(Error::NoSources(path.to_path_buf()));
        }
        let designspace_dir = path.parent().unwrap_or(Path::new("."));
        let axes: Vec<_> = designspace.axes.iter().map(KernAxis::new).collect();

        let mut masters = Vec::with_capacity(designspace.sources.len());
        let mut default_font = None;
        for source in designspace.sources.iter() {
            let font = load_ufo(&designspace_dir.join(&source.filename))?;
            let location = to_user_location(&axes, &source.location)?;
            if default_font.is_none() && is_default(&axes, &location) {
                default_font = Some((masters.len(), font.font_info.postscript_font_name.clone()));
            }
            debug!("Master {} at {location}", source.filename);
            masters.push(Master {
                location,
                glyphs: to_glyph_set(&font),
                groups: to_raw_groups(&font),
                kerning: to_master_kerning(&font),
            });
        }
        let Some((default_idx, postscript_font_name)) = default_font else {
            return Err(Error::NoDefaultMaster(path.to_path_buf()));
        };

        let kerning = merge_master_kerning(&masters, default_idx);
        info!(
            "{:?}: {} masters, {} kerning pairs",
            path,
            masters.len(),
            kerning.len()
        );
        let default = &masters[default_idx];
        Ok(DesignSpaceSource {
            glyphs: default.glyphs.clone(),
            groups: default.groups.clone(),
            kerning,
            postscript_font_name,
            locations: masters.iter().map(|m| m.location.clone()).collect(),
        })
    }
}

/// Union of the pairs of every master, default master first, each with one
/// value per master.
///
/// A master that lacks a pair gets the value its own kerning implies for it;
/// a master that lacks one of the pair's glyphs gets no value.
fn merge_master_kerning(masters: &[Master], default_idx: usize) -> RawKerning {
    let mut all_pairs: IndexMap<(SmolStr, SmolStr), ()> = IndexMap::new();
    let order = std::iter::once(default_idx).chain((0..masters.len()).filter(|i| *i != default_idx));
    for idx in order {
        all_pairs.extend(masters[idx].kerning.keys().map(|pair| (pair.clone(), ())));
    }

    let side_groups: Vec<_> = masters.iter().map(|m| SideGroups::new(&m.groups)).collect();
    all_pairs
        .into_keys()
        .map(|pair| {
            let key = (pair.0.as_str(), pair.1.as_str());
            let values = masters
                .iter()
                .zip(side_groups.iter())
                .map(|(master, groups)| {
                    if let Some(value) = master.kerning.get(&pair) {
                        return Some(OrderedFloat(*value));
                    }
                    if !master.has_glyphs_of(key) {
                        return None;
                    }
                    Some(OrderedFloat(lookup_kerning_value(key, &master.kerning, groups)))
                })
                .collect();
            (pair, KernValue::Variable(values))
        })
        .collect()
}

impl KerningSource for DesignSpaceSource {
    fn all_glyphs(&self) -> &HashSet<GlyphName> {
        &self.glyphs
    }

    fn groups(&self) -> &RawGroups {
        &self.groups
    }

    fn kerning(&self) -> &RawKerning {
        &self.kerning
    }

    fn postscript_font_name(&self) -> Option<&str> {
        self.postscript_font_name.as_deref()
    }

    fn locations(&self) -> &[Location] {
        &self.locations
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testdata_dir;

    fn pair(first: &str, second: &str) -> (SmolStr, SmolStr) {
        (first.into(), second.into())
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn variable(values: &[Option<f64>]) -> KernValue {
        KernValue::Variable(values.iter().map(|v| v.map(OrderedFloat)).collect())
    }

    #[test]
    fn ufo_kerning_and_groups() {
        init_logging();
        let source = UfoSource::load(&testdata_dir().join("kern_example.ufo")).unwrap();
        assert_eq!(Some("KernExample-Regular"), source.postscript_font_name());
        assert!(source.all_glyphs().contains("Aacute"));
        assert_eq!(
            Some(&vec![GlyphName::new("A"), GlyphName::new("Aacute")]),
            source.groups().get("public.kern1.A")
        );
        assert_eq!(
            Some(&KernValue::from(-80.0)),
            source.kerning().get(&pair("public.kern1.A", "public.kern2.V"))
        );
        assert_eq!(
            Some(&KernValue::from(-40.0)),
            source.kerning().get(&pair("Aacute", "V"))
        );
    }

    #[test]
    fn missing_ufo_is_an_error() {
        assert!(matches!(
            UfoSource::load(&testdata_dir().join("nope.ufo")),
            Err(Error::UfoLoad(..))
        ));
    }

    #[test]
    fn designspace_locations_are_userspace() {
        init_logging();
        let source = DesignSpaceSource::load(&testdata_dir().join("kern_var.designspace")).unwrap();
        assert_eq!(
            vec!["wght=300", "wght=700"],
            source
                .locations()
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
        );
        assert_eq!(Some("KernVar-Light"), source.postscript_font_name());
    }

    #[test]
    fn designspace_fills_missing_pairs_and_sparse_glyphs() {
        init_logging();
        let source = DesignSpaceSource::load(&testdata_dir().join("kern_var.designspace")).unwrap();
        let kerning = source.kerning();
        assert_eq!(
            Some(&variable(&[Some(-80.0), Some(-120.0)])),
            kerning.get(&pair("public.kern1.A", "public.kern2.V"))
        );
        // Bold has no Aacute
        assert_eq!(
            Some(&variable(&[Some(-40.0), None])),
            kerning.get(&pair("Aacute", "V"))
        );
        // Only Bold kerns T o, Light resolves it to zero
        assert_eq!(
            Some(&variable(&[Some(0.0), Some(-30.0)])),
            kerning.get(&pair("T", "o"))
        );
        assert_eq!(
            "(wght=300:-40)",
            source.value_string(kerning.get(&pair("Aacute", "V")).unwrap())
        );
    }
}
