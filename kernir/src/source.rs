//! Generic model of a source of kerning.

use std::collections::HashSet;

use smol_str::SmolStr;

use crate::{
    error::Error,
    groups::is_group,
    ir::{KernValue, Location, RawGroups, RawKerning},
    types::GlyphName,
};

/// What the writer needs from a font source.
///
/// The adapter is chosen once, by whoever loads the source; the writer only
/// talks to this trait.
pub trait KerningSource {
    fn all_glyphs(&self) -> &HashSet<GlyphName>;

    fn groups(&self) -> &RawGroups;

    fn kerning(&self) -> &RawKerning;

    fn postscript_font_name(&self) -> Option<&str>;

    /// Locations of the slots of [`KernValue::Variable`] values, empty for static sources.
    fn locations(&self) -> &[Location] {
        &[]
    }

    /// The feature file spelling of a value.
    fn value_string(&self, value: &KernValue) -> String {
        value.to_fea(self.locations())
    }

    /// Resolve two values landing on the same pair.
    fn merge_values(&self, prior: &KernValue, incoming: &KernValue) -> KernValue {
        prior.merge(incoming)
    }
}

/// A source built in code, chiefly for tests and for callers that already
/// hold kerning in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    glyphs: HashSet<GlyphName>,
    groups: RawGroups,
    kerning: RawKerning,
    postscript_font_name: Option<String>,
    locations: Vec<Location>,
}

impl MemorySource {
    pub fn new() -> MemorySource {
        Default::default()
    }

    pub fn with_glyphs<I, N>(mut self, glyphs: I) -> MemorySource
    where
        I: IntoIterator<Item = N>,
        N: Into<GlyphName>,
    {
        self.glyphs.extend(glyphs.into_iter().map(Into::into));
        self
    }

    pub fn with_group(mut self, name: &str, members: &[&str]) -> MemorySource {
        self.groups.insert(
            name.into(),
            members.iter().map(|g| GlyphName::new(g)).collect(),
        );
        self
    }

    /// Add a pair; a pair added twice keeps the later value.
    pub fn with_pair(mut self, first: &str, second: &str, value: impl Into<KernValue>) -> MemorySource {
        self.kerning
            .insert((first.into(), second.into()), value.into());
        self
    }

    pub fn with_postscript_font_name(mut self, name: &str) -> MemorySource {
        self.postscript_font_name = Some(name.to_string());
        self
    }

    pub fn with_locations(mut self, locations: Vec<Location>) -> MemorySource {
        self.locations = locations;
        self
    }

    /// Add a pair with one value per location, `None` where the pair is absent.
    pub fn with_variable_pair(
        self,
        first: &str,
        second: &str,
        values: &[Option<f64>],
    ) -> Result<MemorySource, Error> {
        if values.len() != self.locations.len() {
            return Err(Error::ValueCountMismatch {
                expected: self.locations.len(),
                actual: values.len(),
            });
        }
        let value = KernValue::Variable(values.iter().map(|v| v.map(Into::into)).collect());
        Ok(self.with_pair(first, second, value))
    }

    /// Treat every glyph that groups or pairs mention as present in the font.
    pub fn with_implied_glyphs(mut self) -> MemorySource {
        let from_groups = self.groups.values().flatten().cloned();
        let from_pairs = self
            .kerning
            .keys()
            .flat_map(|(first, second)| [first, second])
            .filter(|item| !is_group(item))
            .map(|item| GlyphName::from(SmolStr::clone(item)));
        let implied: Vec<_> = from_groups.chain(from_pairs).collect();
        self.glyphs.extend(implied);
        self
    }
}

impl KerningSource for MemorySource {
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
    use super::*;

    #[test]
    fn implied_glyphs_skip_groups() {
        let source = MemorySource::new()
            .with_group("public.kern1.A", &["A", "Aacute"])
            .with_pair("public.kern1.A", "V", -80.0)
            .with_pair("T", "o", -40.0)
            .with_implied_glyphs();
        let mut glyphs: Vec<_> = source.all_glyphs().iter().map(GlyphName::as_str).collect();
        glyphs.sort();
        assert_eq!(vec!["A", "Aacute", "T", "V", "o"], glyphs);
    }

    #[test]
    fn later_pair_wins() {
        let source = MemorySource::new()
            .with_pair("T", "o", -40.0)
            .with_pair("T", "o", -50.0);
        assert_eq!(1, source.kerning().len());
        assert_eq!(
            Some(&KernValue::from(-50.0)),
            source.kerning().get(&(SmolStr::new("T"), SmolStr::new("o")))
        );
    }

    #[test]
    fn variable_pair_needs_a_value_per_location() {
        let source = MemorySource::new().with_locations(vec![
            Location::new().with("wght", 100.0).unwrap(),
            Location::new().with("wght", 900.0).unwrap(),
        ]);
        assert!(source
            .clone()
            .with_variable_pair("T", "o", &[Some(-10.0)])
            .is_err());
        let source = source
            .with_variable_pair("T", "o", &[Some(-10.0), None])
            .unwrap();
        let value = source.kerning().values().next().unwrap();
        assert_eq!("(wght=100:-10)", source.value_string(value));
    }
}
