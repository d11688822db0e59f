//! Types describing kerning as the writer sees it.

use std::{
    cmp::Ordering,
    fmt::{Display, Write},
    str::FromStr,
};

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use write_fonts::types::Tag;

use crate::{
    error::Error,
    types::{GlyphName, GroupName},
};

/// Groups as read from a source, raw name to members, in source order.
pub type RawGroups = IndexMap<SmolStr, Vec<GlyphName>>;

/// Kerning as read from a source; operands may still carry UFO3 group prefixes.
pub type RawKerning = IndexMap<(SmolStr, SmolStr), KernValue>;

/// One side of a kerning pair: either a single glyph or a group of glyphs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KernSide {
    Glyph(GlyphName),
    Group(GroupName),
}

/// A pair of kern sides, first (left in LTR) then second.
pub type KernPair = (KernSide, KernSide);

impl KernSide {
    pub fn name(&self) -> &str {
        match self {
            KernSide::Glyph(name) => name.as_str(),
            KernSide::Group(name) => name.as_str(),
        }
    }

    pub fn is_glyph(&self) -> bool {
        matches!(self, KernSide::Glyph(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self, KernSide::Group(_))
    }

    pub fn glyph_name(&self) -> Option<&GlyphName> {
        match self {
            KernSide::Glyph(name) => Some(name),
            KernSide::Group(_) => None,
        }
    }

    pub fn group_name(&self) -> Option<&GroupName> {
        match self {
            KernSide::Glyph(_) => None,
            KernSide::Group(name) => Some(name),
        }
    }
}

// Sides sort by name so that a sorted bucket reads like sorted feature text.
impl Ord for KernSide {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name()
            .cmp(other.name())
            .then_with(|| self.is_group().cmp(&other.is_group()))
    }
}

impl PartialOrd for KernSide {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Debug for KernSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Display for KernSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<GlyphName> for KernSide {
    fn from(value: GlyphName) -> Self {
        KernSide::Glyph(value)
    }
}

impl From<GroupName> for KernSide {
    fn from(value: GroupName) -> Self {
        KernSide::Group(value)
    }
}

/// The adjustment of a kerning pair.
///
/// Variable values hold one slot per source location; a slot is `None` when
/// the pair cannot exist at that location because one of its glyphs is absent
/// there.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KernValue {
    Static(OrderedFloat<f64>),
    Variable(Vec<Option<OrderedFloat<f64>>>),
}

impl KernValue {
    pub fn is_zero(&self) -> bool {
        match self {
            KernValue::Static(value) => value.0 == 0.0,
            KernValue::Variable(values) => values.iter().flatten().all(|v| v.0 == 0.0),
        }
    }

    /// The single value of a static adjustment.
    ///
    /// Variable adjustments have no single magnitude and return `None`.
    pub fn static_value(&self) -> Option<f64> {
        match self {
            KernValue::Static(value) => Some(value.0),
            KernValue::Variable(_) => None,
        }
    }

    /// Combine a value already stored for a pair with one arriving for the same pair.
    ///
    /// The incoming value wins; for variable values that holds per location,
    /// and locations where the incoming value is absent keep the prior one.
    pub fn merge(&self, incoming: &KernValue) -> KernValue {
        match (self, incoming) {
            (KernValue::Variable(prior), KernValue::Variable(new)) if prior.len() == new.len() => {
                KernValue::Variable(
                    prior
                        .iter()
                        .zip(new.iter())
                        .map(|(prior, new)| new.or(*prior))
                        .collect(),
                )
            }
            _ => incoming.clone(),
        }
    }

    /// Feature file syntax for this value.
    ///
    /// Variable values become a variable scalar, `(wght=100:-10 wght=900:-30)`,
    /// skipping locations where the value is absent.
    pub fn to_fea(&self, locations: &[Location]) -> String {
        match self {
            KernValue::Static(value) => format_number(value.0),
            KernValue::Variable(values) => {
                let mut buf = String::from("(");
                let mut first = true;
                for (location, value) in locations.iter().zip(values.iter()) {
                    let Some(value) = value else {
                        continue;
                    };
                    if !first {
                        buf.push(' ');
                    }
                    first = false;
                    let _ = write!(buf, "{location}:{}", format_number(value.0));
                }
                if first {
                    return "0".to_string();
                }
                buf.push(')');
                buf
            }
        }
    }
}

impl From<f64> for KernValue {
    fn from(value: f64) -> Self {
        KernValue::Static(value.into())
    }
}

impl From<i16> for KernValue {
    fn from(value: i16) -> Self {
        KernValue::Static((value as f64).into())
    }
}

/// Whole numbers are written without a decimal point.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// A position in user space, one coordinate per axis tag.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location(Vec<(Tag, OrderedFloat<f64>)>);

impl Location {
    pub fn new() -> Location {
        Default::default()
    }

    /// Add a coordinate, `tag` must be a valid OpenType tag.
    pub fn with(mut self, tag: &str, value: f64) -> Result<Location, Error> {
        let tag = Tag::from_str(tag).map_err(|_| Error::InvalidTag(tag.to_string()))?;
        self.0.push((tag, value.into()));
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tag, f64)> + '_ {
        self.0.iter().map(|(tag, value)| (*tag, value.0))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (tag, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char(',')?;
            }
            write!(f, "{tag}={}", format_number(value.0))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(name: &str) -> KernSide {
        KernSide::Glyph(name.into())
    }

    fn group(name: &str) -> KernSide {
        KernSide::Group(name.into())
    }

    #[test]
    fn sides_sort_by_name() {
        let mut sides = vec![glyph("a"), group("@MMK_L_A"), glyph("B"), glyph("Aacute")];
        sides.sort();
        assert_eq!(
            vec!["@MMK_L_A", "Aacute", "B", "a"],
            sides.iter().map(KernSide::name).collect::<Vec<_>>()
        );
    }

    #[test]
    fn whole_numbers_have_no_decimals() {
        assert_eq!("-80", format_number(-80.0));
        assert_eq!("12.5", format_number(12.5));
        assert_eq!("0", format_number(-0.0));
    }

    #[test]
    fn variable_zero_ignores_absent_locations() {
        assert!(KernValue::Variable(vec![Some(0.0.into()), None]).is_zero());
        assert!(!KernValue::Variable(vec![Some(0.0.into()), Some((-4.0).into())]).is_zero());
        assert!(KernValue::from(0.0).is_zero());
    }

    #[test]
    fn merge_keeps_prior_where_incoming_absent() {
        let prior = KernValue::Variable(vec![Some((-10.0).into()), Some((-20.0).into())]);
        let incoming = KernValue::Variable(vec![None, Some((-30.0).into())]);
        assert_eq!(
            KernValue::Variable(vec![Some((-10.0).into()), Some((-30.0).into())]),
            prior.merge(&incoming)
        );
        assert_eq!(KernValue::from(5.0), KernValue::from(3.0).merge(&5.0.into()));
    }

    #[test]
    fn variable_scalar_skips_absent() {
        let locations = vec![
            Location::new().with("wght", 100.0).unwrap(),
            Location::new().with("wght", 400.0).unwrap(),
            Location::new().with("wght", 900.0).unwrap(),
        ];
        let value = KernValue::Variable(vec![Some((-10.0).into()), None, Some((-30.5).into())]);
        assert_eq!("(wght=100:-10 wght=900:-30.5)", value.to_fea(&locations));
    }

    #[test]
    fn multi_axis_location() {
        let loc = Location::new()
            .with("wght", 700.0)
            .unwrap()
            .with("wdth", 75.0)
            .unwrap();
        assert_eq!("wght=700,wdth=75", loc.to_string());
    }

    #[test]
    fn bad_tag() {
        assert!(Location::new().with("weight", 1.0).is_err());
    }
}
