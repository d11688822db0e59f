//! Conversions from norad types to kerning IR.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use smol_str::SmolStr;

use kernir::{
    groups::{is_group, KERN1_PREFIX, KERN2_PREFIX},
    ir::{KernValue, RawGroups, RawKerning},
    types::GlyphName,
};

/// Kerning of a single master, raw operand names to value.
pub(crate) type MasterKerning = IndexMap<(SmolStr, SmolStr), f64>;

pub(crate) fn to_glyph_set(font: &norad::Font) -> HashSet<GlyphName> {
    font.default_layer()
        .iter()
        .map(|glyph| GlyphName::new(glyph.name().as_str()))
        .collect()
}

pub(crate) fn to_raw_groups(font: &norad::Font) -> RawGroups {
    font.groups
        .iter()
        .map(|(name, members)| {
            (
                SmolStr::new(name.as_str()),
                members.iter().map(|g| GlyphName::new(g.as_str())).collect(),
            )
        })
        .collect()
}

pub(crate) fn to_master_kerning(font: &norad::Font) -> MasterKerning {
    font.kerning
        .iter()
        .flat_map(|(first, seconds)| {
            seconds.iter().map(move |(second, value)| {
                (
                    (SmolStr::new(first.as_str()), SmolStr::new(second.as_str())),
                    *value,
                )
            })
        })
        .collect()
}

pub(crate) fn to_raw_kerning(kerning: &MasterKerning) -> RawKerning {
    kerning
        .iter()
        .map(|(pair, value)| (pair.clone(), KernValue::from(*value)))
        .collect()
}

/// Glyph to the first/second side kerning group it belongs to.
pub(crate) struct SideGroups<'a> {
    side1: HashMap<&'a str, &'a str>,
    side2: HashMap<&'a str, &'a str>,
}

impl<'a> SideGroups<'a> {
    pub(crate) fn new(groups: &'a RawGroups) -> SideGroups<'a> {
        let side = move |prefix: &'static str| {
            groups
                .iter()
                .filter(move |(name, _)| name.starts_with(prefix))
                .flat_map(|(name, glyphs)| glyphs.iter().map(move |g| (g.as_str(), name.as_str())))
                .collect::<HashMap<_, _>>()
        };
        SideGroups {
            side1: side(KERN1_PREFIX),
            side2: side(KERN2_PREFIX),
        }
    }
}

/// The value a pair has in a master that does not list it, as a UFO kerning
/// lookup would resolve it.
pub(crate) fn lookup_kerning_value(
    (first, second): (&str, &str),
    kerning: &MasterKerning,
    groups: &SideGroups,
) -> f64 {
    // if already a group, return it, else look for group for glyph
    fn group_if_glyph<'a>(side: &'a str, map: &HashMap<&'a str, &'a str>) -> Option<&'a str> {
        if is_group(side) {
            Some(side)
        } else {
            map.get(side).copied()
        }
    }

    let first_group = group_if_glyph(first, &groups.side1);
    let second_group = group_if_glyph(second, &groups.side2);
    let first = Some(first).filter(|side| !is_group(side));
    let second = Some(second).filter(|side| !is_group(side));

    // for each side: a group is only checked as itself, a glyph is checked
    // as itself and via the group containing it
    for (first, second) in [
        (first, second_group),
        (first_group, second),
        (first_group, second_group),
    ] {
        if let Some((first, second)) = first.zip(second) {
            if let Some(value) = kerning.get(&(SmolStr::new(first), SmolStr::new(second))) {
                return *value;
            }
        }
    }

    // then fallback to zero
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kerning(pairs: &[(&str, &str, f64)]) -> MasterKerning {
        pairs
            .iter()
            .map(|(a, b, v)| ((SmolStr::new(a), SmolStr::new(b)), *v))
            .collect()
    }

    fn groups() -> RawGroups {
        [
            ("public.kern1.A", vec!["A", "Aacute"]),
            ("public.kern2.V", vec!["V", "W"]),
        ]
        .into_iter()
        .map(|(name, glyphs)| {
            (
                SmolStr::new(name),
                glyphs.into_iter().map(GlyphName::new).collect(),
            )
        })
        .collect()
    }

    #[test]
    fn lookup_prefers_glyph_over_group() {
        let groups = groups();
        let side_groups = SideGroups::new(&groups);
        let kerning = kerning(&[
            ("public.kern1.A", "public.kern2.V", -80.0),
            ("Aacute", "public.kern2.V", -60.0),
            ("public.kern1.A", "W", -70.0),
        ]);
        assert_eq!(-60.0, lookup_kerning_value(("Aacute", "V"), &kerning, &side_groups));
        assert_eq!(-70.0, lookup_kerning_value(("A", "W"), &kerning, &side_groups));
        assert_eq!(-80.0, lookup_kerning_value(("A", "V"), &kerning, &side_groups));
    }

    #[test]
    fn lookup_falls_back_to_zero() {
        let groups = groups();
        let side_groups = SideGroups::new(&groups);
        let kerning = kerning(&[("public.kern1.A", "public.kern2.V", -80.0)]);
        assert_eq!(0.0, lookup_kerning_value(("T", "o"), &kerning, &side_groups));
        // a group operand is never widened to another group
        assert_eq!(
            0.0,
            lookup_kerning_value(("public.kern1.A", "T"), &kerning, &side_groups)
        );
    }
}
