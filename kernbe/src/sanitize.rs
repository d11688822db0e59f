//! Drops kerning that refers to things the font does not have.
//!
//! Everything dropped is reported, one line per item, so the source can be
//! fixed; what survives is safe to classify.

use std::fmt::Display;

use indexmap::IndexMap;
use log::{debug, warn};
use smol_str::SmolStr;

use kernir::{
    groups::{group_side, GroupRegistry, GroupSide},
    ir::{KernPair, KernSide, KernValue},
    source::KerningSource,
    types::{GlyphName, GroupName},
};

/// Which operand of a pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    First,
    Second,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SanitizeIssue {
    /// A group lists a glyph the font does not have; the glyph is removed from it
    UnknownGroupMember { group: GroupName, glyph: GlyphName },
    /// A group is, or became, empty and is dropped
    EmptyGroup(GroupName),
    /// A pair names a glyph the font does not have and is dropped
    UnknownGlyph {
        pair: (SmolStr, SmolStr),
        glyph: GlyphName,
    },
    /// A pair names a group that does not exist (any more) and is dropped
    UnknownGroup {
        pair: (SmolStr, SmolStr),
        group: GroupName,
    },
    /// A group is used on the side its name says it is not for; kept
    WrongSide { group: GroupName, position: Position },
}

impl Display for SanitizeIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SanitizeIssue::UnknownGroupMember { group, glyph } => {
                write!(f, "Skipping unknown glyph '{glyph}' in group '{group}'")
            }
            SanitizeIssue::EmptyGroup(group) => write!(f, "Dropping empty group '{group}'"),
            SanitizeIssue::UnknownGlyph { pair, glyph } => write!(
                f,
                "Pair ({} {}) references unknown glyph '{glyph}' and will be skipped",
                pair.0, pair.1
            ),
            SanitizeIssue::UnknownGroup { pair, group } => write!(
                f,
                "Pair ({} {}) references unknown group '{group}' and will be skipped",
                pair.0, pair.1
            ),
            SanitizeIssue::WrongSide { group, position } => {
                let used = match position {
                    Position::First => "first",
                    Position::Second => "second",
                };
                write!(f, "Group '{group}' is used as {used} item of a pair")
            }
        }
    }
}

/// Kerning that only refers to existing glyphs and non-empty groups.
#[derive(Clone, Debug)]
pub struct SanitizedKerning {
    pub registry: GroupRegistry,
    pub pairs: IndexMap<KernPair, KernValue>,
    pub issues: Vec<SanitizeIssue>,
}

pub fn sanitize(source: &dyn KerningSource) -> SanitizedKerning {
    let glyphs = source.all_glyphs();
    let mut registry = GroupRegistry::new(source.groups());
    let mut issues: Vec<_> = registry
        .retain_members(|glyph| glyphs.contains(glyph))
        .into_iter()
        .map(|(group, glyph)| SanitizeIssue::UnknownGroupMember { group, glyph })
        .collect();
    issues.extend(
        registry
            .remove_empty()
            .into_iter()
            .map(SanitizeIssue::EmptyGroup),
    );

    let mut pairs: IndexMap<KernPair, KernValue> = IndexMap::new();
    'pairs: for ((raw_first, raw_second), value) in source.kerning().iter() {
        let first = registry.to_side(raw_first);
        let second = registry.to_side(raw_second);
        for side in [&first, &second] {
            let issue = match side {
                KernSide::Group(group) if !registry.contains(group.as_str()) => {
                    SanitizeIssue::UnknownGroup {
                        pair: (raw_first.clone(), raw_second.clone()),
                        group: group.clone(),
                    }
                }
                KernSide::Glyph(glyph) if !glyphs.contains(glyph) => SanitizeIssue::UnknownGlyph {
                    pair: (raw_first.clone(), raw_second.clone()),
                    glyph: glyph.clone(),
                },
                _ => continue,
            };
            issues.push(issue);
            continue 'pairs;
        }
        for (side, position, wrong) in [
            (&first, Position::First, GroupSide::Right),
            (&second, Position::Second, GroupSide::Left),
        ] {
            if let KernSide::Group(group) = side {
                let issue = SanitizeIssue::WrongSide {
                    group: group.clone(),
                    position,
                };
                if group_side(group.as_str()) == wrong && !issues.contains(&issue) {
                    issues.push(issue);
                }
            }
        }
        let pair = (first, second);
        let merged = match pairs.get(&pair) {
            Some(prior) => source.merge_values(prior, value),
            None => value.clone(),
        };
        pairs.insert(pair, merged);
    }

    for issue in issues.iter() {
        warn!("{issue}");
    }
    debug!(
        "{} pairs sanitized to {} with {} issues",
        source.kerning().len(),
        pairs.len(),
        issues.len()
    );
    SanitizedKerning {
        registry,
        pairs,
        issues,
    }
}
