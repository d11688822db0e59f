//! Group naming conventions and the registry of groups a source declares.
//!
//! UFO3 stores kerning groups as `public.kern1.<name>` (first side) and
//! `public.kern2.<name>` (second side). Feature files want class names, so
//! those are rewritten into `@MMK_L_<name>` / `@MMK_R_<name>`. Groups whose
//! name does not start with `@` after that are reference groups: they are
//! never kerned directly but can mark glyphs as right-to-left.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, warn};
use smol_str::SmolStr;

use crate::{
    ir::{KernPair, KernSide, RawGroups},
    types::{GlyphName, GroupName},
};

pub const KERN1_PREFIX: &str = "public.kern1.";
pub const KERN2_PREFIX: &str = "public.kern2.";
pub const LEFT_PREFIX: &str = "@MMK_L_";
pub const RIGHT_PREFIX: &str = "@MMK_R_";

const GROUP_SIGIL: char = '@';
const LEGACY_PREFIX: &str = "public.kern";

/// Substrings that mark a group, or a pair using it, as right-to-left.
pub const RTL_TAGS: [&str; 3] = ["_ARA", "_HEB", "_RTL"];
const LEFT_TAGS: [&str; 3] = ["_LEFT", "_1ST", "_L_"];
const RIGHT_TAGS: [&str; 3] = ["_RIGHT", "_2ND", "_R_"];

/// Which side of a pair a group is meant for, judging by its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupSide {
    Left,
    Right,
    Both,
}

/// Rewrite a UFO3 kerning group name into its feature class name.
///
/// Names that are not `public.kern1.`/`public.kern2.` prefixed come back unchanged.
pub fn normalize(name: &str) -> SmolStr {
    for (prefix, replacement) in [(KERN1_PREFIX, LEFT_PREFIX), (KERN2_PREFIX, RIGHT_PREFIX)] {
        if let Some(rest) = name.strip_prefix(prefix) {
            if rest.starts_with(GROUP_SIGIL) {
                return rest.into();
            }
            return format!("{replacement}{rest}").into();
        }
    }
    name.into()
}

/// Whether a kerning operand names a group rather than a glyph.
pub fn is_group(item: &str) -> bool {
    item.starts_with(GROUP_SIGIL) || item.starts_with(LEGACY_PREFIX)
}

pub fn is_kerning_group(name: &str) -> bool {
    normalize(name).starts_with(GROUP_SIGIL)
}

pub fn has_rtl_tag(name: &str) -> bool {
    RTL_TAGS.iter().any(|tag| name.contains(tag))
}

pub fn is_rtl_group(name: &str) -> bool {
    has_rtl_tag(name)
}

pub fn group_side(name: &str) -> GroupSide {
    if LEFT_TAGS.iter().any(|tag| name.contains(tag)) {
        GroupSide::Left
    } else if RIGHT_TAGS.iter().any(|tag| name.contains(tag)) {
        GroupSide::Right
    } else {
        GroupSide::Both
    }
}

/// The groups of a source under their canonical names, in source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupRegistry {
    kerning: IndexMap<GroupName, Vec<GlyphName>>,
    reference: IndexMap<GroupName, Vec<GlyphName>>,
}

impl GroupRegistry {
    pub fn new(raw: &RawGroups) -> GroupRegistry {
        let mut registry = GroupRegistry::default();
        for (raw_name, members) in raw.iter() {
            let name = GroupName::from(normalize(raw_name));
            let target = if is_kerning_group(raw_name) {
                &mut registry.kerning
            } else {
                &mut registry.reference
            };
            if target.insert(name.clone(), members.clone()).is_some() {
                warn!("Group '{raw_name}' normalizes to '{name}', which is already defined; the later definition wins");
            }
        }
        debug!(
            "{} kerning groups, {} reference groups",
            registry.kerning.len(),
            registry.reference.len()
        );
        registry
    }

    pub fn kerning_groups(&self) -> &IndexMap<GroupName, Vec<GlyphName>> {
        &self.kerning
    }

    pub fn reference_groups(&self) -> &IndexMap<GroupName, Vec<GlyphName>> {
        &self.reference
    }

    pub fn members(&self, name: &str) -> Option<&[GlyphName]> {
        self.kerning.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kerning.contains_key(name)
    }

    /// The glyphs a side stands for: the members of a group, or the glyph itself.
    pub fn expand<'a>(&'a self, side: &'a KernSide) -> &'a [GlyphName] {
        match side {
            KernSide::Glyph(glyph) => std::slice::from_ref(glyph),
            KernSide::Group(group) => self.members(group.as_str()).unwrap_or_default(),
        }
    }

    /// Convert a raw kerning operand, group names are normalized.
    pub fn to_side(&self, raw_item: &str) -> KernSide {
        if is_group(raw_item) {
            KernSide::Group(normalize(raw_item).into())
        } else {
            KernSide::Glyph(raw_item.into())
        }
    }

    /// Kerning groups that are an operand of at least one pair, in registry order.
    pub fn used_groups<'a>(
        &self,
        pairs: impl IntoIterator<Item = &'a KernPair>,
    ) -> IndexMap<GroupName, Vec<GlyphName>> {
        let used: HashSet<&str> = pairs
            .into_iter()
            .flat_map(|(first, second)| [first, second])
            .filter_map(|side| side.group_name().map(GroupName::as_str))
            .collect();
        self.kerning
            .iter()
            .filter(|(name, _)| used.contains(name.as_str()))
            .map(|(name, members)| (name.clone(), members.clone()))
            .collect()
    }

    /// Glyphs that make a pair right-to-left: members of reference groups and
    /// of kerning groups whose name carries an RTL tag.
    pub fn rtl_glyphs(&self) -> HashSet<GlyphName> {
        self.reference
            .iter()
            .chain(self.kerning.iter())
            .filter(|(name, _)| has_rtl_tag(name.as_str()))
            .flat_map(|(_, members)| members.iter().cloned())
            .collect()
    }

    /// Drop a kerning group, returning its members.
    pub fn remove(&mut self, name: &str) -> Option<Vec<GlyphName>> {
        self.kerning.shift_remove(name)
    }

    /// Keep only the group members `keep` accepts; returns the removed
    /// `(group, glyph)` memberships.
    pub fn retain_members(
        &mut self,
        mut keep: impl FnMut(&GlyphName) -> bool,
    ) -> Vec<(GroupName, GlyphName)> {
        let mut removed = Vec::new();
        for (name, members) in self.kerning.iter_mut().chain(self.reference.iter_mut()) {
            members.retain(|glyph| {
                let keep = keep(glyph);
                if !keep {
                    removed.push((name.clone(), glyph.clone()));
                }
                keep
            });
        }
        removed
    }

    /// Remove every empty group, returning their names.
    pub fn remove_empty(&mut self) -> Vec<GroupName> {
        let empty: Vec<_> = self
            .kerning
            .iter()
            .chain(self.reference.iter())
            .filter(|(_, members)| members.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        for name in empty.iter() {
            self.kerning.shift_remove(name);
            self.reference.shift_remove(name);
        }
        empty
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn raw_groups(groups: &[(&str, &[&str])]) -> RawGroups {
        groups
            .iter()
            .map(|(name, members)| {
                (
                    SmolStr::new(name),
                    members.iter().map(|g| GlyphName::new(g)).collect(),
                )
            })
            .collect()
    }

    #[rstest]
    #[case("public.kern1.example", "@MMK_L_example")]
    #[case("public.kern1.@MMK_L_example", "@MMK_L_example")]
    #[case("public.kern2.example", "@MMK_R_example")]
    #[case("public.kern2.@MMK_R_example", "@MMK_R_example")]
    #[case("@example", "@example")]
    #[case("RTL_KERNING", "RTL_KERNING")]
    fn normalize_names(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(expected, normalize(raw).as_str());
    }

    #[rstest]
    #[case("@_A_LEFT", true)]
    #[case("public.kern2.O", true)]
    #[case("a.ss01", false)]
    #[case("at", false)]
    fn group_detection(#[case] item: &str, #[case] expected: bool) {
        assert_eq!(expected, is_group(item));
    }

    #[rstest]
    #[case("public.kern1.A", true)]
    #[case("public.kern2.@MMK_R_V", true)]
    #[case("@MMK_L_O", true)]
    #[case("@quotes", true)]
    #[case("RTL_KERNING", false)]
    #[case("public.kerning.notes", false)]
    #[case("latin.lc", false)]
    fn kerning_group_detection(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(expected, is_kerning_group(name));
    }

    #[rstest]
    #[case("a", false)]
    #[case("@MMK_L_t", false)]
    #[case("@MMK_L_ARA_T_UC_LEFT", true)]
    #[case("@MMK_L_HEB_DASH", true)]
    #[case("@MMK_L_whatever_RTL", true)]
    fn rtl_group_detection(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(expected, is_rtl_group(name));
    }

    #[rstest]
    #[case("@A_LEFT", GroupSide::Left)]
    #[case("@MMK_L_A", GroupSide::Left)]
    #[case("@O_1ST", GroupSide::Left)]
    #[case("@V_RIGHT", GroupSide::Right)]
    #[case("@MMK_R_V", GroupSide::Right)]
    #[case("@T_2ND", GroupSide::Right)]
    #[case("@quotes", GroupSide::Both)]
    fn sides_from_names(#[case] name: &str, #[case] expected: GroupSide) {
        assert_eq!(expected, group_side(name));
    }

    #[test]
    fn registry_splits_reference_groups() {
        let registry = GroupRegistry::new(&raw_groups(&[
            ("public.kern1.A", &["A", "Aacute"]),
            ("RTL_KERNING", &["alef"]),
            ("public.kern2.V", &["V", "W"]),
        ]));
        assert_eq!(
            vec!["@MMK_L_A", "@MMK_R_V"],
            registry
                .kerning_groups()
                .keys()
                .map(GroupName::as_str)
                .collect::<Vec<_>>()
        );
        assert_eq!(
            vec!["RTL_KERNING"],
            registry
                .reference_groups()
                .keys()
                .map(GroupName::as_str)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn used_groups_keep_registry_order() {
        let registry = GroupRegistry::new(&raw_groups(&[
            ("@MMK_L_O", &["O"]),
            ("@MMK_L_A", &["A"]),
            ("@MMK_R_unused", &["x"]),
            ("@MMK_R_V", &["V"]),
        ]));
        let pairs = vec![
            (registry.to_side("@MMK_L_A"), registry.to_side("@MMK_R_V")),
            (registry.to_side("public.kern1.O"), registry.to_side("T")),
        ];
        let used = registry.used_groups(pairs.iter());
        assert_eq!(
            vec!["@MMK_L_O", "@MMK_L_A", "@MMK_R_V"],
            used.keys().map(GroupName::as_str).collect::<Vec<_>>()
        );
    }

    #[test]
    fn rtl_glyphs_from_tags() {
        let registry = GroupRegistry::new(&raw_groups(&[
            ("public.kern1.ARA_alef", &["alef", "alef.fina"]),
            ("public.kern1.A", &["A"]),
            ("HEB_letters", &["bet"]),
        ]));
        let rtl = registry.rtl_glyphs();
        assert!(rtl.contains("alef"));
        assert!(rtl.contains("alef.fina"));
        assert!(rtl.contains("bet"));
        assert!(!rtl.contains("A"));
    }

    #[test]
    fn retain_and_drop_empty() {
        let mut registry = GroupRegistry::new(&raw_groups(&[
            ("@MMK_L_A", &["A", "Amissing"]),
            ("@MMK_R_gone", &["gone"]),
        ]));
        let removed = registry.retain_members(|g| g.as_str() != "Amissing" && g.as_str() != "gone");
        assert_eq!(2, removed.len());
        assert_eq!(vec![GroupName::from("@MMK_R_gone")], registry.remove_empty());
        assert_eq!(Some(&[GlyphName::new("A")][..]), registry.members("@MMK_L_A"));
        assert!(!registry.contains("@MMK_R_gone"));
    }
}
