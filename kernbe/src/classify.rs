//! Sorts kerning pairs into the buckets a kern feature is written from.
//!
//! A pair kerns either glyph/glyph, glyph/group, group/glyph or group/group.
//! Where a more specific pair overrides what a broader pair already implies,
//! the specific pair is an exception and has to come first in the feature.
//! Right-to-left pairs get buckets of their own, they end up in a separate
//! lookup.

use std::collections::{BTreeMap, HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, warn};

use kernir::{
    groups::{has_rtl_tag, is_rtl_group, GroupRegistry},
    ir::{KernPair, KernSide, KernValue},
    source::KerningSource,
    types::{GlyphName, GroupName},
};

use crate::{options::KernOptions, sanitize::SanitizedKerning};

/// Pairs containing this are exceptions by declaration.
pub const PREDEFINED_EXCEPTION_TAG: &str = "EXC_";

/// Pairs of one bucket, sorted by operands.
pub type Bucket = BTreeMap<KernPair, KernValue>;

/// The buckets of one writing direction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Buckets {
    pub predefined_exceptions: Bucket,
    pub glyph_glyph: Bucket,
    pub glyph_glyph_exceptions: Bucket,
    pub glyph_group: Bucket,
    pub glyph_group_exceptions: Bucket,
    pub group_glyph_exceptions: Bucket,
    pub group_group: Bucket,
}

impl Buckets {
    /// Number of classified pairs; predefined exceptions are not classified.
    pub fn classified_len(&self) -> usize {
        self.glyph_glyph.len()
            + self.glyph_glyph_exceptions.len()
            + self.glyph_group.len()
            + self.glyph_group_exceptions.len()
            + self.group_glyph_exceptions.len()
            + self.group_group.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predefined_exceptions.is_empty() && self.classified_len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        [
            &self.predefined_exceptions,
            &self.glyph_glyph,
            &self.glyph_glyph_exceptions,
            &self.glyph_group,
            &self.glyph_group_exceptions,
            &self.group_glyph_exceptions,
            &self.group_group,
        ]
        .into_iter()
    }
}

/// The outcome of classification.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassifiedKerning {
    /// Kerning groups used by a surviving pair, in source order
    pub groups: IndexMap<GroupName, Vec<GlyphName>>,
    pub ltr: Buckets,
    pub rtl: Buckets,
    /// Pairs placed in a bucket
    pub processed: usize,
    /// Pairs skipped for having a zero value
    pub unprocessed: usize,
    /// Pairs left to classify after preprocessing
    pub input_count: usize,
}

impl ClassifiedKerning {
    /// Every pair that went in must have been placed or skipped.
    pub fn sanity_check(&self) -> bool {
        let bucketed = self.ltr.classified_len() + self.rtl.classified_len();
        let ok = self.processed + self.unprocessed == self.input_count
            && bucketed == self.processed;
        if !ok {
            warn!(
                "Something went wrong: {} pairs in, {} processed ({} in buckets), {} unprocessed",
                self.input_count, self.processed, bucketed, self.unprocessed
            );
        }
        ok
    }

    /// Glyphs on either side of any classified pair, both directions, group
    /// members expanded.
    pub fn kerned_glyphs(&self) -> HashSet<&GlyphName> {
        self.ltr
            .iter()
            .chain(self.rtl.iter())
            .flat_map(|bucket| bucket.keys())
            .flat_map(|(first, second)| [first, second])
            .flat_map(|side| match side {
                KernSide::Glyph(glyph) => std::slice::from_ref(glyph),
                KernSide::Group(group) => self
                    .groups
                    .get(group)
                    .map(Vec::as_slice)
                    .unwrap_or_default(),
            })
            .collect()
    }
}

/// Classifies the pairs of a sanitized source.
pub struct KernClassifier<'a> {
    source: &'a dyn KerningSource,
    registry: GroupRegistry,
    pairs: IndexMap<KernPair, KernValue>,
    predefined: IndexMap<KernPair, KernValue>,
    rtl_glyphs: HashSet<GlyphName>,
}

impl<'a> KernClassifier<'a> {
    /// Run preprocessing: suffix filtering, splitting off predefined
    /// exceptions and, if asked, dissolving single glyph groups.
    pub fn new(
        source: &'a dyn KerningSource,
        sanitized: SanitizedKerning,
        options: &KernOptions,
    ) -> KernClassifier<'a> {
        let SanitizedKerning {
            registry, pairs, ..
        } = sanitized;
        let rtl_glyphs = registry.rtl_glyphs();
        let mut classifier = KernClassifier {
            source,
            registry,
            pairs,
            predefined: IndexMap::new(),
            rtl_glyphs,
        };

        if let Some(suffix) = options.ignore_suffix.as_deref().filter(|s| !s.is_empty()) {
            let before = classifier.pairs.len();
            classifier
                .pairs
                .retain(|(first, second), _| !first.name().ends_with(suffix) && !second.name().ends_with(suffix));
            debug!(
                "Ignoring {} pairs with an operand ending in '{suffix}'",
                before - classifier.pairs.len()
            );
        }

        let (predefined, pairs): (IndexMap<_, _>, IndexMap<_, _>) =
            std::mem::take(&mut classifier.pairs)
                .into_iter()
                .partition(|((first, second), _)| {
                    first.name().contains(PREDEFINED_EXCEPTION_TAG)
                        || second.name().contains(PREDEFINED_EXCEPTION_TAG)
                });
        classifier.predefined = predefined;
        classifier.pairs = pairs;

        if options.dissolve_single {
            classifier.dissolve_single_groups();
        }
        classifier
    }

    /// Whether a pair belongs to the right-to-left lookup.
    pub fn is_rtl(&self, (first, second): &KernPair) -> bool {
        [first, second].into_iter().any(|side| {
            has_rtl_tag(side.name())
                || side
                    .glyph_name()
                    .is_some_and(|glyph| self.rtl_glyphs.contains(glyph))
        })
    }

    /// Replace groups holding one glyph by that glyph.
    ///
    /// Pairs are re-added from least to most specific so when two pairs
    /// collapse into one, the one a kerning lookup would have picked wins.
    fn dissolve_single_groups(&mut self) {
        let predefined_groups: HashSet<&str> = self
            .predefined
            .keys()
            .flat_map(|(first, second)| [first, second])
            .filter_map(|side| side.group_name().map(GroupName::as_str))
            .collect();
        let singles: HashMap<GroupName, GlyphName> = self
            .registry
            .kerning_groups()
            .iter()
            .filter(|(name, members)| {
                members.len() == 1
                    && !is_rtl_group(name.as_str())
                    && !predefined_groups.contains(name.as_str())
            })
            .map(|(name, members)| (name.clone(), members[0].clone()))
            .collect();
        if singles.is_empty() {
            return;
        }

        let dissolve = |side: &KernSide| match side {
            KernSide::Group(group) => singles
                .get(group)
                .map(|glyph| KernSide::Glyph(glyph.clone()))
                .unwrap_or_else(|| side.clone()),
            KernSide::Glyph(_) => side.clone(),
        };
        let specificity = |(first, second): &KernPair| match (first.is_group(), second.is_group()) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        };

        let mut ordered: Vec<_> = self.pairs.iter().collect();
        ordered.sort_by_key(|(pair, _)| specificity(*pair));
        let mut dissolved: IndexMap<KernPair, KernValue> = IndexMap::new();
        for ((first, second), value) in ordered {
            let pair = (dissolve(first), dissolve(second));
            let merged = match dissolved.get(&pair) {
                Some(prior) => self.source.merge_values(prior, value),
                None => value.clone(),
            };
            dissolved.insert(pair, merged);
        }
        debug!(
            "Dissolved {} single glyph groups, {} pairs became {}",
            singles.len(),
            self.pairs.len(),
            dissolved.len()
        );
        for name in singles.keys() {
            self.registry.remove(name.as_str());
        }
        self.pairs = dissolved;
    }

    /// Members of groups used as first (`first == true`) or second operand.
    fn grouped_glyphs(&self, first: bool) -> HashSet<&GlyphName> {
        self.pairs
            .keys()
            .map(|pair| if first { &pair.0 } else { &pair.1 })
            .filter(|side| side.is_group())
            .flat_map(|side| self.registry.expand(side).iter())
            .collect()
    }

    pub fn classify(&self) -> ClassifiedKerning {
        let grouped_left = self.grouped_glyphs(true);
        let grouped_right = self.grouped_glyphs(false);

        let mut result = ClassifiedKerning {
            groups: self
                .registry
                .used_groups(self.pairs.keys().chain(self.predefined.keys())),
            input_count: self.pairs.len(),
            ..Default::default()
        };

        for (pair, value) in self.predefined.iter() {
            let buckets = if self.is_rtl(pair) {
                &mut result.rtl
            } else {
                &mut result.ltr
            };
            buckets.predefined_exceptions.insert(pair.clone(), value.clone());
        }

        let mut glyph_group = Vec::new();
        let mut group_first = Vec::new();
        let mut glyph_glyph = Vec::new();
        for entry in self.pairs.iter() {
            let (first, second) = entry.0;
            match (first.is_group(), second.is_group()) {
                (false, true) => glyph_group.push(entry),
                (true, _) => group_first.push(entry),
                (false, false) => glyph_glyph.push(entry),
            }
        }
        for list in [&mut glyph_group, &mut group_first, &mut glyph_glyph] {
            list.sort_by(|a, b| a.0.cmp(b.0));
        }

        // glyph/glyph pairs that override a broader rule, with whether the
        // rule they override is right-to-left
        let mut exceptions: HashMap<(&GlyphName, &GlyphName), bool> = HashMap::new();

        for (pair, value) in glyph_group {
            let rtl = self.is_rtl(pair);
            let (first, second) = pair;
            let Some(glyph) = first.glyph_name() else {
                continue;
            };
            let buckets = if rtl { &mut result.rtl } else { &mut result.ltr };
            if grouped_left.contains(glyph) {
                buckets.glyph_group_exceptions.insert(pair.clone(), value.clone());
                result.processed += 1;
                continue;
            }
            for member in self.registry.expand(second) {
                let marked = exceptions.entry((glyph, member)).or_default();
                *marked |= rtl;
            }
            if value.is_zero() {
                result.unprocessed += 1;
            } else {
                buckets.glyph_group.insert(pair.clone(), value.clone());
                result.processed += 1;
            }
        }

        for (pair, value) in group_first {
            let rtl = self.is_rtl(pair);
            let (first, second) = pair;
            let buckets = if rtl { &mut result.rtl } else { &mut result.ltr };
            if second
                .glyph_name()
                .is_some_and(|glyph| grouped_right.contains(glyph))
            {
                buckets.group_glyph_exceptions.insert(pair.clone(), value.clone());
                result.processed += 1;
                continue;
            }
            if value.is_zero() {
                result.unprocessed += 1;
                continue;
            }
            buckets.group_group.insert(pair.clone(), value.clone());
            result.processed += 1;
            for left in self.registry.expand(first) {
                for right in self.registry.expand(second) {
                    let marked = exceptions.entry((left, right)).or_default();
                    *marked |= rtl;
                }
            }
        }

        for (pair, value) in glyph_glyph {
            let rtl = self.is_rtl(pair);
            let (Some(first), Some(second)) = (pair.0.glyph_name(), pair.1.glyph_name()) else {
                continue;
            };
            match exceptions.get(&(first, second)) {
                Some(rtl_rule) => {
                    let buckets = if rtl || *rtl_rule {
                        &mut result.rtl
                    } else {
                        &mut result.ltr
                    };
                    buckets
                        .glyph_glyph_exceptions
                        .insert(pair.clone(), value.clone());
                }
                None => {
                    let buckets = if rtl { &mut result.rtl } else { &mut result.ltr };
                    buckets.glyph_glyph.insert(pair.clone(), value.clone());
                }
            }
            result.processed += 1;
        }

        debug!(
            "Classified {} pairs: {} ltr, {} rtl, {} predefined exceptions, {} skipped as zero",
            result.input_count,
            result.ltr.classified_len(),
            result.rtl.classified_len(),
            self.predefined.len(),
            result.unprocessed
        );
        result.sanity_check();
        result
    }
}
