//! Splits group kerning into subtables that fit a size budget.
//!
//! A class based pair positioning subtable addresses everything through 16
//! bit offsets, so a large one overflows at compile time. The size of each
//! subtable is estimated from the structure it will have: a coverage table,
//! two class definitions and a class1 x class2 record matrix.

use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;
use log::debug;

use kernir::{
    ir::KernSide,
    types::{GlyphName, GroupName},
};

use crate::classify::Bucket;

/// Fixed part of a coverage table.
pub const COVERAGE_HEADER: usize = 2;
/// Fixed part of a class definition table.
pub const CLASS_DEF_HEADER: usize = 6;
/// Fixed part of a pair positioning subtable.
pub const PAIR_POS_HEADER: usize = 16;
/// Bytes per glyph, class or record entry.
pub const RECORD_SIZE: usize = 2;

/// Running totals of the subtable being built.
#[derive(Default)]
struct Accumulator<'a> {
    firsts: Vec<&'a KernSide>,
    left_glyphs: HashSet<&'a GlyphName>,
    right_glyphs: HashSet<&'a GlyphName>,
    right_sides: HashSet<&'a KernSide>,
}

impl<'a> Accumulator<'a> {
    fn add(
        &mut self,
        first: &'a KernSide,
        seconds: &[&'a KernSide],
        groups: &'a IndexMap<GroupName, Vec<GlyphName>>,
    ) {
        self.firsts.push(first);
        self.left_glyphs.extend(expand(groups, first));
        for &second in seconds {
            self.right_glyphs.extend(expand(groups, second));
            self.right_sides.insert(second);
        }
    }

    fn size(&self, coverage_size: usize) -> usize {
        let left_class_size = CLASS_DEF_HEADER + RECORD_SIZE * self.left_glyphs.len();
        let right_class_size = CLASS_DEF_HEADER + RECORD_SIZE * self.right_glyphs.len();
        let pair_table_size =
            PAIR_POS_HEADER + self.firsts.len() * self.right_sides.len() * RECORD_SIZE;
        coverage_size + left_class_size + right_class_size + pair_table_size
    }
}

fn expand<'a>(
    groups: &'a IndexMap<GroupName, Vec<GlyphName>>,
    side: &'a KernSide,
) -> &'a [GlyphName] {
    match side {
        KernSide::Glyph(glyph) => std::slice::from_ref(glyph),
        KernSide::Group(group) => groups.get(group).map(Vec::as_slice).unwrap_or_default(),
    }
}

/// Cuts buckets into subtables of at most (an estimated) `max_size` bytes.
pub struct SubtablePartitioner<'a> {
    groups: &'a IndexMap<GroupName, Vec<GlyphName>>,
    coverage_size: usize,
    max_size: usize,
}

impl<'a> SubtablePartitioner<'a> {
    /// `kerned_glyphs` is every glyph kerned anywhere in the font, on either
    /// side, group members counted individually.
    pub fn new(
        groups: &'a IndexMap<GroupName, Vec<GlyphName>>,
        kerned_glyphs: &HashSet<&GlyphName>,
        max_size: usize,
    ) -> SubtablePartitioner<'a> {
        SubtablePartitioner {
            groups,
            coverage_size: COVERAGE_HEADER + RECORD_SIZE * kerned_glyphs.len(),
            max_size,
        }
    }

    /// Size of the coverage table every subtable is charged with.
    pub fn coverage_size(&self) -> usize {
        self.coverage_size
    }

    /// Split a bucket between its first operands.
    ///
    /// The result, concatenated, is the bucket again. A first operand whose
    /// pairs alone exceed the budget still gets a subtable of its own.
    pub fn partition(&self, bucket: &'a Bucket) -> Vec<Bucket> {
        if bucket.is_empty() {
            return Vec::new();
        }
        let coverage_size = self.coverage_size;

        let mut seconds_by_first: BTreeMap<&KernSide, Vec<&KernSide>> = BTreeMap::new();
        for (first, second) in bucket.keys() {
            seconds_by_first.entry(first).or_default().push(second);
        }

        let mut chunks: Vec<Vec<&KernSide>> = Vec::new();
        let mut current = Accumulator::default();
        for (first, seconds) in seconds_by_first.iter() {
            current.add(*first, seconds, self.groups);
            if current.size(coverage_size) < self.max_size || current.firsts.len() == 1 {
                continue;
            }
            // this first operand no longer fits, close without it and start over with it
            let mut closed = std::mem::take(&mut current);
            closed.firsts.pop();
            chunks.push(closed.firsts);
            current.add(*first, seconds, self.groups);
        }
        if !current.firsts.is_empty() {
            chunks.push(current.firsts);
        }

        let subtables: Vec<Bucket> = chunks
            .into_iter()
            .map(|firsts| {
                let firsts: HashSet<_> = firsts.into_iter().collect();
                bucket
                    .iter()
                    .filter(|((first, _), _)| firsts.contains(first))
                    .map(|(pair, value)| (pair.clone(), value.clone()))
                    .collect()
            })
            .collect();
        debug!(
            "{} pairs, coverage {} bytes, split into {} subtables of at most {} bytes",
            bucket.len(),
            coverage_size,
            subtables.len(),
            self.max_size
        );
        subtables
    }
}
