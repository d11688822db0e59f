//! Designspace axes, reduced to what locating a master needs.
//!
//! Designspace `<map>` elements take a userspace input to a design output;
//! master locations are design coordinates, kerning locations are userspace.

use norad::designspace::{Axis, Dimension};
use ordered_float::OrderedFloat;

use kernir::ir::Location;

use crate::error::Error;

/// Remaps values using a series of linear segments.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PiecewiseLinearMap {
    // identical lengths, both sorted
    from: Vec<OrderedFloat<f32>>,
    to: Vec<OrderedFloat<f32>>,
}

impl PiecewiseLinearMap {
    pub(crate) fn new(mut mappings: Vec<(OrderedFloat<f32>, OrderedFloat<f32>)>) -> PiecewiseLinearMap {
        mappings.sort();
        let (from, to): (Vec<_>, Vec<_>) = mappings.into_iter().unzip();
        PiecewiseLinearMap { from, to }
    }

    pub(crate) fn nop() -> PiecewiseLinearMap {
        PiecewiseLinearMap::new(vec![(OrderedFloat(0.0), OrderedFloat(0.0))])
    }

    pub(crate) fn reverse(&self) -> PiecewiseLinearMap {
        let mappings = self
            .to
            .iter()
            .copied()
            .zip(self.from.iter().copied())
            .collect();
        PiecewiseLinearMap::new(mappings)
    }

    /// Values outside the mapped range are shifted by the offset of the nearest end.
    pub(crate) fn map(&self, value: f32) -> f32 {
        if self.from.is_empty() {
            return value;
        }
        match self.from.binary_search(&OrderedFloat(value)) {
            Ok(idx) => self.to[idx].0,
            Err(0) => value + self.to[0].0 - self.from[0].0,
            Err(idx) if idx == self.from.len() => value + self.to[idx - 1].0 - self.from[idx - 1].0,
            Err(idx) => {
                let (from_lhs, from_rhs) = (self.from[idx - 1].0, self.from[idx].0);
                let (to_lhs, to_rhs) = (self.to[idx - 1].0, self.to[idx].0);
                let t = (value - from_lhs) / (from_rhs - from_lhs);
                to_lhs + t * (to_rhs - to_lhs)
            }
        }
    }
}

/// An axis with the conversion from design to user coordinates.
#[derive(Debug, Clone)]
pub(crate) struct KernAxis {
    pub name: String,
    pub tag: String,
    /// Userspace default
    pub default: f32,
    design_to_user: PiecewiseLinearMap,
}

impl KernAxis {
    pub(crate) fn new(axis: &Axis) -> KernAxis {
        let user_to_design = match &axis.map {
            Some(mappings) if !mappings.is_empty() => PiecewiseLinearMap::new(
                mappings
                    .iter()
                    .map(|m| (OrderedFloat(m.input), OrderedFloat(m.output)))
                    .collect(),
            ),
            _ => PiecewiseLinearMap::nop(),
        };
        KernAxis {
            name: axis.name.clone(),
            tag: axis.tag.clone(),
            default: axis.default,
            design_to_user: user_to_design.reverse(),
        }
    }

    pub(crate) fn to_user(&self, design: f32) -> f32 {
        self.design_to_user.map(design)
    }
}

/// The userspace location of a master; axes the master omits sit at their default.
pub(crate) fn to_user_location(axes: &[KernAxis], location: &[Dimension]) -> Result<Location, Error> {
    let mut result = Location::new();
    for axis in axes {
        let user = location
            .iter()
            .find(|dim| dim.name == axis.name)
            .and_then(|dim| match (dim.uservalue, dim.xvalue) {
                (Some(user), _) => Some(user),
                (None, Some(design)) => Some(axis.to_user(design)),
                (None, None) => None,
            })
            .unwrap_or(axis.default);
        result = result.with(&axis.tag, user as f64)?;
    }
    Ok(result)
}

/// Whether a master sits at the default of every axis.
pub(crate) fn is_default(axes: &[KernAxis], location: &Location) -> bool {
    axes.iter()
        .zip(location.iter())
        .all(|(axis, (_, value))| (value - axis.default as f64).abs() < 0.001)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plm(from_to: &[(f32, f32)]) -> PiecewiseLinearMap {
        PiecewiseLinearMap::new(
            from_to
                .iter()
                .map(|(f, t)| (OrderedFloat(*f), OrderedFloat(*t)))
                .collect(),
        )
    }

    #[test]
    fn single_segment_map() {
        // User likes to use 0..10 in their sources to mean wght 0..1000 in userspace
        let map = plm(&[(0.0, 0.0), (10.0, 1000.0)]);
        assert_eq!(0.0, map.map(0.0));
        assert_eq!(500.0, map.map(5.0));
        assert_eq!(1000.0, map.map(10.0));

        // walk off the end, why not
        assert_eq!(-1.0, map.map(-1.0));
        assert_eq!(1010.0, map.map(20.0));
    }

    #[test]
    fn multi_segment_map() {
        let map = plm(&[(-1.0, 100.0), (0.0, 400.0), (10.0, 700.0)]);
        assert_eq!(100.0, map.map(-1.0));
        assert_eq!(400.0, map.map(0.0));
        assert_eq!(550.0, map.map(5.0));
        assert_eq!(700.0, map.map(10.0));
    }

    #[test]
    fn reversed_map_goes_back() {
        let user_to_design = plm(&[(100.0, 20.0), (400.0, 80.0), (900.0, 180.0)]);
        let design_to_user = user_to_design.reverse();
        assert_eq!(400.0, design_to_user.map(80.0));
        assert_eq!(650.0, design_to_user.map(130.0));
    }

    #[test]
    fn nop_is_identity() {
        assert_eq!(37.5, PiecewiseLinearMap::nop().map(37.5));
    }
}
