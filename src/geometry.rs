//! Geometric checks over finished layouts.
//!
//! A layout is consistent when every unit stays inside its storage unit and no
//! two units in the same storage unit come closer than `ITEM_GAP`.

use crate::model::{ITEM_GAP, PackedItem, StorageUnit};
use crate::types::{BoundingBox, EPSILON_GENERAL};

/// A broken layout invariant.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutViolation {
    /// The unit at `index` sticks out of its storage unit.
    OutOfBounds { index: usize },
    /// The units at `first` and `second` overlap once inflated by the gap.
    Overlap { first: usize, second: usize },
}

/// Checks whether two placed units violate the gap between them.
///
/// Units in different storage units never conflict.
pub fn intersects_with_gap(a: &PackedItem, b: &PackedItem, gap: f64) -> bool {
    if a.container_index != b.container_index {
        return false;
    }
    // Half the gap on each box; shrunk slightly so units exactly one gap
    // apart pass.
    let margin = ((gap - EPSILON_GENERAL) / 2.0).max(0.0);
    BoundingBox::of(a)
        .inflated(margin)
        .intersects(&BoundingBox::of(b).inflated(margin))
}

/// Checks that a unit lies inside the storage unit on all three axes.
pub fn fits_within_storage_unit(item: &PackedItem, tolerance: f64) -> bool {
    BoundingBox::of(item).is_within(&StorageUnit::STANDARD.extent(), tolerance)
}

/// Lists every bounds and overlap violation in a layout.
///
/// # Parameters
/// * `items` - Placed units in any order
/// * `tolerance` - Slack allowed against the storage unit walls
///
/// # Returns
/// Bounds violations first, in item order, then overlapping pairs. Indices
/// refer to `items`. An empty list means the layout is consistent.
///
/// Quadratic in the number of units; layouts are bounded by the expanded
/// item limit.
pub fn find_layout_violations(items: &[PackedItem], tolerance: f64) -> Vec<LayoutViolation> {
    let mut violations = Vec::new();

    for (index, item) in items.iter().enumerate() {
        if !fits_within_storage_unit(item, tolerance) {
            violations.push(LayoutViolation::OutOfBounds { index });
        }
    }

    for (first, a) in items.iter().enumerate() {
        for (offset, b) in items[first + 1..].iter().enumerate() {
            if intersects_with_gap(a, b, ITEM_GAP) {
                violations.push(LayoutViolation::Overlap {
                    first,
                    second: first + 1 + offset,
                });
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dimensions, Vec3};

    fn placed(container_index: usize, position: (f64, f64, f64), dims: (f64, f64, f64)) -> PackedItem {
        PackedItem {
            item_id: "box".to_string(),
            instance_index: 0,
            container_index,
            position: Vec3::new(position.0, position.1, position.2),
            dimensions: Dimensions::new(dims.0, dims.1, dims.2),
            color: String::new(),
        }
    }

    #[test]
    fn units_one_gap_apart_are_fine() {
        let a = placed(0, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let b = placed(0, (11.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        assert!(!intersects_with_gap(&a, &b, ITEM_GAP));
    }

    #[test]
    fn touching_units_violate_the_gap() {
        let a = placed(0, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let b = placed(0, (0.0, 10.0, 0.0), (10.0, 10.0, 10.0));
        assert!(intersects_with_gap(&a, &b, ITEM_GAP));
        assert!(intersects_with_gap(&b, &a, ITEM_GAP));
    }

    #[test]
    fn different_storage_units_never_conflict() {
        let a = placed(0, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let b = placed(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        assert!(!intersects_with_gap(&a, &b, ITEM_GAP));
    }

    #[test]
    fn reports_out_of_bounds_and_overlaps() {
        let items = vec![
            placed(0, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0)),
            placed(0, (5.0, 5.0, 5.0), (10.0, 10.0, 10.0)),
            placed(0, (90.0, 0.0, 30.0), (10.0, 10.0, 10.0)),
        ];
        let violations = find_layout_violations(&items, EPSILON_GENERAL);
        assert_eq!(
            violations,
            vec![
                LayoutViolation::OutOfBounds { index: 2 },
                LayoutViolation::Overlap { first: 0, second: 1 },
            ]
        );
    }

    #[test]
    fn full_size_unit_is_in_bounds() {
        let item = placed(3, (0.0, 0.0, 0.0), (95.0, 56.0, 83.5));
        assert!(fits_within_storage_unit(&item, EPSILON_GENERAL));
    }
}
