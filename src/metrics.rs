//! Volume and fill metrics.
//!
//! Two independent answers to "how many storage units":
//! - `PackingMetrics::container_count` comes from an actual layout
//! - `calculate_recommended_units` is a coarse volume-only estimate for when
//!   item geometry is not known yet
//!
//! They can disagree because a layout wastes space in gaps and half-empty
//! rows and shelves. Keep them on separate code paths.

use crate::model::{CONTAINER_CUBIC_FEET, CUBIC_INCHES_PER_CUBIC_FOOT, PackedItem, SelectedItem};
use crate::types::Dimensional;

/// Summary numbers of a finished layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PackingMetrics {
    pub container_count: usize,
    pub total_volume_cubic_feet: f64,
    pub last_container_fill_percent: f64,
}

impl PackingMetrics {
    /// Aggregates metrics over a list of placed units.
    pub fn calculate(items: &[PackedItem]) -> Self {
        let container_count = items
            .iter()
            .map(|item| item.container_index + 1)
            .max()
            .unwrap_or(0);
        let total_cubic_inches: f64 = items.iter().map(|item| item.volume()).sum();
        let total_volume_cubic_feet = total_cubic_inches / CUBIC_INCHES_PER_CUBIC_FOOT;

        Self {
            container_count,
            total_volume_cubic_feet,
            last_container_fill_percent: last_container_fill_percent(
                total_volume_cubic_feet,
                container_count,
            ),
        }
    }
}

/// Share of the last storage unit's nominal capacity taken up by the volume
/// that does not fit the units before it, in percent.
///
/// Clamped to `[0, 100]`. The nominal capacity is smaller than the inside
/// extent, and earlier units are rarely full, so the raw value can leave
/// that range.
pub fn last_container_fill_percent(total_volume_cubic_feet: f64, container_count: usize) -> f64 {
    if container_count == 0 {
        return 0.0;
    }
    let earlier_capacity = (container_count - 1) as f64 * CONTAINER_CUBIC_FEET;
    let percent = (total_volume_cubic_feet - earlier_capacity) / CONTAINER_CUBIC_FEET * 100.0;
    percent.clamp(0.0, 100.0)
}

/// Volume-only estimate of the storage units needed.
///
/// # Examples
/// ```
/// use storage_fit::metrics::calculate_recommended_units;
///
/// assert_eq!(calculate_recommended_units(0.0), 0);
/// assert_eq!(calculate_recommended_units(257.0), 1);
/// assert_eq!(calculate_recommended_units(257.5), 2);
/// ```
pub fn calculate_recommended_units(total_cubic_feet: f64) -> u32 {
    if !total_cubic_feet.is_finite() || total_cubic_feet <= 0.0 {
        return 0;
    }
    (total_cubic_feet / CONTAINER_CUBIC_FEET).ceil() as u32
}

/// Total volume of an item list in cubic feet, quantities included.
///
/// Does not validate the items; meant for quick estimates while a form is
/// still being filled in.
pub fn estimate_cubic_feet(items: &[SelectedItem]) -> f64 {
    items
        .iter()
        .map(|item| f64::from(item.quantity) * item.volume())
        .sum::<f64>()
        / CUBIC_INCHES_PER_CUBIC_FOOT
}
