//! Data models for storage unit packing.
//!
//! This module defines the fundamental data structures:
//! - the storage unit constants every layout is computed against
//! - `SelectedItem`: one product line as entered by the customer
//! - `ExpandedItem`: a single unit instance of a `SelectedItem`
//! - `PackedItem`: an instance with its final position

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::error::{Axis, PackingError, ValidationError};
use crate::types::{Dimensional, Dimensions, Positioned, Vec3};

/// Inside length of a storage unit (X axis), in inches.
pub const CONTAINER_LENGTH: f64 = 95.0;
/// Inside width of a storage unit (Z axis), in inches.
pub const CONTAINER_WIDTH: f64 = 56.0;
/// Inside height of a storage unit (Y axis), in inches.
pub const CONTAINER_HEIGHT: f64 = 83.5;
/// Nominal capacity of a storage unit as advertised to customers.
pub const CONTAINER_CUBIC_FEET: f64 = 257.0;
/// Clearance between neighbouring items and between stacked shelves.
pub const ITEM_GAP: f64 = 1.0;
/// Spacing between container shells in the rendered scene.
pub const CONTAINER_GAP: f64 = 20.0;
pub const CUBIC_INCHES_PER_CUBIC_FOOT: f64 = 1728.0;

/// Serializable view of the storage unit constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct StorageUnit {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub cubic_feet_capacity: f64,
    pub item_gap: f64,
    pub container_gap: f64,
}

impl StorageUnit {
    pub const STANDARD: StorageUnit = StorageUnit {
        length: CONTAINER_LENGTH,
        width: CONTAINER_WIDTH,
        height: CONTAINER_HEIGHT,
        cubic_feet_capacity: CONTAINER_CUBIC_FEET,
        item_gap: ITEM_GAP,
        container_gap: CONTAINER_GAP,
    };

    /// Inside extent in the X/Y/Z convention.
    pub fn extent(&self) -> Vec3 {
        Vec3::new(self.length, self.height, self.width)
    }
}

fn validate_dimension(item_id: &str, value: f64, axis: Axis) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidDimension {
            item_id: item_id.to_string(),
            axis,
            value,
        });
    }
    Ok(())
}

fn check_axis_fits(item_id: &str, size: f64, limit: f64, axis: Axis, epsilon: f64) -> Result<(), PackingError> {
    if size > limit + epsilon {
        return Err(PackingError::UnplaceableItem {
            item_id: item_id.to_string(),
            axis,
            size,
            limit,
        });
    }
    Ok(())
}

/// One product line from the inventory form.
///
/// # Fields
/// * `item_id` - Stable key of the product
/// * `quantity` - Number of identical units
/// * `width`, `depth`, `height` - Per-unit size in inches
/// * `color` - Display color, passed through untouched
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "item_id": "dresser",
    "quantity": 2,
    "width": 40.0,
    "depth": 20.0,
    "height": 35.0,
    "color": "#8b5a2b"
}))]
pub struct SelectedItem {
    pub item_id: String,
    pub quantity: u32,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    #[serde(default)]
    pub color: String,
}

impl SelectedItem {
    /// Creates a new item with validation.
    ///
    /// # Examples
    /// ```
    /// use storage_fit::model::SelectedItem;
    ///
    /// let ok = SelectedItem::new("chair", 4, 20.0, 20.0, 36.0, "#445566");
    /// assert!(ok.is_ok());
    ///
    /// let invalid = SelectedItem::new("chair", 0, 20.0, 20.0, 36.0, "#445566");
    /// assert!(invalid.is_err());
    /// ```
    pub fn new(
        item_id: impl Into<String>,
        quantity: u32,
        width: f64,
        depth: f64,
        height: f64,
        color: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let item = Self {
            item_id: item_id.into(),
            quantity,
            width,
            depth,
            height,
            color: color.into(),
        };
        item.validate()?;
        Ok(item)
    }

    /// Checks quantity and all three dimensions.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quantity == 0 {
            return Err(ValidationError::InvalidQuantity {
                item_id: self.item_id.clone(),
                quantity: self.quantity,
            });
        }
        validate_dimension(&self.item_id, self.width, Axis::Width)?;
        validate_dimension(&self.item_id, self.depth, Axis::Depth)?;
        validate_dimension(&self.item_id, self.height, Axis::Height)?;
        Ok(())
    }

    /// Checks that a unit fits an empty storage unit in its given orientation.
    ///
    /// Items are never rotated, so a 56 in wide, 95 in deep item is rejected
    /// even though it would fit turned by 90 degrees.
    pub fn check_fits_storage_unit(&self, epsilon: f64) -> Result<(), PackingError> {
        check_dimensions_fit(&self.item_id, &self.dimensions(), epsilon)
    }
}

/// Checks box dimensions against an empty storage unit, axis by axis.
///
/// # Parameters
/// * `item_id` - Product key reported in the error
/// * `dims` - Unit size in its given orientation
/// * `epsilon` - Slack allowed on every axis
///
/// # Returns
/// `Ok(())` if the unit fits, otherwise `UnplaceableItem` naming the first
/// axis that is too long (width, then depth, then height).
pub fn check_dimensions_fit(item_id: &str, dims: &Dimensions, epsilon: f64) -> Result<(), PackingError> {
    check_axis_fits(item_id, dims.width, CONTAINER_LENGTH, Axis::Width, epsilon)?;
    check_axis_fits(item_id, dims.depth, CONTAINER_WIDTH, Axis::Depth, epsilon)?;
    check_axis_fits(item_id, dims.height, CONTAINER_HEIGHT, Axis::Height, epsilon)?;
    Ok(())
}

impl Dimensional for SelectedItem {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.depth, self.height)
    }
}

/// A single unit produced by expanding a `SelectedItem`.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpandedItem {
    pub item_id: String,
    /// Position among all copies sharing `item_id`
    pub instance_index: usize,
    pub dimensions: Dimensions,
    pub color: String,
    /// Position in the expanded list before sorting; tie-breaker only.
    pub(crate) sequence: usize,
}

impl ExpandedItem {
    /// Same check as `SelectedItem::check_fits_storage_unit`, per unit.
    pub fn check_fits_storage_unit(&self, epsilon: f64) -> Result<(), PackingError> {
        check_dimensions_fit(&self.item_id, &self.dimensions, epsilon)
    }
}

impl Dimensional for ExpandedItem {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }
}

/// A unit with its final place inside a storage unit.
///
/// `position` is the minimum corner relative to the container origin.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackedItem {
    pub item_id: String,
    pub instance_index: usize,
    pub container_index: usize,
    pub position: Vec3,
    pub dimensions: Dimensions,
    pub color: String,
}

impl PackedItem {
    pub(crate) fn from_expanded(item: ExpandedItem, container_index: usize, position: Vec3) -> Self {
        Self {
            item_id: item.item_id,
            instance_index: item.instance_index,
            container_index,
            position,
            dimensions: item.dimensions,
            color: item.color,
        }
    }
}

impl Positioned for PackedItem {
    fn position(&self) -> Vec3 {
        self.position
    }
}

impl Dimensional for PackedItem {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_GENERAL;

    fn item(width: f64, depth: f64, height: f64) -> SelectedItem {
        SelectedItem {
            item_id: "box".to_string(),
            quantity: 1,
            width,
            depth,
            height,
            color: String::new(),
        }
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        for (w, d, h, axis) in [
            (0.0, 10.0, 10.0, Axis::Width),
            (10.0, -1.0, 10.0, Axis::Depth),
            (10.0, 10.0, f64::NAN, Axis::Height),
            (10.0, 10.0, f64::INFINITY, Axis::Height),
        ] {
            match item(w, d, h).validate() {
                Err(ValidationError::InvalidDimension { axis: got, .. }) => assert_eq!(got, axis),
                other => panic!("expected dimension error for {axis}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_zero_quantity() {
        let mut zero = item(10.0, 10.0, 10.0);
        zero.quantity = 0;
        assert!(matches!(
            zero.validate(),
            Err(ValidationError::InvalidQuantity { quantity: 0, .. })
        ));
    }

    #[test]
    fn exact_storage_unit_size_fits() {
        let exact = item(CONTAINER_LENGTH, CONTAINER_WIDTH, CONTAINER_HEIGHT);
        assert!(exact.check_fits_storage_unit(EPSILON_GENERAL).is_ok());
    }

    #[test]
    fn oversized_items_name_the_blocking_axis() {
        let cases = [
            (item(96.0, 10.0, 10.0), Axis::Width),
            (item(10.0, 57.0, 10.0), Axis::Depth),
            (item(10.0, 10.0, 84.0), Axis::Height),
        ];
        for (oversized, expected) in cases {
            match oversized.check_fits_storage_unit(EPSILON_GENERAL) {
                Err(PackingError::UnplaceableItem { axis, .. }) => assert_eq!(axis, expected),
                other => panic!("expected unplaceable error, got {other:?}"),
            }
        }
    }

    #[test]
    fn expanded_unit_reports_its_own_blocking_axis() {
        let unit = ExpandedItem {
            item_id: "mirror".to_string(),
            instance_index: 3,
            dimensions: Dimensions::new(40.0, 60.0, 50.0),
            color: String::new(),
            sequence: 0,
        };
        match unit.check_fits_storage_unit(EPSILON_GENERAL) {
            Err(PackingError::UnplaceableItem {
                item_id,
                axis,
                size,
                limit,
            }) => {
                assert_eq!(item_id, "mirror");
                assert_eq!(axis, Axis::Depth);
                assert_eq!(size, 60.0);
                assert_eq!(limit, CONTAINER_WIDTH);
            }
            other => panic!("expected unplaceable error, got {other:?}"),
        }
    }

    #[test]
    fn rotated_fit_is_not_considered() {
        // Would fit if width and depth were swapped.
        let sideways = item(CONTAINER_WIDTH, CONTAINER_LENGTH, 10.0);
        assert!(matches!(
            sideways.check_fits_storage_unit(EPSILON_GENERAL),
            Err(PackingError::UnplaceableItem {
                axis: Axis::Depth,
                ..
            })
        ));
    }

    #[test]
    fn color_defaults_to_empty_when_missing() {
        let json = r#"{"item_id": "lamp", "quantity": 1, "width": 10.0, "depth": 10.0, "height": 50.0}"#;
        let parsed: SelectedItem = serde_json::from_str(json).expect("Should parse valid JSON");
        assert_eq!(parsed.color, "");
        assert!((parsed.volume() - 5000.0).abs() < EPSILON_GENERAL);
    }
}
