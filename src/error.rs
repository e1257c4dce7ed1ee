//! Error types for the packing engine.
//!
//! Every failure is reported before any placement becomes visible to the
//! caller; there is no partial result.

use thiserror::Error;

/// Result type alias for packing operations.
pub type Result<T> = std::result::Result<T, PackingError>;

/// Invalid item data supplied by the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("quantity of item '{item_id}' must be positive, got: {quantity}")]
    InvalidQuantity { item_id: String, quantity: u32 },

    #[error("{axis} of item '{item_id}' must be a positive finite number, got: {value}")]
    InvalidDimension {
        item_id: String,
        axis: Axis,
        value: f64,
    },
}

/// Errors that can occur while packing a customer's inventory.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PackingError {
    /// An input item failed validation.
    #[error("Invalid input data: {0}")]
    Validation(#[from] ValidationError),

    /// The item exceeds a container dimension and can never be placed.
    #[error(
        "item '{item_id}' is too large for a single storage unit: {axis} is {size} in, limit is {limit} in"
    )]
    UnplaceableItem {
        item_id: String,
        axis: Axis,
        size: f64,
        limit: f64,
    },

    /// The expanded item count exceeds the configured ceiling.
    #[error("request expands to {requested} items, the limit is {limit}")]
    CapacityExceeded { requested: u64, limit: u64 },

    /// A unit that passed the fit check found no free slot.
    #[error("item '{item_id}' could not be placed in an empty storage unit")]
    PlacementFailed { item_id: String },
}

impl PackingError {
    /// Stable machine readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            PackingError::Validation(_) => "validation_error",
            PackingError::UnplaceableItem { .. } => "unplaceable_item",
            PackingError::CapacityExceeded { .. } => "capacity_exceeded",
            PackingError::PlacementFailed { .. } => "placement_failed",
        }
    }
}

/// Item axis named in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Depth,
    Height,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Width => write!(f, "width"),
            Axis::Depth => write!(f, "depth"),
            Axis::Height => write!(f, "height"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let validation = PackingError::from(ValidationError::InvalidQuantity {
            item_id: "sofa".to_string(),
            quantity: 0,
        });
        assert_eq!(validation.code(), "validation_error");

        let unplaceable = PackingError::UnplaceableItem {
            item_id: "piano".to_string(),
            axis: Axis::Height,
            size: 90.0,
            limit: 83.5,
        };
        assert_eq!(unplaceable.code(), "unplaceable_item");

        let capacity = PackingError::CapacityExceeded {
            requested: 20_000,
            limit: 10_000,
        };
        assert_eq!(capacity.code(), "capacity_exceeded");

        let failed = PackingError::PlacementFailed {
            item_id: "crate".to_string(),
        };
        assert_eq!(failed.code(), "placement_failed");
    }

    #[test]
    fn messages_name_the_offending_item() {
        let err = PackingError::UnplaceableItem {
            item_id: "piano".to_string(),
            axis: Axis::Height,
            size: 90.0,
            limit: 83.5,
        };
        let message = err.to_string();
        assert!(message.contains("piano"));
        assert!(message.contains("height"));
        assert!(message.contains("83.5"));

        let err = PackingError::from(ValidationError::InvalidDimension {
            item_id: "box".to_string(),
            axis: Axis::Depth,
            value: -2.0,
        });
        assert!(err.to_string().contains("depth of item 'box'"));
    }
}
