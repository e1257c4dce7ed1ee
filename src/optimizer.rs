//! Shelf-based packing of a customer's inventory into storage units.
//!
//! The engine is a Next-Fit-Decreasing heuristic:
//! - items are expanded to single units and sorted tallest first
//! - each unit goes into the current row of the current shelf if it fits,
//!   otherwise into a new row, a new shelf above, or a fresh storage unit
//! - nothing is ever revisited, so the result is deterministic but not optimal
//!
//! Items keep the orientation they were entered with.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::error::{PackingError, Result};
use crate::metrics::PackingMetrics;
use crate::model::{
    CONTAINER_HEIGHT, CONTAINER_LENGTH, CONTAINER_WIDTH, ExpandedItem, ITEM_GAP, PackedItem,
    SelectedItem,
};
use crate::types::{Dimensions, Vec3};

/// Configuration for the packing engine.
#[derive(Copy, Clone, Debug)]
pub struct PackingConfig {
    /// Upper bound for the number of units after expanding quantities
    pub max_expanded_items: usize,
    /// Numerical tolerance for fit comparisons
    pub general_epsilon: f64,
}

impl PackingConfig {
    pub const DEFAULT_MAX_EXPANDED_ITEMS: usize = 10_000;
    pub const DEFAULT_GENERAL_EPSILON: f64 = 1e-6;
    /// Largest accepted tolerance. Anything wider would let oversized units
    /// through the fit check and out of the storage unit.
    pub const MAX_GENERAL_EPSILON: f64 = 1e-3;

    /// Whether `epsilon` is usable as fit tolerance.
    pub fn is_valid_general_epsilon(epsilon: f64) -> bool {
        epsilon > 0.0 && epsilon <= Self::MAX_GENERAL_EPSILON
    }

    /// Creates a builder for custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            max_expanded_items: Self::DEFAULT_MAX_EXPANDED_ITEMS,
            general_epsilon: Self::DEFAULT_GENERAL_EPSILON,
        }
    }
}

/// Builder for `PackingConfig`.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    pub fn max_expanded_items(mut self, limit: usize) -> Self {
        self.config.max_expanded_items = limit;
        self
    }

    /// Sets the fit tolerance. Values outside `(0, MAX_GENERAL_EPSILON]`
    /// are ignored and the previous tolerance is kept.
    pub fn general_epsilon(mut self, epsilon: f64) -> Self {
        if PackingConfig::is_valid_general_epsilon(epsilon) {
            self.config.general_epsilon = epsilon;
        } else {
            warn!(
                epsilon,
                kept = self.config.general_epsilon,
                "ignoring out-of-range fit tolerance"
            );
        }
        self
    }

    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Result of a packing run.
///
/// `packed_items` is in placement order, not spatial order.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackingResult {
    pub packed_items: Vec<PackedItem>,
    pub container_count: usize,
    pub total_volume_cubic_feet: f64,
    pub last_container_fill_percent: f64,
}

impl PackingResult {
    fn from_items(packed_items: Vec<PackedItem>) -> Self {
        let metrics = PackingMetrics::calculate(&packed_items);
        Self {
            packed_items,
            container_count: metrics.container_count,
            total_volume_cubic_feet: metrics.total_volume_cubic_feet,
            last_container_fill_percent: metrics.last_container_fill_percent,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.packed_items.is_empty()
    }
}

/// Events emitted while packing, for live visualization.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// A new storage unit is opened.
    ContainerStarted { container_index: usize },
    /// A new shelf is opened at height `y`.
    ShelfStarted { container_index: usize, y: f64 },
    /// A unit was placed.
    ItemPlaced {
        item_id: String,
        instance_index: usize,
        container_index: usize,
        position: Vec3,
        dimensions: Dimensions,
        color: String,
    },
    /// Packing finished.
    Finished { containers: usize, items: usize },
}

/// Placement cursor for one horizontal layer of a storage unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShelfState {
    /// Floor height of the shelf
    pub y: f64,
    /// Tallest item on the shelf so far
    pub height: f64,
    /// Next free X offset in the current row
    pub current_x: f64,
    /// Z offset of the current row
    pub current_z: f64,
    /// Deepest item in the current row
    pub row_max_z: f64,
}

impl ShelfState {
    /// An empty shelf with its floor at `y`.
    pub const fn at(y: f64) -> Self {
        Self {
            y,
            height: 0.0,
            current_x: 0.0,
            current_z: 0.0,
            row_max_z: 0.0,
        }
    }

    fn after_placing(self, dims: &Dimensions) -> Self {
        Self {
            current_x: self.current_x + dims.width + ITEM_GAP,
            height: self.height.max(dims.height),
            row_max_z: self.row_max_z.max(dims.depth),
            ..self
        }
    }
}

/// Tries to place a unit on the given shelf.
///
/// Extends the current row first, then opens a new row behind it. Returns the
/// advanced shelf and the unit's minimum corner, or `None` if the shelf has no
/// room left for it. The shelf height is not checked here: units arrive
/// tallest first, so the first unit of a shelf bounds the rest.
///
/// # Examples
/// ```
/// use storage_fit::optimizer::{ShelfState, try_place};
/// use storage_fit::types::{Dimensions, Vec3};
///
/// let dims = Dimensions::new(40.0, 30.0, 30.0);
/// let (shelf, position) = try_place(&dims, ShelfState::at(0.0), 1e-6).unwrap();
/// assert_eq!(position, Vec3::zero());
/// assert_eq!(shelf.current_x, 41.0);
/// ```
pub fn try_place(dims: &Dimensions, shelf: ShelfState, epsilon: f64) -> Option<(ShelfState, Vec3)> {
    if shelf.current_x + dims.width <= CONTAINER_LENGTH + epsilon
        && shelf.current_z + dims.depth <= CONTAINER_WIDTH + epsilon
    {
        let position = Vec3::new(shelf.current_x, shelf.y, shelf.current_z);
        return Some((shelf.after_placing(dims), position));
    }

    let new_row_z = shelf.current_z + shelf.row_max_z + ITEM_GAP;
    if new_row_z + dims.depth <= CONTAINER_WIDTH + epsilon
        && dims.width <= CONTAINER_LENGTH + epsilon
    {
        let row = ShelfState {
            current_x: 0.0,
            current_z: new_row_z,
            row_max_z: 0.0,
            ..shelf
        };
        let position = Vec3::new(0.0, row.y, new_row_z);
        return Some((row.after_placing(dims), position));
    }

    None
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Cursor {
    container_index: usize,
    shelf: ShelfState,
}

impl Cursor {
    const START: Cursor = Cursor {
        container_index: 0,
        shelf: ShelfState::at(0.0),
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transition {
    SameShelf,
    NewShelf,
    NewContainer,
}

/// Places a unit relative to the cursor, opening a shelf or storage unit when
/// the current shelf is full.
fn advance_cursor(dims: &Dimensions, cursor: Cursor, epsilon: f64) -> Option<(Cursor, Vec3, Transition)> {
    if let Some((shelf, position)) = try_place(dims, cursor.shelf, epsilon) {
        let next = Cursor { shelf, ..cursor };
        return Some((next, position, Transition::SameShelf));
    }

    let new_shelf_y = cursor.shelf.y + cursor.shelf.height + ITEM_GAP;
    if new_shelf_y + dims.height <= CONTAINER_HEIGHT + epsilon {
        if let Some((shelf, position)) = try_place(dims, ShelfState::at(new_shelf_y), epsilon) {
            let next = Cursor { shelf, ..cursor };
            return Some((next, position, Transition::NewShelf));
        }
    }

    try_place(dims, ShelfState::at(0.0), epsilon).map(|(shelf, position)| {
        let next = Cursor {
            container_index: cursor.container_index + 1,
            shelf,
        };
        (next, position, Transition::NewContainer)
    })
}

/// Expands quantities into single units, tallest first.
///
/// `instance_index` counts copies per `item_id` in list order, continuing
/// across repeated entries of the same id. Units of equal height keep their
/// expansion order.
pub fn expand_items(items: &[SelectedItem]) -> Vec<ExpandedItem> {
    let mut per_id: HashMap<&str, usize> = HashMap::new();
    let mut expanded = Vec::new();

    for item in items {
        let next_index = per_id.entry(item.item_id.as_str()).or_insert(0);
        for _ in 0..item.quantity {
            expanded.push(ExpandedItem {
                item_id: item.item_id.clone(),
                instance_index: *next_index,
                dimensions: Dimensions::new(item.width, item.depth, item.height),
                color: item.color.clone(),
                sequence: expanded.len(),
            });
            *next_index += 1;
        }
    }

    // sort_by is stable; the sequence tie-break keeps that explicit.
    expanded.sort_by(|a, b| {
        b.dimensions
            .height
            .partial_cmp(&a.dimensions.height)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.sequence.cmp(&b.sequence))
    });
    expanded
}

/// Rejects the request before anything is placed.
fn validate_request(items: &[SelectedItem], config: &PackingConfig) -> Result<()> {
    for item in items {
        item.validate()?;
    }

    let requested: u64 = items.iter().map(|item| u64::from(item.quantity)).sum();
    let limit = config.max_expanded_items as u64;
    if requested > limit {
        return Err(PackingError::CapacityExceeded { requested, limit });
    }

    for item in items {
        item.check_fits_storage_unit(config.general_epsilon)?;
    }
    Ok(())
}

/// Packs the items into as many storage units as the heuristic needs.
///
/// # Examples
/// ```
/// use storage_fit::model::SelectedItem;
/// use storage_fit::optimizer::pack_items;
///
/// let items = vec![SelectedItem::new("box", 1, 40.0, 30.0, 30.0, "#cccccc").unwrap()];
/// let result = pack_items(&items).unwrap();
/// assert_eq!(result.container_count, 1);
/// ```
pub fn pack_items(items: &[SelectedItem]) -> Result<PackingResult> {
    pack_items_with_config(items, PackingConfig::default())
}

/// Like `pack_items`, with custom limits and tolerance.
pub fn pack_items_with_config(items: &[SelectedItem], config: PackingConfig) -> Result<PackingResult> {
    pack_items_with_progress(items, config, |_| {})
}

/// Packing with a progress callback (suitable for SSE).
///
/// # Parameters
/// * `items` - Inventory lines as entered by the customer
/// * `config` - Item limit and fit tolerance
/// * `on_event` - Called for every storage unit, shelf and placement, then
///   once with `Finished`
///
/// # Returns
/// The complete layout with metrics, or the first error found. Events are
/// emitted only once the request has passed validation, so a rejected
/// request produces none.
pub fn pack_items_with_progress(
    items: &[SelectedItem],
    config: PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> Result<PackingResult> {
    validate_request(items, &config)?;

    let ordered = expand_items(items);
    let mut packed: Vec<PackedItem> = Vec::with_capacity(ordered.len());
    let mut cursor = Cursor::START;

    for item in ordered {
        let Some((next, position, transition)) =
            advance_cursor(&item.dimensions, cursor, config.general_epsilon)
        else {
            // Unreachable after validation; reported rather than dropped.
            item.check_fits_storage_unit(config.general_epsilon)?;
            return Err(PackingError::PlacementFailed {
                item_id: item.item_id,
            });
        };

        if packed.is_empty() {
            on_event(&PackEvent::ContainerStarted { container_index: 0 });
            on_event(&PackEvent::ShelfStarted {
                container_index: 0,
                y: 0.0,
            });
        }
        match transition {
            Transition::SameShelf => {}
            Transition::NewShelf => {
                debug!(
                    container_index = next.container_index,
                    y = next.shelf.y,
                    "opened shelf"
                );
                on_event(&PackEvent::ShelfStarted {
                    container_index: next.container_index,
                    y: next.shelf.y,
                });
            }
            Transition::NewContainer => {
                debug!(container_index = next.container_index, "opened storage unit");
                on_event(&PackEvent::ContainerStarted {
                    container_index: next.container_index,
                });
                on_event(&PackEvent::ShelfStarted {
                    container_index: next.container_index,
                    y: 0.0,
                });
            }
        }

        let placed = PackedItem::from_expanded(item, next.container_index, position);
        on_event(&PackEvent::ItemPlaced {
            item_id: placed.item_id.clone(),
            instance_index: placed.instance_index,
            container_index: placed.container_index,
            position: placed.position,
            dimensions: placed.dimensions,
            color: placed.color.clone(),
        });
        packed.push(placed);
        cursor = next;
    }

    let result = PackingResult::from_items(packed);
    debug!(
        containers = result.container_count,
        items = result.packed_items.len(),
        volume_cubic_feet = result.total_volume_cubic_feet,
        "packing finished"
    );
    on_event(&PackEvent::Finished {
        containers: result.container_count,
        items: result.packed_items.len(),
    });
    Ok(result)
}
