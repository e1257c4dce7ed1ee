//! Conversion of inch-based layouts into renderer coordinates.
//!
//! The renderer positions meshes by their centre. Storage units are drawn
//! side by side along X, `CONTAINER_GAP` apart, each centred on its own
//! footprint with the floor at `y = 0`. `scale` converts inches to scene units.

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{CONTAINER_GAP, CONTAINER_HEIGHT, CONTAINER_LENGTH, CONTAINER_WIDTH, PackedItem};
use crate::optimizer::PackingResult;
use crate::types::{BoundingBox, Dimensions, Vec3};

/// Box size in renderer axis order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct VisualizationDimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

fn container_offset_x(container_index: usize) -> f64 {
    container_index as f64 * (CONTAINER_LENGTH + CONTAINER_GAP)
}

/// Centre of a placed unit in scene coordinates.
pub fn to_visualization_position(
    position: Vec3,
    dimensions: Dimensions,
    container_index: usize,
    scale: f64,
) -> Vec3 {
    let center = BoundingBox::from_position_and_extent(position, dimensions.as_extent()).center();
    Vec3::new(
        (container_offset_x(container_index) + center.x - CONTAINER_LENGTH / 2.0) * scale,
        center.y * scale,
        (center.z - CONTAINER_WIDTH / 2.0) * scale,
    )
}

pub fn to_visualization_dimensions(dimensions: Dimensions, scale: f64) -> VisualizationDimensions {
    VisualizationDimensions {
        width: dimensions.width * scale,
        height: dimensions.height * scale,
        depth: dimensions.depth * scale,
    }
}

/// Size of a storage unit shell in scene units.
pub fn get_container_visualization_dimensions(scale: f64) -> VisualizationDimensions {
    VisualizationDimensions {
        width: CONTAINER_LENGTH * scale,
        height: CONTAINER_HEIGHT * scale,
        depth: CONTAINER_WIDTH * scale,
    }
}

/// Centre of a storage unit shell in scene coordinates.
pub fn get_container_center_position(container_index: usize, scale: f64) -> Vec3 {
    Vec3::new(
        container_offset_x(container_index) * scale,
        CONTAINER_HEIGHT / 2.0 * scale,
        0.0,
    )
}

/// A storage unit shell ready to render.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ContainerShell {
    pub container_index: usize,
    pub center: Vec3,
    pub dimensions: VisualizationDimensions,
}

/// A placed unit ready to render.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct VisualItem {
    pub item_id: String,
    pub instance_index: usize,
    pub container_index: usize,
    pub center: Vec3,
    pub dimensions: VisualizationDimensions,
    pub color: String,
}

impl VisualItem {
    fn from_packed(item: &PackedItem, scale: f64) -> Self {
        Self {
            item_id: item.item_id.clone(),
            instance_index: item.instance_index,
            container_index: item.container_index,
            center: to_visualization_position(
                item.position,
                item.dimensions,
                item.container_index,
                scale,
            ),
            dimensions: to_visualization_dimensions(item.dimensions, scale),
            color: item.color.clone(),
        }
    }
}

/// Everything a renderer needs to draw a packing result.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct VisualizationScene {
    pub scale: f64,
    pub containers: Vec<ContainerShell>,
    pub items: Vec<VisualItem>,
}

/// Maps a whole packing result into scene coordinates.
pub fn visualize(result: &PackingResult, scale: f64) -> VisualizationScene {
    let shell_dimensions = get_container_visualization_dimensions(scale);
    VisualizationScene {
        scale,
        containers: (0..result.container_count)
            .map(|container_index| ContainerShell {
                container_index,
                center: get_container_center_position(container_index, scale),
                dimensions: shell_dimensions,
            })
            .collect(),
        items: result
            .packed_items
            .iter()
            .map(|item| VisualItem::from_packed(item, scale))
            .collect(),
    }
}
