//! The example rooms.
//!
//! Every room is laid out above the shell's floor, whose top face sits at
//! [`GROUND_Y`] with the default config.

use demo_shared::render::Color;

use crate::registry::{RegistryError, SceneRegistry};

pub mod all_shapes;
pub mod api_usage;
pub mod car;
pub mod cluster;
pub mod components;
pub mod cradle;
pub mod joints;
pub mod kinematics;
pub mod shapes;
pub mod transforms;

/// Height of the floor's top face.
pub const GROUND_Y: f32 = -12.5;

const PALETTE: [Color; 6] = [
    Color::rgb(0.91, 0.30, 0.24),
    Color::rgb(0.95, 0.77, 0.06),
    Color::rgb(0.18, 0.80, 0.44),
    Color::rgb(0.20, 0.60, 0.86),
    Color::rgb(0.61, 0.35, 0.71),
    Color::rgb(0.90, 0.49, 0.13),
];

/// Cycling color for the `i`th object of a room.
pub fn palette(i: usize) -> Color {
    PALETTE[i % PALETTE.len()]
}

/// Registers every room, in navigation order.
pub fn register_all(registry: &mut SceneRegistry) -> Result<(), RegistryError> {
    registry.register("/", "Shapes", shapes::mount)?;
    registry.register("/joints", "Joints", joints::mount)?;
    registry.register("/components", "Components", components::mount)?;
    registry.register("/cradle", "Cradle", cradle::mount)?;
    registry.register("/cluster", "Cluster", cluster::mount)?;
    registry.register("/all-shapes", "All Shapes", all_shapes::mount)?;
    registry.register("/car", "Simple Car", car::mount)?;
    registry.register("/transforms", "Inherited Transforms", transforms::mount)?;
    registry.register("/api-usage", "API usage", api_usage::mount)?;
    registry.register("/kinematics", "Kinematics", kinematics::mount)?;
    Ok(())
}
