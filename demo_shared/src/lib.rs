//! `demo_shared`
//!
//! Building blocks used by the demo shell and its example rooms.
//!
//! Design goals:
//! - Backend-agnostic: physics and rendering sit behind traits.
//! - Clear separation of concerns (math, scene graph, physics, render, UI).
//! - Headless by default; a real simulation is one backend away.
//! - No `unsafe`.

pub mod config;
pub mod ecs;
pub mod event;
pub mod math;
pub mod physics;
pub mod rapier;
pub mod render;
pub mod resources;
pub mod ui;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::ecs::*;
    pub use crate::math::*;
    pub use crate::physics::*;
    pub use crate::render::*;
    pub use crate::ui::*;
}
