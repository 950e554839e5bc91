//! `demo_shell`
//!
//! The application shell around the example rooms:
//! - Scene registry and router/switcher (one mounted scene at a time)
//! - Auxiliary UI slot with epoch-bound publishers
//! - Environment loading, orbit camera, floor, navigation strip
//! - The ten example rooms
//! - A text front-end for headless runs

pub mod camera;
pub mod console_view;
pub mod environment;
pub mod input;
pub mod nav;
pub mod registry;
pub mod router;
pub mod scene;
pub mod scenes;
pub mod shell;
pub mod slot;

pub use registry::SceneRegistry;
pub use router::MountState;
pub use shell::Shell;
