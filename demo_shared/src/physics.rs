//! Physics abstraction.
//!
//! The shell and the example rooms talk to the rigid-body engine through
//! [`PhysicsBackend`]. Two implementations exist:
//! - [`crate::rapier::RapierPhysics`], the real simulation.
//! - [`NullPhysics`], a bookkeeping-only backend for headless tests that
//!   records bodies and joints without solving anything.
//!
//! Handles are opaque and never reused within one backend instance, so a
//! handle held past its body's removal simply stops resolving.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::{Quat, Vec3};

/// Physics parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PhysicsConfig {
    #[serde(default = "default_gravity")]
    pub gravity: Vec3,
    #[serde(default = "default_solver_iterations")]
    pub solver_iterations: u32,
}

fn default_gravity() -> Vec3 {
    Vec3::new(0.0, -9.81, 0.0)
}

fn default_solver_iterations() -> u32 {
    4
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            solver_iterations: default_solver_iterations(),
        }
    }
}

/// Opaque rigid-body handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u64);

/// Opaque joint handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JointHandle(pub u64);

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    Dynamic,
    /// Never moves; infinite mass.
    Fixed,
    /// Moved by setting its next pose every step.
    KinematicPosition,
    /// Moved by setting its velocity.
    KinematicVelocity,
}

/// Collision shape, in the collider's local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Cuboid { half_extents: Vec3 },
    RoundCuboid { half_extents: Vec3, border_radius: f32 },
    Ball { radius: f32 },
    /// Y-aligned capsule.
    Capsule { half_height: f32, radius: f32 },
    /// Y-aligned cylinder.
    Cylinder { half_height: f32, radius: f32 },
    /// Y-aligned cone.
    Cone { half_height: f32, radius: f32 },
    ConvexHull { points: Vec<Vec3> },
}

impl ColliderShape {
    /// Half extents of the shape's local bounding box.
    pub fn half_extents(&self) -> Vec3 {
        match self {
            ColliderShape::Cuboid { half_extents } => *half_extents,
            ColliderShape::RoundCuboid {
                half_extents,
                border_radius,
            } => *half_extents + Vec3::splat(*border_radius),
            ColliderShape::Ball { radius } => Vec3::splat(*radius),
            ColliderShape::Capsule {
                half_height,
                radius,
            } => Vec3::new(*radius, half_height + radius, *radius),
            ColliderShape::Cylinder {
                half_height,
                radius,
            }
            | ColliderShape::Cone {
                half_height,
                radius,
            } => Vec3::new(*radius, *half_height, *radius),
            ColliderShape::ConvexHull { points } => points.iter().fold(Vec3::ZERO, |acc, p| {
                Vec3::new(acc.x.max(p.x.abs()), acc.y.max(p.y.abs()), acc.z.max(p.z.abs()))
            }),
        }
    }
}

/// A collider attached to a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColliderDesc {
    pub shape: ColliderShape,
    /// Offset relative to the parent body.
    pub offset: Vec3,
    pub rotation: Quat,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub sensor: bool,
}

impl ColliderDesc {
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            offset: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            density: 1.0,
            friction: 0.5,
            restitution: 0.0,
            sensor: false,
        }
    }

    pub fn cuboid(hx: f32, hy: f32, hz: f32) -> Self {
        Self::new(ColliderShape::Cuboid {
            half_extents: Vec3::new(hx, hy, hz),
        })
    }

    pub fn ball(radius: f32) -> Self {
        Self::new(ColliderShape::Ball { radius })
    }

    pub fn offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }
}

/// Everything needed to create a rigid body and its colliders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub linvel: Vec3,
    pub angvel: Vec3,
    pub gravity_scale: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub ccd: bool,
    pub can_sleep: bool,
    pub colliders: Vec<ColliderDesc>,
}

impl BodyDesc {
    pub fn new(kind: BodyKind) -> Self {
        Self {
            kind,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            linvel: Vec3::ZERO,
            angvel: Vec3::ZERO,
            gravity_scale: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            ccd: false,
            can_sleep: true,
            colliders: Vec::new(),
        }
    }

    pub fn dynamic() -> Self {
        Self::new(BodyKind::Dynamic)
    }

    pub fn fixed() -> Self {
        Self::new(BodyKind::Fixed)
    }

    pub fn kinematic_position() -> Self {
        Self::new(BodyKind::KinematicPosition)
    }

    pub fn kinematic_velocity() -> Self {
        Self::new(BodyKind::KinematicVelocity)
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotated(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn linvel(mut self, linvel: Vec3) -> Self {
        self.linvel = linvel;
        self
    }

    pub fn angvel(mut self, angvel: Vec3) -> Self {
        self.angvel = angvel;
        self
    }

    pub fn gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }

    pub fn with_collider(mut self, collider: ColliderDesc) -> Self {
        self.colliders.push(collider);
        self
    }
}

/// Joint between two bodies. Anchors are in each body's local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JointDesc {
    Fixed {
        anchor_a: Vec3,
        anchor_b: Vec3,
    },
    Spherical {
        anchor_a: Vec3,
        anchor_b: Vec3,
    },
    Revolute {
        axis: Vec3,
        anchor_a: Vec3,
        anchor_b: Vec3,
    },
    Prismatic {
        axis: Vec3,
        anchor_a: Vec3,
        anchor_b: Vec3,
        limits: Option<[f32; 2]>,
    },
}

/// Snapshot of a body's pose and velocities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub kind: BodyKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub linvel: Vec3,
    pub angvel: Vec3,
}

/// Physics stepper trait.
///
/// Mutators return `false` when the handle no longer resolves.
pub trait PhysicsBackend {
    fn name(&self) -> &'static str;

    /// Advances the simulation by `dt_sec`.
    fn step(&mut self, dt_sec: f32);

    fn gravity(&self) -> Vec3;
    fn set_gravity(&mut self, gravity: Vec3);

    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle;
    /// Removes a body, its colliders and every joint attached to it.
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    /// Returns `None` if either body is unknown.
    fn add_joint(&mut self, a: BodyHandle, b: BodyHandle, joint: &JointDesc) -> Option<JointHandle>;
    fn remove_joint(&mut self, handle: JointHandle) -> bool;

    fn body_state(&self, handle: BodyHandle) -> Option<BodyState>;

    /// Target pose for a kinematic position-based body, reached on next step.
    fn set_next_kinematic_pose(&mut self, handle: BodyHandle, position: Vec3, rotation: Quat) -> bool;
    fn set_linvel(&mut self, handle: BodyHandle, linvel: Vec3) -> bool;
    fn set_angvel(&mut self, handle: BodyHandle, angvel: Vec3) -> bool;
    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3) -> bool;
    fn apply_torque_impulse(&mut self, handle: BodyHandle, impulse: Vec3) -> bool;
    /// Replaces the persistent user force applied every step.
    fn set_force(&mut self, handle: BodyHandle, force: Vec3) -> bool;
    fn set_gravity_scale(&mut self, handle: BodyHandle, scale: f32) -> bool;

    fn body_count(&self) -> usize;
    fn joint_count(&self) -> usize;
}

struct NullBody {
    state: BodyState,
    next_pose: Option<(Vec3, Quat)>,
}

/// Bookkeeping-only physics.
///
/// Bodies keep the pose they were created with (kinematic targets and
/// velocities are applied verbatim on `step`); nothing collides.
#[derive(Default)]
pub struct NullPhysics {
    gravity: Vec3,
    next_id: u64,
    bodies: BTreeMap<BodyHandle, NullBody>,
    joints: BTreeMap<JointHandle, (BodyHandle, BodyHandle)>,
    steps: u64,
}

impl NullPhysics {
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            gravity: config.gravity,
            ..Self::default()
        }
    }

    /// Number of `step` calls so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl PhysicsBackend for NullPhysics {
    fn name(&self) -> &'static str {
        "null"
    }

    fn step(&mut self, dt_sec: f32) {
        self.steps += 1;
        for body in self.bodies.values_mut() {
            match body.state.kind {
                BodyKind::Fixed => {}
                BodyKind::KinematicPosition => {
                    if let Some((position, rotation)) = body.next_pose.take() {
                        body.state.position = position;
                        body.state.rotation = rotation;
                    }
                }
                BodyKind::Dynamic | BodyKind::KinematicVelocity => {
                    body.state.position += body.state.linvel * dt_sec;
                }
            }
        }
    }

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next());
        self.bodies.insert(
            handle,
            NullBody {
                state: BodyState {
                    kind: desc.kind,
                    position: desc.position,
                    rotation: desc.rotation,
                    linvel: desc.linvel,
                    angvel: desc.angvel,
                },
                next_pose: None,
            },
        );
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        if self.bodies.remove(&handle).is_none() {
            return false;
        }
        self.joints.retain(|_, (a, b)| *a != handle && *b != handle);
        true
    }

    fn add_joint(&mut self, a: BodyHandle, b: BodyHandle, _joint: &JointDesc) -> Option<JointHandle> {
        if !self.bodies.contains_key(&a) || !self.bodies.contains_key(&b) {
            return None;
        }
        let handle = JointHandle(self.next());
        self.joints.insert(handle, (a, b));
        Some(handle)
    }

    fn remove_joint(&mut self, handle: JointHandle) -> bool {
        self.joints.remove(&handle).is_some()
    }

    fn body_state(&self, handle: BodyHandle) -> Option<BodyState> {
        self.bodies.get(&handle).map(|b| b.state)
    }

    fn set_next_kinematic_pose(&mut self, handle: BodyHandle, position: Vec3, rotation: Quat) -> bool {
        match self.bodies.get_mut(&handle) {
            Some(body) => {
                body.next_pose = Some((position, rotation));
                true
            }
            None => false,
        }
    }

    fn set_linvel(&mut self, handle: BodyHandle, linvel: Vec3) -> bool {
        self.bodies
            .get_mut(&handle)
            .map(|b| b.state.linvel = linvel)
            .is_some()
    }

    fn set_angvel(&mut self, handle: BodyHandle, angvel: Vec3) -> bool {
        self.bodies
            .get_mut(&handle)
            .map(|b| b.state.angvel = angvel)
            .is_some()
    }

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3) -> bool {
        self.bodies
            .get_mut(&handle)
            .map(|b| b.state.linvel += impulse)
            .is_some()
    }

    fn apply_torque_impulse(&mut self, handle: BodyHandle, impulse: Vec3) -> bool {
        self.bodies
            .get_mut(&handle)
            .map(|b| b.state.angvel += impulse)
            .is_some()
    }

    fn set_force(&mut self, handle: BodyHandle, _force: Vec3) -> bool {
        self.bodies.contains_key(&handle)
    }

    fn set_gravity_scale(&mut self, handle: BodyHandle, _scale: f32) -> bool {
        self.bodies.contains_key(&handle)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn joint_count(&self) -> usize {
        self.joints.len()
    }
}
