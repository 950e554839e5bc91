//! Rapier physics backend.
//!
//! Full rigid-body simulation through `rapier3d`. Rapier handles are kept
//! private; callers only ever see [`BodyHandle`] / [`JointHandle`].

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::*;
use tracing::{debug, warn};

use crate::math::{Quat, Vec3};
use crate::physics::{
    BodyDesc, BodyHandle, BodyKind, BodyState, ColliderDesc, ColliderShape, JointDesc,
    JointHandle, PhysicsBackend, PhysicsConfig,
};

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn to_point(v: Vec3) -> Point<Real> {
    point![v.x, v.y, v.z]
}

fn to_rotation(q: Quat) -> Rotation<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn from_rotation(r: &Rotation<Real>) -> Quat {
    Quat {
        x: r.i,
        y: r.j,
        z: r.k,
        w: r.w,
    }
}

fn shared_shape(shape: &ColliderShape) -> SharedShape {
    match shape {
        ColliderShape::Cuboid { half_extents } => {
            SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ColliderShape::RoundCuboid {
            half_extents,
            border_radius,
        } => SharedShape::round_cuboid(
            half_extents.x,
            half_extents.y,
            half_extents.z,
            *border_radius,
        ),
        ColliderShape::Ball { radius } => SharedShape::ball(*radius),
        ColliderShape::Capsule {
            half_height,
            radius,
        } => SharedShape::capsule_y(*half_height, *radius),
        ColliderShape::Cylinder {
            half_height,
            radius,
        } => SharedShape::cylinder(*half_height, *radius),
        ColliderShape::Cone {
            half_height,
            radius,
        } => SharedShape::cone(*half_height, *radius),
        ColliderShape::ConvexHull { points } => {
            let hull: Vec<Point<Real>> = points.iter().copied().map(to_point).collect();
            SharedShape::convex_hull(&hull).unwrap_or_else(|| {
                warn!(points = points.len(), "degenerate convex hull, using its bounding ball");
                SharedShape::ball(shape.half_extents().length().max(0.05))
            })
        }
    }
}

fn build_collider(desc: &ColliderDesc) -> Collider {
    ColliderBuilder::new(shared_shape(&desc.shape))
        .translation(to_vector(desc.offset))
        .rotation(to_rotation(desc.rotation).scaled_axis())
        .density(desc.density)
        .friction(desc.friction)
        .restitution(desc.restitution)
        .sensor(desc.sensor)
        .build()
}

fn build_joint(joint: &JointDesc) -> GenericJoint {
    match joint {
        JointDesc::Fixed { anchor_a, anchor_b } => FixedJointBuilder::new()
            .local_anchor1(to_point(*anchor_a))
            .local_anchor2(to_point(*anchor_b))
            .build()
            .into(),
        JointDesc::Spherical { anchor_a, anchor_b } => SphericalJointBuilder::new()
            .local_anchor1(to_point(*anchor_a))
            .local_anchor2(to_point(*anchor_b))
            .build()
            .into(),
        JointDesc::Revolute {
            axis,
            anchor_a,
            anchor_b,
        } => RevoluteJointBuilder::new(UnitVector::new_normalize(to_vector(*axis)))
            .local_anchor1(to_point(*anchor_a))
            .local_anchor2(to_point(*anchor_b))
            .build()
            .into(),
        JointDesc::Prismatic {
            axis,
            anchor_a,
            anchor_b,
            limits,
        } => {
            let mut builder =
                PrismaticJointBuilder::new(UnitVector::new_normalize(to_vector(*axis)))
                    .local_anchor1(to_point(*anchor_a))
                    .local_anchor2(to_point(*anchor_b));
            if let Some(limits) = limits {
                builder = builder.limits(*limits);
            }
            builder.build().into()
        }
    }
}

/// Rapier physics backend.
pub struct RapierPhysics {
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    gravity: Vector<Real>,

    bodies: BTreeMap<BodyHandle, RigidBodyHandle>,
    joints: BTreeMap<JointHandle, ImpulseJointHandle>,
    next_handle: u64,
}

impl RapierPhysics {
    pub fn new(config: &PhysicsConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        if let Some(iterations) = NonZeroUsize::new(config.solver_iterations as usize) {
            integration_parameters.num_solver_iterations = iterations;
        }

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            gravity: to_vector(config.gravity),
            bodies: BTreeMap::new(),
            joints: BTreeMap::new(),
            next_handle: 0,
        }
    }

    /// Number of colliders, including those attached to fixed bodies.
    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        let raw = *self.bodies.get(&handle)?;
        self.rigid_body_set.get_mut(raw)
    }
}

impl PhysicsBackend for RapierPhysics {
    fn name(&self) -> &'static str {
        "rapier3d"
    }

    fn step(&mut self, dt_sec: f32) {
        self.integration_parameters.dt = dt_sec;

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    fn gravity(&self) -> Vec3 {
        from_vector(&self.gravity)
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = to_vector(gravity);
    }

    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let body_type = match desc.kind {
            BodyKind::Dynamic => RigidBodyType::Dynamic,
            BodyKind::Fixed => RigidBodyType::Fixed,
            BodyKind::KinematicPosition => RigidBodyType::KinematicPositionBased,
            BodyKind::KinematicVelocity => RigidBodyType::KinematicVelocityBased,
        };

        let body = RigidBodyBuilder::new(body_type)
            .translation(to_vector(desc.position))
            .rotation(to_rotation(desc.rotation).scaled_axis())
            .linvel(to_vector(desc.linvel))
            .angvel(to_vector(desc.angvel))
            .gravity_scale(desc.gravity_scale)
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .ccd_enabled(desc.ccd)
            .can_sleep(desc.can_sleep)
            .build();

        let raw = self.rigid_body_set.insert(body);
        for collider in &desc.colliders {
            self.collider_set
                .insert_with_parent(build_collider(collider), raw, &mut self.rigid_body_set);
        }

        let handle = BodyHandle(self.next());
        self.bodies.insert(handle, raw);
        debug!(?handle, kind = ?desc.kind, colliders = desc.colliders.len(), "body added");
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let Some(raw) = self.bodies.remove(&handle) else {
            return false;
        };
        self.rigid_body_set.remove(
            raw,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        // Rapier drops attached joints with the body; forget their handles too.
        let joint_set = &self.impulse_joint_set;
        self.joints.retain(|_, raw_joint| joint_set.get(*raw_joint).is_some());
        true
    }

    fn add_joint(&mut self, a: BodyHandle, b: BodyHandle, joint: &JointDesc) -> Option<JointHandle> {
        let raw_a = *self.bodies.get(&a)?;
        let raw_b = *self.bodies.get(&b)?;
        let raw = self
            .impulse_joint_set
            .insert(raw_a, raw_b, build_joint(joint), true);
        let handle = JointHandle(self.next());
        self.joints.insert(handle, raw);
        Some(handle)
    }

    fn remove_joint(&mut self, handle: JointHandle) -> bool {
        match self.joints.remove(&handle) {
            Some(raw) => self.impulse_joint_set.remove(raw, true).is_some(),
            None => false,
        }
    }

    fn body_state(&self, handle: BodyHandle) -> Option<BodyState> {
        let raw = self.bodies.get(&handle)?;
        let body = self.rigid_body_set.get(*raw)?;
        let kind = match body.body_type() {
            RigidBodyType::Dynamic => BodyKind::Dynamic,
            RigidBodyType::Fixed => BodyKind::Fixed,
            RigidBodyType::KinematicPositionBased => BodyKind::KinematicPosition,
            RigidBodyType::KinematicVelocityBased => BodyKind::KinematicVelocity,
        };
        Some(BodyState {
            kind,
            position: from_vector(body.translation()),
            rotation: from_rotation(body.rotation()),
            linvel: from_vector(body.linvel()),
            angvel: from_vector(body.angvel()),
        })
    }

    fn set_next_kinematic_pose(&mut self, handle: BodyHandle, position: Vec3, rotation: Quat) -> bool {
        match self.body_mut(handle) {
            Some(body) => {
                body.set_next_kinematic_translation(to_vector(position));
                body.set_next_kinematic_rotation(to_rotation(rotation));
                true
            }
            None => false,
        }
    }

    fn set_linvel(&mut self, handle: BodyHandle, linvel: Vec3) -> bool {
        self.body_mut(handle)
            .map(|body| body.set_linvel(to_vector(linvel), true))
            .is_some()
    }

    fn set_angvel(&mut self, handle: BodyHandle, angvel: Vec3) -> bool {
        self.body_mut(handle)
            .map(|body| body.set_angvel(to_vector(angvel), true))
            .is_some()
    }

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3) -> bool {
        self.body_mut(handle)
            .map(|body| body.apply_impulse(to_vector(impulse), true))
            .is_some()
    }

    fn apply_torque_impulse(&mut self, handle: BodyHandle, impulse: Vec3) -> bool {
        self.body_mut(handle)
            .map(|body| body.apply_torque_impulse(to_vector(impulse), true))
            .is_some()
    }

    fn set_force(&mut self, handle: BodyHandle, force: Vec3) -> bool {
        self.body_mut(handle)
            .map(|body| {
                body.reset_forces(true);
                body.add_force(to_vector(force), true);
            })
            .is_some()
    }

    fn set_gravity_scale(&mut self, handle: BodyHandle, scale: f32) -> bool {
        self.body_mut(handle)
            .map(|body| body.set_gravity_scale(scale, true))
            .is_some()
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn joint_count(&self) -> usize {
        self.joints.len()
    }
}
