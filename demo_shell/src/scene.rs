//! Scene contract.
//!
//! A scene is one example room. Its constructor and hooks receive a
//! [`SceneContext`]: the explicit bundle of everything a scene may touch
//! (UI publisher, location, physics, scene graph, input). Bodies, joints and
//! nodes created through the context are recorded in the mount's
//! [`MountScope`] and released when the scene is torn down, so scenes only
//! clean up what they keep outside the context.

use anyhow::Context;
use demo_shared::{
    ecs::{EntityId, Name, Parent, World},
    math::Transform,
    physics::{BodyDesc, BodyHandle, JointDesc, JointHandle, PhysicsBackend},
    render::{Color, Visual},
    ui::UiAction,
};
use tracing::debug;

use crate::{input::InputState, nav::Location, slot::UiPublisher};

/// A mounted example room.
pub trait Scene {
    /// Runs once per frame after the physics step.
    fn update(&mut self, _ctx: &mut SceneContext<'_>, _dt: f32) -> anyhow::Result<()> {
        Ok(())
    }

    /// A side-panel widget this scene published was used.
    fn on_ui_action(&mut self, _ctx: &mut SceneContext<'_>, _action: &UiAction) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs before the mount scope is released.
    fn teardown(&mut self, _ctx: &mut SceneContext<'_>) {}
}

/// A scene with no content.
#[derive(Debug, Default)]
pub struct EmptyScene;

impl Scene for EmptyScene {}

/// Scene-graph node that follows a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLink(pub BodyHandle);

/// The simulated and rendered world shared by the shell and its scenes.
pub struct Stage {
    pub physics: Box<dyn PhysicsBackend>,
    pub world: World,
}

impl Stage {
    pub fn new(physics: Box<dyn PhysicsBackend>) -> Self {
        Self {
            physics,
            world: World::default(),
        }
    }

    /// Copies every linked body's pose into its node's transform.
    pub fn sync_bodies(&mut self) {
        let links: Vec<(EntityId, BodyHandle)> = self
            .world
            .iter::<BodyLink>()
            .map(|(entity, link)| (entity, link.0))
            .collect();
        for (entity, body) in links {
            let Some(state) = self.physics.body_state(body) else {
                continue;
            };
            if let Some(transform) = self.world.get_mut::<Transform>(entity) {
                transform.translation = state.position;
                transform.rotation = state.rotation;
            }
        }
    }
}

/// Counts of what a scope released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Released {
    pub bodies: usize,
    pub joints: usize,
    pub entities: usize,
}

/// Everything one mount created through its context.
#[derive(Debug, Default)]
pub struct MountScope {
    bodies: Vec<(BodyHandle, EntityId)>,
    joints: Vec<JointHandle>,
    entities: Vec<EntityId>,
}

impl MountScope {
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty() && self.joints.is_empty() && self.entities.is_empty()
    }

    /// Removes joints, then bodies, then nodes, newest first.
    pub fn release(&mut self, physics: &mut dyn PhysicsBackend, world: &mut World) -> Released {
        let mut released = Released::default();
        for joint in self.joints.drain(..).rev() {
            if physics.remove_joint(joint) {
                released.joints += 1;
            }
        }
        for (body, _) in self.bodies.drain(..).rev() {
            if physics.remove_body(body) {
                released.bodies += 1;
            }
        }
        for entity in self.entities.drain(..).rev() {
            if world.despawn(entity) {
                released.entities += 1;
            }
        }
        released
    }
}

/// What a scene's constructor and hooks are handed.
pub struct SceneContext<'a> {
    /// Write access to the side panel for this mount.
    pub ui: UiPublisher,
    pub location: Location,
    pub input: InputState,
    /// Seconds since the scene was mounted.
    pub elapsed: f32,
    pub physics: &'a mut dyn PhysicsBackend,
    pub world: &'a mut World,
    scope: &'a mut MountScope,
}

impl<'a> SceneContext<'a> {
    pub fn new(
        ui: UiPublisher,
        location: Location,
        input: InputState,
        stage: &'a mut Stage,
        scope: &'a mut MountScope,
    ) -> Self {
        Self {
            ui,
            location,
            input,
            elapsed: 0.0,
            physics: stage.physics.as_mut(),
            world: &mut stage.world,
            scope,
        }
    }

    /// Creates a body plus one mesh per collider, colored `color`.
    pub fn spawn_body(&mut self, desc: &BodyDesc, color: Color) -> BodyHandle {
        let body = self.physics.add_body(desc);
        let entity = self.world.spawn();
        self.world.insert(
            entity,
            Transform::from_translation(desc.position).with_rotation(desc.rotation),
        );
        self.world.insert(entity, BodyLink(body));
        self.scope.bodies.push((body, entity));
        self.scope.entities.push(entity);

        for collider in &desc.colliders {
            let part = self.world.spawn();
            self.world.insert(part, Parent(entity));
            self.world.insert(
                part,
                Transform::from_translation(collider.offset).with_rotation(collider.rotation),
            );
            self.world.insert(part, Visual::new(collider.shape.clone(), color));
            self.scope.entities.push(part);
        }
        debug!(body = body.0, colliders = desc.colliders.len(), "Spawned body");
        body
    }

    /// Like [`Self::spawn_body`], with `desc`'s pose relative to `parent`.
    pub fn spawn_body_in(&mut self, parent: EntityId, desc: &BodyDesc, color: Color) -> BodyHandle {
        let local = Transform::from_translation(desc.position).with_rotation(desc.rotation);
        let global = self.world.global_transform(parent).compose(&local);
        let mut placed = desc.clone();
        placed.position = global.translation;
        placed.rotation = global.rotation;
        self.spawn_body(&placed, color)
    }

    /// Creates a scene-graph node, optionally drawn.
    pub fn spawn_node(
        &mut self,
        parent: Option<EntityId>,
        transform: Transform,
        visual: Option<Visual>,
    ) -> EntityId {
        let entity = self.world.spawn();
        self.world.insert(entity, transform);
        if let Some(parent) = parent {
            self.world.insert(entity, Parent(parent));
        }
        if let Some(visual) = visual {
            self.world.insert(entity, visual);
        }
        self.scope.entities.push(entity);
        entity
    }

    /// Names a node for logs and lookups.
    pub fn name(&mut self, entity: EntityId, name: &str) {
        self.world.insert(entity, Name(name.to_string()));
    }

    /// Node that follows `body`.
    pub fn body_entity(&self, body: BodyHandle) -> Option<EntityId> {
        self.scope
            .bodies
            .iter()
            .find(|(b, _)| *b == body)
            .map(|(_, e)| *e)
    }

    /// Adds an extra mesh that moves with `body`.
    pub fn attach_body_visual(
        &mut self,
        body: BodyHandle,
        local: Transform,
        visual: Visual,
    ) -> anyhow::Result<EntityId> {
        let parent = self
            .body_entity(body)
            .with_context(|| format!("body {} was not spawned by this scene", body.0))?;
        Ok(self.spawn_node(Some(parent), local, Some(visual)))
    }

    pub fn create_joint(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
        joint: &JointDesc,
    ) -> anyhow::Result<JointHandle> {
        let handle = self
            .physics
            .add_joint(a, b, joint)
            .with_context(|| format!("joint between bodies {} and {}", a.0, b.0))?;
        self.scope.joints.push(handle);
        Ok(handle)
    }

    /// Removes a body spawned by this scene, with its meshes.
    pub fn remove_body(&mut self, body: BodyHandle) -> bool {
        let Some(index) = self.scope.bodies.iter().position(|(b, _)| *b == body) else {
            return false;
        };
        let (_, entity) = self.scope.bodies.remove(index);

        let mut doomed = vec![entity];
        let mut i = 0;
        while i < doomed.len() {
            doomed.extend(self.world.children(doomed[i]));
            i += 1;
        }
        for e in &doomed {
            self.world.despawn(*e);
        }
        self.scope.entities.retain(|e| !doomed.contains(e));
        self.physics.remove_body(body)
    }

    /// Bodies currently owned by this mount.
    pub fn bodies(&self) -> Vec<BodyHandle> {
        self.scope.bodies.iter().map(|(b, _)| *b).collect()
    }
}
