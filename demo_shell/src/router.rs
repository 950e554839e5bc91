//! Router/switcher.
//!
//! Mounts exactly one scene from the registry for the current location.
//! A switch always tears the old mount down (scene hook, then its scope)
//! before the next constructor runs. Unknown paths and failing scenes
//! degrade the mount instead of propagating.

use std::panic::{self, AssertUnwindSafe};

use demo_shared::{config::SlotPolicy, ui::UiAction};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    input::InputState,
    nav::Location,
    registry::{RegistryError, SceneRegistry},
    scene::{MountScope, Scene, SceneContext, Stage},
    slot::{UiPublisher, UiSlot},
};

/// What the viewport currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MountState {
    Unmounted,
    /// A scene is live under this route key.
    Mounted(String),
    /// Nothing is registered for this path; the viewport stays empty.
    NotFound(String),
    /// The scene for this route failed to construct or crashed.
    Failed { route: String, reason: String },
}

impl MountState {
    pub fn is_mounted(&self) -> bool {
        matches!(self, MountState::Mounted(_))
    }
}

struct ActiveMount {
    key: String,
    scene: Box<dyn Scene>,
    scope: MountScope,
    publisher: UiPublisher,
    elapsed: f32,
}

pub struct Router {
    registry: SceneRegistry,
    slot: UiSlot,
    policy: SlotPolicy,
    location: Location,
    state: MountState,
    active: Option<ActiveMount>,
    mounts: u64,
    teardowns: u64,
}

fn panic_reason(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// Runs scene code, turning both errors and panics into a reason string.
fn guarded<T>(f: impl FnOnce() -> anyhow::Result<T>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("{e:#}")),
        Err(payload) => Err(panic_reason(payload)),
    }
}

impl Router {
    /// Binds the router to `registry`, which must resolve the root route.
    pub fn new(registry: SceneRegistry, slot: UiSlot, policy: SlotPolicy) -> Result<Self, RegistryError> {
        if !registry.has_root() {
            return Err(RegistryError::MissingRoot);
        }
        Ok(Self {
            registry,
            slot,
            policy,
            location: Location::root(),
            state: MountState::Unmounted,
            active: None,
            mounts: 0,
            teardowns: 0,
        })
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn state(&self) -> &MountState {
        &self.state
    }

    /// Successful mounts so far.
    pub fn mounts(&self) -> u64 {
        self.mounts
    }

    pub fn teardowns(&self) -> u64 {
        self.teardowns
    }

    /// Bodies, joints and nodes held by the live mount.
    pub fn scope(&self) -> Option<&MountScope> {
        self.active.as_ref().map(|m| &m.scope)
    }

    /// Changes the target location without mounting anything.
    ///
    /// Used while the environment loads: only the last target is mounted.
    pub fn set_location(&mut self, path: &str) {
        self.location = Location::parse(path);
    }

    /// Switches to `path`.
    pub fn navigate(&mut self, path: &str, stage: &mut Stage, input: InputState) -> &MountState {
        let target = Location::parse(path);
        if target == self.location && self.state != MountState::Unmounted {
            return &self.state;
        }
        info!(from = %self.location, to = %target, "Navigating");
        self.teardown(stage, input);
        self.location = target;
        self.mount_current(stage, input)
    }

    /// Mounts the current location if nothing is mounted yet.
    pub fn mount_current(&mut self, stage: &mut Stage, input: InputState) -> &MountState {
        if self.state != MountState::Unmounted {
            return &self.state;
        }

        let key = self.location.key().to_string();
        let constructor = match self.registry.lookup(&key) {
            Ok(constructor) => constructor,
            Err(not_found) => {
                warn!(path = %self.location, error = %not_found, "Route not found; viewport left empty");
                self.state = MountState::NotFound(self.location.path());
                return &self.state;
            }
        };

        let publisher = self.slot.publisher();
        let mut scope = MountScope::default();
        let built = {
            let mut ctx = SceneContext::new(
                publisher.clone(),
                self.location.clone(),
                input,
                stage,
                &mut scope,
            );
            guarded(|| constructor(&mut ctx))
        };

        match built {
            Ok(scene) => {
                self.mounts += 1;
                info!(
                    route = %self.location,
                    bodies = scope.body_count(),
                    joints = scope.joint_count(),
                    nodes = scope.entity_count(),
                    "Scene mounted"
                );
                self.active = Some(ActiveMount {
                    key: key.clone(),
                    scene,
                    scope,
                    publisher,
                    elapsed: 0.0,
                });
                self.state = MountState::Mounted(key);
            }
            Err(reason) => {
                let released = scope.release(stage.physics.as_mut(), &mut stage.world);
                self.slot.release(&publisher);
                warn!(
                    route = %self.location,
                    reason = %reason,
                    bodies = released.bodies,
                    "Scene constructor failed"
                );
                self.state = MountState::Failed {
                    route: self.location.path(),
                    reason,
                };
            }
        }
        &self.state
    }

    /// Advances the mounted scene by `dt`.
    pub fn update(&mut self, stage: &mut Stage, input: InputState, dt: f32) {
        let Some(mount) = self.active.as_mut() else {
            return;
        };
        mount.elapsed += dt;
        let ActiveMount {
            scene,
            scope,
            publisher,
            elapsed,
            ..
        } = mount;
        let result = {
            let mut ctx = SceneContext::new(publisher.clone(), self.location.clone(), input, stage, scope);
            ctx.elapsed = *elapsed;
            guarded(|| scene.update(&mut ctx, dt))
        };
        if let Err(reason) = result {
            self.fail_active(stage, input, "update", reason);
        }
    }

    /// Routes a panel action to the mounted scene. Returns whether a scene received it.
    pub fn dispatch(&mut self, action: &UiAction, stage: &mut Stage, input: InputState) -> bool {
        let Some(mount) = self.active.as_mut() else {
            warn!(action = %action.id, "UI action with no mounted scene");
            return false;
        };
        let ActiveMount {
            scene,
            scope,
            publisher,
            elapsed,
            ..
        } = mount;
        let result = {
            let mut ctx = SceneContext::new(publisher.clone(), self.location.clone(), input, stage, scope);
            ctx.elapsed = *elapsed;
            guarded(|| scene.on_ui_action(&mut ctx, action))
        };
        if let Err(reason) = result {
            self.fail_active(stage, input, "ui action", reason);
        }
        true
    }

    /// Tears the mounted scene down and returns to `Unmounted`.
    pub fn dispose(&mut self, stage: &mut Stage) {
        self.teardown(stage, InputState::default());
    }

    fn fail_active(&mut self, stage: &mut Stage, input: InputState, during: &str, reason: String) {
        warn!(route = %self.location, during, reason = %reason, "Scene failed; unmounting");
        self.teardown(stage, input);
        self.state = MountState::Failed {
            route: self.location.path(),
            reason,
        };
    }

    fn teardown(&mut self, stage: &mut Stage, input: InputState) {
        if let Some(mut mount) = self.active.take() {
            let hook = {
                let mut ctx = SceneContext::new(
                    mount.publisher.clone(),
                    self.location.clone(),
                    input,
                    stage,
                    &mut mount.scope,
                );
                ctx.elapsed = mount.elapsed;
                let scene = &mut mount.scene;
                guarded(|| {
                    scene.teardown(&mut ctx);
                    Ok(())
                })
            };
            if let Err(reason) = hook {
                warn!(route = %mount.key, reason = %reason, "Scene teardown hook failed");
            }
            let released = mount.scope.release(stage.physics.as_mut(), &mut stage.world);
            self.teardowns += 1;
            info!(
                route = %mount.key,
                bodies = released.bodies,
                joints = released.joints,
                nodes = released.entities,
                "Scene torn down"
            );
        }

        if self.state != MountState::Unmounted {
            self.slot.revoke();
            if self.policy == SlotPolicy::ClearOnSwitch {
                self.slot.clear();
            }
        }
        self.state = MountState::Unmounted;
    }
}
