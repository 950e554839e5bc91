//! Application shell.
//!
//! The shell owns:
//! - The fixed environment rig (light, environment preset, orbit camera,
//!   floor collider, background).
//! - The router bound to the scene registry.
//! - The navigation strip and the side panel showing the UI slot.
//! - A console for headless control.
//!
//! Frames are driven from outside; nothing here blocks or spawns.

use std::fmt;

use anyhow::Context;
use demo_shared::{
    config::DemoConfig,
    ecs::{EntityId, Name},
    event::EventBus,
    math::{Transform, Vec3},
    physics::{BodyDesc, BodyHandle, ColliderDesc, ColliderShape, PhysicsBackend},
    render::{Material, OverlayBackend, RenderBackend, ShadowFlags, Visual},
    resources::EnvironmentMap,
    ui::{NavItem, UiAction, UiFragment},
};
use tracing::{debug, info, warn};

use crate::{
    camera::OrbitCamera,
    environment::{EnvironmentSource, LoadStatus},
    input::InputState,
    nav::{Location, NavStrip},
    registry::{RegistryError, SceneRegistry},
    router::{MountState, Router},
    scene::Stage,
    slot::UiSlot,
};

/// Text shown in the viewport while the environment loads.
pub const LOADING_TEXT: &str = "Loading...";

/// Errors building a shell.
#[derive(Debug)]
pub enum ShellError {
    Registry(RegistryError),
    InvalidConfig(String),
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::Registry(e) => write!(f, "registry: {e}"),
            ShellError::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ShellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShellError::Registry(e) => Some(e),
            ShellError::InvalidConfig(_) => None,
        }
    }
}

impl From<RegistryError> for ShellError {
    fn from(e: RegistryError) -> Self {
        ShellError::Registry(e)
    }
}

/// Queued navigation request, applied at the next frame boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigateTo(pub String);

enum EnvState {
    Loading(Box<dyn EnvironmentSource>),
    Ready(EnvironmentMap),
    Failed(String),
}

/// The static ground under every scene.
#[derive(Debug, Clone, Copy)]
pub struct Floor {
    pub body: BodyHandle,
    pub entity: EntityId,
}

pub struct Shell {
    config: DemoConfig,
    stage: Stage,
    slot: UiSlot,
    router: Router,
    nav: NavStrip,
    camera: OrbitCamera,
    input: InputState,
    env: EnvState,
    events: EventBus,
    floor: Floor,
    frames: u64,
    /// Slot revision the side panel last showed.
    panel_revision: Option<u64>,
    /// Location the navigation strip was last drawn for.
    nav_drawn_for: Option<Location>,
}

impl Shell {
    pub fn new(
        config: DemoConfig,
        registry: SceneRegistry,
        physics: Box<dyn PhysicsBackend>,
        environment: Box<dyn EnvironmentSource>,
    ) -> Result<Self, ShellError> {
        if config.tick_hz == 0 {
            return Err(ShellError::InvalidConfig("tick_hz must be positive".into()));
        }
        let floor_scale = config.floor.scale;
        if floor_scale.x <= 0.0 || floor_scale.y <= 0.0 || floor_scale.z <= 0.0 {
            return Err(ShellError::InvalidConfig(format!(
                "floor scale must be positive, got {floor_scale:?}"
            )));
        }

        let slot = UiSlot::new();
        let nav = NavStrip::from_registry(&registry);
        let mut router = Router::new(registry, slot.clone(), config.slot_policy)?;
        router.set_location(&config.initial_route);

        let mut stage = Stage::new(physics);
        stage.physics.set_gravity(config.physics.gravity);
        let floor = spawn_floor(&config, &mut stage);

        info!(
            routes = nav.len(),
            initial = %router.location(),
            preset = %environment.preset(),
            physics = stage.physics.name(),
            "Shell created"
        );

        Ok(Self {
            camera: OrbitCamera::from_config(&config.camera),
            config,
            stage,
            slot,
            router,
            nav,
            input: InputState::default(),
            env: EnvState::Loading(environment),
            events: EventBus::default(),
            floor,
            frames: 0,
            panel_revision: None,
            nav_drawn_for: None,
        })
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    pub fn registry(&self) -> &SceneRegistry {
        self.router.registry()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn state(&self) -> &MountState {
        self.router.state()
    }

    pub fn location(&self) -> &Location {
        self.router.location()
    }

    pub fn slot(&self) -> &UiSlot {
        &self.slot
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn physics(&self) -> &dyn PhysicsBackend {
        self.stage.physics.as_ref()
    }

    pub fn floor(&self) -> Floor {
        self.floor
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn input(&self) -> InputState {
        self.input
    }

    pub fn set_input(&mut self, input: InputState) {
        self.input = input.clamped();
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.env, EnvState::Loading(_))
    }

    pub fn environment(&self) -> Option<&EnvironmentMap> {
        match &self.env {
            EnvState::Ready(env) => Some(env),
            _ => None,
        }
    }

    /// Why the environment failed to load, if it did.
    pub fn environment_error(&self) -> Option<&str> {
        match &self.env {
            EnvState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Navigation strip as it should currently be drawn.
    pub fn nav_items(&self) -> Vec<NavItem> {
        self.nav.items(self.router.location())
    }

    /// Side-panel content.
    pub fn panel(&self) -> Option<UiFragment> {
        self.slot.get()
    }

    /// Switches routes now. While the environment loads this only replaces
    /// the pending route.
    pub fn navigate(&mut self, path: &str) -> &MountState {
        match self.env {
            EnvState::Ready(_) => self.router.navigate(path, &mut self.stage, self.input),
            EnvState::Loading(_) | EnvState::Failed(_) => {
                debug!(path, "Environment not ready; replacing pending route");
                self.router.set_location(path);
                self.router.state()
            }
        }
    }

    /// Queues a navigation for the next frame.
    pub fn request_navigate(&mut self, path: &str) {
        self.events.push(NavigateTo(path.to_string()));
    }

    /// Queues a panel interaction for the next frame.
    pub fn ui_action(&mut self, action: UiAction) {
        self.events.push(action);
    }

    /// Runs one frame: load, events, physics, scene, render.
    pub fn frame<R>(&mut self, dt: f32, out: &mut R)
    where
        R: RenderBackend + OverlayBackend,
    {
        self.poll_environment();

        if matches!(self.env, EnvState::Ready(_)) {
            for NavigateTo(path) in self.events.drain::<NavigateTo>() {
                self.router.navigate(&path, &mut self.stage, self.input);
            }
            for action in self.events.drain::<UiAction>() {
                debug!(action = %action.id, value = ?action.value, "Dispatching UI action");
                self.router.dispatch(&action, &mut self.stage, self.input);
            }
            self.stage.physics.step(dt);
            self.router.update(&mut self.stage, self.input, dt);
            self.stage.sync_bodies();
        } else {
            // Latest request wins; the earlier route never mounts.
            if let Some(NavigateTo(path)) = self.events.drain::<NavigateTo>().pop() {
                self.router.set_location(&path);
            }
            // No scene published the widgets these came from.
            let stale = self.events.pending::<UiAction>();
            if stale > 0 {
                debug!(count = stale, "Discarding UI actions; no scene mounted");
                self.events.drain::<UiAction>();
            }
        }

        self.render(out);
        self.draw_overlay(out);
        self.frames += 1;
    }

    /// Tears the mounted scene down.
    pub fn dispose(&mut self) {
        self.router.dispose(&mut self.stage);
    }

    fn poll_environment(&mut self) {
        let EnvState::Loading(source) = &mut self.env else {
            return;
        };
        match source.poll() {
            LoadStatus::Pending => {}
            LoadStatus::Ready(env) => {
                info!(preset = %env.preset, "Environment ready");
                self.env = EnvState::Ready(env);
                self.router.mount_current(&mut self.stage, self.input);
            }
            LoadStatus::Failed(reason) => {
                warn!(reason = %reason, "Environment failed to load");
                self.env = EnvState::Failed(reason);
            }
        }
    }

    fn render<R: RenderBackend>(&self, out: &mut R) {
        out.begin_frame(&self.config.background);
        match &self.env {
            EnvState::Loading(_) => out.draw_placeholder(LOADING_TEXT),
            EnvState::Failed(reason) => {
                out.draw_placeholder(&format!("Failed to load environment: {reason}"))
            }
            EnvState::Ready(env) => {
                out.set_view_proj(self.camera.view_proj());
                out.set_environment(env);
                let mut light = self.config.light;
                light.cast_shadow &= self.config.shadows;
                out.draw_light(&light);
                for (entity, visual) in self.stage.world.iter::<Visual>() {
                    let transform = self.stage.world.global_transform(entity);
                    out.draw_mesh(visual, &transform.to_mat4());
                }
                if let MountState::Failed { route, reason } = self.router.state() {
                    out.draw_placeholder(&format!("{route} failed: {reason}"));
                }
            }
        }
        out.end_frame();
    }

    fn draw_overlay<R: OverlayBackend>(&mut self, out: &mut R) {
        if self.nav_drawn_for.as_ref() != Some(self.router.location()) {
            out.draw_nav(&self.nav.items(self.router.location()));
            self.nav_drawn_for = Some(self.router.location().clone());
        }
        let revision = self.slot.revision();
        if self.panel_revision != Some(revision) {
            out.draw_panel(self.slot.get().as_ref());
            self.panel_revision = Some(revision);
        }
    }

    /// One line per fact, for the `status` console command.
    pub fn status(&self) -> Vec<String> {
        let env = match &self.env {
            EnvState::Loading(source) => format!("loading '{}'", source.preset()),
            EnvState::Ready(env) => format!("ready '{}'", env.preset),
            EnvState::Failed(reason) => format!("failed: {reason}"),
        };
        vec![
            format!("Location: {}", self.router.location()),
            format!("State: {:?}", self.router.state()),
            format!("Environment: {env}"),
            format!("Frames: {}", self.frames),
            format!(
                "Physics: {} ({} bodies, {} joints)",
                self.stage.physics.name(),
                self.stage.physics.body_count(),
                self.stage.physics.joint_count()
            ),
            format!("Nodes: {}", self.stage.world.len()),
            format!("Panel revision: {}", self.slot.revision()),
        ]
    }

    /// Executes a console command.
    pub fn exec_console(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = tokens.split_first() else {
            return Ok(Vec::new());
        };

        let parse = |s: &str| -> anyhow::Result<f32> {
            let value = s
                .parse::<f32>()
                .map_err(|e| anyhow::anyhow!("bad number '{s}': {e}"))?;
            if !value.is_finite() {
                anyhow::bail!("number '{s}' is not finite");
            }
            Ok(value)
        };

        match command {
            "help" => Ok(vec![
                "nav <path>          - switch routes".to_string(),
                "routes              - list registered routes".to_string(),
                "status              - show shell status".to_string(),
                "panel [json]        - print the side panel".to_string(),
                "click <id>          - press a panel button".to_string(),
                "set <id> <value>    - move a panel slider or toggle".to_string(),
                "drive <keys>        - hold keys (w/a/s/d, space), empty releases".to_string(),
                "orbit <dyaw> <dpitch> | zoom <factor> | pan <dx> <dy> - camera".to_string(),
                "quit                - exit".to_string(),
            ]),
            "nav" => {
                let Some(path) = args.first() else {
                    return Ok(vec!["Usage: nav <path>".to_string()]);
                };
                let state = self.navigate(path).clone();
                Ok(vec![format!("{}: {:?}", self.router.location(), state)])
            }
            "routes" => Ok(self
                .nav_items()
                .into_iter()
                .map(|item| {
                    let mark = if item.active { "*" } else { " " };
                    format!("{mark} {:<14} {}", item.path, item.label)
                })
                .collect()),
            "status" => Ok(self.status()),
            "panel" => {
                let fragment = self.slot.get();
                if args.first() == Some(&"json") {
                    let json = serde_json::to_string_pretty(&fragment).context("encode panel")?;
                    return Ok(json.lines().map(str::to_string).collect());
                }
                Ok(match fragment {
                    Some(fragment) => fragment.to_lines(),
                    None => vec!["(panel empty)".to_string()],
                })
            }
            "click" => {
                let Some(id) = args.first() else {
                    return Ok(vec!["Usage: click <id>".to_string()]);
                };
                self.ui_action(UiAction::click(*id));
                Ok(Vec::new())
            }
            "set" => {
                let (Some(id), Some(value)) = (args.first(), args.get(1)) else {
                    return Ok(vec!["Usage: set <id> <value>".to_string()]);
                };
                self.ui_action(UiAction::set(*id, parse(*value)?));
                Ok(Vec::new())
            }
            "drive" => {
                self.set_input(InputState::from_keys(&args.join(" ")));
                Ok(vec![format!("Input: {:?}", self.input)])
            }
            "orbit" | "pan" => {
                let (Some(a), Some(b)) = (args.first(), args.get(1)) else {
                    return Ok(vec![format!("Usage: {command} <x> <y>")]);
                };
                let (a, b) = (parse(*a)?, parse(*b)?);
                if command == "orbit" {
                    self.camera.rotate(a, b);
                } else {
                    self.camera.pan(a, b);
                }
                Ok(vec![format!("Camera eye: {:?}", self.camera.eye())])
            }
            "zoom" => {
                let Some(factor) = args.first() else {
                    return Ok(vec!["Usage: zoom <factor>".to_string()]);
                };
                self.camera.zoom(parse(*factor)?);
                Ok(vec![format!("Camera distance: {:.2}", self.camera.distance())])
            }
            other => Ok(vec![format!("Unknown command '{other}', try 'help'")]),
        }
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        self.router.dispose(&mut self.stage);
    }
}

fn spawn_floor(config: &DemoConfig, stage: &mut Stage) -> Floor {
    let half = config.floor.scale * 0.5;
    let body = stage.physics.add_body(
        &BodyDesc::fixed()
            .at(config.floor.position)
            .with_collider(ColliderDesc::cuboid(half.x, half.y, half.z)),
    );

    let entity = stage.world.spawn();
    stage.world.insert(
        entity,
        Transform::from_translation(config.floor.position).with_scale(config.floor.scale),
    );
    stage.world.insert(
        entity,
        Visual {
            shape: ColliderShape::Cuboid {
                half_extents: Vec3::splat(0.5),
            },
            material: Material::ShadowCatcher {
                opacity: config.floor.shadow_opacity,
            },
            shadows: ShadowFlags::RECEIVE,
        },
    );
    stage.world.insert(entity, Name("floor".to_string()));
    debug!(body = body.0, y = config.floor.position.y, "Floor spawned");
    Floor { body, entity }
}

#[cfg(test)]
mod tests {
    use demo_shared::{
        physics::{NullPhysics, PhysicsConfig},
        render::FrameRecorder,
    };

    use super::*;
    use crate::environment::Preloaded;

    fn shell() -> Shell {
        Shell::new(
            DemoConfig::default(),
            SceneRegistry::demos().unwrap(),
            Box::new(NullPhysics::new(&PhysicsConfig::default())),
            Box::new(Preloaded::builtin("apartment")),
        )
        .unwrap()
    }

    #[test]
    fn first_frame_mounts_root() {
        let mut shell = shell();
        let mut rec = FrameRecorder::new();
        assert_eq!(shell.state(), &MountState::Unmounted);
        shell.frame(1.0 / 60.0, &mut rec);
        assert_eq!(shell.state(), &MountState::Mounted(String::new()));
        assert_eq!(rec.environment.as_deref(), Some("apartment"));
        assert_eq!(rec.lights_last_frame, 1);
        assert_eq!(rec.nav.len(), 10);
        assert!(rec.nav[0].active);
    }

    #[test]
    fn floor_matches_config() {
        let shell = shell();
        let floor = shell.floor();
        let state = shell.physics().body_state(floor.body).unwrap();
        assert_eq!(state.position, Vec3::new(0.0, -12.55, 0.0));
        assert_eq!(state.kind, demo_shared::physics::BodyKind::Fixed);
        let visual = shell.stage().world.get::<Visual>(floor.entity).unwrap();
        assert_eq!(visual.material, Material::ShadowCatcher { opacity: 0.2 });
        assert_eq!(visual.shadows, ShadowFlags::RECEIVE);
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        let config = DemoConfig {
            tick_hz: 0,
            ..DemoConfig::default()
        };
        let err = Shell::new(
            config,
            SceneRegistry::demos().unwrap(),
            Box::new(NullPhysics::new(&PhysicsConfig::default())),
            Box::new(Preloaded::builtin("apartment")),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ShellError::InvalidConfig(_)));
    }

    #[test]
    fn console_navigation_and_routes() -> anyhow::Result<()> {
        let mut shell = shell();
        let mut rec = FrameRecorder::new();
        shell.frame(1.0 / 60.0, &mut rec);
        let out = shell.exec_console("nav /cradle")?;
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("/cradle"));
        let routes = shell.exec_console("routes")?;
        assert_eq!(routes.len(), 10);
        assert!(routes[3].starts_with("* /cradle"));
        assert!(shell.exec_console("set strength not-a-number").is_err());
        assert_eq!(shell.exec_console("")?, Vec::<String>::new());
        let json = shell.exec_console("panel json")?;
        // The shapes panel is retained across the switch.
        assert_eq!(json.first().map(String::as_str), Some("{"));
        assert!(json.iter().any(|l| l.contains("\"reset\"")));
        Ok(())
    }

    #[test]
    fn panel_redraws_only_on_revision_change() {
        let mut shell = shell();
        let mut rec = FrameRecorder::new();
        shell.frame(1.0 / 60.0, &mut rec);
        shell.frame(1.0 / 60.0, &mut rec);
        let panel_renders = rec.panel_renders;
        let nav_renders = rec.nav_renders;
        shell.frame(1.0 / 60.0, &mut rec);
        assert_eq!(rec.panel_renders, panel_renders);
        assert_eq!(rec.nav_renders, nav_renders);
        assert_eq!(rec.frames, 3);
    }

    #[test]
    fn console_rejects_non_finite_numbers() -> anyhow::Result<()> {
        let mut shell = shell();
        let mut rec = FrameRecorder::new();
        shell.frame(1.0 / 60.0, &mut rec);
        shell.exec_console("orbit 0.5 0.1")?;
        let eye = shell.camera().eye();
        let target = shell.camera().target();

        assert!(shell.exec_console("orbit NaN 0").is_err());
        assert!(shell.exec_console("pan 0 inf").is_err());
        assert!(shell.exec_console("zoom -inf").is_err());
        assert!(shell.exec_console("set strength NaN").is_err());
        assert_eq!(shell.camera().eye(), eye);
        assert_eq!(shell.camera().target(), target);

        shell.exec_console("orbit 0.5 0.1")?;
        let moved = shell.camera().eye();
        assert!(moved.x.is_finite() && moved.y.is_finite() && moved.z.is_finite());
        Ok(())
    }

    #[test]
    fn actions_queued_while_loading_are_discarded() {
        let mut shell = Shell::new(
            DemoConfig::default(),
            SceneRegistry::demos().unwrap(),
            Box::new(NullPhysics::new(&PhysicsConfig::default())),
            Box::new(Preloaded::failed("moon", "missing")),
        )
        .unwrap();
        let mut rec = FrameRecorder::new();
        for _ in 0..3 {
            shell.ui_action(UiAction::click("reset"));
            shell.frame(1.0 / 60.0, &mut rec);
            assert_eq!(shell.events.pending::<UiAction>(), 0);
        }
    }
}
