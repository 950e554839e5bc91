//! Route switching through the full shell: registry order, mounting,
//! unknown paths, teardown ordering and failure isolation.

use std::{cell::RefCell, rc::Rc};

use anyhow::anyhow;
use demo_shared::{
    config::DemoConfig,
    physics::{BodyDesc, ColliderDesc, NullPhysics, PhysicsConfig},
    render::{Color, FrameRecorder},
};
use demo_shell::{
    environment::Preloaded,
    scene::{EmptyScene, Scene, SceneContext},
    MountState, SceneRegistry, Shell,
};

const DT: f32 = 1.0 / 60.0;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

fn shell_with(registry: SceneRegistry) -> anyhow::Result<Shell> {
    init_tracing();
    Ok(Shell::new(
        DemoConfig::default(),
        registry,
        Box::new(NullPhysics::new(&PhysicsConfig::default())),
        Box::new(Preloaded::builtin("apartment")),
    )?)
}

fn demo_shell() -> anyhow::Result<Shell> {
    shell_with(SceneRegistry::demos()?)
}

#[test]
fn registry_lists_routes_in_navigation_order() -> anyhow::Result<()> {
    let registry = SceneRegistry::demos()?;
    assert_eq!(
        registry.keys(),
        vec![
            "",
            "joints",
            "components",
            "cradle",
            "cluster",
            "all-shapes",
            "car",
            "transforms",
            "api-usage",
            "kinematics",
        ]
    );
    let labels: Vec<&str> = registry.iter().map(|r| r.label()).collect();
    assert_eq!(labels[0], "Shapes");
    assert_eq!(labels[6], "Simple Car");
    assert_eq!(labels[7], "Inherited Transforms");
    assert_eq!(labels[8], "API usage");
    assert!(registry.lookup("/joints").is_ok());
    assert!(registry.lookup("joints/").is_ok());
    assert!(registry.lookup("/nope").is_err());
    Ok(())
}

#[test]
fn every_route_mounts_and_tears_down_cleanly() -> anyhow::Result<()> {
    let mut shell = demo_shell()?;
    let mut rec = FrameRecorder::new();
    shell.frame(DT, &mut rec);
    let baseline_bodies = 1;

    let keys: Vec<String> = shell.registry().keys().iter().map(|k| k.to_string()).collect();
    for key in &keys {
        shell.navigate(&format!("/{key}"));
        assert_eq!(shell.state(), &MountState::Mounted(key.clone()), "route /{key}");
        for _ in 0..5 {
            shell.frame(DT, &mut rec);
        }
        assert_eq!(shell.state(), &MountState::Mounted(key.clone()), "route /{key} after frames");
        assert!(rec.meshes_last_frame > 1, "route /{key} drew nothing");
    }

    shell.dispose();
    assert_eq!(shell.state(), &MountState::Unmounted);
    assert_eq!(shell.physics().body_count(), baseline_bodies);
    assert_eq!(shell.physics().joint_count(), 0);
    // Only the floor node is left.
    assert_eq!(shell.stage().world.len(), 1);
    Ok(())
}

#[test]
fn unknown_route_leaves_viewport_empty_but_keeps_nav() -> anyhow::Result<()> {
    let mut shell = demo_shell()?;
    let mut rec = FrameRecorder::new();
    shell.frame(DT, &mut rec);

    let state = shell.navigate("/does-not-exist").clone();
    assert_eq!(state, MountState::NotFound("/does-not-exist".to_string()));
    shell.frame(DT, &mut rec);

    assert_eq!(rec.nav.len(), 10);
    assert!(rec.nav.iter().all(|item| !item.active));
    // The floor is the only mesh.
    assert_eq!(rec.meshes_last_frame, 1);
    assert_eq!(rec.placeholder, None);
    assert_eq!(shell.router().scope().map(|s| s.body_count()), None);

    // Navigation still works afterwards.
    shell.navigate("/cradle");
    assert_eq!(shell.state(), &MountState::Mounted("cradle".to_string()));
    Ok(())
}

#[test]
fn root_then_joints() -> anyhow::Result<()> {
    let mut shell = demo_shell()?;
    let mut rec = FrameRecorder::new();
    shell.frame(DT, &mut rec);
    assert_eq!(shell.state(), &MountState::Mounted(String::new()));
    assert!(rec.nav[0].active);

    shell.request_navigate("/joints");
    shell.frame(DT, &mut rec);
    assert_eq!(shell.state(), &MountState::Mounted("joints".to_string()));
    assert_eq!(shell.router().mounts(), 2);
    assert_eq!(shell.router().teardowns(), 1);
    assert!(rec.nav[1].active);
    assert_eq!(rec.nav.iter().filter(|item| item.active).count(), 1);

    let panel = rec.panel.clone().ok_or_else(|| anyhow!("joints published nothing"))?;
    assert!(panel.to_lines().iter().any(|l| l.contains("Rope links: 10")));
    Ok(())
}

#[test]
fn navigating_to_the_current_route_does_not_remount() -> anyhow::Result<()> {
    let mut shell = demo_shell()?;
    let mut rec = FrameRecorder::new();
    shell.frame(DT, &mut rec);
    shell.navigate("/cluster");
    shell.navigate("cluster/");
    shell.navigate("/cluster?again");
    assert_eq!(shell.router().mounts(), 2);
    assert_eq!(shell.router().teardowns(), 1);
    Ok(())
}

type Log = Rc<RefCell<Vec<String>>>;

struct Logged {
    name: &'static str,
    log: Log,
}

impl Scene for Logged {
    fn teardown(&mut self, _ctx: &mut SceneContext<'_>) {
        self.log.borrow_mut().push(format!("teardown {}", self.name));
    }
}

fn logged(registry: &mut SceneRegistry, key: &str, name: &'static str, log: &Log) -> anyhow::Result<()> {
    let log = log.clone();
    registry.register(key, name, move |ctx| {
        log.borrow_mut().push(format!("mount {name}"));
        ctx.spawn_body(
            &BodyDesc::dynamic().with_collider(ColliderDesc::ball(0.5)),
            Color::WHITE,
        );
        Ok(Box::new(Logged {
            name,
            log: log.clone(),
        }) as Box<dyn Scene>)
    })?;
    Ok(())
}

#[test]
fn teardown_runs_before_the_next_constructor() -> anyhow::Result<()> {
    let log: Log = Rc::default();
    let mut registry = SceneRegistry::new();
    logged(&mut registry, "/", "root", &log)?;
    logged(&mut registry, "/a", "a", &log)?;
    logged(&mut registry, "/b", "b", &log)?;

    let mut shell = shell_with(registry)?;
    let mut rec = FrameRecorder::new();
    shell.frame(DT, &mut rec);
    shell.navigate("/a");
    shell.navigate("/b");
    shell.navigate("/missing");

    assert_eq!(
        *log.borrow(),
        vec![
            "mount root",
            "teardown root",
            "mount a",
            "teardown a",
            "mount b",
            "teardown b",
        ]
    );
    // Floor only: every scene body was released.
    assert_eq!(shell.physics().body_count(), 1);
    Ok(())
}

#[test]
fn failing_scenes_are_isolated() -> anyhow::Result<()> {
    let mut registry = SceneRegistry::new();
    registry.register("/", "Root", |_ctx| Ok(Box::new(EmptyScene) as Box<dyn Scene>))?;
    registry.register("/broken", "Broken", |ctx| {
        ctx.spawn_body(
            &BodyDesc::dynamic().with_collider(ColliderDesc::ball(0.5)),
            Color::WHITE,
        );
        Err(anyhow!("boom"))
    })?;
    registry.register("/panicky", "Panicky", |_ctx| -> anyhow::Result<Box<dyn Scene>> {
        panic!("constructor exploded")
    })?;

    let mut shell = shell_with(registry)?;
    let mut rec = FrameRecorder::new();
    shell.frame(DT, &mut rec);

    shell.navigate("/broken");
    assert_eq!(
        shell.state(),
        &MountState::Failed {
            route: "/broken".to_string(),
            reason: "boom".to_string(),
        }
    );
    shell.frame(DT, &mut rec);
    assert_eq!(rec.placeholder.as_deref(), Some("/broken failed: boom"));
    assert_eq!(rec.nav.len(), 3);
    // The half-built scene's body was released.
    assert_eq!(shell.physics().body_count(), 1);

    shell.navigate("/panicky");
    match shell.state() {
        MountState::Failed { route, reason } => {
            assert_eq!(route, "/panicky");
            assert!(reason.contains("constructor exploded"), "{reason}");
        }
        other => panic!("unexpected state {other:?}"),
    }

    shell.navigate("/");
    assert_eq!(shell.state(), &MountState::Mounted(String::new()));
    shell.frame(DT, &mut rec);
    assert_eq!(rec.placeholder, None);
    Ok(())
}

#[test]
fn dropping_the_shell_tears_the_scene_down() -> anyhow::Result<()> {
    let log: Log = Rc::default();
    let mut registry = SceneRegistry::new();
    logged(&mut registry, "/", "root", &log)?;

    let mut shell = shell_with(registry)?;
    let mut rec = FrameRecorder::new();
    shell.frame(DT, &mut rec);
    assert_eq!(*log.borrow(), vec!["mount root"]);

    drop(shell);
    assert_eq!(*log.borrow(), vec!["mount root", "teardown root"]);
    Ok(())
}
