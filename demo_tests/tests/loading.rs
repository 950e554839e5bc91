//! Environment loading gates mounting.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use demo_shared::{
    config::DemoConfig,
    physics::{NullPhysics, PhysicsConfig},
    render::FrameRecorder,
    resources::EnvironmentMap,
};
use demo_shell::{
    environment::{BackgroundLoad, EnvironmentSource, Preloaded},
    shell::LOADING_TEXT,
    MountState, SceneRegistry, Shell,
};

const DT: f32 = 1.0 / 60.0;

fn shell(environment: Box<dyn EnvironmentSource>) -> anyhow::Result<Shell> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
    Ok(Shell::new(
        DemoConfig::default(),
        SceneRegistry::demos()?,
        Box::new(NullPhysics::new(&PhysicsConfig::default())),
        environment,
    )?)
}

#[test]
fn placeholder_until_loaded_and_only_the_last_route_mounts() -> anyhow::Result<()> {
    let (load, tx) = BackgroundLoad::channel("apartment");
    let mut shell = shell(Box::new(load))?;
    let mut rec = FrameRecorder::new();

    shell.frame(DT, &mut rec);
    assert!(shell.is_loading());
    assert_eq!(rec.placeholder.as_deref(), Some(LOADING_TEXT));
    assert_eq!(shell.state(), &MountState::Unmounted);
    assert_eq!(rec.meshes_last_frame, 0);
    // The navigation strip is usable while loading.
    assert_eq!(rec.nav.len(), 10);

    shell.navigate("/joints");
    shell.request_navigate("/kinematics");
    shell.request_navigate("/cradle");
    shell.frame(DT, &mut rec);
    assert_eq!(shell.state(), &MountState::Unmounted);
    assert_eq!(shell.location().key(), "cradle");
    assert!(rec.nav[3].active);

    let env = EnvironmentMap::builtin("apartment").ok_or_else(|| anyhow!("missing preset"))?;
    tx.send(Ok(env)).map_err(|_| anyhow!("shell dropped the loader"))?;
    shell.frame(DT, &mut rec);

    assert!(!shell.is_loading());
    assert_eq!(shell.state(), &MountState::Mounted("cradle".to_string()));
    assert_eq!(shell.router().mounts(), 1);
    assert_eq!(shell.router().teardowns(), 0);
    assert_eq!(rec.placeholder, None);
    assert_eq!(rec.environment.as_deref(), Some("apartment"));
    assert!(rec.meshes_last_frame > 1);
    Ok(())
}

#[test]
fn failed_environment_keeps_the_placeholder() -> anyhow::Result<()> {
    let mut shell = shell(Box::new(Preloaded::failed("moon", "no such preset")))?;
    let mut rec = FrameRecorder::new();
    for _ in 0..3 {
        shell.frame(DT, &mut rec);
    }
    assert_eq!(shell.environment_error(), Some("no such preset"));
    assert_eq!(shell.state(), &MountState::Unmounted);
    assert_eq!(
        rec.placeholder.as_deref(),
        Some("Failed to load environment: no such preset")
    );
    assert_eq!(rec.nav.len(), 10);

    // Navigation is recorded but nothing mounts.
    shell.navigate("/car");
    shell.frame(DT, &mut rec);
    assert_eq!(shell.state(), &MountState::Unmounted);
    assert_eq!(shell.location().key(), "car");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn loads_from_disk_in_the_background() -> anyhow::Result<()> {
    let dir = std::env::temp_dir().join(format!("demo-env-{}", std::process::id()));
    std::fs::create_dir_all(dir.join("environments"))?;
    std::fs::write(
        dir.join("environments").join("gallery.json"),
        r#"{
            "preset": "ignored",
            "intensity": 0.8,
            "sky": [0.9, 0.9, 1.0, 1.0],
            "ground": [0.2, 0.2, 0.2, 1.0]
        }"#,
    )?;

    let load = BackgroundLoad::spawn(&tokio::runtime::Handle::current(), PathBuf::from(&dir), "gallery");
    let mut shell = shell(Box::new(load))?;
    let mut rec = FrameRecorder::new();

    for _ in 0..200 {
        shell.frame(DT, &mut rec);
        if !shell.is_loading() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(shell.environment_error(), None);
    assert_eq!(shell.environment().map(|e| e.preset.as_str()), Some("gallery"));
    assert_eq!(shell.state(), &MountState::Mounted(String::new()));

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_file_fails_the_load() -> anyhow::Result<()> {
    let dir = std::env::temp_dir().join(format!("demo-env-missing-{}", std::process::id()));
    let load = BackgroundLoad::spawn(&tokio::runtime::Handle::current(), dir, "nowhere");
    let mut shell = shell(Box::new(load))?;
    let mut rec = FrameRecorder::new();

    for _ in 0..200 {
        shell.frame(DT, &mut rec);
        if !shell.is_loading() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(shell.environment_error().is_some());
    assert_eq!(shell.state(), &MountState::Unmounted);
    Ok(())
}
