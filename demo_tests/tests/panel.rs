//! The auxiliary side panel: last write wins, what survives a route change,
//! and writes from scenes that are gone.

use std::{cell::RefCell, rc::Rc};

use anyhow::anyhow;
use demo_shared::{
    config::{DemoConfig, SlotPolicy},
    physics::{NullPhysics, PhysicsConfig},
    render::FrameRecorder,
    ui::{UiAction, UiFragment, UiNode},
};
use demo_shell::{
    environment::Preloaded,
    scene::{EmptyScene, Scene},
    scenes::car::speedometer,
    slot::{SetOutcome, UiPublisher},
    MountState, SceneRegistry, Shell,
};

const DT: f32 = 1.0 / 60.0;

fn shell(config: DemoConfig, registry: SceneRegistry) -> anyhow::Result<Shell> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
    Ok(Shell::new(
        config,
        registry,
        Box::new(NullPhysics::new(&PhysicsConfig::default())),
        Box::new(Preloaded::builtin("apartment")),
    )?)
}

fn text(s: &str) -> UiFragment {
    UiFragment::new(UiNode::text(s))
}

#[test]
fn car_speedometer_lives_until_the_route_changes() -> anyhow::Result<()> {
    let mut shell = shell(DemoConfig::default(), SceneRegistry::demos()?)?;
    let mut rec = FrameRecorder::new();
    shell.frame(DT, &mut rec);

    shell.navigate("/car");
    for _ in 0..10 {
        shell.frame(DT, &mut rec);
        assert_eq!(shell.panel(), Some(speedometer(0.0)));
    }
    assert_eq!(rec.panel, Some(speedometer(0.0)));

    // Components publishes nothing; the car cleared its own speedometer.
    shell.navigate("/components");
    shell.frame(DT, &mut rec);
    assert_eq!(shell.panel(), None);
    assert_eq!(rec.panel, None);
    Ok(())
}

#[test]
fn retained_panel_survives_a_switch_to_a_silent_scene() -> anyhow::Result<()> {
    let mut shell = shell(DemoConfig::default(), SceneRegistry::demos()?)?;
    let mut rec = FrameRecorder::new();
    shell.frame(DT, &mut rec);
    let shapes_panel = shell.panel().ok_or_else(|| anyhow!("shapes published nothing"))?;
    assert!(shapes_panel.has_action("reset"));

    shell.navigate("/components");
    shell.frame(DT, &mut rec);
    assert_eq!(shell.panel(), Some(shapes_panel));
    Ok(())
}

#[test]
fn clear_on_switch_empties_the_panel() -> anyhow::Result<()> {
    let config = DemoConfig {
        slot_policy: SlotPolicy::ClearOnSwitch,
        ..DemoConfig::default()
    };
    let mut shell = shell(config, SceneRegistry::demos()?)?;
    let mut rec = FrameRecorder::new();
    shell.frame(DT, &mut rec);
    assert!(shell.panel().is_some());

    shell.navigate("/components");
    shell.frame(DT, &mut rec);
    assert_eq!(shell.panel(), None);
    assert_eq!(rec.panel, None);
    Ok(())
}

#[test]
fn panel_buttons_reach_the_mounted_scene() -> anyhow::Result<()> {
    let mut shell = shell(DemoConfig::default(), SceneRegistry::demos()?)?;
    let mut rec = FrameRecorder::new();
    shell.frame(DT, &mut rec);

    shell.ui_action(UiAction::click("reset"));
    shell.frame(DT, &mut rec);
    let panel = rec.panel.clone().ok_or_else(|| anyhow!("panel missing"))?;
    assert!(panel.to_lines().iter().any(|l| l.contains("1 resets")));
    assert_eq!(shell.state(), &MountState::Mounted(String::new()));

    // The cluster slider goes through the console the same way.
    shell.navigate("/cluster");
    shell.exec_console("set strength 25")?;
    shell.frame(DT, &mut rec);
    assert_eq!(shell.state(), &MountState::Mounted("cluster".to_string()));
    Ok(())
}

#[test]
fn last_write_wins_within_one_mount() -> anyhow::Result<()> {
    let mut registry = SceneRegistry::new();
    registry.register("/", "Root", |ctx| {
        ctx.ui.publish(text("first"));
        ctx.ui.publish(text("second"));
        Ok(Box::new(EmptyScene) as Box<dyn Scene>)
    })?;
    let mut shell = shell(DemoConfig::default(), registry)?;
    let mut rec = FrameRecorder::new();
    shell.frame(DT, &mut rec);
    assert_eq!(shell.panel(), Some(text("second")));
    assert_eq!(rec.panel, Some(text("second")));
    assert_eq!(rec.panel_renders, 1);
    Ok(())
}

#[test]
fn torn_down_scene_cannot_write() -> anyhow::Result<()> {
    let stash: Rc<RefCell<Option<UiPublisher>>> = Rc::default();
    let mut registry = SceneRegistry::new();
    let keep = stash.clone();
    registry.register("/", "Leaky", move |ctx| {
        ctx.ui.publish(text("leaky"));
        *keep.borrow_mut() = Some(ctx.ui.clone());
        Ok(Box::new(EmptyScene) as Box<dyn Scene>)
    })?;
    registry.register("/next", "Next", |ctx| {
        ctx.ui.publish(text("next"));
        Ok(Box::new(EmptyScene) as Box<dyn Scene>)
    })?;

    let mut shell = shell(DemoConfig::default(), registry)?;
    let mut rec = FrameRecorder::new();
    shell.frame(DT, &mut rec);
    shell.navigate("/next");

    let stale = stash
        .borrow_mut()
        .take()
        .ok_or_else(|| anyhow!("publisher not captured"))?;
    assert!(!stale.is_current());
    assert_eq!(stale.publish(text("ghost")), SetOutcome::Revoked);
    assert_eq!(stale.clear(), SetOutcome::Revoked);
    assert_eq!(shell.panel(), Some(text("next")));
    assert_eq!(shell.slot().rejected_writes(), 2);
    Ok(())
}

fn slider_value(panel: &UiFragment, id: &str) -> Option<f32> {
    fn find(node: &UiNode, id: &str) -> Option<f32> {
        match node {
            UiNode::Slider { id: slider, value, .. } if slider == id => Some(*value),
            UiNode::Row(children) | UiNode::Column(children) => {
                children.iter().find_map(|child| find(child, id))
            }
            _ => None,
        }
    }
    find(&panel.root, id)
}

#[test]
fn non_finite_slider_values_are_ignored() -> anyhow::Result<()> {
    let mut shell = shell(DemoConfig::default(), SceneRegistry::demos()?)?;
    let mut rec = FrameRecorder::new();
    shell.frame(DT, &mut rec);
    shell.navigate("/cluster");
    shell.exec_console("set strength 25")?;
    shell.frame(DT, &mut rec);

    assert!(shell.exec_console("set strength NaN").is_err());
    shell.ui_action(UiAction::set("strength", f32::NAN));
    shell.ui_action(UiAction::set("strength", f32::INFINITY));
    for _ in 0..10 {
        shell.frame(DT, &mut rec);
    }

    let panel = shell.panel().ok_or_else(|| anyhow!("cluster published nothing"))?;
    assert_eq!(slider_value(&panel, "strength"), Some(25.0));
    assert_eq!(shell.state(), &MountState::Mounted("cluster".to_string()));
    assert!(rec
        .mesh_positions
        .iter()
        .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite()));
    Ok(())
}
