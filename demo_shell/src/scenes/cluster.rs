//! Cluster: weightless balls pulled toward a common center.

use demo_shared::{
    math::Vec3,
    physics::{BodyDesc, BodyHandle, ColliderDesc},
    ui::{UiAction, UiFragment, UiNode},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::warn;

use super::palette;
use crate::scene::{Scene, SceneContext};

const BALLS: usize = 60;
const CENTER: Vec3 = Vec3::new(0.0, 2.0, 0.0);
const DEFAULT_STRENGTH: f32 = 10.0;
const MAX_STRENGTH: f32 = 50.0;

pub struct Cluster {
    balls: Vec<BodyHandle>,
    strength: f32,
}

pub fn mount(ctx: &mut SceneContext<'_>) -> anyhow::Result<Box<dyn Scene>> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut balls = Vec::with_capacity(BALLS);
    for i in 0..BALLS {
        let at = CENTER
            + Vec3::new(
                rng.gen_range(-6.0f32..6.0),
                rng.gen_range(-3.0f32..3.0),
                rng.gen_range(-6.0f32..6.0),
            );
        balls.push(ctx.spawn_body(
            &BodyDesc::dynamic()
                .at(at)
                .gravity_scale(0.0)
                .damping(0.5, 0.5)
                .with_collider(ColliderDesc::ball(0.4).restitution(0.3)),
            palette(i),
        ));
    }
    let scene = Cluster {
        balls,
        strength: DEFAULT_STRENGTH,
    };
    scene.publish(ctx);
    Ok(Box::new(scene))
}

impl Cluster {
    fn publish(&self, ctx: &SceneContext<'_>) {
        ctx.ui.publish(UiFragment::column(vec![
            UiNode::heading("Cluster"),
            UiNode::Slider {
                id: "strength".into(),
                label: "Attraction".into(),
                min: 0.0,
                max: MAX_STRENGTH,
                value: self.strength,
            },
        ]));
    }
}

impl Scene for Cluster {
    fn update(&mut self, ctx: &mut SceneContext<'_>, _dt: f32) -> anyhow::Result<()> {
        for &ball in &self.balls {
            let Some(state) = ctx.physics.body_state(ball) else {
                continue;
            };
            let pull = (CENTER - state.position).normalize_or_zero() * self.strength;
            ctx.physics.set_force(ball, pull);
        }
        Ok(())
    }

    fn on_ui_action(&mut self, ctx: &mut SceneContext<'_>, action: &UiAction) -> anyhow::Result<()> {
        if action.id == "strength" {
            let Some(value) = action.value else {
                warn!(action = %action.id, "Slider action without a value");
                return Ok(());
            };
            if !value.is_finite() {
                warn!(action = %action.id, value, "Ignoring non-finite slider value");
                return Ok(());
            }
            self.strength = value.clamp(0.0, MAX_STRENGTH);
            self.publish(ctx);
        }
        Ok(())
    }
}
