//! API usage: drives the physics API directly from panel buttons.

use demo_shared::{
    math::Vec3,
    physics::{BodyDesc, BodyHandle, ColliderDesc, ColliderShape},
    ui::{UiAction, UiFragment, UiNode},
};
use tracing::info;

use super::{palette, GROUND_Y};
use crate::scene::{Scene, SceneContext};

const JUMP_IMPULSE: f32 = 8.0;
const SPIN_IMPULSE: f32 = 3.0;
const LOW_GRAVITY: f32 = 0.2;

pub struct ApiUsage {
    ball: BodyHandle,
    top: BodyHandle,
    low_gravity: bool,
    last: String,
}

pub fn mount(ctx: &mut SceneContext<'_>) -> anyhow::Result<Box<dyn Scene>> {
    let ball = ctx.spawn_body(
        &BodyDesc::dynamic()
            .at(Vec3::new(-2.0, GROUND_Y + 0.5, 0.0))
            .with_collider(ColliderDesc::ball(0.5).restitution(0.5)),
        palette(0),
    );
    let top = ctx.spawn_body(
        &BodyDesc::dynamic()
            .at(Vec3::new(2.0, GROUND_Y + 0.6, 0.0))
            .damping(0.0, 0.05)
            .with_collider(ColliderDesc::new(ColliderShape::Cylinder {
                half_height: 0.1,
                radius: 1.0,
            })),
        palette(3),
    );
    let scene = ApiUsage {
        ball,
        top,
        low_gravity: false,
        last: "none".to_string(),
    };
    scene.publish(ctx);
    Ok(Box::new(scene))
}

impl ApiUsage {
    fn publish(&self, ctx: &SceneContext<'_>) {
        let speed = ctx
            .physics
            .body_state(self.ball)
            .map(|s| s.linvel.length())
            .unwrap_or(0.0);
        ctx.ui.publish(UiFragment::column(vec![
            UiNode::heading("API usage"),
            UiNode::Row(vec![
                UiNode::button("jump", "Jump"),
                UiNode::button("spin", "Spin"),
            ]),
            UiNode::Toggle {
                id: "low-gravity".into(),
                label: "Low gravity".into(),
                on: self.low_gravity,
            },
            UiNode::text(format!("Last action: {}", self.last)),
            UiNode::text(format!("Ball speed: {speed:.2} m/s")),
        ]));
    }
}

impl Scene for ApiUsage {
    fn on_ui_action(&mut self, ctx: &mut SceneContext<'_>, action: &UiAction) -> anyhow::Result<()> {
        match action.id.as_str() {
            "jump" => {
                ctx.physics.apply_impulse(self.ball, Vec3::Y * JUMP_IMPULSE);
            }
            "spin" => {
                ctx.physics.apply_torque_impulse(self.top, Vec3::Y * SPIN_IMPULSE);
            }
            "low-gravity" => {
                self.low_gravity = action.value.map_or(!self.low_gravity, |v| v > 0.5);
                let scale = if self.low_gravity { LOW_GRAVITY } else { 1.0 };
                ctx.physics.set_gravity_scale(self.ball, scale);
            }
            _ => return Ok(()),
        }
        self.last = action.id.clone();
        info!(action = %action.id, "API usage action");
        self.publish(ctx);
        Ok(())
    }
}
