//! Shapes: a pile of primitive bodies dropped onto the floor.

use demo_shared::{
    math::{Quat, Vec3},
    physics::{BodyDesc, BodyHandle, ColliderDesc, ColliderShape},
    ui::{UiAction, UiFragment, UiNode},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::info;

use super::palette;
use crate::scene::{Scene, SceneContext};

const SEED: u64 = 0x5eed;
const COPIES: usize = 4;

fn primitives() -> [ColliderShape; 5] {
    [
        ColliderShape::Cuboid {
            half_extents: Vec3::splat(0.5),
        },
        ColliderShape::Ball { radius: 0.6 },
        ColliderShape::Capsule {
            half_height: 0.5,
            radius: 0.35,
        },
        ColliderShape::Cylinder {
            half_height: 0.5,
            radius: 0.5,
        },
        ColliderShape::Cone {
            half_height: 0.6,
            radius: 0.5,
        },
    ]
}

pub struct Shapes {
    rng: StdRng,
    bodies: Vec<BodyHandle>,
    resets: u32,
}

pub fn mount(ctx: &mut SceneContext<'_>) -> anyhow::Result<Box<dyn Scene>> {
    let mut scene = Shapes {
        rng: StdRng::seed_from_u64(SEED),
        bodies: Vec::new(),
        resets: 0,
    };
    scene.drop_pile(ctx);
    scene.publish(ctx);
    Ok(Box::new(scene))
}

impl Shapes {
    fn drop_pile(&mut self, ctx: &mut SceneContext<'_>) {
        for body in self.bodies.drain(..) {
            ctx.remove_body(body);
        }
        for copy in 0..COPIES {
            for (i, shape) in primitives().into_iter().enumerate() {
                let position = Vec3::new(
                    (i as f32 - 2.0) * 1.5 + self.rng.gen_range(-0.3f32..0.3),
                    2.0 + copy as f32 * 2.0 + self.rng.gen_range(0.0f32..1.0),
                    self.rng.gen_range(-1.0f32..1.0),
                );
                let rotation = Quat::from_euler_xyz(
                    self.rng.gen_range(0.0f32..std::f32::consts::TAU),
                    self.rng.gen_range(0.0f32..std::f32::consts::TAU),
                    0.0,
                );
                let desc = BodyDesc::dynamic()
                    .at(position)
                    .rotated(rotation)
                    .with_collider(ColliderDesc::new(shape).restitution(0.2));
                self.bodies.push(ctx.spawn_body(&desc, palette(i + copy)));
            }
        }
    }

    fn publish(&self, ctx: &SceneContext<'_>) {
        ctx.ui.publish(UiFragment::column(vec![
            UiNode::heading("Shapes"),
            UiNode::text(format!("{} bodies, {} resets", self.bodies.len(), self.resets)),
            UiNode::button("reset", "Reset"),
        ]));
    }
}

impl Scene for Shapes {
    fn on_ui_action(&mut self, ctx: &mut SceneContext<'_>, action: &UiAction) -> anyhow::Result<()> {
        if action.id == "reset" {
            self.resets += 1;
            self.drop_pile(ctx);
            self.publish(ctx);
            info!(resets = self.resets, bodies = self.bodies.len(), "Shapes reset");
        }
        Ok(())
    }
}
