//! Components: compound bodies built from several colliders.

use std::f32::consts::FRAC_PI_2;

use demo_shared::{
    math::{Quat, Vec3},
    physics::{BodyDesc, ColliderDesc, ColliderShape},
};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::palette;
use crate::scene::{Scene, SceneContext};

const TABLES: usize = 3;
const DUMBBELLS: usize = 4;

fn table(at: Vec3, rotation: Quat) -> BodyDesc {
    let mut desc = BodyDesc::dynamic()
        .at(at)
        .rotated(rotation)
        .with_collider(ColliderDesc::cuboid(1.0, 0.1, 0.6).offset(Vec3::new(0.0, 0.5, 0.0)));
    for (x, z) in [(-0.9, -0.5), (0.9, -0.5), (-0.9, 0.5), (0.9, 0.5)] {
        desc = desc.with_collider(ColliderDesc::cuboid(0.08, 0.4, 0.08).offset(Vec3::new(x, 0.0, z)));
    }
    desc
}

fn dumbbell(at: Vec3, rotation: Quat) -> BodyDesc {
    BodyDesc::dynamic()
        .at(at)
        .rotated(rotation)
        .with_collider(
            ColliderDesc::new(ColliderShape::Cylinder {
                half_height: 0.6,
                radius: 0.08,
            })
            .rotation(Quat::from_axis_angle(Vec3::Z, FRAC_PI_2)),
        )
        .with_collider(ColliderDesc::ball(0.3).offset(Vec3::new(-0.7, 0.0, 0.0)).density(4.0))
        .with_collider(ColliderDesc::ball(0.3).offset(Vec3::new(0.7, 0.0, 0.0)).density(4.0))
}

pub struct Components;

pub fn mount(ctx: &mut SceneContext<'_>) -> anyhow::Result<Box<dyn Scene>> {
    let mut rng = StdRng::seed_from_u64(7);
    for i in 0..TABLES {
        let at = Vec3::new(i as f32 * 3.0 - 3.0, 1.0 + i as f32 * 2.0, 0.0);
        let yaw = rng.gen_range(0.0f32..std::f32::consts::TAU);
        ctx.spawn_body(&table(at, Quat::from_axis_angle(Vec3::Y, yaw)), palette(i));
    }
    for i in 0..DUMBBELLS {
        let at = Vec3::new(
            rng.gen_range(-3.0f32..3.0),
            6.0 + i as f32 * 1.5,
            rng.gen_range(-1.0f32..1.0),
        );
        let tilt = Quat::from_euler_xyz(
            rng.gen_range(0.0f32..1.0),
            rng.gen_range(0.0f32..std::f32::consts::TAU),
            0.0,
        );
        ctx.spawn_body(&dumbbell(at, tilt), palette(i + TABLES));
    }
    Ok(Box::new(Components))
}

impl Scene for Components {}
