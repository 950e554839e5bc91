//! Cradle: Newton's cradle hung from a fixed frame.

use demo_shared::{
    math::Vec3,
    physics::{BodyDesc, ColliderDesc, JointDesc},
    render::Color,
};

use crate::scene::{Scene, SceneContext};

const BALLS: usize = 5;
const RADIUS: f32 = 0.5;
const STRING: f32 = 3.0;
/// How far the first ball is pulled back, in radians.
const PULL_BACK: f32 = 1.0;

pub struct Cradle;

pub fn mount(ctx: &mut SceneContext<'_>) -> anyhow::Result<Box<dyn Scene>> {
    let frame_pos = Vec3::new(0.0, 4.0, 0.0);
    let frame = ctx.spawn_body(
        &BodyDesc::fixed()
            .at(frame_pos)
            .with_collider(ColliderDesc::cuboid(RADIUS * BALLS as f32 + 0.5, 0.1, 0.1)),
        Color::rgb(0.3, 0.3, 0.3),
    );

    for i in 0..BALLS {
        let x = (i as f32 - (BALLS as f32 - 1.0) * 0.5) * RADIUS * 2.0;
        let swing = if i == 0 { PULL_BACK } else { 0.0 };
        let offset = Vec3::new(x - STRING * swing.sin(), -STRING * swing.cos(), 0.0);
        let ball = ctx.spawn_body(
            &BodyDesc::dynamic()
                .at(frame_pos + offset)
                .ccd(true)
                .with_collider(
                    ColliderDesc::ball(RADIUS)
                        .restitution(1.0)
                        .friction(0.0)
                        .density(2.0),
                ),
            Color::rgb(0.8, 0.8, 0.85),
        );
        ctx.create_joint(
            frame,
            ball,
            &JointDesc::Spherical {
                anchor_a: Vec3::new(x, 0.0, 0.0),
                anchor_b: Vec3::new(STRING * swing.sin(), STRING * swing.cos(), 0.0),
            },
        )?;
    }
    Ok(Box::new(Cradle))
}

impl Scene for Cradle {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::testing::Harness;

    #[test]
    fn first_ball_is_pulled_back() -> anyhow::Result<()> {
        let mut h = Harness::new();
        let _scene = h.mount(mount)?;
        assert_eq!(h.stage.physics.joint_count(), BALLS);
        let bodies = h.with(|ctx| ctx.bodies());
        let first = h.stage.physics.body_state(bodies[1]).unwrap();
        let second = h.stage.physics.body_state(bodies[2]).unwrap();
        assert!(first.position.y > second.position.y);
        assert!(first.position.x < second.position.x - 2.0 * RADIUS);
        Ok(())
    }
}
