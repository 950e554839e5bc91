//! Kinematics: a position-driven paddle circling the room and a
//! velocity-driven spinner, both pushing dynamic boxes around.

use demo_shared::{
    math::{Quat, Vec3},
    physics::{BodyDesc, BodyHandle, ColliderDesc},
    render::Color,
};

use super::{palette, GROUND_Y};
use crate::scene::{Scene, SceneContext};

const ORBIT_RADIUS: f32 = 5.0;
const ORBIT_RATE: f32 = 0.8;
const SPIN_RATE: f32 = 1.5;
const BOXES: usize = 12;

pub struct Kinematics {
    paddle: BodyHandle,
}

fn paddle_pose(t: f32) -> (Vec3, Quat) {
    let angle = t * ORBIT_RATE;
    let position = Vec3::new(
        angle.cos() * ORBIT_RADIUS,
        GROUND_Y + 0.5,
        angle.sin() * ORBIT_RADIUS,
    );
    // Face along the direction of travel.
    (position, Quat::from_axis_angle(Vec3::Y, -angle))
}

pub fn mount(ctx: &mut SceneContext<'_>) -> anyhow::Result<Box<dyn Scene>> {
    let (position, rotation) = paddle_pose(0.0);
    let paddle = ctx.spawn_body(
        &BodyDesc::kinematic_position()
            .at(position)
            .rotated(rotation)
            .with_collider(ColliderDesc::cuboid(0.2, 0.5, 1.5)),
        Color::rgb(0.2, 0.2, 0.25),
    );
    ctx.spawn_body(
        &BodyDesc::kinematic_velocity()
            .at(Vec3::new(0.0, GROUND_Y + 0.3, 0.0))
            .angvel(Vec3::Y * SPIN_RATE)
            .with_collider(ColliderDesc::cuboid(3.0, 0.3, 0.2)),
        Color::rgb(0.9, 0.9, 0.9),
    );
    for i in 0..BOXES {
        let angle = i as f32 * std::f32::consts::TAU / BOXES as f32;
        let r = if i % 2 == 0 { 2.0 } else { ORBIT_RADIUS };
        ctx.spawn_body(
            &BodyDesc::dynamic()
                .at(Vec3::new(angle.cos() * r, GROUND_Y + 1.0, angle.sin() * r))
                .with_collider(ColliderDesc::cuboid(0.3, 0.3, 0.3)),
            palette(i),
        );
    }
    Ok(Box::new(Kinematics { paddle }))
}

impl Scene for Kinematics {
    fn update(&mut self, ctx: &mut SceneContext<'_>, _dt: f32) -> anyhow::Result<()> {
        let (position, rotation) = paddle_pose(ctx.elapsed);
        ctx.physics.set_next_kinematic_pose(self.paddle, position, rotation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::testing::Harness;
    use demo_shared::physics::BodyKind;

    #[test]
    fn paddle_follows_the_circle() -> anyhow::Result<()> {
        let mut h = Harness::new();
        let mut scene = h.mount(mount)?;
        let bodies = h.with(|ctx| ctx.bodies());
        assert_eq!(bodies.len(), BOXES + 2);
        let spinner = h.stage.physics.body_state(bodies[1]).unwrap();
        assert_eq!(spinner.kind, BodyKind::KinematicVelocity);

        // The pose set during this update applies on the next step.
        h.step(&mut scene, 0.5)?;
        h.step(&mut scene, 0.5)?;
        let paddle = h.stage.physics.body_state(bodies[0]).unwrap();
        let (expected, _) = paddle_pose(0.5);
        assert!((paddle.position - expected).length() < 1e-4);
        let flat = Vec3::new(paddle.position.x, 0.0, paddle.position.z);
        assert!((flat.length() - ORBIT_RADIUS).abs() < 1e-4);
        Ok(())
    }
}
