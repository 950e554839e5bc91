//! Simple Car: a chassis on four hinged wheels driven by wheel torque.
//!
//! Publishes a speedometer to the side panel and clears it on teardown.

use std::f32::consts::FRAC_PI_2;

use demo_shared::{
    math::{Quat, Transform, Vec3},
    physics::{BodyDesc, BodyHandle, ColliderDesc, ColliderShape, JointDesc},
    render::{Color, Visual},
    ui::{UiFragment, UiNode},
};
use tracing::debug;

use super::GROUND_Y;
use crate::scene::{Scene, SceneContext};

const CHASSIS_HALF: Vec3 = Vec3::new(1.0, 0.25, 2.0);
const WHEEL_RADIUS: f32 = 0.45;
const WHEEL_HALF_WIDTH: f32 = 0.15;
const DRIVE_TORQUE: f32 = 40.0;
const STEER_TORQUE: f32 = 60.0;
const BRAKE_FACTOR: f32 = 0.5;
pub const MAX_SPEED_KMH: f32 = 120.0;

/// Side-panel content for a speed in km/h.
pub fn speedometer(kmh: f32) -> UiFragment {
    UiFragment::column(vec![
        UiNode::heading("Simple Car"),
        UiNode::Gauge {
            label: "Speed".into(),
            value: kmh,
            max: MAX_SPEED_KMH,
            unit: "km/h".into(),
        },
        UiNode::text("w/s throttle, a/d steer, space brake"),
    ])
}

pub struct Car {
    chassis: BodyHandle,
    wheels: Vec<BodyHandle>,
    /// Last published speed, in tenths of km/h.
    shown: Option<i64>,
}

pub fn mount(ctx: &mut SceneContext<'_>) -> anyhow::Result<Box<dyn Scene>> {
    let chassis_pos = Vec3::new(0.0, GROUND_Y + 1.2, 0.0);
    let chassis = ctx.spawn_body(
        &BodyDesc::dynamic()
            .at(chassis_pos)
            .with_collider(
                ColliderDesc::cuboid(CHASSIS_HALF.x, CHASSIS_HALF.y, CHASSIS_HALF.z).density(2.0),
            ),
        Color::rgb(0.85, 0.1, 0.1),
    );
    ctx.attach_body_visual(
        chassis,
        Transform::from_translation(Vec3::new(0.0, 0.5, 0.3)),
        Visual::new(
            ColliderShape::Cuboid {
                half_extents: Vec3::new(0.8, 0.3, 0.9),
            },
            Color::rgb(0.7, 0.8, 0.9),
        ),
    )?;

    let mut wheels = Vec::with_capacity(4);
    for (x, z) in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
        let mount_point = Vec3::new(
            x * (CHASSIS_HALF.x + WHEEL_HALF_WIDTH + 0.05),
            -CHASSIS_HALF.y,
            z * (CHASSIS_HALF.z - WHEEL_RADIUS),
        );
        let wheel = ctx.spawn_body(
            &BodyDesc::dynamic()
                .at(chassis_pos + mount_point)
                .with_collider(
                    ColliderDesc::new(ColliderShape::Cylinder {
                        half_height: WHEEL_HALF_WIDTH,
                        radius: WHEEL_RADIUS,
                    })
                    .rotation(Quat::from_axis_angle(Vec3::Z, FRAC_PI_2))
                    .friction(1.5),
                ),
            Color::rgb(0.1, 0.1, 0.1),
        );
        ctx.create_joint(
            chassis,
            wheel,
            &JointDesc::Revolute {
                axis: Vec3::X,
                anchor_a: mount_point,
                anchor_b: Vec3::ZERO,
            },
        )?;
        wheels.push(wheel);
    }

    let mut car = Car {
        chassis,
        wheels,
        shown: None,
    };
    car.show_speed(ctx);
    Ok(Box::new(car))
}

impl Car {
    fn speed_kmh(&self, ctx: &SceneContext<'_>) -> f32 {
        ctx.physics
            .body_state(self.chassis)
            .map(|s| s.linvel.length() * 3.6)
            .unwrap_or(0.0)
    }

    /// Republishes the speedometer when the displayed value changes.
    fn show_speed(&mut self, ctx: &SceneContext<'_>) {
        let kmh = self.speed_kmh(ctx);
        let tenths = (kmh * 10.0).round() as i64;
        if self.shown != Some(tenths) {
            ctx.ui.publish(speedometer(tenths as f32 / 10.0));
            self.shown = Some(tenths);
        }
    }
}

impl Scene for Car {
    fn update(&mut self, ctx: &mut SceneContext<'_>, dt: f32) -> anyhow::Result<()> {
        let input = ctx.input;
        if let Some(chassis) = ctx.physics.body_state(self.chassis) {
            if input.forward != 0.0 {
                // Rolling toward -Z spins the wheels about -X.
                let axis = chassis.rotation.rotate(-Vec3::X);
                for &wheel in &self.wheels {
                    ctx.physics
                        .apply_torque_impulse(wheel, axis * (input.forward * DRIVE_TORQUE * dt));
                }
            }
            if input.right != 0.0 {
                let up = chassis.rotation.rotate(Vec3::Y);
                ctx.physics
                    .apply_torque_impulse(self.chassis, up * (-input.right * STEER_TORQUE * dt));
            }
        }
        if input.brake {
            for &wheel in &self.wheels {
                if let Some(state) = ctx.physics.body_state(wheel) {
                    ctx.physics.set_angvel(wheel, state.angvel * BRAKE_FACTOR);
                }
            }
        }
        self.show_speed(ctx);
        Ok(())
    }

    fn teardown(&mut self, ctx: &mut SceneContext<'_>) {
        debug!("Clearing speedometer");
        ctx.ui.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{input::InputState, scenes::testing::Harness};

    #[test]
    fn publishes_speedometer_and_clears_on_teardown() -> anyhow::Result<()> {
        let mut h = Harness::new();
        let mut scene = h.mount(mount)?;
        assert_eq!(h.stage.physics.body_count(), 5);
        assert_eq!(h.stage.physics.joint_count(), 4);
        assert_eq!(h.slot.get(), Some(speedometer(0.0)));

        let revision = h.slot.revision();
        h.step(&mut scene, 1.0 / 60.0)?;
        assert_eq!(h.slot.revision(), revision, "unchanged speed is not republished");

        h.with(|ctx| scene.teardown(ctx));
        assert_eq!(h.slot.get(), None);
        Ok(())
    }

    #[test]
    fn throttle_spins_the_wheels() -> anyhow::Result<()> {
        let mut h = Harness::new();
        let mut scene = h.mount(mount)?;
        h.input = InputState::from_keys("w");
        h.step(&mut scene, 1.0 / 60.0)?;
        let bodies = h.with(|ctx| ctx.bodies());
        let wheel = h.stage.physics.body_state(bodies[1]).unwrap();
        assert!(wheel.angvel.x < 0.0);
        Ok(())
    }
}
