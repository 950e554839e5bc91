//! Inherited Transforms: bodies and meshes placed inside transformed groups.
//!
//! Bodies take their starting pose from the groups they are spawned in and
//! simulate in world space afterwards. Plain meshes keep following their
//! group, which spins.

use std::f32::consts::FRAC_PI_6;

use demo_shared::{
    ecs::EntityId,
    math::{Quat, Transform, Vec3},
    physics::{BodyDesc, ColliderDesc, ColliderShape},
    render::Visual,
};

use super::palette;
use crate::scene::{Scene, SceneContext};

const SPIN_RATE: f32 = 0.5;

pub struct Transforms {
    carousel: EntityId,
}

pub fn mount(ctx: &mut SceneContext<'_>) -> anyhow::Result<Box<dyn Scene>> {
    let tilted = ctx.spawn_node(
        None,
        Transform::from_translation(Vec3::new(-3.0, 4.0, 0.0))
            .with_rotation(Quat::from_axis_angle(Vec3::Z, FRAC_PI_6)),
        None,
    );
    ctx.name(tilted, "tilted");
    let scaled = ctx.spawn_node(
        Some(tilted),
        Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)).with_scale(Vec3::splat(2.0)),
        None,
    );
    ctx.name(scaled, "scaled");
    for i in 0..4 {
        let local = Vec3::new(i as f32 * 0.8 - 1.2, 0.0, 0.0);
        ctx.spawn_body_in(
            scaled,
            &BodyDesc::dynamic()
                .at(local)
                .with_collider(ColliderDesc::cuboid(0.3, 0.3, 0.3)),
            palette(i),
        );
    }

    let carousel = ctx.spawn_node(None, Transform::from_translation(Vec3::new(3.0, 2.0, 0.0)), None);
    ctx.name(carousel, "carousel");
    for i in 0..6 {
        let angle = i as f32 * std::f32::consts::TAU / 6.0;
        ctx.spawn_node(
            Some(carousel),
            Transform::from_translation(Vec3::new(angle.cos() * 2.0, 0.0, angle.sin() * 2.0))
                .with_scale(Vec3::splat(0.5 + i as f32 * 0.1)),
            Some(Visual::new(ColliderShape::Ball { radius: 0.4 }, palette(i))),
        );
    }

    Ok(Box::new(Transforms { carousel }))
}

impl Scene for Transforms {
    fn update(&mut self, ctx: &mut SceneContext<'_>, _dt: f32) -> anyhow::Result<()> {
        if let Some(t) = ctx.world.get_mut::<Transform>(self.carousel) {
            t.rotation = Quat::from_axis_angle(Vec3::Y, ctx.elapsed * SPIN_RATE);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::testing::Harness;

    #[test]
    fn bodies_start_in_the_group_frame() -> anyhow::Result<()> {
        let mut h = Harness::new();
        let _scene = h.mount(mount)?;
        let bodies = h.with(|ctx| ctx.bodies());
        assert_eq!(bodies.len(), 4);
        let first = h.stage.physics.body_state(bodies[0]).unwrap();
        let last = h.stage.physics.body_state(bodies[3]).unwrap();
        // The tilted group raises the row toward +x.
        assert!(last.position.y > first.position.y);
        assert_eq!(first.rotation, Quat::from_axis_angle(Vec3::Z, FRAC_PI_6));
        Ok(())
    }

    #[test]
    fn carousel_children_follow_the_spin() -> anyhow::Result<()> {
        let mut h = Harness::new();
        let mut scene = h.mount(mount)?;
        let carousel = h
            .stage
            .world
            .iter::<demo_shared::ecs::Name>()
            .find(|(_, n)| n.0 == "carousel")
            .map(|(e, _)| e)
            .unwrap();
        let child = h.stage.world.children(carousel)[0];
        let before = h.stage.world.global_transform(child).translation;
        h.step(&mut scene, 1.0)?;
        let after = h.stage.world.global_transform(child).translation;
        assert!((before - after).length() > 0.1);
        assert!(((after - Vec3::new(3.0, 2.0, 0.0)).length() - 2.0).abs() < 1e-3);
        Ok(())
    }
}
