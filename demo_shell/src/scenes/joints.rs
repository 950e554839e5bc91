//! Joints: a hanging rope of spherical joints and a door on a hinge.

use demo_shared::{
    math::Vec3,
    physics::{BodyDesc, BodyHandle, ColliderDesc, JointDesc},
    render::Color,
    ui::{UiAction, UiFragment, UiNode},
};

use super::palette;
use crate::scene::{Scene, SceneContext};

const ROPE_LINKS: usize = 10;
const LINK_RADIUS: f32 = 0.2;
const LINK_SPACING: f32 = 0.5;

pub struct Joints {
    rope_end: BodyHandle,
    door: BodyHandle,
    joints: usize,
}

pub fn mount(ctx: &mut SceneContext<'_>) -> anyhow::Result<Box<dyn Scene>> {
    let anchor_pos = Vec3::new(-3.0, 4.0, 0.0);
    let anchor = ctx.spawn_body(
        &BodyDesc::fixed()
            .at(anchor_pos)
            .with_collider(ColliderDesc::cuboid(0.3, 0.1, 0.3)),
        Color::WHITE,
    );

    let mut joints = 0;
    let mut previous = anchor;
    for i in 0..ROPE_LINKS {
        // Links trail off sideways so the rope swings from the start.
        let position = anchor_pos + Vec3::new((i + 1) as f32 * LINK_SPACING, 0.0, 0.0);
        let link = ctx.spawn_body(
            &BodyDesc::dynamic()
                .at(position)
                .damping(0.1, 0.1)
                .with_collider(ColliderDesc::ball(LINK_RADIUS)),
            palette(i),
        );
        ctx.create_joint(
            previous,
            link,
            &JointDesc::Spherical {
                anchor_a: Vec3::new(LINK_SPACING * 0.5, 0.0, 0.0),
                anchor_b: Vec3::new(-LINK_SPACING * 0.5, 0.0, 0.0),
            },
        )?;
        joints += 1;
        previous = link;
    }

    let post = ctx.spawn_body(
        &BodyDesc::fixed()
            .at(Vec3::new(4.0, -10.0, 0.0))
            .with_collider(ColliderDesc::cuboid(0.1, 2.5, 0.1)),
        Color::rgb(0.4, 0.3, 0.2),
    );
    let door = ctx.spawn_body(
        &BodyDesc::dynamic()
            .at(Vec3::new(5.1, -10.0, 0.0))
            .with_collider(ColliderDesc::cuboid(1.0, 2.4, 0.05)),
        Color::rgb(0.8, 0.6, 0.4),
    );
    ctx.create_joint(
        post,
        door,
        &JointDesc::Revolute {
            axis: Vec3::Y,
            anchor_a: Vec3::new(0.1, 0.0, 0.0),
            anchor_b: Vec3::new(-1.0, 0.0, 0.0),
        },
    )?;
    joints += 1;

    let scene = Joints {
        rope_end: previous,
        door,
        joints,
    };
    scene.publish(ctx);
    Ok(Box::new(scene))
}

impl Joints {
    fn publish(&self, ctx: &SceneContext<'_>) {
        ctx.ui.publish(UiFragment::column(vec![
            UiNode::heading("Joints"),
            UiNode::text(format!("Rope links: {ROPE_LINKS}")),
            UiNode::text(format!("Joints: {}", self.joints)),
            UiNode::Row(vec![
                UiNode::button("kick", "Kick rope"),
                UiNode::button("push-door", "Push door"),
            ]),
        ]));
    }
}

impl Scene for Joints {
    fn on_ui_action(&mut self, ctx: &mut SceneContext<'_>, action: &UiAction) -> anyhow::Result<()> {
        match action.id.as_str() {
            "kick" => {
                ctx.physics.apply_impulse(self.rope_end, Vec3::new(0.0, 0.0, 2.0));
            }
            "push-door" => {
                ctx.physics.apply_impulse(self.door, Vec3::new(0.0, 0.0, -5.0));
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::testing::Harness;

    #[test]
    fn rope_and_door_are_jointed() -> anyhow::Result<()> {
        let mut h = Harness::new();
        let _scene = h.mount(mount)?;
        // anchor + links + post + door
        assert_eq!(h.stage.physics.body_count(), ROPE_LINKS + 3);
        assert_eq!(h.stage.physics.joint_count(), ROPE_LINKS + 1);
        let lines = h.slot.get().unwrap().to_lines();
        assert!(lines.contains(&"Rope links: 10".to_string()));
        assert!(lines.contains(&"Joints: 11".to_string()));
        Ok(())
    }
}
