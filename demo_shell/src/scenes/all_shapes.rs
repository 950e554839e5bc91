//! All Shapes: one body for every supported collider shape.

use demo_shared::{
    math::Vec3,
    physics::{BodyDesc, ColliderDesc, ColliderShape},
};

use super::palette;
use crate::scene::{Scene, SceneContext};

fn catalog() -> Vec<ColliderShape> {
    vec![
        ColliderShape::Cuboid {
            half_extents: Vec3::new(0.5, 0.5, 0.5),
        },
        ColliderShape::RoundCuboid {
            half_extents: Vec3::new(0.4, 0.4, 0.4),
            border_radius: 0.1,
        },
        ColliderShape::Ball { radius: 0.5 },
        ColliderShape::Capsule {
            half_height: 0.4,
            radius: 0.3,
        },
        ColliderShape::Cylinder {
            half_height: 0.5,
            radius: 0.4,
        },
        ColliderShape::Cone {
            half_height: 0.5,
            radius: 0.5,
        },
        ColliderShape::ConvexHull {
            points: vec![
                Vec3::new(-0.5, 0.0, -0.5),
                Vec3::new(0.5, 0.0, -0.5),
                Vec3::new(0.5, 0.0, 0.5),
                Vec3::new(-0.5, 0.0, 0.5),
                Vec3::new(0.0, 0.8, 0.0),
            ],
        },
    ]
}

pub struct AllShapes;

pub fn mount(ctx: &mut SceneContext<'_>) -> anyhow::Result<Box<dyn Scene>> {
    let shapes = catalog();
    let count = shapes.len();
    for (i, shape) in shapes.into_iter().enumerate() {
        let x = (i as f32 - (count as f32 - 1.0) * 0.5) * 1.6;
        ctx.spawn_body(
            &BodyDesc::dynamic()
                .at(Vec3::new(x, 3.0, 0.0))
                .angvel(Vec3::new(0.0, 0.0, 0.5))
                .with_collider(ColliderDesc::new(shape)),
            palette(i),
        );
    }
    Ok(Box::new(AllShapes))
}

impl Scene for AllShapes {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::testing::Harness;
    use demo_shared::render::Visual;

    #[test]
    fn one_mesh_per_shape_kind() -> anyhow::Result<()> {
        let mut h = Harness::new();
        let _scene = h.mount(mount)?;
        let kinds: Vec<std::mem::Discriminant<ColliderShape>> = h
            .stage
            .world
            .iter::<Visual>()
            .map(|(_, v)| std::mem::discriminant(&v.shape))
            .collect();
        assert_eq!(kinds.len(), 7);
        for (i, a) in kinds.iter().enumerate() {
            assert!(kinds[i + 1..].iter().all(|b| b != a));
        }
        Ok(())
    }
}
