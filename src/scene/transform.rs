use crate::core::math::transform::TransformFactory;
use nalgebra::{Matrix4, Point3, Vector3};

/// Spatial placement shared by everything in the scene.
/// Rotation is in degrees, applied X then Y then Z.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub position: Point3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            rotation: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn at(position: Point3<f32>) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        TransformFactory::model(&self.position, &self.rotation, &self.scale)
    }
}

/// Anything carrying a [`Transform`]: cameras, grid cameras and meshes.
pub trait Transformable {
    fn transform(&self) -> &Transform;
    fn transform_mut(&mut self) -> &mut Transform;

    fn position(&self) -> Point3<f32> {
        self.transform().position
    }

    fn set_position(&mut self, position: Point3<f32>) {
        self.transform_mut().position = position;
    }

    fn translate(&mut self, offset: &Vector3<f32>) {
        self.transform_mut().position += offset;
    }

    fn world_matrix(&self) -> Matrix4<f32> {
        self.transform().matrix()
    }
}

impl Transformable for Transform {
    fn transform(&self) -> &Transform {
        self
    }

    fn transform_mut(&mut self) -> &mut Transform {
        self
    }
}
