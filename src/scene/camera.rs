use crate::core::error::{ViewerError, ViewerResult};
use crate::core::math::transform::{TransformFactory, angles_from_direction, direction_from_angles};
use crate::scene::transform::{Transform, Transformable};
use nalgebra::{Matrix4, Point3, Vector3};

/// Perspective projection parameters, configured per render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y_rad: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn matrix(&self) -> Matrix4<f32> {
        TransformFactory::perspective(self.aspect_ratio, self.fov_y_rad, self.near, self.far)
    }
}

/// Where a camera looks: free-look angles or a fixed target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    /// Pitch and yaw in radians. Yaw 0 looks down -Z.
    Angles { pitch: f32, yaw: f32 },
    Target(Point3<f32>),
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Angles {
            pitch: 0.0,
            yaw: 0.0,
        }
    }
}

/// Manages the View and Projection matrices.
#[derive(Debug, Clone)]
pub struct Camera {
    pub transform: Transform,
    pub orientation: Orientation,
    pub up: Vector3<f32>,

    // Unset until the first perspective setup.
    projection: Option<Projection>,
}

impl Camera {
    pub fn new(position: Point3<f32>, orientation: Orientation) -> Self {
        Self {
            transform: Transform::at(position),
            orientation,
            up: Vector3::y(),
            projection: None,
        }
    }

    pub fn looking_at(position: Point3<f32>, target: Point3<f32>) -> Self {
        Self::new(position, Orientation::Target(target))
    }

    pub fn set_perspective(&mut self, fov_y_rad: f32, aspect_ratio: f32, near: f32, far: f32) {
        self.projection = Some(Projection {
            fov_y_rad,
            aspect_ratio,
            near,
            far,
        });
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = Some(projection);
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    /// Changes the field of view of an already configured projection.
    /// Returns false if no projection has been set yet.
    pub fn set_fov(&mut self, fov_y_rad: f32) -> bool {
        match self.projection.as_mut() {
            Some(p) => {
                p.fov_y_rad = fov_y_rad;
                true
            }
            None => false,
        }
    }

    /// Unit viewing direction.
    pub fn direction(&self) -> Vector3<f32> {
        match self.orientation {
            Orientation::Angles { pitch, yaw } => direction_from_angles(pitch, yaw),
            Orientation::Target(target) => (target - self.transform.position)
                .try_normalize(1e-9)
                .unwrap_or_else(|| -Vector3::z()),
        }
    }

    /// The point the camera looks at; one unit ahead for free-look cameras.
    pub fn target(&self) -> Point3<f32> {
        match self.orientation {
            Orientation::Target(target) if target != self.transform.position => target,
            _ => self.transform.position + self.direction(),
        }
    }

    /// Current `(pitch, yaw)` in radians, derived from the target if needed.
    pub fn angles(&self) -> (f32, f32) {
        match self.orientation {
            Orientation::Angles { pitch, yaw } => (pitch, yaw),
            Orientation::Target(_) => angles_from_direction(&self.direction()),
        }
    }

    pub fn set_angles(&mut self, pitch: f32, yaw: f32) {
        self.orientation = Orientation::Angles { pitch, yaw };
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        self.orientation = Orientation::Target(target);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        TransformFactory::view(&self.transform.position, &self.target(), &self.up)
    }

    /// Fails with [`ViewerError::InvalidState`] until a perspective is set.
    pub fn projection_matrix(&self) -> ViewerResult<Matrix4<f32>> {
        self.projection
            .map(|p| p.matrix())
            .ok_or(ViewerError::InvalidState(
                "perspective must be set before the projection is used",
            ))
    }

    pub fn view_projection_matrix(&self) -> ViewerResult<Matrix4<f32>> {
        Ok(self.projection_matrix()? * self.view_matrix())
    }

    /// `projection * view * world`.
    pub fn world_view_projection_matrix(&self, world: &Matrix4<f32>) -> ViewerResult<Matrix4<f32>> {
        Ok(self.view_projection_matrix()? * world)
    }
}

impl Transformable for Camera {
    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_projection_requires_perspective() {
        let camera = Camera::new(Point3::new(0.0, 0.0, 5.0), Orientation::default());
        assert!(matches!(
            camera.projection_matrix(),
            Err(ViewerError::InvalidState(_))
        ));
        assert!(matches!(
            camera.view_projection_matrix(),
            Err(ViewerError::InvalidState(_))
        ));
        assert!(matches!(
            camera.world_view_projection_matrix(&Matrix4::identity()),
            Err(ViewerError::InvalidState(_))
        ));
    }

    #[test]
    fn test_view_projection_after_perspective() {
        let mut camera = Camera::looking_at(Point3::new(0.0, 0.0, 5.0), Point3::origin());
        camera.set_perspective(45f32.to_radians(), 1.5, 0.1, 100.0);
        let vp = camera.view_projection_matrix().unwrap();
        let expected = camera.projection().unwrap().matrix() * camera.view_matrix();
        assert_eq!(vp, expected);
    }

    #[test]
    fn test_world_matrix_is_applied_last() {
        let mut camera = Camera::looking_at(Point3::new(0.0, 0.0, 5.0), Point3::origin());
        camera.set_perspective(45f32.to_radians(), 1.0, 0.1, 100.0);
        let world = TransformFactory::translation(&Vector3::new(1.0, 0.0, 0.0));
        let wvp = camera.world_view_projection_matrix(&world).unwrap();
        assert_eq!(wvp, camera.view_projection_matrix().unwrap() * world);
    }

    #[test]
    fn test_target_and_angles_agree() {
        let mut camera = Camera::looking_at(Point3::new(0.0, 0.0, 5.0), Point3::new(5.0, 0.0, 5.0));
        let (pitch, yaw) = camera.angles();
        assert!(pitch.abs() < 1e-6);
        assert!((yaw - std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        camera.set_angles(pitch, yaw);
        assert!((camera.direction() - Vector3::x()).norm() < 1e-6);
    }

    #[test]
    fn test_set_fov_needs_projection() {
        let mut camera = Camera::new(Point3::origin(), Orientation::default());
        assert!(!camera.set_fov(1.0));
        camera.set_perspective(0.5, 1.0, 0.1, 10.0);
        assert!(camera.set_fov(1.0));
        assert_eq!(camera.projection().unwrap().fov_y_rad, 1.0);
    }
}
