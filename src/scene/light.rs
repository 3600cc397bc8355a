use nalgebra::{Point3, Vector3};

/// The scene's light source.
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    /// Infinitely far away; rays are parallel.
    Directional {
        direction: Vector3<f32>,
        color: Vector3<f32>,
        intensity: f32,
    },
    /// Radiates from a position in all directions.
    Point {
        position: Point3<f32>,
        color: Vector3<f32>,
        intensity: f32,
    },
}

impl Default for Light {
    fn default() -> Self {
        Light::new_point(Point3::new(2.0, 4.0, 4.0), Vector3::new(1.0, 1.0, 1.0), 1.0)
    }
}

impl Light {
    pub fn new_directional(direction: Vector3<f32>, color: Vector3<f32>, intensity: f32) -> Self {
        Self::Directional {
            direction: direction.normalize(),
            color,
            intensity,
        }
    }

    pub fn new_point(position: Point3<f32>, color: Vector3<f32>, intensity: f32) -> Self {
        Self::Point {
            position,
            color,
            intensity,
        }
    }

    /// Direction FROM the surface point TO the light source.
    pub fn direction_to_light(&self, surface_point: &Point3<f32>) -> Vector3<f32> {
        match self {
            Light::Directional { direction, .. } => -direction,
            Light::Point { position, .. } => (position - surface_point)
                .try_normalize(1e-9)
                .unwrap_or_else(Vector3::y),
        }
    }

    /// Light color scaled by intensity. No distance falloff; the preview only
    /// needs a readable shape.
    pub fn radiance(&self) -> Vector3<f32> {
        match self {
            Light::Directional {
                color, intensity, ..
            }
            | Light::Point {
                color, intensity, ..
            } => color * *intensity,
        }
    }

    /// Lambert term for a surface normal at `surface_point`.
    pub fn lambert(&self, surface_point: &Point3<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
        let n_dot_l = normal.dot(&self.direction_to_light(surface_point)).max(0.0);
        self.radiance() * n_dot_l
    }
}
