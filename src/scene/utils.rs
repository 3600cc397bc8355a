use nalgebra::{Point3, Vector3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// Bounds of flat xyz position data; `None` when there are no points.
    pub fn from_flat_positions<'a>(arrays: impl IntoIterator<Item = &'a [f32]>) -> Option<Self> {
        let mut min_bound = Point3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max_bound = Point3::new(f32::MIN, f32::MIN, f32::MIN);
        let mut has_verts = false;

        for positions in arrays {
            for p in positions.chunks_exact(3) {
                min_bound.x = min_bound.x.min(p[0]);
                min_bound.y = min_bound.y.min(p[1]);
                min_bound.z = min_bound.z.min(p[2]);

                max_bound.x = max_bound.x.max(p[0]);
                max_bound.y = max_bound.y.max(p[1]);
                max_bound.z = max_bound.z.max(p[2]);
                has_verts = true;
            }
        }

        has_verts.then_some(Self {
            min: min_bound,
            max: max_bound,
        })
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn translated(&self, offset: &Vector3<f32>) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}
