use crate::scene::material::{Material, MaterialTable};
use crate::scene::transform::{Transform, Transformable};
use crate::scene::utils::Aabb;
use log::debug;
use nalgebra::{Matrix4, Point3, Vector3};

/// One run of triangulated, expanded vertex data sharing a material.
///
/// Attribute arrays are flat and non-indexed: every referenced vertex is copied
/// by value, three vertices per triangle. Optional arrays are `None` when the
/// source had no such data for this run. When present they hold exactly one
/// entry per position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    /// Object name from the last `o` record.
    pub object: String,
    /// Material name, always present in the owning mesh's table.
    pub material: String,
    /// xyz per vertex.
    pub positions: Vec<f32>,
    /// uv per vertex.
    pub texcoords: Option<Vec<f32>>,
    /// xyz per vertex.
    pub normals: Option<Vec<f32>>,
    /// rgb per vertex.
    pub colors: Option<Vec<f32>>,
    /// xyz per vertex, flat per triangle.
    pub tangents: Vec<f32>,
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }
}

/// A parsed model: its geometries, the materials they use and a placement.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometries: Vec<Geometry>,
    pub materials: MaterialTable,
    pub transform: Transform,
    /// Bounds of the geometry data as parsed.
    pub bounds: Option<Aabb>,
    /// Moves the bounding-box midpoint to the origin; applied before `transform`.
    pub center_offset: Vector3<f32>,
}

impl Mesh {
    /// Builds a mesh centered on its bounding box midpoint.
    ///
    /// The geometry data is left as parsed. Centering lives in
    /// [`Self::model_matrix`] as a translation ahead of the user transform.
    pub fn new(geometries: Vec<Geometry>, materials: MaterialTable) -> Self {
        let bounds = Aabb::from_flat_positions(geometries.iter().map(|g| g.positions.as_slice()));
        let center_offset = match &bounds {
            Some(bounds) => {
                debug!("Centering mesh, original midpoint {:?}", bounds.center());
                -bounds.center().coords
            }
            None => Vector3::zeros(),
        };

        Self {
            geometries,
            materials,
            transform: Transform::default(),
            bounds,
            center_offset,
        }
    }

    /// Bounding-box midpoint of the parsed data.
    pub fn original_center(&self) -> Point3<f32> {
        Point3::from(-self.center_offset)
    }

    /// Bounds after centering, before the user transform.
    pub fn centered_bounds(&self) -> Option<Aabb> {
        self.bounds.map(|b| b.translated(&self.center_offset))
    }

    pub fn material_of(&self, geometry: &Geometry) -> &Material {
        self.materials.get_or_default(&geometry.material)
    }

    pub fn vertex_count(&self) -> usize {
        self.geometries.iter().map(Geometry::vertex_count).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.geometries.iter().map(Geometry::triangle_count).sum()
    }

    /// User placement applied to the centered data.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.world_matrix() * Matrix4::new_translation(&self.center_offset)
    }
}

impl Transformable for Mesh {
    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}
