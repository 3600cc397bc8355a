use crate::scene::camera::Camera;
use crate::scene::light::Light;
use crate::scene::light_field::CameraGrid;
use crate::scene::mesh::Mesh;
use log::info;
use nalgebra::Vector3;

/// Holds all scene resources the viewer renders and picks against.
#[derive(Debug, Clone)]
pub struct SceneContext {
    pub camera: Camera,
    pub light: Light,
    pub ambient: Vector3<f32>,
    /// Empty until a model is loaded.
    pub mesh: Option<Mesh>,
    pub grid: CameraGrid,
}

impl SceneContext {
    /// Swaps in a newly parsed mesh as is. Returns the mesh that was replaced.
    pub fn replace_mesh(&mut self, mesh: Mesh) -> Option<Mesh> {
        info!(
            "Scene mesh replaced: {} geometries, {} triangles",
            mesh.geometries.len(),
            mesh.triangle_count()
        );
        self.mesh.replace(mesh)
    }
}
