use crate::core::color::Rgba;
use crate::core::error::ViewerResult;
use crate::core::framebuffer::FrameBuffer;
use crate::core::math::transform::project_to_screen;
use crate::scene::camera::Camera;
use crate::scene::light::Light;
use crate::scene::mesh::{Geometry, Mesh};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

/// Output size and shading constants of a preview render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewSettings {
    pub width: usize,
    pub height: usize,
    /// Half-extent in pixels of each splatted point.
    pub point_radius: f32,
    pub ambient: Vector3<f32>,
    pub background: Rgba,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            point_radius: 1.5,
            ambient: Vector3::new(0.1, 0.1, 0.1),
            background: Rgba::new(20, 20, 26, 255),
        }
    }
}

impl PreviewSettings {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Point-splat preview of `mesh` seen from `camera`.
///
/// Every vertex and every triangle centroid is projected and drawn as a small
/// depth-tested square, shaded with a Lambert term. The camera must have a
/// projection; otherwise this fails with `InvalidState`.
pub fn render_preview(
    mesh: &Mesh,
    light: &Light,
    camera: &Camera,
    settings: &PreviewSettings,
) -> ViewerResult<FrameBuffer> {
    let model = mesh.model_matrix();
    let mvp = camera.world_view_projection_matrix(&model)?;

    let mut framebuffer = FrameBuffer::new(settings.width, settings.height);
    framebuffer.clear(settings.background);

    // Normal Matrix: Inverse Transpose of the upper-left 3x3
    let model_3x3 = model.fixed_view::<3, 3>(0, 0).into_owned();
    let normal_matrix = model_3x3.try_inverse().unwrap_or(model_3x3).transpose();

    let pass = SplatPass {
        model: &model,
        mvp: &mvp,
        normal_matrix: &normal_matrix,
        light,
        settings,
    };
    for geometry in &mesh.geometries {
        pass.draw_geometry(&mut framebuffer, mesh, geometry);
    }
    Ok(framebuffer)
}

struct SplatPass<'a> {
    model: &'a Matrix4<f32>,
    mvp: &'a Matrix4<f32>,
    normal_matrix: &'a Matrix3<f32>,
    light: &'a Light,
    settings: &'a PreviewSettings,
}

fn vec3_at(array: &[f32], vertex: usize) -> Option<Vector3<f32>> {
    let i = vertex * 3;
    array
        .get(i..i + 3)
        .map(|v| Vector3::new(v[0], v[1], v[2]))
}

impl SplatPass<'_> {
    fn draw_geometry(&self, framebuffer: &mut FrameBuffer, mesh: &Mesh, geometry: &Geometry) {
        let material = mesh.material_of(geometry);
        let texel = material
            .diffuse_map
            .handle()
            .map(|t| Rgba(t.base_color()).to_linear())
            .unwrap_or_else(|| Vector3::new(1.0, 1.0, 1.0));
        let base = material.diffuse.component_mul(&texel);

        for triangle in 0..geometry.triangle_count() {
            let corners: Vec<Point3<f32>> = (0..3)
                .filter_map(|k| vec3_at(&geometry.positions, triangle * 3 + k))
                .map(Point3::from)
                .collect();
            let &[a, b, c] = corners.as_slice() else {
                continue;
            };
            let face_normal = (b - a).cross(&(c - a)).try_normalize(1e-12).unwrap_or_else(Vector3::y);

            let mut centroid_color = Vector3::zeros();
            for (k, position) in [a, b, c].iter().enumerate() {
                let vertex = triangle * 3 + k;
                let normal = geometry
                    .normals
                    .as_deref()
                    .and_then(|n| vec3_at(n, vertex))
                    .unwrap_or(face_normal);
                let tint = geometry
                    .colors
                    .as_deref()
                    .and_then(|c| vec3_at(c, vertex))
                    .unwrap_or_else(|| Vector3::new(1.0, 1.0, 1.0));
                let color = self.shade(position, &normal, &base.component_mul(&tint));
                centroid_color += color;
                self.splat(framebuffer, position, color);
            }

            let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
            self.splat(framebuffer, &centroid, centroid_color / 3.0);
        }
    }

    fn shade(&self, local: &Point3<f32>, normal: &Vector3<f32>, base: &Vector3<f32>) -> Vector3<f32> {
        let world = self.model.transform_point(local);
        let n = (self.normal_matrix * normal)
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::y);
        let lit = self.settings.ambient + self.light.lambert(&world, &n);
        base.component_mul(&lit)
    }

    fn splat(&self, framebuffer: &mut FrameBuffer, local: &Point3<f32>, color: Vector3<f32>) {
        if let Some((screen, depth)) =
            project_to_screen(self.mvp, local, framebuffer.width, framebuffer.height)
        {
            framebuffer.fill_square(
                screen.x,
                screen.y,
                self.settings.point_radius,
                depth,
                Rgba::from_linear(color),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ViewerError;
    use crate::scene::material::MaterialTable;

    fn quad_mesh() -> Mesh {
        let geometry = Geometry {
            material: "default".into(),
            positions: vec![
                -1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0, 1.0, 0.0, //
                -1.0, -1.0, 0.0, 1.0, 1.0, 0.0, -1.0, 1.0, 0.0,
            ],
            normals: Some([0.0, 0.0, 1.0].repeat(6)),
            tangents: [1.0, 0.0, 0.0].repeat(6),
            ..Geometry::default()
        };
        Mesh::new(vec![geometry], MaterialTable::default())
    }

    fn camera(settings: &PreviewSettings) -> Camera {
        let mut camera = Camera::looking_at(Point3::new(0.0, 0.0, 4.0), Point3::origin());
        camera.set_perspective(45f32.to_radians(), settings.aspect_ratio(), 0.1, 100.0);
        camera
    }

    #[test]
    fn test_requires_projection() {
        let camera = Camera::looking_at(Point3::new(0.0, 0.0, 4.0), Point3::origin());
        let result = render_preview(&quad_mesh(), &Light::default(), &camera, &PreviewSettings::default());
        assert!(matches!(result, Err(ViewerError::InvalidState(_))));
    }

    #[test]
    fn test_lit_quad_stays_inside_frame() {
        let settings = PreviewSettings {
            width: 64,
            height: 64,
            ..PreviewSettings::default()
        };
        let light = Light::new_directional(-Vector3::z(), Vector3::new(1.0, 1.0, 1.0), 1.0);
        let fb = render_preview(&quad_mesh(), &light, &camera(&settings), &settings).unwrap();

        let background = settings.background;
        let drawn = fb.pixels().iter().filter(|p| **p != background).count();
        assert!(drawn > 0);
        // Top-left corner of the image stays empty.
        assert_eq!(fb.get_pixel(0, 0), Some(background));
    }

    #[test]
    fn test_unlit_side_gets_only_ambient() {
        let settings = PreviewSettings {
            width: 32,
            height: 32,
            ambient: Vector3::new(0.2, 0.2, 0.2),
            ..PreviewSettings::default()
        };
        // Light behind the quad.
        let light = Light::new_directional(Vector3::z(), Vector3::new(1.0, 1.0, 1.0), 1.0);
        let fb = render_preview(&quad_mesh(), &light, &camera(&settings), &settings).unwrap();

        // Default diffuse 0.8 times ambient 0.2.
        let expected = Rgba::from_linear(Vector3::new(0.16, 0.16, 0.16));
        assert!(fb.pixels().iter().any(|p| *p == expected));
    }
}
