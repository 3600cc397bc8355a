use crate::core::color::Rgba;
use crate::core::framebuffer::FrameBuffer;
use crate::core::math::transform::project_to_screen;
use crate::scene::light_field::{CameraGrid, GridIndex};
use crate::scene::transform::Transformable;
use log::debug;
use nalgebra::Matrix4;

/// Offscreen target the grid cameras are drawn into, each as a flat square
/// in its pick color. Reading a pixel back identifies the camera under it.
#[derive(Debug, Clone)]
pub struct PickBuffer {
    framebuffer: FrameBuffer,
    glyph_size: f32,
}

impl PickBuffer {
    pub fn new(width: usize, height: usize, glyph_size: f32) -> Self {
        Self {
            framebuffer: FrameBuffer::new(width, height),
            glyph_size,
        }
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn glyph_size(&self) -> f32 {
        self.glyph_size
    }

    /// Redraws every grid camera through the main camera's view-projection.
    /// Returns how many glyphs landed in front of the main camera.
    pub fn render(&mut self, grid: &CameraGrid, view_projection: &Matrix4<f32>) -> usize {
        self.framebuffer.clear(Rgba::TRANSPARENT);
        let drawn = draw_camera_glyphs(&mut self.framebuffer, grid, view_projection, self.glyph_size);
        debug!("Pick buffer: {} of {} camera glyphs visible", drawn, grid.len());
        drawn
    }

    /// The grid camera drawn at pixel `(x, y)`, if any.
    pub fn pick(&self, grid: &CameraGrid, x: usize, y: usize) -> Option<GridIndex> {
        let color = self.framebuffer.get_pixel(x, y)?;
        if color == Rgba::TRANSPARENT {
            return None;
        }
        grid.camera_by_color(color)
    }
}

/// Draws each grid camera as a `glyph_size` square in its current color.
/// The main view uses this as its camera overlay.
pub fn draw_camera_glyphs(
    framebuffer: &mut FrameBuffer,
    grid: &CameraGrid,
    view_projection: &Matrix4<f32>,
    glyph_size: f32,
) -> usize {
    let (width, height) = (framebuffer.width, framebuffer.height);
    let mut drawn = 0;
    grid.iterate_cameras(|camera, _, _, _| {
        if let Some((screen, depth)) =
            project_to_screen(view_projection, &camera.position(), width, height)
        {
            framebuffer.fill_square(screen.x, screen.y, glyph_size * 0.5, depth, camera.color());
            drawn += 1;
        }
    });
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::camera::Camera;
    use nalgebra::Point3;

    fn grid_2x2() -> CameraGrid {
        let mut grid = CameraGrid::new(Point3::new(-0.5, 0.5, 0.0), 1.0, 1.0);
        grid.init_cameras(2, 2);
        grid
    }

    fn main_view(width: usize, height: usize) -> Matrix4<f32> {
        let mut camera = Camera::looking_at(Point3::new(0.0, 0.0, 3.0), Point3::origin());
        camera.set_perspective(60f32.to_radians(), width as f32 / height as f32, 0.1, 100.0);
        camera.view_projection_matrix().unwrap()
    }

    #[test]
    fn test_every_camera_is_pickable() {
        let grid = grid_2x2();
        let mut buffer = PickBuffer::new(200, 200, 8.0);
        assert_eq!(buffer.render(&grid, &main_view(200, 200)), 4);

        let vp = main_view(200, 200);
        for visit in grid.iter() {
            let (screen, _) = project_to_screen(&vp, &visit.camera.position(), 200, 200).unwrap();
            let picked = buffer.pick(&grid, screen.x as usize, screen.y as usize);
            assert_eq!(picked, Some(GridIndex::new(visit.row, visit.col)));
        }
    }

    #[test]
    fn test_background_picks_nothing() {
        let grid = grid_2x2();
        let mut buffer = PickBuffer::new(200, 200, 8.0);
        buffer.render(&grid, &main_view(200, 200));
        assert_eq!(buffer.pick(&grid, 100, 100), None);
        assert_eq!(buffer.pick(&grid, 500, 0), None);
    }

    #[test]
    fn test_selected_camera_is_found_through_highlight() {
        let mut grid = grid_2x2();
        grid.set_selected_camera(1, 0).unwrap();
        let mut buffer = PickBuffer::new(200, 200, 8.0);
        let vp = main_view(200, 200);
        buffer.render(&grid, &vp);

        let selected = grid.camera(1, 0).unwrap();
        let (screen, _) = project_to_screen(&vp, &selected.position(), 200, 200).unwrap();
        let pixel = buffer.framebuffer().get_pixel(screen.x as usize, screen.y as usize);
        assert_eq!(pixel, Some(crate::core::color::SELECTION_HIGHLIGHT));
        assert_eq!(
            buffer.pick(&grid, screen.x as usize, screen.y as usize),
            Some(GridIndex::new(1, 0))
        );
    }
}
