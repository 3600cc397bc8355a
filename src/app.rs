use crate::core::error::{ViewerError, ViewerResult};
use crate::core::framebuffer::FrameBuffer;
use crate::io::config::Config;
use crate::io::image::save_framebuffer;
use crate::io::obj_loader::load_obj;
use crate::pipeline::capture::{export_light_field, timestamped_export_dir};
use crate::pipeline::pick_buffer::{PickBuffer, draw_camera_glyphs};
use crate::pipeline::preview::{PreviewSettings, render_preview};
use crate::scene::camera::Camera;
use crate::scene::context::SceneContext;
use crate::scene::light_field::GridIndex;
use crate::scene::loader::{init_scene_context, scene_transform};
use crate::ui::input::{CameraController, InputEvent};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// The light-field viewer: scene, main camera controller, pick buffer and
/// the export pipeline, independent of any window system.
pub struct Viewer {
    config: Config,
    context: SceneContext,
    controller: CameraController,
    pick_buffer: PickBuffer,
    preview: PreviewSettings,
}

impl Viewer {
    pub fn new(config: Config) -> ViewerResult<Self> {
        let context = init_scene_context(&config)?;
        let controller = CameraController::new(
            config.camera.speed,
            config.camera.sensitivity,
            config.camera.fov,
            config.camera.zoom_speed,
            &context.camera,
        );
        let preview = PreviewSettings {
            width: config.export.width,
            height: config.export.height,
            ambient: context.ambient,
            ..PreviewSettings::default()
        };
        let pick_buffer = PickBuffer::new(preview.width, preview.height, config.export.glyph_size);

        let mut viewer = Self {
            config,
            context,
            controller,
            pick_buffer,
            preview,
        };
        viewer.refresh_pick_buffer()?;
        Ok(viewer)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn context(&self) -> &SceneContext {
        &self.context
    }

    pub fn preview_settings(&self) -> &PreviewSettings {
        &self.preview
    }

    /// Loads a model, places it per `[scene]` and swaps it into the scene.
    pub fn load_model(&mut self, path: &Path, extra_mtl: &[PathBuf], texture_dir: Option<&Path>) -> ViewerResult<()> {
        let mut mesh = load_obj(path, extra_mtl, texture_dir)?;
        mesh.transform = scene_transform(&self.config.scene);
        self.context.replace_mesh(mesh);
        Ok(())
    }

    // --- Grid ---

    pub fn set_grid_size(&mut self, cols: usize, rows: usize) -> ViewerResult<Option<GridIndex>> {
        let selected = self.context.grid.init_cameras(cols, rows);
        self.refresh_pick_buffer()?;
        Ok(selected)
    }

    pub fn set_grid_spacing(&mut self, horizontal: f32, vertical: f32) -> ViewerResult<Option<GridIndex>> {
        let selected = self.context.grid.set_spacing(horizontal, vertical);
        self.refresh_pick_buffer()?;
        Ok(selected)
    }

    pub fn select_camera(&mut self, row: usize, col: usize) -> ViewerResult<()> {
        self.context.grid.set_selected_camera(row, col)?;
        self.refresh_pick_buffer()
    }

    /// Selects the grid camera under the window position `(x, y)`.
    /// Returns the new selection, or `None` when no camera is there.
    pub fn click(&mut self, x: usize, y: usize) -> ViewerResult<Option<GridIndex>> {
        let Some(index) = self.pick_buffer.pick(&self.context.grid, x, y) else {
            debug!("Click at ({}, {}) hit no camera", x, y);
            return Ok(None);
        };
        info!("Selected camera ({}, {})", index.row, index.col);
        self.select_camera(index.row, index.col)?;
        Ok(Some(index))
    }

    // --- Main camera ---

    pub fn handle_input(&mut self, event: InputEvent) -> ViewerResult<()> {
        self.controller.handle_event(event, &mut self.context.camera);
        self.refresh_pick_buffer()
    }

    pub fn update(&mut self, dt: f32) -> ViewerResult<()> {
        self.controller.update(&mut self.context.camera, dt);
        self.refresh_pick_buffer()
    }

    /// Redraws the pick buffer; needed whenever the main camera or the grid changes.
    pub fn refresh_pick_buffer(&mut self) -> ViewerResult<()> {
        let view_projection = self.context.camera.view_projection_matrix()?;
        self.pick_buffer.render(&self.context.grid, &view_projection);
        Ok(())
    }

    // --- Rendering ---

    /// The scene from the main camera with the grid cameras drawn on top.
    pub fn render_main_view(&self) -> ViewerResult<FrameBuffer> {
        let mut frame = self.render_from(&self.context.camera)?;
        let view_projection = self.context.camera.view_projection_matrix()?;
        draw_camera_glyphs(
            &mut frame,
            &self.context.grid,
            &view_projection,
            self.pick_buffer.glyph_size(),
        );
        Ok(frame)
    }

    /// The scene as the selected grid camera sees it.
    pub fn render_selected_view(&self) -> ViewerResult<FrameBuffer> {
        let selected = self
            .context
            .grid
            .selected_camera()
            .ok_or(ViewerError::InvalidState("camera grid has no selection"))?;
        self.render_from(&selected.camera)
    }

    fn render_from(&self, camera: &Camera) -> ViewerResult<FrameBuffer> {
        match &self.context.mesh {
            Some(mesh) => render_preview(mesh, &self.context.light, camera, &self.preview),
            None => {
                camera.view_projection_matrix()?;
                let mut frame = FrameBuffer::new(self.preview.width, self.preview.height);
                frame.clear(self.preview.background);
                Ok(frame)
            }
        }
    }

    /// Captures every grid view into `dir`, or into a new timestamped
    /// directory under the configured output directory.
    pub async fn export(&self, dir: Option<&Path>) -> ViewerResult<Vec<PathBuf>> {
        let mesh = self
            .context
            .mesh
            .as_ref()
            .ok_or(ViewerError::InvalidState("no model loaded to export"))?;
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => timestamped_export_dir(&self.config.export.output_dir),
        };

        let start_time = Instant::now();
        let written = export_light_field(&self.context.grid, mesh, &self.context.light, &self.preview, &dir).await?;
        info!("Export completed in {:.2?}", start_time.elapsed());
        Ok(written)
    }
}

/// What a headless run should do beyond building the scene.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    /// Window position to click before rendering.
    pub pick: Option<(usize, usize)>,
    pub export: bool,
    /// Where to write the main view and selected view images.
    pub output: Option<PathBuf>,
}

/// Runs the viewer without a window: optional pick, view renders, export.
pub fn run_cli(config: Config, options: &CliOptions) -> ViewerResult<()> {
    info!("Starting CLI mode...");
    let mut viewer = Viewer::new(config)?;

    if let Some((x, y)) = options.pick {
        match viewer.click(x, y)? {
            Some(index) => info!("Pick ({}, {}) -> camera ({}, {})", x, y, index.row, index.col),
            None => warn!("Pick ({}, {}) did not hit a camera", x, y),
        }
    }

    if let Some(output) = &options.output {
        save_framebuffer(&viewer.render_main_view()?, output)?;
        let selected_path = output.with_file_name(format!(
            "{}_selected.png",
            output.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default()
        ));
        save_framebuffer(&viewer.render_selected_view()?, selected_path)?;
    }

    if options.export {
        let written = futures::executor::block_on(viewer.export(None))?;
        info!("Wrote {} light-field views", written.len());
    }

    info!("Done.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::transform::project_to_screen;
    use crate::scene::transform::Transformable;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.export.width = 160;
        config.export.height = 120;
        config.grid.rows = 2;
        config.grid.cols = 3;
        config.export.glyph_size = 6.0;
        config
    }

    #[test]
    fn test_click_selects_camera_under_cursor() {
        let mut viewer = Viewer::new(small_config()).unwrap();
        let vp = viewer.context().camera.view_projection_matrix().unwrap();
        let target = viewer.context().grid.camera(1, 2).unwrap().position();
        let (screen, _) = project_to_screen(&vp, &target, 160, 120).unwrap();

        let picked = viewer.click(screen.x as usize, screen.y as usize).unwrap();
        assert_eq!(picked, Some(GridIndex::new(1, 2)));
        assert_eq!(viewer.context().grid.selected_camera_index(), Some(GridIndex::new(1, 2)));
    }

    #[test]
    fn test_click_on_background_keeps_selection() {
        let mut viewer = Viewer::new(small_config()).unwrap();
        assert_eq!(viewer.click(0, 0).unwrap(), None);
        assert_eq!(viewer.context().grid.selected_camera_index(), Some(GridIndex::ORIGIN));
    }

    #[test]
    fn test_resizing_grid_keeps_selection_when_possible() {
        let mut viewer = Viewer::new(small_config()).unwrap();
        viewer.select_camera(1, 1).unwrap();
        assert_eq!(viewer.set_grid_size(2, 3).unwrap(), Some(GridIndex::new(1, 1)));
        assert_eq!(viewer.set_grid_size(1, 1).unwrap(), Some(GridIndex::ORIGIN));
    }

    #[test]
    fn test_views_render_without_model() {
        let viewer = Viewer::new(small_config()).unwrap();
        let main = viewer.render_main_view().unwrap();
        assert_eq!((main.width, main.height), (160, 120));
        assert!(viewer.render_selected_view().is_ok());
    }

    #[test]
    fn test_loaded_model_gets_configured_placement() {
        let dir = std::env::temp_dir().join(format!("lfv-app-load-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let obj = dir.join("tri.obj");
        std::fs::write(&obj, "v 4 0 0\nv 6 0 0\nv 4 2 0\nf 1 2 3\n").unwrap();

        let mut config = small_config();
        config.scene.position = [0.0, 1.0, 0.0];
        let mut viewer = Viewer::new(config).unwrap();
        viewer.load_model(&obj, &[], None).unwrap();
        viewer.load_model(&obj, &[], None).unwrap();

        let mesh = viewer.context().mesh.as_ref().unwrap();
        assert_eq!(mesh.position(), nalgebra::Point3::new(0.0, 1.0, 0.0));
        let center = mesh.model_matrix().transform_point(&nalgebra::Point3::new(5.0, 1.0, 0.0));
        assert!((center - nalgebra::Point3::new(0.0, 1.0, 0.0)).norm() < 1e-5);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_export_without_model_fails() {
        let viewer = Viewer::new(small_config()).unwrap();
        let result = futures::executor::block_on(viewer.export(None));
        assert!(matches!(result, Err(ViewerError::InvalidState(_))));
    }
}
