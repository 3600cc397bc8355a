use crate::core::error::{ViewerError, ViewerResult};
use crate::io::image::save_framebuffer;
use crate::pipeline::preview::{PreviewSettings, render_preview};
use crate::scene::light::Light;
use crate::scene::light_field::CameraGrid;
use crate::scene::mesh::Mesh;
use chrono::Local;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the frame captured by the camera at `(row, col)`.
pub fn frame_file_name(row: usize, col: usize) -> String {
    format!("cam_{}_{}.png", row, col)
}

/// A fresh timestamped directory under `base` for one export run.
pub fn timestamped_export_dir(base: &Path) -> PathBuf {
    base.join(format!("lightfield_{}", Local::now().format("%Y%m%d_%H%M%S")))
}

/// Captures one frame per grid camera into `dir`, row-major.
///
/// Each camera's frame is rendered, encoded and written before the next
/// camera starts. Every grid camera needs a projection. Returns the written
/// paths in capture order.
pub async fn export_light_field(
    grid: &CameraGrid,
    mesh: &Mesh,
    light: &Light,
    settings: &PreviewSettings,
    dir: &Path,
) -> ViewerResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| ViewerError::io(dir, e))?;
    info!(
        "Exporting {} views ({}x{}) to {}",
        grid.len(),
        settings.width,
        settings.height,
        dir.display()
    );

    let mut written = Vec::with_capacity(grid.len());
    let captured = grid
        .iterate_cameras_async(|visit| {
            let path = dir.join(frame_file_name(visit.row, visit.col));
            written.push(path.clone());
            let frame = render_preview(mesh, light, &visit.camera.camera, settings);
            async move {
                save_framebuffer(&frame?, &path)?;
                Ok::<(), ViewerError>(())
            }
        })
        .await?;

    info!("Exported {} views", captured);
    Ok(written)
}
