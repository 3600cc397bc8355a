use crate::core::error::{ViewerError, ViewerResult};
use crate::core::framebuffer::FrameBuffer;
use log::info;
use std::fs;
use std::path::Path;

/// Saves a frame buffer to an image file; the format follows the extension.
/// Missing parent directories are created.
pub fn save_framebuffer<P: AsRef<Path>>(framebuffer: &FrameBuffer, path: P) -> ViewerResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ViewerError::io(parent, e))?;
    }
    framebuffer.to_image().save(path)?;
    info!(
        "Saved {}x{} image to {}",
        framebuffer.width,
        framebuffer.height,
        path.display()
    );
    Ok(())
}
