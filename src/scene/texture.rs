use crate::core::error::{ViewerError, ViewerResult};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Opaque handle the parser binds into materials.
pub type TextureHandle = Arc<Texture>;

/// Textures available for material resolution, keyed by file name.
pub type TextureMap = HashMap<String, TextureHandle>;

/// Represents a decoded 2D texture map.
#[derive(Debug, Clone)]
pub struct Texture {
    pub name: String,
    pub image: Arc<DynamicImage>,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub fn load<P: AsRef<Path>>(path: P) -> ViewerResult<Self> {
        let path_ref = path.as_ref();
        let img = image::open(path_ref)?;
        let (width, height) = img.dimensions();

        info!("Loaded texture: {:?} ({}x{})", path_ref, width, height);

        Ok(Self {
            name: file_name(path_ref),
            width,
            height,
            image: Arc::new(img),
        })
    }

    /// A 1x1 texture of a single color; the built-in material maps are these.
    pub fn solid(name: &str, rgba: [u8; 4]) -> Self {
        let img = RgbaImage::from_pixel(1, 1, Rgba(rgba));
        Self {
            name: name.to_string(),
            image: Arc::new(DynamicImage::ImageRgba8(img)),
            width: 1,
            height: 1,
        }
    }

    /// Color of the texel at (0, 0); enough for the point-splat preview.
    pub fn base_color(&self) -> [u8; 4] {
        self.image.get_pixel(0, 0).0
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| matches!(e.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif"))
}

/// Loads every image file in `dir` into a [`TextureMap`].
/// Files that fail to decode are skipped with a warning.
pub fn load_texture_dir<P: AsRef<Path>>(dir: P) -> ViewerResult<TextureMap> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| ViewerError::io(dir, e))?;

    let mut textures = TextureMap::new();
    for entry in entries {
        let path = entry.map_err(|e| ViewerError::io(dir, e))?.path();
        if !path.is_file() || !is_image_file(&path) {
            debug!("Skipping non-image file {:?}", path);
            continue;
        }
        match Texture::load(&path) {
            Ok(texture) => {
                textures.insert(texture.name.clone(), Arc::new(texture));
            }
            Err(e) => warn!("Failed to load texture {:?}: {}", path, e),
        }
    }
    Ok(textures)
}
