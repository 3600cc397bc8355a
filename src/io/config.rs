use crate::core::error::{ViewerError, ViewerResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Viewer configuration, read from TOML. Every section and field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub light: LightConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> ViewerResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ViewerError::io(path, e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> ViewerResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    /// Model to load. Without one the viewer starts with an empty scene.
    #[serde(default)]
    pub obj: Option<PathBuf>,
    /// Material libraries read in addition to the model's `mtllib`s.
    #[serde(default)]
    pub mtl: Vec<PathBuf>,
    #[serde(default)]
    pub texture_dir: Option<PathBuf>,

    // --- Mesh placement ---
    #[serde(default)]
    pub position: [f32; 3],
    /// Euler angles in degrees.
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            obj: None,
            mtl: Vec::new(),
            texture_dir: None,
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: default_scale(),
        }
    }
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    /// Degrees. Ignored when `target` is set.
    #[serde(default)]
    pub pitch: f32,
    /// Degrees, 0 looks down -Z.
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub target: Option<[f32; 3]>,
    /// Vertical field of view in degrees.
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,

    // --- Controller ---
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    #[serde(default = "default_zoom_speed")]
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: default_camera_position(),
            pitch: 0.0,
            yaw: 0.0,
            target: Some([0.0, 0.0, 0.0]),
            fov: default_fov(),
            near: default_near(),
            far: default_far(),
            speed: default_speed(),
            sensitivity: default_sensitivity(),
            zoom_speed: default_zoom_speed(),
        }
    }
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 1.0, 6.0]
}
fn default_fov() -> f32 {
    45.0
}
fn default_near() -> f32 {
    0.1
}
fn default_far() -> f32 {
    100.0
}
fn default_speed() -> f32 {
    2.5
}
fn default_sensitivity() -> f32 {
    0.1
}
fn default_zoom_speed() -> f32 {
    2.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightConfig {
    /// "point" or "directional".
    #[serde(default = "default_light_type")]
    pub r#type: String,
    #[serde(default = "default_light_position")]
    pub position: [f32; 3],
    #[serde(default = "default_light_direction")]
    pub direction: [f32; 3],
    #[serde(default = "default_light_color")]
    pub color: [f32; 3],
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default = "default_ambient")]
    pub ambient: [f32; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            r#type: default_light_type(),
            position: default_light_position(),
            direction: default_light_direction(),
            color: default_light_color(),
            intensity: default_intensity(),
            ambient: default_ambient(),
        }
    }
}

fn default_light_type() -> String {
    "point".to_string()
}
fn default_light_position() -> [f32; 3] {
    [2.0, 4.0, 4.0]
}
fn default_light_direction() -> [f32; 3] {
    [-1.0, -2.0, -1.0]
}
fn default_light_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}
fn default_intensity() -> f32 {
    1.0
}
fn default_ambient() -> [f32; 3] {
    [0.1, 0.1, 0.1]
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_grid_dimension")]
    pub rows: usize,
    #[serde(default = "default_grid_dimension")]
    pub cols: usize,
    #[serde(default = "default_spacing")]
    pub horizontal_spacing: f32,
    #[serde(default = "default_spacing")]
    pub vertical_spacing: f32,
    /// World position of camera (0, 0).
    #[serde(default = "default_anchor")]
    pub anchor: [f32; 3],
    #[serde(default = "default_max_dimension")]
    pub max_dimension: usize,
    /// Vertical field of view of every grid camera, degrees.
    #[serde(default = "default_fov")]
    pub fov: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: default_grid_dimension(),
            cols: default_grid_dimension(),
            horizontal_spacing: default_spacing(),
            vertical_spacing: default_spacing(),
            anchor: default_anchor(),
            max_dimension: default_max_dimension(),
            fov: default_fov(),
        }
    }
}

fn default_grid_dimension() -> usize {
    4
}
fn default_spacing() -> f32 {
    0.25
}
fn default_anchor() -> [f32; 3] {
    [-0.375, 0.375, 3.0]
}
fn default_max_dimension() -> usize {
    crate::scene::light_field::MAX_GRID_DIMENSION
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    /// Parent of the timestamped export directories.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Side length in pixels of a camera glyph in the pick buffer.
    #[serde(default = "default_glyph_size")]
    pub glyph_size: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            output_dir: default_output_dir(),
            glyph_size: default_glyph_size(),
        }
    }
}

fn default_width() -> usize {
    640
}
fn default_height() -> usize {
    480
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_glyph_size() -> f32 {
    12.0
}
