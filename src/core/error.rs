//! Error types shared across the viewer.

use thiserror::Error;

/// Result type for viewer operations.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Errors that can occur while loading, configuring or rendering a scene.
///
/// Malformed OBJ/MTL input is never an error: the parser skips what it cannot
/// read. These variants cover grid lookups, camera contract violations and I/O.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("camera index ({row}, {col}) is outside the {rows}x{cols} grid")]
    CameraIndex {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("invalid camera state: {0}")]
    InvalidState(&'static str),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl ViewerError {
    /// Wraps an I/O error together with the path that caused it.
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        ViewerError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
