pub mod camera;
pub mod context;
pub mod light;
pub mod light_field;
pub mod loader;
pub mod material;
pub mod mesh;
pub mod texture;
pub mod transform;
pub mod utils;
