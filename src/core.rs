pub mod color;
pub mod error;
pub mod framebuffer;
pub mod geometry;
pub mod math;
