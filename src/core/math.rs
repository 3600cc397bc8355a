pub mod tangent;
pub mod transform;
