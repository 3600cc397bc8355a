use crate::scene::material::MaterialTable;
use nalgebra::{Vector2, Vector3};

/// Indexed vertex attribute pools read from `v`, `vt` and `vn` records.
///
/// Every pool starts with one zero sentinel at index 0, so a 1-based OBJ index
/// addresses its entry directly. The pools are independent: a face vertex
/// carries one index per attribute.
#[derive(Debug, Clone)]
pub struct AttributePools {
    pub positions: Vec<Vector3<f32>>,
    pub texcoords: Vec<Vector2<f32>>,
    pub normals: Vec<Vector3<f32>>,
    /// Per-vertex colors, parallel to `positions` for colored vertices.
    pub colors: Vec<Vector3<f32>>,
}

impl Default for AttributePools {
    fn default() -> Self {
        Self {
            positions: vec![Vector3::zeros()],
            texcoords: vec![Vector2::zeros()],
            normals: vec![Vector3::zeros()],
            colors: vec![Vector3::zeros()],
        }
    }
}

impl AttributePools {
    /// True once at least one real vertex color has been read.
    /// The sentinel never counts as color data.
    pub fn has_colors(&self) -> bool {
        self.colors.len() > 1
    }

    pub fn position(&self, index: usize) -> Vector3<f32> {
        self.positions.get(index).copied().unwrap_or_else(Vector3::zeros)
    }

    pub fn texcoord(&self, index: usize) -> Vector2<f32> {
        self.texcoords.get(index).copied().unwrap_or_else(Vector2::zeros)
    }

    pub fn normal(&self, index: usize) -> Vector3<f32> {
        self.normals.get(index).copied().unwrap_or_else(Vector3::zeros)
    }

    /// Color of the vertex at `index`; uncolored vertices read as white.
    pub fn color(&self, index: usize) -> Vector3<f32> {
        self.colors
            .get(index)
            .copied()
            .unwrap_or_else(|| Vector3::new(1.0, 1.0, 1.0))
    }
}

/// Resolves a raw OBJ index against a pool currently holding `len` entries
/// (sentinel included).
///
/// Positive indices are absolute, negative ones count back from the end so
/// that `-1` names the most recently appended entry. Zero and indices outside
/// the pool resolve to `None`.
pub fn resolve_index(raw: i64, len: usize) -> Option<usize> {
    let resolved = if raw < 0 { len as i64 + raw } else { raw };
    (resolved >= 1 && (resolved as usize) < len).then_some(resolved as usize)
}

/// Everything the parser accumulates before geometries are finalized:
/// the attribute pools and the materials table.
#[derive(Debug, Clone, Default)]
pub struct GeometryAccumulator {
    pub pools: AttributePools,
    pub materials: MaterialTable,
}
