use nalgebra::{Vector2, Vector3};

/// Tangent used wherever no UV-derived direction exists.
pub const FALLBACK_TANGENT: [f32; 3] = [1.0, 0.0, 0.0];

/// Tangent of one triangle from its positions and texture coordinates.
///
/// Falls back to [`FALLBACK_TANGENT`] when the UV mapping is degenerate, i.e.
/// the UV-delta determinant is zero or the result is not a finite unit vector.
pub fn triangle_tangent(positions: [Vector3<f32>; 3], uvs: [Vector2<f32>; 3]) -> Vector3<f32> {
    let dp12 = positions[1] - positions[0];
    let dp13 = positions[2] - positions[0];
    let duv12 = uvs[1] - uvs[0];
    let duv13 = uvs[2] - uvs[0];

    let f = 1.0 / (duv12.x * duv13.y - duv13.x * duv12.y);
    if !f.is_finite() {
        return Vector3::from(FALLBACK_TANGENT);
    }

    let tangent = (dp12 * duv13.y - dp13 * duv12.y) * f;
    match tangent.try_normalize(1e-12) {
        Some(t) if t.iter().all(|c| c.is_finite()) => t,
        _ => Vector3::from(FALLBACK_TANGENT),
    }
}

/// Flat per-triangle tangents for expanded (non-indexed) vertex data.
///
/// `positions` holds 3 floats per vertex and `texcoords` 2; every consecutive
/// group of 3 vertices is one triangle and all three get the same tangent.
/// Trailing vertices that do not complete a triangle get the fallback.
pub fn generate_tangents(positions: &[f32], texcoords: &[f32]) -> Vec<f32> {
    let vertex_count = positions.len() / 3;
    let mut tangents = Vec::with_capacity(vertex_count * 3);

    let position = |i: usize| Vector3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]);
    let uv = |i: usize| Vector2::new(texcoords[i * 2], texcoords[i * 2 + 1]);

    let triangle_count = vertex_count.min(texcoords.len() / 2) / 3;
    for tri in 0..triangle_count {
        let base = tri * 3;
        let t = triangle_tangent(
            [position(base), position(base + 1), position(base + 2)],
            [uv(base), uv(base + 1), uv(base + 2)],
        );
        for _ in 0..3 {
            tangents.extend_from_slice(t.as_slice());
        }
    }

    while tangents.len() < vertex_count * 3 {
        tangents.extend_from_slice(&FALLBACK_TANGENT);
    }
    tangents
}

/// Constant fallback tangents for `vertex_count` vertices.
pub fn placeholder_tangents(vertex_count: usize) -> Vec<f32> {
    FALLBACK_TANGENT.repeat(vertex_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_right_triangle_tangent_follows_u_axis() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let texcoords = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        let tangents = generate_tangents(&positions, &texcoords);

        assert_eq!(tangents.len(), 9);
        for t in tangents.chunks_exact(3) {
            assert!((t[0] - 1.0).abs() < 1e-6);
            assert!(t[1].abs() < 1e-6 && t[2].abs() < 1e-6);
        }
    }

    #[test]
    fn test_rotated_uvs_rotate_tangent() {
        // U runs along +Y in object space.
        let t = triangle_tangent(
            [Vector3::zeros(), Vector3::new(0.0, 1.0, 0.0), Vector3::new(-1.0, 0.0, 0.0)],
            [Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)],
        );
        assert!((t - Vector3::y()).norm() < 1e-6);
    }

    #[test]
    fn test_degenerate_uvs_use_fallback() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let texcoords = [0.5, 0.5, 0.5, 0.5, 0.5, 0.5];
        let tangents = generate_tangents(&positions, &texcoords);
        assert!(tangents.iter().all(|v| v.is_finite()));
        assert_eq!(&tangents[..3], &FALLBACK_TANGENT);
    }

    #[test]
    fn test_collapsed_positions_use_fallback() {
        let t = triangle_tangent(
            [Vector3::zeros(); 3],
            [Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)],
        );
        assert_eq!(t, Vector3::from(FALLBACK_TANGENT));
    }

    #[test]
    fn test_placeholder_length() {
        assert_eq!(placeholder_tangents(4).len(), 12);
    }
}
