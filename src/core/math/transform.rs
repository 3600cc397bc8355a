use nalgebra::{Matrix4, Point2, Point3, Vector3, Vector4};

//=================================
// Transform Matrix Factory
//=================================

/// Builds the matrices used by meshes and cameras.
/// Everything is Right-Handed, cameras look down -Z in view space.
pub struct TransformFactory;

#[rustfmt::skip]
impl TransformFactory {
    pub fn rotation_x(angle_rad: f32) -> Matrix4<f32> {
        let (s, c) = angle_rad.sin_cos();
        Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, c,  -s,   0.0,
            0.0, s,   c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn rotation_y(angle_rad: f32) -> Matrix4<f32> {
        let (s, c) = angle_rad.sin_cos();
        Matrix4::new(
            c,   0.0, s,   0.0,
            0.0, 1.0, 0.0, 0.0,
           -s,   0.0, c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn rotation_z(angle_rad: f32) -> Matrix4<f32> {
        let (s, c) = angle_rad.sin_cos();
        Matrix4::new(
            c,  -s,   0.0, 0.0,
            s,   c,   0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn translation(offset: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            1.0, 0.0, 0.0, offset.x,
            0.0, 1.0, 0.0, offset.y,
            0.0, 0.0, 1.0, offset.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn scaling(scale: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            scale.x, 0.0,     0.0,     0.0,
            0.0,     scale.y, 0.0,     0.0,
            0.0,     0.0,     scale.z, 0.0,
            0.0,     0.0,     0.0,     1.0,
        )
    }

    /// Model matrix `T * Rx * Ry * Rz * S`, rotation given in degrees.
    pub fn model(position: &Point3<f32>, rotation_deg: &Vector3<f32>, scale: &Vector3<f32>) -> Matrix4<f32> {
        Self::translation(&position.coords)
            * Self::rotation_x(rotation_deg.x.to_radians())
            * Self::rotation_y(rotation_deg.y.to_radians())
            * Self::rotation_z(rotation_deg.z.to_radians())
            * Self::scaling(scale)
    }

    /// Look-at view matrix. Moves `eye` to the origin and points `target` down -Z.
    pub fn view(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        let back = (eye - target).normalize();
        // Looking straight along `up` leaves the cross product undefined.
        let up = if back.cross(up).norm_squared() < 1e-12 {
            if back.z.abs() < 0.9 { Vector3::z() } else { Vector3::x() }
        } else {
            *up
        };
        let right = up.cross(&back).normalize();
        let true_up = back.cross(&right);

        let rotation = Matrix4::new(
            right.x,   right.y,   right.z,   0.0,
            true_up.x, true_up.y, true_up.z, 0.0,
            back.x,    back.y,    back.z,    0.0,
            0.0,       0.0,       0.0,       1.0,
        );
        rotation * Self::translation(&-eye.coords)
    }

    /// Perspective projection mapping the view frustum to NDC [-1, 1].
    pub fn perspective(aspect_ratio: f32, fov_y_rad: f32, near: f32, far: f32) -> Matrix4<f32> {
        let f = 1.0 / (fov_y_rad * 0.5).tan();
        let nf = 1.0 / (near - far);

        Matrix4::new(
            f / aspect_ratio, 0.0, 0.0,               0.0,
            0.0,              f,   0.0,               0.0,
            0.0,              0.0, (far + near) * nf, 2.0 * far * near * nf,
            0.0,              0.0, -1.0,              0.0,
        )
    }
}

/// Unit view direction for pitch/yaw angles in radians.
/// Yaw 0 looks down -Z, positive yaw turns toward +X, positive pitch looks up.
pub fn direction_from_angles(pitch_rad: f32, yaw_rad: f32) -> Vector3<f32> {
    let (sp, cp) = pitch_rad.sin_cos();
    let (sy, cy) = yaw_rad.sin_cos();
    Vector3::new(cp * sy, sp, -cp * cy)
}

/// Inverse of [`direction_from_angles`]; returns `(pitch, yaw)` in radians.
pub fn angles_from_direction(direction: &Vector3<f32>) -> (f32, f32) {
    let d = direction.normalize();
    let pitch = d.y.clamp(-1.0, 1.0).asin();
    let yaw = d.x.atan2(-d.z);
    (pitch, yaw)
}

/// Performs perspective division: Clip Space -> NDC.
/// Returns `None` for points on or behind the eye plane.
#[inline]
pub fn apply_perspective_division(clip: &Vector4<f32>) -> Option<Point3<f32>> {
    (clip.w > 1e-6).then(|| Point3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w))
}

/// Converts NDC coordinates to Screen coordinates (Viewport Transform).
/// Note: Y-axis is flipped (NDC +Y is up, Screen +Y is down).
#[inline]
pub fn ndc_to_screen(ndc_x: f32, ndc_y: f32, width: f32, height: f32) -> Point2<f32> {
    Point2::new(
        (ndc_x + 1.0) * 0.5 * width,
        (1.0 - (ndc_y + 1.0) * 0.5) * height,
    )
}

/// Projects a world-space point through `view_projection` to pixel coordinates
/// plus NDC depth. Points outside the depth range are rejected.
pub fn project_to_screen(
    view_projection: &Matrix4<f32>,
    point: &Point3<f32>,
    width: usize,
    height: usize,
) -> Option<(Point2<f32>, f32)> {
    let clip = view_projection * point.to_homogeneous();
    let ndc = apply_perspective_division(&clip)?;
    if !(-1.0..=1.0).contains(&ndc.z) {
        return None;
    }
    Some((ndc_to_screen(ndc.x, ndc.y, width as f32, height as f32), ndc.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_default_angles_look_down_negative_z() {
        let d = direction_from_angles(0.0, 0.0);
        assert!((d - Vector3::new(0.0, 0.0, -1.0)).norm() < EPS);
    }

    #[test]
    fn test_angles_round_trip() {
        let (pitch, yaw) = (0.3_f32, -1.2_f32);
        let (p, y) = angles_from_direction(&direction_from_angles(pitch, yaw));
        assert!((p - pitch).abs() < EPS);
        assert!((y - yaw).abs() < EPS);
    }

    #[test]
    fn test_view_moves_target_onto_negative_z() {
        let eye = Point3::new(1.0, 2.0, 5.0);
        let target = Point3::new(1.0, 2.0, 0.0);
        let view = TransformFactory::view(&eye, &target, &Vector3::y());
        let t = view.transform_point(&target);
        assert!(t.x.abs() < EPS && t.y.abs() < EPS);
        assert!((t.z + 5.0).abs() < EPS);
    }

    #[test]
    fn test_view_handles_vertical_look() {
        let view = TransformFactory::view(&Point3::new(0.0, 5.0, 0.0), &Point3::origin(), &Vector3::y());
        assert!(view.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_projected_center_hits_screen_center() {
        let view = TransformFactory::view(&Point3::new(0.0, 0.0, 3.0), &Point3::origin(), &Vector3::y());
        let proj = TransformFactory::perspective(1.0, 60f32.to_radians(), 0.1, 100.0);
        let (screen, depth) = project_to_screen(&(proj * view), &Point3::origin(), 200, 100).unwrap();
        assert!((screen.x - 100.0).abs() < 1e-3);
        assert!((screen.y - 50.0).abs() < 1e-3);
        assert!(depth > -1.0 && depth < 1.0);
    }

    #[test]
    fn test_points_behind_camera_are_rejected() {
        let view = TransformFactory::view(&Point3::new(0.0, 0.0, 3.0), &Point3::origin(), &Vector3::y());
        let proj = TransformFactory::perspective(1.0, 60f32.to_radians(), 0.1, 100.0);
        assert!(project_to_screen(&(proj * view), &Point3::new(0.0, 0.0, 10.0), 64, 64).is_none());
    }

    #[test]
    fn test_model_applies_scale_before_translation() {
        let m = TransformFactory::model(
            &Point3::new(1.0, 0.0, 0.0),
            &Vector3::zeros(),
            &Vector3::new(2.0, 2.0, 2.0),
        );
        let p = m.transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert!((p - Point3::new(3.0, 2.0, 2.0)).norm() < EPS);
    }
}
