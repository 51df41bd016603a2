use glam::{Mat3, Mat4, Quat, Vec3};

/// Right-handed perspective camera looking down its local −Z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub rotation: Quat,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_degrees: 60.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Turn to face `target` keeping world +Y up.
    ///
    /// When looking straight along ±Y the back axis is nudged off the pole,
    /// so a camera directly above the target ends up with screen-up along −Z.
    pub fn look_at(&mut self, target: Vec3) {
        let mut back = self.position - target;
        if back.length_squared() == 0.0 {
            back = Vec3::Z;
        }
        back = back.normalize();
        if Vec3::Y.cross(back).length_squared() < 1e-12 {
            back.z += 1e-4;
            back = back.normalize();
        }
        let right = Vec3::Y.cross(back).normalize();
        let up = back.cross(right);
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, back));
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn default_faces_negative_z() {
        let cam = PerspectiveCamera::at(Vec3::new(0.0, 1.0, 0.0));
        assert!(close(cam.forward(), Vec3::NEG_Z));
        assert!(close(cam.up(), Vec3::Y));
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let mut cam = PerspectiveCamera::at(Vec3::new(2.0, 2.0, 5.0));
        cam.look_at(Vec3::ZERO);
        let expected = (Vec3::ZERO - cam.position).normalize();
        assert!(close(cam.forward(), expected));
        assert!(cam.up().y > 0.0);
    }

    #[test]
    fn look_straight_down_keeps_road_up() {
        let mut cam = PerspectiveCamera::at(Vec3::new(0.0, 7.0, 0.0));
        cam.look_at(Vec3::ZERO);
        assert!(close(cam.forward(), Vec3::NEG_Y));
        assert!(close(cam.up(), Vec3::NEG_Z));
        assert!(!cam.view_projection().is_nan());
    }

    #[test]
    fn target_projects_to_screen_center() {
        let mut cam = PerspectiveCamera::at(Vec3::new(-5.0, 5.0, 2.0));
        cam.look_at(Vec3::ZERO);
        let clip = cam.view_projection() * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
