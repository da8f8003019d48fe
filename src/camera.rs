use glam::{Mat4, Quat, Vec3, Vec4};

/// Correction from OpenGL-style NDC to Vulkan NDC: Y points down and the
/// depth range is [0, 1] instead of [-1, 1].
const VULKAN_NDC: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, -1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 1.0),
);

/// Builds the projection matrix used by the main pass.
///
/// `horizontal_fov` is in degrees; the vertical field of view is derived from
/// the aspect ratio. The NDC correction is folded in so clip-space output is
/// already in Vulkan conventions.
pub fn projection_matrix(horizontal_fov: f32, aspect_ratio: f32, near: f32, far: f32) -> Mat4 {
    let vertical_fov = (horizontal_fov / aspect_ratio).to_radians();
    VULKAN_NDC * Mat4::perspective_rh_gl(vertical_fov, aspect_ratio, near, far)
}

/// Free-look camera with quaternion orientation.
///
/// Yaw rotates globally about the world up axis, pitch rotates locally and is
/// clamped so the view direction never reaches straight up or down.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    initial_front: Vec3,
    rotation: Quat,
    front: Vec3,
    right: Vec3,
    up: Vec3,
}

fn world_up() -> Vec3 {
    Vec3::Y
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        let mut camera = Self {
            position,
            initial_front: Vec3::NEG_Z,
            rotation: Quat::IDENTITY,
            front: Vec3::ZERO,
            right: Vec3::ZERO,
            up: Vec3::ZERO,
        };
        camera.update();
        camera
    }

    /// Recomputes the basis vectors from the current rotation.
    fn update(&mut self) {
        self.front = (self.rotation * self.initial_front).normalize();
        self.right = self.front.cross(world_up()).normalize_or_zero();
        self.up = self.right.cross(self.front).normalize_or_zero();
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn translate(&mut self, translation: Vec3) {
        self.position += translation;
    }

    /// Global yaw about the world up axis, in degrees.
    pub fn yaw(&mut self, angle: f32) {
        let yaw = Quat::from_axis_angle(world_up(), angle.to_radians());
        self.rotation = yaw * self.rotation;
        self.update();
    }

    /// Local pitch in degrees, ignored when it would push the view direction
    /// past straight up or straight down.
    pub fn pitch(&mut self, angle: f32) {
        let limit = angle.abs().to_radians();
        if angle > 0.0 && self.front.angle_between(world_up()) <= limit {
            return;
        }
        if angle < 0.0 && self.front.angle_between(-world_up()) <= limit {
            return;
        }
        let pitch = Quat::from_axis_angle(Vec3::X, angle.to_radians());
        self.rotation *= pitch;
        self.update();
    }

    /// Applies an absolute orientation from euler angles in degrees.
    pub fn set_euler_rotation(&mut self, rotation: Vec3) {
        self.rotation = Quat::from_euler(
            glam::EulerRot::ZYX,
            rotation.z.to_radians(),
            rotation.y.to_radians(),
            rotation.x.to_radians(),
        );
        self.update();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.front, self.up)
    }
}
