//! Orthographic 2D camera with a translation-only view

use glam::{Mat4, Vec2};

use crate::math::{ortho, translation};

#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec2,
    viewport: Vec2,
    projection: Mat4,
    projection_dirty: bool,
}

impl Camera {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            viewport: Vec2::new(width, height),
            projection: Mat4::IDENTITY,
            projection_dirty: true,
        }
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
        self.projection_dirty = true;
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Y-up projection centred on the origin; rebuilt only after a viewport change
    pub fn projection_matrix(&mut self) -> Mat4 {
        if self.projection_dirty {
            let half = self.viewport * 0.5;
            self.projection = ortho(-half.x, half.x, -half.y, half.y);
            self.projection_dirty = false;
        }
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        translation(-self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn clip(camera: &mut Camera, x: f32, y: f32) -> Vec2 {
        let p = camera.projection_matrix() * camera.view_matrix() * Vec4::new(x, y, 0.0, 1.0);
        Vec2::new(p.x / p.w, p.y / p.w)
    }

    #[test]
    fn test_projection_is_y_up() {
        let mut camera = Camera::new(360.0, 520.0);
        assert!(clip(&mut camera, 0.0, 0.0).length() < 1e-6);
        assert!((clip(&mut camera, 180.0, 260.0) - Vec2::new(1.0, 1.0)).length() < 1e-6);
        assert!((clip(&mut camera, -180.0, -260.0) - Vec2::new(-1.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_projection_cached_until_viewport_changes() {
        let mut camera = Camera::new(360.0, 520.0);
        let first = camera.projection_matrix();
        assert!(!camera.projection_dirty);
        assert_eq!(camera.projection_matrix(), first);

        camera.set_viewport(720.0, 520.0);
        assert!(camera.projection_dirty);
        let second = camera.projection_matrix();
        assert_ne!(first, second);
        assert!((clip(&mut camera, 360.0, 0.0).x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_view_follows_position() {
        let mut camera = Camera::new(360.0, 520.0);
        camera.position = Vec2::new(100.0, -50.0);
        assert!(clip(&mut camera, 100.0, -50.0).length() < 1e-6);
    }
}
