//! Camera follow with dead-zone support.

use std::time::Duration;

use crate::math::{Camera2D, Vec2};

/// How the camera chases its target.
#[derive(Clone, Copy, Debug)]
pub struct CameraFollow {
    /// Box around the view center, in world units, inside which the target
    /// can move without dragging the camera.
    pub dead_zone: Vec2,
    /// Cap on camera travel, world units per second.
    pub max_speed: f32,
    /// Lerp toward the target instead of snapping.
    pub smooth: bool,
    /// Fraction of the remaining distance covered per update (1.0 = instant).
    pub smooth_factor: f32,
}

impl CameraFollow {
    pub fn new() -> Self {
        Self {
            dead_zone: Vec2::ZERO,
            max_speed: f32::INFINITY,
            smooth: false,
            smooth_factor: 1.0,
        }
    }

    /// Size of the dead zone.
    #[must_use]
    pub fn with_dead_zone(mut self, width: f32, height: f32) -> Self {
        self.dead_zone = Vec2::new(width.max(0.0), height.max(0.0));
        self
    }

    /// Lerp with `factor` per update.
    #[must_use]
    pub fn with_smoothing(mut self, factor: f32) -> Self {
        self.smooth = true;
        self.smooth_factor = factor.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_max_speed(mut self, speed: f32) -> Self {
        self.max_speed = speed;
        self
    }
}

impl Default for CameraFollow {
    fn default() -> Self {
        Self::new()
    }
}

/// Move `camera` toward `target` and advance its effects.
pub fn update_camera_follow(camera: &mut Camera2D, follow: &CameraFollow, target: Vec2, dt: Duration) {
    let half_view = camera.view_size() * 0.5;
    let center = camera.position + half_view;
    let offset = target - center;
    let half_dead_zone = follow.dead_zone * 0.5;

    let mut desired = center;
    if offset.x.abs() > half_dead_zone.x {
        desired.x = target.x - offset.x.signum() * half_dead_zone.x;
    }
    if offset.y.abs() > half_dead_zone.y {
        desired.y = target.y - offset.y.signum() * half_dead_zone.y;
    }

    if desired != center {
        let next = if follow.smooth {
            let diff = desired - center;
            let step = diff * follow.smooth_factor;
            let max_move = follow.max_speed * dt.as_secs_f32();
            if follow.max_speed.is_finite() && step.length() > max_move {
                center + diff.normalize_or_zero() * max_move
            } else {
                center + step
            }
        } else {
            desired
        };
        camera.center_on(next);
    }

    camera.update(dt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Rect;

    #[test]
    fn target_inside_dead_zone_keeps_camera_still() {
        let mut camera = Camera2D::new(Vec2::new(200.0, 100.0));
        camera.center_on(Vec2::new(100.0, 50.0));
        let follow = CameraFollow::new().with_dead_zone(40.0, 40.0);

        update_camera_follow(&mut camera, &follow, Vec2::new(115.0, 60.0), Duration::from_millis(16));
        assert_eq!(camera.position, Vec2::ZERO);

        update_camera_follow(&mut camera, &follow, Vec2::new(150.0, 50.0), Duration::from_millis(16));
        assert_eq!(camera.position, Vec2::new(30.0, 0.0));
    }

    #[test]
    fn follow_respects_bounds() {
        let mut camera = Camera2D::new(Vec2::new(200.0, 100.0));
        camera.set_bounds(Rect::new(0.0, 0.0, 400.0, 100.0));
        let follow = CameraFollow::new();

        update_camera_follow(&mut camera, &follow, Vec2::new(390.0, 80.0), Duration::from_millis(16));
        assert_eq!(camera.position, Vec2::new(200.0, 0.0));
    }
}
