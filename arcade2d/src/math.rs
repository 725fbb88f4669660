use std::time::Duration;

use bytemuck::{Pod, Zeroable};

/// 2D vector type used throughout arcade2d.
pub use glam::Vec2;

/// Axis-aligned rectangle described by its top-left corner and size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_pos_size(position: Vec2, size: Vec2) -> Self {
        Self::new(position.x, position.y, size.x, size.y)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Returns true if the two rectangles overlap with a non-zero area.
    ///
    /// Rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    pub fn translated(&self, delta: Vec2) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y, self.w, self.h)
    }

    /// Returns true if the segment `a -> b` touches this rectangle (edges included).
    ///
    /// Liang-Barsky clipping of the segment against the rectangle.
    pub fn intersects_segment(&self, a: Vec2, b: Vec2) -> bool {
        let d = b - a;
        let mut t0 = 0.0_f32;
        let mut t1 = 1.0_f32;

        let checks = [
            (-d.x, a.x - self.left()),
            (d.x, self.right() - a.x),
            (-d.y, a.y - self.top()),
            (d.y, self.bottom() - a.y),
        ];

        for (p, q) in checks {
            if p == 0.0 {
                if q < 0.0 {
                    return false;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return false;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return false;
                }
                t1 = t1.min(r);
            }
        }

        t0 <= t1
    }
}

/// 8-bit RGBA color, laid out exactly like a pixel in the frame buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `0xRRGGBB` into an opaque color.
    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Scale the alpha channel by `alpha` in `[0, 1]`.
    pub fn with_alpha(self, alpha: f32) -> Self {
        let a = (self.a as f32 * alpha.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Multiplicative tint, the same way a sprite tint is applied to texels.
    pub fn tinted(self, tint: Color) -> Self {
        let mul = |c: u8, t: u8| ((c as u16 * t as u16) / 255) as u8;
        Self {
            r: mul(self.r, tint.r),
            g: mul(self.g, tint.g),
            b: mul(self.b, tint.b),
            a: mul(self.a, tint.a),
        }
    }

    /// Source-over blend of `self` onto `dst`.
    pub fn blend_over(self, dst: Color) -> Color {
        match self.a {
            255 => self,
            0 => dst,
            a => {
                let a = a as u16;
                let inv = 255 - a;
                let mix = |s: u8, d: u8| ((s as u16 * a + d as u16 * inv) / 255) as u8;
                Color {
                    r: mix(self.r, dst.r),
                    g: mix(self.g, dst.g),
                    b: mix(self.b, dst.b),
                    a: 255,
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Shake {
    remaining: Duration,
    intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Fade {
    duration: Duration,
    elapsed: Duration,
    color: Color,
}

/// Camera representing a simple 2D view.
///
/// `position` is the world coordinate shown at the top-left of the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
    /// Viewport size in screen pixels.
    pub viewport: Vec2,
    bounds: Option<Rect>,
    shake: Option<Shake>,
    shake_offset: Vec2,
    fade: Option<Fade>,
}

impl Camera2D {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport,
            bounds: None,
            shake: None,
            shake_offset: Vec2::ZERO,
            fade: None,
        }
    }

    #[must_use]
    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.set_zoom(zoom);
        self
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
        self.clamp_to_bounds();
    }

    /// Confine the camera so it never shows anything outside `bounds`.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = Some(bounds);
        self.clamp_to_bounds();
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Size of the visible world area in world units.
    pub fn view_size(&self) -> Vec2 {
        self.viewport / self.zoom
    }

    /// The world rectangle currently visible (shake not included).
    pub fn world_view(&self) -> Rect {
        Rect::from_pos_size(self.position, self.view_size())
    }

    /// Center the view on `target`, respecting bounds.
    pub fn center_on(&mut self, target: Vec2) {
        self.position = target - self.view_size() * 0.5;
        self.clamp_to_bounds();
    }

    pub fn world_to_screen(&self, world_pos: Vec2) -> Vec2 {
        (world_pos - self.position - self.shake_offset) * self.zoom
    }

    pub fn screen_to_world(&self, screen_pos: Vec2) -> Vec2 {
        screen_pos / self.zoom + self.position + self.shake_offset
    }

    /// Start shaking the camera. `intensity` is a fraction of the view size.
    pub fn shake(&mut self, duration: Duration, intensity: f32) {
        self.shake = Some(Shake {
            remaining: duration,
            intensity: intensity.max(0.0),
        });
    }

    pub fn is_shaking(&self) -> bool {
        self.shake.is_some()
    }

    /// Fade the whole view out to `color` over `duration`.
    pub fn fade_out(&mut self, duration: Duration, color: Color) {
        self.fade = Some(Fade {
            duration,
            elapsed: Duration::ZERO,
            color,
        });
    }

    /// Current fade overlay color, if a fade is in progress or finished.
    pub fn fade_overlay(&self) -> Option<Color> {
        self.fade.map(|fade| {
            let progress = if fade.duration.is_zero() {
                1.0
            } else {
                (fade.elapsed.as_secs_f32() / fade.duration.as_secs_f32()).min(1.0)
            };
            fade.color.with_alpha(progress)
        })
    }

    pub fn fade_complete(&self) -> bool {
        self.fade.is_some_and(|fade| fade.elapsed >= fade.duration)
    }

    /// Clear fade and shake, e.g. after a scene reset.
    pub fn reset_effects(&mut self) {
        self.fade = None;
        self.shake = None;
        self.shake_offset = Vec2::ZERO;
    }

    /// Advance shake and fade effects.
    pub fn update(&mut self, dt: Duration) {
        if let Some(shake) = self.shake.as_mut() {
            if shake.remaining <= dt {
                self.shake = None;
                self.shake_offset = Vec2::ZERO;
            } else {
                shake.remaining -= dt;
                let view = self.viewport / self.zoom;
                let jitter = |extent: f32| (fastrand::f32() * 2.0 - 1.0) * extent * shake.intensity;
                self.shake_offset = Vec2::new(jitter(view.x), jitter(view.y));
            }
        }

        if let Some(fade) = self.fade.as_mut() {
            fade.elapsed = (fade.elapsed + dt).min(fade.duration);
        }
    }

    fn clamp_to_bounds(&mut self) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let view = self.view_size();
        self.position.x = if view.x >= bounds.w {
            bounds.x
        } else {
            self.position.x.clamp(bounds.left(), bounds.right() - view.x)
        };
        self.position.y = if view.y >= bounds.h {
            bounds.y
        } else {
            self.position.y.clamp(bounds.top(), bounds.bottom() - view.y)
        };
    }
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::new(Vec2::new(1280.0, 720.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 16.0, 16.0);
        let b = Rect::new(16.0, 0.0, 16.0, 16.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&b.translated(Vec2::new(-0.5, 0.0))));
    }

    #[test]
    fn diagonal_segment_hits_tile_below_and_ahead() {
        let tile = Rect::new(32.0, 48.0, 16.0, 16.0);
        assert!(tile.intersects_segment(Vec2::new(10.0, 20.0), Vec2::new(49.0, 59.0)));
        assert!(!tile.intersects_segment(Vec2::new(10.0, 20.0), Vec2::new(20.0, 30.0)));
    }

    #[test]
    fn vertical_segment_outside_rect_misses() {
        let tile = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!tile.intersects_segment(Vec2::new(12.0, -5.0), Vec2::new(12.0, 15.0)));
        assert!(tile.intersects_segment(Vec2::new(5.0, -5.0), Vec2::new(5.0, 15.0)));
    }

    #[test]
    fn camera_stays_inside_bounds() {
        let mut camera = Camera2D::new(Vec2::new(960.0, 540.0)).with_zoom(2.0);
        camera.set_bounds(Rect::new(0.0, 0.0, 1600.0, 640.0));

        camera.center_on(Vec2::new(10.0, 10.0));
        assert_eq!(camera.position, Vec2::ZERO);

        camera.center_on(Vec2::new(1590.0, 630.0));
        assert_eq!(camera.position, Vec2::new(1600.0 - 480.0, 640.0 - 270.0));
    }

    #[test]
    fn fade_reaches_full_alpha() {
        let mut camera = Camera2D::default();
        camera.fade_out(Duration::from_millis(400), Color::BLACK);
        assert_eq!(camera.fade_overlay().map(|c| c.a), Some(0));

        camera.update(Duration::from_millis(200));
        assert!(!camera.fade_complete());

        camera.update(Duration::from_millis(300));
        assert!(camera.fade_complete());
        assert_eq!(camera.fade_overlay().map(|c| c.a), Some(255));
    }

    #[test]
    fn shake_expires() {
        let mut camera = Camera2D::default();
        camera.shake(Duration::from_millis(100), 0.01);
        camera.update(Duration::from_millis(50));
        assert!(camera.is_shaking());
        camera.update(Duration::from_millis(60));
        assert!(!camera.is_shaking());
        assert_eq!(camera.world_to_screen(Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn blend_half_alpha() {
        let src = Color::rgba(255, 0, 0, 128);
        let out = src.blend_over(Color::BLACK);
        assert_eq!(out.a, 255);
        assert!(out.r > 120 && out.r < 135);
        assert_eq!(out.g, 0);
    }
}
