//! Software rendering onto an RGBA8 frame buffer.

mod animation;

pub use animation::{Animation, AnimationPlayer, AnimationSet};

use anyhow::{anyhow, Result};

use crate::math::{Camera2D, Color, Rect, Vec2};

/// Drawing surface for one frame.
///
/// Wraps either the window's pixel buffer or any caller-owned RGBA8 buffer,
/// which is how tests draw without a window.
pub struct Canvas<'a> {
    pixels: &'a mut [Color],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Result<Self> {
        let pixels: &mut [Color] = bytemuck::try_cast_slice_mut(frame)
            .map_err(|err| anyhow!("frame buffer is not RGBA8: {err:?}"))?;
        if pixels.len() != (width * height) as usize {
            return Err(anyhow!(
                "frame buffer holds {} pixels, expected {}x{}",
                pixels.len(),
                width,
                height
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        (x < self.width && y < self.height).then(|| self.pixels[(y * self.width + x) as usize])
    }

    /// Fill a screen-space rectangle, alpha blending onto what is there.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        if color.a == 0 {
            return;
        }
        let clip = |v: f32, max: u32| (v.round().max(0.0) as u32).min(max);
        let (x0, x1) = (clip(rect.left(), self.width), clip(rect.right(), self.width));
        let (y0, y1) = (clip(rect.top(), self.height), clip(rect.bottom(), self.height));
        if x0 >= x1 {
            return;
        }

        for y in y0..y1 {
            let row = (y * self.width) as usize;
            for px in &mut self.pixels[row + x0 as usize..row + x1 as usize] {
                *px = color.blend_over(*px);
            }
        }
    }

    /// Outline a screen-space rectangle with the given border thickness.
    pub fn stroke_rect(&mut self, rect: Rect, thickness: f32, color: Color) {
        let t = thickness.min(rect.w * 0.5).min(rect.h * 0.5).max(0.0);
        self.fill_rect(Rect::new(rect.x, rect.y, rect.w, t), color);
        self.fill_rect(Rect::new(rect.x, rect.bottom() - t, rect.w, t), color);
        self.fill_rect(Rect::new(rect.x, rect.y + t, t, rect.h - 2.0 * t), color);
        self.fill_rect(
            Rect::new(rect.right() - t, rect.y + t, t, rect.h - 2.0 * t),
            color,
        );
    }

    /// Fill a world-space rectangle as seen through `camera`.
    pub fn fill_world_rect(&mut self, camera: &Camera2D, rect: Rect, color: Color) {
        let screen = Self::project(camera, rect);
        self.fill_rect(screen, color);
    }

    pub fn stroke_world_rect(&mut self, camera: &Camera2D, rect: Rect, thickness: f32, color: Color) {
        let screen = Self::project(camera, rect);
        self.stroke_rect(screen, thickness * camera.zoom, color);
    }

    /// Blend `color` over the whole canvas (camera fades).
    pub fn overlay(&mut self, color: Color) {
        let full = Rect::new(0.0, 0.0, self.width as f32, self.height as f32);
        self.fill_rect(full, color);
    }

    fn project(camera: &Camera2D, rect: Rect) -> Rect {
        let top_left = camera.world_to_screen(rect.position());
        Rect::from_pos_size(top_left, rect.size() * camera.zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        let mut buf = vec![0u8; 4 * 10];
        assert!(Canvas::new(&mut buf, 4, 4).is_err());
    }

    #[test]
    fn fill_rect_is_clipped_to_canvas() {
        let mut buf = vec![0u8; 4 * 4 * 4];
        let mut canvas = Canvas::new(&mut buf, 4, 4).expect("canvas");
        canvas.clear(Color::BLACK);
        canvas.fill_rect(Rect::new(2.0, -3.0, 10.0, 4.0), Color::WHITE);

        assert_eq!(canvas.pixel(3, 0), Some(Color::WHITE));
        assert_eq!(canvas.pixel(1, 0), Some(Color::BLACK));
        assert_eq!(canvas.pixel(2, 1), Some(Color::BLACK));
    }

    #[test]
    fn world_rect_uses_camera_zoom() {
        let mut buf = vec![0u8; 8 * 8 * 4];
        let mut canvas = Canvas::new(&mut buf, 8, 8).expect("canvas");
        let camera = Camera2D::new(Vec2::new(8.0, 8.0)).with_zoom(2.0);

        canvas.fill_world_rect(&camera, Rect::new(1.0, 1.0, 1.0, 1.0), Color::WHITE);
        assert_eq!(canvas.pixel(2, 2), Some(Color::WHITE));
        assert_eq!(canvas.pixel(3, 3), Some(Color::WHITE));
        assert_eq!(canvas.pixel(4, 4), Some(Color::TRANSPARENT));
    }
}
