use std::time::Duration;

use arcade2d::{Canvas, Color, Ease, Rect, Timeline, Tween, Vec2};

const HEART_SIZE: f32 = 16.0;
const HEART_SCALE: f32 = 0.8;
const UI_SCALE: f32 = 2.0;
const FILL_FADE: Duration = Duration::from_millis(200);
const OUTLINE_PULSE: Duration = Duration::from_millis(200);

const FILL_COLOR: Color = Color::rgb(0xe0, 0x3a, 0x5a);
const OUTLINE_COLOR: Color = Color::rgb(0xf4, 0xe9, 0xd8);
const PORTRAIT_COLOR: Color = Color::rgb(0x6c, 0x8e, 0xbf);

#[derive(Clone, Debug)]
enum Fill {
    Full,
    Draining { alpha: Tween, scale: Tween },
}

#[derive(Clone, Debug)]
struct HeartSlot {
    fill: Fill,
    outline: Timeline,
}

impl HeartSlot {
    fn fill_alpha(&self) -> f32 {
        match &self.fill {
            Fill::Full => 1.0,
            Fill::Draining { alpha, .. } => alpha.value(),
        }
    }

    fn fill_scale(&self) -> f32 {
        match &self.fill {
            Fill::Full => HEART_SCALE,
            Fill::Draining { scale, .. } => scale.value(),
        }
    }

    fn outline_scale(&self) -> f32 {
        self.outline.value().unwrap_or(HEART_SCALE)
    }
}

/// Heart display in the top-left corner of the screen.
///
/// Mirrors the player's health for display only; the player's own health
/// counter decides life and death.
#[derive(Clone, Debug)]
pub struct HealthUi {
    origin: Vec2,
    hearts: u32,
    slots: Vec<HeartSlot>,
}

impl HealthUi {
    pub fn new(total_hearts: u32, origin: Vec2) -> Self {
        let slot = HeartSlot {
            fill: Fill::Full,
            outline: Timeline::new(),
        };
        Self {
            origin,
            hearts: total_hearts,
            slots: vec![slot; total_hearts as usize],
        }
    }

    pub fn hearts(&self) -> u32 {
        self.hearts
    }

    pub fn total_hearts(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Remove `amount` hearts. Each lost heart fades and shrinks away while
    /// its outline pulses. Never goes below zero.
    pub fn decrease_hearts(&mut self, amount: u32) {
        for _ in 0..amount {
            if self.hearts == 0 {
                break;
            }
            self.hearts -= 1;
            let slot = &mut self.slots[self.hearts as usize];
            slot.fill = Fill::Draining {
                alpha: Tween::new(1.0, 0.0, FILL_FADE, Ease::Linear),
                scale: Tween::new(HEART_SCALE, 0.0, FILL_FADE, Ease::Linear),
            };
            slot.outline = Timeline::new()
                .then(Tween::new(HEART_SCALE, HEART_SCALE * 0.5, OUTLINE_PULSE, Ease::Power1))
                .then(Tween::new(HEART_SCALE * 0.5, HEART_SCALE, OUTLINE_PULSE, Ease::Power1));
        }
    }

    pub fn update(&mut self, dt: Duration) {
        for slot in &mut self.slots {
            if let Fill::Draining { alpha, scale } = &mut slot.fill {
                alpha.update(dt);
                scale.update(dt);
            }
            slot.outline.update(dt);
        }
    }

    /// Opacity of the filled heart in `slot`.
    pub fn fill_alpha(&self, slot: usize) -> Option<f32> {
        self.slots.get(slot).map(HeartSlot::fill_alpha)
    }

    pub fn outline_scale(&self, slot: usize) -> Option<f32> {
        self.slots.get(slot).map(HeartSlot::outline_scale)
    }

    /// Whether any heart is still animating.
    pub fn is_animating(&self) -> bool {
        self.slots.iter().any(|slot| {
            !slot.outline.is_finished()
                || matches!(&slot.fill, Fill::Draining { alpha, .. } if !alpha.is_finished())
        })
    }

    pub fn draw(&self, canvas: &mut Canvas<'_>) {
        let portrait = HEART_SIZE * UI_SCALE;
        canvas.fill_rect(
            Rect::from_pos_size(self.origin, Vec2::splat(portrait)),
            PORTRAIT_COLOR,
        );
        canvas.stroke_rect(
            Rect::from_pos_size(self.origin, Vec2::splat(portrait)),
            2.0,
            OUTLINE_COLOR,
        );

        let spacing = HEART_SCALE * 30.0 * UI_SCALE;
        let first_center = self.origin + Vec2::new(portrait + spacing * 0.75, portrait * 0.5);
        for (i, slot) in self.slots.iter().enumerate() {
            let center = first_center + Vec2::new(i as f32 * spacing, 0.0);
            let outline = heart_rect(center, slot.outline_scale());
            canvas.stroke_rect(outline, 2.0, OUTLINE_COLOR);

            let alpha = slot.fill_alpha();
            if alpha > 0.0 {
                canvas.fill_rect(heart_rect(center, slot.fill_scale()), FILL_COLOR.with_alpha(alpha));
            }
        }
    }
}

fn heart_rect(center: Vec2, scale: f32) -> Rect {
    let size = Vec2::splat(HEART_SIZE * UI_SCALE * scale);
    Rect::from_pos_size(center - size * 0.5, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_heart_fades_and_outline_pulses() {
        let mut ui = HealthUi::new(3, Vec2::ZERO);
        ui.decrease_hearts(1);
        assert_eq!(ui.hearts(), 2);
        assert_eq!(ui.fill_alpha(0), Some(1.0));

        ui.update(Duration::from_millis(200));
        assert_eq!(ui.fill_alpha(2), Some(0.0));
        let shrunk = ui.outline_scale(2).unwrap_or_default();
        assert!((shrunk - HEART_SCALE * 0.5).abs() < 1e-4);

        ui.update(Duration::from_millis(200));
        let regrown = ui.outline_scale(2).unwrap_or_default();
        assert!((regrown - HEART_SCALE).abs() < 1e-4);
        assert!(!ui.is_animating());
    }

    #[test]
    fn never_goes_negative() {
        let mut ui = HealthUi::new(3, Vec2::ZERO);
        for _ in 0..3 {
            ui.decrease_hearts(1);
        }
        assert_eq!(ui.hearts(), 0);
        ui.decrease_hearts(1);
        ui.decrease_hearts(5);
        assert_eq!(ui.hearts(), 0);
        assert_eq!(ui.total_hearts(), 3);
    }

    #[test]
    fn draws_inside_the_canvas() {
        let mut buf = vec![0u8; 320 * 80 * 4];
        let mut canvas = Canvas::new(&mut buf, 320, 80).expect("canvas");
        let ui = HealthUi::new(3, Vec2::new(8.0, 8.0));
        ui.draw(&mut canvas);
        assert_eq!(canvas.pixel(9, 9), Some(OUTLINE_COLOR));
    }
}
