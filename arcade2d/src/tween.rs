//! Fire-and-forget value animation for presentation-only effects.

use std::collections::VecDeque;
use std::time::Duration;

use crate::math::Color;

/// Easing curve applied to tween progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Ease {
    #[default]
    Linear,
    /// Quadratic ease-out.
    Power1,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power1 => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

/// Interpolates a single `f32` from one value to another.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub duration: Duration,
    pub ease: Ease,
    elapsed: Duration,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: Duration, ease: Ease) -> Self {
        Self {
            from,
            to,
            duration,
            ease,
            elapsed: Duration::ZERO,
        }
    }

    /// Advance the tween, returning the time left over once it completes.
    pub fn update(&mut self, dt: Duration) -> Duration {
        let remaining = self.duration.saturating_sub(self.elapsed);
        self.elapsed = (self.elapsed + dt).min(self.duration);
        dt.saturating_sub(remaining)
    }

    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            1.0
        } else {
            self.elapsed.as_secs_f32() / self.duration.as_secs_f32()
        }
    }

    pub fn value(&self) -> f32 {
        self.from + (self.to - self.from) * self.ease.apply(self.progress())
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// A sequence of tweens on the same value, played back to back.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    steps: VecDeque<Tween>,
    last_value: Option<f32>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(mut self, tween: Tween) -> Self {
        self.steps.push_back(tween);
        self
    }

    pub fn update(&mut self, mut dt: Duration) {
        while let Some(step) = self.steps.front_mut() {
            dt = step.update(dt);
            if !step.is_finished() {
                break;
            }
            self.last_value = Some(step.value());
            self.steps.pop_front();
            if dt.is_zero() {
                break;
            }
        }
    }

    /// Current value, or `None` before the first step has been added.
    pub fn value(&self) -> Option<f32> {
        self.steps.front().map(Tween::value).or(self.last_value)
    }

    pub fn is_finished(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Alternates between two tints at a fixed interval until stopped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blink {
    interval: Duration,
    elapsed: Duration,
    on: Color,
    off: Color,
}

impl Blink {
    pub fn new(interval: Duration, on: Color, off: Color) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
            on,
            off,
        }
    }

    pub fn update(&mut self, dt: Duration) {
        self.elapsed += dt;
    }

    pub fn tint(&self) -> Color {
        if self.interval.is_zero() {
            return self.on;
        }
        let phase = self.elapsed.as_nanos() / self.interval.as_nanos();
        if phase % 2 == 0 {
            self.on
        } else {
            self.off
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn linear_tween_midpoint() {
        let mut tween = Tween::new(1.0, 0.0, ms(200), Ease::Linear);
        tween.update(ms(100));
        assert!((tween.value() - 0.5).abs() < 1e-5);
        assert_eq!(tween.update(ms(150)), ms(50));
        assert!(tween.is_finished());
        assert_eq!(tween.value(), 0.0);
    }

    #[test]
    fn timeline_shrinks_then_grows_back() {
        let mut timeline = Timeline::new()
            .then(Tween::new(0.8, 0.4, ms(200), Ease::Power1))
            .then(Tween::new(0.4, 0.8, ms(200), Ease::Power1));

        timeline.update(ms(200));
        assert!((timeline.value().unwrap_or_default() - 0.4).abs() < 1e-5);

        timeline.update(ms(250));
        assert!(timeline.is_finished());
        assert!((timeline.value().unwrap_or_default() - 0.8).abs() < 1e-5);
    }

    #[test]
    fn blink_alternates() {
        let mut blink = Blink::new(ms(100), Color::WHITE, Color::rgb(255, 0, 0));
        assert_eq!(blink.tint(), Color::WHITE);
        blink.update(ms(120));
        assert_eq!(blink.tint(), Color::rgb(255, 0, 0));
        blink.update(ms(100));
        assert_eq!(blink.tint(), Color::WHITE);
    }
}
