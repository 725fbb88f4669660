use std::collections::HashMap;
use std::time::Duration;

/// A run of spritesheet frames played at a fixed rate.
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    pub first_frame: u32,
    pub last_frame: u32,
    pub frame_rate: f32,
    /// How many extra times the run plays after the first pass. `-1` loops forever.
    pub repeat: i32,
}

impl Animation {
    pub fn new(first_frame: u32, last_frame: u32, frame_rate: f32, repeat: i32) -> Self {
        Self {
            first_frame,
            last_frame: last_frame.max(first_frame),
            frame_rate,
            repeat,
        }
    }

    /// Looping animation over `first..=last`.
    pub fn looping(first_frame: u32, last_frame: u32, frame_rate: f32) -> Self {
        Self::new(first_frame, last_frame, frame_rate, -1)
    }

    pub fn frame_count(&self) -> u32 {
        self.last_frame - self.first_frame + 1
    }

    fn frame_duration(&self) -> Duration {
        if self.frame_rate > 0.0 {
            Duration::from_secs_f32(1.0 / self.frame_rate)
        } else {
            Duration::MAX
        }
    }
}

/// Named animations shared by every sprite of a kind.
#[derive(Clone, Debug, Default)]
pub struct AnimationSet {
    animations: HashMap<String, Animation>,
}

impl AnimationSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, animation: Animation) -> Self {
        self.insert(key, animation);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, animation: Animation) {
        self.animations.insert(key.into(), animation);
    }

    pub fn get(&self, key: &str) -> Option<&Animation> {
        self.animations.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.animations.contains_key(key)
    }
}

/// Plays animations from an [`AnimationSet`] on one sprite.
#[derive(Clone, Debug)]
pub struct AnimationPlayer {
    set: AnimationSet,
    current: Option<String>,
    frame_index: u32,
    timer: Duration,
    repeats_left: i32,
    playing: bool,
}

impl AnimationPlayer {
    pub fn new(set: AnimationSet) -> Self {
        Self {
            set,
            current: None,
            frame_index: 0,
            timer: Duration::ZERO,
            repeats_left: 0,
            playing: false,
        }
    }

    /// Start `key` from its first frame.
    ///
    /// With `ignore_if_playing`, asking for the animation that is already
    /// running is a no-op; a finished animation is always restarted.
    /// Returns whether playback (re)started.
    pub fn play(&mut self, key: &str, ignore_if_playing: bool) -> bool {
        if ignore_if_playing && self.playing && self.current.as_deref() == Some(key) {
            return false;
        }
        let Some(animation) = self.set.get(key) else {
            log::warn!("animation `{key}` is not defined");
            return false;
        };
        self.repeats_left = animation.repeat;
        self.current = Some(key.to_string());
        self.frame_index = 0;
        self.timer = Duration::ZERO;
        self.playing = true;
        true
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn update(&mut self, dt: Duration) {
        if !self.playing {
            return;
        }
        let Some(animation) = self.current.as_deref().and_then(|key| self.set.get(key)) else {
            return;
        };
        let frame_duration = animation.frame_duration();
        let frame_count = animation.frame_count();

        self.timer += dt;
        while self.timer >= frame_duration {
            self.timer -= frame_duration;
            self.frame_index += 1;
            if self.frame_index < frame_count {
                continue;
            }
            if self.repeats_left == 0 {
                self.frame_index = frame_count - 1;
                self.playing = false;
                break;
            }
            if self.repeats_left > 0 {
                self.repeats_left -= 1;
            }
            self.frame_index = 0;
        }
    }

    pub fn current_key(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Spritesheet frame currently shown.
    pub fn current_frame(&self) -> Option<u32> {
        let animation = self.set.get(self.current.as_deref()?)?;
        Some(animation.first_frame + self.frame_index)
    }
}
