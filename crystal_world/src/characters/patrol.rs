//! Ground probe used by patrolling enemies to find the end of a platform.

use arcade2d::{Body, Facing, LayerId, PhysicsWorld, Vec2};
use serde::Deserialize;

/// Shape of the probe. Shorter probes or a finer precision stop detecting
/// ledges reliably with 16 px tiles, so these stay tunable per enemy.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProbeConfig {
    pub length: f32,
    /// Horizontal reach per unit of `length`.
    pub steepness: f32,
    /// Horizontal travel needed before the probe is cast again.
    pub precision: f32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            length: 39.0,
            steepness: 1.0,
            precision: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeHit {
    pub from: Vec2,
    pub to: Vec2,
    /// Whether the probe crossed a solid tile.
    pub has_hit: bool,
}

/// Diagonal segment cast from the middle of the leading edge of a body,
/// forward and down. The last result is reused until the body has moved
/// `precision` pixels.
#[derive(Clone, Debug, Default)]
pub struct PatrolProbe {
    config: ProbeConfig,
    travelled: f32,
    last: Option<ProbeHit>,
}

impl PatrolProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            travelled: 0.0,
            last: None,
        }
    }

    pub fn config(&self) -> ProbeConfig {
        self.config
    }

    pub fn last(&self) -> Option<ProbeHit> {
        self.last
    }

    /// Forget the cached result, e.g. after turning around.
    pub fn invalidate(&mut self) {
        self.last = None;
        self.travelled = 0.0;
    }

    /// Probe ahead of `body` against `layer`. `moved` is the horizontal
    /// distance the body covered since the previous cast. Without a layer
    /// there is nothing to fall off, so the probe always reports a hit.
    pub fn cast(
        &mut self,
        physics: &PhysicsWorld,
        layer: Option<LayerId>,
        body: &Body,
        moved: f32,
    ) -> ProbeHit {
        self.travelled += moved;
        if let Some(last) = self.last {
            if self.travelled < self.config.precision {
                return last;
            }
        }

        let (from, to) = self.segment(body);
        let has_hit = match layer {
            Some(layer) => physics
                .tiles_within_line(layer, from, to)
                .map_or(true, |tiles| !tiles.is_empty()),
            None => true,
        };
        let hit = ProbeHit { from, to, has_hit };
        self.last = Some(hit);
        self.travelled = 0.0;
        hit
    }

    fn segment(&self, body: &Body) -> (Vec2, Vec2) {
        let bounds = body.bounds();
        let y = bounds.top() + bounds.h * 0.5;
        let reach = self.config.length * self.config.steepness;
        match body.facing {
            Facing::Right => (
                Vec2::new(bounds.right(), y),
                Vec2::new(bounds.right() + reach, y + self.config.length),
            ),
            Facing::Left => (
                Vec2::new(bounds.left(), y),
                Vec2::new(bounds.left() - reach, y + self.config.length),
            ),
        }
    }
}
