//! Arcade-style physics: axis-aligned boxes, per-axis tile resolution and
//! simple body-vs-body separation.
//!
//! Bodies never rotate and never bounce. Each step a body integrates gravity,
//! moves along X and resolves against the tile layers it collides with, then
//! does the same along Y, then is clamped to the world bounds. Body pairs
//! registered as colliders are separated afterwards; pairs registered as
//! overlaps are only reported.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use crate::math::{Rect, Vec2};
use crate::tilemap::CollisionLayer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(u32);

/// One flag per box edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sides {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Sides {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// The same contact seen from the other body.
    pub fn mirrored(&self) -> Self {
        Self {
            up: self.down,
            down: self.up,
            left: self.right,
            right: self.left,
        }
    }

    fn merge(&mut self, other: Sides) {
        self.up |= other.up;
        self.down |= other.down;
        self.left |= other.left;
        self.right |= other.right;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// An axis-aligned physics box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// Top-left corner of the hit box in world space.
    pub position: Vec2,
    prev_position: Vec2,
    pub size: Vec2,
    offset: Vec2,
    pub velocity: Vec2,
    /// Gravity added on top of the world gravity.
    pub gravity: Vec2,
    pub allow_gravity: bool,
    pub collide_world_bounds: bool,
    /// Immovable bodies are never pushed by other bodies.
    pub immovable: bool,
    /// Disabled bodies are skipped by every step and query.
    pub enabled: bool,
    /// Sides blocked by tiles or world bounds during the last step.
    pub blocked: Sides,
    /// Sides touching another body during the last step.
    pub touching: Sides,
    pub facing: Facing,
}

impl Body {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            prev_position: position,
            size,
            offset: Vec2::ZERO,
            velocity: Vec2::ZERO,
            gravity: Vec2::ZERO,
            allow_gravity: true,
            collide_world_bounds: false,
            immovable: false,
            enabled: true,
            blocked: Sides::none(),
            touching: Sides::none(),
            facing: Facing::Right,
        }
    }

    /// Build a hit box of `size` placed at `offset` inside a sprite frame
    /// whose top-left corner is `sprite_origin`.
    pub fn for_sprite(sprite_origin: Vec2, size: Vec2, offset: Vec2) -> Self {
        let mut body = Self::new(sprite_origin + offset, size);
        body.offset = offset;
        body
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_pos_size(self.position, self.size)
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Move the hit box inside the sprite frame. The sprite itself stays put.
    pub fn set_offset(&mut self, offset: Vec2) {
        let shift = offset - self.offset;
        self.position += shift;
        self.prev_position += shift;
        self.offset = offset;
    }

    /// Top-left corner of the sprite frame this body belongs to.
    pub fn sprite_origin(&self) -> Vec2 {
        self.position - self.offset
    }

    /// Teleport the body so its sprite frame starts at `origin`.
    pub fn reset_to(&mut self, origin: Vec2) {
        self.position = origin + self.offset;
        self.prev_position = self.position;
        self.velocity = Vec2::ZERO;
    }

    /// Movement during the last step.
    pub fn delta(&self) -> Vec2 {
        self.position - self.prev_position
    }

    pub fn on_floor(&self) -> bool {
        self.blocked.down
    }
}

/// What a collider or overlap connects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColliderTarget {
    Body(BodyId),
    Layer(LayerId),
}

impl From<BodyId> for ColliderTarget {
    fn from(id: BodyId) -> Self {
        ColliderTarget::Body(id)
    }
}

impl From<LayerId> for ColliderTarget {
    fn from(id: LayerId) -> Self {
        ColliderTarget::Layer(id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactKind {
    /// The bodies were separated.
    Collide,
    /// The bodies overlap; nothing was moved.
    Overlap,
}

/// A body pair that met during a step, in the order the pair was registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contact {
    pub a: BodyId,
    pub b: BodyId,
    pub kind: ContactKind,
    /// Sides of `a` that touched `b`.
    pub touching: Sides,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Pair {
    a: ColliderTarget,
    b: ColliderTarget,
    kind: ContactKind,
}

impl Pair {
    fn involves(&self, id: BodyId) -> bool {
        self.a == ColliderTarget::Body(id) || self.b == ColliderTarget::Body(id)
    }
}

#[derive(Debug, Default)]
pub struct PhysicsWorld {
    gravity: Vec2,
    bounds: Option<Rect>,
    next_body: u32,
    next_layer: u32,
    bodies: BTreeMap<BodyId, Body>,
    layers: Vec<(LayerId, CollisionLayer)>,
    pairs: Vec<Pair>,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            ..Self::default()
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = Some(bounds);
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Remove every body, layer and collider.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.layers.clear();
        self.pairs.clear();
    }

    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = BodyId(self.next_body);
        self.next_body += 1;
        self.bodies.insert(id, body);
        id
    }

    /// Remove a body along with every collider that mentions it.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        self.pairs.retain(|pair| !pair.involves(id));
        self.bodies.remove(&id)
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(&id)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn add_layer(&mut self, layer: CollisionLayer) -> LayerId {
        let id = LayerId(self.next_layer);
        self.next_layer += 1;
        self.layers.push((id, layer));
        id
    }

    pub fn layer(&self, id: LayerId) -> Option<&CollisionLayer> {
        self.layers.iter().find(|(lid, _)| *lid == id).map(|(_, l)| l)
    }

    /// Make `a` and `b` block each other.
    pub fn add_collider(&mut self, a: impl Into<ColliderTarget>, b: impl Into<ColliderTarget>) {
        self.add_pair(a.into(), b.into(), ContactKind::Collide);
    }

    /// Report `a` and `b` overlapping without separating them.
    pub fn add_overlap(&mut self, a: impl Into<ColliderTarget>, b: impl Into<ColliderTarget>) {
        self.add_pair(a.into(), b.into(), ContactKind::Overlap);
    }

    fn add_pair(&mut self, a: ColliderTarget, b: ColliderTarget, kind: ContactKind) {
        let pair = Pair { a, b, kind };
        if !self.pairs.contains(&pair) {
            self.pairs.push(pair);
        }
    }

    pub fn collider_count(&self) -> usize {
        self.pairs.len()
    }

    /// Advance the simulation by `dt` and report body contacts.
    pub fn step(&mut self, dt: Duration) -> Vec<Contact> {
        let dt = dt.as_secs_f32();
        let gravity = self.gravity;
        let bounds = self.bounds;

        for (&id, body) in self.bodies.iter_mut() {
            body.touching = Sides::none();
            if !body.enabled {
                continue;
            }
            body.blocked = Sides::none();
            body.prev_position = body.position;

            if body.allow_gravity {
                body.velocity += (gravity + body.gravity) * dt;
            }
            if body.velocity.x < 0.0 {
                body.facing = Facing::Left;
            } else if body.velocity.x > 0.0 {
                body.facing = Facing::Right;
            }

            let layers: Vec<&CollisionLayer> = self
                .pairs
                .iter()
                .filter(|p| p.kind == ContactKind::Collide)
                .filter_map(|p| match (p.a, p.b) {
                    (ColliderTarget::Body(b), ColliderTarget::Layer(l))
                    | (ColliderTarget::Layer(l), ColliderTarget::Body(b))
                        if b == id =>
                    {
                        self.layers.iter().find(|(lid, _)| *lid == l).map(|(_, layer)| layer)
                    }
                    _ => None,
                })
                .collect();

            body.position.x += body.velocity.x * dt;
            for layer in &layers {
                resolve_tiles_x(body, layer);
            }
            body.position.y += body.velocity.y * dt;
            for layer in &layers {
                resolve_tiles_y(body, layer);
            }

            if body.collide_world_bounds {
                if let Some(bounds) = bounds {
                    clamp_to_bounds(body, bounds);
                }
            }

        }

        let mut contacts = Vec::new();
        for pair in self.pairs.clone() {
            let (ColliderTarget::Body(a), ColliderTarget::Body(b)) = (pair.a, pair.b) else {
                continue;
            };
            let (Some(&body_a), Some(&body_b)) = (self.bodies.get(&a), self.bodies.get(&b)) else {
                continue;
            };
            if !body_a.enabled || !body_b.enabled || !body_a.bounds().intersects(&body_b.bounds()) {
                continue;
            }

            let touching = match pair.kind {
                ContactKind::Overlap => Sides::none(),
                ContactKind::Collide => {
                    let (moved_a, moved_b, touching) = separate(body_a, body_b);
                    self.bodies.insert(a, moved_a);
                    self.bodies.insert(b, moved_b);
                    touching
                }
            };
            contacts.push(Contact {
                a,
                b,
                kind: pair.kind,
                touching,
            });
        }
        contacts
    }

    /// Solid tiles of `layer` crossed by the segment `from -> to`.
    pub fn tiles_within_line(&self, layer: LayerId, from: Vec2, to: Vec2) -> Option<Vec<(i32, i32)>> {
        self.layer(layer).map(|l| l.tiles_within_line(from, to))
    }

    /// Ids of every enabled body overlapping `rect`.
    pub fn bodies_in_rect(&self, rect: Rect) -> HashSet<BodyId> {
        self.bodies
            .iter()
            .filter(|(_, body)| body.enabled && body.bounds().intersects(&rect))
            .map(|(&id, _)| id)
            .collect()
    }
}

fn resolve_tiles_x(body: &mut Body, layer: &CollisionLayer) {
    let dx = body.velocity.x;
    if dx == 0.0 {
        return;
    }
    for tile in layer.solid_tiles_overlapping(&body.bounds()) {
        if dx > 0.0 {
            body.position.x = tile.left() - body.size.x;
            body.blocked.right = true;
        } else {
            body.position.x = tile.right();
            body.blocked.left = true;
        }
        body.velocity.x = 0.0;
    }
}

fn resolve_tiles_y(body: &mut Body, layer: &CollisionLayer) {
    let dy = body.velocity.y;
    if dy == 0.0 {
        return;
    }
    for tile in layer.solid_tiles_overlapping(&body.bounds()) {
        if dy > 0.0 {
            body.position.y = tile.top() - body.size.y;
            body.blocked.down = true;
        } else {
            body.position.y = tile.bottom();
            body.blocked.up = true;
        }
        body.velocity.y = 0.0;
    }
}

fn clamp_to_bounds(body: &mut Body, bounds: Rect) {
    if body.position.x < bounds.left() {
        body.position.x = bounds.left();
        body.velocity.x = body.velocity.x.max(0.0);
        body.blocked.left = true;
    } else if body.position.x + body.size.x > bounds.right() {
        body.position.x = bounds.right() - body.size.x;
        body.velocity.x = body.velocity.x.min(0.0);
        body.blocked.right = true;
    }
    if body.position.y < bounds.top() {
        body.position.y = bounds.top();
        body.velocity.y = body.velocity.y.max(0.0);
        body.blocked.up = true;
    } else if body.position.y + body.size.y > bounds.bottom() {
        body.position.y = bounds.bottom() - body.size.y;
        body.velocity.y = body.velocity.y.min(0.0);
        body.blocked.down = true;
    }
}

/// Push two overlapping bodies apart along the axis of least penetration.
/// Returns both bodies and the sides of `a` that touched `b`.
fn separate(mut a: Body, mut b: Body) -> (Body, Body, Sides) {
    let ra = a.bounds();
    let rb = b.bounds();
    let overlap_x = ra.right().min(rb.right()) - ra.left().max(rb.left());
    let overlap_y = ra.bottom().min(rb.bottom()) - ra.top().max(rb.top());

    let mut touching = Sides::none();
    let push = if overlap_x < overlap_y {
        if ra.center().x < rb.center().x {
            touching.right = true;
            Vec2::new(-overlap_x, 0.0)
        } else {
            touching.left = true;
            Vec2::new(overlap_x, 0.0)
        }
    } else if ra.center().y < rb.center().y {
        touching.down = true;
        Vec2::new(0.0, -overlap_y)
    } else {
        touching.up = true;
        Vec2::new(0.0, overlap_y)
    };

    // share of the push taken by `a`
    let share_a = match (a.immovable, b.immovable) {
        (true, true) => None,
        (true, false) => Some(0.0),
        (false, true) => Some(1.0),
        (false, false) => Some(0.5),
    };
    if let Some(share_a) = share_a {
        a.position += push * share_a;
        b.position -= push * (1.0 - share_a);
        if !a.immovable {
            stop_towards(&mut a, touching);
        }
        if !b.immovable {
            stop_towards(&mut b, touching.mirrored());
        }
    }

    a.touching.merge(touching);
    b.touching.merge(touching.mirrored());
    (a, b, touching)
}

fn stop_towards(body: &mut Body, sides: Sides) {
    if (sides.right && body.velocity.x > 0.0) || (sides.left && body.velocity.x < 0.0) {
        body.velocity.x = 0.0;
    }
    if (sides.down && body.velocity.y > 0.0) || (sides.up && body.velocity.y < 0.0) {
        body.velocity.y = 0.0;
    }
}
