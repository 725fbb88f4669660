//! Shared "can be wired into the physics world" capability.

use arcade2d::{BodyId, ColliderTarget, PhysicsWorld};

/// Anything that owns one or more physics bodies.
pub trait Collidable {
    fn bodies(&self) -> Vec<BodyId>;

    /// Make every body of `self` collide with `target`. Chainable.
    fn add_collider<T>(&self, physics: &mut PhysicsWorld, target: T) -> &Self
    where
        T: Into<ColliderTarget> + Copy,
        Self: Sized,
    {
        for body in self.bodies() {
            physics.add_collider(body, target);
        }
        self
    }

    /// Report overlaps between every body of `self` and `target`. Chainable.
    fn add_overlap<T>(&self, physics: &mut PhysicsWorld, target: T) -> &Self
    where
        T: Into<ColliderTarget> + Copy,
        Self: Sized,
    {
        for body in self.bodies() {
            physics.add_overlap(body, target);
        }
        self
    }
}
