use crate::{quadtree::Positioned, types::NodeId};
use glam::DVec2;

/// A moving particle on the growing line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub position: DVec2,
    pub velocity: DVec2,
    /// Force accumulated during the current step; cleared by [`Node::update`].
    pub acceleration: DVec2,
    /// Collision radius. Zero means a point body.
    pub radius: f64,
}

/// What the simulation stores in its spatial index: a node id plus the
/// position the node had when the index was built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeEntry {
    pub id: NodeId,
    pub position: DVec2,
}

impl Positioned for NodeEntry {
    #[inline]
    fn position(&self) -> DVec2 {
        self.position
    }
}

impl Node {
    pub fn new(position: DVec2) -> Self {
        Self::with_radius(position, 0.0)
    }

    pub fn with_radius(position: DVec2, radius: f64) -> Self {
        Self {
            position,
            velocity: DVec2::ZERO,
            acceleration: DVec2::ZERO,
            radius,
        }
    }

    #[inline]
    pub fn apply_force(&mut self, force: DVec2) {
        self.acceleration += force;
    }

    /// Rescales the accumulated acceleration down to `max` if it is longer.
    #[inline]
    pub fn clamp_acceleration(&mut self, max: f64) {
        if self.acceleration.length_squared() > max * max {
            self.acceleration = self.acceleration.normalize_or_zero() * max;
        }
    }

    /// Integrates one step and clears the accumulated acceleration.
    pub fn update(&mut self) {
        self.velocity += self.acceleration;
        self.position += self.velocity;
        self.acceleration = DVec2::ZERO;
    }

    pub fn stop(&mut self) {
        self.velocity = DVec2::ZERO;
        self.acceleration = DVec2::ZERO;
    }

    pub fn intersects(&self, other: &Node) -> bool {
        self.position.distance(other.position) < self.radius + other.radius
    }
}
