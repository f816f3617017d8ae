//! Simulation parameters.
//!
//! Most knobs are [`NodeParam`]s so that callers can vary the simulation
//! across space, e.g. allow longer edges near the middle of the canvas.

use crate::{node::Node, node::NodeEntry, quadtree::QuadTree};
use std::fmt;

/// A scalar parameter evaluated per node.
pub enum NodeParam {
    Constant(f64),
    Varying(Box<dyn Fn(&Node) -> f64>),
}

impl NodeParam {
    pub fn varying(f: impl Fn(&Node) -> f64 + 'static) -> Self {
        Self::Varying(Box::new(f))
    }

    #[inline]
    pub fn eval(&self, node: &Node) -> f64 {
        match self {
            Self::Constant(v) => *v,
            Self::Varying(f) => f(node),
        }
    }
}

impl From<f64> for NodeParam {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl fmt::Debug for NodeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Self::Varying(_) => f.write_str("Varying(..)"),
        }
    }
}

/// Gate deciding whether growth may insert a midpoint after `node`.
///
/// Custom rules see the index as rebuilt for the current step, including
/// midpoints already inserted earlier in the same growth pass.
pub enum SpawnRule {
    Always,
    Custom(Box<dyn Fn(&Node, &QuadTree<NodeEntry>) -> bool>),
}

impl SpawnRule {
    pub fn custom(f: impl Fn(&Node, &QuadTree<NodeEntry>) -> bool + 'static) -> Self {
        Self::Custom(Box::new(f))
    }

    #[inline]
    pub fn allows(&self, node: &Node, index: &QuadTree<NodeEntry>) -> bool {
        match self {
            Self::Always => true,
            Self::Custom(f) => f(node, index),
        }
    }
}

impl fmt::Debug for SpawnRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug)]
pub struct Config {
    /// Upper bound on the length of a node's accumulated acceleration.
    pub max_force: NodeParam,
    /// Speed a node tries to reach while steering toward its neighbors' midpoint.
    pub max_speed: NodeParam,
    /// Edges longer than this get a midpoint inserted.
    pub max_node_separation: NodeParam,
    pub separation_factor: NodeParam,
    pub cohesion_factor: NodeParam,
    /// Pairs farther apart than this exert no separation force. `None`
    /// keeps every pair returned by the index query.
    pub separation_radius: Option<NodeParam>,
    pub spawn_rule: SpawnRule,
    /// Whether the last node links back to the first.
    pub closed: bool,
    /// Pins both endpoints of an open line.
    pub fixed_edges: bool,
    /// Items per quad before it subdivides.
    pub capacity: usize,
    /// Separation query size as a fraction of the line's bounds.
    pub query_scale: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_force: NodeParam::Constant(0.9),
            max_speed: NodeParam::Constant(1.0),
            max_node_separation: NodeParam::Constant(5.0),
            separation_factor: NodeParam::Constant(1.1),
            cohesion_factor: NodeParam::Constant(1.0),
            separation_radius: None,
            spawn_rule: SpawnRule::Always,
            closed: false,
            fixed_edges: false,
            capacity: 4,
            query_scale: 0.1,
        }
    }
}

impl Config {
    pub fn with_max_force(mut self, v: impl Into<NodeParam>) -> Self {
        self.max_force = v.into();
        self
    }

    pub fn with_max_speed(mut self, v: impl Into<NodeParam>) -> Self {
        self.max_speed = v.into();
        self
    }

    pub fn with_max_node_separation(mut self, v: impl Into<NodeParam>) -> Self {
        self.max_node_separation = v.into();
        self
    }

    pub fn with_separation_factor(mut self, v: impl Into<NodeParam>) -> Self {
        self.separation_factor = v.into();
        self
    }

    pub fn with_cohesion_factor(mut self, v: impl Into<NodeParam>) -> Self {
        self.cohesion_factor = v.into();
        self
    }

    pub fn with_separation_radius(mut self, v: impl Into<NodeParam>) -> Self {
        self.separation_radius = Some(v.into());
        self
    }

    pub fn with_spawn_rule(mut self, rule: SpawnRule) -> Self {
        self.spawn_rule = rule;
        self
    }

    pub fn with_closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self
    }

    pub fn with_fixed_edges(mut self, fixed: bool) -> Self {
        self.fixed_edges = fixed;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_query_scale(mut self, scale: f64) -> Self {
        self.query_scale = scale;
        self
    }

    /// Disables both force categories, leaving only growth.
    pub fn without_forces(self) -> Self {
        self.with_separation_factor(0.0).with_cohesion_factor(0.0)
    }
}
