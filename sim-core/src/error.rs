use crate::types::NodeId;

/// Configuration errors detected when building an index or a line.
///
/// All of these are raised at construction time. Stepping a successfully
/// constructed [`crate::line::DifferentialLine`] never fails.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("quadtree capacity must be at least 1")]
    ZeroCapacity,

    #[error("bounds must be finite with positive size, got x={x} y={y} w={width} h={height}")]
    InvalidBounds {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    #[error("query scale must be finite and positive, got {0}")]
    InvalidQueryScale(f64),

    #[error("`{param}` evaluated to {value} at node {id}; expected a finite, non-negative value")]
    InvalidNodeValue {
        param: &'static str,
        id: NodeId,
        value: f64,
    },

    #[error("initial point {id} has a non-finite position")]
    NonFinitePosition { id: NodeId },
}

pub type Result<T> = std::result::Result<T, Error>;
