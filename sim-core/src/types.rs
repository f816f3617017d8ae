/// Identifier for a node in a [`crate::line::DifferentialLine`].
///
/// This is an index into the line's node arena. Arena slots are never
/// reused or reordered, so an id stays valid for the lifetime of the line
/// even as growth inserts new nodes into the polyline.
pub type NodeId = usize;
