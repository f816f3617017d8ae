//! Per-step simulation phases for a differential line.
//!
//! A step runs, in order:
//! 1. [`separation_phase`]: nearby nodes (found through the spatial index)
//!    push each other apart.
//! 2. [`cohesion_phase`]: each node steers toward the midpoint of its two
//!    polyline neighbors.
//! 3. [`integrate_phase`]: velocities and positions are updated and the
//!    accumulated acceleration is cleared.
//! 4. [`rebuild_index`]: a fresh index is built from the new positions.
//! 5. [`growth_phase`]: overstretched edges get a midpoint node.
//!
//! Nodes live in an append-only arena (`&[Node]` indexed by [`NodeId`]) and
//! the polyline is given by a separate `order` slice of ids.

use crate::{
    config::Config,
    geom::Rect,
    node::{Node, NodeEntry},
    quadtree::QuadTree,
    types::NodeId,
};
use glam::DVec2;
use tracing::trace;

/// Repulsive force that `b` exerts on a node at `a`.
///
/// Points along `a - b` with magnitude `1 / |a - b|²`. Coincident points,
/// and points so close that the magnitude overflows, exert no force.
/// Swapping the arguments negates the result exactly.
#[inline]
pub fn separation_force(a: DVec2, b: DVec2) -> DVec2 {
    let diff = a - b;
    let d2 = diff.length_squared();
    if !(d2 > 0.0 && d2.is_finite()) {
        return DVec2::ZERO;
    }
    let force = diff / (d2.sqrt() * d2);
    if force.is_finite() { force } else { DVec2::ZERO }
}

/// Returns the ids pinned in place by [`Config::fixed_edges`], if any.
///
/// Only open lines pin their endpoints.
pub fn pinned_ids(order: &[NodeId], cfg: &Config) -> Option<(NodeId, NodeId)> {
    if !cfg.fixed_edges || cfg.closed {
        return None;
    }
    Some((*order.first()?, *order.last()?))
}

#[inline]
fn is_pinned(pins: Option<(NodeId, NodeId)>, id: NodeId) -> bool {
    pins.is_some_and(|(first, last)| id == first || id == last)
}

/// Midpoint of the polyline neighbors of `order[i]`.
///
/// On a closed line the first and last nodes are neighbors. On an open line
/// the endpoints have a single neighbor, whose position is returned as is.
///
/// ### Returns
/// `None` when the line has fewer than two nodes.
pub fn neighbor_midpoint(
    nodes: &[Node],
    order: &[NodeId],
    i: usize,
    closed: bool,
) -> Option<DVec2> {
    let n = order.len();
    if n < 2 || i >= n {
        return None;
    }

    let prev = if i > 0 {
        Some(order[i - 1])
    } else if closed {
        Some(order[n - 1])
    } else {
        None
    };
    let next = if i + 1 < n {
        Some(order[i + 1])
    } else if closed {
        Some(order[0])
    } else {
        None
    };

    match (prev, next) {
        (Some(p), Some(q)) => Some((nodes[p].position + nodes[q].position) * 0.5),
        (Some(only), None) | (None, Some(only)) => Some(nodes[only].position),
        (None, None) => None,
    }
}

/// Accumulates pairwise separation forces.
///
/// For every free node, queries `index` with a window of `bounds` scaled by
/// [`Config::query_scale`] centered on the node. Each other node returned
/// contributes [`separation_force`], applied to both nodes in opposite
/// directions and scaled by each node's own
/// [`Config::separation_factor`]. Once its neighbors are processed, the
/// node's acceleration is clamped to [`Config::max_force`].
///
/// Pinned endpoints neither query nor receive reaction forces.
///
/// ### Parameters
/// - `nodes` - Node arena; accelerations are updated in place.
/// - `order` - Polyline order of node ids.
/// - `index` - Spatial index holding the current node positions.
/// - `bounds` - World bounds the query window is derived from.
/// - `cfg` - Simulation parameters.
///
/// ### Returns
/// The number of interacting pairs visited, counting each direction.
pub fn separation_phase(
    nodes: &mut [Node],
    order: &[NodeId],
    index: &QuadTree<NodeEntry>,
    bounds: Rect,
    cfg: &Config,
) -> usize {
    let pins = pinned_ids(order, cfg);
    let window = bounds.scaled(cfg.query_scale);
    let mut near = Vec::new();
    let mut pairs = 0;

    for &id in order {
        if is_pinned(pins, id) {
            continue;
        }

        let pos = nodes[id].position;
        near.clear();
        index.query_into(&window.centered_at(pos), &mut near);

        let cutoff = cfg.separation_radius.as_ref().map(|r| r.eval(&nodes[id]));

        for entry in &near {
            let other = entry.id;
            if other == id {
                continue;
            }
            let other_pos = nodes[other].position;
            if let Some(r) = cutoff
                && pos.distance_squared(other_pos) > r * r
            {
                continue;
            }

            let force = separation_force(pos, other_pos);
            if force == DVec2::ZERO {
                continue;
            }

            let own = cfg.separation_factor.eval(&nodes[id]);
            nodes[id].apply_force(force * own);

            if !is_pinned(pins, other) {
                let theirs = cfg.separation_factor.eval(&nodes[other]);
                nodes[other].apply_force(-force * theirs);
            }
            pairs += 1;
        }

        let max = cfg.max_force.eval(&nodes[id]);
        nodes[id].clamp_acceleration(max);
    }

    pairs
}

/// Steers every free node toward the midpoint of its neighbors.
///
/// The desired velocity is the unit direction to the midpoint scaled by
/// [`Config::max_speed`]; the steering force is the desired velocity minus
/// the current velocity, scaled by [`Config::cohesion_factor`]. The total
/// acceleration is then clamped to [`Config::max_force`] again, so no node
/// changes velocity by more than its max force in one step.
pub fn cohesion_phase(nodes: &mut [Node], order: &[NodeId], cfg: &Config) {
    let pins = pinned_ids(order, cfg);

    for (i, &id) in order.iter().enumerate() {
        if is_pinned(pins, id) {
            continue;
        }

        if let Some(target) = neighbor_midpoint(nodes, order, i, cfg.closed) {
            let node = &nodes[id];
            let desired = (target - node.position).normalize_or_zero() * cfg.max_speed.eval(node);
            let steer = (desired - node.velocity) * cfg.cohesion_factor.eval(node);
            nodes[id].apply_force(steer);
        }

        let max = cfg.max_force.eval(&nodes[id]);
        nodes[id].clamp_acceleration(max);
    }
}

/// Moves every free node and clears accelerations. Pinned nodes are stopped.
pub fn integrate_phase(nodes: &mut [Node], order: &[NodeId], cfg: &Config) {
    let pins = pinned_ids(order, cfg);
    for &id in order {
        if is_pinned(pins, id) {
            nodes[id].stop();
        } else {
            nodes[id].update();
        }
    }
}

/// Builds a fresh, empty copy of `template` and inserts every node of `order`.
///
/// Nodes that have drifted outside the index boundary are left out.
pub fn rebuild_index(
    template: &QuadTree<NodeEntry>,
    nodes: &[Node],
    order: &[NodeId],
) -> QuadTree<NodeEntry> {
    let mut index = template.cleared();
    let mut dropped = 0usize;
    for &id in order {
        let entry = NodeEntry {
            id,
            position: nodes[id].position,
        };
        if !index.insert(entry) {
            dropped += 1;
        }
    }
    trace!(nodes = order.len(), dropped, depth = index.depth(), "rebuilt index");
    index
}

/// Inserts a midpoint into every edge longer than [`Config::max_node_separation`].
///
/// Walks `order` pairwise. The length test uses the edge's first node, and
/// [`Config::spawn_rule`] must also allow the insertion. New nodes go into
/// the arena and straight into `index`, so later checks in the same pass see
/// them. On a closed line the wrap-around edge (last to first) is checked too,
/// except when the line has only two nodes and that edge would repeat the
/// first one.
///
/// ### Parameters
/// - `nodes` - Node arena; new midpoint nodes are appended.
/// - `order` - Current polyline order.
/// - `index` - Index rebuilt for this step; midpoints are added to it.
/// - `cfg` - Simulation parameters.
///
/// ### Returns
/// `(new_order, inserted)`: the polyline order with midpoints interleaved,
/// and the ids of the inserted nodes in the order they were created.
pub fn growth_phase(
    nodes: &mut Vec<Node>,
    order: &[NodeId],
    index: &mut QuadTree<NodeEntry>,
    cfg: &Config,
) -> (Vec<NodeId>, Vec<NodeId>) {
    let n = order.len();
    if n < 2 {
        return (order.to_vec(), Vec::new());
    }

    let mut next_order = Vec::with_capacity(n + n / 8 + 1);
    let mut inserted = Vec::new();

    for (i, &id) in order.iter().enumerate() {
        next_order.push(id);

        let next = if i + 1 < n {
            order[i + 1]
        } else if cfg.closed && n > 2 {
            order[0]
        } else {
            break;
        };

        if let Some(mid) = spawn_midpoint(nodes, id, next, index, cfg) {
            next_order.push(mid);
            inserted.push(mid);
        }
    }

    (next_order, inserted)
}

fn spawn_midpoint(
    nodes: &mut Vec<Node>,
    current: NodeId,
    next: NodeId,
    index: &mut QuadTree<NodeEntry>,
    cfg: &Config,
) -> Option<NodeId> {
    let node = &nodes[current];
    let other = nodes[next].position;

    let too_far = node.position.distance(other) > cfg.max_node_separation.eval(node);
    if !too_far || !cfg.spawn_rule.allows(node, index) {
        return None;
    }

    let mid = Node::with_radius((node.position + other) * 0.5, node.radius);
    let id = nodes.len();
    nodes.push(mid);
    index.insert(NodeEntry {
        id,
        position: mid.position,
    });
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NodeParam, SpawnRule};

    fn bounds() -> Rect {
        Rect::new(-50.0, -50.0, 100.0, 100.0)
    }

    fn arena(points: &[DVec2]) -> (Vec<Node>, Vec<NodeId>) {
        let nodes: Vec<Node> = points.iter().map(|&p| Node::new(p)).collect();
        let order = (0..nodes.len()).collect();
        (nodes, order)
    }

    fn index_for(nodes: &[Node], order: &[NodeId], capacity: usize) -> QuadTree<NodeEntry> {
        let template = QuadTree::new(bounds(), capacity).unwrap();
        rebuild_index(&template, nodes, order)
    }

    #[test]
    fn separation_force_is_antisymmetric_inverse_square() {
        let a = DVec2::new(1.0, 2.0);
        let b = DVec2::new(4.0, 6.0);

        let fab = separation_force(a, b);
        let fba = separation_force(b, a);
        assert_eq!(fab, -fba);

        // |a - b| = 5, so the magnitude is 1 / 25 and it points from b to a.
        assert!((fab.length() - 1.0 / 25.0).abs() < 1e-15);
        assert!((fab.normalize() - (a - b) / 5.0).length() < 1e-12);
    }

    #[test]
    fn separation_force_ignores_coincident_points() {
        let p = DVec2::new(3.0, 3.0);
        assert_eq!(separation_force(p, p), DVec2::ZERO);

        let q = DVec2::new(1e-110, 0.0);
        assert_eq!(separation_force(DVec2::ZERO, q), DVec2::ZERO);
    }

    #[test]
    fn separation_phase_pushes_pairs_apart_symmetrically() {
        let (mut nodes, order) = arena(&[DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0)]);
        let index = index_for(&nodes, &order, 4);
        let cfg = Config::default()
            .with_max_force(100.0)
            .with_separation_factor(1.0);

        let pairs = separation_phase(&mut nodes, &order, &index, bounds(), &cfg);

        // Each node sees the other once, and each visit pushes both.
        assert_eq!(pairs, 2);
        assert_eq!(nodes[0].acceleration, DVec2::new(-2.0, 0.0));
        assert_eq!(nodes[1].acceleration, DVec2::new(2.0, 0.0));
        assert_eq!(nodes[0].acceleration, -nodes[1].acceleration);
    }

    #[test]
    fn separation_phase_scales_each_side_by_its_own_factor() {
        let (mut nodes, order) = arena(&[DVec2::new(0.0, 0.0), DVec2::new(2.0, 0.0)]);
        let index = index_for(&nodes, &order, 4);
        let factor = NodeParam::varying(|n| if n.position.x > 1.0 { 3.0 } else { 1.0 });
        let cfg = Config::default()
            .with_max_force(100.0)
            .with_separation_factor(factor);

        separation_phase(&mut nodes, &order, &index, bounds(), &cfg);

        // Raw pair force is 1/4 per visit, two visits per node.
        assert_eq!(nodes[0].acceleration, DVec2::new(-0.5, 0.0));
        assert_eq!(nodes[1].acceleration, DVec2::new(1.5, 0.0));
    }

    #[test]
    fn separation_phase_respects_query_window_and_cutoff() {
        // 20 units apart; the default window is 10 x 10.
        let (mut nodes, order) = arena(&[DVec2::new(-10.0, 0.0), DVec2::new(10.0, 0.0)]);
        let index = index_for(&nodes, &order, 4);
        let cfg = Config::default();
        assert_eq!(separation_phase(&mut nodes, &order, &index, bounds(), &cfg), 0);
        assert_eq!(nodes[0].acceleration, DVec2::ZERO);

        let (mut nodes, order) = arena(&[DVec2::new(0.0, 0.0), DVec2::new(3.0, 0.0)]);
        let index = index_for(&nodes, &order, 4);
        let cfg = Config::default().with_separation_radius(2.0);
        assert_eq!(separation_phase(&mut nodes, &order, &index, bounds(), &cfg), 0);
    }

    #[test]
    fn separation_phase_clamps_to_max_force() {
        let (mut nodes, order) = arena(&[
            DVec2::new(0.0, 0.0),
            DVec2::new(0.1, 0.0),
            DVec2::new(0.0, 0.1),
        ]);
        let index = index_for(&nodes, &order, 4);
        let cfg = Config::default().with_max_force(0.5);

        separation_phase(&mut nodes, &order, &index, bounds(), &cfg);

        // The last node processed is clamped after all reactions reached it.
        assert!(nodes[2].acceleration.length() <= 0.5 + 1e-12);
    }

    #[test]
    fn pinned_endpoints_feel_no_force() {
        let (mut nodes, order) = arena(&[
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(2.0, 0.0),
        ]);
        let index = index_for(&nodes, &order, 4);
        let cfg = Config::default().with_fixed_edges(true);

        assert_eq!(pinned_ids(&order, &cfg), Some((0, 2)));
        separation_phase(&mut nodes, &order, &index, bounds(), &cfg);
        cohesion_phase(&mut nodes, &order, &cfg);
        assert_eq!(nodes[0].acceleration, DVec2::ZERO);
        assert_eq!(nodes[2].acceleration, DVec2::ZERO);

        integrate_phase(&mut nodes, &order, &cfg);
        assert_eq!(nodes[0].position, DVec2::new(0.0, 0.0));
        assert_eq!(nodes[2].position, DVec2::new(2.0, 0.0));

        // Closed lines have no endpoints to pin.
        let closed = Config::default().with_fixed_edges(true).with_closed(true);
        assert_eq!(pinned_ids(&order, &closed), None);
    }

    #[test]
    fn neighbor_midpoint_handles_open_and_closed_ends() {
        let (nodes, order) = arena(&[
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 0.0),
            DVec2::new(4.0, 4.0),
        ]);

        let mid = |i, closed| neighbor_midpoint(&nodes, &order, i, closed);

        assert_eq!(mid(1, false), Some(DVec2::new(2.0, 2.0)));
        assert_eq!(mid(0, false), Some(DVec2::new(4.0, 0.0)));
        assert_eq!(mid(2, false), Some(DVec2::new(4.0, 0.0)));

        assert_eq!(mid(0, true), Some(DVec2::new(4.0, 2.0)));
        assert_eq!(mid(2, true), Some(DVec2::new(2.0, 0.0)));

        let (single, one) = arena(&[DVec2::ZERO]);
        assert_eq!(neighbor_midpoint(&single, &one, 0, true), None);
    }

    #[test]
    fn cohesion_steers_toward_neighbors_and_damps_velocity() {
        let (mut nodes, order) = arena(&[
            DVec2::new(-2.0, 0.0),
            DVec2::new(0.0, 3.0),
            DVec2::new(2.0, 0.0),
        ]);
        nodes[1].velocity = DVec2::new(0.5, 0.0);
        let cfg = Config::default()
            .with_max_force(100.0)
            .with_max_speed(2.0)
            .with_cohesion_factor(0.5);

        cohesion_phase(&mut nodes, &order, &cfg);

        // Desired (0, -2), minus velocity (0.5, 0), times 0.5.
        assert_eq!(nodes[1].acceleration, DVec2::new(-0.25, -1.0));
    }

    #[test]
    fn cohesion_clamps_total_acceleration() {
        let (mut nodes, order) = arena(&[
            DVec2::new(-2.0, 0.0),
            DVec2::new(0.0, 3.0),
            DVec2::new(2.0, 0.0),
        ]);
        nodes[1].apply_force(DVec2::new(0.0, -0.8));
        let cfg = Config::default().with_max_force(0.9).with_max_speed(5.0);

        cohesion_phase(&mut nodes, &order, &cfg);

        for node in &nodes {
            assert!(node.acceleration.length() <= 0.9 + 1e-12, "{node:?}");
        }
    }

    #[test]
    fn growth_inserts_midpoints_on_long_edges() {
        let (mut nodes, order) = arena(&[
            DVec2::new(0.0, 0.0),
            DVec2::new(0.0, 10.0),
            DVec2::new(0.0, 12.0),
        ]);
        let mut index = index_for(&nodes, &order, 4);
        let cfg = Config::default().with_max_node_separation(5.0);

        let (next, inserted) = growth_phase(&mut nodes, &order, &mut index, &cfg);

        assert_eq!(inserted, vec![3]);
        assert_eq!(next, vec![0, 3, 1, 2]);
        assert_eq!(nodes[3].position, DVec2::new(0.0, 5.0));
        assert_eq!(nodes[3].velocity, DVec2::ZERO);
        assert_eq!(index.len(), 4, "midpoint goes straight into the index");
    }

    #[test]
    fn growth_checks_the_wrap_edge_when_closed() {
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(3.0, 0.0),
            DVec2::new(0.0, 4.0),
        ];
        let cfg = Config::default().with_max_node_separation(4.5).with_closed(true);

        let (mut nodes, order) = arena(&points);
        let mut index = index_for(&nodes, &order, 4);
        let (next, inserted) = growth_phase(&mut nodes, &order, &mut index, &cfg);

        // Only the 3-4-5 hypotenuse (1 -> 2) is too long when open...
        let open = Config::default().with_max_node_separation(4.5);
        let (mut open_nodes, open_order) = arena(&points);
        let mut open_index = index_for(&open_nodes, &open_order, 4);
        let (_, open_inserted) =
            growth_phase(&mut open_nodes, &open_order, &mut open_index, &open);
        assert_eq!(open_inserted.len(), 1);

        // ...and the closed line has no other long edge, since 2 -> 0 is 4.
        assert_eq!(inserted.len(), 1);
        assert_eq!(next, vec![0, 1, 3, 2]);

        let tight = Config::default().with_max_node_separation(3.5).with_closed(true);
        let (mut nodes, order) = arena(&points);
        let mut index = index_for(&nodes, &order, 4);
        let (next, inserted) = growth_phase(&mut nodes, &order, &mut index, &tight);
        assert_eq!(inserted, vec![3, 4]);
        assert_eq!(next, vec![0, 1, 3, 2, 4]);
        assert_eq!(nodes[4].position, DVec2::new(0.0, 2.0));
    }

    #[test]
    fn growth_respects_spawn_rule() {
        let (mut nodes, order) = arena(&[DVec2::new(0.0, 0.0), DVec2::new(20.0, 0.0)]);
        let mut index = index_for(&nodes, &order, 4);
        let cfg = Config::default().with_spawn_rule(SpawnRule::custom(|_, _| false));

        let (next, inserted) = growth_phase(&mut nodes, &order, &mut index, &cfg);
        assert!(inserted.is_empty());
        assert_eq!(next, order);
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn growth_on_two_node_closed_line_checks_one_edge() {
        let (mut nodes, order) = arena(&[DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0)]);
        let mut index = index_for(&nodes, &order, 4);
        let cfg = Config::default().with_closed(true);

        let (next, inserted) = growth_phase(&mut nodes, &order, &mut index, &cfg);
        assert_eq!(inserted.len(), 1);
        assert_eq!(next, vec![0, 2, 1]);
    }

    #[test]
    fn rebuild_index_skips_nodes_outside_bounds() {
        let (nodes, order) = arena(&[DVec2::new(0.0, 0.0), DVec2::new(500.0, 0.0)]);
        let index = index_for(&nodes, &order, 4);
        assert_eq!(index.len(), 1);
        assert_eq!(index.query(&bounds())[0].id, 0);
    }
}
