use crate::{
    config::Config,
    error::{Error, Result},
    geom::Rect,
    node::{Node, NodeEntry},
    phases,
    quadtree::QuadTree,
    types::NodeId,
};
use glam::DVec2;
use tracing::debug;

/// A polyline that grows by repelling itself and splitting long edges.
///
/// Nodes are stored in an append-only arena; `order` lists the arena ids in
/// polyline order. Each [`DifferentialLine::step`] moves the nodes, rebuilds
/// the spatial index from scratch and then inserts midpoints where edges
/// have grown too long.
#[derive(Debug)]
pub struct DifferentialLine {
    nodes: Vec<Node>,
    order: Vec<NodeId>,
    bounds: Rect,
    cfg: Config,
    index: QuadTree<NodeEntry>,
    steps: u64,
}

impl DifferentialLine {
    /// Creates a line through `points`, in order.
    ///
    /// The per-node parameters `max_force`, `max_speed`,
    /// `max_node_separation` and `separation_radius` are evaluated once on
    /// every initial node and must be finite and non-negative there.
    ///
    /// ### Parameters
    /// - `points` - Initial node positions, in polyline order.
    /// - `bounds` - World bounds for the spatial index. Nodes outside are
    ///   invisible to separation queries.
    /// - `cfg` - Simulation parameters. [`Config::capacity`] is read here
    ///   only; later index rebuilds reuse it.
    ///
    /// ### Errors
    /// Fails on zero capacity, invalid bounds, a non-positive query scale,
    /// a non-finite initial point, or an invalid per-node parameter value.
    pub fn new<I>(points: I, bounds: Rect, cfg: Config) -> Result<Self>
    where
        I: IntoIterator<Item = DVec2>,
    {
        let template = QuadTree::new(bounds, cfg.capacity)?;
        if !(cfg.query_scale.is_finite() && cfg.query_scale > 0.0) {
            return Err(Error::InvalidQueryScale(cfg.query_scale));
        }

        let nodes: Vec<Node> = points.into_iter().map(Node::new).collect();
        for (id, node) in nodes.iter().enumerate() {
            if !node.position.is_finite() {
                return Err(Error::NonFinitePosition { id });
            }
            validate_params(id, node, &cfg)?;
        }

        let order: Vec<NodeId> = (0..nodes.len()).collect();
        let index = phases::rebuild_index(&template, &nodes, &order);

        debug!(
            nodes = nodes.len(),
            closed = cfg.closed,
            fixed_edges = cfg.fixed_edges,
            capacity = cfg.capacity,
            "created differential line"
        );

        Ok(Self {
            nodes,
            order,
            bounds,
            cfg,
            index,
            steps: 0,
        })
    }

    /// Advances the simulation by one step.
    ///
    /// ### Returns
    /// Ids of the nodes inserted by growth during this step.
    pub fn step(&mut self) -> Vec<NodeId> {
        let pairs = phases::separation_phase(
            &mut self.nodes,
            &self.order,
            &self.index,
            self.bounds,
            &self.cfg,
        );
        phases::cohesion_phase(&mut self.nodes, &self.order, &self.cfg);
        phases::integrate_phase(&mut self.nodes, &self.order, &self.cfg);

        self.index = phases::rebuild_index(&self.index, &self.nodes, &self.order);

        let (order, inserted) =
            phases::growth_phase(&mut self.nodes, &self.order, &mut self.index, &self.cfg);
        self.order = order;
        self.steps += 1;

        debug!(
            step = self.steps,
            nodes = self.order.len(),
            inserted = inserted.len(),
            pairs,
            "stepped differential line"
        );
        inserted
    }

    /// Runs `steps` steps and returns how many nodes were inserted in total.
    pub fn run(&mut self, steps: usize) -> usize {
        (0..steps).map(|_| self.step().len()).sum()
    }

    /// Snapshot of node positions in polyline order.
    pub fn positions(&self) -> Vec<DVec2> {
        self.nodes().map(|n| n.position).collect()
    }

    /// Positions smoothed by a centered moving average over `window` nodes.
    ///
    /// Closed lines wrap around; open lines clamp the window at their ends,
    /// so endpoints only average with nodes on one side. A window of 0 or 1
    /// returns the raw positions.
    pub fn smoothed_positions(&self, window: usize) -> Vec<DVec2> {
        let points = self.positions();
        let n = points.len();
        if window <= 1 || n < 3 {
            return points;
        }

        let half = (window / 2).min((n - 1) / 2) as isize;
        (0..n as isize)
            .map(|i| {
                let mut sum = DVec2::ZERO;
                let mut count = 0.0;
                for k in (i - half)..=(i + half) {
                    let j = if self.cfg.closed {
                        k.rem_euclid(n as isize)
                    } else if k < 0 || k >= n as isize {
                        continue;
                    } else {
                        k
                    };
                    sum += points[j as usize];
                    count += 1.0;
                }
                sum / count
            })
            .collect()
    }

    /// Nodes in polyline order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().map(|&id| &self.nodes[id])
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Arena ids in polyline order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.cfg.closed
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The index as rebuilt during the last step, including its midpoints.
    pub fn index(&self) -> &QuadTree<NodeEntry> {
        &self.index
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Mutable access to the parameters between steps.
    ///
    /// Changing [`Config::capacity`] here has no effect; the index keeps the
    /// capacity it was created with.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.cfg
    }

    /// Number of completed steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

fn validate_params(id: NodeId, node: &Node, cfg: &Config) -> Result<()> {
    let fixed = [
        ("max_force", cfg.max_force.eval(node)),
        ("max_speed", cfg.max_speed.eval(node)),
        ("max_node_separation", cfg.max_node_separation.eval(node)),
    ];
    let radius = cfg
        .separation_radius
        .as_ref()
        .map(|r| ("separation_radius", r.eval(node)));

    for (param, value) in fixed.into_iter().chain(radius) {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidNodeValue { param, id, value });
        }
    }
    Ok(())
}
