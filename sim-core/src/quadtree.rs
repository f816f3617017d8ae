//! Region quadtree over 2-D positioned items.
//!
//! The tree is write-once: items can be inserted and queried but never
//! removed or moved. Callers that track moving points rebuild a fresh tree
//! instead of updating one in place.

use crate::{
    error::{Error, Result},
    geom::Rect,
};
use glam::DVec2;

/// Anything that can be stored in a [`QuadTree`].
pub trait Positioned {
    fn position(&self) -> DVec2;
}

impl Positioned for DVec2 {
    #[inline]
    fn position(&self) -> DVec2 {
        *self
    }
}

/// A region quadtree with bounded-capacity quads.
///
/// Each quad is either a leaf holding at most `capacity` items, or an
/// internal quad with exactly four children (NE, SE, SW, NW). When a full
/// leaf receives another item it subdivides; the items it already holds stay
/// where they are and every later insert is offered to all four children.
/// Only the children whose boundary contains the point accept it.
#[derive(Debug, Clone)]
pub struct QuadTree<T> {
    boundary: Rect,
    capacity: usize,
    items: Vec<T>,
    children: Option<Box<[QuadTree<T>; 4]>>,
}

impl<T: Positioned + Copy> QuadTree<T> {
    /// Creates an empty leaf covering `boundary`.
    ///
    /// ### Errors
    /// - [`Error::ZeroCapacity`] if `capacity == 0`.
    /// - [`Error::InvalidBounds`] if `boundary` is not finite with a positive size.
    pub fn new(boundary: Rect, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        if !boundary.is_valid() {
            return Err(Error::InvalidBounds {
                x: boundary.x,
                y: boundary.y,
                width: boundary.width,
                height: boundary.height,
            });
        }
        Ok(Self::leaf(boundary, capacity))
    }

    /// Inserts `item` into the tree.
    ///
    /// Items outside the boundary are dropped silently; callers that need
    /// strict containment must filter beforehand.
    ///
    /// ### Returns
    /// `true` if some quad accepted the item.
    pub fn insert(&mut self, item: T) -> bool {
        if !self.boundary.contains(item.position()) {
            return false;
        }

        if self.children.is_none() && self.items.len() < self.capacity {
            self.items.push(item);
            return true;
        }

        if self.children.is_none() {
            self.subdivide();
        }

        let mut accepted = false;
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                accepted |= child.insert(item);
            }
        }
        accepted
    }

    /// Inserts every item from `items`, in order.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        for item in items {
            self.insert(item);
        }
    }

    fn subdivide(&mut self) {
        let capacity = self.capacity;
        let quads = self
            .boundary
            .quadrants()
            .map(|q| QuadTree::leaf(q, capacity));
        self.children = Some(Box::new(quads));
    }

    /// Returns every stored item whose position lies inside `rect`.
    ///
    /// Quadrants partition their parent, so each item is stored exactly once
    /// and the result holds no duplicates. Order is unspecified.
    pub fn query(&self, rect: &Rect) -> Vec<T> {
        let mut out = Vec::new();
        self.query_into(rect, &mut out);
        out
    }

    /// Like [`QuadTree::query`] for the `width` x `height` rectangle centered on `center`.
    pub fn query_around(&self, center: DVec2, width: f64, height: f64) -> Vec<T> {
        self.query(&Rect::from_center(center, width, height))
    }

    /// Appends matching items to `out` instead of allocating.
    ///
    /// ### Returns
    /// The number of quads whose boundary intersected `rect` and were
    /// therefore scanned. A query that misses the root visits nothing.
    pub fn query_into(&self, rect: &Rect, out: &mut Vec<T>) -> usize {
        if !self.boundary.intersects(rect) {
            return 0;
        }

        out.extend(
            self.items
                .iter()
                .filter(|item| rect.contains(item.position()))
                .copied(),
        );

        let mut visited = 1;
        if let Some(children) = &self.children {
            for child in children.iter() {
                visited += child.query_into(rect, out);
            }
        }
        visited
    }

    /// Builds a fresh tree with the same boundary and capacity holding every
    /// item of this one.
    pub fn rebuilt(&self) -> Self {
        let mut tree = self.cleared();
        tree.extend(self.query(&self.boundary));
        tree
    }
}

impl<T> QuadTree<T> {
    fn leaf(boundary: Rect, capacity: usize) -> Self {
        Self {
            boundary,
            capacity,
            items: Vec::with_capacity(capacity),
            children: None,
        }
    }

    /// An empty tree with the same boundary and capacity.
    pub fn cleared(&self) -> Self {
        Self::leaf(self.boundary, self.capacity)
    }

    pub fn boundary(&self) -> Rect {
        self.boundary
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items held directly by this quad (not its children).
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// The four quadrants in NE, SE, SW, NW order, if subdivided.
    pub fn children(&self) -> Option<&[QuadTree<T>; 4]> {
        self.children.as_deref()
    }

    pub fn is_subdivided(&self) -> bool {
        self.children.is_some()
    }

    /// Total number of items stored in this quad and all descendants.
    pub fn len(&self) -> usize {
        let below: usize = self
            .children
            .iter()
            .flat_map(|c| c.iter())
            .map(QuadTree::len)
            .sum();
        self.items.len() + below
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of levels in the tree; a lone leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .flat_map(|c| c.iter())
            .map(QuadTree::depth)
            .max()
            .unwrap_or(0)
    }
}
