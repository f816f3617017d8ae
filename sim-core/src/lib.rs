//! Differential line growth on top of a region quadtree.
//!
//! Main components:
//! - [`quadtree`] — write-once spatial index answering rectangle queries.
//! - [`line`] — the growing polyline and its step loop.
//! - [`phases`] — the individual force, integration and growth phases.
//! - [`config`] — simulation parameters, many of them varying per node.
//! - [`node`] — moving particles and index entries.
//! - [`geom`] — axis-aligned rectangles.
//! - [`seed`] — initial point sets.
//! - [`error`] — construction-time errors.
//! - [`types`] — shared type aliases and IDs.

pub mod config;
pub mod error;
pub mod geom;
pub mod line;
pub mod node;
pub mod phases;
pub mod quadtree;
pub mod seed;
pub mod types;
