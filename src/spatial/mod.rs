// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Spatial index: broad-phase containment and overlap queries over axis-aligned boxes
//!
//! [`SpatialIndex`] is the capability every backend offers. [`PartitionedIndex`] implements
//! it on top of any integer-keyed [`Partitioner`]; [`SpatialWorker`] serializes mutations
//! on one background thread while queries run from any thread.
//!
//! Queries are capped at a fixed result capacity. A result set whose size equals the cap
//! may be incomplete.

mod bvh;
pub mod command_log;
mod index;
mod partitioner;
mod registry;
mod worker;

pub use bvh::BvhPartitioner;
pub use index::PartitionedIndex;
pub use partitioner::{LinearPartitioner, Partitioner};
pub use registry::PartitionerRegistry;
pub use worker::SpatialWorker;

use crate::config::{SpatialBackend, SpatialConfig};
use crate::error::SpatialError;
use crate::geometry::BoundingBox;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// Lifecycle of one index entry: `Active -> Condemned -> Removed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryState {
    /// Visible to queries
    Active,
    /// Hidden from queries, still stored until the removal runs
    Condemned,
    /// Not stored (also reported for items that were never added)
    Removed,
}

/// Spatial index capability over opaque items
pub trait SpatialIndex<T>: Send + Sync {
    /// Register an item; fails if it is already stored, condemned or not
    fn add(&self, item: T, bounds: BoundingBox) -> Result<(), SpatialError>;

    fn update_bounds(&self, item: &T, bounds: BoundingBox) -> Result<(), SpatialError>;

    fn remove(&self, item: &T) -> Result<(), SpatialError>;

    /// Hide an active item from all queries without touching storage.
    /// Returns false if the item was not active.
    fn condemn(&self, item: &T) -> bool;

    /// Hide an item whether or not it is stored yet. An item condemned ahead of its
    /// `add` arrives already condemned and stays hidden until `remove` runs.
    fn condemn_pending(&self, item: &T);

    /// Items whose bounds lie entirely inside `bounds`, at most `limit` of them
    fn contained_by(&self, bounds: &BoundingBox, limit: usize) -> AHashSet<T>;

    /// Items whose bounds overlap `bounds`, at most `limit` of them
    fn intersected_by(&self, bounds: &BoundingBox, limit: usize) -> AHashSet<T>;

    /// Allocation-free variant of [`SpatialIndex::intersected_by`]; returns how many items were added to `out`
    fn intersected_by_into(&self, bounds: &BoundingBox, limit: usize, out: &mut AHashSet<T>) -> usize;

    /// True only for active items
    fn has_item(&self, item: &T) -> bool;

    fn entry_state(&self, item: &T) -> EntryState;
}

/// Index whose backend is picked at runtime from configuration
pub type DynIndex<T> = PartitionedIndex<T, Box<dyn Partitioner>>;

/// Build the partitioner named by `config.backend`
pub fn create_partitioner(config: &SpatialConfig) -> Box<dyn Partitioner> {
    match config.backend {
        SpatialBackend::Linear => Box::new(LinearPartitioner::new()),
        SpatialBackend::Bvh => Box::new(BvhPartitioner::new(config.bvh_leaf_size)),
    }
}

/// Build an index sized and backed according to `config`
pub fn create_index<T>(config: &SpatialConfig) -> DynIndex<T>
where
    T: Clone + Eq + std::hash::Hash + Send + Sync,
{
    PartitionedIndex::new(create_partitioner(config), config.result_capacity)
}
