// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Item-keyed spatial index on top of an integer-keyed partitioner

use super::partitioner::Partitioner;
use super::{EntryState, SpatialIndex};
use crate::error::SpatialError;
use crate::geometry::BoundingBox;
use ahash::{AHashMap, AHashSet};
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct Inner<T, P> {
    partitioner: P,
    item_to_id: AHashMap<T, i32>,
    id_to_item: AHashMap<i32, T>,
    next_id: i32,
    /// Pre-allocated query result buffer
    buffer: Vec<i32>,
}

/// Spatial index that maps opaque items to partitioner ids.
///
/// Every partitioner call happens under one lock. Entry states live outside that lock so
/// condemning an item never waits on a mutation in progress.
pub struct PartitionedIndex<T, P> {
    inner: Mutex<Inner<T, P>>,
    states: DashMap<T, EntryState>,
}

impl<T, P> PartitionedIndex<T, P>
where
    T: Clone + Eq + Hash + Send + Sync,
    P: Partitioner,
{
    /// `result_capacity` caps every query, whatever limit the caller asks for
    pub fn new(partitioner: P, result_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                partitioner,
                item_to_id: AHashMap::new(),
                id_to_item: AHashMap::new(),
                next_id: 0,
                buffer: vec![0; result_capacity],
            }),
            states: DashMap::new(),
        }
    }

    pub fn result_capacity(&self) -> usize {
        self.lock().buffer.len()
    }

    /// Items physically stored, condemned ones included
    pub fn stored_len(&self) -> usize {
        self.lock().partitioner.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T, P>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_active(&self, item: &T) -> bool {
        self.states
            .get(item)
            .is_some_and(|state| *state == EntryState::Active)
    }

    /// Run one partitioner query into the shared buffer and append up to `limit` active
    /// items to `out`.
    ///
    /// The partitioner always fills the whole buffer so condemned items do not crowd
    /// active ones out of a limited result.
    fn query_into<F>(&self, limit: usize, out: &mut AHashSet<T>, run: F) -> usize
    where
        F: FnOnce(&mut P, &mut [i32]) -> usize,
    {
        let mut guard = self.lock();
        let Inner {
            partitioner,
            id_to_item,
            buffer,
            ..
        } = &mut *guard;

        let count = run(partitioner, buffer.as_mut_slice());

        let mut found = 0;
        let mut added = 0;
        for id in &buffer[..count] {
            if found == limit {
                break;
            }
            let Some(item) = id_to_item.get(id) else {
                continue;
            };
            if !self.is_active(item) {
                continue;
            }
            found += 1;
            if out.insert(item.clone()) {
                added += 1;
            }
        }
        added
    }
}

impl<T, P> SpatialIndex<T> for PartitionedIndex<T, P>
where
    T: Clone + Eq + Hash + Send + Sync,
    P: Partitioner,
{
    fn add(&self, item: T, bounds: BoundingBox) -> Result<(), SpatialError> {
        let mut inner = self.lock();
        if inner.item_to_id.contains_key(&item) {
            return Err(SpatialError::AlreadyPresent);
        }

        let id = inner.next_id;
        inner
            .partitioner
            .add_item(id, bounds.center(), bounds.extents())?;
        inner.next_id += 1;
        inner.item_to_id.insert(item.clone(), id);
        inner.id_to_item.insert(id, item.clone());
        // an entry here means the item was condemned before it was stored
        self.states.entry(item).or_insert(EntryState::Active);
        Ok(())
    }

    fn update_bounds(&self, item: &T, bounds: BoundingBox) -> Result<(), SpatialError> {
        let mut inner = self.lock();
        let id = *inner.item_to_id.get(item).ok_or(SpatialError::NotPresent)?;
        inner
            .partitioner
            .update_item(id, bounds.center(), bounds.extents())
    }

    fn remove(&self, item: &T) -> Result<(), SpatialError> {
        let mut inner = self.lock();
        self.states.remove(item);
        let id = inner.item_to_id.remove(item).ok_or(SpatialError::NotPresent)?;
        inner.id_to_item.remove(&id);
        inner.partitioner.remove_item(id)
    }

    fn condemn(&self, item: &T) -> bool {
        match self.states.get_mut(item) {
            Some(mut state) if *state == EntryState::Active => {
                *state = EntryState::Condemned;
                true
            }
            _ => false,
        }
    }

    fn condemn_pending(&self, item: &T) {
        self.states
            .entry(item.clone())
            .and_modify(|state| *state = EntryState::Condemned)
            .or_insert(EntryState::Condemned);
    }

    fn contained_by(&self, bounds: &BoundingBox, limit: usize) -> AHashSet<T> {
        let mut out = AHashSet::new();
        let (center, extents) = (bounds.center(), bounds.extents());
        self.query_into(limit, &mut out, |p, buf| p.contained_by(center, extents, buf));
        out
    }

    fn intersected_by(&self, bounds: &BoundingBox, limit: usize) -> AHashSet<T> {
        let mut out = AHashSet::new();
        self.intersected_by_into(bounds, limit, &mut out);
        out
    }

    fn intersected_by_into(&self, bounds: &BoundingBox, limit: usize, out: &mut AHashSet<T>) -> usize {
        let (center, extents) = (bounds.center(), bounds.extents());
        self.query_into(limit, out, |p, buf| p.intersected_by(center, extents, buf))
    }

    fn has_item(&self, item: &T) -> bool {
        self.is_active(item)
    }

    fn entry_state(&self, item: &T) -> EntryState {
        self.states
            .get(item)
            .map_or(EntryState::Removed, |state| *state)
    }
}
