// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Integer-keyed partitioner primitives and the flat-array backend

use crate::error::SpatialError;
use crate::geometry::BoundingBox;
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};

/// Storage backend of a spatial index.
///
/// Items are keyed by integer ids and described by a center plus half extents.
/// Queries write matching ids into `out` and return how many were written; once `out`
/// is full the query stops, so a full buffer means "at least this many".
pub trait Partitioner: Send {
    fn add_item(&mut self, id: i32, center: Point3<f32>, extents: Vector3<f32>) -> Result<(), SpatialError>;

    fn update_item(&mut self, id: i32, center: Point3<f32>, extents: Vector3<f32>) -> Result<(), SpatialError>;

    fn remove_item(&mut self, id: i32) -> Result<(), SpatialError>;

    /// Ids whose box lies entirely inside the query box
    fn contained_by(&mut self, center: Point3<f32>, extents: Vector3<f32>, out: &mut [i32]) -> usize;

    /// Ids whose box overlaps the query box, touching included
    fn intersected_by(&mut self, center: Point3<f32>, extents: Vector3<f32>, out: &mut [i32]) -> usize;

    fn has_item(&self, id: i32) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Partitioner for Box<dyn Partitioner> {
    fn add_item(&mut self, id: i32, center: Point3<f32>, extents: Vector3<f32>) -> Result<(), SpatialError> {
        (**self).add_item(id, center, extents)
    }

    fn update_item(&mut self, id: i32, center: Point3<f32>, extents: Vector3<f32>) -> Result<(), SpatialError> {
        (**self).update_item(id, center, extents)
    }

    fn remove_item(&mut self, id: i32) -> Result<(), SpatialError> {
        (**self).remove_item(id)
    }

    fn contained_by(&mut self, center: Point3<f32>, extents: Vector3<f32>, out: &mut [i32]) -> usize {
        (**self).contained_by(center, extents, out)
    }

    fn intersected_by(&mut self, center: Point3<f32>, extents: Vector3<f32>, out: &mut [i32]) -> usize {
        (**self).intersected_by(center, extents, out)
    }

    fn has_item(&self, id: i32) -> bool {
        (**self).has_item(id)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

/// Dense element array scanned on every query.
///
/// Removal moves the last element into the freed slot, so storage stays packed and
/// query results come back in storage order.
#[derive(Debug, Default, Clone)]
pub struct LinearPartitioner {
    elements: Vec<(i32, BoundingBox)>,
    id_to_index: AHashMap<i32, usize>,
}

impl LinearPartitioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: Vec::with_capacity(capacity),
            id_to_index: AHashMap::with_capacity(capacity),
        }
    }

    pub fn bounds_of(&self, id: i32) -> Option<BoundingBox> {
        self.id_to_index.get(&id).map(|&index| self.elements[index].1)
    }

    fn collect<F>(&self, out: &mut [i32], accept: F) -> usize
    where
        F: Fn(&BoundingBox) -> bool,
    {
        let mut count = 0;
        for (id, bounds) in &self.elements {
            if count == out.len() {
                break;
            }
            if accept(bounds) {
                out[count] = *id;
                count += 1;
            }
        }
        count
    }
}

impl Partitioner for LinearPartitioner {
    fn add_item(&mut self, id: i32, center: Point3<f32>, extents: Vector3<f32>) -> Result<(), SpatialError> {
        if self.id_to_index.contains_key(&id) {
            return Err(SpatialError::AlreadyPresent);
        }
        self.id_to_index.insert(id, self.elements.len());
        self.elements
            .push((id, BoundingBox::from_center_extents(center, extents)));
        Ok(())
    }

    fn update_item(&mut self, id: i32, center: Point3<f32>, extents: Vector3<f32>) -> Result<(), SpatialError> {
        let index = *self.id_to_index.get(&id).ok_or(SpatialError::NotPresent)?;
        self.elements[index].1 = BoundingBox::from_center_extents(center, extents);
        Ok(())
    }

    fn remove_item(&mut self, id: i32) -> Result<(), SpatialError> {
        let index = self.id_to_index.remove(&id).ok_or(SpatialError::NotPresent)?;
        self.elements.swap_remove(index);
        if let Some((moved_id, _)) = self.elements.get(index) {
            self.id_to_index.insert(*moved_id, index);
        }
        Ok(())
    }

    fn contained_by(&mut self, center: Point3<f32>, extents: Vector3<f32>, out: &mut [i32]) -> usize {
        let query = BoundingBox::from_center_extents(center, extents);
        self.collect(out, |bounds| query.contains(bounds))
    }

    fn intersected_by(&mut self, center: Point3<f32>, extents: Vector3<f32>, out: &mut [i32]) -> usize {
        let query = BoundingBox::from_center_extents(center, extents);
        self.collect(out, |bounds| query.intersects(bounds))
    }

    fn has_item(&self, id: i32) -> bool {
        self.id_to_index.contains_key(&id)
    }

    fn len(&self) -> usize {
        self.elements.len()
    }
}
