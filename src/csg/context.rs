// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Vertex welding

use super::vertex::{CsgVertex, CsgVertexId};
use crate::config::{SpatialConfig, Tolerance};
use crate::error::KernelResult;
use crate::geometry::BoundingBox;
use crate::spatial::{create_index, DynIndex, SpatialIndex};
use ahash::AHashSet;
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// Deduplicates vertices created while building one CSG result.
///
/// Requests closer than `tolerance.epsilon` to an existing vertex get that vertex back.
/// One construction pass owns a context; it is not meant to be shared between threads.
pub struct CsgContext {
    tolerance: Tolerance,
    vertices: Vec<CsgVertex>,
    index: DynIndex<CsgVertexId>,
    candidates: AHashSet<CsgVertexId>,
}

impl CsgContext {
    pub fn new(tolerance: Tolerance, spatial: &SpatialConfig) -> Self {
        Self {
            tolerance,
            vertices: Vec::new(),
            index: create_index(spatial),
            candidates: AHashSet::new(),
        }
    }

    pub fn tolerance(&self) -> &Tolerance {
        &self.tolerance
    }

    /// Existing vertex within `epsilon` of `location`, else a new one
    pub fn create_or_get_vertex_at(&mut self, location: Point3<f32>) -> KernelResult<CsgVertex> {
        let radius = self.tolerance.weld_search_radius();
        let search = BoundingBox::from_center_extents(location, Vector3::repeat(radius));

        self.candidates.clear();
        self.index
            .intersected_by_into(&search, usize::MAX, &mut self.candidates);

        let closest = self
            .candidates
            .iter()
            .map(|&id| self.vertices[id])
            .map(|vertex| (vertex.distance_to(&location), vertex))
            .filter(|(distance, _)| *distance < self.tolerance.epsilon)
            .min_by(|(a, _), (b, _)| a.total_cmp(b));

        if let Some((distance, vertex)) = closest {
            debug!(id = vertex.id, distance, "reused welded vertex");
            return Ok(vertex);
        }

        let vertex = CsgVertex::new(self.vertices.len(), location);
        self.index
            .add(vertex.id, BoundingBox::from_point(location))?;
        self.vertices.push(vertex);
        debug!(id = vertex.id, "created welded vertex");
        Ok(vertex)
    }

    pub fn vertex(&self, id: CsgVertexId) -> Option<&CsgVertex> {
        self.vertices.get(id)
    }

    pub fn vertices(&self) -> &[CsgVertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Give up the welded vertices; the lookup index is dropped
    pub fn into_vertices(self) -> Vec<CsgVertex> {
        self.vertices
    }
}
