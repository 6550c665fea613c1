// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closed solids as sets of convex polygons

use super::context::CsgContext;
use super::polygon::CsgPolygon;
use super::vertex::CsgVertex;
use crate::error::{KernelError, KernelResult};
use crate::geometry::{math3d, BoundingBox};
use crate::mesh::{decompose, MMesh};
use ahash::AHashSet;

/// Immutable solid: polygons, the vertices they use, and their overall bounds
#[derive(Debug, Clone)]
pub struct CsgObject {
    polygons: Vec<CsgPolygon>,
    vertices: Vec<CsgVertex>,
    bounds: BoundingBox,
}

impl CsgObject {
    /// Fails if a polygon refers to a vertex missing from `vertices`
    pub fn new(polygons: Vec<CsgPolygon>, vertices: Vec<CsgVertex>) -> KernelResult<Self> {
        let known: AHashSet<usize> = vertices.iter().map(|v| v.id).collect();
        for polygon in &polygons {
            if let Some(missing) = polygon.vertices().iter().find(|v| !known.contains(&v.id)) {
                return Err(KernelError::MissingVertex(missing.id));
            }
        }

        let bounds = BoundingBox::from_points(vertices.iter().map(|v| &v.position));
        Ok(Self {
            polygons,
            vertices,
            bounds,
        })
    }

    /// Weld a mesh into `context` and split its faces into convex polygons
    pub fn from_mesh(mesh: &MMesh, context: &mut CsgContext) -> KernelResult<Self> {
        let tolerance = *context.tolerance();
        let positions = mesh.positions();
        let mut polygons = Vec::with_capacity(mesh.faces.len());

        for face in &mesh.faces {
            for piece in decompose(&face.vertex_ids, &[], &positions, &tolerance)? {
                let mut vertices = Vec::with_capacity(piece.len());
                for id in piece {
                    let location = positions.get(&id).copied().ok_or(KernelError::MissingVertex(id))?;
                    vertices.push(context.create_or_get_vertex_at(location)?);
                }
                // welding can merge neighbours of a thin face
                vertices.dedup_by_key(|v| v.id);
                if vertices.len() > 1 && vertices.first().map(|v| v.id) == vertices.last().map(|v| v.id) {
                    vertices.pop();
                }
                if vertices.len() < 3 {
                    continue;
                }
                let points: Vec<_> = vertices.iter().map(|v| v.position).collect();
                let normal = math3d::polygon_normal(&points).ok_or_else(|| {
                    KernelError::DegenerateGeometry(format!("face {} has zero area", face.id))
                })?;
                polygons.push(CsgPolygon::with_normal(vertices, normal, face.material_id, &tolerance)?);
            }
        }

        let used: AHashSet<usize> = polygons
            .iter()
            .flat_map(|p| p.vertices().iter().map(|v| v.id))
            .collect();
        let vertices = context
            .vertices()
            .iter()
            .filter(|v| used.contains(&v.id))
            .copied()
            .collect();
        Self::new(polygons, vertices)
    }

    pub fn polygons(&self) -> &[CsgPolygon] {
        &self.polygons
    }

    pub fn vertices(&self) -> &[CsgVertex] {
        &self.vertices
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }
}
