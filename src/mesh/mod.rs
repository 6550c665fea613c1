// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygon mesh representation used by the editing layer
//!
//! Faces are ordered loops of vertex ids wound consistently (counter-clockwise seen from
//! outside). Vertex ids are unique within one mesh but need not be dense.

mod coplanar;
mod decompose;
mod validator;

pub use coplanar::group_coplanar_faces;
pub use decompose::{decompose, is_convex_loop, triangulate, VertexPositions};
pub use validator::{has_valid_topology, validate_meshes, validate_topology, TopologyIssue, TopologyReport};

use crate::error::{KernelError, KernelResult};
use crate::geometry::{math3d, BoundingBox};
use ahash::AHashMap;
use anyhow::{Context, Result};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub type VertexId = usize;
pub type FaceId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub position: Point3<f32>,
}

impl Vertex {
    pub fn new(id: VertexId, position: Point3<f32>) -> Self {
        Self { id, position }
    }
}

/// Directed boundary segment of one face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub start: VertexId,
    pub end: VertexId,
}

impl Edge {
    pub fn new(start: VertexId, end: VertexId) -> Self {
        Self { start, end }
    }

    /// The twin direction
    pub fn reversed(&self) -> Edge {
        Edge {
            start: self.end,
            end: self.start,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub id: FaceId,
    pub vertex_ids: Vec<VertexId>,
    #[serde(default)]
    pub material_id: i32,
}

impl Face {
    pub fn new(id: FaceId, vertex_ids: Vec<VertexId>, material_id: i32) -> Self {
        Self {
            id,
            vertex_ids,
            material_id,
        }
    }

    /// Consecutive vertex pairs, wrapping from the last vertex to the first
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        let n = self.vertex_ids.len();
        (0..n).map(move |i| Edge::new(self.vertex_ids[i], self.vertex_ids[(i + 1) % n]))
    }
}

/// Editable polygon mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MMesh {
    pub id: usize,
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
}

impl MMesh {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Add a vertex with the next free id and return that id
    pub fn add_vertex(&mut self, position: Point3<f32>) -> VertexId {
        let id = self.vertices.iter().map(|v| v.id + 1).max().unwrap_or(0);
        self.vertices.push(Vertex::new(id, position));
        id
    }

    /// Add a face and return its id
    pub fn add_face(&mut self, vertex_ids: Vec<VertexId>, material_id: i32) -> FaceId {
        let id = self.faces.iter().map(|f| f.id + 1).max().unwrap_or(0);
        self.faces.push(Face::new(id, vertex_ids, material_id));
        id
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Vertex id to position lookup
    pub fn positions(&self) -> AHashMap<VertexId, Point3<f32>> {
        self.vertices.iter().map(|v| (v.id, v.position)).collect()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.iter().map(|v| &v.position))
    }

    /// Positions of a face loop, in winding order
    pub fn face_positions(&self, face: &Face) -> KernelResult<Vec<Point3<f32>>> {
        let positions = self.positions();
        face.vertex_ids
            .iter()
            .map(|id| positions.get(id).copied().ok_or(KernelError::MissingVertex(*id)))
            .collect()
    }

    /// Outward unit normal of a face
    pub fn face_normal(&self, face: &Face) -> KernelResult<Vector3<f32>> {
        let points = self.face_positions(face)?;
        math3d::polygon_normal(&points)
            .ok_or_else(|| KernelError::DegenerateGeometry(format!("face {} has no normal", face.id)))
    }

    /// Axis-aligned box with outward-facing quads
    pub fn cuboid(id: usize, min: Point3<f32>, max: Point3<f32>) -> Self {
        let mut mesh = Self::new(id);
        let corners = [
            Point3::new(min.x, min.y, min.z),
            Point3::new(max.x, min.y, min.z),
            Point3::new(max.x, max.y, min.z),
            Point3::new(min.x, max.y, min.z),
            Point3::new(min.x, min.y, max.z),
            Point3::new(max.x, min.y, max.z),
            Point3::new(max.x, max.y, max.z),
            Point3::new(min.x, max.y, max.z),
        ];
        for corner in corners {
            mesh.add_vertex(corner);
        }

        let quads: [[VertexId; 4]; 6] = [
            [0, 3, 2, 1], // bottom (-Z)
            [4, 5, 6, 7], // top (+Z)
            [0, 1, 5, 4], // front (-Y)
            [2, 3, 7, 6], // back (+Y)
            [0, 4, 7, 3], // left (-X)
            [1, 2, 6, 5], // right (+X)
        ];
        for quad in quads {
            mesh.add_face(quad.to_vec(), 0);
        }
        mesh
    }

    /// Regular-ish tetrahedron with outward-facing triangles
    pub fn tetrahedron(id: usize) -> Self {
        let mut mesh = Self::new(id);
        mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        mesh.add_vertex(Point3::new(0.0, 0.0, 1.0));

        mesh.add_face(vec![0, 2, 1], 0);
        mesh.add_face(vec![0, 1, 3], 0);
        mesh.add_face(vec![0, 3, 2], 0);
        mesh.add_face(vec![1, 2, 3], 0);
        mesh
    }

    /// Load a mesh from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read mesh file: {:?}", path.as_ref()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse mesh file: {:?}", path.as_ref()))
    }

    /// Save a mesh as pretty-printed JSON
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize mesh")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write mesh file: {:?}", path.as_ref()))
    }
}
