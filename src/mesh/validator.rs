// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closed-manifold topology checks

use super::{Edge, FaceId, MMesh, VertexId};
use crate::collections::MultiMap;
use ahash::AHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// One reason a mesh is not a closed manifold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyIssue {
    /// Vertex not used by any face
    UnreferencedVertex { vertex: VertexId },
    /// Vertex used by a single face
    VertexUnderShared { vertex: VertexId, faces: usize },
    /// Face refers to a vertex the mesh does not have
    UnknownVertex { face: FaceId, vertex: VertexId },
    /// Two faces traverse the same edge in the same direction
    DuplicateDirectedEdge { edge: Edge, first: FaceId, second: FaceId },
    /// Edge whose reverse is not traversed by any face
    OpenEdge { edge: Edge, face: FaceId },
}

impl fmt::Display for TopologyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyIssue::UnreferencedVertex { vertex } => {
                write!(f, "vertex {vertex} is not used by any face")
            }
            TopologyIssue::VertexUnderShared { vertex, faces } => {
                write!(f, "vertex {vertex} is used by {faces} face(s), needs at least 2")
            }
            TopologyIssue::UnknownVertex { face, vertex } => {
                write!(f, "face {face} refers to unknown vertex {vertex}")
            }
            TopologyIssue::DuplicateDirectedEdge { edge, first, second } => write!(
                f,
                "edge {}->{} traversed in the same direction by faces {first} and {second}",
                edge.start, edge.end
            ),
            TopologyIssue::OpenEdge { edge, face } => write!(
                f,
                "edge {}->{} of face {face} has no opposite edge",
                edge.start, edge.end
            ),
        }
    }
}

/// Outcome of a topology check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyReport {
    pub mesh_id: usize,
    pub valid: bool,
    pub issues: Vec<TopologyIssue>,
}

impl TopologyReport {
    pub fn open_edges(&self) -> impl Iterator<Item = &Edge> {
        self.issues.iter().filter_map(|issue| match issue {
            TopologyIssue::OpenEdge { edge, .. } => Some(edge),
            _ => None,
        })
    }
}

/// Check that every vertex borders at least two faces and every directed edge is
/// traversed exactly once with its reverse traversed by another face.
///
/// Read-only; the mesh is never modified. Issues are listed in vertex order, then face order.
pub fn validate_topology(mesh: &MMesh) -> TopologyReport {
    let mut issues = Vec::new();

    let mut vertex_faces: MultiMap<VertexId, FaceId> = MultiMap::new();
    for face in &mesh.faces {
        for &vertex in &face.vertex_ids {
            vertex_faces.add(vertex, face.id);
        }
    }

    for vertex in &mesh.vertices {
        match vertex_faces.count(&vertex.id) {
            0 => issues.push(TopologyIssue::UnreferencedVertex { vertex: vertex.id }),
            1 => issues.push(TopologyIssue::VertexUnderShared {
                vertex: vertex.id,
                faces: 1,
            }),
            _ => {}
        }
    }

    let known: ahash::AHashSet<VertexId> = mesh.vertices.iter().map(|v| v.id).collect();
    let mut edge_owner: AHashMap<Edge, FaceId> = AHashMap::new();
    for face in &mesh.faces {
        for &vertex in &face.vertex_ids {
            if !known.contains(&vertex) {
                issues.push(TopologyIssue::UnknownVertex {
                    face: face.id,
                    vertex,
                });
            }
        }
        for edge in face.edges() {
            if let Some(&first) = edge_owner.get(&edge) {
                issues.push(TopologyIssue::DuplicateDirectedEdge {
                    edge,
                    first,
                    second: face.id,
                });
            } else {
                edge_owner.insert(edge, face.id);
            }
        }
    }

    for face in &mesh.faces {
        for edge in face.edges() {
            if !edge_owner.contains_key(&edge.reversed()) {
                issues.push(TopologyIssue::OpenEdge { edge, face: face.id });
            }
        }
    }

    let report = TopologyReport {
        mesh_id: mesh.id,
        valid: issues.is_empty(),
        issues,
    };
    info!(
        mesh = mesh.id,
        faces = mesh.faces.len(),
        vertices = mesh.vertices.len(),
        valid = report.valid,
        issues = report.issues.len(),
        "validated mesh topology"
    );
    report
}

/// Boolean form of [`validate_topology`]
pub fn has_valid_topology(mesh: &MMesh) -> bool {
    validate_topology(mesh).valid
}

/// Validate many meshes in parallel; reports come back in input order
pub fn validate_meshes(meshes: &[MMesh]) -> Vec<TopologyReport> {
    meshes.par_iter().map(validate_topology).collect()
}
