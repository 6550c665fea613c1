// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Grouping of edge-adjacent coplanar faces into merge candidates

use super::{FaceId, MMesh, VertexId};
use crate::collections::DisjointSet;
use crate::config::Tolerance;
use crate::error::{KernelError, KernelResult};
use crate::geometry::{math3d, Plane};
use ahash::AHashMap;

/// Sets of two or more faces that share an edge (transitively), a material and a plane.
///
/// Normals must agree within `tolerance.epsilon` and plane offsets within
/// `tolerance.merge_distance`. Faces and groups are sorted by face id.
pub fn group_coplanar_faces(mesh: &MMesh, tolerance: &Tolerance) -> KernelResult<Vec<Vec<FaceId>>> {
    let positions = mesh.positions();
    let mut planes: AHashMap<FaceId, Plane> = AHashMap::with_capacity(mesh.faces.len());
    for face in &mesh.faces {
        let points = face
            .vertex_ids
            .iter()
            .map(|id| positions.get(id).copied().ok_or(KernelError::MissingVertex(*id)))
            .collect::<KernelResult<Vec<_>>>()?;
        let plane = math3d::polygon_normal(&points)
            .zip(math3d::centroid(&points))
            .and_then(|(normal, center)| Plane::from_normal_and_point(normal, &center))
            .ok_or_else(|| KernelError::DegenerateGeometry(format!("face {} has no plane", face.id)))?;
        planes.insert(face.id, plane);
    }

    // undirected edge -> faces using it
    let mut edge_faces: AHashMap<(VertexId, VertexId), Vec<usize>> = AHashMap::new();
    for (index, face) in mesh.faces.iter().enumerate() {
        for edge in face.edges() {
            let key = (edge.start.min(edge.end), edge.start.max(edge.end));
            edge_faces.entry(key).or_default().push(index);
        }
    }

    let mut groups = DisjointSet::new();
    for face in &mesh.faces {
        groups.add(face.id);
    }

    for neighbours in edge_faces.values() {
        for (i, &a) in neighbours.iter().enumerate() {
            for &b in &neighbours[i + 1..] {
                let (face_a, face_b) = (&mesh.faces[a], &mesh.faces[b]);
                if face_a.material_id != face_b.material_id {
                    continue;
                }
                let (plane_a, plane_b) = (&planes[&face_a.id], &planes[&face_b.id]);
                let aligned = 1.0 - plane_a.normal.dot(&plane_b.normal) <= tolerance.epsilon;
                let same_offset = (plane_a.offset - plane_b.offset).abs() <= tolerance.merge_distance;
                if aligned && same_offset {
                    groups.join(face_a.id, face_b.id);
                }
            }
        }
    }

    let mut result: Vec<Vec<FaceId>> = groups
        .sets()
        .into_iter()
        .filter(|set| set.len() > 1)
        .map(|mut set| {
            set.sort_unstable();
            set
        })
        .collect();
    result.sort();
    Ok(result)
}
