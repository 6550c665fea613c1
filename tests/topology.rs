// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closed-manifold validation and coplanar face grouping

use nalgebra::Point3;
use sculpt_kernel::mesh::{
    group_coplanar_faces, has_valid_topology, validate_meshes, validate_topology, Edge, TopologyIssue,
};
use sculpt_kernel::{MMesh, Tolerance};

#[test]
fn test_closed_solids_validate() {
    assert!(has_valid_topology(&MMesh::tetrahedron(0)));
    assert!(has_valid_topology(&MMesh::cuboid(
        1,
        Point3::new(-1.0, -1.0, -1.0),
        Point3::new(1.0, 1.0, 1.0)
    )));
}

#[test]
fn test_missing_face_opens_three_edges() {
    let mut mesh = MMesh::tetrahedron(0);
    mesh.faces.pop();

    let report = validate_topology(&mesh);
    assert!(!report.valid);

    let open: Vec<&Edge> = report.open_edges().collect();
    assert_eq!(open.len(), 3);
    assert!(report
        .issues
        .iter()
        .all(|issue| matches!(issue, TopologyIssue::OpenEdge { .. })));
}

#[test]
fn test_validation_does_not_modify_mesh() {
    let mut mesh = MMesh::tetrahedron(0);
    mesh.faces.remove(1);
    let before = mesh.clone();
    let _ = validate_topology(&mesh);
    assert_eq!(mesh, before);
}

#[test]
fn test_flipped_face_is_reported() {
    let mut mesh = MMesh::cuboid(0, Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
    mesh.faces[2].vertex_ids.reverse();

    let report = validate_topology(&mesh);
    assert!(!report.valid);
    assert!(report
        .issues
        .iter()
        .any(|issue| matches!(issue, TopologyIssue::DuplicateDirectedEdge { .. })));
}

#[test]
fn test_stray_vertex_is_reported() {
    let mut mesh = MMesh::tetrahedron(0);
    let stray = mesh.add_vertex(Point3::new(5.0, 5.0, 5.0));

    let report = validate_topology(&mesh);
    assert_eq!(report.issues, vec![TopologyIssue::UnreferencedVertex { vertex: stray }]);
}

#[test]
fn test_batch_validation_keeps_order() {
    let mut open = MMesh::tetrahedron(1);
    open.faces.pop();
    let meshes = vec![MMesh::tetrahedron(0), open, MMesh::tetrahedron(2)];

    let reports = validate_meshes(&meshes);
    let ids: Vec<usize> = reports.iter().map(|r| r.mesh_id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(
        reports.iter().map(|r| r.valid).collect::<Vec<_>>(),
        vec![true, false, true]
    );
}

#[test]
fn test_report_serializes_to_json() -> anyhow::Result<()> {
    let mut mesh = MMesh::tetrahedron(3);
    mesh.faces.pop();
    let json = serde_json::to_string(&validate_topology(&mesh))?;
    assert!(json.contains("\"kind\":\"open_edge\""));
    assert!(json.contains("\"mesh_id\":3"));
    Ok(())
}

#[test]
fn test_cuboid_faces_are_not_coplanar() -> anyhow::Result<()> {
    let mesh = MMesh::cuboid(0, Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
    assert!(group_coplanar_faces(&mesh, &Tolerance::default())?.is_empty());
    Ok(())
}
