// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygon classification and boolean selection on boxes

use nalgebra::{Point3, Vector3};
use sculpt_kernel::csg::{
    classify_object, BooleanOp, Classification, CsgContext, CsgObject, CsgPolygon, CsgVertex, PolygonStatus,
};
use sculpt_kernel::mesh::has_valid_topology;
use sculpt_kernel::{KernelError, MMesh, SpatialConfig, Tolerance};

fn solid(min: [f32; 3], max: [f32; 3], context: &mut CsgContext) -> anyhow::Result<CsgObject> {
    let mesh = MMesh::cuboid(0, Point3::from(min), Point3::from(max));
    Ok(CsgObject::from_mesh(&mesh, context)?)
}

fn context() -> CsgContext {
    CsgContext::new(Tolerance::default(), &SpatialConfig::default())
}

fn all(classes: &Classification, status: PolygonStatus, polygons: usize) -> bool {
    classes.len() == polygons && classes.count(status) == polygons
}

#[test]
fn test_nested_boxes() -> anyhow::Result<()> {
    let mut ctx = context();
    let outer = solid([0.0, 0.0, 0.0], [4.0, 4.0, 4.0], &mut ctx)?;
    let inner = solid([1.0, 1.0, 1.0], [2.0, 2.0, 2.0], &mut ctx)?;
    let tolerance = Tolerance::default();

    let outer_classes = classify_object(&outer, &inner, &tolerance);
    let inner_classes = classify_object(&inner, &outer, &tolerance);
    assert!(all(&outer_classes, PolygonStatus::Outside, 6));
    assert!(all(&inner_classes, PolygonStatus::Inside, 6));

    let union = BooleanOp::Union.select(&outer, &outer_classes, &inner, &inner_classes);
    assert_eq!(union.len(), 6);

    let intersect = BooleanOp::Intersect.select(&outer, &outer_classes, &inner, &inner_classes);
    assert_eq!(intersect.len(), 6);
    assert!(intersect.iter().all(|p| inner.bounds().contains(p.bounds())));

    // the cavity walls face inwards
    let subtract = BooleanOp::Subtract.select(&outer, &outer_classes, &inner, &inner_classes);
    assert_eq!(subtract.len(), 12);
    let centre = Point3::new(1.5, 1.5, 1.5);
    for wall in subtract.iter().filter(|p| inner.bounds().contains(p.bounds())) {
        assert!(wall.plane().signed_distance(&centre) > 0.0);
    }
    Ok(())
}

#[test]
fn test_split_edge_faces_classify() -> anyhow::Result<()> {
    let mut mesh = MMesh::cuboid(0, Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0));
    let mid = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
    mesh.faces[0].vertex_ids = vec![1, mid, 0, 3, 2];
    mesh.faces[2].vertex_ids = vec![0, mid, 1, 5, 4];
    assert!(has_valid_topology(&mesh));

    let mut ctx = context();
    let inner = CsgObject::from_mesh(&mesh, &mut ctx)?;
    let outer = solid([-1.0, -1.0, -1.0], [3.0, 3.0, 3.0], &mut ctx)?;

    let classes = classify_object(&inner, &outer, &Tolerance::default());
    assert!(all(&classes, PolygonStatus::Inside, 6));
    Ok(())
}

#[test]
fn test_disjoint_boxes_are_outside() -> anyhow::Result<()> {
    let mut ctx = context();
    let left = solid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], &mut ctx)?;
    let right = solid([3.0, 0.0, 0.0], [4.0, 1.0, 1.0], &mut ctx)?;

    let classes = classify_object(&left, &right, &Tolerance::default());
    assert!(all(&classes, PolygonStatus::Outside, 6));
    Ok(())
}

#[test]
fn test_twin_boxes_are_same() -> anyhow::Result<()> {
    let mut ctx = context();
    let a = solid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], &mut ctx)?;
    let b = solid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], &mut ctx)?;
    let tolerance = Tolerance::default();

    let a_classes = classify_object(&a, &b, &tolerance);
    let b_classes = classify_object(&b, &a, &tolerance);
    assert!(all(&a_classes, PolygonStatus::Same, 6));

    // coincident faces survive once
    assert_eq!(BooleanOp::Union.select(&a, &a_classes, &b, &b_classes).len(), 6);
    assert_eq!(BooleanOp::Subtract.select(&a, &a_classes, &b, &b_classes).len(), 0);
    Ok(())
}

#[test]
fn test_unclassified_polygons_are_dropped() -> anyhow::Result<()> {
    let mut ctx = context();
    let a = solid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], &mut ctx)?;
    let b = solid([5.0, 0.0, 0.0], [6.0, 1.0, 1.0], &mut ctx)?;

    let empty = Classification::new();
    for op in [BooleanOp::Union, BooleanOp::Subtract, BooleanOp::Intersect] {
        assert!(op.select(&a, &empty, &b, &empty).is_empty());
    }
    Ok(())
}

#[test]
fn test_invert_twice_restores_polygon() -> anyhow::Result<()> {
    let vertices = vec![
        CsgVertex::new(0, Point3::new(0.0, 0.0, 0.0)),
        CsgVertex::new(1, Point3::new(2.0, 0.0, 1.0)),
        CsgVertex::new(2, Point3::new(2.0, 2.0, 1.0)),
        CsgVertex::new(3, Point3::new(0.0, 2.0, 0.0)),
    ];
    let polygon = CsgPolygon::new(vertices, 4, &Tolerance::default())?;

    let flipped = polygon.invert();
    assert!((flipped.normal() + polygon.normal()).norm() < 1e-6);
    assert_eq!(flipped.barycenter(), polygon.barycenter());
    assert_eq!(flipped.invert(), polygon);
    Ok(())
}

#[test]
fn test_degenerate_polygons_are_rejected() {
    let tolerance = Tolerance::default();
    let collinear = vec![
        CsgVertex::new(0, Point3::new(0.0, 0.0, 0.0)),
        CsgVertex::new(1, Point3::new(1.0, 0.0, 0.0)),
        CsgVertex::new(2, Point3::new(2.0, 0.0, 0.0)),
    ];
    assert!(matches!(
        CsgPolygon::new(collinear, 0, &tolerance),
        Err(KernelError::DegenerateGeometry(_))
    ));

    let repeated = vec![
        CsgVertex::new(0, Point3::new(0.0, 0.0, 0.0)),
        CsgVertex::new(0, Point3::new(0.0, 0.0, 0.0)),
        CsgVertex::new(1, Point3::new(1.0, 0.0, 0.0)),
    ];
    assert!(matches!(
        CsgPolygon::with_normal(repeated, Vector3::z(), 0, &tolerance),
        Err(KernelError::MalformedPolygon(_))
    ));
}

#[test]
fn test_operation_names() {
    assert_eq!(BooleanOp::from_str("Difference"), Some(BooleanOp::Subtract));
    assert_eq!(BooleanOp::from_str("intersect"), Some(BooleanOp::Intersect));
    assert_eq!(BooleanOp::from_str("xor"), None);
}
