// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Convex decomposition of face loops

use approx::assert_relative_eq;
use nalgebra::Point3;
use proptest::prelude::*;
use sculpt_kernel::geometry::math3d;
use sculpt_kernel::mesh::{decompose, triangulate, VertexId};
use sculpt_kernel::{KernelError, Tolerance};

fn area_of(pieces: &[Vec<VertexId>], points: &[Point3<f32>]) -> f32 {
    pieces
        .iter()
        .map(|piece| {
            let loop_points: Vec<Point3<f32>> = piece.iter().map(|&id| points[id]).collect();
            math3d::polygon_area(&loop_points)
        })
        .sum()
}

/// Tilted copy of the plane z = 0, so the projection path is exercised
fn tilt(x: f32, y: f32) -> Point3<f32> {
    Point3::new(x, y * 0.6, y * 0.8)
}

#[test]
fn test_convex_quad_is_returned_unchanged() -> anyhow::Result<()> {
    let points = vec![tilt(0.0, 0.0), tilt(3.0, 0.0), tilt(3.5, 2.0), tilt(-0.5, 2.0)];
    let pieces = decompose(&[0, 1, 2, 3], &[], &points, &Tolerance::default())?;
    assert_eq!(pieces, vec![vec![0, 1, 2, 3]]);
    Ok(())
}

#[test]
fn test_concave_loop_conserves_area() -> anyhow::Result<()> {
    // arrow head pointing right with a notch on the left
    let points = vec![
        tilt(0.0, 0.0),
        tilt(4.0, 2.0),
        tilt(0.0, 4.0),
        tilt(1.5, 2.0),
    ];
    let border = [0, 1, 2, 3];
    let pieces = decompose(&border, &[], &points, &Tolerance::default())?;

    assert!(pieces.len() >= 2);
    let expected = math3d::polygon_area(&points);
    assert_relative_eq!(area_of(&pieces, &points), expected, epsilon = 1e-4);
    for piece in &pieces {
        assert!(piece.iter().all(|id| border.contains(id)));
    }
    Ok(())
}

#[test]
fn test_pieces_keep_border_winding() -> anyhow::Result<()> {
    let points = vec![
        tilt(0.0, 0.0),
        tilt(2.0, 0.0),
        tilt(2.0, 1.0),
        tilt(1.0, 1.0),
        tilt(1.0, 2.0),
        tilt(0.0, 2.0),
    ];
    let border: Vec<VertexId> = (0..6).collect();
    let normal = math3d::polygon_normal(&points).expect("planar loop");

    for piece in decompose(&border, &[], &points, &Tolerance::default())? {
        let loop_points: Vec<Point3<f32>> = piece.iter().map(|&id| points[id]).collect();
        let piece_normal = math3d::polygon_normal(&loop_points).expect("non-degenerate piece");
        assert!(piece_normal.dot(&normal) > 0.99);
    }
    Ok(())
}

#[test]
fn test_square_with_hole_conserves_area() -> anyhow::Result<()> {
    let points = vec![
        tilt(0.0, 0.0),
        tilt(4.0, 0.0),
        tilt(4.0, 4.0),
        tilt(0.0, 4.0),
        tilt(1.0, 1.0),
        tilt(3.0, 1.0),
        tilt(3.0, 3.0),
        tilt(1.0, 3.0),
    ];
    let border = vec![0, 1, 2, 3];
    let hole = vec![4, 5, 6, 7];

    let pieces = decompose(&border, &[hole], &points, &Tolerance::default())?;
    assert_relative_eq!(area_of(&pieces, &points), 12.0, epsilon = 1e-3);
    assert!(pieces.iter().flatten().all(|&id| id < points.len()));
    Ok(())
}

#[test]
fn test_hole_winding_is_irrelevant() -> anyhow::Result<()> {
    let points = vec![
        tilt(0.0, 0.0),
        tilt(4.0, 0.0),
        tilt(4.0, 4.0),
        tilt(0.0, 4.0),
        tilt(1.0, 1.0),
        tilt(1.0, 3.0),
        tilt(3.0, 3.0),
        tilt(3.0, 1.0),
    ];
    let triangles = triangulate(&[0, 1, 2, 3], &[vec![4, 5, 6, 7]], &points)?;
    let pieces: Vec<Vec<VertexId>> = triangles.iter().map(|t| t.to_vec()).collect();
    assert_relative_eq!(area_of(&pieces, &points), 12.0, epsilon = 1e-3);
    Ok(())
}

#[test]
fn test_short_border_is_rejected() {
    let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
    let result = decompose(&[0, 1], &[], &points, &Tolerance::default());
    assert!(matches!(result, Err(KernelError::MalformedPolygon(_))));
}

/// Loop around the origin with one vertex per evenly spaced angle
fn star(radii: &[f32]) -> Vec<Point3<f32>> {
    let n = radii.len() as f32;
    radii
        .iter()
        .enumerate()
        .map(|(i, radius)| {
            let angle = i as f32 / n * std::f32::consts::TAU;
            tilt(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_star_loops_conserve_area(radii in prop::collection::vec(1.0f32..4.0, 3..24)) {
        let points = star(&radii);
        let border: Vec<VertexId> = (0..points.len()).collect();

        let pieces = decompose(&border, &[], &points, &Tolerance::default()).unwrap();
        let expected = math3d::polygon_area(&points);
        prop_assert!((area_of(&pieces, &points) - expected).abs() <= expected * 1e-3);
        prop_assert!(pieces.iter().flatten().all(|id| border.contains(id)));
    }

    #[test]
    fn prop_holed_star_loops_conserve_area(
        radii in prop::collection::vec(1.0f32..4.0, 3..24),
        reversed_hole in any::<bool>(),
    ) {
        let mut points = star(&radii);
        let border: Vec<VertexId> = (0..points.len()).collect();

        // small square hole at the centre, clear of every border edge
        let first = points.len();
        points.extend([
            tilt(-0.2, -0.2),
            tilt(0.2, -0.2),
            tilt(0.2, 0.2),
            tilt(-0.2, 0.2),
        ]);
        let mut hole: Vec<VertexId> = (first..first + 4).collect();
        if reversed_hole {
            hole.reverse();
        }

        let pieces = decompose(&border, &[hole], &points, &Tolerance::default()).unwrap();
        let expected = math3d::polygon_area(&points[..first]) - 0.16;
        prop_assert!((area_of(&pieces, &points) - expected).abs() <= expected * 1e-3);
        prop_assert!(pieces.iter().flatten().all(|&id| id < points.len()));
    }
}
