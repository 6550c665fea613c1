// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face decomposition into convex pieces or triangles

use super::VertexId;
use crate::config::Tolerance;
use crate::error::{KernelError, KernelResult};
use crate::geometry::math3d;
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// Position lookup by vertex id
pub trait VertexPositions {
    fn position(&self, id: VertexId) -> Option<Point3<f32>>;
}

impl VertexPositions for AHashMap<VertexId, Point3<f32>> {
    fn position(&self, id: VertexId) -> Option<Point3<f32>> {
        self.get(&id).copied()
    }
}

/// Ids are indices into the slice
impl VertexPositions for [Point3<f32>] {
    fn position(&self, id: VertexId) -> Option<Point3<f32>> {
        self.get(id).copied()
    }
}

impl VertexPositions for Vec<Point3<f32>> {
    fn position(&self, id: VertexId) -> Option<Point3<f32>> {
        self.get(id).copied()
    }
}

fn resolve<P>(ids: &[VertexId], positions: &P) -> KernelResult<Vec<Point3<f32>>>
where
    P: VertexPositions + ?Sized,
{
    ids.iter()
        .map(|&id| positions.position(id).ok_or(KernelError::MissingVertex(id)))
        .collect()
}

/// True when no vertex of the loop turns against `normal`.
///
/// Collinear vertices (turn within `epsilon` of zero) count as convex.
pub fn is_convex_loop(points: &[Point3<f32>], normal: &Vector3<f32>, epsilon: f32) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    (0..n).all(|i| {
        let prev = &points[(i + n - 1) % n];
        let current = &points[i];
        let next = &points[(i + 1) % n];
        let scale = (current - prev).norm() * (next - current).norm();
        math3d::vertex_convexity(prev, current, next, normal) >= -epsilon * scale
    })
}

/// Split a face loop with optional holes into convex pieces.
///
/// A hole-free convex border comes back unchanged as the only piece; anything else is
/// triangulated. Pieces keep the border's winding.
pub fn decompose<P>(
    border: &[VertexId],
    holes: &[Vec<VertexId>],
    positions: &P,
    tolerance: &Tolerance,
) -> KernelResult<Vec<Vec<VertexId>>>
where
    P: VertexPositions + ?Sized,
{
    if border.len() < 3 {
        return Err(KernelError::MalformedPolygon(format!(
            "border has {} vertices",
            border.len()
        )));
    }

    if holes.is_empty() {
        if border.len() == 3 {
            return Ok(vec![border.to_vec()]);
        }

        let points = resolve(border, positions)?;
        let normal = math3d::polygon_normal(&points)
            .ok_or_else(|| KernelError::DegenerateGeometry("border has zero area".into()))?;
        if is_convex_loop(&points, &normal, tolerance.epsilon) {
            return Ok(vec![border.to_vec()]);
        }
        debug!(vertices = border.len(), "concave border, triangulating");
    } else {
        debug!(vertices = border.len(), holes = holes.len(), "holed border, triangulating");
    }

    Ok(triangulate(border, holes, positions)?
        .into_iter()
        .map(|triangle| triangle.to_vec())
        .collect())
}

/// Triangulate a planar loop with holes.
///
/// Triangles are wound like the border, and their union covers the border minus the holes.
/// Hole winding does not matter.
pub fn triangulate<P>(
    border: &[VertexId],
    holes: &[Vec<VertexId>],
    positions: &P,
) -> KernelResult<Vec<[VertexId; 3]>>
where
    P: VertexPositions + ?Sized,
{
    if border.len() < 3 {
        return Err(KernelError::MalformedPolygon(format!(
            "border has {} vertices",
            border.len()
        )));
    }

    let border_points = resolve(border, positions)?;
    let normal = math3d::polygon_normal(&border_points)
        .ok_or_else(|| KernelError::DegenerateGeometry("border has zero area".into()))?;
    let (u, v) = math3d::orthonormal_basis(&normal);
    let origin = border_points[0];

    // flattened 2D coordinates plus a lookup back to vertex ids
    let total = border.len() + holes.iter().map(Vec::len).sum::<usize>();
    let mut coords: Vec<f64> = Vec::with_capacity(total * 2);
    let mut lookup: Vec<VertexId> = Vec::with_capacity(total);
    let mut hole_starts: Vec<usize> = Vec::with_capacity(holes.len());

    let push_loop = |ids: &[VertexId],
                     points: &[Point3<f32>],
                     coords: &mut Vec<f64>,
                     lookup: &mut Vec<VertexId>| {
        for (&id, point) in ids.iter().zip(points) {
            let offset = point - origin;
            coords.push(offset.dot(&u) as f64);
            coords.push(offset.dot(&v) as f64);
            lookup.push(id);
        }
    };

    push_loop(border, &border_points, &mut coords, &mut lookup);
    for hole in holes {
        if hole.len() < 3 {
            return Err(KernelError::MalformedPolygon(format!(
                "hole has {} vertices",
                hole.len()
            )));
        }
        let hole_points = resolve(hole, positions)?;
        hole_starts.push(lookup.len());
        push_loop(hole, &hole_points, &mut coords, &mut lookup);
    }

    let indices = earcutr::earcut(&coords, &hole_starts, 2)
        .map_err(|e| KernelError::Triangulation(format!("{e:?}")))?;
    if indices.len() < 3 || indices.len() % 3 != 0 {
        return Err(KernelError::Triangulation(format!(
            "triangulator returned {} indices",
            indices.len()
        )));
    }

    let signed_area = |a: usize, b: usize, c: usize| {
        let (ax, ay) = (coords[2 * a], coords[2 * a + 1]);
        let (bx, by) = (coords[2 * b], coords[2 * b + 1]);
        let (cx, cy) = (coords[2 * c], coords[2 * c + 1]);
        (bx - ax) * (cy - ay) - (cx - ax) * (by - ay)
    };

    // the border is counter-clockwise in (u, v) since u × v is its own normal
    Ok(indices
        .chunks_exact(3)
        .map(|tri| {
            let (a, b, c) = (tri[0], tri[1], tri[2]);
            if signed_area(a, b, c) < 0.0 {
                [lookup[a], lookup[c], lookup[b]]
            } else {
                [lookup[a], lookup[b], lookup[c]]
            }
        })
        .collect())
}
