// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Stateless point, vector, plane and quaternion helpers

use super::Plane;
use crate::error::{KernelError, KernelResult};
use nalgebra::{Point3, Quaternion, UnitQuaternion, Vector3};

/// Result of a ray hitting a triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the (not necessarily unit) direction vector
    pub distance: f32,
    pub point: Point3<f32>,
}

/// Closest points between two infinite lines `p1 + s·d1` and `p2 + t·d2`.
/// Returns `None` when the lines are parallel.
pub fn closest_points_on_lines(
    p1: &Point3<f32>,
    d1: &Vector3<f32>,
    p2: &Point3<f32>,
    d2: &Vector3<f32>,
) -> Option<(Point3<f32>, Point3<f32>)> {
    let a = d1.dot(d1);
    let b = d1.dot(d2);
    let e = d2.dot(d2);
    let r = p1 - p2;
    let c = d1.dot(&r);
    let f = d2.dot(&r);

    let denom = a * e - b * b;
    if denom.abs() <= f32::EPSILON * a * e {
        return None;
    }

    let s = (b * f - c * e) / denom;
    let t = (a * f - b * c) / denom;
    Some((p1 + d1 * s, p2 + d2 * t))
}

/// Meeting point of the interior angle bisectors at `a` and `b` (the incenter).
///
/// Solved as a closest-point problem between the two bisector lines so rounding
/// never makes the "intersection" miss; near-parallel bisectors fall back to the centroid.
pub fn bisector_intersection(a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> Point3<f32> {
    let bisector_a = (b - a).normalize() + (c - a).normalize();
    let bisector_b = (a - b).normalize() + (c - b).normalize();

    match closest_points_on_lines(a, &bisector_a, b, &bisector_b) {
        Some((on_a, on_b)) if on_a.coords.iter().chain(on_b.coords.iter()).all(|v| v.is_finite()) => {
            nalgebra::center(&on_a, &on_b)
        }
        _ => centroid(&[*a, *b, *c]).unwrap_or(*a),
    }
}

/// Project a point onto a plane
pub fn project_point_on_plane(point: &Point3<f32>, plane: &Plane) -> Point3<f32> {
    plane.project(point)
}

/// Signed distance; positive on the side the plane normal points to
pub fn signed_distance_to_plane(point: &Point3<f32>, plane: &Plane) -> f32 {
    plane.signed_distance(point)
}

/// Turn direction at `current` relative to `normal`: `((current - prev) × (next - current)) · normal`
pub fn vertex_convexity(
    prev: &Point3<f32>,
    current: &Point3<f32>,
    next: &Point3<f32>,
    normal: &Vector3<f32>,
) -> f32 {
    (current - prev).cross(&(next - current)).dot(normal)
}

/// A vertex is convex when its incident edges turn the same way as the face normal
pub fn is_convex_vertex(
    prev: &Point3<f32>,
    current: &Point3<f32>,
    next: &Point3<f32>,
    normal: &Vector3<f32>,
) -> bool {
    vertex_convexity(prev, current, next, normal) > 0.0
}

/// Barycentric `(v, w)` with `p = a + v·(b - a) + w·(c - a)`.
///
/// # Panics
/// Panics on a zero-area triangle; callers must reject degenerate triangles first.
pub fn barycentric(p: &Point3<f32>, a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> (f32, f32) {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;

    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);

    let denom = d00 * d11 - d01 * d01;
    assert!(
        denom.abs() > f32::EPSILON * d00 * d11,
        "barycentric coordinates requested for a degenerate triangle"
    );

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    (v, w)
}

/// Inclusive point-in-triangle test for a point already lying in the triangle's plane
pub fn point_in_triangle(p: &Point3<f32>, a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> bool {
    point_in_triangle_with_tolerance(p, a, b, c, 0.0)
}

/// Point-in-triangle test that also accepts points up to `tolerance` (in barycentric units) outside
pub fn point_in_triangle_with_tolerance(
    p: &Point3<f32>,
    a: &Point3<f32>,
    b: &Point3<f32>,
    c: &Point3<f32>,
    tolerance: f32,
) -> bool {
    let (v, w) = barycentric(p, a, b, c);
    v >= -tolerance && w >= -tolerance && v + w <= 1.0 + tolerance
}

/// Ray/triangle intersection using the triangle's known normal.
///
/// Intersects the supporting plane, then keeps the hit only if it lies on the inner side of
/// all three edges. Points exactly on an edge count as inside. Hits behind the origin are ignored.
pub fn ray_triangle_intersection(
    origin: &Point3<f32>,
    direction: &Vector3<f32>,
    a: &Point3<f32>,
    b: &Point3<f32>,
    c: &Point3<f32>,
    normal: &Vector3<f32>,
) -> Option<RayHit> {
    let denom = normal.dot(direction);
    if denom.abs() < f32::EPSILON {
        return None;
    }

    let distance = normal.dot(&(a - origin)) / denom;
    if distance < 0.0 {
        return None;
    }
    let point = origin + direction * distance;

    let side_ab = (b - a).cross(&(point - a)).dot(normal);
    let side_bc = (c - b).cross(&(point - b)).dot(normal);
    let side_ca = (a - c).cross(&(point - c)).dot(normal);

    let inside = (side_ab >= 0.0 && side_bc >= 0.0 && side_ca >= 0.0)
        || (side_ab <= 0.0 && side_bc <= 0.0 && side_ca <= 0.0);
    inside.then_some(RayHit { distance, point })
}

/// Arithmetic mean of a set of points
pub fn centroid(points: &[Point3<f32>]) -> Option<Point3<f32>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f32))
}

/// Area-weighted normal of a closed loop (Newell's method); `None` for degenerate loops
pub fn polygon_normal(points: &[Point3<f32>]) -> Option<Vector3<f32>> {
    if points.len() < 3 {
        return None;
    }
    let mut normal = Vector3::zeros();
    for (i, current) in points.iter().enumerate() {
        let next = &points[(i + 1) % points.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal.try_normalize(f32::EPSILON)
}

/// Area enclosed by a planar loop
pub fn polygon_area(points: &[Point3<f32>]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = Vector3::zeros();
    for (i, current) in points.iter().enumerate() {
        let next = &points[(i + 1) % points.len()];
        twice_area += current.coords.cross(&next.coords);
    }
    twice_area.norm() / 2.0
}

pub fn triangle_area(a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> f32 {
    (b - a).cross(&(c - a)).norm() / 2.0
}

/// Two unit vectors spanning the plane orthogonal to `normal`, with `u × v = normal`
pub fn orthonormal_basis(normal: &Vector3<f32>) -> (Vector3<f32>, Vector3<f32>) {
    let n = normal.normalize();
    let helper = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = helper.cross(&n).normalize();
    let v = n.cross(&u);
    (u, v)
}

/// A rotation quaternion must have unit squared magnitude within `epsilon`
pub fn is_valid_rotation(q: &Quaternion<f32>, epsilon: f32) -> bool {
    (q.norm_squared() - 1.0).abs() < epsilon
}

/// Rescale a quaternion to unit length
pub fn normalize_quaternion(q: &Quaternion<f32>) -> KernelResult<UnitQuaternion<f32>> {
    let norm_squared = q.norm_squared();
    if !norm_squared.is_finite() || norm_squared < f32::EPSILON {
        return Err(KernelError::InvalidQuaternion(norm_squared));
    }
    Ok(UnitQuaternion::new_normalize(*q))
}
