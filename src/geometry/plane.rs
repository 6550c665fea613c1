// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Planes described by a unit normal and an offset along it

use super::math3d;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Plane equation `normal · p = offset`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vector3<f32>,
    pub offset: f32,
}

impl Plane {
    /// Plane through `point` with the given normal (normalized here)
    pub fn from_normal_and_point(normal: Vector3<f32>, point: &Point3<f32>) -> Option<Self> {
        let normal = normal.try_normalize(f32::EPSILON)?;
        Some(Self {
            normal,
            offset: normal.dot(&point.coords),
        })
    }

    /// Plane through a triangle, normal following the right-hand rule `(b - a) × (c - a)`.
    ///
    /// The anchor point is the meeting point of two interior angle bisectors rather than
    /// a vertex, which keeps the offset stable for long thin triangles. Returns `None`
    /// for collinear input.
    pub fn from_points(a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> Option<Self> {
        let normal = (b - a).cross(&(c - a)).try_normalize(f32::EPSILON)?;
        let anchor = math3d::bisector_intersection(a, b, c);
        Some(Self {
            normal,
            offset: normal.dot(&anchor.coords),
        })
    }

    /// Positive in front of the plane (the side the normal points to)
    pub fn signed_distance(&self, point: &Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }

    pub fn project(&self, point: &Point3<f32>) -> Point3<f32> {
        point - self.normal * self.signed_distance(point)
    }

    pub fn flipped(&self) -> Plane {
        Plane {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Same orientation and offset within `epsilon`
    pub fn approx_eq(&self, other: &Plane, epsilon: f32) -> bool {
        (self.normal - other.normal).amax() < epsilon && (self.offset - other.offset).abs() < epsilon
    }
}
