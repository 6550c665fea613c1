// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygon classification for CSG operations
//! Determines whether polygons of one solid lie inside, outside or on the boundary of another

use super::object::CsgObject;
use super::polygon::CsgPolygon;
use crate::config::Tolerance;
use crate::geometry::math3d;
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Position of a polygon relative to another solid's boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PolygonStatus {
    /// Not classified yet
    #[default]
    Unknown,
    Inside,
    Outside,
    /// On the boundary, facing the same way as the boundary there
    Same,
    /// On the boundary, facing the opposite way
    Opposite,
}

impl PolygonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolygonStatus::Unknown => "unknown",
            PolygonStatus::Inside => "inside",
            PolygonStatus::Outside => "outside",
            PolygonStatus::Same => "same",
            PolygonStatus::Opposite => "opposite",
        }
    }
}

/// Statuses of one solid's polygons for a single boolean operation, keyed by polygon index.
/// Missing entries read as [`PolygonStatus::Unknown`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    statuses: AHashMap<usize, PolygonStatus>,
}

impl Classification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, polygon: usize) -> PolygonStatus {
        self.statuses.get(&polygon).copied().unwrap_or_default()
    }

    pub fn set(&mut self, polygon: usize, status: PolygonStatus) {
        self.statuses.insert(polygon, status);
    }

    /// Forget every status
    pub fn reset(&mut self) {
        self.statuses.clear();
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Number of polygons with the given status
    pub fn count(&self, status: PolygonStatus) -> usize {
        self.statuses.values().filter(|s| **s == status).count()
    }
}

impl FromIterator<(usize, PolygonStatus)> for Classification {
    fn from_iter<I: IntoIterator<Item = (usize, PolygonStatus)>>(iter: I) -> Self {
        Self {
            statuses: iter.into_iter().collect(),
        }
    }
}

/// Which operand of a boolean operation a polygon came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    A,
    B,
}

/// What happens to a classified polygon in the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Retention {
    Keep,
    /// Keep with reversed winding
    KeepInverted,
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanOp {
    Union,
    Subtract,
    Intersect,
}

impl BooleanOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanOp::Union => "union",
            BooleanOp::Subtract => "subtract",
            BooleanOp::Intersect => "intersect",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "union" => Some(BooleanOp::Union),
            "subtract" | "difference" => Some(BooleanOp::Subtract),
            "intersect" | "intersection" => Some(BooleanOp::Intersect),
            _ => None,
        }
    }

    /// Keep/drop rule for `A op B`. Coincident faces survive once, from operand A.
    /// Unclassified polygons are always dropped.
    pub fn retention(&self, operand: Operand, status: PolygonStatus) -> Retention {
        use PolygonStatus::*;
        match (self, operand, status) {
            (_, _, Unknown) => Retention::Drop,

            (BooleanOp::Union, Operand::A, Outside | Same) => Retention::Keep,
            (BooleanOp::Union, Operand::B, Outside) => Retention::Keep,

            (BooleanOp::Subtract, Operand::A, Outside | Opposite) => Retention::Keep,
            (BooleanOp::Subtract, Operand::B, Inside) => Retention::KeepInverted,

            (BooleanOp::Intersect, Operand::A, Inside | Same) => Retention::Keep,
            (BooleanOp::Intersect, Operand::B, Inside) => Retention::Keep,

            _ => Retention::Drop,
        }
    }

    /// Polygons surviving `a op b`, given both classifications.
    ///
    /// Polygons are taken whole, so both solids should already be split along their intersection.
    pub fn select(
        &self,
        a: &CsgObject,
        a_classes: &Classification,
        b: &CsgObject,
        b_classes: &Classification,
    ) -> Vec<CsgPolygon> {
        let mut result = Vec::new();
        for (operand, object, classes) in [(Operand::A, a, a_classes), (Operand::B, b, b_classes)] {
            for (index, polygon) in object.polygons().iter().enumerate() {
                match self.retention(operand, classes.get(index)) {
                    Retention::Keep => result.push(polygon.clone()),
                    Retention::KeepInverted => result.push(polygon.invert()),
                    Retention::Drop => {}
                }
            }
        }
        result
    }
}

/// Classify every polygon of `object` against `other`
pub fn classify_object(object: &CsgObject, other: &CsgObject, tolerance: &Tolerance) -> Classification {
    object
        .polygons()
        .par_iter()
        .enumerate()
        .map(|(index, polygon)| (index, classify_polygon(polygon, other, tolerance)))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

/// Classify one polygon against a closed solid.
///
/// A polygon lying on one of `other`'s polygons is Same or Opposite depending on the
/// normals. Otherwise a ray from its barycenter decides Inside or Outside by crossing parity.
pub fn classify_polygon(polygon: &CsgPolygon, other: &CsgObject, tolerance: &Tolerance) -> PolygonStatus {
    if !polygon.bounds().intersects(other.bounds()) {
        return PolygonStatus::Outside;
    }

    let barycenter = polygon.barycenter();
    let epsilon = tolerance.epsilon;

    for candidate in other.polygons() {
        if !candidate.bounds().intersects(polygon.bounds()) {
            continue;
        }
        let alignment = candidate.normal().dot(&polygon.normal());
        if alignment.abs() < 1.0 - epsilon {
            continue;
        }
        if candidate.plane().signed_distance(&barycenter).abs() > epsilon {
            continue;
        }
        if candidate.contains_coplanar_point(&barycenter, epsilon) {
            return if alignment > 0.0 {
                PolygonStatus::Same
            } else {
                PolygonStatus::Opposite
            };
        }
    }

    if is_point_inside(&barycenter, &polygon.normal(), other, epsilon) {
        PolygonStatus::Inside
    } else {
        PolygonStatus::Outside
    }
}

/// Ray directions tried in turn until one avoids grazing an edge or a face plane
fn ray_directions(primary: &Vector3<f32>) -> impl Iterator<Item = Vector3<f32>> + '_ {
    const NUDGES: [[f32; 3]; 6] = [
        [0.0, 0.0, 0.0],
        [0.13, 0.07, -0.05],
        [-0.11, 0.17, 0.03],
        [0.05, -0.09, 0.19],
        [0.31, 0.23, 0.29],
        [-0.27, -0.19, 0.37],
    ];
    NUDGES.iter().filter_map(move |nudge| {
        (primary + Vector3::new(nudge[0], nudge[1], nudge[2])).try_normalize(f32::EPSILON)
    })
}

/// Crossing-parity test against the polygons of a closed solid
fn is_point_inside(point: &Point3<f32>, primary: &Vector3<f32>, solid: &CsgObject, epsilon: f32) -> bool {
    let mut last_count = 0;
    for direction in ray_directions(primary) {
        match count_crossings(point, &direction, solid, epsilon) {
            Some(count) => return count % 2 == 1,
            None => last_count = count_crossings_lenient(point, &direction, solid),
        }
    }
    last_count % 2 == 1
}

/// Crossings along one ray, or `None` if the ray grazes a polygon edge or plane
fn count_crossings(point: &Point3<f32>, direction: &Vector3<f32>, solid: &CsgObject, epsilon: f32) -> Option<usize> {
    let mut count = 0;
    for polygon in solid.polygons() {
        let normal = polygon.normal();
        let facing = normal.dot(direction);
        let distance = polygon.plane().signed_distance(point);
        if facing.abs() < epsilon {
            if distance.abs() < epsilon {
                return None;
            }
            continue;
        }

        let Some(hit) = ray_hits_polygon(point, direction, polygon) else {
            continue;
        };
        if hit.distance < epsilon || near_boundary(&hit.point, polygon, epsilon) {
            return None;
        }
        count += 1;
    }
    Some(count)
}

fn count_crossings_lenient(point: &Point3<f32>, direction: &Vector3<f32>, solid: &CsgObject) -> usize {
    solid
        .polygons()
        .iter()
        .filter(|polygon| ray_hits_polygon(point, direction, polygon).is_some())
        .count()
}

fn ray_hits_polygon(point: &Point3<f32>, direction: &Vector3<f32>, polygon: &CsgPolygon) -> Option<math3d::RayHit> {
    let normal = polygon.normal();
    polygon
        .fan()
        .find_map(|[a, b, c]| math3d::ray_triangle_intersection(point, direction, &a, &b, &c, &normal))
}

/// Within `epsilon` of one of the polygon's edges
fn near_boundary(point: &Point3<f32>, polygon: &CsgPolygon, epsilon: f32) -> bool {
    let vertices = polygon.vertices();
    let n = vertices.len();
    (0..n).any(|i| {
        let a = vertices[i].position;
        let b = vertices[(i + 1) % n].position;
        distance_to_segment(point, &a, &b) < epsilon
    })
}

fn distance_to_segment(point: &Point3<f32>, a: &Point3<f32>, b: &Point3<f32>) -> f32 {
    let ab = b - a;
    let length_squared = ab.norm_squared();
    if length_squared <= f32::EPSILON {
        return nalgebra::distance(point, a);
    }
    let t = ((point - a).dot(&ab) / length_squared).clamp(0.0, 1.0);
    nalgebra::distance(point, &(a + ab * t))
}
