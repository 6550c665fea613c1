// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Convex planar polygons of a CSG solid

use super::vertex::CsgVertex;
use crate::config::Tolerance;
use crate::error::{KernelError, KernelResult};
use crate::geometry::{math3d, BoundingBox, Plane};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Convex, coplanar loop of welded vertices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsgPolygon {
    vertices: Vec<CsgVertex>,
    plane: Plane,
    /// Vertex bounds padded by epsilon
    bounds: BoundingBox,
    barycenter: Point3<f32>,
    material: i32,
}

impl CsgPolygon {
    /// Polygon whose plane comes from the first non-collinear fan triangle `(v0, vi, vi+1)`.
    ///
    /// Points lying on an edge, as left behind by edge splits, are skipped over.
    pub fn new(vertices: Vec<CsgVertex>, material: i32, tolerance: &Tolerance) -> KernelResult<Self> {
        Self::check_loop(&vertices)?;
        let first = vertices[0].position;
        let plane = vertices
            .windows(2)
            .skip(1)
            .find_map(|pair| Plane::from_points(&first, &pair[0].position, &pair[1].position))
            .ok_or_else(|| {
                KernelError::DegenerateGeometry(format!("all {} vertices are collinear", vertices.len()))
            })?;
        Ok(Self::assemble(vertices, plane, material, tolerance))
    }

    /// Polygon with an explicit normal, anchored at the first vertex
    pub fn with_normal(
        vertices: Vec<CsgVertex>,
        normal: Vector3<f32>,
        material: i32,
        tolerance: &Tolerance,
    ) -> KernelResult<Self> {
        Self::check_loop(&vertices)?;
        let plane = Plane::from_normal_and_point(normal, &vertices[0].position)
            .ok_or_else(|| KernelError::DegenerateGeometry("zero-length normal".into()))?;
        Ok(Self::assemble(vertices, plane, material, tolerance))
    }

    fn check_loop(vertices: &[CsgVertex]) -> KernelResult<()> {
        if vertices.len() < 3 {
            return Err(KernelError::MalformedPolygon(format!(
                "{} vertices, need at least 3",
                vertices.len()
            )));
        }
        let n = vertices.len();
        if let Some(i) = (0..n).find(|&i| vertices[i].id == vertices[(i + 1) % n].id) {
            return Err(KernelError::MalformedPolygon(format!(
                "vertex {} repeats consecutively",
                vertices[i].id
            )));
        }
        Ok(())
    }

    fn assemble(vertices: Vec<CsgVertex>, plane: Plane, material: i32, tolerance: &Tolerance) -> Self {
        let positions: Vec<Point3<f32>> = vertices.iter().map(|v| v.position).collect();
        let bounds = BoundingBox::from_points(&positions).padded(tolerance.epsilon);
        // non-empty loop, so the centroid always exists
        let barycenter = math3d::centroid(&positions).unwrap_or(positions[0]);
        Self {
            vertices,
            plane,
            bounds,
            barycenter,
            material,
        }
    }

    pub fn vertices(&self) -> &[CsgVertex] {
        &self.vertices
    }

    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    pub fn normal(&self) -> Vector3<f32> {
        self.plane.normal
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn barycenter(&self) -> Point3<f32> {
        self.barycenter
    }

    pub fn material(&self) -> i32 {
        self.material
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = Point3<f32>> + '_ {
        self.vertices.iter().map(|v| v.position)
    }

    /// Same polygon facing the other way: reversed winding, flipped plane
    pub fn invert(&self) -> CsgPolygon {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        CsgPolygon {
            vertices,
            plane: self.plane.flipped(),
            bounds: self.bounds,
            barycenter: self.barycenter,
            material: self.material,
        }
    }

    /// Fan triangles `(v0, vi, vi+1)` covering the polygon
    pub fn fan(&self) -> impl Iterator<Item = [Point3<f32>; 3]> + '_ {
        let first = self.vertices[0].position;
        self.vertices
            .windows(2)
            .skip(1)
            .map(move |pair| [first, pair[0].position, pair[1].position])
    }

    /// Point in the polygon's plane lying inside or within `epsilon` of the loop
    pub fn contains_coplanar_point(&self, point: &Point3<f32>, epsilon: f32) -> bool {
        let n = self.vertices.len();
        (0..n).all(|i| {
            let a = self.vertices[i].position;
            let b = self.vertices[(i + 1) % n].position;
            let edge = b - a;
            let length = edge.norm();
            if length <= f32::EPSILON {
                return true;
            }
            edge.cross(&(point - a)).dot(&self.plane.normal) >= -epsilon * length
        })
    }
}
