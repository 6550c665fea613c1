// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Index of a welded vertex inside the context that created it
pub type CsgVertexId = usize;

/// Welded vertex: one identity per location within a welding context
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CsgVertex {
    pub id: CsgVertexId,
    pub position: Point3<f32>,
}

impl CsgVertex {
    pub fn new(id: CsgVertexId, position: Point3<f32>) -> Self {
        Self { id, position }
    }

    pub fn distance_to(&self, location: &Point3<f32>) -> f32 {
        nalgebra::distance(&self.position, location)
    }
}
