// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - bounds, planes and stateless 3D math

mod bbox;
pub mod math3d;
mod plane;

pub use bbox::BoundingBox;
pub use math3d::RayHit;
pub use plane::Plane;
