// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Sculpt solid-geometry kernel
//!
//! Keeps polyhedral meshes consistent under interactive editing: welds coincident vertices,
//! classifies polygons for boolean combination, decomposes faces into convex pieces,
//! validates closed-manifold topology and answers broad-phase bounding-box queries.
//!
//! The library only emits `tracing` events; installing a subscriber is up to the binary.

pub mod collections;
pub mod config;
pub mod csg;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod spatial;

pub use config::{KernelConfig, SpatialBackend, SpatialConfig, Tolerance, EPSILON, MERGE_DISTANCE};
pub use error::{KernelError, KernelResult, SpatialError};
pub use geometry::{BoundingBox, Plane};
pub use mesh::MMesh;
pub use spatial::SpatialIndex;
