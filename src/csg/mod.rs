// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Constructive solid geometry model
//!
//! Solids are built per boolean operation: vertices are welded through a [`CsgContext`],
//! faces become convex [`CsgPolygon`]s, and [`classify_object`] labels each polygon against
//! the other operand. Labels live in a [`Classification`] owned by the caller, never on
//! the polygons themselves.

mod classify;
mod context;
mod object;
mod polygon;
mod vertex;

pub use classify::{
    classify_object, classify_polygon, BooleanOp, Classification, Operand, PolygonStatus, Retention,
};
pub use context::CsgContext;
pub use object::CsgObject;
pub use polygon::CsgPolygon;
pub use vertex::{CsgVertex, CsgVertexId};
