// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for the kernel

use thiserror::Error;

/// Failures reported by the spatial index and its partitioners
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpatialError {
    #[error("item is already registered in the spatial index")]
    AlreadyPresent,

    #[error("item is not registered in the spatial index")]
    NotPresent,

    #[error("no partitioner allocated for handle {0}")]
    UnknownPartitioner(i32),

    #[error("spatial worker has stopped accepting commands")]
    WorkerStopped,
}

/// Errors that abort a single kernel operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// Polygon loop that cannot describe a face (too few vertices, repeated ids, ...)
    #[error("malformed polygon: {0}")]
    MalformedPolygon(String),

    /// Geometry whose normal or area collapses to zero
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("quaternion cannot be normalized (squared magnitude {0})")]
    InvalidQuaternion(f32),

    #[error("triangulation failed: {0}")]
    Triangulation(String),

    #[error("vertex {0} is not part of the mesh")]
    MissingVertex(usize),

    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

pub type KernelResult<T> = std::result::Result<T, KernelError>;
