// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel configuration: tolerances and spatial index sizing

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default distance under which two points are the same point
pub const EPSILON: f32 = 1e-4;

/// Default distance used when matching planes of neighbouring faces
pub const MERGE_DISTANCE: f32 = 8e-3;

/// Default capacity of the fixed query result buffer
pub const DEFAULT_RESULT_CAPACITY: usize = 1000;

const CONFIG_FILE: &str = "sculpt.toml";

/// Distance tolerances handed to every welding, classification and validation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub epsilon: f32,
    pub merge_distance: f32,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            epsilon: EPSILON,
            merge_distance: MERGE_DISTANCE,
        }
    }
}

impl Tolerance {
    pub fn new(epsilon: f32, merge_distance: f32) -> Self {
        Self {
            epsilon,
            merge_distance,
        }
    }

    /// Half-width of the cube searched around a weld candidate.
    /// Wider than `epsilon` so points sitting on the float error boundary are still found.
    pub fn weld_search_radius(&self) -> f32 {
        self.epsilon * 3.0
    }
}

/// Which partitioner backs a spatial index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpatialBackend {
    /// Flat element array scanned per query
    Linear,
    /// Bounding volume hierarchy rebuilt after mutations
    Bvh,
}

impl SpatialBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpatialBackend::Linear => "linear",
            SpatialBackend::Bvh => "bvh",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(SpatialBackend::Linear),
            "bvh" => Some(SpatialBackend::Bvh),
            _ => None,
        }
    }
}

/// Spatial index sizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialConfig {
    /// Size of the pre-allocated result buffer; queries never return more items
    pub result_capacity: usize,
    pub backend: SpatialBackend,
    /// Maximum number of items stored in one hierarchy leaf
    pub bvh_leaf_size: usize,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            result_capacity: DEFAULT_RESULT_CAPACITY,
            backend: SpatialBackend::Linear,
            bvh_leaf_size: 4,
        }
    }
}

/// Top-level kernel configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KernelConfig {
    #[serde(default)]
    pub tolerance: Tolerance,
    #[serde(default)]
    pub spatial: SpatialConfig,
}

impl KernelConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: KernelConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `sculpt.toml` from the working directory if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };

        if let Ok(epsilon) = std::env::var("SCULPT_EPSILON") {
            config.tolerance.epsilon = epsilon
                .parse()
                .with_context(|| format!("Invalid SCULPT_EPSILON: {epsilon}"))?;
        }

        if let Ok(distance) = std::env::var("SCULPT_MERGE_DISTANCE") {
            config.tolerance.merge_distance = distance
                .parse()
                .with_context(|| format!("Invalid SCULPT_MERGE_DISTANCE: {distance}"))?;
        }

        if let Ok(capacity) = std::env::var("SCULPT_RESULT_CAPACITY") {
            config.spatial.result_capacity = capacity
                .parse()
                .with_context(|| format!("Invalid SCULPT_RESULT_CAPACITY: {capacity}"))?;
        }

        if let Ok(backend) = std::env::var("SCULPT_SPATIAL_BACKEND") {
            config.spatial.backend = SpatialBackend::from_str(&backend)
                .with_context(|| format!("Unknown SCULPT_SPATIAL_BACKEND: {backend}"))?;
        }

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}
