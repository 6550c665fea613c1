// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Recording and replay of partitioner traffic
//!
//! Each call made through a [`PartitionerRegistry`](super::PartitionerRegistry) with a
//! recorder attached is written as one JSON object per line. Replaying the log against a
//! fresh registry re-runs the same calls and compares every query's result count.

use super::registry::PartitionerRegistry;
use crate::config::SpatialConfig;
use anyhow::{Context, Result};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// One recorded registry call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Alloc {
        handle: i32,
    },
    Free {
        handle: i32,
    },
    Add {
        handle: i32,
        id: i32,
        center: Point3<f32>,
        extents: Vector3<f32>,
    },
    Update {
        handle: i32,
        id: i32,
        center: Point3<f32>,
        extents: Vector3<f32>,
    },
    Remove {
        handle: i32,
        id: i32,
    },
    ContainedBy {
        handle: i32,
        center: Point3<f32>,
        extents: Vector3<f32>,
        capacity: usize,
        count: usize,
    },
    IntersectedBy {
        handle: i32,
        center: Point3<f32>,
        extents: Vector3<f32>,
        capacity: usize,
        count: usize,
    },
    HasItem {
        handle: i32,
        id: i32,
        present: bool,
    },
}

/// Line-oriented JSON sink for [`Command`]s
pub struct CommandRecorder {
    writer: Box<dyn Write + Send>,
}

impl CommandRecorder {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }

    /// Record into a newly created (truncated) file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create command log: {:?}", path.as_ref()))?;
        Ok(Self::new(BufWriter::new(file)))
    }

    /// Write failures are logged and otherwise ignored; recording never changes index behavior
    pub fn record(&mut self, command: &Command) {
        let written = serde_json::to_writer(&mut self.writer, command)
            .map_err(std::io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"));
        if let Err(error) = written {
            warn!(%error, "failed to record spatial command");
        }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl Drop for CommandRecorder {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Query whose result count differs from the recorded one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayMismatch {
    /// 1-based line in the log
    pub line: usize,
    pub expected: usize,
    pub actual: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub commands: usize,
    pub queries: usize,
    /// Mutations that were rejected during replay
    pub rejected: usize,
    pub mismatches: Vec<ReplayMismatch>,
}

impl ReplaySummary {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Replay a command log file
pub fn replay_file(path: impl AsRef<Path>, config: &SpatialConfig) -> Result<ReplaySummary> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("Failed to open command log: {:?}", path.as_ref()))?;
    replay(BufReader::new(file), config)
}

/// Replay commands read line by line; blank lines are skipped
pub fn replay<R: BufRead>(reader: R, config: &SpatialConfig) -> Result<ReplaySummary> {
    let mut registry = PartitionerRegistry::new(*config);
    let mut handles = ahash::AHashMap::new();
    let mut summary = ReplaySummary::default();
    let mut out = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.with_context(|| format!("Failed to read command log line {line_number}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let command: Command = serde_json::from_str(&line)
            .with_context(|| format!("Invalid command on line {line_number}"))?;
        summary.commands += 1;

        let handle_of = |recorded: i32| handles.get(&recorded).copied().unwrap_or(recorded);

        let outcome = match command {
            Command::Alloc { handle } => {
                let fresh = registry.allocate();
                handles.insert(handle, fresh);
                Ok(())
            }
            Command::Free { handle } => registry.free(handle_of(handle)),
            Command::Add {
                handle,
                id,
                center,
                extents,
            } => registry.add_item(handle_of(handle), id, center, extents),
            Command::Update {
                handle,
                id,
                center,
                extents,
            } => registry.update_item(handle_of(handle), id, center, extents),
            Command::Remove { handle, id } => registry.remove_item(handle_of(handle), id),
            Command::ContainedBy {
                handle,
                center,
                extents,
                capacity,
                count,
            } => {
                check_capacity(capacity, config, line_number)?;
                out.resize(capacity, 0);
                summary.queries += 1;
                registry
                    .contained_by(handle_of(handle), center, extents, &mut out)
                    .map(|actual| compare(&mut summary, line_number, count, actual))
            }
            Command::IntersectedBy {
                handle,
                center,
                extents,
                capacity,
                count,
            } => {
                check_capacity(capacity, config, line_number)?;
                out.resize(capacity, 0);
                summary.queries += 1;
                registry
                    .intersected_by(handle_of(handle), center, extents, &mut out)
                    .map(|actual| compare(&mut summary, line_number, count, actual))
            }
            Command::HasItem {
                handle,
                id,
                present,
            } => {
                summary.queries += 1;
                registry
                    .has_item(handle_of(handle), id)
                    .map(|actual| compare(&mut summary, line_number, present as usize, actual as usize))
            }
        };

        if let Err(error) = outcome {
            debug!(line = line_number, %error, "replayed command rejected");
            summary.rejected += 1;
        }
    }

    Ok(summary)
}

/// Recorded buffer sizes are bounded by the configured result capacity
fn check_capacity(capacity: usize, config: &SpatialConfig, line: usize) -> Result<()> {
    anyhow::ensure!(
        capacity <= config.result_capacity,
        "Query on line {line} asks for {capacity} results, above the configured capacity of {}",
        config.result_capacity
    );
    Ok(())
}

fn compare(summary: &mut ReplaySummary, line: usize, expected: usize, actual: usize) {
    if expected != actual {
        summary.mismatches.push(ReplayMismatch {
            line,
            expected,
            actual,
        });
    }
}
