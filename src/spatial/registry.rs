// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Handle-based allocation of partitioners

use super::command_log::{Command, CommandRecorder};
use super::{create_partitioner, Partitioner};
use crate::config::SpatialConfig;
use crate::error::SpatialError;
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

/// Owns partitioners addressed by integer handles, handed out from 0 upwards.
///
/// With a recorder attached every call is logged so a session can be replayed later.
pub struct PartitionerRegistry {
    config: SpatialConfig,
    partitioners: AHashMap<i32, Box<dyn Partitioner>>,
    next_handle: i32,
    recorder: Option<CommandRecorder>,
}

impl PartitionerRegistry {
    pub fn new(config: SpatialConfig) -> Self {
        Self {
            config,
            partitioners: AHashMap::new(),
            next_handle: 0,
            recorder: None,
        }
    }

    pub fn with_recorder(mut self, recorder: CommandRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Detach the recorder, flushing what it holds
    pub fn take_recorder(&mut self) -> Option<CommandRecorder> {
        let mut recorder = self.recorder.take()?;
        if let Err(error) = recorder.flush() {
            warn!(%error, "failed to flush spatial command log");
        }
        Some(recorder)
    }

    /// Number of live partitioners
    pub fn len(&self) -> usize {
        self.partitioners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitioners.is_empty()
    }

    pub fn allocate(&mut self) -> i32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.partitioners
            .insert(handle, create_partitioner(&self.config));
        debug!(handle, backend = self.config.backend.as_str(), "allocated partitioner");
        self.record(Command::Alloc { handle });
        handle
    }

    pub fn free(&mut self, handle: i32) -> Result<(), SpatialError> {
        self.record(Command::Free { handle });
        self.partitioners
            .remove(&handle)
            .map(|_| ())
            .ok_or(SpatialError::UnknownPartitioner(handle))
    }

    pub fn add_item(
        &mut self,
        handle: i32,
        id: i32,
        center: Point3<f32>,
        extents: Vector3<f32>,
    ) -> Result<(), SpatialError> {
        self.record(Command::Add {
            handle,
            id,
            center,
            extents,
        });
        self.get(handle)?.add_item(id, center, extents)
    }

    pub fn update_item(
        &mut self,
        handle: i32,
        id: i32,
        center: Point3<f32>,
        extents: Vector3<f32>,
    ) -> Result<(), SpatialError> {
        self.record(Command::Update {
            handle,
            id,
            center,
            extents,
        });
        self.get(handle)?.update_item(id, center, extents)
    }

    pub fn remove_item(&mut self, handle: i32, id: i32) -> Result<(), SpatialError> {
        self.record(Command::Remove { handle, id });
        self.get(handle)?.remove_item(id)
    }

    /// Writes ids into `out` and returns the count
    pub fn contained_by(
        &mut self,
        handle: i32,
        center: Point3<f32>,
        extents: Vector3<f32>,
        out: &mut [i32],
    ) -> Result<usize, SpatialError> {
        let count = self.get(handle)?.contained_by(center, extents, out);
        self.record(Command::ContainedBy {
            handle,
            center,
            extents,
            capacity: out.len(),
            count,
        });
        Ok(count)
    }

    /// Writes ids into `out` and returns the count
    pub fn intersected_by(
        &mut self,
        handle: i32,
        center: Point3<f32>,
        extents: Vector3<f32>,
        out: &mut [i32],
    ) -> Result<usize, SpatialError> {
        let count = self.get(handle)?.intersected_by(center, extents, out);
        self.record(Command::IntersectedBy {
            handle,
            center,
            extents,
            capacity: out.len(),
            count,
        });
        Ok(count)
    }

    pub fn has_item(&mut self, handle: i32, id: i32) -> Result<bool, SpatialError> {
        let present = self.get(handle)?.has_item(id);
        self.record(Command::HasItem {
            handle,
            id,
            present,
        });
        Ok(present)
    }

    fn get(&mut self, handle: i32) -> Result<&mut Box<dyn Partitioner>, SpatialError> {
        self.partitioners
            .get_mut(&handle)
            .ok_or(SpatialError::UnknownPartitioner(handle))
    }

    fn record(&mut self, command: Command) {
        if let Some(recorder) = &mut self.recorder {
            recorder.record(&command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpatialBackend;
    use crate::spatial::command_log::replay;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    /// Writer that keeps its bytes reachable after the recorder takes ownership
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenWriter;

    impl std::io::Write for BrokenWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"))
        }
    }

    #[test]
    fn test_take_recorder_survives_flush_failure() {
        let mut registry =
            PartitionerRegistry::new(SpatialConfig::default()).with_recorder(CommandRecorder::new(BrokenWriter));
        registry.allocate();
        assert!(registry.take_recorder().is_some());
        assert!(registry.take_recorder().is_none());
    }

    #[test]
    fn test_handles_start_at_zero() {
        let mut registry = PartitionerRegistry::new(SpatialConfig::default());
        assert_eq!(registry.allocate(), 0);
        assert_eq!(registry.allocate(), 1);
        assert_eq!(registry.len(), 2);

        registry.free(0).unwrap();
        assert_eq!(registry.allocate(), 2);
        assert_eq!(registry.free(0), Err(SpatialError::UnknownPartitioner(0)));
    }

    #[test]
    fn test_unknown_handle() {
        let mut registry = PartitionerRegistry::new(SpatialConfig::default());
        let mut out = [0; 4];
        assert_eq!(
            registry.intersected_by(9, Point3::origin(), Vector3::zeros(), &mut out),
            Err(SpatialError::UnknownPartitioner(9))
        );
    }

    #[test]
    fn test_recorded_session_replays_consistently() {
        let buffer = SharedBuffer::default();
        let config = SpatialConfig {
            backend: SpatialBackend::Bvh,
            ..SpatialConfig::default()
        };
        let mut registry =
            PartitionerRegistry::new(config).with_recorder(CommandRecorder::new(buffer.clone()));

        let handle = registry.allocate();
        for id in 0..20 {
            let center = Point3::new(id as f32, 0.0, 0.0);
            registry
                .add_item(handle, id, center, Vector3::new(0.4, 0.4, 0.4))
                .unwrap();
        }
        registry.remove_item(handle, 3).unwrap();
        registry
            .update_item(handle, 4, Point3::new(100.0, 0.0, 0.0), Vector3::new(0.4, 0.4, 0.4))
            .unwrap();

        let mut out = [0; 8];
        let count = registry
            .intersected_by(handle, Point3::new(5.0, 0.0, 0.0), Vector3::new(3.0, 1.0, 1.0), &mut out)
            .unwrap();
        assert_eq!(count, 5);
        assert!(!registry.has_item(handle, 3).unwrap());
        drop(registry.take_recorder());

        let log = buffer.0.lock().unwrap().clone();
        let summary = replay(Cursor::new(log), &config).unwrap();
        assert_eq!(summary.commands, 25);
        assert_eq!(summary.queries, 2);
        assert!(summary.is_consistent());
    }
}
