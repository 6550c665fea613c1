// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Configuration files, mesh files and spatial command logs on disk

use anyhow::Result;
use nalgebra::{Point3, Vector3};
use sculpt_kernel::spatial::command_log::{self, CommandRecorder};
use sculpt_kernel::spatial::PartitionerRegistry;
use sculpt_kernel::{KernelConfig, MMesh, SpatialBackend, SpatialConfig, Tolerance};
use std::io::Write;
use tempfile::TempDir;

#[test]
fn test_config_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("sculpt.toml");

    let mut config = KernelConfig::default();
    config.tolerance.epsilon = 5e-4;
    config.spatial.backend = SpatialBackend::Bvh;
    config.spatial.result_capacity = 64;
    config.save(&path)?;

    assert_eq!(KernelConfig::from_file(&path)?, config);
    Ok(())
}

#[test]
fn test_partial_config_uses_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("sculpt.toml");
    std::fs::write(
        &path,
        "[spatial]\nresult_capacity = 10\nbackend = \"bvh\"\nbvh_leaf_size = 8\n",
    )?;

    let config = KernelConfig::from_file(&path)?;
    assert_eq!(config.tolerance, Tolerance::default());
    assert_eq!(config.spatial.backend, SpatialBackend::Bvh);
    assert_eq!(config.spatial.bvh_leaf_size, 8);
    Ok(())
}

#[test]
fn test_malformed_config_is_an_error() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("sculpt.toml");
    std::fs::write(&path, "[tolerance]\nepsilon = \"tiny\"\n")?;
    assert!(KernelConfig::from_file(&path).is_err());
    Ok(())
}

#[test]
fn test_mesh_json_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("box.json");

    let mesh = MMesh::cuboid(9, Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 2.0, 3.0));
    mesh.save_json(&path)?;
    assert_eq!(MMesh::from_json_file(&path)?, mesh);
    Ok(())
}

#[test]
fn test_recorded_session_replays_consistently() -> Result<()> {
    let dir = TempDir::new()?;
    let log = dir.path().join("session.jsonl");

    let config = SpatialConfig::default();
    let mut registry = PartitionerRegistry::new(config).with_recorder(CommandRecorder::create(&log)?);
    let handle = registry.allocate();
    for id in 0..8 {
        let center = Point3::new(id as f32 * 2.0, 0.0, 0.0);
        registry.add_item(handle, id, center, Vector3::repeat(0.5))?;
    }
    registry.remove_item(handle, 3)?;
    registry.update_item(handle, 4, Point3::new(50.0, 0.0, 0.0), Vector3::repeat(0.5))?;

    let mut out = vec![0; 16];
    let found = registry.intersected_by(handle, Point3::new(6.0, 0.0, 0.0), Vector3::new(7.0, 1.0, 1.0), &mut out)?;
    assert_eq!(found, 5);
    assert!(!registry.has_item(handle, 3)?);
    assert!(registry.remove_item(handle, 3).is_err());
    drop(registry);

    let summary = command_log::replay_file(&log, &config)?;
    assert_eq!(summary.commands, 14);
    assert_eq!(summary.queries, 2);
    assert_eq!(summary.rejected, 1);
    assert!(summary.is_consistent());

    // the same log against the other backend gives the same answers
    let bvh = SpatialConfig {
        backend: SpatialBackend::Bvh,
        ..config
    };
    assert!(command_log::replay_file(&log, &bvh)?.is_consistent());
    Ok(())
}

#[test]
fn test_tampered_log_reports_mismatch() -> Result<()> {
    let dir = TempDir::new()?;
    let log = dir.path().join("session.jsonl");
    let mut file = std::fs::File::create(&log)?;
    writeln!(file, r#"{{"op":"alloc","handle":0}}"#)?;
    writeln!(
        file,
        r#"{{"op":"add","handle":0,"id":1,"center":[0.0,0.0,0.0],"extents":[1.0,1.0,1.0]}}"#
    )?;
    writeln!(file)?;
    writeln!(file, r#"{{"op":"has_item","handle":0,"id":1,"present":false}}"#)?;
    drop(file);

    let summary = command_log::replay_file(&log, &SpatialConfig::default())?;
    assert_eq!(summary.commands, 3);
    assert_eq!(summary.mismatches.len(), 1);
    assert_eq!(summary.mismatches[0].line, 4);
    Ok(())
}
