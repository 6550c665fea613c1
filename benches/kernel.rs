// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Point3;
use sculpt_kernel::csg::{classify_object, CsgContext, CsgObject};
use sculpt_kernel::mesh::{decompose, validate_topology};
use sculpt_kernel::spatial::create_index;
use sculpt_kernel::{BoundingBox, MMesh, SpatialBackend, SpatialConfig, SpatialIndex, Tolerance};

fn grid_box(i: usize, side: usize) -> BoundingBox {
    let x = (i % side) as f32;
    let y = ((i / side) % side) as f32;
    let z = (i / (side * side)) as f32;
    BoundingBox::new(Point3::new(x, y, z), Point3::new(x + 0.8, y + 0.8, z + 0.8))
}

fn bench_spatial_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_query");
    let side = 16;
    let query = BoundingBox::new(Point3::new(4.0, 4.0, 4.0), Point3::new(8.0, 8.0, 8.0));

    for backend in [SpatialBackend::Linear, SpatialBackend::Bvh] {
        let config = SpatialConfig {
            backend,
            ..SpatialConfig::default()
        };
        let index = create_index::<usize>(&config);
        for i in 0..side * side * side {
            index.add(i, grid_box(i, side)).unwrap();
        }
        // first query builds the hierarchy
        index.intersected_by(&query, 1000);

        group.bench_with_input(BenchmarkId::new("intersected_by", backend.as_str()), &index, |b, index| {
            b.iter(|| index.intersected_by(black_box(&query), 1000))
        });
        group.bench_with_input(BenchmarkId::new("contained_by", backend.as_str()), &index, |b, index| {
            b.iter(|| index.contained_by(black_box(&query), 1000))
        });
    }

    group.finish();
}

fn bench_welding(c: &mut Criterion) {
    let mut group = c.benchmark_group("welding");

    for backend in [SpatialBackend::Linear, SpatialBackend::Bvh] {
        let config = SpatialConfig {
            backend,
            ..SpatialConfig::default()
        };
        group.bench_function(BenchmarkId::new("cuboid_grid", backend.as_str()), |b| {
            b.iter(|| {
                let mut context = CsgContext::new(Tolerance::default(), &config);
                for i in 0..8 {
                    let x = i as f32;
                    let mesh = MMesh::cuboid(i, Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0));
                    CsgObject::from_mesh(black_box(&mesh), &mut context).unwrap();
                }
                context.len()
            })
        });
    }

    group.finish();
}

fn bench_mesh(c: &mut Criterion) {
    let mut group = c.benchmark_group("mesh");

    let ring: Vec<Point3<f32>> = (0..64)
        .map(|i| {
            let angle = i as f32 / 64.0 * std::f32::consts::TAU;
            let radius = if i % 2 == 0 { 2.0 } else { 1.0 };
            Point3::new(radius * angle.cos(), radius * angle.sin(), 0.0)
        })
        .collect();
    let border: Vec<usize> = (0..ring.len()).collect();
    group.bench_function("decompose_star", |b| {
        b.iter(|| decompose(black_box(&border), &[], &ring, &Tolerance::default()).unwrap())
    });

    let cube = MMesh::cuboid(0, Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
    group.bench_function("validate_cuboid", |b| b.iter(|| validate_topology(black_box(&cube))));

    let mut context = CsgContext::new(Tolerance::default(), &SpatialConfig::default());
    let outer = CsgObject::from_mesh(&MMesh::cuboid(0, Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 4.0, 4.0)), &mut context).unwrap();
    let inner = CsgObject::from_mesh(&MMesh::cuboid(1, Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 2.0, 2.0)), &mut context).unwrap();
    group.bench_function("classify_nested", |b| {
        b.iter(|| classify_object(black_box(&inner), &outer, &Tolerance::default()))
    });

    group.finish();
}

criterion_group!(benches, bench_spatial_queries, bench_welding, bench_mesh);
criterion_main!(benches);
