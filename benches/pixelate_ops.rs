//! Benchmarks for the UV solver.

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Point3;
use texelgrid::algo::pixelate::{classify_and_collect, FaceArena};
use texelgrid::prelude::*;

/// A vertical wall of `n` x `n` unit quads in the XZ plane.
fn create_wall_mesh(n: usize) -> PolyMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n);

    for k in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64, 0.0, k as f64));
        }
    }

    for k in 0..n {
        for i in 0..n {
            let v00 = k * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11, v01]);
        }
    }

    build_from_quads(&vertices, &faces).unwrap()
}

fn create_unit_cube() -> PolyMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
    ];
    let faces = vec![
        [0, 1, 5, 4],
        [1, 2, 6, 5],
        [2, 3, 7, 6],
        [3, 0, 4, 7],
        [4, 5, 6, 7],
        [0, 3, 2, 1],
    ];
    build_from_quads(&vertices, &faces).unwrap()
}

fn bench_classification(c: &mut Criterion) {
    let mesh = create_wall_mesh(64);
    let angle = 30.0_f64.to_radians();

    c.bench_function("classify_wall_64x64_parallel", |b| {
        b.iter(|| {
            let mut arena = FaceArena::new(&mesh, false, angle);
            classify_and_collect(&mesh, &mut arena, true).len()
        });
    });

    c.bench_function("classify_wall_64x64_sequential", |b| {
        b.iter(|| {
            let mut arena = FaceArena::new(&mesh, false, angle);
            classify_and_collect(&mesh, &mut arena, false).len()
        });
    });
}

fn bench_pixelate(c: &mut Criterion) {
    let cube = create_unit_cube();
    let options = PixelateOptions::default();

    c.bench_function("pixelate_cube", |b| {
        b.iter(|| {
            let mut mesh = cube.clone();
            pixelate(&mut mesh, &options).unwrap()
        });
    });

    let wall = create_wall_mesh(16);
    let options = PixelateOptions::default()
        .with_grid_density(4)
        .with_texture_size(128);

    c.bench_function("pixelate_wall_16x16", |b| {
        b.iter(|| {
            let mut mesh = wall.clone();
            pixelate(&mut mesh, &options).unwrap()
        });
    });

    let merged = PixelateOptions::default().with_separate_by_plane(false);
    c.bench_function("pixelate_cube_merged", |b| {
        b.iter(|| {
            let mut mesh = cube.clone();
            pixelate(&mut mesh, &merged).unwrap()
        });
    });
}

criterion_group!(benches, bench_classification, bench_pixelate);
criterion_main!(benches);
