// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::{Mat4, Vec2, Vec3};
use overstory_core::{Context, ContextOptions, Prototype, TouchSample};
use overstory_hit::{Ray, ShapeKind, intersect};
use overstory_transform::Srt;

const DT: f32 = 1.0 / 60.0;

/// A grid of rectangles in the z = 1 plane, roughly covering the screen.
fn grid_context(side: usize, parallel: bool) -> Context {
    let context = Context::with_options(ContextOptions {
        use_parallel: parallel,
        ..ContextOptions::default()
    });
    let mut prototypes = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            let x = (col as f32 / side as f32) * 2.0 - 1.0;
            let y = (row as f32 / side as f32) * 2.0 - 1.0;
            prototypes.push(
                Prototype::with_shape(format!("cell_{row}_{col}"), ShapeKind::Rectangle).at(Srt {
                    translation: Vec3::new(x, y, 1.0),
                    scale: Vec3::splat(2.0 / side as f32),
                    ..Srt::IDENTITY
                }),
            );
        }
    }
    context.add_or_update_elements(true, prototypes.iter());
    context
}

fn touch_fan(count: usize) -> Vec<TouchSample> {
    (0..count)
        .map(|i| {
            let t = i as f32 / count.max(1) as f32;
            TouchSample::new(Vec2::new(t * 2.0 - 1.0, t - 0.5), i as i32, 1.0)
        })
        .collect()
}

fn bench_mainloop(c: &mut Criterion) {
    let mut group = c.benchmark_group("mainloop");
    group.sample_size(30);

    for &(side, touches) in &[(8_usize, 2_usize), (16, 4), (32, 8)] {
        for parallel in [false, true] {
            let label = format!(
                "{}x{side}_touches{touches}_{}",
                side,
                if parallel { "par" } else { "seq" }
            );
            group.bench_function(label, |b| {
                let context = grid_context(side, parallel);
                let samples = touch_fan(touches);
                b.iter(|| {
                    context
                        .mainloop(
                            black_box(&samples),
                            Mat4::IDENTITY,
                            Mat4::IDENTITY,
                            Mat4::IDENTITY,
                            DT,
                        )
                        .unwrap();
                });
            });
        }
    }
    group.finish();
}

fn bench_shape_intersections(c: &mut Criterion) {
    let mut group = c.benchmark_group("intersect");
    let ray = Ray::new(Vec3::new(0.1, 0.1, -2.0), Vec3::Z);

    let shapes: Vec<(&str, ShapeKind)> = vec![
        ("rectangle", ShapeKind::Rectangle),
        ("circle", ShapeKind::Circle),
        (
            "segment",
            ShapeKind::Segment {
                hole_radius: 0.4,
                cycles: 0.75,
                phase: 0.3,
            },
        ),
        (
            "polygon_hexagon",
            ShapeKind::Polygon {
                vertices: (0..6)
                    .map(|i| {
                        let a = i as f32 / 6.0 * core::f32::consts::TAU;
                        Vec2::new(a.cos(), a.sin()) * 0.5
                    })
                    .collect(),
            },
        ),
        ("box", ShapeKind::Box3 { size: Vec3::ONE }),
        ("sphere", ShapeKind::Sphere),
    ];

    for (name, shape) in &shapes {
        group.bench_function(*name, |b| {
            b.iter(|| intersect(black_box(shape), black_box(&ray)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_mainloop, bench_shape_intersections);
criterion_main!(benches);
