use criterion::*;
use std::hint::black_box;
use pvs::math::{BoundingBox, DVec3, Polygon, ROUND_EPSILON};
use pvs::{PvsOptions, Region, RegionGraph, compute_pvs};

/// Window in the wall `x == at`, facing along X with the sign of `facing`
fn window(at: f64, y0: f64, y1: f64, facing: f64) -> Polygon {
    let poly = Polygon::from_vertices(vec![
        DVec3::new(at, y0, 64.0),
        DVec3::new(at, y1, 64.0),
        DVec3::new(at, y1, 192.0),
        DVec3::new(at, y0, 192.0),
    ]);
    if poly.plane.normal.x * facing < 0.0 {
        poly.mirror()
    } else {
        poly
    }
}

/// Rooms in a row whose windows drift sideways, so sight lines end after a
/// few rooms
fn corridor(count: usize) -> RegionGraph {
    let mut regions: Vec<Region> = (0..count)
        .map(|i| {
            let x = i as f64 * 256.0;
            let bb = BoundingBox::from_corners(
                DVec3::new(x, 0.0, 0.0),
                DVec3::new(x + 256.0, 1024.0, 256.0),
            );
            Region::new(vec![i], Vec::new(), bb)
        })
        .collect();

    for i in 1..count {
        let at = i as f64 * 256.0;
        let y0 = ((i * 160) % 896) as f64;
        regions[i - 1].portals.push(window(at, y0, y0 + 128.0, -1.0));
        regions[i].portals.push(window(at, y0, y0 + 128.0, 1.0));
    }

    RegionGraph::new(regions, ROUND_EPSILON).unwrap()
}

fn bench_corridor(c: &mut Criterion) {
    let options = PvsOptions {
        presample: false,
        ..PvsOptions::default()
    };

    let mut group = c.benchmark_group("PVS build");
    for count in [16usize, 64] {
        let graph = corridor(count);
        group.bench_with_input(BenchmarkId::new("corridor", count), &graph, |b, graph| {
            b.iter(|| compute_pvs(black_box(graph), None, &options));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_corridor,);
criterion_main!(benches);
