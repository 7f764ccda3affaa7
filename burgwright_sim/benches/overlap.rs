// Collision pre-filter benchmarks: bound rejection and bucket agreement
// versus exact bit overlap on road-scale features.

use burgwright_sim::feature::SpatialFeature;
use burgwright_sim::types::{Bit, FeatureId, Material, MaterialClass, VoxelPos};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// A dashed ribbon of bits along +x: stations at every second x, starting
/// at `parity`. Two ribbons of opposite parity interleave — bounds and
/// buckets agree everywhere while no exact position is shared, which is
/// the worst case for the exact check.
fn ribbon(id: u64, parity: i32, length: i32) -> SpatialFeature {
    let mut feature = SpatialFeature::new(FeatureId(id), 16, 4);
    let stone = Material::new(1, MaterialClass::Stone);
    let mut bits = Vec::new();
    let mut x = parity;
    while x < length {
        for dz in -2..=2 {
            for dy in 0..4 {
                bits.push(Bit::new(
                    VoxelPos::new(x, dy, dz),
                    if dy == 0 { Some(stone) } else { None },
                ));
            }
        }
        x += 2;
    }
    feature.add_bits(bits);
    feature
}

fn bench_overlap(c: &mut Criterion) {
    let a = ribbon(1, 0, 256);
    let b = ribbon(2, 1, 256);

    c.bench_function("bounds_overlap/256", |bencher| {
        bencher.iter(|| black_box(&a).bounds_overlap(black_box(&b)))
    });
    c.bench_function("bucket_overlap/256", |bencher| {
        bencher.iter(|| black_box(&a).bucket_overlap(black_box(&b)))
    });
    c.bench_function("bit_overlap/256", |bencher| {
        bencher.iter(|| black_box(&a).bit_overlap(black_box(&b)))
    });
}

criterion_group!(benches, bench_overlap);
criterion_main!(benches);
