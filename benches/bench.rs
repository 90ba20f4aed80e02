#[macro_use]
extern crate bencher;
extern crate rand_core;
extern crate rand_counter;

use bencher::{black_box, Bencher};
use rand_core::{RngCore, SeedableRng};
use rand_counter::{Philox2x64Rng, Philox4x32Rng, Threefry2x64Rng, Threefry4x32Rng};
use std::mem::size_of;

macro_rules! make_bench_u32 {
    ($name:ident, $rng:path) => {
        fn $name(b: &mut Bencher) {
            type Rng = $rng;
            let mut rng = Rng::seed_from_u64(0);
            b.iter(|| {
                for _ in 0..10 {
                    black_box(rng.next_u32());
                }
            });
            b.bytes = size_of::<u32>() as u64;
        }
    };
}

macro_rules! make_bench_u64 {
    ($name:ident, $rng:path) => {
        fn $name(b: &mut Bencher) {
            type Rng = $rng;
            let mut rng = Rng::seed_from_u64(0);
            b.iter(|| {
                for _ in 0..10 {
                    black_box(rng.next_u64());
                }
            });
            b.bytes = size_of::<u64>() as u64;
        }
    };
}

make_bench_u32!(rand_u32_threefry4x32, Threefry4x32Rng);
make_bench_u32!(rand_u32_philox4x32, Philox4x32Rng);
make_bench_u64!(rand_u64_threefry2x64, Threefry2x64Rng);
make_bench_u64!(rand_u64_philox2x64, Philox2x64Rng);

benchmark_group!(
    benches,
    rand_u32_threefry4x32,
    rand_u32_philox4x32,
    rand_u64_threefry2x64,
    rand_u64_philox2x64
);
benchmark_main!(benches);
