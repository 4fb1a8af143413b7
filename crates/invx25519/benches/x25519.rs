use invx25519::{invkey, select_impl, ImplType};

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

const KEY: [u8; 32] = [
    0x77, 0x07, 0x6d, 0x0a, 0x73, 0x18, 0xa5, 0x7d, 0x3c, 0x16, 0xc1, 0x72, 0x51, 0xb2, 0x66,
    0x45, 0xdf, 0x4c, 0x2f, 0x87, 0xeb, 0xc0, 0x99, 0x2a, 0xb1, 0x77, 0xfb, 0xa5, 0x1d, 0xb9,
    0x2c, 0x6a,
];

pub fn bench_scmul_base(c: &mut Criterion) {
    let imp = select_impl(ImplType::Portable).expect("portable is always available");
    c.bench_function("scmul_base portable", |b| {
        b.iter(|| imp.scmul_base(black_box(&KEY)))
    });
}

pub fn bench_scmul_key(c: &mut Criterion) {
    let imp = select_impl(ImplType::Portable).expect("portable is always available");
    let point = imp.scmul_base(&KEY);
    c.bench_function("scmul_key portable", |b| {
        b.iter(|| imp.scmul_key(black_box(&KEY), black_box(&point)))
    });
}

pub fn bench_invkey(c: &mut Criterion) {
    let keys = [KEY; 4];
    c.bench_function("invkey 4 keys", |b| b.iter(|| invkey(black_box(&keys))));
}

criterion_group!(benches, bench_scmul_base, bench_scmul_key, bench_invkey);
criterion_main!(benches);
