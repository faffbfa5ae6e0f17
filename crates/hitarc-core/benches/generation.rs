use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hitarc_core::banks::ContentBanks;
use hitarc_core::model::{KeyPolicy, SectionCode};
use hitarc_core::plan::{generate_plan, PlanOptions};
use hitarc_core::rng::SeededRng;
use hitarc_core::sections::generate_section;

fn bench_rng(c: &mut Criterion) {
    let mut group = c.benchmark_group("rng");

    group.bench_function("seed_hash", |b| {
        b.iter(|| SeededRng::new(black_box("a-fairly-long-benchmark-seed")))
    });

    group.bench_function("shuffle_20", |b| {
        let items: Vec<u32> = (0..20).collect();
        let mut rng = SeededRng::new("shuffle");
        b.iter(|| rng.shuffle(black_box(&items)))
    });

    group.finish();
}

fn bench_sections(c: &mut Criterion) {
    let mut group = c.benchmark_group("section");
    let banks = ContentBanks::builtin().expect("built-in bank");

    for code in [SectionCode::A, SectionCode::C, SectionCode::G, SectionCode::I] {
        group.bench_function(code.name(), |b| {
            b.iter(|| {
                let mut rng = SeededRng::namespaced(code.namespace(), black_box("bench"));
                generate_section(code, &mut rng, &banks)
            })
        });
    }

    group.finish();
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");
    let banks = ContentBanks::builtin().expect("built-in bank");
    let now = Utc::now();

    group.bench_function("standard_plaintext", |b| {
        let options = PlanOptions::default();
        b.iter(|| generate_plan(black_box("bench"), &options, &banks, now))
    });

    group.bench_function("standard_hashed", |b| {
        let options = PlanOptions {
            key_policy: KeyPolicy::Hashed,
            ..PlanOptions::default()
        };
        b.iter(|| generate_plan(black_box("bench"), &options, &banks, now))
    });

    group.finish();
}

criterion_group!(benches, bench_rng, bench_sections, bench_plan);
criterion_main!(benches);
