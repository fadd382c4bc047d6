//! Benchmarks for the purification round, cascades and table construction

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use distill_core::noise::ChannelParams;
use distill_protocol::rng::rng_from_seed;
use distill_protocol::{
    dejmps, run_single_branch, run_tree, BranchSampling, CascadeParams, LocalFilter, LookupConfig,
    LookupTableBuilder, Pair,
};

fn bench_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("Round");
    let channel = ChannelParams::new(0.1, 0.05).unwrap();
    let pair = Pair::noisy(&channel).unwrap();
    let filter = LocalFilter::new(0.6).unwrap();

    group.bench_function("link_noise", |b| b.iter(|| Pair::noisy(black_box(&channel))));
    group.bench_function("filter", |b| b.iter(|| filter.apply(black_box(&pair))));
    group.bench_function("dejmps", |b| {
        b.iter(|| dejmps::purify(black_box(&pair), black_box(&pair)))
    });
    group.finish();
}

fn bench_cascades(c: &mut Criterion) {
    let mut group = c.benchmark_group("Cascade");
    let channel = ChannelParams::new(0.1, 0.05).unwrap();

    for depth in [1u32, 2, 3, 4] {
        let params = CascadeParams::filtered(depth, 0.5).unwrap();
        let mut rng = rng_from_seed(Some(1));

        group.bench_with_input(BenchmarkId::new("single_branch", depth), &params, |b, params| {
            b.iter(|| run_single_branch(&channel, params, BranchSampling::Heralded, &mut rng))
        });
        group.bench_with_input(BenchmarkId::new("tree", depth), &params, |b, params| {
            b.iter(|| run_tree(&channel, params, &mut rng))
        });
    }
    group.finish();
}

fn bench_lookup_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("LookupBuild");
    group.sample_size(10);

    for sampling in [BranchSampling::Expected, BranchSampling::Heralded] {
        let config = LookupConfig::coarse()
            .with_trials(20)
            .with_sampling(sampling)
            .with_seed(7);
        let builder = LookupTableBuilder::new(config).unwrap();
        group.bench_function(BenchmarkId::new("coarse", format!("{:?}", sampling)), |b| {
            b.iter(|| builder.build())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_round, bench_cascades, bench_lookup_build);
criterion_main!(benches);
