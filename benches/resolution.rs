//! Benchmark for profile resolution throughput

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use storage_profiles::{
    BackendFactory, BackendRegistry, EngineConfig, FallbackPolicy, Profile, ResolutionEngine,
    VolumeRequest,
};

fn engine(policy: FallbackPolicy) -> ResolutionEngine {
    let registry = BackendRegistry::from_entries(&BackendFactory::builtin_entries())
        .expect("built-in backends register");
    ResolutionEngine::new(
        EngineConfig {
            fallback_policy: policy,
            ..Default::default()
        },
        registry,
    )
}

fn bench_resolve_profile(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    group.throughput(Throughput::Elements(1));

    let engine = engine(FallbackPolicy::Reject);
    let request = VolumeRequest::new("ebs")
        .with_profile(Profile::Gold)
        .with_size(100 * 1024 * 1024 * 1024);

    group.bench_function("resolve_supported_profile", |b| {
        b.iter(|| engine.resolve(black_box(&request)))
    });

    let request = VolumeRequest::new("ebs");
    group.bench_function("resolve_default", |b| {
        b.iter(|| engine.resolve(black_box(&request)))
    });

    group.finish();
}

fn bench_resolve_fallback(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    group.throughput(Throughput::Elements(1));

    let engine = engine(FallbackPolicy::BestEffort);
    let request = VolumeRequest::new("mayastor").with_profile(Profile::Silver);

    group.bench_function("resolve_best_effort", |b| {
        b.iter(|| engine.resolve(black_box(&request)))
    });

    let request = VolumeRequest::new("nfs").with_profile(Profile::Gold);
    group.bench_function("resolve_unsupported_backend", |b| {
        b.iter(|| engine.resolve(black_box(&request)))
    });

    group.finish();
}

criterion_group!(benches, bench_resolve_profile, bench_resolve_fallback);
criterion_main!(benches);
