use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use lazada_rs::signer::canonicalize;
use lazada_rs::{HmacSigner, ParameterSet, RequestSigner, SignMethod};

fn create_params(size: usize) -> ParameterSet {
    let mut params = ParameterSet::new()
        .with("app_key", "123456")
        .with("timestamp", 1_700_000_000_000u64)
        .with("sign_method", "sha256");
    for i in 0..size {
        params.insert(format!("param_{:04}", i), format!("value-{}", i));
    }
    params
}

pub fn signing_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("signing");

    for size in [0, 10, 100] {
        let params = create_params(size);

        group.bench_with_input(BenchmarkId::new("canonicalize", size), &params, |b, params| {
            b.iter(|| canonicalize("/orders/get", params));
        });

        for method in [SignMethod::HmacSha256, SignMethod::HmacSha1] {
            let signer = HmacSigner::new("bench-secret", method);
            group.bench_with_input(
                BenchmarkId::new(format!("sign_{}", method.tag()), size),
                &params,
                |b, params| {
                    b.iter(|| signer.sign("/orders/get", params));
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, signing_benchmark);
criterion_main!(benches);
