use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::auth::domain::{LoginInput, RegisterInput};
use service::auth::hasher::{Argon2Hasher, PasswordHasher};
use service::auth::repo::memory::{MemoryTokenStore, MemoryUserStore};
use service::auth::AuthService;

fn bench_login(c: &mut Criterion) {
    let svc = AuthService::with_stores(
        Arc::new(MemoryUserStore::default()),
        Arc::new(MemoryTokenStore::default()),
        Arc::new(Argon2Hasher::default()),
        "bench-secret-0123456789",
        chrono::Duration::hours(1),
    );

    // pre-create user outside of the benchmark using a tokio runtime
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(svc.register(RegisterInput::new("Bench", "bench@example.com", "Benchmark1", "Benchmark1")))
        .unwrap();

    c.bench_function("auth_login_verify", |b| {
        b.iter(|| {
            rt.block_on(svc.login(LoginInput::new("bench@example.com", "Benchmark1"))).unwrap();
        });
    });
}

fn bench_hash(c: &mut Criterion) {
    let hasher = Argon2Hasher::default();
    c.bench_function("argon2id_hash", |b| {
        b.iter(|| hasher.hash("Benchmark1").unwrap());
    });
}

criterion_group!(benches, bench_login, bench_hash);
criterion_main!(benches);
