use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use chrono::Utc;
use gestio_auth::catalogue;
use gestio_auth::{
    Permission, Role, Session, StandardRole, User, UserId, has_all_permissions, has_permission,
};

fn session(role: Role, permissions: Vec<Permission>) -> Session {
    Session::authenticated(User::new(UserId::new(1), "Bench User", role, permissions), Utc::now())
}

/// Single checks: the path every render/operation goes through.
fn bench_has_permission(c: &mut Criterion) {
    let mut group = c.benchmark_group("has_permission");

    let cases = [
        ("administrator", session(Role::ADMINISTRATOR, vec![])),
        (
            "manager",
            session(
                Role::from(StandardRole::Manager),
                StandardRole::Manager.default_permissions(),
            ),
        ),
        ("anonymous", Session::anonymous()),
    ];

    let last = catalogue::users::MANAGE;
    for (name, session) in &cases {
        group.bench_with_input(BenchmarkId::new("last_in_catalogue", name), session, |b, s| {
            b.iter(|| has_permission(black_box(s), black_box(&last)))
        });
    }
    group.finish();
}

/// Whole-catalogue set checks (permission-matrix screens).
fn bench_has_all_permissions(c: &mut Criterion) {
    let all = catalogue::all();
    let full = session(Role::from(StandardRole::Viewer), all.clone());

    c.bench_function("has_all_permissions/full_catalogue", |b| {
        b.iter(|| has_all_permissions(black_box(&full), black_box(&all)))
    });
}

criterion_group!(benches, bench_has_permission, bench_has_all_permissions);
criterion_main!(benches);
