use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use iam_atlas::{normalize, AuthorizationModel};
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

/// Synthetic export with `users` users and proportional roles, groups and policies
fn synthetic_export(users: usize, seed: u64) -> Value {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let policies = (users / 4).max(1);
    let groups = (users / 10).max(1);
    let roles = (users / 5).max(1);

    let user_arn = |i: usize| format!("arn:aws:iam::123456789012:user/u{}", i);
    let policy_arn = |i: usize| format!("arn:aws:iam::123456789012:policy/p{}", i);

    let user_list: Vec<Value> = (0..users)
        .map(|i| {
            json!({
                "UserId": format!("AIDA{:08}", i),
                "UserName": format!("u{}", i),
                "Arn": user_arn(i),
                "GroupList": [format!("g{}", rng.gen_range(0..groups))],
                "AttachedManagedPolicies": [{"PolicyArn": policy_arn(rng.gen_range(0..policies))}]
            })
        })
        .collect();

    let role_list: Vec<Value> = (0..roles)
        .map(|i| {
            let principals: Vec<String> =
                (0..3).map(|_| user_arn(rng.gen_range(0..users))).collect();
            json!({
                "RoleId": format!("AROA{:08}", i),
                "RoleName": format!("r{}", i),
                "Arn": format!("arn:aws:iam::123456789012:role/r{}", i),
                "AssumeRolePolicyDocument": {"Statement": [
                    {"Effect": "Deny", "Principal": {"AWS": "*"}},
                    {"Effect": "Allow", "Principal": {"AWS": principals}}
                ]},
                "AttachedManagedPolicies": [{"PolicyArn": policy_arn(rng.gen_range(0..policies))}]
            })
        })
        .collect();

    let group_list: Vec<Value> = (0..groups)
        .map(|i| {
            json!({
                "GroupId": format!("AGPA{:08}", i),
                "GroupName": format!("g{}", i),
                "AttachedManagedPolicies": [{"PolicyArn": policy_arn(rng.gen_range(0..policies))}]
            })
        })
        .collect();

    let policy_list: Vec<Value> = (0..policies)
        .map(|i| {
            json!({
                "PolicyId": format!("ANPA{:08}", i),
                "PolicyName": format!("p{}", i),
                "Arn": policy_arn(i),
                "DefaultVersionId": "v1",
                "PolicyVersionList": [{"VersionId": "v1", "Document": {"Statement": []}}]
            })
        })
        .collect();

    json!({
        "UserDetailList": user_list,
        "RoleDetailList": role_list,
        "GroupDetailList": group_list,
        "Policies": policy_list
    })
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for users in [100, 1_000, 5_000] {
        let raw = synthetic_export(users, 42);
        group.throughput(Throughput::Elements(users as u64));
        group.bench_with_input(BenchmarkId::from_parameter(users), &raw, |b, raw| {
            b.iter(|| black_box(normalize(raw)));
        });
    }

    group.finish();
}

fn model_for(users: usize) -> AuthorizationModel {
    normalize(&synthetic_export(users, 7))
}

fn bench_assumable_roles(c: &mut Criterion) {
    let mut group = c.benchmark_group("assumable_roles_for");

    for users in [100, 1_000, 5_000] {
        let model = model_for(users);
        group.bench_with_input(BenchmarkId::from_parameter(users), &model, |b, model| {
            let resolver = model.resolver();
            let user = model.users().as_slice().last();
            b.iter(|| {
                if let Some(user) = user {
                    black_box(resolver.assumable_roles_for(user));
                }
            });
        });
    }

    group.finish();
}

fn bench_attached_entities(c: &mut Criterion) {
    let mut group = c.benchmark_group("attached_entities_of");

    for users in [100, 1_000, 5_000] {
        let model = model_for(users);
        group.bench_with_input(BenchmarkId::from_parameter(users), &model, |b, model| {
            let resolver = model.resolver();
            let policy = model.policies().as_slice().first();
            b.iter(|| {
                if let Some(policy) = policy {
                    black_box(resolver.attached_entities_of(policy));
                }
            });
        });
    }

    group.finish();
}

fn bench_point_lookups(c: &mut Criterion) {
    let model = model_for(5_000);
    let ids: Vec<String> = model.users().iter().map(|u| u.user_id.clone()).collect();

    c.bench_function("user_lookup_and_groups", |b| {
        let resolver = model.resolver();
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % ids.len();
            if let Some(user) = model.user(&ids[i]) {
                black_box(resolver.groups_of(user));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_normalize,
    bench_assumable_roles,
    bench_attached_entities,
    bench_point_lookups
);
criterion_main!(benches);
