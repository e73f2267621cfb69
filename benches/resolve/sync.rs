#![allow(dead_code)]

use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use stevedore::{capability, BuildContext, Container};

trait Handler: Send + Sync {}

struct HA;
struct HB;
struct HC;

impl Handler for HA {}
impl Handler for HB {}
impl Handler for HC {}

capability!(dyn Handler => [HA, HB, HC]);

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("sync_get_single", |b| {
        struct A;

        let container = Container::new();
        container.provide(|_| A);
        container.create_scope("app");

        let ctx = container.context().in_scope("app");
        b.iter(|| container.get::<A>("app", &ctx).unwrap());
    })
    .bench_function("sync_get_many", |b| {
        struct A(Arc<B>, Arc<C>);
        struct B(i32);
        struct C(Arc<CA>);
        struct CA(Arc<CAA>);
        struct CAA;

        let container = Container::new();
        container.provide(|_| CAA);
        container.provide(|ctx: &BuildContext| CA(ctx.must_get().unwrap()));
        container.provide(|ctx: &BuildContext| C(ctx.must_get().unwrap()));
        container.provide(|_| B(2));
        container.provide(|ctx: &BuildContext| A(ctx.must_get().unwrap(), ctx.must_get().unwrap()));
        container.create_scope("request");

        let ctx = container.context().in_scope("request");
        b.iter(|| container.get::<A>("request", &ctx).unwrap());
    })
    .bench_function("sync_build_single", |b| {
        struct A;

        let container = Container::new();
        container.provide(|_| A);

        let ctx = container.context();
        b.iter(|| container.build::<A>(&ctx).unwrap());
    })
    .bench_function("sync_build_many", |b| {
        struct A(Arc<B>, Arc<C>);
        struct B(i32);
        struct C(Arc<CA>);
        struct CA(Arc<CAA>);
        struct CAA;

        let container = Container::new();
        container.provide(|_| CAA);
        container.provide(|ctx: &BuildContext| CA(ctx.must_get().unwrap()));
        container.provide(|ctx: &BuildContext| C(ctx.must_get().unwrap()));
        container.provide(|_| B(2));
        container.provide(|ctx: &BuildContext| A(ctx.must_get().unwrap(), ctx.must_get().unwrap()));

        let ctx = container.context();
        b.iter(|| container.build::<A>(&ctx).unwrap());
    })
    .bench_function("sync_all", |b| {
        let container = Container::new();
        container.provide_as::<dyn Handler, _>(|_| HA);
        container.provide_as::<dyn Handler, _>(|_| HB);
        container.provide_as::<dyn Handler, _>(|_| HC);
        container.create_scope("request");

        let ctx = container.context().in_scope("request");
        b.iter(|| container.all::<dyn Handler>("request", &ctx));
    })
    .bench_function("sync_scope_lifecycle", |b| {
        struct A;

        let container = Container::new();
        container.provide(|_| A);

        let ctx = container.context().in_scope("request");
        b.iter(|| {
            container.create_scope("request");
            container.get::<A>("request", &ctx).unwrap();
            container.delete_scope("request").unwrap();
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
