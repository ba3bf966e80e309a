use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use rust_decimal_macros::dec;
use storefront_rs::models::AddCartItemRequest;
use storefront_rs::repositories::{
    CartRepository, Database, SqlCartRepository, SqlProductRepository,
};
use storefront_rs::services::CartService;

async fn setup(user_id: i64) -> (Database, Arc<SqlCartRepository>, CartService) {
    let database = Database::connect_in_memory().await.unwrap();
    let cart_repository = Arc::new(SqlCartRepository::new(&database));
    let product_repository = Arc::new(SqlProductRepository::new(&database));
    let service = CartService::new(cart_repository.clone(), product_repository);
    service.create_cart(user_id).await.unwrap();
    (database, cart_repository, service)
}

fn bench_add_item_merge(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (_database, _, service) = rt.block_on(setup(1));

    let mut group = c.benchmark_group("cart_add_item");
    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));

    // The same product every iteration exercises the merge path
    group.bench_function("merge_existing_line", |b| {
        b.iter(|| {
            rt.block_on(async {
                let request = AddCartItemRequest {
                    product_id: 42,
                    quantity: 1,
                    price: Some(dec!(3.99)),
                };
                black_box(service.add_item(1, request).await.unwrap())
            })
        });
    });
    group.finish();
}

fn bench_recompute_total(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("cart_recompute_total");
    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));

    for line_count in [1i64, 10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::new("lines", line_count),
            line_count,
            |b, &lines| {
                let (_database, repository, _) = rt.block_on(setup(1));
                let cart_id = rt.block_on(async {
                    let cart = repository.get_active_cart(1).await.unwrap();
                    for product_id in 1..=lines {
                        repository
                            .add_item(cart.id, product_id, 2, dec!(1.25))
                            .await
                            .unwrap();
                    }
                    cart.id
                });

                b.iter(|| {
                    rt.block_on(async {
                        black_box(repository.recompute_total(cart_id).await.unwrap())
                    })
                });
            },
        );
    }
    group.finish();
}

fn bench_get_cart(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (_database, repository, service) = rt.block_on(setup(1));
    rt.block_on(async {
        let cart = repository.get_active_cart(1).await.unwrap();
        for product_id in 1..=25 {
            repository
                .add_item(cart.id, product_id, 1, dec!(9.99))
                .await
                .unwrap();
        }
    });

    let mut group = c.benchmark_group("cart_view");
    group.sample_size(200);
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("get_cart_25_lines", |b| {
        b.iter(|| rt.block_on(async { black_box(service.get_cart(1).await.unwrap()) }));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_add_item_merge,
    bench_recompute_total,
    bench_get_cart
);
criterion_main!(benches);
