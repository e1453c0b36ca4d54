//! Benchmarks for matrix build and strategy scoring
//!
//! Run with: cargo bench --package engine
//!
//! Uses a synthetic store so the numbers do not depend on a dataset on disk.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{Item, ItemCatalog, RatingEntry, RatingStore};
use engine::{
    build_user_context, CollaborativeStrategy, ContentStrategy, PopularityStrategy,
    RatingMatrixBuilder, RecommendationStrategy,
};
use std::sync::Arc;

const USERS: usize = 600;
const ITEMS: usize = 1_500;
const TAGS: [&str; 6] = ["Action", "Comedy", "Drama", "Sci-Fi", "Romance", "Thriller"];

fn synthetic_data() -> (Arc<RatingStore>, Arc<ItemCatalog>) {
    let mut catalog = ItemCatalog::new();
    for item in 0..ITEMS {
        let tags = format!("{}|{}", TAGS[item % TAGS.len()], TAGS[(item / 7) % TAGS.len()]);
        catalog.insert(Item::new(item.to_string(), format!("Item {}", item), tags));
    }

    let mut store = RatingStore::new();
    for user in 0..USERS {
        // Roughly 5% density, deterministic
        for item in (user % 20..ITEMS).step_by(20) {
            let value = ((user * 31 + item * 17) % 5 + 1) as f32;
            store.insert(RatingEntry::new(user.to_string(), item.to_string(), value));
        }
    }

    (Arc::new(store), Arc::new(catalog))
}

fn bench_matrix_build(c: &mut Criterion) {
    let (store, catalog) = synthetic_data();
    let builder = RatingMatrixBuilder::new();

    c.bench_function("matrix_build", |b| {
        b.iter(|| {
            let build = builder.build(black_box(&store), black_box(&catalog));
            black_box(build)
        })
    });
}

fn bench_similarities(c: &mut Criterion) {
    let (store, catalog) = synthetic_data();
    let matrix = Arc::new(RatingMatrixBuilder::new().build(&store, &catalog).matrix);
    let strategy = CollaborativeStrategy::new(matrix.clone(), 10);

    let context = build_user_context(&store, "1")
        .and_then(|context| context.attach_matrix(&matrix))
        .expect("Failed to build user context");
    let row = context.matrix_row().expect("context has a matrix row");

    c.bench_function("collaborative_similarities", |b| {
        b.iter(|| black_box(strategy.similarities(black_box(row))))
    });

    c.bench_function("collaborative_recommend", |b| {
        b.iter(|| black_box(strategy.recommend(black_box(&context))))
    });
}

fn bench_popularity(c: &mut Criterion) {
    let (store, _) = synthetic_data();
    let strategy = PopularityStrategy::new(store.clone(), 5);
    let context = build_user_context(&store, "1").expect("Failed to build user context");

    c.bench_function("popularity_recommend", |b| {
        b.iter(|| black_box(strategy.recommend(black_box(&context))))
    });
}

fn bench_content(c: &mut Criterion) {
    let (store, catalog) = synthetic_data();
    let strategy = ContentStrategy::new(store.clone(), catalog);
    let context = build_user_context(&store, "1").expect("Failed to build user context");

    c.bench_function("content_recommend", |b| {
        b.iter(|| black_box(strategy.recommend(black_box(&context))))
    });

    let terms = strategy.term_matrix();
    c.bench_function("content_user_profiles", |b| {
        b.iter(|| black_box(strategy.user_profiles(black_box(&terms))))
    });
}

criterion_group!(
    benches,
    bench_matrix_build,
    bench_similarities,
    bench_popularity,
    bench_content
);
criterion_main!(benches);
