//! Example: run every strategy for one user on a small synthetic store
//!
//! Run with: RUST_LOG=debug cargo run --package engine --example compare_strategies
//!
//! This example shows how to:
//! 1. Build a store and catalog in memory
//! 2. Run each strategy through the `Recommender`
//! 3. Build content profiles for every user at once

use data_loader::{Item, ItemCatalog, RatingEntry, RatingStore};
use engine::{ContentStrategy, Recommender, RunParams, StrategyKind};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const TAGS: [&str; 5] = ["Action", "Comedy", "Drama", "Sci-Fi", "Romance"];

fn synthetic_data() -> (ItemCatalog, RatingStore) {
    let mut catalog = ItemCatalog::new();
    for item in 0..40 {
        let tags = format!("{}|{}", TAGS[item % TAGS.len()], TAGS[(item / 3) % TAGS.len()]);
        catalog.insert(Item::new(item.to_string(), format!("Item {}", item), tags));
    }

    let mut store = RatingStore::new();
    for user in 0..25usize {
        for item in (user % 4..40).step_by(4) {
            let value = ((user * 7 + item * 3) % 5 + 1) as f32;
            store.insert(RatingEntry::new(user.to_string(), item.to_string(), value));
        }
    }
    // A user whose only rating is zero has no content profile
    store.insert(RatingEntry::new("cold", "0", 0.0));

    (catalog, store)
}

fn main() -> engine::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let (catalog, store) = synthetic_data();
    let recommender = Recommender::new(Arc::new(store), Arc::new(catalog));
    let params = RunParams::new("3").with_neighbours(5).with_min_votes(3);

    for kind in [
        StrategyKind::Popularity,
        StrategyKind::Collaborative,
        StrategyKind::Content,
    ] {
        let items = recommender.run_strategy(kind, &params)?;
        println!("{}:", kind);
        for item in recommender.describe(&items) {
            match item.score {
                Some(score) => println!("  {} [{}] {:.3}", item.title, item.tags, score),
                None => println!("  {} [{}]", item.title, item.tags),
            }
        }
    }

    let content = ContentStrategy::new(recommender.store().clone(), recommender.catalog().clone());
    let start = Instant::now();
    let terms = content.term_matrix();
    let profiles = content.user_profiles(&terms);
    let empty = profiles.values().filter(|p| p.iter().all(|w| *w == 0.0)).count();
    println!(
        "\nBuilt {} content profiles over {} terms in {:?} ({} empty)",
        profiles.len(),
        terms.terms(),
        start.elapsed(),
        empty
    );

    Ok(())
}
