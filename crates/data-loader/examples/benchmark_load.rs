//! Time dataset ingestion.
//!
//! Run with: cargo run --release --example benchmark_load -- [movies|books] [data_dir]

use data_loader::{Dataset, DatasetKind};
use std::env;
use std::path::PathBuf;
use std::time::Instant;

fn main() {
    let mut args = env::args().skip(1);
    let kind = match args.next().as_deref() {
        Some("books") => DatasetKind::Books,
        _ => DatasetKind::Movies,
    };
    let data_dir = PathBuf::from(args.next().unwrap_or_else(|| "dataset".to_string()));

    println!("Loading {} dataset from {}...\n", kind.name(), data_dir.display());

    let start = Instant::now();
    let dataset = Dataset::load_from_files(&data_dir, &kind.layout())
        .expect("Failed to load dataset");
    let elapsed = start.elapsed();

    let (users, ratings) = dataset.store.counts();
    let dangling = dataset.dangling_references().len();

    println!("=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Users: {}  Items: {}  Ratings: {}", users, dataset.catalog.len(), ratings);
    println!("Ratings referencing unknown items: {}", dangling);
    println!(
        "Throughput: {:.0} ratings/second",
        ratings as f64 / elapsed.as_secs_f64()
    );
}
