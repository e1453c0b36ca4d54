use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::{Dataset, DatasetKind, Item, ItemId, UserId};
use engine::{
    PopularityStrategy, RatingMatrixBuilder, RecommendedItem, Recommender, RunParams,
    StrategyKind,
};
use evaluation::{EvaluationSummary, MetricsEvaluator};
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// recs - Recommendation engine for movie and book ratings
#[derive(Parser)]
#[command(name = "recs")]
#[command(about = "Popularity, collaborative and content-based recommendations", long_about = None)]
struct Cli {
    /// Directory holding the dataset folders
    #[arg(short, long, default_value = "dataset")]
    data_dir: PathBuf,

    /// Which dataset to load
    #[arg(long, value_enum, default_value = "movies")]
    dataset: DatasetArg,

    /// Write logs to a timestamped file in --log-dir instead of stderr
    #[arg(long)]
    log_file: bool,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Where rating matrix snapshots are cached
    #[arg(long, default_value = ".cache")]
    cache_dir: PathBuf,

    /// Always rebuild the rating matrix and never write a snapshot
    #[arg(long)]
    no_cache: bool,

    /// Treat explicit 0 ratings as unrated
    #[arg(long)]
    zero_as_missing: bool,

    /// Fail when a rating references an item missing from the catalog
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get recommendations for a user
    Recommend {
        #[arg(long, value_enum)]
        strategy: StrategyArg,

        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Neighbour count for the collaborative strategy
        #[arg(long, default_value = "10")]
        neighbours: usize,

        /// Minimum ratings per item for the popularity strategy
        #[arg(long, default_value = "1")]
        min_votes: u32,
    },

    /// Show a user's rating history
    User {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,
    },

    /// Search for items by title
    Search {
        /// Title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Run a strategy for random users and report latency and error metrics
    Benchmark {
        #[arg(long, value_enum)]
        strategy: StrategyArg,

        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        #[arg(long, default_value = "10")]
        neighbours: usize,

        #[arg(long, default_value = "1")]
        min_votes: u32,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DatasetArg {
    Movies,
    Books,
}

impl From<DatasetArg> for DatasetKind {
    fn from(arg: DatasetArg) -> Self {
        match arg {
            DatasetArg::Movies => DatasetKind::Movies,
            DatasetArg::Books => DatasetKind::Books,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Popularity,
    Collaborative,
    Content,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Popularity => StrategyKind::Popularity,
            StrategyArg::Collaborative => StrategyKind::Collaborative,
            StrategyArg::Content => StrategyKind::Content,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file, &cli.log_dir)?;

    let kind = DatasetKind::from(cli.dataset);

    // Load the dataset (this may take a moment)
    println!("Loading {} dataset from {}...", kind.name(), cli.data_dir.display());
    let start = Instant::now();
    let dataset = Dataset::load_from_files(&cli.data_dir, &kind.layout())
        .with_context(|| format!("Failed to load {} dataset", kind.name()))?;
    println!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());
    if cli.strict {
        dataset
            .validate()
            .context("Dataset failed strict validation")?;
    }

    let recommender = Recommender::new(Arc::new(dataset.store), Arc::new(dataset.catalog))
        .with_builder(RatingMatrixBuilder::new().with_zero_as_missing(cli.zero_as_missing));
    let cache = MatrixCache::new(&cli, kind);

    match cli.command {
        Commands::Recommend {
            strategy,
            user_id,
            neighbours,
            min_votes,
        } => {
            let params = RunParams::new(user_id)
                .with_neighbours(neighbours)
                .with_min_votes(min_votes);
            handle_recommend(recommender, &cache, strategy.into(), params)?
        }
        Commands::User { user_id } => handle_user(&recommender, &user_id)?,
        Commands::Search { title } => handle_search(&recommender, &title)?,
        Commands::Benchmark {
            strategy,
            requests,
            neighbours,
            min_votes,
        } => handle_benchmark(recommender, &cache, strategy.into(), requests, neighbours, min_votes)?,
    }

    Ok(())
}

/// Install the tracing subscriber, filtered by RUST_LOG (default: info)
fn init_logging(log_file: bool, log_dir: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if log_file {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let path = log_dir.join(format!("log_{}.txt", stamp));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

/// Rating matrix snapshot cache keyed on dataset, zero handling and the ratings file's size and mtime
struct MatrixCache {
    path: Option<PathBuf>,
}

impl MatrixCache {
    fn new(cli: &Cli, kind: DatasetKind) -> Self {
        if cli.no_cache {
            return Self { path: None };
        }
        let ratings_path = cli.data_dir.join(kind.layout().ratings_file);
        match fs::metadata(&ratings_path) {
            Ok(ratings) => Self {
                path: Some(cli.cache_dir.join(snapshot_file_name(kind, cli.zero_as_missing, &ratings))),
            },
            Err(e) => {
                warn!("Cannot stat {}, snapshot cache disabled: {}", ratings_path.display(), e);
                Self { path: None }
            }
        }
    }

    /// Give the recommender a cached matrix, or build one and cache it
    ///
    /// Cache problems are logged and never fatal.
    fn attach(&self, recommender: Recommender) -> Recommender {
        let Some(path) = &self.path else {
            return recommender;
        };

        if path.exists() {
            match RatingMatrixBuilder::load_snapshot(path) {
                Ok(matrix) => return recommender.with_matrix(matrix),
                Err(e) => warn!("Ignoring unreadable snapshot {}: {}", path.display(), e),
            }
        }

        let matrix = recommender.matrix();
        if let Some(dir) = path.parent() {
            if let Err(e) = fs::create_dir_all(dir) {
                warn!("Cannot create cache directory {}: {}", dir.display(), e);
                return recommender;
            }
        }
        if let Err(e) = matrix.save_snapshot(path) {
            warn!("Failed to write snapshot {}: {}", path.display(), e);
        }
        recommender
    }
}

/// Snapshot file name for a dataset, keyed on the ratings file's size and mtime
fn snapshot_file_name(kind: DatasetKind, zero_as_missing: bool, ratings: &fs::Metadata) -> String {
    let suffix = if zero_as_missing { "_zero_missing" } else { "" };
    let modified = ratings
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{}_matrix{}_{}_{}.json", kind.name(), suffix, ratings.len(), modified)
}

/// Handle the 'recommend' command
fn handle_recommend(
    recommender: Recommender,
    cache: &MatrixCache,
    strategy: StrategyKind,
    params: RunParams,
) -> Result<()> {
    let recommender = if strategy.needs_matrix() {
        cache.attach(recommender)
    } else {
        recommender
    };

    let items = recommender
        .run_strategy(strategy, &params)
        .with_context(|| format!("{} strategy failed for user {}", strategy, params.user_id))?;

    print_recommendations(strategy, &recommender.describe(&items));

    let evaluation = MetricsEvaluator::new().evaluate(recommender.store(), &params.user_id, &items);
    if evaluation.is_computed() {
        println!("{} {}", "Evaluation:".bold(), evaluation);
    } else {
        println!("{} {}", "Evaluation:".bold(), evaluation.to_string().yellow());
    }
    Ok(())
}

/// Handle the 'user' command
fn handle_user(recommender: &Recommender, user_id: &str) -> Result<()> {
    let catalog = recommender.catalog();
    let ratings = recommender
        .store()
        .get_user_ratings(user_id)
        .ok_or_else(|| anyhow!("User {} not found", user_id))?;

    println!("{}", format!("User ID: {}", user_id).bold().blue());
    println!("{}Number of ratings: {}", "• ".cyan(), ratings.len());
    println!("{}Average rating: {:.2}", "• ".cyan(), ratings.mean().unwrap_or(0.0));

    let mut top_rated: Vec<(&ItemId, f32)> = ratings.iter().collect();
    top_rated.sort_by(|a, b| b.1.total_cmp(&a.1));
    println!("Top rated items:");
    for (item_id, value) in top_rated.iter().take(5) {
        let title = catalog
            .get(item_id)
            .map(|item| item.title.as_str())
            .unwrap_or("<not in catalog>");
        println!("  - {} (Rating: {})", title, value);
    }

    // Tag preferences: average rating per tag
    let mut tag_ratings: HashMap<&str, (f32, u32)> = HashMap::new();
    for (item_id, value) in ratings.iter() {
        let Some(item) = catalog.get(item_id) else {
            continue;
        };
        for tag in item.tags.split('|').filter(|t| !t.is_empty()) {
            let entry = tag_ratings.entry(tag).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }
    let mut preferences: Vec<(&str, f32, u32)> = tag_ratings
        .into_iter()
        .map(|(tag, (total, count))| (tag, total / count as f32, count))
        .collect();
    preferences.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    println!("Tag preferences:");
    for (tag, avg, count) in preferences.iter().take(10) {
        println!("  - {}: Average Rating: {:.2} ({} ratings)", tag, avg, count);
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(recommender: &Recommender, title: &str) -> Result<()> {
    let title_lower = title.to_lowercase();
    let tallies = PopularityStrategy::new(recommender.store().clone(), 0).tally();

    // (relevance, item) where 0 = exact match, 1 = substring match
    let mut matches: Vec<(u8, &Item)> = recommender
        .catalog()
        .iter()
        .filter_map(|item| {
            let item_title = item.title.to_lowercase();
            if item_title == title_lower {
                Some((0, item))
            } else if item_title.contains(&title_lower) {
                Some((1, item))
            } else {
                None
            }
        })
        .collect();
    matches.sort_by_key(|(relevance, _)| *relevance);

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("  no matches");
    }
    for (_, item) in matches.iter().take(20) {
        let tally = tallies.get(&item.id).copied().unwrap_or_default();
        println!(
            "{}: {} [{}] avg {:.2} ({} ratings)",
            item.id,
            item.title,
            item.tags,
            tally.mean(),
            tally.count
        );
    }
    Ok(())
}

/// Handle the 'benchmark' command
fn handle_benchmark(
    recommender: Recommender,
    cache: &MatrixCache,
    strategy: StrategyKind,
    requests: usize,
    neighbours: usize,
    min_votes: u32,
) -> Result<()> {
    if requests == 0 {
        bail!("--requests must be at least 1");
    }
    let recommender = if strategy.needs_matrix() {
        cache.attach(recommender)
    } else {
        recommender
    };

    let user_ids = recommender.store().user_ids();
    if user_ids.is_empty() {
        bail!("Dataset has no users to benchmark");
    }

    let evaluator = MetricsEvaluator::new();
    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    let mut evaluations = Vec::with_capacity(requests);
    let mut failures = 0usize;

    let total_start = Instant::now();
    for _ in 0..requests {
        let user_id = &user_ids[rand::random::<u32>() as usize % user_ids.len()];
        let params = RunParams::new(user_id.clone())
            .with_neighbours(neighbours)
            .with_min_votes(min_votes);

        let start = Instant::now();
        match recommender.run_strategy(strategy, &params) {
            Ok(items) => {
                timings.push(start.elapsed());
                evaluations.push(evaluator.evaluate(recommender.store(), user_id, &items));
            }
            Err(e) => {
                failures += 1;
                warn!("Request for user {} failed: {}", user_id, e);
            }
        }
    }
    let total_time = total_start.elapsed();

    if timings.is_empty() {
        bail!("All {} requests failed", requests);
    }

    let avg_latency = timings.iter().sum::<Duration>() / timings.len() as u32;
    timings.sort();
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f64 / total_time.as_secs_f64();
    let summary = EvaluationSummary::from_evaluations(&evaluations);

    println!("{}", format!("Benchmark results ({}):", strategy).bold().blue());
    println!("Requests: {} ({} failed)", requests, failures);
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);
    println!("Metrics: {}", summary);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(strategy: StrategyKind, recommendations: &[RecommendedItem]) {
    println!("{}", format!("Recommendations ({}):", strategy).bold().blue());
    if recommendations.is_empty() {
        println!("  nothing to recommend");
    }
    for (rank, item) in recommendations.iter().enumerate() {
        let score = match item.score {
            Some(score) => format!("{:.2}", score),
            None => "-".to_string(),
        };
        println!(
            "{}. {} [{}] - Score: {}",
            (rank + 1).to_string().green(),
            item.title,
            item.tags,
            score
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_name_follows_ratings_file() {
        let dir = tempdir().unwrap();
        let ratings = dir.path().join("ratings.csv");

        fs::write(&ratings, "user,item,rating\n1,10,4.0\n").unwrap();
        let first = snapshot_file_name(DatasetKind::Movies, false, &fs::metadata(&ratings).unwrap());
        let again = snapshot_file_name(DatasetKind::Movies, false, &fs::metadata(&ratings).unwrap());
        assert_eq!(first, again);

        fs::write(&ratings, "user,item,rating\n1,10,4.0\n2,10,3.0\n").unwrap();
        let changed = snapshot_file_name(DatasetKind::Movies, false, &fs::metadata(&ratings).unwrap());
        assert_ne!(first, changed);
    }

    #[test]
    fn test_snapshot_name_separates_zero_handling() {
        let dir = tempdir().unwrap();
        let ratings = dir.path().join("ratings.csv");
        fs::write(&ratings, "user,item,rating\n").unwrap();
        let meta = fs::metadata(&ratings).unwrap();

        let plain = snapshot_file_name(DatasetKind::Books, false, &meta);
        let zero = snapshot_file_name(DatasetKind::Books, true, &meta);
        assert!(plain.starts_with("books_matrix_"));
        assert!(zero.starts_with("books_matrix_zero_missing_"));
    }
}
