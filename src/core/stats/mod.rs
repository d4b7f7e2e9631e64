pub mod stats_fetcher;
pub mod stats_models;

pub use stats_fetcher::{FetchError, StatsFetcher};
pub use stats_models::{format_stats_message, milestone, GameStats};
