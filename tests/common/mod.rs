//! Shared helpers for the integration suites

use podium::config::Config;
use podium::engine::Engine;
use podium::models::{Competitor, ResultSet};
use std::sync::Arc;

/// An engine with default configuration and no source
#[allow(dead_code)]
pub fn engine() -> Arc<Engine> {
    Engine::from_config(&Config::default()).expect("engine from default config")
}

/// An engine whose default source points at the given reference
#[allow(dead_code)]
pub fn engine_with_source(source: &str) -> Arc<Engine> {
    let mut config = Config::default();
    config.source.default_source = Some(source.to_string());
    Engine::from_config(&config).expect("engine with source")
}

/// `n` competitors ranked 1..=n, named "Skater 1".."Skater n"
#[allow(dead_code)]
pub fn competitors(n: usize) -> Vec<Competitor> {
    (1..=n)
        .map(|i| Competitor {
            rank: i as u32,
            name: format!("Skater {i}"),
            ..Default::default()
        })
        .collect()
}

/// A loaded live set with the given number of competitors
#[allow(dead_code)]
pub fn result_set(n: usize) -> ResultSet {
    ResultSet::new(
        Some("Inline Freestyle".to_string()),
        Some("Senior Men".to_string()),
        competitors(n),
    )
}
