pub mod aggregator;
pub mod anomaly;
pub mod backtest;
pub mod config;
pub mod cooccurrence;
pub mod dashboard;
pub mod frequency;
pub mod heat;
pub mod rules;
pub mod strategies;

#[cfg(test)]
pub(crate) mod test_support;
