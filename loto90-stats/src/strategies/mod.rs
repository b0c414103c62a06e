pub mod follow;
pub mod frequency;
pub mod gap;
pub mod heat;
pub mod rules;

use std::collections::BTreeMap;

use loto90_db::models::{AlgorithmConfig, Draw, ParamValue, POOL_SIZE};

use crate::config::Tunables;
use crate::frequency::number_frequencies;

/// Stratégie de prédiction nommée.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;
    /// draws[0] = tirage le plus récent. `None` si l'historique est vide.
    fn predict(&self, draws: &[Draw]) -> Option<[u8; 5]>;
    fn params(&self) -> BTreeMap<String, f64>;
}

pub const DEFAULT_WINDOW: usize = 50;

/// Paramètre reconnu par toutes les stratégies : `window` (nombre de tirages).
pub(crate) fn window_param(config: &AlgorithmConfig) -> usize {
    config
        .param_f64("window")
        .filter(|w| *w >= 1.0)
        .map_or(DEFAULT_WINDOW, |w| w as usize)
}

pub(crate) fn recent(draws: &[Draw], window: usize) -> &[Draw] {
    &draws[..window.min(draws.len())]
}

/// Retient les 5 meilleurs candidats (score décroissant, numéro croissant),
/// complétés au besoin par les numéros les plus fréquents.
pub(crate) fn pick_top(mut candidates: Vec<(u8, f64)>, draws: &[Draw]) -> Option<[u8; 5]> {
    if draws.is_empty() {
        return None;
    }

    candidates.retain(|&(n, s)| (1..=POOL_SIZE).contains(&n) && s > 0.0);
    candidates.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    let mut picked: Vec<u8> = Vec::with_capacity(5);
    let fallback = frequency_ranking(draws);
    for n in candidates.into_iter().map(|(n, _)| n).chain(fallback) {
        if !picked.contains(&n) {
            picked.push(n);
        }
        if picked.len() == 5 {
            break;
        }
    }

    let mut grid: [u8; 5] = picked.try_into().ok()?;
    grid.sort_unstable();
    Some(grid)
}

/// Tous les numéros, du plus fréquent au moins fréquent (le plus récent d'abord à égalité).
pub(crate) fn frequency_ranking(draws: &[Draw]) -> Vec<u8> {
    let mut stats = number_frequencies(draws, POOL_SIZE);
    stats.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then(
                a.last_appearance_index
                    .unwrap_or(usize::MAX)
                    .cmp(&b.last_appearance_index.unwrap_or(usize::MAX)),
            )
            .then(a.number.cmp(&b.number))
    });
    stats.into_iter().map(|s| s.number).collect()
}

pub const STRATEGY_NAMES: [&str; 5] = [
    frequency::NAME,
    heat::NAME,
    gap::NAME,
    follow::NAME,
    rules::NAME,
];

pub fn build_strategy(config: &AlgorithmConfig, tunables: &Tunables) -> Option<Box<dyn Strategy>> {
    let window = window_param(config);
    let strategy: Box<dyn Strategy> = match config.name.as_str() {
        frequency::NAME => Box::new(frequency::FrequencyStrategy::new(window)),
        heat::NAME => Box::new(heat::HeatStrategy::new(window, tunables.heat.clone())),
        gap::NAME => Box::new(gap::GapStrategy::new(window)),
        follow::NAME => Box::new(follow::FollowStrategy::new(window)),
        rules::NAME => Box::new(rules::RulesStrategy::new(window, tunables.rules.clone())),
        other => {
            tracing::warn!(algorithm = other, "algorithme inconnu, ignoré");
            return None;
        }
    };
    Some(strategy)
}

/// Instancie les stratégies activées, dans l'ordre des configurations.
pub fn build_strategies(configs: &[AlgorithmConfig], tunables: &Tunables) -> Vec<Box<dyn Strategy>> {
    configs
        .iter()
        .filter(|c| c.enabled)
        .filter_map(|c| build_strategy(c, tunables))
        .collect()
}

pub fn default_algorithm_configs() -> Vec<AlgorithmConfig> {
    STRATEGY_NAMES
        .iter()
        .map(|&name| {
            AlgorithmConfig::new(name, 1.0)
                .with_param("window", ParamValue::Number(DEFAULT_WINDOW as f64))
        })
        .collect()
}
