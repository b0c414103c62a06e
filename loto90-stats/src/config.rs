use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Constantes empiriques des analyses. Aucune n'a de dérivation
/// statistique rigoureuse : elles sont toutes ajustables par fichier JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub cooccurrence: CoOccurrenceTunables,
    pub rules: RuleTunables,
    pub anomaly: AnomalyTunables,
    pub heat: HeatTunables,
    pub aggregator: AggregatorTunables,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoOccurrenceTunables {
    pub top_k: usize,
    pub top_triplets: usize,
}

impl Default for CoOccurrenceTunables {
    fn default() -> Self {
        Self { top_k: 10, top_triplets: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTunables {
    /// Probabilité minimale (en %) pour retenir une règle.
    pub min_probability: f64,
    pub high_confidence: f64,
    pub medium_confidence: f64,
    pub max_rules: usize,
    pub max_combinations: usize,
    /// Constante de temps (jours) de la décroissance exp(-jours/τ).
    pub decay_days: f64,
}

impl Default for RuleTunables {
    fn default() -> Self {
        Self {
            min_probability: 40.0,
            high_confidence: 70.0,
            medium_confidence: 50.0,
            max_rules: 10,
            max_combinations: 8,
            decay_days: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyTunables {
    pub window: usize,
    pub min_draws: usize,
    pub consecutive_threshold: usize,
    pub consecutive_score: f64,
    /// χ² critique pour 90 degrés de liberté à p = 0.05.
    pub chi_square_critical: f64,
    pub chi_square_factor: f64,
    pub chi_square_score: f64,
    pub spike_rate: f64,
    pub spike_high_rate: f64,
    pub spike_score_factor: f64,
    pub duplicate_pairs: usize,
    pub duplicate_min_overlap: usize,
    pub duplicate_score: f64,
    pub max_results: usize,
}

impl Default for AnomalyTunables {
    fn default() -> Self {
        Self {
            window: 50,
            min_draws: 10,
            consecutive_threshold: 3,
            consecutive_score: 20.0,
            chi_square_critical: 112.02,
            chi_square_factor: 1.5,
            chi_square_score: 90.0,
            spike_rate: 15.0,
            spike_high_rate: 20.0,
            spike_score_factor: 3.0,
            duplicate_pairs: 10,
            duplicate_min_overlap: 4,
            duplicate_score: 25.0,
            max_results: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatTunables {
    pub recency_decay: f64,
    pub frequency_scale: f64,
    pub trend_window: usize,
    pub trend_up: f64,
    pub trend_down: f64,
    pub hot: f64,
    pub warm: f64,
    pub cold: f64,
}

impl Default for HeatTunables {
    fn default() -> Self {
        Self {
            recency_decay: 0.1,
            frequency_scale: 10.0,
            trend_window: 10,
            trend_up: 1.5,
            trend_down: 0.5,
            hot: 0.8,
            warm: 0.5,
            cold: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorTunables {
    pub accuracy_weight: f64,
    /// Bonus par numéro du meilleur résultat.
    pub best_match_bonus: f64,
    /// Bonus appliqué au taux de prédictions excellentes (0..1).
    pub excellent_bonus: f64,
    pub excellent_threshold: u8,
    pub alternatives: usize,
    pub consensus_voters: usize,
    pub consensus_size: usize,
}

impl Default for AggregatorTunables {
    fn default() -> Self {
        Self {
            accuracy_weight: 1.0,
            best_match_bonus: 5.0,
            excellent_bonus: 20.0,
            excellent_threshold: 3,
            alternatives: 2,
            consensus_voters: 3,
            consensus_size: 5,
        }
    }
}

pub fn save_tunables(tunables: &Tunables, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(tunables)?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}

fn at_least_one(value: &mut usize, name: &str) {
    if *value == 0 {
        tracing::warn!(field = name, "réglage nul ramené à 1");
        *value = 1;
    }
}

impl Tunables {
    /// Ramène à 1 les tailles de fenêtre et d'ensemble nulles.
    pub fn sanitized(mut self) -> Self {
        at_least_one(&mut self.anomaly.window, "anomaly.window");
        at_least_one(&mut self.anomaly.min_draws, "anomaly.min_draws");
        at_least_one(&mut self.heat.trend_window, "heat.trend_window");
        at_least_one(&mut self.aggregator.consensus_size, "aggregator.consensus_size");
        at_least_one(&mut self.aggregator.consensus_voters, "aggregator.consensus_voters");
        self
    }
}

pub fn load_tunables(path: &Path) -> Result<Tunables> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let tunables: Tunables = serde_json::from_str(&json)
        .with_context(|| format!("Fichier de réglages invalide {:?}", path))?;
    Ok(tunables.sanitized())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        let t = Tunables::default();
        assert!((t.anomaly.chi_square_critical - 112.02).abs() < 1e-12);
        assert_eq!(t.anomaly.window, 50);
        assert_eq!(t.rules.max_rules, 10);
        assert_eq!(t.rules.max_combinations, 8);
        assert_eq!(t.cooccurrence.top_k, 10);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reglages.json");
        let mut tunables = Tunables::default();
        tunables.heat.hot = 0.9;
        save_tunables(&tunables, &path).unwrap();
        assert_eq!(load_tunables(&path).unwrap(), tunables);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partiel.json");
        std::fs::write(&path, r#"{"anomaly": {"window": 30}}"#).unwrap();
        let tunables = load_tunables(&path).unwrap();
        assert_eq!(tunables.anomaly.window, 30);
        assert_eq!(tunables.anomaly.min_draws, 10);
        assert_eq!(tunables.heat, HeatTunables::default());
    }

    #[test]
    fn test_zero_sizes_are_clamped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zeros.json");
        std::fs::write(
            &path,
            r#"{"anomaly": {"window": 0, "min_draws": 0},
                "heat": {"trend_window": 0},
                "aggregator": {"consensus_size": 0, "consensus_voters": 0}}"#,
        )
        .unwrap();
        let tunables = load_tunables(&path).unwrap();
        assert_eq!(tunables.anomaly.window, 1);
        assert_eq!(tunables.anomaly.min_draws, 1);
        assert_eq!(tunables.heat.trend_window, 1);
        assert_eq!(tunables.aggregator.consensus_size, 1);
        assert_eq!(tunables.aggregator.consensus_voters, 1);
        assert_eq!(Tunables::default().sanitized(), Tunables::default());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_tunables(&dir.path().join("absent.json")).is_err());
    }
}
