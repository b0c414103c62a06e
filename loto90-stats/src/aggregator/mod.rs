pub mod consensus;

use std::collections::BTreeMap;

use serde::Serialize;

use loto90_db::models::{AlgorithmConfig, AlgorithmPerformanceRecord, Draw};

use crate::config::{AggregatorTunables, Tunables};
use crate::strategies::build_strategy;
use consensus::StrategyPrediction;

/// Résumé des performances récentes d'une stratégie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub algorithm: String,
    pub avg_accuracy: f64,
    pub best_match: u8,
    pub total_predictions: usize,
    pub excellent_predictions: usize,
}

impl PerformanceSummary {
    pub fn excellent_rate(&self) -> f64 {
        if self.total_predictions == 0 {
            0.0
        } else {
            self.excellent_predictions as f64 / self.total_predictions as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredAlgorithm {
    pub algorithm: String,
    pub weight: f64,
    pub score: f64,
    pub summary: PerformanceSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmRecommendation {
    pub primary: ScoredAlgorithm,
    pub alternatives: Vec<ScoredAlgorithm>,
}

/// Regroupe les évaluations par algorithme (ordre alphabétique).
pub fn summarize_performance(
    records: &[AlgorithmPerformanceRecord],
    excellent_threshold: u8,
) -> Vec<PerformanceSummary> {
    let mut grouped: BTreeMap<&str, Vec<&AlgorithmPerformanceRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.algorithm.as_str()).or_default().push(record);
    }

    grouped
        .into_iter()
        .map(|(algorithm, records)| {
            let total = records.len();
            let accuracy_sum: f64 = records.iter().map(|r| r.accuracy_score).sum();
            PerformanceSummary {
                algorithm: algorithm.to_string(),
                avg_accuracy: accuracy_sum / total as f64,
                best_match: records.iter().map(|r| r.match_count).max().unwrap_or(0),
                total_predictions: total,
                excellent_predictions: records
                    .iter()
                    .filter(|r| r.match_count >= excellent_threshold)
                    .count(),
            }
        })
        .collect()
}

/// Score croissant en précision moyenne, meilleur résultat et taux
/// de prédictions excellentes, multiplié par le poids configuré.
pub fn score_algorithm(summary: &PerformanceSummary, weight: f64, tunables: &AggregatorTunables) -> f64 {
    let blend = summary.avg_accuracy * tunables.accuracy_weight.max(0.0)
        + f64::from(summary.best_match) * tunables.best_match_bonus.max(0.0)
        + summary.excellent_rate() * tunables.excellent_bonus.max(0.0);
    blend * weight.max(0.0)
}

/// `None` : aucun algorithme activé ou aucun historique de performance.
pub fn recommend(
    configs: &[AlgorithmConfig],
    summaries: &[PerformanceSummary],
    tunables: &AggregatorTunables,
) -> Option<AlgorithmRecommendation> {
    let mut scored: Vec<ScoredAlgorithm> = configs
        .iter()
        .filter(|c| c.enabled)
        .filter_map(|config| {
            let summary = summaries
                .iter()
                .find(|s| s.algorithm == config.name && s.total_predictions > 0)?;
            Some(ScoredAlgorithm {
                algorithm: config.name.clone(),
                weight: config.weight,
                score: score_algorithm(summary, config.weight, tunables),
                summary: summary.clone(),
            })
        })
        .collect();

    if scored.is_empty() {
        tracing::debug!(configs = configs.len(), "aucune recommandation disponible");
        return None;
    }

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.algorithm.cmp(&b.algorithm))
    });

    let mut ranked = scored.into_iter();
    let primary = ranked.next()?;
    let alternatives = ranked.take(tunables.alternatives).collect();
    Some(AlgorithmRecommendation { primary, alternatives })
}

/// Grilles actuelles des algorithmes recommandés (principal d'abord),
/// prêtes pour le vote de consensus.
pub fn recommended_predictions(
    recommendation: &AlgorithmRecommendation,
    configs: &[AlgorithmConfig],
    draws: &[Draw],
    tunables: &Tunables,
) -> Vec<StrategyPrediction> {
    std::iter::once(&recommendation.primary)
        .chain(&recommendation.alternatives)
        .filter_map(|scored| {
            let config = configs.iter().find(|c| c.name == scored.algorithm)?;
            let strategy = build_strategy(config, tunables)?;
            let numbers = strategy.predict(draws)?;
            Some(StrategyPrediction {
                algorithm: scored.algorithm.clone(),
                numbers,
                recent_accuracy: scored.summary.avg_accuracy,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::default_algorithm_configs;
    use crate::test_support::random_draws;
    use chrono::NaiveDate;

    fn summary(name: &str, avg: f64, best: u8, total: usize, excellent: usize) -> PerformanceSummary {
        PerformanceSummary {
            algorithm: name.to_string(),
            avg_accuracy: avg,
            best_match: best,
            total_predictions: total,
            excellent_predictions: excellent,
        }
    }

    #[test]
    fn test_summarize_performance() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 4, d).unwrap();
        let winning = Draw::new("Réveil", day(10), [1, 2, 3, 4, 5]);
        let records = vec![
            AlgorithmPerformanceRecord::evaluate("heat", &winning, [1, 2, 3, 70, 80], day(9)),
            AlgorithmPerformanceRecord::evaluate("heat", &winning, [1, 60, 61, 70, 80], day(8)),
            AlgorithmPerformanceRecord::evaluate("gap", &winning, [60, 61, 62, 63, 64], day(9)),
        ];
        let summaries = summarize_performance(&records, 3);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].algorithm, "gap");
        assert_eq!(summaries[0].best_match, 0);
        let heat = &summaries[1];
        assert_eq!(heat.total_predictions, 2);
        assert_eq!(heat.best_match, 3);
        assert_eq!(heat.excellent_predictions, 1);
        assert!((heat.avg_accuracy - 40.0).abs() < 1e-12);
        assert!((heat.excellent_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_score_is_monotonic() {
        let t = AggregatorTunables::default();
        let base = summary("a", 20.0, 2, 10, 1);
        let reference = score_algorithm(&base, 1.0, &t);
        assert!(score_algorithm(&summary("a", 25.0, 2, 10, 1), 1.0, &t) > reference);
        assert!(score_algorithm(&summary("a", 20.0, 3, 10, 1), 1.0, &t) > reference);
        assert!(score_algorithm(&summary("a", 20.0, 2, 10, 2), 1.0, &t) > reference);
        assert!(score_algorithm(&base, 1.5, &t) > reference);
        assert_eq!(score_algorithm(&base, 0.0, &t), 0.0);
    }

    #[test]
    fn test_recommend_ranks_and_skips_disabled() {
        let mut disabled = AlgorithmConfig::new("rules", 2.0);
        disabled.enabled = false;
        let configs = vec![
            AlgorithmConfig::new("frequency", 1.0),
            AlgorithmConfig::new("heat", 1.0),
            AlgorithmConfig::new("gap", 0.5),
            AlgorithmConfig::new("follow", 1.0),
            disabled,
        ];
        let summaries = vec![
            summary("frequency", 30.0, 3, 10, 2),
            summary("heat", 40.0, 3, 10, 2),
            summary("gap", 40.0, 3, 10, 2),
            summary("follow", 10.0, 1, 10, 0),
            summary("rules", 90.0, 5, 10, 9),
        ];
        let rec = recommend(&configs, &summaries, &AggregatorTunables::default()).unwrap();
        assert_eq!(rec.primary.algorithm, "heat");
        let alternatives: Vec<&str> = rec.alternatives.iter().map(|a| a.algorithm.as_str()).collect();
        assert_eq!(alternatives, vec!["frequency", "gap"]);
    }

    #[test]
    fn test_recommended_predictions_feed_consensus() {
        let configs = default_algorithm_configs();
        let summaries = vec![
            summary("heat", 40.0, 3, 10, 2),
            summary("gap", 30.0, 2, 10, 0),
            summary("frequency", 20.0, 2, 10, 0),
            summary("follow", 5.0, 1, 10, 0),
        ];
        let tunables = Tunables::default();
        let rec = recommend(&configs, &summaries, &tunables.aggregator).unwrap();
        let draws = random_draws(60, 4);

        let predictions = recommended_predictions(&rec, &configs, &draws, &tunables);
        let names: Vec<&str> = predictions.iter().map(|p| p.algorithm.as_str()).collect();
        assert_eq!(names, vec!["heat", "gap", "frequency"]);
        assert_eq!(predictions[0].recent_accuracy, 40.0);

        let result = consensus::consensus(&predictions, &tunables.aggregator).unwrap();
        assert_eq!(result.numbers.len(), 5);
        assert!((result.confidence - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_recommendation() {
        let t = AggregatorTunables::default();
        assert!(recommend(&[], &[summary("heat", 40.0, 3, 10, 2)], &t).is_none());
        assert!(recommend(&[AlgorithmConfig::new("heat", 1.0)], &[], &t).is_none());
        let mut off = AlgorithmConfig::new("heat", 1.0);
        off.enabled = false;
        assert!(recommend(&[off], &[summary("heat", 40.0, 3, 10, 2)], &t).is_none());
    }
}
