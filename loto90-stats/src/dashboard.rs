use chrono::NaiveDate;
use serde::Serialize;

use loto90_db::models::{Draw, NumberStatistic, POOL_SIZE};

use crate::anomaly::{detect_anomalies, Anomaly};
use crate::config::Tunables;
use crate::cooccurrence::{top_triplets, Triplet};
use crate::frequency::number_statistics;
use crate::heat::{heat_map, NumberHeat};
use crate::rules::{conditional_rules, winning_combinations, ConditionalRule, WinningCombination};

/// Vue d'ensemble d'une série, toutes analyses confondues.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub draw_count: usize,
    pub statistics: Vec<NumberStatistic>,
    pub heat: Vec<NumberHeat>,
    pub rules: Vec<ConditionalRule>,
    pub combinations: Vec<WinningCombination>,
    pub triplets: Vec<Triplet>,
    pub anomalies: Vec<Anomaly>,
}

/// Les analyses sont indépendantes et ne lisent que `draws` : elles
/// tournent en parallèle sur le pool rayon.
pub fn build_dashboard(draws: &[Draw], today: NaiveDate, tunables: &Tunables) -> Dashboard {
    let ((statistics, heat), ((rules, combinations), (triplets, anomalies))) = rayon::join(
        || {
            rayon::join(
                || number_statistics(draws, POOL_SIZE, today),
                || heat_map(draws, POOL_SIZE, &tunables.heat),
            )
        },
        || {
            rayon::join(
                || {
                    rayon::join(
                        || conditional_rules(draws, &tunables.rules),
                        || winning_combinations(draws, today, &tunables.rules),
                    )
                },
                || {
                    rayon::join(
                        || top_triplets(draws, tunables.cooccurrence.top_triplets),
                        || detect_anomalies(draws, &tunables.anomaly),
                    )
                },
            )
        },
    );

    Dashboard {
        draw_count: draws.len(),
        statistics,
        heat,
        rules,
        combinations,
        triplets,
        anomalies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::random_draws;

    #[test]
    fn test_dashboard_matches_individual_analyses() {
        let draws = random_draws(100, 17);
        let today = draws[0].date;
        let tunables = Tunables::default();
        let dashboard = build_dashboard(&draws, today, &tunables);

        assert_eq!(dashboard.draw_count, 100);
        assert_eq!(dashboard.statistics, number_statistics(&draws, POOL_SIZE, today));
        assert_eq!(dashboard.heat, heat_map(&draws, POOL_SIZE, &tunables.heat));
        assert_eq!(dashboard.rules, conditional_rules(&draws, &tunables.rules));
        assert_eq!(dashboard.combinations, winning_combinations(&draws, today, &tunables.rules));
        assert_eq!(dashboard.triplets, top_triplets(&draws, 10));
        assert_eq!(dashboard.anomalies, detect_anomalies(&draws, &tunables.anomaly));
    }

    #[test]
    fn test_empty_dashboard() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dashboard = build_dashboard(&[], today, &Tunables::default());
        assert_eq!(dashboard.draw_count, 0);
        assert_eq!(dashboard.statistics.len(), 90);
        assert!(dashboard.rules.is_empty());
        assert!(dashboard.anomalies.is_empty());
    }
}
