use chrono::NaiveDate;
use serde::Serialize;

use loto90_db::models::{Draw, POOL_SIZE};

use crate::config::AnomalyTunables;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnomalyKind {
    ConsecutiveRun,
    NonUniform,
    FrequencySpike,
    SuspiciousDuplicate,
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyKind::ConsecutiveRun => write!(f, "Suite consécutive"),
            AnomalyKind::NonUniform => write!(f, "Distribution non uniforme"),
            AnomalyKind::FrequencySpike => write!(f, "Pic de fréquence"),
            AnomalyKind::SuspiciousDuplicate => write!(f, "Doublon suspect"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Medium => write!(f, "MOYENNE"),
            Severity::High => write!(f, "ÉLEVÉE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub description: String,
    pub score: f64,
    /// Tirage concerné, pour les anomalies propres à un tirage.
    pub draw_date: Option<NaiveDate>,
}

/// Anomalies les plus marquantes (au plus `max_results`).
pub fn detect_anomalies(draws: &[Draw], tunables: &AnomalyTunables) -> Vec<Anomaly> {
    let mut anomalies = scan_anomalies(draws, tunables);
    anomalies.truncate(tunables.max_results);
    anomalies
}

/// Toutes les anomalies de la fenêtre récente, triées par score décroissant.
/// Moins de `min_draws` tirages : résultat vide.
pub fn scan_anomalies(draws: &[Draw], tunables: &AnomalyTunables) -> Vec<Anomaly> {
    if draws.len() < tunables.min_draws {
        tracing::debug!(draws = draws.len(), "historique insuffisant pour la détection d'anomalies");
        return Vec::new();
    }

    let window = &draws[..tunables.window.min(draws.len())];
    if window.is_empty() {
        return Vec::new();
    }

    let mut anomalies = consecutive_runs(window, tunables);
    anomalies.extend(uniformity(window, tunables));
    anomalies.extend(frequency_spikes(window, tunables));
    anomalies.extend(suspicious_duplicates(window, tunables));

    anomalies.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    tracing::debug!(window = window.len(), found = anomalies.len(), "anomalies détectées");
    anomalies
}

/// Nombre de paires adjacentes (numéros triés) dont l'écart vaut 1.
pub fn consecutive_count(draw: &Draw) -> usize {
    draw.sorted_numbers()
        .windows(2)
        .filter(|w| w[1].checked_sub(w[0]) == Some(1))
        .count()
}

fn consecutive_runs(window: &[Draw], tunables: &AnomalyTunables) -> Vec<Anomaly> {
    window
        .iter()
        .filter_map(|draw| {
            let count = consecutive_count(draw);
            (count >= tunables.consecutive_threshold).then(|| Anomaly {
                kind: AnomalyKind::ConsecutiveRun,
                severity: Severity::Medium,
                description: format!(
                    "Tirage du {} : {} écarts de 1 entre numéros triés {:?}",
                    draw.date,
                    count,
                    draw.sorted_numbers()
                ),
                score: count as f64 * tunables.consecutive_score,
                draw_date: Some(draw.date),
            })
        })
        .collect()
}

fn counts(window: &[Draw]) -> Vec<u32> {
    let mut counts = vec![0u32; POOL_SIZE as usize];
    for draw in window {
        for &n in &draw.numbers {
            if let Some(slot) = usize::from(n).checked_sub(1).and_then(|i| counts.get_mut(i)) {
                *slot += 1;
            }
        }
    }
    counts
}

/// Statistique du χ² d'uniformité sur les numéros 1..=90.
pub fn chi_square(window: &[Draw]) -> f64 {
    let counts = counts(window);
    let total: u32 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let expected = f64::from(total) / f64::from(POOL_SIZE);
    counts
        .iter()
        .map(|&observed| {
            let diff = f64::from(observed) - expected;
            diff * diff / expected
        })
        .sum()
}

fn uniformity(window: &[Draw], tunables: &AnomalyTunables) -> Option<Anomaly> {
    let chi = chi_square(window);
    let threshold = tunables.chi_square_critical * tunables.chi_square_factor;
    (chi > threshold).then(|| Anomaly {
        kind: AnomalyKind::NonUniform,
        severity: Severity::High,
        description: format!(
            "χ² = {:.2} > {:.2} sur {} tirages",
            chi,
            threshold,
            window.len()
        ),
        score: tunables.chi_square_score,
        draw_date: None,
    })
}

fn frequency_spikes(window: &[Draw], tunables: &AnomalyTunables) -> Vec<Anomaly> {
    if window.is_empty() {
        return Vec::new();
    }
    let total_draws = window.len() as f64;
    counts(window)
        .into_iter()
        .enumerate()
        .filter_map(|(i, count)| {
            let rate = f64::from(count) / total_draws * 100.0;
            if rate <= tunables.spike_rate {
                return None;
            }
            let severity = if rate > tunables.spike_high_rate {
                Severity::High
            } else {
                Severity::Medium
            };
            Some(Anomaly {
                kind: AnomalyKind::FrequencySpike,
                severity,
                description: format!(
                    "Le {} sort dans {:.1} % des {} derniers tirages",
                    i + 1,
                    rate,
                    window.len()
                ),
                score: rate * tunables.spike_score_factor,
                draw_date: None,
            })
        })
        .collect()
}

fn suspicious_duplicates(window: &[Draw], tunables: &AnomalyTunables) -> Vec<Anomaly> {
    window
        .windows(2)
        .take(tunables.duplicate_pairs)
        .filter_map(|pair| {
            let (recent, previous) = (&pair[0], &pair[1]);
            let common = recent.overlap(&previous.numbers);
            (common >= tunables.duplicate_min_overlap).then(|| Anomaly {
                kind: AnomalyKind::SuspiciousDuplicate,
                severity: Severity::High,
                description: format!(
                    "{} numéros communs entre les tirages du {} et du {}",
                    common, recent.date, previous.date
                ),
                score: common as f64 * tunables.duplicate_score,
                draw_date: Some(recent.date),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{draws_from, make_test_draws, random_draws};

    #[test]
    fn test_insufficient_history() {
        let draws = draws_from(&[[1, 2, 3, 4, 5]; 9]);
        assert!(detect_anomalies(&draws, &AnomalyTunables::default()).is_empty());
        assert!(scan_anomalies(&[], &AnomalyTunables::default()).is_empty());
    }

    #[test]
    fn test_identical_draws_flag_every_examined_pair() {
        let draws = draws_from(&[[10, 20, 30, 40, 50]; 50]);
        let tunables = AnomalyTunables::default();
        let all = scan_anomalies(&draws, &tunables);

        let duplicates: Vec<&Anomaly> = all
            .iter()
            .filter(|a| a.kind == AnomalyKind::SuspiciousDuplicate)
            .collect();
        assert_eq!(duplicates.len(), tunables.duplicate_pairs);
        for dup in &duplicates {
            assert_eq!(dup.severity, Severity::High);
            assert!((dup.score - 125.0).abs() < 1e-12);
        }

        let every_pair = AnomalyTunables {
            duplicate_pairs: usize::MAX,
            ..AnomalyTunables::default()
        };
        let all = scan_anomalies(&draws, &every_pair);
        let count = all.iter().filter(|a| a.kind == AnomalyKind::SuspiciousDuplicate).count();
        assert_eq!(count, 49);
    }

    #[test]
    fn test_zero_window_reports_nothing() {
        let draws = random_draws(30, 1);
        let tunables = AnomalyTunables {
            window: 0,
            ..AnomalyTunables::default()
        };
        assert!(scan_anomalies(&draws, &tunables).is_empty());
        assert!(detect_anomalies(&draws, &tunables).is_empty());
        assert!(frequency_spikes(&[], &tunables).is_empty());
    }

    #[test]
    fn test_identical_draws_top_five() {
        let draws = draws_from(&[[10, 20, 30, 40, 50]; 50]);
        let top = detect_anomalies(&draws, &AnomalyTunables::default());
        assert_eq!(top.len(), 5);
        // Chaque numéro sort à 100 % : pic de fréquence de score 300.
        assert!(top.iter().all(|a| a.kind == AnomalyKind::FrequencySpike));
        assert!(top.iter().all(|a| (a.score - 300.0).abs() < 1e-9 && a.severity == Severity::High));
    }

    #[test]
    fn test_every_detector_reports_medium_or_high() {
        let mut grids = vec![[1, 2, 3, 4, 50]; 12];
        grids.push([10, 20, 30, 40, 60]);
        let all = scan_anomalies(&draws_from(&grids), &AnomalyTunables::default());
        let kinds: Vec<AnomalyKind> = all.iter().map(|a| a.kind).collect();
        assert!(kinds.contains(&AnomalyKind::ConsecutiveRun));
        assert!(kinds.contains(&AnomalyKind::FrequencySpike));
        assert!(kinds.contains(&AnomalyKind::SuspiciousDuplicate));
        assert!(kinds.contains(&AnomalyKind::NonUniform));
        assert!(Severity::High > Severity::Medium);
        for anomaly in &all {
            match anomaly.kind {
                AnomalyKind::ConsecutiveRun => assert_eq!(anomaly.severity, Severity::Medium),
                AnomalyKind::NonUniform | AnomalyKind::SuspiciousDuplicate => {
                    assert_eq!(anomaly.severity, Severity::High)
                }
                AnomalyKind::FrequencySpike => {}
            }
        }
    }

    #[test]
    fn test_consecutive_count() {
        let draws = draws_from(&[[5, 3, 4, 6, 80], [1, 2, 40, 41, 90], [1, 3, 5, 7, 9]]);
        assert_eq!(consecutive_count(&draws[0]), 3);
        assert_eq!(consecutive_count(&draws[1]), 2);
        assert_eq!(consecutive_count(&draws[2]), 0);
    }

    #[test]
    fn test_consecutive_run_anomaly() {
        let mut grids = vec![[3, 4, 5, 6, 80]];
        grids.extend(make_test_draws(20).iter().map(|d| d.numbers));
        let draws = draws_from(&grids);
        let all = scan_anomalies(&draws, &AnomalyTunables::default());
        let run = all
            .iter()
            .find(|a| a.kind == AnomalyKind::ConsecutiveRun)
            .expect("suite détectée");
        assert_eq!(run.severity, Severity::Medium);
        assert!((run.score - 60.0).abs() < 1e-12);
        assert_eq!(run.draw_date, Some(draws[0].date));
    }

    #[test]
    fn test_chi_square_uniform_is_zero() {
        // 18 tirages couvrant chaque numéro exactement une fois.
        let grids: Vec<[u8; 5]> = (0..18u8)
            .map(|i| [i * 5 + 1, i * 5 + 2, i * 5 + 3, i * 5 + 4, i * 5 + 5])
            .collect();
        let draws = draws_from(&grids);
        assert!(chi_square(&draws).abs() < 1e-9);
        let all = scan_anomalies(&draws, &AnomalyTunables::default());
        assert!(all.iter().all(|a| a.kind != AnomalyKind::NonUniform));
    }

    #[test]
    fn test_non_uniform_flagged() {
        let draws = draws_from(&[[10, 20, 30, 40, 50]; 20]);
        let threshold = 112.02 * 1.5;
        assert!(chi_square(&draws) > threshold);
        let all = scan_anomalies(&draws, &AnomalyTunables::default());
        let chi = all.iter().find(|a| a.kind == AnomalyKind::NonUniform).unwrap();
        assert_eq!(chi.severity, Severity::High);
        assert!((chi.score - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_spike_severity_boundaries() {
        // Base : blocs de 5 numéros parmi 1..=80, chacun sort au plus 4 fois sur 50.
        let mut grids: Vec<[u8; 5]> = (0..50usize)
            .map(|i| {
                let k = ((i * 5) % 80) as u8;
                [k + 1, k + 2, k + 3, k + 4, k + 5]
            })
            .collect();
        for g in grids.iter_mut().take(9) {
            g[0] = 89;
        }
        for g in grids.iter_mut().skip(9).take(11) {
            g[1] = 88;
        }
        let draws = draws_from(&grids);
        let spikes: Vec<Anomaly> = scan_anomalies(&draws, &AnomalyTunables::default())
            .into_iter()
            .filter(|a| a.kind == AnomalyKind::FrequencySpike)
            .collect();
        assert_eq!(spikes.len(), 2);

        // 88 : 22 % => élevée ; 89 : 18 % => moyenne.
        assert_eq!(spikes[0].severity, Severity::High);
        assert!((spikes[0].score - 66.0).abs() < 1e-9);
        assert!(spikes[0].description.starts_with("Le 88 "));
        assert_eq!(spikes[1].severity, Severity::Medium);
        assert!((spikes[1].score - 54.0).abs() < 1e-9);
    }

    #[test]
    fn test_sorted_by_score() {
        let draws = random_draws(80, 5);
        let all = scan_anomalies(&draws, &AnomalyTunables::default());
        for pair in all.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}
