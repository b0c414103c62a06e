use chrono::NaiveDate;
use serde::Serialize;

use loto90_db::models::Draw;

use crate::config::RuleTunables;
use crate::cooccurrence::CoOccurrence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "ÉLEVÉE"),
            Confidence::Medium => write!(f, "MOYENNE"),
            Confidence::Low => write!(f, "FAIBLE"),
        }
    }
}

/// « Si `antecedent` sort, `consequent` sort aussi » avec `probability` %.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalRule {
    pub antecedent: u8,
    pub consequent: u8,
    pub probability: f64,
    /// Nombre de tirages contenant les deux numéros.
    pub support: u32,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinningCombination {
    pub numbers: [u8; 2],
    pub frequency: u32,
    pub last_seen: NaiveDate,
    pub days_since_last: i64,
    pub score: f64,
}

fn classify(probability: f64, tunables: &RuleTunables) -> Confidence {
    if probability >= tunables.high_confidence {
        Confidence::High
    } else if probability >= tunables.medium_confidence {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

pub fn conditional_rules(draws: &[Draw], tunables: &RuleTunables) -> Vec<ConditionalRule> {
    let matrix = CoOccurrence::from_history(draws);

    let mut rules: Vec<ConditionalRule> = matrix
        .ordered_pairs()
        .filter_map(|(a, b, together)| {
            let base = matrix.draw_count(a);
            if base == 0 {
                return None;
            }
            let probability = (f64::from(together) / f64::from(base) * 100.0).min(100.0);
            (probability >= tunables.min_probability).then(|| ConditionalRule {
                antecedent: a,
                consequent: b,
                probability,
                support: together,
                confidence: classify(probability, tunables),
            })
        })
        .collect();

    rules.sort_by(|x, y| {
        y.probability
            .partial_cmp(&x.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(y.support.cmp(&x.support))
            .then((x.antecedent, x.consequent).cmp(&(y.antecedent, y.consequent)))
    });
    rules.truncate(tunables.max_rules);

    tracing::debug!(draws = draws.len(), rules = rules.len(), "règles conditionnelles");
    rules
}

/// Paires pondérées par leur fréquence et amorties selon l'ancienneté de leur
/// dernière sortie commune : `fréquence × exp(-jours / τ)`.
pub fn winning_combinations(
    draws: &[Draw],
    today: NaiveDate,
    tunables: &RuleTunables,
) -> Vec<WinningCombination> {
    let matrix = CoOccurrence::from_history(draws);
    let tau = tunables.decay_days.max(f64::EPSILON);

    let mut combinations: Vec<WinningCombination> = matrix
        .unordered_pairs()
        .filter_map(|(a, b, frequency)| {
            let last_seen = matrix.last_joint_date(a, b)?;
            let days_since_last = (today - last_seen).num_days().max(0);
            let score = f64::from(frequency) * (-(days_since_last as f64) / tau).exp();
            Some(WinningCombination {
                numbers: [a, b],
                frequency,
                last_seen,
                days_since_last,
                score,
            })
        })
        .collect();

    combinations.sort_by(|x, y| {
        y.score
            .partial_cmp(&x.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(x.numbers.cmp(&y.numbers))
    });
    combinations.truncate(tunables.max_combinations);
    combinations
}
