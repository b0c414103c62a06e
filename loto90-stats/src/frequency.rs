use chrono::NaiveDate;
use serde::Serialize;

use loto90_db::models::{Draw, NumberStatistic};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberFrequency {
    pub number: u8,
    pub frequency: u32,
    /// Index du tirage le plus récent contenant le numéro (0 = dernier tirage).
    /// `None` : jamais sorti sur la fenêtre.
    pub last_appearance_index: Option<usize>,
    pub appearance_rate: f64,
}

/// Fréquences et retards pour les numéros 1..=pool_size.
/// `draws[0]` est le tirage le plus récent.
pub fn number_frequencies(draws: &[Draw], pool_size: u8) -> Vec<NumberFrequency> {
    let mut stats: Vec<NumberFrequency> = (1..=pool_size)
        .map(|n| NumberFrequency {
            number: n,
            frequency: 0,
            last_appearance_index: None,
            appearance_rate: 0.0,
        })
        .collect();

    for (i, draw) in draws.iter().enumerate() {
        for &n in &draw.numbers {
            let Some(stat) = slot(&mut stats, n) else {
                continue;
            };
            stat.frequency += 1;
            if stat.last_appearance_index.is_none() {
                stat.last_appearance_index = Some(i);
            }
        }
    }

    if !draws.is_empty() {
        let len = draws.len() as f64;
        for stat in &mut stats {
            stat.appearance_rate = stat.frequency as f64 / len;
        }
    }

    tracing::debug!(draws = draws.len(), pool_size, "fréquences calculées");
    stats
}

/// Variante datée : dernière apparition et retard en tirages et en jours.
pub fn number_statistics(draws: &[Draw], pool_size: u8, today: NaiveDate) -> Vec<NumberStatistic> {
    number_frequencies(draws, pool_size)
        .into_iter()
        .map(|f| {
            let last_appearance = f.last_appearance_index.map(|i| draws[i].date);
            NumberStatistic {
                number: f.number,
                frequency: f.frequency,
                last_appearance,
                draws_since_last: f.last_appearance_index,
                days_since_last: last_appearance.map(|d| (today - d).num_days().max(0)),
            }
        })
        .collect()
}

fn slot(stats: &mut [NumberFrequency], n: u8) -> Option<&mut NumberFrequency> {
    let idx = usize::from(n).checked_sub(1)?;
    stats.get_mut(idx)
}
