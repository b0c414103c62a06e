use serde::Serialize;

use loto90_db::models::Draw;

use crate::config::HeatTunables;
use crate::frequency::number_frequencies;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Temperature {
    Hot,
    Warm,
    Cold,
    Frozen,
}

impl std::fmt::Display for Temperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Temperature::Hot => write!(f, "HOT"),
            Temperature::Warm => write!(f, "WARM"),
            Temperature::Cold => write!(f, "COLD"),
            Temperature::Frozen => write!(f, "FROZEN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberHeat {
    pub number: u8,
    pub last_seen_index: Option<usize>,
    pub frequency: f64,
    pub recency_score: f64,
    pub frequency_score: f64,
    pub trend: Trend,
    pub trend_score: f64,
    pub composite_score: f64,
    pub temperature: Temperature,
}

fn occurrences(number: u8, draws: &[Draw]) -> usize {
    draws.iter().filter(|d| d.contains(number)).count()
}

/// Tendance : fenêtre récente `draws[0..w]` contre la précédente `draws[w..2w]`.
fn trend(number: u8, draws: &[Draw], window: usize) -> Trend {
    let recent_end = window.min(draws.len());
    let previous_end = (2 * window).min(draws.len());
    let recent = occurrences(number, &draws[..recent_end]);
    let previous = occurrences(number, &draws[recent_end..previous_end]);
    match recent.cmp(&previous) {
        std::cmp::Ordering::Greater => Trend::Rising,
        std::cmp::Ordering::Less => Trend::Falling,
        std::cmp::Ordering::Equal => Trend::Stable,
    }
}

pub fn classify(score: f64, tunables: &HeatTunables) -> Temperature {
    if score > tunables.hot {
        Temperature::Hot
    } else if score > tunables.warm {
        Temperature::Warm
    } else if score > tunables.cold {
        Temperature::Cold
    } else {
        Temperature::Frozen
    }
}

/// Température des numéros 1..=pool_size, `draws[0]` étant le plus récent.
pub fn heat_map(draws: &[Draw], pool_size: u8, tunables: &HeatTunables) -> Vec<NumberHeat> {
    number_frequencies(draws, pool_size)
        .into_iter()
        .map(|f| {
            let recency_score = f
                .last_appearance_index
                .map_or(0.0, |i| (-(i as f64) * tunables.recency_decay).exp());
            let frequency_score = f.appearance_rate * tunables.frequency_scale;
            let trend = trend(f.number, draws, tunables.trend_window);
            let trend_score = match trend {
                Trend::Rising => tunables.trend_up,
                Trend::Falling => tunables.trend_down,
                Trend::Stable => 1.0,
            };
            let composite_score = recency_score * frequency_score * trend_score;
            NumberHeat {
                number: f.number,
                last_seen_index: f.last_appearance_index,
                frequency: f.appearance_rate,
                recency_score,
                frequency_score,
                trend,
                trend_score,
                composite_score,
                temperature: classify(composite_score, tunables),
            }
        })
        .collect()
}
