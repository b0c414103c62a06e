use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;

use loto90_db::models::Draw;

pub const SERIES: &str = "Réveil";

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

/// Historique explicite, du plus récent au plus ancien, un tirage par jour.
pub fn draws_from(grids: &[[u8; 5]]) -> Vec<Draw> {
    grids
        .iter()
        .enumerate()
        .map(|(i, &numbers)| Draw::new(SERIES, base_date() - Duration::days(i as i64), numbers))
        .collect()
}

/// Tirages déterministes et valides (5 numéros distincts dans 1..=90).
pub fn make_test_draws(n: usize) -> Vec<Draw> {
    let grids: Vec<[u8; 5]> = (0..n)
        .map(|i| {
            let shift = i * 7;
            [0usize, 17, 34, 51, 68].map(|offset| ((shift + offset) % 90 + 1) as u8)
        })
        .collect();
    draws_from(&grids)
}

pub fn random_draws(n: usize, seed: u64) -> Vec<Draw> {
    let mut rng = StdRng::seed_from_u64(seed);
    let grids: Vec<[u8; 5]> = (0..n)
        .map(|_| {
            let picked = rand::seq::index::sample(&mut rng, 90, 5);
            let mut grid = [0u8; 5];
            for (slot, idx) in grid.iter_mut().zip(picked.iter()) {
                *slot = (idx + 1) as u8;
            }
            grid
        })
        .collect();
    draws_from(&grids)
}
