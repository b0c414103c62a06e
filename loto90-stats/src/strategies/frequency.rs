use std::collections::BTreeMap;

use loto90_db::models::Draw;

use super::{frequency_ranking, recent, Strategy};

pub const NAME: &str = "frequency";

/// Les 5 numéros les plus sortis sur la fenêtre.
pub struct FrequencyStrategy {
    window: usize,
}

impl FrequencyStrategy {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Strategy for FrequencyStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn predict(&self, draws: &[Draw]) -> Option<[u8; 5]> {
        let window = recent(draws, self.window);
        if window.is_empty() {
            return None;
        }
        let ranking = frequency_ranking(window);
        let mut grid: [u8; 5] = ranking.get(..5)?.try_into().ok()?;
        grid.sort_unstable();
        Some(grid)
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([("window".to_string(), self.window as f64)])
    }
}
