use std::collections::BTreeMap;

use loto90_db::models::{Draw, POOL_SIZE};

use super::{pick_top, recent, Strategy};
use crate::frequency::number_frequencies;

pub const NAME: &str = "gap";

/// Les 5 numéros au plus gros retard ; un numéro jamais sorti sur la
/// fenêtre compte pour un retard égal à la taille de la fenêtre.
pub struct GapStrategy {
    window: usize,
}

impl GapStrategy {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Strategy for GapStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn predict(&self, draws: &[Draw]) -> Option<[u8; 5]> {
        let window = recent(draws, self.window);
        let candidates = number_frequencies(window, POOL_SIZE)
            .into_iter()
            .map(|f| {
                let gap = f.last_appearance_index.unwrap_or(window.len());
                (f.number, gap as f64 + 1.0)
            })
            .collect();
        pick_top(candidates, window)
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([("window".to_string(), self.window as f64)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{draws_from, make_test_draws};

    #[test]
    fn test_overdue_numbers_selected() {
        // 18 tirages couvrant 1..=90 une fois chacun : les plus anciens sont en retard.
        let grids: Vec<[u8; 5]> = (0..18u8)
            .map(|i| [i * 5 + 1, i * 5 + 2, i * 5 + 3, i * 5 + 4, i * 5 + 5])
            .collect();
        let draws = draws_from(&grids);
        assert_eq!(GapStrategy::new(50).predict(&draws), Some([86, 87, 88, 89, 90]));
    }

    #[test]
    fn test_never_seen_is_most_overdue() {
        let draws = make_test_draws(3);
        let grid = GapStrategy::new(50).predict(&draws).unwrap();
        for n in grid {
            assert!(draws.iter().all(|d| !d.contains(n)));
        }
    }
}
