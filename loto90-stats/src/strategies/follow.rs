use std::collections::BTreeMap;

use loto90_db::models::{Draw, POOL_SIZE};

use super::{pick_top, recent, Strategy};
use crate::cooccurrence::next_draw_associations;

pub const NAME: &str = "follow";

/// Numéros qui ont le plus souvent suivi les numéros du dernier tirage.
pub struct FollowStrategy {
    window: usize,
}

impl FollowStrategy {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Strategy for FollowStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn predict(&self, draws: &[Draw]) -> Option<[u8; 5]> {
        let window = recent(draws, self.window);
        let latest = window.first()?;

        let mut scores = vec![0.0f64; POOL_SIZE as usize + 1];
        for &n in &latest.numbers {
            for assoc in next_draw_associations(n, window, POOL_SIZE as usize) {
                scores[usize::from(assoc.number)] += f64::from(assoc.count);
            }
        }

        let candidates = scores
            .iter()
            .enumerate()
            .map(|(n, &s)| (n as u8, s))
            .collect();
        pick_top(candidates, window)
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([("window".to_string(), self.window as f64)])
    }
}
