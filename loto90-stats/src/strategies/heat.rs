use std::collections::BTreeMap;

use loto90_db::models::{Draw, POOL_SIZE};

use super::{pick_top, recent, Strategy};
use crate::config::HeatTunables;
use crate::heat::heat_map;

pub const NAME: &str = "heat";

/// Les 5 numéros au score de chaleur composite le plus élevé.
pub struct HeatStrategy {
    window: usize,
    tunables: HeatTunables,
}

impl HeatStrategy {
    pub fn new(window: usize, tunables: HeatTunables) -> Self {
        Self { window, tunables }
    }
}

impl Strategy for HeatStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn predict(&self, draws: &[Draw]) -> Option<[u8; 5]> {
        let window = recent(draws, self.window);
        let candidates = heat_map(window, POOL_SIZE, &self.tunables)
            .into_iter()
            .map(|h| (h.number, h.composite_score))
            .collect();
        pick_top(candidates, window)
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("window".to_string(), self.window as f64),
            ("recency_decay".to_string(), self.tunables.recency_decay),
        ])
    }
}
