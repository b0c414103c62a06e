use std::collections::BTreeMap;

use loto90_db::models::{Draw, POOL_SIZE};

use super::{pick_top, recent, Strategy};
use crate::config::RuleTunables;
use crate::rules::conditional_rules;

pub const NAME: &str = "rules";

/// Conséquents des règles conditionnelles déclenchées par le dernier tirage.
pub struct RulesStrategy {
    window: usize,
    tunables: RuleTunables,
}

impl RulesStrategy {
    pub fn new(window: usize, tunables: RuleTunables) -> Self {
        Self { window, tunables }
    }
}

impl Strategy for RulesStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn predict(&self, draws: &[Draw]) -> Option<[u8; 5]> {
        let window = recent(draws, self.window);
        let latest = window.first()?;

        // Toutes les règles au-dessus du seuil, pas seulement les 10 premières.
        let tunables = RuleTunables {
            max_rules: usize::MAX,
            ..self.tunables.clone()
        };
        let mut scores = vec![0.0f64; POOL_SIZE as usize + 1];
        for rule in conditional_rules(window, &tunables) {
            if latest.contains(rule.antecedent) && !latest.contains(rule.consequent) {
                scores[usize::from(rule.consequent)] += rule.probability;
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
        BTreeMap::from([
            ("window".to_string(), self.window as f64),
            ("min_probability".to_string(), self.tunables.min_probability),
        ])
    }
}
