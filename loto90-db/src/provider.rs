use anyhow::Result;
use rusqlite::Connection;

use crate::db;
use crate::models::{AlgorithmConfig, AlgorithmPerformanceRecord, Draw};

/// Flux en lecture seule consommé par la couche d'analyse.
pub trait DrawHistoryProvider {
    /// `limit` derniers tirages de la série, du plus récent au plus ancien.
    fn draw_history(&self, draw_name: &str, limit: u32) -> Result<Vec<Draw>>;
    fn algorithm_configs(&self) -> Result<Vec<AlgorithmConfig>>;
    fn performance_history(
        &self,
        algorithm: Option<&str>,
        draw_name: Option<&str>,
    ) -> Result<Vec<AlgorithmPerformanceRecord>>;
}

impl DrawHistoryProvider for Connection {
    fn draw_history(&self, draw_name: &str, limit: u32) -> Result<Vec<Draw>> {
        db::fetch_draw_history(self, draw_name, limit)
    }

    fn algorithm_configs(&self) -> Result<Vec<AlgorithmConfig>> {
        db::fetch_algorithm_configs(self)
    }

    fn performance_history(
        &self,
        algorithm: Option<&str>,
        draw_name: Option<&str>,
    ) -> Result<Vec<AlgorithmPerformanceRecord>> {
        db::fetch_performance(self, algorithm, draw_name)
    }
}

/// Fournisseur en mémoire, pour les appelants qui détiennent déjà les données.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    draws: Vec<Draw>,
    configs: Vec<AlgorithmConfig>,
    records: Vec<AlgorithmPerformanceRecord>,
}

impl InMemoryHistory {
    pub fn new(mut draws: Vec<Draw>) -> Self {
        draws.sort_by(|a, b| b.date.cmp(&a.date));
        Self {
            draws,
            configs: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn with_configs(mut self, configs: Vec<AlgorithmConfig>) -> Self {
        self.configs = configs;
        self
    }

    pub fn with_records(mut self, records: Vec<AlgorithmPerformanceRecord>) -> Self {
        self.records = records;
        self
    }
}

impl DrawHistoryProvider for InMemoryHistory {
    fn draw_history(&self, draw_name: &str, limit: u32) -> Result<Vec<Draw>> {
        Ok(self
            .draws
            .iter()
            .filter(|d| d.draw_name == draw_name)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    fn algorithm_configs(&self) -> Result<Vec<AlgorithmConfig>> {
        Ok(self.configs.clone())
    }

    fn performance_history(
        &self,
        algorithm: Option<&str>,
        draw_name: Option<&str>,
    ) -> Result<Vec<AlgorithmPerformanceRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| algorithm.map_or(true, |a| r.algorithm == a))
            .filter(|r| draw_name.map_or(true, |n| r.draw_name == n))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draw(name: &str, day: u32, numbers: [u8; 5]) -> Draw {
        Draw::new(name, NaiveDate::from_ymd_opt(2024, 5, day).unwrap(), numbers)
    }

    #[test]
    fn test_in_memory_history_most_recent_first() {
        let provider = InMemoryHistory::new(vec![
            draw("Réveil", 1, [1, 2, 3, 4, 5]),
            draw("Réveil", 3, [6, 7, 8, 9, 10]),
            draw("Étoile", 2, [11, 12, 13, 14, 15]),
            draw("Réveil", 2, [16, 17, 18, 19, 20]),
        ]);
        let history = provider.draw_history("Réveil", 2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].numbers, [6, 7, 8, 9, 10]);
        assert_eq!(history[1].numbers, [16, 17, 18, 19, 20]);
    }

    #[test]
    fn test_connection_provider_matches_in_memory() {
        let conn = Connection::open_in_memory().unwrap();
        db::migrate(&conn).unwrap();
        let draws = vec![
            draw("Réveil", 1, [1, 2, 3, 4, 5]),
            draw("Réveil", 4, [6, 7, 8, 9, 10]),
            draw("Réveil", 2, [11, 12, 13, 14, 15]),
        ];
        for d in &draws {
            db::insert_draw(&conn, d).unwrap();
        }
        let memory = InMemoryHistory::new(draws);
        assert_eq!(
            conn.draw_history("Réveil", 10).unwrap(),
            memory.draw_history("Réveil", 10).unwrap()
        );
    }

    #[test]
    fn test_performance_filters() {
        let target = draw("Réveil", 5, [1, 2, 3, 4, 5]);
        let prediction_date = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();
        let provider = InMemoryHistory::default().with_records(vec![
            AlgorithmPerformanceRecord::evaluate("heat", &target, [1, 2, 3, 4, 5], prediction_date),
            AlgorithmPerformanceRecord::evaluate("gap", &target, [1, 2, 30, 40, 50], prediction_date),
        ]);
        assert_eq!(provider.performance_history(None, None).unwrap().len(), 2);
        assert_eq!(provider.performance_history(Some("gap"), Some("Réveil")).unwrap().len(), 1);
        assert!(provider.performance_history(None, Some("Étoile")).unwrap().is_empty());
    }
}
