use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Plus grand numéro tirable (les numéros vont de 1 à 90).
pub const POOL_SIZE: u8 = 90;
/// Nombre de numéros par tirage.
pub const PICK_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub draw_name: String,
    pub date: NaiveDate,
    pub numbers: [u8; 5],
}

impl Draw {
    pub fn new(draw_name: impl Into<String>, date: NaiveDate, numbers: [u8; 5]) -> Self {
        Self {
            draw_name: draw_name.into(),
            date,
            numbers,
        }
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }

    pub fn sorted_numbers(&self) -> [u8; 5] {
        let mut sorted = self.numbers;
        sorted.sort_unstable();
        sorted
    }

    /// Nombre de numéros communs avec une autre grille.
    pub fn overlap(&self, other: &[u8; 5]) -> usize {
        self.numbers.iter().filter(|n| other.contains(n)).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    #[error("Numéro {0} hors limites (1-90)")]
    OutOfRange(u8),

    #[error("Numéro en double : {0}")]
    Duplicate(u8),

    #[error("Attendu 5 numéros, reçu {0}")]
    WrongCount(usize),
}

pub fn validate_numbers(numbers: &[u8; 5]) -> Result<(), DrawError> {
    for &n in numbers {
        if n < 1 || n > POOL_SIZE {
            return Err(DrawError::OutOfRange(n));
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                return Err(DrawError::Duplicate(numbers[i]));
            }
        }
    }
    Ok(())
}

/// Convertit une saisie libre en grille validée.
pub fn parse_numbers(values: &[u8]) -> Result<[u8; 5], DrawError> {
    let numbers: [u8; 5] = values
        .try_into()
        .map_err(|_| DrawError::WrongCount(values.len()))?;
    validate_numbers(&numbers)?;
    Ok(numbers)
}

/// Statistique dérivée d'un numéro pour une série de tirages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberStatistic {
    pub number: u8,
    pub frequency: u32,
    pub last_appearance: Option<NaiveDate>,
    pub draws_since_last: Option<usize>,
    pub days_since_last: Option<i64>,
}

/// Valeur d'un paramètre de stratégie. Les clés reconnues sont documentées
/// par chaque stratégie ; l'agrégateur ne les lit jamais.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(v) => Some(*v),
            ParamValue::Flag(_) | ParamValue::Text(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Flag(v) => Some(*v),
            ParamValue::Number(_) | ParamValue::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    pub name: String,
    pub enabled: bool,
    pub weight: f64,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
}

impl AlgorithmConfig {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            weight: weight.max(0.0),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: ParamValue) -> Self {
        self.parameters.insert(key.to_string(), value);
        self
    }

    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.parameters.get(key).and_then(ParamValue::as_f64)
    }
}

/// Évaluation d'une prédiction d'une stratégie contre un tirage réel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmPerformanceRecord {
    pub algorithm: String,
    pub draw_name: String,
    pub prediction_date: NaiveDate,
    pub draw_date: NaiveDate,
    pub predicted_numbers: [u8; 5],
    pub winning_numbers: [u8; 5],
    pub match_count: u8,
    pub accuracy_score: f64,
}

impl AlgorithmPerformanceRecord {
    /// Seul constructeur : `match_count` et `accuracy_score` sont toujours
    /// recalculés depuis les deux grilles.
    pub fn evaluate(
        algorithm: impl Into<String>,
        draw: &Draw,
        predicted_numbers: [u8; 5],
        prediction_date: NaiveDate,
    ) -> Self {
        let match_count = draw.overlap(&predicted_numbers) as u8;
        Self {
            algorithm: algorithm.into(),
            draw_name: draw.draw_name.clone(),
            prediction_date,
            draw_date: draw.date,
            predicted_numbers,
            winning_numbers: draw.numbers,
            match_count,
            accuracy_score: accuracy_from_matches(match_count),
        }
    }
}

pub fn accuracy_from_matches(match_count: u8) -> f64 {
    f64::from(match_count) * 100.0 / PICK_COUNT as f64
}
