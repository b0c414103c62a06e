use serde::Serialize;

use loto90_db::models::POOL_SIZE;

use crate::config::AggregatorTunables;

/// Grille proposée actuellement par une stratégie, avec sa précision récente.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyPrediction {
    pub algorithm: String,
    pub numbers: [u8; 5],
    pub recent_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusResult {
    pub numbers: Vec<u8>,
    /// Précision récente moyenne des votants (0..100).
    pub confidence: f64,
    /// Part des votes captée par les numéros retenus (0..100).
    pub agreement_score: f64,
    /// Numéros retenus et leurs votes, par vote décroissant.
    pub votes: Vec<(u8, f64)>,
    pub voters: Vec<String>,
}

/// Vote pondéré des `consensus_voters` premières prédictions : chaque numéro
/// proposé reçoit la précision récente de la stratégie.
/// `None` quand aucune prédiction n'est fournie.
pub fn consensus(
    predictions: &[StrategyPrediction],
    tunables: &AggregatorTunables,
) -> Option<ConsensusResult> {
    let voters = &predictions[..tunables.consensus_voters.min(predictions.len())];
    if voters.is_empty() {
        return None;
    }

    let mut votes = vec![0.0f64; POOL_SIZE as usize + 1];
    let mut proposed = vec![false; POOL_SIZE as usize + 1];
    for prediction in voters {
        let weight = prediction.recent_accuracy.max(0.0);
        for &n in &prediction.numbers {
            if (1..=POOL_SIZE).contains(&n) {
                votes[usize::from(n)] += weight;
                proposed[usize::from(n)] = true;
            }
        }
    }

    // Un numéro proposé reste candidat même avec un vote nul.
    let mut ranked: Vec<(u8, f64)> = votes
        .iter()
        .enumerate()
        .skip(1)
        .filter(|&(n, _)| proposed[n])
        .map(|(n, &v)| (n as u8, v))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(tunables.consensus_size);

    let total: f64 = votes.iter().sum();
    let chosen: f64 = ranked.iter().map(|&(_, v)| v).sum();
    let agreement_score = if total > 0.0 { chosen / total * 100.0 } else { 0.0 };

    let confidence = voters.iter().map(|p| p.recent_accuracy).sum::<f64>() / voters.len() as f64;

    let mut numbers: Vec<u8> = ranked.iter().map(|&(n, _)| n).collect();
    numbers.sort_unstable();

    Some(ConsensusResult {
        numbers,
        confidence,
        agreement_score,
        votes: ranked,
        voters: voters.iter().map(|p| p.algorithm.clone()).collect(),
    })
}
