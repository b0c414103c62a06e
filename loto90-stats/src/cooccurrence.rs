use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use loto90_db::models::{Draw, POOL_SIZE};

const STRIDE: usize = POOL_SIZE as usize + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Association {
    pub number: u8,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Triplet {
    pub numbers: [u8; 3],
    pub count: u32,
}

fn index(n: u8) -> Option<usize> {
    (1..=POOL_SIZE).contains(&n).then_some(usize::from(n))
}

/// Comptages de co-apparition dans un même tirage (matrice symétrique).
#[derive(Debug, Clone)]
pub struct CoOccurrence {
    draw_counts: Vec<u32>,
    pairs: Vec<u32>,
    last_joint: Vec<Option<NaiveDate>>,
}

impl CoOccurrence {
    pub fn from_history(draws: &[Draw]) -> Self {
        let mut matrix = Self {
            draw_counts: vec![0; STRIDE],
            pairs: vec![0; STRIDE * STRIDE],
            last_joint: vec![None; STRIDE * STRIDE],
        };

        for draw in draws {
            let numbers: Vec<usize> = draw.numbers.iter().filter_map(|&n| index(n)).collect();
            for &a in &numbers {
                matrix.draw_counts[a] += 1;
                for &b in &numbers {
                    if a == b {
                        continue;
                    }
                    let cell = a * STRIDE + b;
                    matrix.pairs[cell] += 1;
                    let last = &mut matrix.last_joint[cell];
                    if last.map_or(true, |d| draw.date > d) {
                        *last = Some(draw.date);
                    }
                }
            }
        }

        matrix
    }

    /// Nombre de tirages contenant `n`.
    pub fn draw_count(&self, n: u8) -> u32 {
        index(n).map_or(0, |i| self.draw_counts[i])
    }

    pub fn pair_count(&self, a: u8, b: u8) -> u32 {
        match (index(a), index(b)) {
            (Some(i), Some(j)) => self.pairs[i * STRIDE + j],
            _ => 0,
        }
    }

    pub fn last_joint_date(&self, a: u8, b: u8) -> Option<NaiveDate> {
        match (index(a), index(b)) {
            (Some(i), Some(j)) => self.last_joint[i * STRIDE + j],
            _ => None,
        }
    }

    /// Paires ordonnées (a, b), a ≠ b, apparues ensemble au moins une fois.
    pub fn ordered_pairs(&self) -> impl Iterator<Item = (u8, u8, u32)> + '_ {
        (1..=POOL_SIZE).flat_map(move |a| {
            (1..=POOL_SIZE)
                .filter(move |&b| b != a)
                .map(move |b| (a, b, self.pair_count(a, b)))
                .filter(|&(_, _, count)| count > 0)
        })
    }

    /// Paires non ordonnées (a < b) apparues ensemble au moins une fois.
    pub fn unordered_pairs(&self) -> impl Iterator<Item = (u8, u8, u32)> + '_ {
        self.ordered_pairs().filter(|&(a, b, _)| a < b)
    }
}

fn rank(counts: &[u32], exclude: u8, top_k: usize) -> Vec<Association> {
    let mut ranked: Vec<Association> = counts
        .iter()
        .enumerate()
        .filter(|&(n, &count)| count > 0 && n != usize::from(exclude))
        .map(|(n, &count)| Association { number: n as u8, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.number.cmp(&b.number)));
    ranked.truncate(top_k);
    ranked
}

/// Numéros sortis dans les mêmes tirages que `number`.
pub fn same_draw_associations(number: u8, draws: &[Draw], top_k: usize) -> Vec<Association> {
    let mut counts = vec![0u32; STRIDE];
    for draw in draws.iter().filter(|d| d.contains(number)) {
        for &n in &draw.numbers {
            if let Some(i) = index(n) {
                counts[i] += 1;
            }
        }
    }
    rank(&counts, number, top_k)
}

/// Numéros sortis au tirage suivant un tirage contenant `number`.
/// `draws[0]` reste le plus récent ; le parcours se fait dans l'ordre chronologique.
pub fn next_draw_associations(number: u8, draws: &[Draw], top_k: usize) -> Vec<Association> {
    if draws.len() < 2 {
        return Vec::new();
    }

    let chronological: Vec<&Draw> = draws.iter().rev().collect();
    let mut counts = vec![0u32; STRIDE];
    for pair in chronological.windows(2) {
        let (earlier, later) = (pair[0], pair[1]);
        if !earlier.contains(number) {
            continue;
        }
        for &n in &later.numbers {
            if let Some(i) = index(n) {
                counts[i] += 1;
            }
        }
    }

    let mut ranked: Vec<Association> = counts
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .map(|(n, &count)| Association { number: n as u8, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.number.cmp(&b.number)));
    ranked.truncate(top_k);
    ranked
}

/// Triplets les plus fréquents au sein d'un même tirage.
pub fn top_triplets(draws: &[Draw], top_k: usize) -> Vec<Triplet> {
    let mut counts: HashMap<[u8; 3], u32> = HashMap::new();
    for draw in draws {
        let sorted: Vec<u8> = draw
            .sorted_numbers()
            .into_iter()
            .filter(|&n| index(n).is_some())
            .collect();
        for i in 0..sorted.len() {
            for j in (i + 1)..sorted.len() {
                for k in (j + 1)..sorted.len() {
                    *counts.entry([sorted[i], sorted[j], sorted[k]]).or_insert(0) += 1;
                }
            }
        }
    }

    let mut triplets: Vec<Triplet> = counts
        .into_iter()
        .map(|(numbers, count)| Triplet { numbers, count })
        .collect();
    triplets.sort_by(|a, b| b.count.cmp(&a.count).then(a.numbers.cmp(&b.numbers)));
    triplets.truncate(top_k);
    triplets
}
