use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use textplots::Plot;

use crate::import::ImportResult;
use loto90_db::models::{AlgorithmConfig, Draw, NumberStatistic, ParamValue};
use loto90_stats::aggregator::consensus::ConsensusResult;
use loto90_stats::aggregator::{AlgorithmRecommendation, PerformanceSummary, ScoredAlgorithm};
use loto90_stats::anomaly::{Anomaly, Severity};
use loto90_stats::cooccurrence::{Association, Triplet};
use loto90_stats::dashboard::Dashboard;
use loto90_stats::heat::{NumberHeat, Temperature, Trend};
use loto90_stats::rules::{Confidence, ConditionalRule, WinningCombination};
use loto90_stats::strategies::Strategy;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "—".to_string(), |v| v.to_string())
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Date", "Série", "Numéros"]);
    for draw in draws {
        table.add_row(vec![
            draw.date.format("%d/%m/%Y").to_string(),
            draw.draw_name.clone(),
            format_numbers(&draw.sorted_numbers()),
        ]);
    }
    println!("{table}");
}

pub fn display_series(series: &[(String, u32)]) {
    if series.is_empty() {
        println!("Base vide. Lancez d'abord : loto90 import");
        return;
    }

    let mut table = new_table(vec!["Série", "Tirages"]);
    for (name, count) in series {
        table.add_row(vec![name.clone(), count.to_string()]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

pub fn display_stats(stats: &[NumberStatistic], window: usize) {
    println!("\n📊 Statistiques sur les {} derniers tirages\n", window);

    let mut table = new_table(vec!["Numéro", "Fréquence", "Dernière sortie", "Retard (tirages)", "Retard (jours)"]);

    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.number.cmp(&b.number)));

    for stat in &sorted {
        table.add_row(vec![
            format!("{:2}", stat.number),
            stat.frequency.to_string(),
            or_dash(stat.last_appearance.map(|d| d.format("%d/%m/%Y"))),
            or_dash(stat.draws_since_last),
            or_dash(stat.days_since_last),
        ]);
    }
    println!("{table}");
}

pub fn display_frequency_chart(stats: &[NumberStatistic]) {
    println!("\n== Fréquence par numéro ==\n");

    let points: Vec<(f32, f32)> = stats
        .iter()
        .map(|s| (f32::from(s.number), s.frequency as f32))
        .collect();
    let y_max = points.iter().map(|p| p.1).fold(0.0f32, f32::max);
    if y_max <= 0.0 {
        println!("  (Pas de données à afficher)");
        return;
    }

    let shape = textplots::Shape::Bars(&points);
    let mut chart = textplots::Chart::new_with_y_range(180, 50, 0.0, 91.0, 0.0, y_max + 1.0);
    println!("{}", chart.lineplot(&shape));
}

pub fn display_associations(number: u8, same_draw: &[Association], next_draw: &[Association]) {
    println!("\n🔗 Associations du numéro {}\n", number);

    let mut table = new_table(vec!["Rang", "Même tirage", "Fois", "Tirage suivant", "Fois"]);
    let rows = same_draw.len().max(next_draw.len());
    for i in 0..rows {
        let same = same_draw.get(i);
        let next = next_draw.get(i);
        table.add_row(vec![
            (i + 1).to_string(),
            or_dash(same.map(|a| a.number)),
            or_dash(same.map(|a| a.count)),
            or_dash(next.map(|a| a.number)),
            or_dash(next.map(|a| a.count)),
        ]);
    }
    println!("{table}");
}

pub fn display_triplets(triplets: &[Triplet]) {
    println!("\n🔺 Triplets les plus fréquents\n");
    if triplets.is_empty() {
        println!("  Aucun triplet répété.");
        return;
    }

    let mut table = new_table(vec!["Triplet", "Fois"]);
    for triplet in triplets {
        table.add_row(vec![format_numbers(&triplet.numbers), triplet.count.to_string()]);
    }
    println!("{table}");
}

fn confidence_color(confidence: Confidence) -> Color {
    match confidence {
        Confidence::High => Color::Green,
        Confidence::Medium => Color::Yellow,
        Confidence::Low => Color::White,
    }
}

pub fn display_rules(rules: &[ConditionalRule]) {
    println!("\n📐 Règles conditionnelles\n");
    if rules.is_empty() {
        println!("  Aucune règle au-dessus du seuil.");
        return;
    }

    let mut table = new_table(vec!["Si", "Alors", "Probabilité", "Support", "Confiance"]);
    for rule in rules {
        table.add_row(vec![
            Cell::new(format!("{:2}", rule.antecedent)),
            Cell::new(format!("{:2}", rule.consequent)),
            Cell::new(format!("{:.1} %", rule.probability)),
            Cell::new(rule.support.to_string()),
            Cell::new(rule.confidence.to_string()).fg(confidence_color(rule.confidence)),
        ]);
    }
    println!("{table}");
}

pub fn display_combinations(combinations: &[WinningCombination]) {
    println!("\n🏆 Paires gagnantes\n");
    if combinations.is_empty() {
        println!("  Aucune paire répétée.");
        return;
    }

    let mut table = new_table(vec!["Paire", "Fois", "Dernière sortie", "Jours", "Score"]);
    for combination in combinations {
        table.add_row(vec![
            format_numbers(&combination.numbers),
            combination.frequency.to_string(),
            combination.last_seen.format("%d/%m/%Y").to_string(),
            combination.days_since_last.to_string(),
            format!("{:.2}", combination.score),
        ]);
    }
    println!("{table}");
}

pub fn display_anomalies(anomalies: &[Anomaly]) {
    println!("\n⚠️  Anomalies\n");
    if anomalies.is_empty() {
        println!("  Aucune anomalie détectée.");
        return;
    }

    let mut table = new_table(vec!["Type", "Sévérité", "Score", "Tirage", "Description"]);
    for anomaly in anomalies {
        let color = match anomaly.severity {
            Severity::High => Color::Red,
            Severity::Medium => Color::Yellow,
        };
        table.add_row(vec![
            Cell::new(anomaly.kind.to_string()),
            Cell::new(anomaly.severity.to_string()).fg(color),
            Cell::new(format!("{:.1}", anomaly.score)),
            Cell::new(or_dash(anomaly.draw_date.map(|d| d.format("%d/%m/%Y")))),
            Cell::new(&anomaly.description),
        ]);
    }
    println!("{table}");
}

pub fn display_heat(heat: &[NumberHeat]) {
    println!("\n🌡️  Carte de chaleur\n");

    let mut table = new_table(vec!["Numéro", "Température", "Score", "Récence", "Fréquence", "Tendance"]);

    let mut sorted = heat.to_vec();
    sorted.sort_by(|a, b| {
        b.composite_score
            .partial_cmp(&a.composite_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.number.cmp(&b.number))
    });

    for entry in &sorted {
        let color = match entry.temperature {
            Temperature::Hot => Color::Red,
            Temperature::Warm => Color::Yellow,
            Temperature::Cold => Color::Cyan,
            Temperature::Frozen => Color::Blue,
        };
        let trend = match entry.trend {
            Trend::Rising => "↑",
            Trend::Falling => "↓",
            Trend::Stable => "→",
        };
        table.add_row(vec![
            Cell::new(format!("{:2}", entry.number)),
            Cell::new(entry.temperature.to_string()).fg(color),
            Cell::new(format!("{:.3}", entry.composite_score)),
            Cell::new(format!("{:.3}", entry.recency_score)),
            Cell::new(format!("{:.3}", entry.frequency_score)),
            Cell::new(trend),
        ]);
    }
    println!("{table}");
}

pub fn display_dashboard(series: &str, dashboard: &Dashboard) {
    println!("\n== Tableau de bord : {} ({} tirages) ==", series, dashboard.draw_count);

    let mut hottest = dashboard.statistics.clone();
    hottest.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.number.cmp(&b.number)));
    let mut overdue = dashboard.statistics.clone();
    overdue.sort_by(|a, b| {
        b.draws_since_last
            .unwrap_or(usize::MAX)
            .cmp(&a.draws_since_last.unwrap_or(usize::MAX))
            .then(a.number.cmp(&b.number))
    });

    let top = |stats: &[NumberStatistic]| -> String {
        let numbers: Vec<u8> = stats.iter().take(10).map(|s| s.number).collect();
        format_numbers(&numbers)
    };
    let by_temperature = |t: Temperature| -> String {
        let numbers: Vec<u8> = dashboard
            .heat
            .iter()
            .filter(|h| h.temperature == t)
            .map(|h| h.number)
            .collect();
        if numbers.is_empty() {
            "—".to_string()
        } else {
            format_numbers(&numbers)
        }
    };

    let mut table = new_table(vec!["Indicateur", "Numéros"]);
    table.add_row(vec!["Plus fréquents".to_string(), top(&hottest)]);
    table.add_row(vec!["Plus en retard".to_string(), top(&overdue)]);
    table.add_row(vec!["Chauds".to_string(), by_temperature(Temperature::Hot)]);
    table.add_row(vec!["Tièdes".to_string(), by_temperature(Temperature::Warm)]);
    println!("{table}");

    display_rules(&dashboard.rules);
    display_combinations(&dashboard.combinations);
    display_triplets(&dashboard.triplets);
    display_anomalies(&dashboard.anomalies);
}

fn format_param(value: &ParamValue) -> String {
    match value {
        ParamValue::Flag(b) => b.to_string(),
        ParamValue::Number(x) => x.to_string(),
        ParamValue::Text(s) => s.clone(),
    }
}

pub fn display_algorithms(configs: &[AlgorithmConfig]) {
    if configs.is_empty() {
        println!("Aucun algorithme configuré. Lancez : loto90 algos init");
        return;
    }

    let mut table = new_table(vec!["Algorithme", "Actif", "Poids", "Paramètres"]);
    for config in configs {
        let params = config
            .parameters
            .iter()
            .map(|(k, v)| format!("{}={}", k, format_param(v)))
            .collect::<Vec<_>>()
            .join(", ");
        let (active, color) = if config.enabled {
            ("oui", Color::Green)
        } else {
            ("non", Color::Red)
        };
        table.add_row(vec![
            Cell::new(&config.name),
            Cell::new(active).fg(color),
            Cell::new(format!("{:.2}", config.weight)),
            Cell::new(params),
        ]);
    }
    println!("{table}");
}

/// Paramètres effectifs, `clé=valeur` triés par clé.
fn format_strategy_params(strategy: &dyn Strategy) -> String {
    strategy
        .params()
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn display_strategies(strategies: &[Box<dyn Strategy>]) {
    let mut table = new_table(vec!["Algorithme", "Paramètres effectifs"]);
    for strategy in strategies {
        table.add_row(vec![
            strategy.name().to_string(),
            format_strategy_params(strategy.as_ref()),
        ]);
    }
    println!("{table}");
}

pub fn display_performance(summaries: &[PerformanceSummary]) {
    println!("\n📈 Performances des algorithmes\n");

    let mut table = new_table(vec!["Algorithme", "Prédictions", "Précision moy.", "Meilleur", "Excellentes"]);
    for summary in summaries {
        table.add_row(vec![
            summary.algorithm.clone(),
            summary.total_predictions.to_string(),
            format!("{:.1} %", summary.avg_accuracy),
            format!("{}/5", summary.best_match),
            format!("{} ({:.0} %)", summary.excellent_predictions, summary.excellent_rate() * 100.0),
        ]);
    }
    println!("{table}");
}

pub fn display_recommendation(recommendation: &AlgorithmRecommendation) {
    println!("\n🎯 Recommandation\n");

    let mut table = new_table(vec!["Rang", "Algorithme", "Score", "Poids", "Précision moy."]);
    let ranked: Vec<&ScoredAlgorithm> = std::iter::once(&recommendation.primary)
        .chain(&recommendation.alternatives)
        .collect();
    for (i, scored) in ranked.iter().enumerate() {
        let rank = if i == 0 {
            Cell::new("principal").fg(Color::Green)
        } else {
            Cell::new(format!("alternative {}", i))
        };
        table.add_row(vec![
            rank,
            Cell::new(&scored.algorithm),
            Cell::new(format!("{:.2}", scored.score)),
            Cell::new(format!("{:.2}", scored.weight)),
            Cell::new(format!("{:.1} %", scored.summary.avg_accuracy)),
        ]);
    }
    println!("{table}");
}

pub fn display_consensus(result: &ConsensusResult) {
    println!("\n🤝 Consensus ({})\n", result.voters.join(", "));

    if result.numbers.is_empty() {
        println!("  Aucun vote exprimé.");
        return;
    }

    let mut table = new_table(vec!["Numéro", "Votes"]);
    for (number, votes) in &result.votes {
        table.add_row(vec![format!("{:2}", number), format!("{:.1}", votes)]);
    }
    println!("{table}");

    println!("  Grille     : {}", format_numbers(&result.numbers));
    println!("  Confiance  : {:.1} %", result.confidence);
    println!("  Accord     : {:.1} %", result.agreement_score);
}

#[cfg(test)]
mod tests {
    use super::*;
    use loto90_stats::config::HeatTunables;
    use loto90_stats::strategies::gap::GapStrategy;
    use loto90_stats::strategies::heat::HeatStrategy;

    #[test]
    fn test_format_strategy_params() {
        assert_eq!(format_strategy_params(&GapStrategy::new(30)), "window=30");
        assert_eq!(
            format_strategy_params(&HeatStrategy::new(50, HeatTunables::default())),
            "recency_decay=0.1, window=50"
        );
    }

    #[test]
    fn test_format_numbers() {
        assert_eq!(format_numbers(&[1, 22, 90]), " 1 - 22 - 90");
        assert_eq!(or_dash(None::<u8>), "—");
    }
}
