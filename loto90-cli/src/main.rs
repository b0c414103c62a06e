mod display;
mod import;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use loto90_db::db::{
    count_draws, db_path, draw_names, fetch_algorithm_config, fetch_algorithm_configs, insert_draw,
    migrate, open_db, upsert_algorithm_config, upsert_performance,
};
use loto90_db::models::{parse_numbers, Draw, ParamValue, POOL_SIZE};
use loto90_db::provider::DrawHistoryProvider;
use loto90_db::rusqlite::Connection;
use loto90_stats::aggregator::consensus::consensus;
use loto90_stats::aggregator::{recommend, recommended_predictions, summarize_performance};
use loto90_stats::anomaly::{detect_anomalies, scan_anomalies};
use loto90_stats::backtest::backtest;
use loto90_stats::config::{load_tunables, save_tunables, Tunables};
use loto90_stats::cooccurrence::{next_draw_associations, same_draw_associations, top_triplets};
use loto90_stats::dashboard::build_dashboard;
use loto90_stats::frequency::number_statistics;
use loto90_stats::heat::heat_map;
use loto90_stats::rules::{conditional_rules, winning_combinations};
use loto90_stats::strategies::{build_strategies, default_algorithm_configs};

#[derive(Parser)]
#[command(name = "loto90", about = "Analyseur statistique des tirages 5/90")]
struct Cli {
    /// Chemin de la base SQLite (défaut : ./data/loto90.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Fichier JSON de réglages des analyses
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un fichier CSV (série;date;n1..n5)
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long, default_value = "assets/loto90.csv")]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les séries, ou les derniers tirages d'une série
    List {
        /// Série de tirages
        #[arg(short, long)]
        series: Option<String>,

        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Ajouter un tirage
    Add {
        #[arg(short, long)]
        series: String,

        /// Date (JJ/MM/AAAA ou AAAA-MM-JJ)
        #[arg(short, long)]
        date: String,

        /// Les 5 numéros tirés (1-90)
        #[arg(num_args = 1..)]
        numbers: Vec<u8>,
    },

    /// Fréquences et retards
    Stats {
        #[arg(short, long)]
        series: String,

        /// Fenêtre d'analyse (nombre de tirages)
        #[arg(short, long, default_value = "100")]
        window: u32,

        /// Afficher le graphique des fréquences
        #[arg(long)]
        chart: bool,
    },

    /// Associations d'un numéro, ou triplets fréquents
    Pairs {
        #[arg(short, long)]
        series: String,

        /// Numéro étudié (sans numéro : triplets les plus fréquents)
        #[arg(short, long)]
        number: Option<u8>,

        #[arg(short, long, default_value = "100")]
        window: u32,
    },

    /// Règles conditionnelles et paires gagnantes
    Rules {
        #[arg(short, long)]
        series: String,

        #[arg(short, long, default_value = "100")]
        window: u32,
    },

    /// Détection d'anomalies
    Anomalies {
        #[arg(short, long)]
        series: String,

        /// Afficher toutes les anomalies, pas seulement les plus marquantes
        #[arg(long)]
        all: bool,
    },

    /// Carte de chaleur des numéros
    Heat {
        #[arg(short, long)]
        series: String,

        #[arg(short, long, default_value = "100")]
        window: u32,
    },

    /// Toutes les analyses d'une série
    Dashboard {
        #[arg(short, long)]
        series: String,

        #[arg(short, long, default_value = "100")]
        window: u32,
    },

    /// Gérer les algorithmes de prédiction
    Algos {
        #[command(subcommand)]
        action: AlgosCommand,
    },

    /// Évaluer les algorithmes actifs sur l'historique (walk-forward)
    Evaluate {
        #[arg(short, long)]
        series: String,

        /// Nombre de tirages d'entraînement par prédiction
        #[arg(short, long, default_value = "50")]
        window: usize,

        /// Nombre de tirages évalués
        #[arg(short, long, default_value = "30")]
        tests: usize,
    },

    /// Recommander un algorithme et proposer une grille de consensus
    Recommend {
        #[arg(short, long)]
        series: String,

        #[arg(short, long, default_value = "100")]
        window: u32,
    },

    /// Écrire un fichier de réglages avec les valeurs par défaut
    ConfigInit {
        #[arg(short, long, default_value = "loto90.json")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum AlgosCommand {
    /// Lister les algorithmes configurés
    List,

    /// Enregistrer les algorithmes intégrés avec leur configuration par défaut
    Init,

    /// Modifier un algorithme
    Set {
        name: String,

        #[arg(long)]
        enabled: Option<bool>,

        #[arg(long)]
        weight: Option<f64>,

        /// Paramètre clé=valeur (répétable)
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOTO90_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let path = cli.db.clone().unwrap_or_else(db_path);

    if let Command::ConfigInit { output } = &cli.command {
        return cmd_config_init(output);
    }
    if let Command::DbPath = cli.command {
        println!("{}", path.display());
        return Ok(());
    }

    let tunables = load_settings(cli.config.as_deref())?;
    let conn = open_db(&path)?;
    migrate(&conn)?;
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::List { series, last } => cmd_list(&conn, series.as_deref(), last),
        Command::Add { series, date, numbers } => cmd_add(&conn, &series, &date, &numbers),
        Command::Stats { series, window, chart } => cmd_stats(&conn, &series, window, chart, today),
        Command::Pairs { series, number, window } => cmd_pairs(&conn, &series, number, window, &tunables),
        Command::Rules { series, window } => cmd_rules(&conn, &series, window, today, &tunables),
        Command::Anomalies { series, all } => cmd_anomalies(&conn, &series, all, &tunables),
        Command::Heat { series, window } => cmd_heat(&conn, &series, window, &tunables),
        Command::Dashboard { series, window } => cmd_dashboard(&conn, &series, window, today, &tunables),
        Command::Algos { action } => cmd_algos(&conn, action),
        Command::Evaluate { series, window, tests } => cmd_evaluate(&conn, &series, window, tests, &tunables),
        Command::Recommend { series, window } => cmd_recommend(&conn, &series, window, &tunables),
        Command::DbPath | Command::ConfigInit { .. } => Ok(()),
    }
}

/// Fichier absent : réglages par défaut.
fn load_settings(path: Option<&Path>) -> Result<Tunables> {
    match path {
        Some(path) if path.exists() => load_tunables(path),
        Some(path) => {
            tracing::warn!(path = %path.display(), "fichier de réglages absent, valeurs par défaut");
            Ok(Tunables::default())
        }
        None => Ok(Tunables::default()),
    }
}

/// Historique d'une série ; `None` (avec un message) si la série est vide.
fn load_history(provider: &impl DrawHistoryProvider, series: &str, limit: u32) -> Result<Option<Vec<Draw>>> {
    let draws = provider.draw_history(series, limit)?;
    if draws.is_empty() {
        println!("Aucun tirage pour la série « {} ». Lancez d'abord : loto90 import", series);
        return Ok(None);
    }
    tracing::debug!(series, draws = draws.len(), "historique chargé");
    Ok(Some(draws))
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    display::display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, series: Option<&str>, last: u32) -> Result<()> {
    let Some(series) = series else {
        let mut summary = Vec::new();
        for name in draw_names(conn)? {
            let count = count_draws(conn, Some(&name))?;
            summary.push((name, count));
        }
        display::display_series(&summary);
        return Ok(());
    };

    if let Some(draws) = load_history(conn, series, last)? {
        display::display_draws(&draws);
    }
    Ok(())
}

fn cmd_add(conn: &Connection, series: &str, raw_date: &str, numbers: &[u8]) -> Result<()> {
    let date = import::parse_date(raw_date)?;
    let numbers = parse_numbers(numbers)?;
    let draw = Draw::new(series, date, numbers);

    println!("Tirage à insérer :");
    display::display_draws(std::slice::from_ref(&draw));

    if insert_draw(conn, &draw)? {
        tracing::info!(series, %date, "tirage ajouté");
        println!("Tirage inséré avec succès.");
    } else {
        println!("Ce tirage existe déjà (doublon ignoré).");
    }
    Ok(())
}

fn cmd_stats(conn: &Connection, series: &str, window: u32, chart: bool, today: NaiveDate) -> Result<()> {
    let Some(draws) = load_history(conn, series, window)? else {
        return Ok(());
    };
    let stats = number_statistics(&draws, POOL_SIZE, today);
    display::display_stats(&stats, draws.len());
    if chart {
        display::display_frequency_chart(&stats);
    }
    Ok(())
}

fn cmd_pairs(
    conn: &Connection,
    series: &str,
    number: Option<u8>,
    window: u32,
    tunables: &Tunables,
) -> Result<()> {
    if let Some(n) = number {
        if !(1..=POOL_SIZE).contains(&n) {
            bail!("Numéro hors plage 1-{}: {}", POOL_SIZE, n);
        }
    }
    let Some(draws) = load_history(conn, series, window)? else {
        return Ok(());
    };

    let top_k = tunables.cooccurrence.top_k;
    match number {
        Some(n) => display::display_associations(
            n,
            &same_draw_associations(n, &draws, top_k),
            &next_draw_associations(n, &draws, top_k),
        ),
        None => display::display_triplets(&top_triplets(&draws, tunables.cooccurrence.top_triplets)),
    }
    Ok(())
}

fn cmd_rules(conn: &Connection, series: &str, window: u32, today: NaiveDate, tunables: &Tunables) -> Result<()> {
    let Some(draws) = load_history(conn, series, window)? else {
        return Ok(());
    };
    display::display_rules(&conditional_rules(&draws, &tunables.rules));
    display::display_combinations(&winning_combinations(&draws, today, &tunables.rules));
    Ok(())
}

fn cmd_anomalies(conn: &Connection, series: &str, all: bool, tunables: &Tunables) -> Result<()> {
    let window = u32::try_from(tunables.anomaly.window).unwrap_or(u32::MAX);
    let Some(draws) = load_history(conn, series, window)? else {
        return Ok(());
    };
    let anomalies = if all {
        scan_anomalies(&draws, &tunables.anomaly)
    } else {
        detect_anomalies(&draws, &tunables.anomaly)
    };
    display::display_anomalies(&anomalies);
    Ok(())
}

fn cmd_heat(conn: &Connection, series: &str, window: u32, tunables: &Tunables) -> Result<()> {
    let Some(draws) = load_history(conn, series, window)? else {
        return Ok(());
    };
    display::display_heat(&heat_map(&draws, POOL_SIZE, &tunables.heat));
    Ok(())
}

fn cmd_dashboard(conn: &Connection, series: &str, window: u32, today: NaiveDate, tunables: &Tunables) -> Result<()> {
    let Some(draws) = load_history(conn, series, window)? else {
        return Ok(());
    };
    let dashboard = build_dashboard(&draws, today, tunables);
    display::display_dashboard(series, &dashboard);
    Ok(())
}

/// `clé=valeur` : booléen, puis nombre, sinon texte.
fn parse_param(raw: &str) -> Result<(String, ParamValue)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("Paramètre attendu sous la forme clé=valeur: '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("Nom de paramètre vide: '{}'", raw);
    }
    let value = value.trim();
    let parsed = if let Ok(b) = value.parse::<bool>() {
        ParamValue::Flag(b)
    } else if let Ok(x) = value.parse::<f64>() {
        ParamValue::Number(x)
    } else {
        ParamValue::Text(value.to_string())
    };
    Ok((key.to_string(), parsed))
}

fn cmd_algos(conn: &Connection, action: AlgosCommand) -> Result<()> {
    match action {
        AlgosCommand::List => {
            display::display_algorithms(&fetch_algorithm_configs(conn)?);
        }
        AlgosCommand::Init => {
            let mut created = 0;
            for config in default_algorithm_configs() {
                if fetch_algorithm_config(conn, &config.name)?.is_none() {
                    upsert_algorithm_config(conn, &config)?;
                    created += 1;
                }
            }
            println!("{} algorithme(s) enregistré(s).", created);
            display::display_algorithms(&fetch_algorithm_configs(conn)?);
        }
        AlgosCommand::Set { name, enabled, weight, params } => {
            let mut config = fetch_algorithm_config(conn, &name)?
                .with_context(|| format!("Algorithme inconnu: '{}' (voir : loto90 algos list)", name))?;
            if let Some(enabled) = enabled {
                config.enabled = enabled;
            }
            if let Some(weight) = weight {
                if !weight.is_finite() || weight < 0.0 {
                    bail!("Le poids doit être un réel positif: {}", weight);
                }
                config.weight = weight;
            }
            for raw in &params {
                let (key, value) = parse_param(raw)?;
                config.parameters.insert(key, value);
            }
            upsert_algorithm_config(conn, &config)?;
            tracing::info!(algorithm = %config.name, "configuration mise à jour");
            display::display_algorithms(std::slice::from_ref(&config));
        }
    }
    Ok(())
}

fn cmd_evaluate(conn: &Connection, series: &str, window: usize, tests: usize, tunables: &Tunables) -> Result<()> {
    let configs = conn.algorithm_configs()?;
    let strategies = build_strategies(&configs, tunables);
    if strategies.is_empty() {
        bail!("Aucun algorithme actif. Lancez d'abord : loto90 algos init");
    }

    let limit = u32::try_from(window + tests + 1).unwrap_or(u32::MAX);
    let Some(draws) = load_history(conn, series, limit)? else {
        return Ok(());
    };

    println!(
        "Évaluation de {} algorithmes sur {} tirages (fenêtre {})...",
        strategies.len(),
        tests.min(draws.len().saturating_sub(1)),
        window
    );

    display::display_strategies(&strategies);

    let pb = ProgressBar::new(strategies.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Gabarit de progression invalide")?
            .progress_chars("=> "),
    );

    let tx = conn
        .unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;
    let mut records = Vec::new();
    for strategy in &strategies {
        pb.set_message(strategy.name().to_string());
        for record in backtest(strategy.as_ref(), &draws, window, tests) {
            upsert_performance(&tx, &record)?;
            records.push(record);
        }
        pb.inc(1);
    }
    tx.commit().context("Échec du commit")?;
    pb.finish_with_message("Évaluation terminée");

    display::display_performance(&summarize_performance(
        &records,
        tunables.aggregator.excellent_threshold,
    ));
    Ok(())
}

fn cmd_recommend(conn: &Connection, series: &str, window: u32, tunables: &Tunables) -> Result<()> {
    let configs = conn.algorithm_configs()?;
    let records = conn.performance_history(None, Some(series))?;
    let summaries = summarize_performance(&records, tunables.aggregator.excellent_threshold);

    let Some(recommendation) = recommend(&configs, &summaries, &tunables.aggregator) else {
        println!("Aucune recommandation disponible. Lancez d'abord : loto90 evaluate --series {}", series);
        return Ok(());
    };
    display::display_performance(&summaries);
    display::display_recommendation(&recommendation);

    let Some(draws) = load_history(conn, series, window)? else {
        return Ok(());
    };
    let predictions = recommended_predictions(&recommendation, &configs, &draws, tunables);
    match consensus(&predictions, &tunables.aggregator) {
        Some(result) => display::display_consensus(&result),
        None => println!("Aucune prédiction disponible pour le consensus."),
    }
    Ok(())
}

fn cmd_config_init(output: &Path) -> Result<()> {
    if output.exists() {
        bail!("{:?} existe déjà", output);
    }
    save_tunables(&Tunables::default(), output)?;
    println!("Réglages par défaut écrits dans {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("window=30").unwrap(), ("window".to_string(), ParamValue::Number(30.0)));
        assert_eq!(parse_param("boost = true").unwrap(), ("boost".to_string(), ParamValue::Flag(true)));
        assert_eq!(
            parse_param("mode=strict").unwrap(),
            ("mode".to_string(), ParamValue::Text("strict".to_string()))
        );
        assert!(parse_param("window").is_err());
        assert!(parse_param("=3").is_err());
    }

    #[test]
    fn test_load_settings() {
        assert_eq!(load_settings(None).unwrap(), Tunables::default());

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert_eq!(load_settings(Some(missing.as_path())).unwrap(), Tunables::default());

        let path = dir.path().join("reglages.json");
        std::fs::write(&path, r#"{"heat": {"hot": 0.9}}"#).unwrap();
        let tunables = load_settings(Some(path.as_path())).unwrap();
        assert!((tunables.heat.hot - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let cli = Cli::try_parse_from(["loto90", "--db", "x.db", "add", "-s", "Réveil", "-d", "01/03/2024", "1", "2", "3", "4", "5"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        match cli.command {
            Command::Add { series, numbers, .. } => {
                assert_eq!(series, "Réveil");
                assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
            }
            _ => panic!("commande inattendue"),
        }
    }
}
