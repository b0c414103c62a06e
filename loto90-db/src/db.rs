use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::models::{AlgorithmConfig, AlgorithmPerformanceRecord, Draw};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    draw_name  TEXT NOT NULL,
    date       TEXT NOT NULL,
    n1         INTEGER NOT NULL,
    n2         INTEGER NOT NULL,
    n3         INTEGER NOT NULL,
    n4         INTEGER NOT NULL,
    n5         INTEGER NOT NULL,
    PRIMARY KEY (draw_name, date)
);

CREATE TABLE IF NOT EXISTS algorithm_configs (
    name        TEXT PRIMARY KEY,
    enabled     INTEGER NOT NULL DEFAULT 1,
    weight      REAL NOT NULL DEFAULT 1.0,
    parameters  TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS performance (
    algorithm        TEXT NOT NULL,
    draw_name        TEXT NOT NULL,
    prediction_date  TEXT NOT NULL,
    draw_date        TEXT NOT NULL,
    p1 INTEGER NOT NULL, p2 INTEGER NOT NULL, p3 INTEGER NOT NULL, p4 INTEGER NOT NULL, p5 INTEGER NOT NULL,
    w1 INTEGER NOT NULL, w2 INTEGER NOT NULL, w3 INTEGER NOT NULL, w4 INTEGER NOT NULL, w5 INTEGER NOT NULL,
    match_count      INTEGER NOT NULL,
    accuracy_score   REAL NOT NULL,
    UNIQUE (algorithm, draw_name, prediction_date, draw_date)
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("loto90.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    tracing::debug!(path = %path.display(), "base ouverte");
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la création des tables")?;
    Ok(())
}

pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (draw_name, date, n1, n2, n3, n4, n5)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            draw.draw_name,
            draw.date,
            draw.numbers[0],
            draw.numbers[1],
            draw.numbers[2],
            draw.numbers[3],
            draw.numbers[4],
        ],
    ).context("Échec de l'insertion du tirage")?;
    Ok(changed > 0)
}

fn draw_from_row(row: &Row<'_>) -> rusqlite::Result<Draw> {
    Ok(Draw {
        draw_name: row.get(0)?,
        date: row.get(1)?,
        numbers: [
            row.get::<_, u8>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, u8>(4)?,
            row.get::<_, u8>(5)?,
            row.get::<_, u8>(6)?,
        ],
    })
}

/// Derniers tirages d'une série, du plus récent au plus ancien.
pub fn fetch_draw_history(conn: &Connection, draw_name: &str, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(
        "SELECT draw_name, date, n1, n2, n3, n4, n5
         FROM draws WHERE draw_name = ?1 ORDER BY date DESC LIMIT ?2"
    )?;
    let draws = stmt
        .query_map(params![draw_name, limit], draw_from_row)?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Lecture de l'historique '{draw_name}' impossible"))?;
    Ok(draws)
}

pub fn draw_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT draw_name FROM draws ORDER BY draw_name")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

pub fn count_draws(conn: &Connection, draw_name: Option<&str>) -> Result<u32> {
    let count: u32 = match draw_name {
        Some(name) => conn.query_row(
            "SELECT COUNT(*) FROM draws WHERE draw_name = ?1",
            [name],
            |row| row.get(0),
        )?,
        None => conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?,
    };
    Ok(count)
}

pub fn upsert_algorithm_config(conn: &Connection, config: &AlgorithmConfig) -> Result<()> {
    let parameters = serde_json::to_string(&config.parameters)
        .context("Sérialisation des paramètres impossible")?;
    conn.execute(
        "INSERT INTO algorithm_configs (name, enabled, weight, parameters)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(name) DO UPDATE SET
            enabled = excluded.enabled,
            weight = excluded.weight,
            parameters = excluded.parameters",
        params![config.name, config.enabled, config.weight, parameters],
    ).with_context(|| format!("Échec de l'enregistrement de l'algorithme '{}'", config.name))?;
    Ok(())
}

pub fn fetch_algorithm_config(conn: &Connection, name: &str) -> Result<Option<AlgorithmConfig>> {
    let raw = conn
        .query_row(
            "SELECT name, enabled, weight, parameters FROM algorithm_configs WHERE name = ?1",
            [name],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, bool>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;
    raw.map(config_from_parts).transpose()
}

pub fn fetch_algorithm_configs(conn: &Connection) -> Result<Vec<AlgorithmConfig>> {
    let mut stmt = conn.prepare(
        "SELECT name, enabled, weight, parameters FROM algorithm_configs ORDER BY name"
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, bool>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(config_from_parts).collect()
}

fn config_from_parts((name, enabled, weight, parameters): (String, bool, f64, String)) -> Result<AlgorithmConfig> {
    let parameters = serde_json::from_str(&parameters)
        .with_context(|| format!("Paramètres invalides pour l'algorithme '{name}'"))?;
    Ok(AlgorithmConfig { name, enabled, weight, parameters })
}

/// Insère ou remplace une évaluation : la clé (algorithme, série, date de
/// prédiction, date du tirage) rend la réévaluation idempotente.
pub fn upsert_performance(conn: &Connection, record: &AlgorithmPerformanceRecord) -> Result<()> {
    let p = &record.predicted_numbers;
    let w = &record.winning_numbers;
    conn.execute(
        "INSERT INTO performance (algorithm, draw_name, prediction_date, draw_date,
            p1, p2, p3, p4, p5, w1, w2, w3, w4, w5, match_count, accuracy_score)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
         ON CONFLICT(algorithm, draw_name, prediction_date, draw_date) DO UPDATE SET
            p1 = excluded.p1, p2 = excluded.p2, p3 = excluded.p3, p4 = excluded.p4, p5 = excluded.p5,
            w1 = excluded.w1, w2 = excluded.w2, w3 = excluded.w3, w4 = excluded.w4, w5 = excluded.w5,
            match_count = excluded.match_count,
            accuracy_score = excluded.accuracy_score",
        params![
            record.algorithm,
            record.draw_name,
            record.prediction_date,
            record.draw_date,
            p[0], p[1], p[2], p[3], p[4],
            w[0], w[1], w[2], w[3], w[4],
            record.match_count,
            record.accuracy_score,
        ],
    ).context("Échec de l'enregistrement de la performance")?;
    Ok(())
}

/// Historique des évaluations, du tirage le plus récent au plus ancien,
/// filtré par algorithme et/ou série.
pub fn fetch_performance(
    conn: &Connection,
    algorithm: Option<&str>,
    draw_name: Option<&str>,
) -> Result<Vec<AlgorithmPerformanceRecord>> {
    let mut stmt = conn.prepare(
        "SELECT algorithm, draw_name, prediction_date, draw_date,
                p1, p2, p3, p4, p5, w1, w2, w3, w4, w5, match_count, accuracy_score
         FROM performance
         WHERE (?1 IS NULL OR algorithm = ?1) AND (?2 IS NULL OR draw_name = ?2)
         ORDER BY draw_date DESC, algorithm"
    )?;
    let records = stmt
        .query_map(params![algorithm, draw_name], |row| {
            Ok(AlgorithmPerformanceRecord {
                algorithm: row.get(0)?,
                draw_name: row.get(1)?,
                prediction_date: row.get(2)?,
                draw_date: row.get(3)?,
                predicted_numbers: [row.get(4)?, row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?],
                winning_numbers: [row.get(9)?, row.get(10)?, row.get(11)?, row.get(12)?, row.get(13)?],
                match_count: row.get(14)?,
                accuracy_score: row.get(15)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}
