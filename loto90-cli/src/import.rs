use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use loto90_db::rusqlite::Connection;
use std::path::Path;

use loto90_db::db::insert_draw;
use loto90_db::models::{parse_numbers, Draw};

/// Accepte `JJ/MM/AAAA` (format des exports) et `AAAA-MM-JJ`.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .with_context(|| format!("Format de date invalide: '{}'", raw))
}

fn field(record: &csv::StringRecord, idx: usize) -> Result<&str> {
    record
        .get(idx)
        .map(str::trim)
        .with_context(|| format!("Champ manquant à l'index {}", idx))
}

/// Ligne attendue : `série;date;n1;n2;n3;n4;n5`.
fn parse_record(record: &csv::StringRecord) -> Result<Draw> {
    let get = |idx: usize| field(record, idx);

    let draw_name = get(0)?;
    if draw_name.is_empty() {
        bail!("Nom de série vide");
    }
    let date = parse_date(get(1)?)?;

    let mut values = Vec::with_capacity(5);
    for idx in 2..record.len() {
        let s = get(idx)?;
        if s.is_empty() {
            continue;
        }
        let n = s
            .parse::<u8>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))?;
        values.push(n);
    }
    let numbers = parse_numbers(&values)?;

    Ok(Draw::new(draw_name, date, numbers))
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    import_records(conn, reader)
}

fn import_records<R: std::io::Read>(conn: &Connection, mut reader: csv::Reader<R>) -> Result<ImportResult> {
    let tx = conn
        .unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        let line = result.total_records;
        let draw = match record_result
            .context("Lecture impossible")
            .and_then(|record| parse_record(&record))
        {
            Ok(draw) => draw,
            Err(e) => {
                tracing::warn!(line, "ligne ignorée : {:#}", e);
                result.errors += 1;
                continue;
            }
        };

        match insert_draw(&tx, &draw) {
            Ok(true) => result.inserted += 1,
            Ok(false) => result.skipped += 1,
            Err(e) => {
                tracing::warn!(line, "insertion impossible : {:#}", e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    tracing::info!(
        inserted = result.inserted,
        skipped = result.skipped,
        errors = result.errors,
        "import terminé"
    );
    Ok(result)
}
