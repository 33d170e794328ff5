//! Tools for analysing the public VAERS (Vaccine Adverse Event Reporting System) extracts.
//!
//! Each year's extract is three tables: case details, symptoms, and vaccines given, all keyed on
//! `VAERS_ID`. They are loaded into [`Store`]s, joined into one [`UnifiedReport`] per ID, and
//! then counted and ranked with the functions in [`stats`].
pub mod config;
pub mod join;
pub mod query;
mod range;
pub mod record;
pub mod report;
pub mod stats;
mod util;

pub use anyhow::{Context, Error};
use qu::ick_use::*;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

pub use crate::{
    config::Config,
    join::{join, Diagnostic, DiagnosticSink, LogDiagnostics},
    range::{Range, RangeSet, RangeSetCountsWithMissing},
    record::{Case, LoadError, Row, Source, Store, SymptomRow, VaccineExposure, ID_FIELD},
    report::{Fields, ReportField, Reports, UnifiedReport},
    stats::{ProfileOptions, StatsError},
    util::{header, ResultExt},
};

pub type ArcStr = Arc<str>;
pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
/// The `VAERS_ID` of a report. Kept as a string: it's only ever compared, never computed with.
pub type ReportId = ArcStr;

/// All three tables of one extract, and the reports joined from them.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub cases: Store<Case>,
    pub symptoms: Store<SymptomRow>,
    pub vaccines: Store<VaccineExposure>,
    pub reports: Reports,
}

impl Dataset {
    /// Load the extract `config` points at and join it.
    pub fn load(config: &Config, sink: &mut impl DiagnosticSink) -> Result<Self> {
        let cases = load_store(&config.source_path(Source::Case))?;
        let symptoms = load_store(&config.source_path(Source::Symptom))?;
        let vaccines = load_store(&config.source_path(Source::Vaccine))?;
        Ok(Self::from_stores(cases, symptoms, vaccines, sink))
    }

    /// Like [`Dataset::load`], but from the `.json` files written by the `convert` tool.
    pub fn load_json(config: &Config, sink: &mut impl DiagnosticSink) -> Result<Self> {
        let path = |source: Source| json_path(&config.source_path(source));
        let cases = load_store(&path(Source::Case))?;
        let symptoms = load_store(&path(Source::Symptom))?;
        let vaccines = load_store(&path(Source::Vaccine))?;
        Ok(Self::from_stores(cases, symptoms, vaccines, sink))
    }

    pub fn from_stores(
        cases: Store<Case>,
        symptoms: Store<SymptomRow>,
        vaccines: Store<VaccineExposure>,
        sink: &mut impl DiagnosticSink,
    ) -> Self {
        let reports = join(&cases, &symptoms, &vaccines, sink);
        Dataset {
            cases,
            symptoms,
            vaccines,
            reports,
        }
    }
}

/// Load a `.json` file written by `convert`, or a csv file.
fn load_store<T: record::SourceRecord>(path: &Path) -> Result<Store<T>> {
    let rows = match path.extension() {
        Some(ext) if ext == "json" => load_json_rows_from_path(path)?,
        _ => load_rows_from_path(path)?,
    };
    let store = Store::load(rows)
        .with_context(|| format!("while indexing \"{}\"", path.display()))?;
    event!(
        Level::INFO,
        "loaded {} {} records from \"{}\"",
        store.len(),
        T::SOURCE,
        path.display()
    );
    Ok(store)
}

/// Read delimited text with a header row into field maps.
///
/// Fields are trimmed and decoded as latin1, so this never fails on encoding. A row shorter than
/// the header is missing the trailing fields.
pub fn load_rows(reader: impl io::Read) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers: Vec<String> = reader.byte_headers()?.iter().map(util::latin1).collect();
    let mut rows = vec![];
    for record in reader.byte_records() {
        let record = record?;
        rows.push(
            headers
                .iter()
                .cloned()
                .zip(record.iter().map(util::latin1))
                .collect(),
        );
    }
    Ok(rows)
}

pub fn load_rows_from_path(path: impl AsRef<Path>) -> Result<Vec<Row>> {
    fn inner(path: &Path) -> Result<Vec<Row>> {
        load_rows(io::BufReader::new(fs::File::open(path)?))
    }
    let path = path.as_ref();
    check_extension(path, "csv")?;
    inner(path).with_context(|| format!("while loading \"{}\"", path.display()))
}

/// Read the keyed JSON written by [`rows_to_keyed_json`] (`{ "<id>": { "<field>": <value> } }`).
///
/// The key is stored as [`ID_FIELD`] if the row doesn't already have it. `null` values are
/// treated as missing, and other non-string values are kept as their JSON text.
pub fn load_json_rows(reader: impl io::Read) -> Result<Vec<Row>> {
    let keyed: serde_json::Map<String, serde_json::Value> = serde_json::from_reader(reader)?;
    keyed
        .into_iter()
        .map(|(id, fields)| {
            let fields = match fields {
                serde_json::Value::Object(fields) => fields,
                other => bail!("expected an object for id {}, found {}", id, other),
            };
            let mut row: Row = fields
                .into_iter()
                .filter_map(|(name, value)| {
                    let value = match value {
                        serde_json::Value::Null => return None,
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    Some((name, value))
                })
                .collect();
            row.entry(ID_FIELD.to_string()).or_insert(id);
            Ok(row)
        })
        .collect()
}

pub fn load_json_rows_from_path(path: impl AsRef<Path>) -> Result<Vec<Row>> {
    fn inner(path: &Path) -> Result<Vec<Row>> {
        load_json_rows(io::BufReader::new(fs::File::open(path)?))
    }
    let path = path.as_ref();
    check_extension(path, "json")?;
    inner(path).with_context(|| format!("while loading \"{}\"", path.display()))
}

/// Key rows on [`ID_FIELD`], for writing out as JSON.
///
/// Rows with the same ID replace earlier ones. Rows without an ID are an error.
pub fn rows_to_keyed_json(rows: Vec<Row>) -> Result<serde_json::Value> {
    let mut keyed = serde_json::Map::new();
    for (idx, row) in rows.into_iter().enumerate() {
        let id = match row.get(ID_FIELD) {
            Some(id) => id.clone(),
            None => {
                return Err(LoadError::MissingKeyField {
                    field: ID_FIELD,
                    row: idx + 1,
                }
                .into())
            }
        };
        let fields = row
            .into_iter()
            .map(|(name, value)| (name, serde_json::Value::String(value)))
            .collect();
        keyed.insert(id, serde_json::Value::Object(fields));
    }
    Ok(serde_json::Value::Object(keyed))
}

/// `path` with its extension swapped for `json`.
pub fn json_path(path: &Path) -> PathBuf {
    path.with_extension("json")
}

pub fn check_extension(path: &Path, ext: &str) -> Result<()> {
    ensure!(
        matches!(path.extension(), Some(p) if p == ext),
        "filename should end with `.{}`",
        ext
    );
    Ok(())
}
