//! Joining the case, symptom and vaccine tables into one report per ID.
//!
//! The algorithm is:
//!
//! 1. Seed a report for every case, copying the case fields.
//! 2. For every symptom row, find or create the report and append the filled-in symptom slots
//!    in slot order. The coding version is recorded once, and overwritten if seen again.
//! 3. For every vaccine row, find or create the report and copy all vaccine fields over
//!    whatever was there.
//!
//! Every ID in any table ends up in exactly one report. IDs in the symptom or vaccine tables
//! that have no case are not an error: the report is created with empty case fields and a
//! [`Diagnostic`] is sent to the caller's sink, once per ID, naming the first table it was seen
//! in.
//!
//! The vaccine table can list several vaccines for one report, but the store keeps only the
//! last row per ID and step 3 overwrites, so a report ends up with the final exposure's fields.
//! The same goes for symptoms: a report with more than 5 symptoms is split over several rows of
//! the symptom table, and only the symptoms from the last of those rows survive. Nothing is
//! merged.
use crate::{
    record::{Case, Source, Store, SymptomRow, VaccineExposure},
    report::{Reports, UnifiedReport},
    ArcStr, ReportId,
};
use qu::ick_use::*;
use std::{collections::BTreeSet, fmt};

/// Something unusual in the data that doesn't stop the join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An ID with no row in the case table, first seen in `source`.
    MissingCase { id: ReportId, source: Source },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Diagnostic::MissingCase { id, source } => write!(
                f,
                "id {} from the {} data not present in case data",
                id, source
            ),
        }
    }
}

/// Receives diagnostics as the joiner finds them.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Collects diagnostics for later inspection.
impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic)
    }
}

/// Logs each diagnostic as a warning and keeps count.
#[derive(Debug, Default)]
pub struct LogDiagnostics {
    count: usize,
}

impl LogDiagnostics {
    pub fn count(&self) -> usize {
        self.count
    }
}

impl DiagnosticSink for LogDiagnostics {
    fn emit(&mut self, diagnostic: Diagnostic) {
        event!(Level::WARN, "{}", diagnostic);
        self.count += 1;
    }
}

/// Join the three tables. See the module documentation for the rules.
pub fn join(
    cases: &Store<Case>,
    symptoms: &Store<SymptomRow>,
    vaccines: &Store<VaccineExposure>,
    sink: &mut impl DiagnosticSink,
) -> Reports {
    let mut reports = Reports::with_capacity(cases.len());
    let mut diagnosed = BTreeSet::new();
    let mut check_case = |id: &ReportId, source: Source| {
        if !cases.contains_id(id) && diagnosed.insert(id.clone()) {
            sink.emit(Diagnostic::MissingCase {
                id: id.clone(),
                source,
            });
        }
    };

    for case in cases {
        copy_case(reports.get_or_insert(&case.id), case);
    }

    for row in symptoms {
        check_case(&row.id, Source::Symptom);
        let report = reports.get_or_insert(&row.id);
        report.symptoms.extend(row.symptom_names().cloned());
        if let Some(version) = row.version() {
            report.symptom_version = version.clone();
        }
    }

    for vaccine in vaccines {
        check_case(&vaccine.id, Source::Vaccine);
        copy_vaccine(reports.get_or_insert(&vaccine.id), vaccine);
    }

    event!(
        Level::DEBUG,
        "joined {} cases, {} symptom rows and {} vaccine rows into {} reports",
        cases.len(),
        symptoms.len(),
        vaccines.len(),
        reports.len()
    );
    reports
}

fn or_empty(value: &Option<ArcStr>) -> ArcStr {
    value.clone().unwrap_or_else(|| ArcStr::from(""))
}

fn copy_case(report: &mut UnifiedReport, case: &Case) {
    report.narrative = or_empty(&case.narrative);
    report.age_yrs = or_empty(&case.age_yrs);
    report.died = or_empty(&case.died);
    report.received = or_empty(&case.received);
    report.sex = or_empty(&case.sex);
    report.state = or_empty(&case.state);
}

/// Overwrites every vaccine field, including with empty values.
fn copy_vaccine(report: &mut UnifiedReport, vaccine: &VaccineExposure) {
    report.vax_type = or_empty(&vaccine.vax_type);
    report.vax_manu = or_empty(&vaccine.vax_manu);
    report.vax_lot = or_empty(&vaccine.vax_lot);
    report.vax_dose_series = or_empty(&vaccine.vax_dose_series);
    report.vax_route = or_empty(&vaccine.vax_route);
    report.vax_site = or_empty(&vaccine.vax_site);
    report.vax_name = or_empty(&vaccine.vax_name);
}
