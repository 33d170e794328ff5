//! Counts, percentages and rankings over reports.
//!
//! Everything here takes an iterator of records and is read-only over them. Rankings are by
//! descending count, with ties kept in the order the values were first seen.
//!
//! Symptom percentages are per report, not per symptom occurrence: a report with 3 symptoms
//! counts once towards the report total of its vaccine, but towards 3 symptom counts. Symptom
//! percentages within a vaccine therefore don't sum to 100%.
use crate::{
    query::{self, AllowList, SubstringMatch},
    range::{RangeSet, RangeSetCountsWithMissing},
    report::{Fields, ReportField},
    util, ArcStr, ReportId,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    hash::Hash,
};
use term_data_table as tdt;

/// Fatal errors from the statistics functions.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StatsError {
    /// Percentages can't be computed because nothing was counted.
    #[error("no values of {what} to compute percentages over")]
    EmptyTotal { what: String },
}

/// Counts of each distinct key, in the order keys were first seen.
#[derive(Debug)]
struct Tally<K> {
    idx: HashMap<K, usize>,
    counts: Vec<(K, usize)>,
    total: usize,
}

impl<K: Hash + Eq + Clone> Tally<K> {
    fn new() -> Self {
        Tally {
            idx: HashMap::new(),
            counts: vec![],
            total: 0,
        }
    }

    fn add(&mut self, key: K) {
        self.total += 1;
        match self.idx.get(&key) {
            Some(&idx) => self.counts[idx].1 += 1,
            None => {
                self.idx.insert(key.clone(), self.counts.len());
                self.counts.push((key, 1));
            }
        }
    }

    /// Descending by count. The sort is stable, so ties stay in first-seen order.
    fn ranked(self) -> Vec<(K, usize)> {
        let mut counts = self.counts;
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }
}

/// One row of a ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCount {
    pub value: ArcStr,
    pub count: usize,
    pub percent: f64,
}

/// Values ranked by how often they occur, with the total they were counted out of.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub rows: Vec<RankedCount>,
    pub total: usize,
}

impl Ranking {
    fn from_tally(tally: Tally<&str>) -> Self {
        let total = tally.total;
        let rows = tally
            .ranked()
            .into_iter()
            .map(|(value, count)| RankedCount {
                value: value.into(),
                count,
                percent: util::percent(count, total),
            })
            .collect();
        Ranking { rows, total }
    }

    /// Sum of the percentages of all rows. 100 unless something went wrong.
    pub fn percent_sum(&self) -> f64 {
        self.rows.iter().map(|row| row.percent).sum()
    }

    pub fn term_table(&self) -> tdt::Table<'static> {
        count_table(
            "Value",
            self.rows
                .iter()
                .map(|row| (row.value.to_string(), row.count, Some(row.percent))),
        )
    }
}

/// Count the values of `field`.
///
/// With `filter`, only values containing it (ignoring case) are counted, and the total is the
/// number of values counted. Values are grouped exactly as they are, with no case folding. A
/// record with no value for the field counts under `""`.
///
/// Fails if nothing was counted.
pub fn count_by<'a, R>(
    records: impl IntoIterator<Item = &'a R>,
    field: ReportField,
    filter: Option<&str>,
) -> Result<Ranking, StatsError>
where
    R: Fields + 'a,
{
    let filter = filter.map(SubstringMatch::new);
    let mut tally = Tally::new();
    for record in records {
        for value in record.values(field) {
            if query::passes(filter.as_ref(), value) {
                tally.add(value);
            }
        }
    }
    if tally.total == 0 {
        return Err(StatsError::EmptyTotal {
            what: field.to_string(),
        });
    }
    Ok(Ranking::from_tally(tally))
}

/// The filter [`count_by`] is run with when none is given: COVID-19 vaccines for `VAX_NAME`,
/// nothing for other fields.
pub fn default_count_filter(field: ReportField) -> Option<&'static str> {
    match field {
        ReportField::VaxName => Some("COVID"),
        _ => None,
    }
}

/// Settings for [`vaccine_symptom_profile`].
///
/// Each call gets its own settings; nothing is shared between calls.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileOptions {
    /// Only include reports whose vaccine name contains this (ignoring case).
    pub vaccine_filter: Option<String>,
    /// Symptoms with fewer reports than this go in the below-threshold count.
    pub min_count: usize,
    /// Symptoms reported for less than this percentage of a vaccine's reports go in the
    /// below-threshold count.
    pub min_percent: f64,
    /// If not empty, only count these symptoms. Lower case.
    pub allowed_symptoms: BTreeSet<String>,
    /// Count the key symptom as the value symptom. Keys are lower case.
    ///
    /// Applied after `allowed_symptoms`, so it can't bring back a symptom that isn't allowed.
    pub dedupe: BTreeMap<String, String>,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        ProfileOptions {
            vaccine_filter: None,
            min_count: 25,
            min_percent: 1.0,
            allowed_symptoms: BTreeSet::new(),
            dedupe: BTreeMap::new(),
        }
    }
}

impl ProfileOptions {
    /// Settings for looking at COVID-19 vaccine reports: no percentage threshold, and positive
    /// SARS-CoV-2 tests and COVID-19 pneumonia counted as `covid-19`.
    pub fn covid19() -> Self {
        ProfileOptions {
            min_percent: 0.,
            dedupe: BTreeMap::from([
                ("sars-cov-2 test positive".into(), "covid-19".into()),
                ("covid-19 pneumonia".into(), "covid-19".into()),
            ]),
            ..Self::default()
        }
    }

    /// Whether a symptom count is shown on its own line.
    pub fn shows(&self, count: usize, percent: f64) -> bool {
        count >= self.min_count && percent >= self.min_percent
    }
}

/// The symptoms reported for each vaccine.
#[derive(Debug, Clone, PartialEq)]
pub struct SymptomProfile {
    pub options: ProfileOptions,
    /// Descending by number of reports.
    pub vaccines: Vec<VaccineProfile>,
}

/// The symptoms reported for one vaccine.
#[derive(Debug, Clone, PartialEq)]
pub struct VaccineProfile {
    /// `""` for reports with no vaccine data.
    pub vaccine: ArcStr,
    /// Number of reports for this vaccine.
    pub events: usize,
    /// Symptoms over both thresholds, descending by count. Percentages are of `events`.
    pub shown: Vec<RankedCount>,
    /// Total count of all the symptoms that didn't make a threshold.
    pub other: usize,
}

impl VaccineProfile {
    /// The below-threshold count, if there is one.
    pub fn below_threshold(&self) -> Option<usize> {
        if self.other > 0 {
            Some(self.other)
        } else {
            None
        }
    }

    pub fn term_table(&self, options: &ProfileOptions) -> tdt::Table<'static> {
        let mut table = count_table(
            "Symptom",
            self.shown
                .iter()
                .map(|row| (row.value.to_string(), row.count, Some(row.percent))),
        );
        if let Some(other) = self.below_threshold() {
            table.add_row(count_row(
                format!(
                    "Below threshold (min count: {}, min percent: {:.1}%)",
                    options.min_count, options.min_percent
                ),
                other,
                None,
            ));
        }
        table
    }
}

struct VaccineTally<'a> {
    vaccine: &'a str,
    events: usize,
    symptoms: Tally<String>,
}

/// Count symptoms per vaccine.
///
/// For each report (that passes the vaccine filter) the report count of its vaccine goes up by
/// one. Each of its symptoms is lower-cased, dropped if not in the allow list, renamed if in the
/// dedupe map, and counted against the vaccine. Then each symptom is either shown, if it makes
/// both the count and percentage thresholds, or added to the below-threshold count.
pub fn vaccine_symptom_profile<'a, R>(
    records: impl IntoIterator<Item = &'a R>,
    options: &ProfileOptions,
) -> SymptomProfile
where
    R: Fields + 'a,
{
    let vaccine_filter = options.vaccine_filter.as_deref().map(SubstringMatch::new);
    let allowed = AllowList::new(&options.allowed_symptoms);

    let mut idx: HashMap<&str, usize> = HashMap::new();
    let mut tallies: Vec<VaccineTally> = vec![];
    for record in records {
        if !query::vaccine_matches(record, vaccine_filter.as_ref()) {
            continue;
        }
        let vaccine = record.value(ReportField::VaxName);
        let tally_idx = *idx.entry(vaccine).or_insert_with(|| {
            tallies.push(VaccineTally {
                vaccine,
                events: 0,
                symptoms: Tally::new(),
            });
            tallies.len() - 1
        });
        let tally = &mut tallies[tally_idx];
        tally.events += 1;

        for symptom in record.values(ReportField::Symptoms) {
            let symptom = symptom.to_lowercase();
            if !allowed.allows(&symptom) {
                continue;
            }
            let symptom = match options.dedupe.get(&symptom) {
                Some(canonical) => canonical.clone(),
                None => symptom,
            };
            tally.symptoms.add(symptom);
        }
    }
    tallies.sort_by(|a, b| b.events.cmp(&a.events));

    let vaccines = tallies
        .into_iter()
        .map(|tally| {
            let events = tally.events;
            let mut shown = vec![];
            let mut other = 0;
            for (symptom, count) in tally.symptoms.ranked() {
                let percent = util::percent(count, events);
                if options.shows(count, percent) {
                    shown.push(RankedCount {
                        value: symptom.into(),
                        count,
                        percent,
                    });
                } else {
                    other += count;
                }
            }
            VaccineProfile {
                vaccine: tally.vaccine.into(),
                events,
                shown,
                other,
            }
        })
        .collect();

    SymptomProfile {
        options: options.clone(),
        vaccines,
    }
}

/// Exact symptom strings that matched a search, with how often each occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSearch {
    /// Descending by count.
    pub rows: Vec<(ArcStr, usize)>,
    /// Number of matching symptom occurrences.
    pub total: usize,
}

impl TextSearch {
    pub fn term_table(&self) -> tdt::Table<'static> {
        count_table(
            "Symptom",
            self.rows
                .iter()
                .map(|(symptom, count)| (symptom.to_string(), *count, None)),
        )
    }
}

/// Find symptoms containing `text` (ignoring case).
///
/// Symptoms are counted as stored, so differently-cased spellings are counted separately.
pub fn symptom_text_search<'a, R>(
    records: impl IntoIterator<Item = &'a R>,
    text: &str,
    vaccine_filter: Option<&str>,
) -> TextSearch
where
    R: Fields + 'a,
{
    let text = SubstringMatch::new(text);
    let vaccine_filter = vaccine_filter.map(SubstringMatch::new);
    let mut tally = Tally::new();
    for record in records {
        if !query::vaccine_matches(record, vaccine_filter.as_ref()) {
            continue;
        }
        for symptom in record.values(ReportField::Symptoms) {
            if text.is_match(symptom) {
                tally.add(symptom);
            }
        }
    }
    let total = tally.total;
    TextSearch {
        rows: tally
            .ranked()
            .into_iter()
            .map(|(symptom, count)| (symptom.into(), count))
            .collect(),
        total,
    }
}

/// IDs of records where any of `fields` contains `text` (ignoring case).
///
/// Each ID is returned once, in the order the records were seen.
pub fn find_ids_by_substring<'a, R>(
    records: impl IntoIterator<Item = &'a R>,
    fields: &[ReportField],
    text: &str,
) -> Vec<ReportId>
where
    R: Fields + 'a,
{
    let text = SubstringMatch::new(text);
    let mut seen = BTreeSet::new();
    let mut ids = vec![];
    for record in records {
        if query::any_field_matches(record, fields, &text) && seen.insert(record.id()) {
            ids.push(ReportId::from(record.id()));
        }
    }
    ids
}

/// Records whose field matched a search.
#[derive(Debug, Clone, PartialEq)]
pub struct GrepResult {
    /// (ID, matching value), in the order seen.
    pub matches: Vec<(ReportId, ArcStr)>,
    pub total: usize,
}

impl GrepResult {
    pub fn term_table(&self, field: ReportField) -> tdt::Table<'static> {
        let mut table = tdt::Table::new().with_row(
            tdt::Row::new()
                .with_cell(tdt::Cell::from("VAERS_ID"))
                .with_cell(tdt::Cell::from(field.to_string())),
        );
        for (id, value) in self.matches.iter() {
            table.add_row(
                tdt::Row::new()
                    .with_cell(tdt::Cell::from(id.to_string()))
                    .with_cell(tdt::Cell::from(value.to_string())),
            );
        }
        table
    }
}

/// Every value of `field` containing `text` (ignoring case), with the record it came from.
pub fn grep_field<'a, R>(
    records: impl IntoIterator<Item = &'a R>,
    field: ReportField,
    text: &str,
) -> GrepResult
where
    R: Fields + 'a,
{
    let text = SubstringMatch::new(text);
    let mut matches = vec![];
    for record in records {
        for value in record.values(field) {
            if text.is_match(value) {
                matches.push((ReportId::from(record.id()), ArcStr::from(value)));
            }
        }
    }
    GrepResult {
        total: matches.len(),
        matches,
    }
}

/// Number of reports received on each date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSeries {
    /// In date order.
    pub counts: Vec<(NaiveDate, usize)>,
    /// Reports with a missing or unreadable date.
    pub undated: usize,
}

impl DateSeries {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum::<usize>() + self.undated
    }

    pub fn term_table(&self) -> tdt::Table<'static> {
        let mut table = count_table(
            "Received",
            self.counts
                .iter()
                .map(|(date, count)| (date.to_string(), *count, None)),
        );
        if self.undated > 0 {
            table.add_row(count_row("undated".into(), self.undated, None));
        }
        table
    }
}

/// Count reports by received date.
pub fn reports_by_date<'a, R>(records: impl IntoIterator<Item = &'a R>) -> DateSeries
where
    R: Fields + 'a,
{
    let mut counts = BTreeMap::new();
    let mut undated = 0;
    for record in records {
        match util::parse_vaers_date(record.value(ReportField::ReceivedDate)) {
            Some(date) => *counts.entry(date).or_insert(0) += 1,
            None => undated += 1,
        }
    }
    DateSeries {
        counts: counts.into_iter().collect(),
        undated,
    }
}

/// Bucket reports by age. Missing or unreadable ages are counted as missing.
pub fn age_bands<'a, R>(
    records: impl IntoIterator<Item = &'a R>,
    bands: &RangeSet<f32>,
) -> RangeSetCountsWithMissing<f32>
where
    R: Fields + 'a,
{
    bands.clone().bucket_values_with_missing(
        records
            .into_iter()
            .map(|record| util::parse_age(record.value(ReportField::Age).trim())),
    )
}

// Rendering helpers.

fn count_row(label: String, count: usize, percent: Option<f64>) -> tdt::Row<'static> {
    let row = tdt::Row::new()
        .with_cell(tdt::Cell::from(label))
        .with_cell(tdt::Cell::from(count.to_string()));
    match percent {
        Some(percent) => row.with_cell(tdt::Cell::from(format!("{:.2}%", percent))),
        None => row,
    }
}

fn count_table(
    label: &'static str,
    rows: impl Iterator<Item = (String, usize, Option<f64>)>,
) -> tdt::Table<'static> {
    let mut rows = rows.peekable();
    let with_percent = matches!(rows.peek(), Some((_, _, Some(_))));
    let mut head = tdt::Row::new()
        .with_cell(tdt::Cell::from(label))
        .with_cell(tdt::Cell::from("Count"));
    if with_percent {
        head = head.with_cell(tdt::Cell::from("Percentage"));
    }
    let mut table = tdt::Table::new().with_row(head);
    for (label, count, percent) in rows {
        table.add_row(count_row(label, count, percent));
    }
    table
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{range::Range, report::UnifiedReport};

    fn report(id: &str, vax_name: &str, symptoms: &[&str]) -> UnifiedReport {
        let mut report = UnifiedReport::new(id.into());
        report.vax_name = vax_name.into();
        report.symptoms = symptoms.iter().map(|s| ArcStr::from(*s)).collect();
        report
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn count_by_vaccine() {
        let reports = vec![report("1", "A", &[]), report("2", "A", &[]), report("3", "B", &[])];
        let ranking = count_by(&reports, ReportField::VaxName, None).unwrap();
        assert_eq!(ranking.total, 3);
        assert_eq!(ranking.rows.len(), 2);
        assert_eq!(&*ranking.rows[0].value, "A");
        assert_eq!(ranking.rows[0].count, 2);
        assert!(close(ranking.rows[0].percent, 66.67));
        assert_eq!(&*ranking.rows[1].value, "B");
        assert_eq!(ranking.rows[1].count, 1);
        assert!(close(ranking.rows[1].percent, 33.33));
        assert!(close(ranking.percent_sum(), 100.));
    }

    #[test]
    fn count_by_ties_keep_first_seen_order() {
        let reports = vec![
            report("1", "C", &[]),
            report("2", "B", &[]),
            report("3", "A", &[]),
            report("4", "A", &[]),
            report("5", "B", &[]),
        ];
        let ranking = count_by(&reports, ReportField::VaxName, None).unwrap();
        let order: Vec<&str> = ranking.rows.iter().map(|r| &*r.value).collect();
        assert_eq!(order, ["B", "A", "C"]);
    }

    #[test]
    fn count_by_filter() {
        let reports = vec![
            report("1", "COVID19 (MODERNA)", &[]),
            report("2", "covid19 (pfizer)", &[]),
            report("3", "INFLUENZA", &[]),
            report("4", "", &[]),
        ];
        let ranking = count_by(&reports, ReportField::VaxName, Some("Covid")).unwrap();
        // excluded rows are not in the total
        assert_eq!(ranking.total, 2);
        // no case folding of the grouping key
        assert_eq!(ranking.rows.len(), 2);
        assert!(close(ranking.rows[0].percent, 50.));
        // unknown vaccines group under ""
        let ranking = count_by(&reports, ReportField::VaxName, None).unwrap();
        assert!(ranking.rows.iter().any(|r| r.value.is_empty() && r.count == 1));
    }

    #[test]
    fn count_by_empty_total() {
        let reports = vec![report("1", "INFLUENZA", &[])];
        assert_eq!(
            count_by(&reports, ReportField::VaxName, Some("covid")),
            Err(StatsError::EmptyTotal {
                what: "VAX_NAME".into()
            })
        );
        let none: Vec<UnifiedReport> = vec![];
        assert!(count_by(&none, ReportField::VaxName, None).is_err());
    }

    #[test]
    fn count_by_default_filter() {
        let mut reports = vec![
            report("1", "COVID19 (PFIZER-BIONTECH)", &[]),
            report("2", "VARICELLA (VARIVAX)", &[]),
        ];
        reports[0].sex = "F".into();
        reports[1].sex = "M".into();
        let ranking = count_by(
            &reports,
            ReportField::VaxName,
            default_count_filter(ReportField::VaxName),
        )
        .unwrap();
        assert_eq!(ranking.total, 1);
        // no vaccine name filter on other fields
        let ranking = count_by(
            &reports,
            ReportField::Sex,
            default_count_filter(ReportField::Sex),
        )
        .unwrap();
        assert_eq!(ranking.total, 2);
    }

    #[test]
    fn profile_thresholds() {
        // 100 reports, one symptom on 10 of them, another on 30
        let reports: Vec<UnifiedReport> = (0..100)
            .map(|n| {
                let mut symptoms = vec![];
                if n < 10 {
                    symptoms.push("Rash");
                }
                if n < 30 {
                    symptoms.push("Headache");
                }
                report(&n.to_string(), "COVID19", &symptoms)
            })
            .collect();
        let profile = vaccine_symptom_profile(&reports, &ProfileOptions::default());
        assert_eq!(profile.vaccines.len(), 1);
        let covid = &profile.vaccines[0];
        assert_eq!(covid.events, 100);
        assert_eq!(covid.shown.len(), 1);
        assert_eq!(&*covid.shown[0].value, "headache");
        assert_eq!(covid.shown[0].count, 30);
        assert!(close(covid.shown[0].percent, 30.));
        assert_eq!(covid.below_threshold(), Some(10));
    }

    #[test]
    fn profile_percent_threshold() {
        // 30 reports is only 1% of 3000
        let reports: Vec<UnifiedReport> = (0..3000)
            .map(|n| {
                let symptoms = if n < 30 { vec!["Rash"] } else { vec![] };
                report(&n.to_string(), "A", &symptoms)
            })
            .collect();
        let options = ProfileOptions {
            min_percent: 2.,
            ..ProfileOptions::default()
        };
        let profile = vaccine_symptom_profile(&reports, &options);
        assert!(profile.vaccines[0].shown.is_empty());
        assert_eq!(profile.vaccines[0].below_threshold(), Some(30));
        let profile = vaccine_symptom_profile(&reports, &ProfileOptions::default());
        assert_eq!(profile.vaccines[0].shown.len(), 1);
        assert_eq!(profile.vaccines[0].below_threshold(), None);
    }

    #[test]
    fn profile_counts_may_exceed_events() {
        let reports = vec![
            report("1", "A", &["Chills", "Fatigue", "Headache"]),
            report("2", "A", &["Chills", "Fatigue"]),
        ];
        let options = ProfileOptions {
            min_count: 2,
            ..ProfileOptions::default()
        };
        let profile = vaccine_symptom_profile(&reports, &options);
        let a = &profile.vaccines[0];
        assert_eq!(a.events, 2);
        let shown: usize = a.shown.iter().map(|r| r.count).sum();
        // multi-symptom reports are counted once per symptom, this is allowed
        assert_eq!(shown + a.other, 5);
        assert!(shown + a.other >= a.events);
        assert!(close(a.shown[0].percent, 100.));
    }

    #[test]
    fn profile_groups_ordered_by_events() {
        let reports = vec![
            report("1", "B", &[]),
            report("2", "A", &[]),
            report("3", "A", &[]),
            report("4", "", &["Pain"]),
        ];
        let profile = vaccine_symptom_profile(&reports, &ProfileOptions::default());
        let order: Vec<(&str, usize)> = profile
            .vaccines
            .iter()
            .map(|v| (&*v.vaccine, v.events))
            .collect();
        assert_eq!(order, [("A", 2), ("B", 1), ("", 1)]);
    }

    #[test]
    fn profile_vaccine_filter() {
        let reports = vec![
            report("1", "COVID19 (MODERNA)", &["Pain"]),
            report("2", "INFLUENZA", &["Pain"]),
        ];
        let options = ProfileOptions {
            vaccine_filter: Some("moderna".into()),
            min_count: 1,
            ..ProfileOptions::default()
        };
        let profile = vaccine_symptom_profile(&reports, &options);
        assert_eq!(profile.vaccines.len(), 1);
        assert_eq!(&*profile.vaccines[0].vaccine, "COVID19 (MODERNA)");
    }

    #[test]
    fn dedupe_after_allow_list() {
        let reports = vec![
            report("1", "A", &["SARS-CoV-2 test positive"]),
            report("2", "A", &["COVID-19"]),
            report("3", "A", &["COVID-19 pneumonia"]),
        ];
        let mut options = ProfileOptions::covid19();
        options.min_count = 1;
        let profile = vaccine_symptom_profile(&reports, &options);
        let a = &profile.vaccines[0];
        assert_eq!(a.shown.len(), 1);
        assert_eq!(&*a.shown[0].value, "covid-19");
        assert_eq!(a.shown[0].count, 3);

        // "covid-19 pneumonia" isn't allowed, so the dedupe map can't bring it back
        options.allowed_symptoms = BTreeSet::from(["covid-19".to_string()]);
        let profile = vaccine_symptom_profile(&reports, &options);
        let a = &profile.vaccines[0];
        assert_eq!(a.shown.len(), 1);
        assert_eq!(a.shown[0].count, 1);
        assert_eq!(a.other, 0);
    }

    #[test]
    fn text_search() {
        let reports = vec![
            report("1", "A", &["Ischaemic stroke", "Headache"]),
            report("2", "B", &["Ischaemic stroke"]),
            report("3", "A", &["Product administered to patient of inappropriate age"]),
            report("4", "A", &["ISCHAEMIC STROKE"]),
        ];
        let search = symptom_text_search(&reports, "stroke", None);
        assert_eq!(search.total, 3);
        assert_eq!(
            search.rows,
            vec![
                (ArcStr::from("Ischaemic stroke"), 2),
                (ArcStr::from("ISCHAEMIC STROKE"), 1)
            ]
        );
        let search = symptom_text_search(&reports, "STROKE", Some("b"));
        assert_eq!(search.total, 1);
        let search = symptom_text_search(&reports, "inappropriate age", None);
        assert_eq!(search.rows.len(), 1);
    }

    #[test]
    fn find_ids() {
        let mut with_narrative = report("3", "A", &[]);
        with_narrative.narrative = "Patient had a stroke".into();
        let reports = vec![
            report("1", "A", &["Ischaemic stroke", "Haemorrhagic stroke"]),
            report("2", "B", &["Headache"]),
            with_narrative,
        ];
        let ids = find_ids_by_substring(
            &reports,
            &[ReportField::Symptoms, ReportField::Narrative],
            "STROKE",
        );
        assert_eq!(ids, vec![ReportId::from("1"), ReportId::from("3")]);
        // multiple matching fields still give one ID
        let ids = find_ids_by_substring(
            &reports[..1],
            &[ReportField::Symptoms, ReportField::Symptoms],
            "stroke",
        );
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn grep() {
        let reports = vec![
            report("1", "COVID19 (MODERNA)", &[]),
            report("2", "INFLUENZA", &[]),
            report("3", "COVID19 (JANSSEN)", &[]),
        ];
        let result = grep_field(&reports, ReportField::VaxName, "covid");
        assert_eq!(result.total, 2);
        assert_eq!(result.matches[1].0, ReportId::from("3"));
        assert_eq!(&*result.matches[1].1, "COVID19 (JANSSEN)");
    }

    #[test]
    fn dates() {
        let mut reports = vec![report("1", "A", &[]), report("2", "A", &[]), report("3", "A", &[])];
        reports[0].received = "01/02/2021".into();
        reports[1].received = "12/30/2020".into();
        reports[2].received = "".into();
        let series = reports_by_date(&reports);
        assert_eq!(
            series.counts,
            vec![
                (NaiveDate::from_ymd_opt(2020, 12, 30).unwrap(), 1),
                (NaiveDate::from_ymd_opt(2021, 1, 2).unwrap(), 1)
            ]
        );
        assert_eq!(series.undated, 1);
        assert_eq!(series.total(), 3);
    }

    #[test]
    fn ages() {
        let mut reports = vec![report("1", "A", &[]), report("2", "A", &[]), report("3", "A", &[])];
        reports[0].age_yrs = "17.5".into();
        reports[1].age_yrs = "40".into();
        let bands = RangeSet::new(vec![
            Range::new(0., Some(18.)).unwrap(),
            Range::new(18., None).unwrap(),
        ]);
        let counts = age_bands(&reports, &bands);
        let counts: Vec<usize> = counts.iter().map(|(_, count)| count).collect();
        assert_eq!(counts, [1, 1, 1]);
    }

    #[test]
    fn runs_over_a_single_store() {
        use crate::record::{test::row, Store, SymptomRow};
        let symptoms = Store::<SymptomRow>::load([
            row(&[("VAERS_ID", "1"), ("SYMPTOM1", "Thrombotic stroke")]),
            row(&[("VAERS_ID", "2"), ("SYMPTOM2", "Nausea")]),
        ])
        .unwrap();
        let ids = find_ids_by_substring(&symptoms, &[ReportField::Symptoms], "stroke");
        assert_eq!(ids, vec![ReportId::from("1")]);
        // the symptom table has no vaccine data, so everything groups under ""
        let ranking = count_by(&symptoms, ReportField::VaxName, None).unwrap();
        assert_eq!(ranking.rows.len(), 1);
        assert_eq!(ranking.rows[0].count, 2);
    }
}
