//! The three VAERS source tables, each indexed by report ID.
//!
//! Rows arrive as plain field maps (see [`crate::load_rows`]). Each table gets a typed record so
//! the rest of the crate never looks fields up by name. A field that is missing from a row is
//! kept as `None` here, and an empty value as `Some("")`; the joiner collapses both to the empty
//! string.
use crate::{
    report::{FieldValues, Fields, ReportField},
    util, ArcStr, ReportId,
};
use chrono::NaiveDate;
use qu::ick_use::*;
use std::{collections::BTreeMap, fmt, ops::Deref, slice};

/// A row from one of the source files, field name to value.
pub type Row = BTreeMap<String, String>;

/// The field every source table is keyed on.
pub const ID_FIELD: &str = "VAERS_ID";

/// Number of symptom slots in a row of the symptoms table.
pub const SYMPTOM_SLOTS: usize = 5;

/// Fatal errors while indexing a source table.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LoadError {
    /// The row can't be indexed without its key.
    #[error("row {row} has no \"{field}\" field")]
    MissingKeyField { field: &'static str, row: usize },
}

/// Which of the three source tables a record came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    Case,
    Symptom,
    Vaccine,
}

impl Source {
    /// The file name of this table in the public extract, without the year prefix.
    pub fn file_stem(self) -> &'static str {
        match self {
            Source::Case => "VAERSDATA",
            Source::Symptom => "VAERSSYMPTOMS",
            Source::Vaccine => "VAERSVAX",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Source::Case => f.write_str("case"),
            Source::Symptom => f.write_str("symptom"),
            Source::Vaccine => f.write_str("vaccine"),
        }
    }
}

/// A record type that can be built from a source row.
pub trait SourceRecord: Sized {
    const SOURCE: Source;

    /// Build the record. Only the key is required, everything else is optional.
    fn from_row(id: ReportId, row: &Row) -> Self;

    fn report_id(&self) -> &ReportId;
}

fn field(row: &Row, name: &str) -> Option<ArcStr> {
    row.get(name).map(|v| ArcStr::from(v.as_str()))
}

/// A row in the case (`VAERSDATA`) table.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub id: ReportId,
    /// Free-text description of the event (`SYMPTOM_TEXT`).
    pub narrative: Option<ArcStr>,
    pub age_yrs: Option<ArcStr>,
    /// `Y` if the patient died, otherwise empty.
    pub died: Option<ArcStr>,
    /// Date the report was received, `mm/dd/yyyy`.
    pub received: Option<ArcStr>,
    pub sex: Option<ArcStr>,
    pub state: Option<ArcStr>,
}

impl Case {
    pub fn age_years(&self) -> Option<f32> {
        util::parse_age(util::non_empty(self.age_yrs.as_ref())?)
    }

    pub fn died(&self) -> bool {
        util::is_yes(util::non_empty(self.died.as_ref()))
    }

    pub fn received_on(&self) -> Option<NaiveDate> {
        util::parse_vaers_date(util::non_empty(self.received.as_ref())?)
    }
}

impl SourceRecord for Case {
    const SOURCE: Source = Source::Case;

    fn from_row(id: ReportId, row: &Row) -> Self {
        Case {
            id,
            narrative: field(row, "SYMPTOM_TEXT"),
            age_yrs: field(row, "AGE_YRS"),
            died: field(row, "DIED"),
            received: field(row, "RECVDATE"),
            sex: field(row, "SEX"),
            state: field(row, "STATE"),
        }
    }

    fn report_id(&self) -> &ReportId {
        &self.id
    }
}

impl Fields for Case {
    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self, field: ReportField) -> FieldValues<'_> {
        use ReportField::*;
        match field {
            Narrative => FieldValues::one(self.narrative.as_ref()),
            Age => FieldValues::one(self.age_yrs.as_ref()),
            Died => FieldValues::one(self.died.as_ref()),
            ReceivedDate => FieldValues::one(self.received.as_ref()),
            Sex => FieldValues::one(self.sex.as_ref()),
            State => FieldValues::one(self.state.as_ref()),
            other => FieldValues::missing(other),
        }
    }
}

/// A row in the symptoms (`VAERSSYMPTOMS`) table.
///
/// Each row has 5 slots for MedDRA symptom terms, any of which may be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct SymptomRow {
    pub id: ReportId,
    pub symptoms: [Option<ArcStr>; SYMPTOM_SLOTS],
    pub versions: [Option<ArcStr>; SYMPTOM_SLOTS],
}

impl SymptomRow {
    /// The filled-in symptom slots, in slot order.
    pub fn symptom_names(&self) -> impl Iterator<Item = &ArcStr> + '_ {
        self.symptoms
            .iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
    }

    /// The coding version for this row, taken from the first filled-in version slot.
    pub fn version(&self) -> Option<&ArcStr> {
        self.versions
            .iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
    }
}

impl SourceRecord for SymptomRow {
    const SOURCE: Source = Source::Symptom;

    fn from_row(id: ReportId, row: &Row) -> Self {
        let slot = |prefix: &str, n: usize| field(row, &format!("{}{}", prefix, n + 1));
        SymptomRow {
            id,
            symptoms: [0, 1, 2, 3, 4].map(|n| slot("SYMPTOM", n)),
            versions: [0, 1, 2, 3, 4].map(|n| slot("SYMPTOMVERSION", n)),
        }
    }

    fn report_id(&self) -> &ReportId {
        &self.id
    }
}

impl Fields for SymptomRow {
    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self, field: ReportField) -> FieldValues<'_> {
        match field {
            ReportField::Symptoms => FieldValues::slots(&self.symptoms),
            ReportField::SymptomVersion => FieldValues::one(self.version()),
            other => FieldValues::missing(other),
        }
    }
}

/// A row in the vaccines (`VAERSVAX`) table.
#[derive(Debug, Clone, PartialEq)]
pub struct VaccineExposure {
    pub id: ReportId,
    pub vax_type: Option<ArcStr>,
    pub vax_manu: Option<ArcStr>,
    pub vax_lot: Option<ArcStr>,
    pub vax_dose_series: Option<ArcStr>,
    pub vax_route: Option<ArcStr>,
    pub vax_site: Option<ArcStr>,
    pub vax_name: Option<ArcStr>,
}

impl SourceRecord for VaccineExposure {
    const SOURCE: Source = Source::Vaccine;

    fn from_row(id: ReportId, row: &Row) -> Self {
        VaccineExposure {
            id,
            vax_type: field(row, "VAX_TYPE"),
            vax_manu: field(row, "VAX_MANU"),
            vax_lot: field(row, "VAX_LOT"),
            vax_dose_series: field(row, "VAX_DOSE_SERIES"),
            vax_route: field(row, "VAX_ROUTE"),
            vax_site: field(row, "VAX_SITE"),
            vax_name: field(row, "VAX_NAME"),
        }
    }

    fn report_id(&self) -> &ReportId {
        &self.id
    }
}

impl Fields for VaccineExposure {
    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self, field: ReportField) -> FieldValues<'_> {
        use ReportField::*;
        match field {
            VaxType => FieldValues::one(self.vax_type.as_ref()),
            VaxManu => FieldValues::one(self.vax_manu.as_ref()),
            VaxLot => FieldValues::one(self.vax_lot.as_ref()),
            VaxDoseSeries => FieldValues::one(self.vax_dose_series.as_ref()),
            VaxRoute => FieldValues::one(self.vax_route.as_ref()),
            VaxSite => FieldValues::one(self.vax_site.as_ref()),
            VaxName => FieldValues::one(self.vax_name.as_ref()),
            other => FieldValues::missing(other),
        }
    }
}

/// The parsed rows of one source table, with a pre-built index for the ID field.
///
/// Duplicate IDs are not an error: a later row replaces the earlier one in place (last write
/// wins), keeping the position of the first. The number of replaced rows is available from
/// [`Store::overwritten`].
#[derive(Debug, Clone)]
pub struct Store<T> {
    els: Vec<T>,
    id_idx: BTreeMap<ReportId, usize>,
    overwritten: usize,
}

impl<T: SourceRecord> Store<T> {
    /// Index rows on [`ID_FIELD`].
    pub fn load(rows: impl IntoIterator<Item = Row>) -> Result<Self, LoadError> {
        Self::load_keyed(rows, ID_FIELD)
    }

    /// Index rows on `key_field`.
    ///
    /// Fails on the first row without the key field. Row numbers in the error count from 1 and
    /// don't include the header.
    pub fn load_keyed(
        rows: impl IntoIterator<Item = Row>,
        key_field: &'static str,
    ) -> Result<Self, LoadError> {
        let mut this = Self::new();
        for (idx, row) in rows.into_iter().enumerate() {
            let id: ReportId = match row.get(key_field) {
                Some(id) => id.as_str().into(),
                None => {
                    return Err(LoadError::MissingKeyField {
                        field: key_field,
                        row: idx + 1,
                    })
                }
            };
            this.insert(T::from_row(id, &row));
        }
        if this.overwritten > 0 {
            event!(
                Level::DEBUG,
                "{} rows in the {} data replaced an earlier row with the same id",
                this.overwritten,
                T::SOURCE
            );
        }
        Ok(this)
    }

    fn new() -> Self {
        Store {
            els: vec![],
            id_idx: BTreeMap::new(),
            overwritten: 0,
        }
    }

    fn insert(&mut self, record: T) {
        match self.id_idx.get(record.report_id()) {
            Some(&idx) => {
                event!(
                    Level::DEBUG,
                    "overwriting {} data for id {}",
                    T::SOURCE,
                    record.report_id()
                );
                self.els[idx] = record;
                self.overwritten += 1;
            }
            None => {
                self.id_idx.insert(record.report_id().clone(), self.els.len());
                self.els.push(record);
            }
        }
    }

    pub fn find_by_id(&self, id: &str) -> Option<&T> {
        let idx = self.id_idx.get(id)?;
        self.els.get(*idx)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.id_idx.contains_key(id)
    }

    /// How many rows replaced an earlier row with the same ID.
    pub fn overwritten(&self) -> usize {
        self.overwritten
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.els.iter()
    }
}

impl<T> Deref for Store<T> {
    type Target = [T];
    fn deref(&self) -> &Self::Target {
        &self.els
    }
}

impl<'a, T> IntoIterator for &'a Store<T> {
    type IntoIter = slice::Iter<'a, T>;
    type Item = &'a T;
    fn into_iter(self) -> Self::IntoIter {
        self.els.iter()
    }
}

impl<T: SourceRecord> FromIterator<T> for Store<T> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut this = Self::new();
        for record in iter {
            this.insert(record);
        }
        this
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Build a row from field/value pairs.
    pub(crate) fn row(fields: &[(&str, &str)]) -> Row {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn case_fields() {
        let store = Store::<Case>::load([row(&[
            ("VAERS_ID", "916600"),
            ("AGE_YRS", "33.0"),
            ("DIED", "Y"),
            ("RECVDATE", "01/01/2021"),
            ("SYMPTOM_TEXT", ""),
        ])])
        .unwrap();
        let case = store.find_by_id("916600").unwrap();
        assert_eq!(case.age_years(), Some(33.));
        assert!(case.died());
        assert_eq!(
            case.received_on(),
            Some(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
        );
        // empty is kept distinct from absent at load time
        assert_eq!(case.narrative.as_deref(), Some(""));
        assert_eq!(case.sex, None);
    }

    #[test]
    fn last_write_wins() {
        let store = Store::<VaccineExposure>::load([
            row(&[("VAERS_ID", "1"), ("VAX_NAME", "FIRST")]),
            row(&[("VAERS_ID", "2"), ("VAX_NAME", "OTHER")]),
            row(&[("VAERS_ID", "1"), ("VAX_NAME", "SECOND")]),
        ])
        .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.overwritten(), 1);
        assert_eq!(
            store.find_by_id("1").unwrap().vax_name.as_deref(),
            Some("SECOND")
        );
        // the replaced row keeps its original position
        assert_eq!(&*store[0].id, "1");
        assert_eq!(&*store[1].id, "2");
    }

    #[test]
    fn missing_key_field() {
        let err = Store::<Case>::load([
            row(&[("VAERS_ID", "1")]),
            row(&[("AGE_YRS", "40")]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            LoadError::MissingKeyField {
                field: ID_FIELD,
                row: 2
            }
        );
    }

    #[test]
    fn custom_key_field() {
        let store =
            Store::<Case>::load_keyed([row(&[("REPORT", "a"), ("AGE_YRS", "4")])], "REPORT")
                .unwrap();
        assert!(store.contains_id("a"));
        assert!(!store.contains_id("b"));
    }

    #[test]
    fn symptom_slots() {
        let store = Store::<SymptomRow>::load([row(&[
            ("VAERS_ID", "7"),
            ("SYMPTOM1", "Headache"),
            ("SYMPTOMVERSION1", ""),
            ("SYMPTOM2", ""),
            ("SYMPTOM3", "Pyrexia"),
            ("SYMPTOMVERSION3", "23.1"),
        ])])
        .unwrap();
        let symptoms = store.find_by_id("7").unwrap();
        let names: Vec<&str> = symptoms.symptom_names().map(|s| &**s).collect();
        assert_eq!(names, ["Headache", "Pyrexia"]);
        assert_eq!(symptoms.version().map(|v| &**v), Some("23.1"));
        let values: Vec<&str> = symptoms.values(ReportField::Symptoms).collect();
        assert_eq!(values, ["Headache", "Pyrexia"]);
        assert_eq!(symptoms.value(ReportField::VaxName), "");
    }
}
