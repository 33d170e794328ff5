//! The joined, one-row-per-report view of the data.
use crate::{util, ArcStr, ReportId};
use chrono::NaiveDate;
use qu::ick_use::*;
use std::{collections::BTreeMap, fmt, ops::Deref, slice, str::FromStr};

/// A field of a report that can be grouped on or searched.
///
/// Parsed from, and displayed as, the column name used in the VAERS extracts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportField {
    Narrative,
    Age,
    Died,
    ReceivedDate,
    Sex,
    State,
    /// All the symptoms of a report, one value each.
    Symptoms,
    SymptomVersion,
    VaxType,
    VaxManu,
    VaxLot,
    VaxDoseSeries,
    VaxRoute,
    VaxSite,
    VaxName,
}

impl ReportField {
    pub const ALL: [ReportField; 15] = [
        ReportField::Narrative,
        ReportField::Age,
        ReportField::Died,
        ReportField::ReceivedDate,
        ReportField::Sex,
        ReportField::State,
        ReportField::Symptoms,
        ReportField::SymptomVersion,
        ReportField::VaxType,
        ReportField::VaxManu,
        ReportField::VaxLot,
        ReportField::VaxDoseSeries,
        ReportField::VaxRoute,
        ReportField::VaxSite,
        ReportField::VaxName,
    ];

    pub fn column(self) -> &'static str {
        use ReportField::*;
        match self {
            Narrative => "SYMPTOM_TEXT",
            Age => "AGE_YRS",
            Died => "DIED",
            ReceivedDate => "RECVDATE",
            Sex => "SEX",
            State => "STATE",
            Symptoms => "SYMPTOMS",
            SymptomVersion => "SYMPTOMVERSION",
            VaxType => "VAX_TYPE",
            VaxManu => "VAX_MANU",
            VaxLot => "VAX_LOT",
            VaxDoseSeries => "VAX_DOSE_SERIES",
            VaxRoute => "VAX_ROUTE",
            VaxSite => "VAX_SITE",
            VaxName => "VAX_NAME",
        }
    }

    /// Whether a report can have more than one value for this field.
    pub fn is_multi_valued(self) -> bool {
        matches!(self, ReportField::Symptoms)
    }
}

impl FromStr for ReportField {
    type Err = Error;
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        ReportField::ALL
            .into_iter()
            .find(|field| field.column().eq_ignore_ascii_case(input))
            .ok_or_else(|| format_err!("unrecognised report field \"{}\"", input))
    }
}

impl fmt::Display for ReportField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Iterator over the values of one field of a record.
///
/// Single-valued fields always yield exactly one value, which is `""` when the record has no
/// data for it. [`ReportField::Symptoms`] yields one value per symptom.
#[derive(Debug, Clone)]
pub enum FieldValues<'a> {
    One(Option<&'a str>),
    List(slice::Iter<'a, ArcStr>),
    Slots(slice::Iter<'a, Option<ArcStr>>),
}

impl<'a> FieldValues<'a> {
    pub fn one(value: Option<&'a ArcStr>) -> Self {
        FieldValues::One(Some(value.map(|v| &**v).unwrap_or("")))
    }

    pub fn list(values: &'a [ArcStr]) -> Self {
        FieldValues::List(values.iter())
    }

    /// Only the non-blank slots are yielded.
    pub fn slots(values: &'a [Option<ArcStr>]) -> Self {
        FieldValues::Slots(values.iter())
    }

    /// The values of a field the record doesn't carry.
    pub fn missing(field: ReportField) -> Self {
        if field.is_multi_valued() {
            FieldValues::One(None)
        } else {
            FieldValues::One(Some(""))
        }
    }
}

impl<'a> Iterator for FieldValues<'a> {
    type Item = &'a str;
    fn next(&mut self) -> Option<&'a str> {
        match self {
            FieldValues::One(value) => value.take(),
            FieldValues::List(iter) => iter.next().map(|v| &**v),
            FieldValues::Slots(iter) => iter
                .flatten()
                .map(|v| &**v)
                .find(|v| !v.trim().is_empty()),
        }
    }
}

/// Something with an ID and fields that can be grouped and searched on.
///
/// Implemented by [`UnifiedReport`] and by each source record, so statistics can be run over the
/// joined data or over a single source table.
pub trait Fields {
    fn id(&self) -> &str;

    fn values(&self, field: ReportField) -> FieldValues<'_>;

    /// The first value of a field, or `""`.
    fn value(&self, field: ReportField) -> &str {
        self.values(field).next().unwrap_or("")
    }
}

/// A report joined from the case, symptom and vaccine tables.
///
/// Fields with no source data are empty rather than missing.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedReport {
    pub id: ReportId,
    pub narrative: ArcStr,
    pub age_yrs: ArcStr,
    pub died: ArcStr,
    pub received: ArcStr,
    pub sex: ArcStr,
    pub state: ArcStr,
    /// Symptoms in the order they appear in the symptom table. Case is preserved.
    pub symptoms: Vec<ArcStr>,
    pub symptom_version: ArcStr,
    pub vax_type: ArcStr,
    pub vax_manu: ArcStr,
    pub vax_lot: ArcStr,
    pub vax_dose_series: ArcStr,
    pub vax_route: ArcStr,
    pub vax_site: ArcStr,
    pub vax_name: ArcStr,
}

impl UnifiedReport {
    /// A report with every field empty.
    pub fn new(id: ReportId) -> Self {
        let empty = ArcStr::from("");
        UnifiedReport {
            id,
            narrative: empty.clone(),
            age_yrs: empty.clone(),
            died: empty.clone(),
            received: empty.clone(),
            sex: empty.clone(),
            state: empty.clone(),
            symptoms: vec![],
            symptom_version: empty.clone(),
            vax_type: empty.clone(),
            vax_manu: empty.clone(),
            vax_lot: empty.clone(),
            vax_dose_series: empty.clone(),
            vax_route: empty.clone(),
            vax_site: empty.clone(),
            vax_name: empty,
        }
    }

    pub fn age_years(&self) -> Option<f32> {
        util::parse_age(self.age_yrs.trim())
    }

    pub fn died(&self) -> bool {
        util::is_yes(Some(self.died.trim()))
    }

    pub fn received_on(&self) -> Option<NaiveDate> {
        util::parse_vaers_date(&self.received)
    }
}

impl Fields for UnifiedReport {
    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self, field: ReportField) -> FieldValues<'_> {
        use ReportField::*;
        let value = match field {
            Symptoms => return FieldValues::list(&self.symptoms),
            Narrative => &self.narrative,
            Age => &self.age_yrs,
            Died => &self.died,
            ReceivedDate => &self.received,
            Sex => &self.sex,
            State => &self.state,
            SymptomVersion => &self.symptom_version,
            VaxType => &self.vax_type,
            VaxManu => &self.vax_manu,
            VaxLot => &self.vax_lot,
            VaxDoseSeries => &self.vax_dose_series,
            VaxRoute => &self.vax_route,
            VaxSite => &self.vax_site,
            VaxName => &self.vax_name,
        };
        FieldValues::one(Some(value))
    }
}

/// All unified reports, with a pre-built index for the `id` field.
///
/// Built once by [`crate::join`]; read-only afterwards. Iteration order is the order reports
/// were first seen while joining.
#[derive(Debug, Clone, Default)]
pub struct Reports {
    els: Vec<UnifiedReport>,
    id_idx: BTreeMap<ReportId, usize>,
}

impl Reports {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Reports {
            els: Vec::with_capacity(capacity),
            id_idx: BTreeMap::new(),
        }
    }

    /// Get the report for `id`, creating an empty one if this is the first time we've seen it.
    pub(crate) fn get_or_insert(&mut self, id: &ReportId) -> &mut UnifiedReport {
        let idx = match self.id_idx.get(id) {
            Some(&idx) => idx,
            None => {
                let idx = self.els.len();
                self.els.push(UnifiedReport::new(id.clone()));
                self.id_idx.insert(id.clone(), idx);
                idx
            }
        };
        &mut self.els[idx]
    }

    pub fn find_by_id(&self, id: &str) -> Option<&UnifiedReport> {
        let idx = self.id_idx.get(id)?;
        self.els.get(*idx)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.id_idx.contains_key(id)
    }

    /// All report IDs, in lexical order.
    pub fn ids(&self) -> impl Iterator<Item = &ReportId> + '_ {
        self.id_idx.keys()
    }

    pub fn iter(&self) -> slice::Iter<'_, UnifiedReport> {
        self.els.iter()
    }

    /// The reports with the given IDs, in the order given.
    ///
    /// IDs with no report are skipped with a warning.
    pub fn select<I>(&self, ids: I) -> Vec<&UnifiedReport>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        ids.into_iter()
            .filter_map(|id| {
                let id = id.as_ref();
                let report = self.find_by_id(id);
                if report.is_none() {
                    event!(Level::WARN, "no report with ID {}", id);
                }
                report
            })
            .collect()
    }
}

impl Deref for Reports {
    type Target = [UnifiedReport];
    fn deref(&self) -> &Self::Target {
        &self.els
    }
}

impl<'a> IntoIterator for &'a Reports {
    type IntoIter = slice::Iter<'a, UnifiedReport>;
    type Item = &'a UnifiedReport;
    fn into_iter(self) -> Self::IntoIter {
        self.els.iter()
    }
}
