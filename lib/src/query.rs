//! Predicates for selecting reports and symptoms.
//!
//! All matching is case-insensitive substring matching, with no other normalisation.
use crate::report::{Fields, ReportField};
use std::collections::BTreeSet;

/// A case-insensitive substring test.
///
/// The needle is lower-cased once, when the matcher is built. The empty needle matches
/// everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstringMatch {
    needle: String,
}

impl SubstringMatch {
    pub fn new(needle: &str) -> Self {
        SubstringMatch {
            needle: needle.to_lowercase(),
        }
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.needle.is_empty() || haystack.to_lowercase().contains(&self.needle)
    }
}

/// `true` when there's no filter, or when the filter matches `value`.
pub fn passes(filter: Option<&SubstringMatch>, value: &str) -> bool {
    filter.map_or(true, |filter| filter.is_match(value))
}

/// `true` if any value of any of `fields` matches.
pub fn any_field_matches<R>(record: &R, fields: &[ReportField], matcher: &SubstringMatch) -> bool
where
    R: Fields + ?Sized,
{
    fields
        .iter()
        .any(|field| record.values(*field).any(|value| matcher.is_match(value)))
}

/// `true` if the record's vaccine name passes `filter`.
///
/// A record with no vaccine name is only kept when there is no filter (or the filter is empty).
pub fn vaccine_matches<R>(record: &R, filter: Option<&SubstringMatch>) -> bool
where
    R: Fields + ?Sized,
{
    passes(filter, record.value(ReportField::VaxName))
}

/// Symptoms allowed through to the counts.
///
/// An empty list allows every symptom. Symptoms are compared exactly, so callers pass them
/// already lower-cased.
#[derive(Debug, Clone, Copy)]
pub struct AllowList<'a> {
    allowed: &'a BTreeSet<String>,
}

impl<'a> AllowList<'a> {
    pub fn new(allowed: &'a BTreeSet<String>) -> Self {
        AllowList { allowed }
    }

    pub fn allows(&self, symptom: &str) -> bool {
        self.allowed.is_empty() || self.allowed.contains(symptom)
    }
}
