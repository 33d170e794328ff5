//! Bucketing numeric values (ages) into ranges.
use itertools::{EitherOrBoth, Itertools};
use qu::ick_use::*;
use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt};
use term_data_table as tdt;

/// Range where lower bound is inclusive, upper bound is exclusive or unbounded.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range<T>(T, Option<T>);

impl<T> Range<T>
where
    T: PartialOrd + fmt::Display,
{
    pub fn new(from: T, to: Option<T>) -> Result<Self> {
        if let Some(ref to) = to {
            ensure!(
                from < *to,
                "ranges must go from low to high (got {} - {})",
                from,
                to
            );
        }
        Ok(Range(from, to))
    }
}

impl<T: PartialOrd> Range<T> {
    pub fn contains(&self, val: &T) -> bool {
        match &self.1 {
            Some(end) => val >= &self.0 && val < end,
            None => val >= &self.0,
        }
    }
}

impl<T> fmt::Display for Range<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(end) = &self.1 {
            write!(f, "{} - {}", self.0, end)
        } else {
            write!(f, "{}+", self.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSet<T> {
    ranges: Vec<Range<T>>,
}

impl<T> RangeSet<T> {
    pub fn new(ranges: Vec<Range<T>>) -> Self {
        Self { ranges }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Range<T>> + '_ {
        self.ranges.iter()
    }
}

impl RangeSet<f32> {
    /// The age bands reports are usually broken down by.
    pub fn age_bands() -> Self {
        let bounds = [0., 3., 18., 30., 50., 65., 80.];
        let ranges = bounds
            .iter()
            .enumerate()
            .map(|(idx, from)| Range(*from, bounds.get(idx + 1).copied()))
            .collect();
        RangeSet { ranges }
    }
}

impl<T> RangeSet<T>
where
    T: PartialOrd,
{
    /// Count the values in each range. A value in overlapping ranges is counted in each of them,
    /// and `None`s are counted separately as missing.
    pub fn bucket_values_with_missing<I, B>(self, values: I) -> RangeSetCountsWithMissing<T>
    where
        I: Iterator<Item = Option<B>>,
        B: Borrow<T>,
    {
        let mut buckets = vec![0usize; self.ranges.len() + 1];
        let last = self.ranges.len();
        for value in values {
            if let Some(value) = value {
                for (idx, bucket) in self.ranges.iter().enumerate() {
                    if bucket.contains(value.borrow()) {
                        buckets[idx] += 1;
                    }
                }
            } else {
                buckets[last] += 1;
            }
        }
        RangeSetCountsWithMissing {
            set: self,
            counts: buckets,
        }
    }
}

/// A range set with values bucketed, and bucket sizes recorded. The last count is for missing
/// values.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSetCountsWithMissing<T> {
    set: RangeSet<T>,
    counts: Vec<usize>,
}

impl<T> RangeSetCountsWithMissing<T> {
    pub fn iter(&self) -> impl Iterator<Item = (Option<&Range<T>>, usize)> {
        self.set
            .iter()
            .zip_longest(self.counts.iter().copied())
            .filter_map(|el| match el {
                // can't happen: there is always one more count than range
                EitherOrBoth::Left(_) => None,
                EitherOrBoth::Right(count) => Some((None, count)),
                EitherOrBoth::Both(range, count) => Some((Some(range), count)),
            })
    }

    pub fn missing(&self) -> usize {
        self.counts.last().copied().unwrap_or(0)
    }
}

impl<T> RangeSetCountsWithMissing<T>
where
    T: fmt::Display,
{
    pub fn for_display(&self) -> impl Iterator<Item = (&dyn fmt::Display, usize)> {
        self.iter().map(|(range, count)| {
            let range = match range {
                Some(range) => range,
                None => &"missing data" as &dyn fmt::Display,
            };
            (range, count)
        })
    }

    pub fn term_table(&self) -> tdt::Table<'static> {
        let mut table = tdt::Table::new().with_row(
            tdt::Row::new()
                .with_cell(tdt::Cell::from("Age"))
                .with_cell(tdt::Cell::from("Count")),
        );
        for (range, count) in self.for_display() {
            table.add_row(
                tdt::Row::new()
                    .with_cell(tdt::Cell::from(range.to_string()))
                    .with_cell(tdt::Cell::from(count.to_string())),
            );
        }
        table
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn range_bounds() {
        let range = Range::new(18., Some(30.)).unwrap();
        assert!(range.contains(&18.));
        assert!(range.contains(&29.9));
        assert!(!range.contains(&30.));
        assert!(Range::new(80., None).unwrap().contains(&120.));
        assert!(Range::new(30., Some(18.)).is_err());
        assert!(Range::new(3, Some(3)).is_err());
        assert_eq!(range.to_string(), "18 - 30");
        assert_eq!(Range::new(80, None).unwrap().to_string(), "80+");
    }

    #[test]
    fn default_age_bands() {
        let bands = RangeSet::age_bands();
        assert_eq!(bands.iter().count(), 7);
        let counts = bands.bucket_values_with_missing(
            [Some(0.5f32), Some(2.99), Some(17.), Some(85.), None].into_iter(),
        );
        let counts: Vec<usize> = counts.iter().map(|(_, count)| count).collect();
        assert_eq!(counts, [2, 1, 0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn display_missing() {
        let set = RangeSet::new(vec![Range::new(0, Some(10)).unwrap()]);
        let counts = set.bucket_values_with_missing([Some(5), None, None].into_iter());
        assert_eq!(counts.missing(), 2);
        let labels: Vec<String> = counts
            .for_display()
            .map(|(label, _)| label.to_string())
            .collect();
        assert_eq!(labels, ["0 - 10", "missing data"]);
    }
}
