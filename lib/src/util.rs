use crate::ArcStr;
use chrono::NaiveDate;

// Helpers for fields with quirks.

/// Decode a latin1 (ISO-8859-1) byte string.
///
/// Every byte maps to the code point with the same value, so this can't fail. The public
/// VAERS extracts are published in this encoding.
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Trim a field and map the empty string to `None`.
pub fn non_empty(value: Option<&ArcStr>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Parse an age in years, e.g. `"33.0"`. Negative and non-finite ages are treated as missing.
pub fn parse_age(s: &str) -> Option<f32> {
    s.parse::<f32>()
        .ok()
        .filter(|age| age.is_finite() && *age >= 0.)
}

/// The flag columns (`DIED`, `L_THREAT`, ...) hold `Y` or nothing.
pub fn is_yes(s: Option<&str>) -> bool {
    matches!(s, Some(v) if v.eq_ignore_ascii_case("y"))
}

/// Parse a date in the format used by the VAERS extracts (mm/dd/yyyy).
pub fn parse_vaers_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%m/%d/%Y").ok()
}

/// `100 * count / total`. Callers check `total` first.
pub fn percent(count: usize, total: usize) -> f64 {
    100. * count as f64 / total as f64
}

// error printing helper.
//
pub trait ResultExt {
    fn print_error(self) -> Self;
}

impl<T> ResultExt for Result<T, anyhow::Error> {
    fn print_error(self) -> Self {
        match self {
            Ok(v) => Ok(v),
            Err(error) => {
                println!("error: {}", error);
                let mut err: &dyn std::error::Error = error.as_ref();
                while let Some(cause) = err.source() {
                    println!("caused by: {}", cause);
                    err = cause;
                }
                Err(error)
            }
        }
    }
}

pub fn header(header: &str) {
    let len = header.len();
    print!("\n{}\n", header);
    for _ in 0..len {
        print!("=");
    }
    println!("\n")
}
