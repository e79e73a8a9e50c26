//! Raw cell values as read from tabular files.
//!
//! Every reader converts its cells into [`Cell`] immediately after parsing,
//! so the inference and ingestion layers operate on one closed variant set
//! instead of per-format runtime checks. Workbook readers produce typed
//! cells; CSV readers produce only [`Cell::Text`] and [`Cell::Missing`],
//! and the lexical type of the text is discovered during inference.

use std::fmt;

use chrono::NaiveDateTime;

/// Canonical render/parse format for datetime values.
///
/// `%.f` prints nothing when the sub-second part is zero, so whole-second
/// values round-trip without a trailing fraction.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A single raw tabular value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Whole number.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Date/time without timezone.
    DateTime(NaiveDateTime),
    /// Free text.
    Text(String),
    /// Blank cell / empty string.
    Missing,
}

impl Cell {
    /// Returns true for blank cells.
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Canonical text rendering of the value, `None` for missing cells.
    ///
    /// This is the form used when a column widens to text, and it matches
    /// the CSV export rendering so that widened columns stay textually
    /// uniform across segments.
    pub fn render_text(&self) -> Option<String> {
        match self {
            Cell::Int(v) => Some(v.to_string()),
            Cell::Float(v) => Some(render_float(*v)),
            Cell::Bool(v) => Some(v.to_string()),
            Cell::DateTime(v) => Some(v.format(DATETIME_FORMAT).to_string()),
            Cell::Text(s) => Some(s.clone()),
            Cell::Missing => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render_text() {
            Some(s) => write!(f, "{s}"),
            None => Ok(()),
        }
    }
}

/// Format a float so that integral values keep a decimal marker.
///
/// `3.0` renders as `"3.0"`, not `"3"`; a re-ingested export must infer the
/// column as Float again.
pub(crate) fn render_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn render_text_keeps_float_marker() {
        assert_eq!(Cell::Float(3.0).render_text().unwrap(), "3.0");
        assert_eq!(Cell::Float(20.5).render_text().unwrap(), "20.5");
    }

    #[test]
    fn render_text_datetime_omits_zero_fraction() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(
            Cell::DateTime(dt).render_text().unwrap(),
            "2024-03-01 09:30:00"
        );
    }

    #[test]
    fn missing_renders_as_none() {
        assert_eq!(Cell::Missing.render_text(), None);
        assert!(Cell::Missing.is_missing());
    }
}
