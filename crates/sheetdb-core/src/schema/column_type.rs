//! Column types and the widening lattice.

use std::fmt;

use arrow::datatypes::{DataType, TimeUnit};
use serde::{Deserialize, Serialize};

/// Logical type of a table column.
///
/// Ordered by specificity: `Integer < Float < Text`. `Boolean` and
/// `DateTime` are detected by pattern rather than widening and sit outside
/// the numeric chain; combining them with anything else yields `Text`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnType {
    /// 64-bit signed whole numbers.
    Integer,
    /// 64-bit floating-point numbers.
    Float,
    /// Booleans (`true`/`false`/`yes`/`no` in text form).
    Boolean,
    /// Date/time values without timezone.
    DateTime,
    /// Free text; accepts any value.
    Text,
}

impl ColumnType {
    /// Least upper bound of two column types in the widening lattice.
    ///
    /// Deterministic and total: every pair has a least specific common
    /// type, with `Text` as the top element.
    pub fn widen(self, other: ColumnType) -> ColumnType {
        use ColumnType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Text,
        }
    }

    /// Whether a value of `other` is representable under `self` without
    /// changing the column type.
    pub fn accepts(self, other: ColumnType) -> bool {
        self.widen(other) == self
    }

    /// The Arrow data type backing this column type in storage.
    pub fn to_arrow(self) -> DataType {
        match self {
            ColumnType::Integer => DataType::Int64,
            ColumnType::Float => DataType::Float64,
            ColumnType::Boolean => DataType::Boolean,
            ColumnType::DateTime => DataType::Timestamp(TimeUnit::Microsecond, None),
            ColumnType::Text => DataType::Utf8,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::DateTime => write!(f, "datetime"),
            ColumnType::Text => write!(f, "text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ColumnType::*;

    #[test]
    fn widen_is_reflexive() {
        for t in [Integer, Float, Boolean, DateTime, Text] {
            assert_eq!(t.widen(t), t);
        }
    }

    #[test]
    fn widen_is_commutative() {
        for a in [Integer, Float, Boolean, DateTime, Text] {
            for b in [Integer, Float, Boolean, DateTime, Text] {
                assert_eq!(a.widen(b), b.widen(a));
            }
        }
    }

    #[test]
    fn numeric_chain_widens_to_float() {
        assert_eq!(Integer.widen(Float), Float);
    }

    #[test]
    fn incomparable_types_widen_to_text() {
        assert_eq!(Integer.widen(Boolean), Text);
        assert_eq!(Float.widen(DateTime), Text);
        assert_eq!(Boolean.widen(DateTime), Text);
        assert_eq!(DateTime.widen(Text), Text);
    }

    #[test]
    fn text_is_top() {
        for t in [Integer, Float, Boolean, DateTime, Text] {
            assert_eq!(t.widen(Text), Text);
            assert!(Text.accepts(t));
        }
    }

    #[test]
    fn accepts_matches_widening() {
        assert!(Float.accepts(Integer));
        assert!(!Integer.accepts(Float));
        assert!(!Boolean.accepts(Integer));
    }
}
