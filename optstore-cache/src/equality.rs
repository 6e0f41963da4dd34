//! Update-skip decision
//!
//! Decides whether replacing `old` with `new` needs a write to the backing
//! store. The comparison is deliberately loose and deliberately asymmetric:
//! scalars compare by their database text form (`"1"`, `1`, `1.0` and `true`
//! are all the same row content), while `null` on either side only matches a
//! handful of legacy partners. Composites compare structurally and never match
//! a scalar.
//!
//! | old        | new                    | outcome |
//! |------------|------------------------|---------|
//! | `null`     | `null`                 | skip    |
//! | `null`     | `false`, `"false"`     | skip    |
//! | `null`     | anything else          | write   |
//! | `""`       | `null`                 | skip    |
//! | other      | `null`                 | write   |
//! | composite  | composite              | skip iff structurally equal |
//! | composite  | scalar (either order)  | write   |
//! | scalar     | scalar                 | skip iff database text is identical |

use crate::value::OptionValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of comparing an old and a new value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateDecision {
    /// Values are loosely equal; no store call is needed
    Skip,
    /// The store must be updated
    Write,
}

impl UpdateDecision {
    pub fn is_skip(self) -> bool {
        self == UpdateDecision::Skip
    }

    fn from_equal(equal: bool) -> Self {
        if equal {
            UpdateDecision::Skip
        } else {
            UpdateDecision::Write
        }
    }
}

impl fmt::Display for UpdateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateDecision::Skip => write!(f, "skip"),
            UpdateDecision::Write => write!(f, "write"),
        }
    }
}

/// Coarse type of a value for the pairwise table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Null,
    Scalar,
    Composite,
}

fn kind(value: &OptionValue) -> Kind {
    match value {
        OptionValue::Null => Kind::Null,
        OptionValue::List(_) | OptionValue::Map(_) => Kind::Composite,
        OptionValue::Bool(_)
        | OptionValue::Int(_)
        | OptionValue::Float(_)
        | OptionValue::String(_) => Kind::Scalar,
    }
}

/// Decide whether updating `old` to `new` can be skipped
pub fn evaluate(old: &OptionValue, new: &OptionValue) -> UpdateDecision {
    match (kind(old), kind(new)) {
        (Kind::Null, Kind::Null) => UpdateDecision::Skip,
        (Kind::Null, _) => {
            let legacy_match = matches!(new, OptionValue::Bool(false)) || new.as_str() == Some("false");
            UpdateDecision::from_equal(legacy_match)
        }
        (_, Kind::Null) => UpdateDecision::from_equal(old.as_str() == Some("")),
        (Kind::Composite, Kind::Composite) => UpdateDecision::from_equal(old == new),
        (Kind::Composite, Kind::Scalar) | (Kind::Scalar, Kind::Composite) => UpdateDecision::Write,
        (Kind::Scalar, Kind::Scalar) => UpdateDecision::from_equal(old.db_string() == new.db_string()),
    }
}

/// Convenience predicate: true when [`evaluate`] says skip
pub fn values_loosely_equal(old: &OptionValue, new: &OptionValue) -> bool {
    evaluate(old, new).is_skip()
}

/// Whether two values would leave the same text in a database column.
///
/// Unlike [`evaluate`], `false`, null and `""` all count as `"0"` here, and a
/// composite equals the JSON text it is persisted as.
pub fn is_equal_database_value(old: &OptionValue, new: &OptionValue) -> bool {
    match (database_text(old), database_text(new)) {
        (Some(old), Some(new)) => old == new,
        _ => false,
    }
}

fn database_text(value: &OptionValue) -> Option<String> {
    match value.db_string() {
        Some(text) if text.is_empty() => Some("0".to_string()),
        Some(text) => Some(text),
        None => value.to_json().ok(),
    }
}
