//! Scope resolution
//!
//! Callers identify a scope loosely: `null`, `false`, `0`, `"0"` and `""` all
//! mean "the current scope", any other integer or all-digit string names a
//! scope explicitly, and everything else is rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical numeric scope identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub i64);

impl ScopeId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ScopeId {
    fn from(id: i64) -> Self {
        ScopeId(id)
    }
}

/// Scope identifier as supplied by a caller, before validation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScopeParam {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl ScopeParam {
    /// Parse a command-line argument: `true`/`false` become booleans, every
    /// other token is kept as a string and judged by [`resolve`].
    pub fn from_arg(arg: &str) -> Self {
        match arg {
            "true" => ScopeParam::Bool(true),
            "false" => ScopeParam::Bool(false),
            other => ScopeParam::Str(other.to_string()),
        }
    }

    pub fn resolve(&self) -> Option<ScopeKey> {
        resolve(self)
    }
}

impl From<bool> for ScopeParam {
    fn from(b: bool) -> Self {
        ScopeParam::Bool(b)
    }
}

impl From<i64> for ScopeParam {
    fn from(n: i64) -> Self {
        ScopeParam::Int(n)
    }
}

impl From<i32> for ScopeParam {
    fn from(n: i32) -> Self {
        ScopeParam::Int(n.into())
    }
}

impl From<u32> for ScopeParam {
    fn from(n: u32) -> Self {
        ScopeParam::Int(n.into())
    }
}

impl From<ScopeId> for ScopeParam {
    fn from(id: ScopeId) -> Self {
        ScopeParam::Int(id.0)
    }
}

impl From<&str> for ScopeParam {
    fn from(s: &str) -> Self {
        ScopeParam::Str(s.to_string())
    }
}

impl From<String> for ScopeParam {
    fn from(s: String) -> Self {
        ScopeParam::Str(s)
    }
}

impl<T: Into<ScopeParam>> From<Option<T>> for ScopeParam {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(ScopeParam::Null)
    }
}

/// Result of a successful resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    Current,
    Id(ScopeId),
}

impl ScopeKey {
    /// Map to a concrete id so explicit and implicit references to the
    /// current scope share one cache partition.
    pub fn canonical(self, current: ScopeId) -> ScopeId {
        match self {
            ScopeKey::Current => current,
            ScopeKey::Id(id) => id,
        }
    }
}

/// Validate a caller-supplied scope. `None` means the scope is invalid.
pub fn resolve(param: &ScopeParam) -> Option<ScopeKey> {
    match param {
        ScopeParam::Null | ScopeParam::Bool(false) | ScopeParam::Int(0) => Some(ScopeKey::Current),
        ScopeParam::Bool(true) => None,
        ScopeParam::Int(n) => Some(ScopeKey::Id(ScopeId(*n))),
        ScopeParam::Str(s) if s.is_empty() => Some(ScopeKey::Current),
        ScopeParam::Str(s) => {
            if !s.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            // All digits, so the only parse failure left is overflow
            match s.parse::<i64>().ok()? {
                0 => Some(ScopeKey::Current),
                n => Some(ScopeKey::Id(ScopeId(n))),
            }
        }
    }
}
