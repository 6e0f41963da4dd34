//! Option values

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A stored option value
///
/// Serialized as untagged JSON, so `1` and `1.0` survive a round trip as
/// `Int` and `Float` respectively.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<OptionValue>),
    Map(BTreeMap<String, OptionValue>),
}

impl OptionValue {
    pub fn is_null(&self) -> bool {
        matches!(self, OptionValue::Null)
    }

    /// Lists and maps
    pub fn is_composite(&self) -> bool {
        matches!(self, OptionValue::List(_) | OptionValue::Map(_))
    }

    pub fn is_scalar(&self) -> bool {
        !self.is_null() && !self.is_composite()
    }

    /// Text form a scalar takes when written to a database column.
    ///
    /// `true` is `"1"`, `false` and null are `""`, and integral floats drop
    /// their fraction (`1.0` is `"1"`). Composites have no text form.
    pub fn db_string(&self) -> Option<String> {
        match self {
            OptionValue::Null => Some(String::new()),
            OptionValue::Bool(true) => Some("1".to_string()),
            OptionValue::Bool(false) => Some(String::new()),
            OptionValue::Int(n) => Some(n.to_string()),
            OptionValue::Float(x) => Some(float_db_string(*x)),
            OptionValue::String(s) => Some(s.clone()),
            OptionValue::List(_) | OptionValue::Map(_) => None,
        }
    }

    /// False if a NaN or infinite float appears anywhere in the value.
    /// JSON has no encoding for those.
    pub fn is_finite(&self) -> bool {
        match self {
            OptionValue::Float(x) => x.is_finite(),
            OptionValue::List(items) => items.iter().all(OptionValue::is_finite),
            OptionValue::Map(entries) => entries.values().all(OptionValue::is_finite),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Parse JSON text into a value
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Significant digits a float keeps in its database text
const FLOAT_PRECISION: i32 = 14;

/// `%.14G`-style text: fixed notation for exponents in `-4..14`, otherwise
/// `1.0E+21` form. Trailing zeros are dropped.
fn float_db_string(x: f64) -> String {
    if x.is_nan() {
        return "NAN".to_string();
    }
    if x.is_infinite() {
        let text = if x > 0.0 { "INF" } else { "-INF" };
        return text.to_string();
    }

    // Rounding to the kept digits can carry into the exponent, so read it
    // back from the rounded form
    let sci = format!("{:.*e}", (FLOAT_PRECISION - 1) as usize, x);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return x.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return x.to_string();
    };

    if exponent < -4 || exponent >= FLOAT_PRECISION {
        let mut mantissa = trim_fraction(mantissa).to_string();
        if !mantissa.contains('.') {
            mantissa.push_str(".0");
        }
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}E{}{}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (FLOAT_PRECISION - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, x)).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.db_string() {
            Some(s) => f.write_str(&s),
            None => match serde_json::to_string(self) {
                Ok(json) => f.write_str(&json),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<i64> for OptionValue {
    fn from(n: i64) -> Self {
        OptionValue::Int(n)
    }
}

impl From<i32> for OptionValue {
    fn from(n: i32) -> Self {
        OptionValue::Int(n.into())
    }
}

impl From<f64> for OptionValue {
    fn from(x: f64) -> Self {
        OptionValue::Float(x)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::String(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::String(s)
    }
}

impl From<Vec<OptionValue>> for OptionValue {
    fn from(items: Vec<OptionValue>) -> Self {
        OptionValue::List(items)
    }
}

impl From<BTreeMap<String, OptionValue>> for OptionValue {
    fn from(map: BTreeMap<String, OptionValue>) -> Self {
        OptionValue::Map(map)
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for OptionValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        OptionValue::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
