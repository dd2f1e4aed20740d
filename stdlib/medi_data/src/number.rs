//! Numbers that keep how they were written.
//!
//! Range bounds and form inputs print back the way they were entered: `1`
//! stays `1`, `75.0` stays `75.0`. Floats use the shortest decimal that reads
//! back to the same value, switching to exponent form below `1e-4` and from
//! `1e16` up.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn value(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }

    /// Integer when the text has no fraction or exponent and fits an `i64`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            return Some(Number::Int(n));
        }
        s.parse::<f64>().ok().map(Number::Float)
    }

    pub fn to_json(self) -> serde_json::Value {
        match self {
            Number::Int(n) => serde_json::Value::from(n),
            Number::Float(x) => serde_json::Number::from_f64(x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }

    /// Integers stay integers; any other JSON number becomes a float.
    pub fn from_json(v: &serde_json::Value) -> Option<Self> {
        match v.as_i64() {
            Some(n) => Some(Number::Int(n)),
            None => v.as_f64().map(Number::Float),
        }
    }
}

impl From<f64> for Number {
    fn from(x: f64) -> Self {
        Number::Float(x)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::Int(n)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Float(x) => f.write_str(&format_float(x)),
        }
    }
}

/// Shortest round-trip form of `x` that always reads as a float.
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".into();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf".into() } else { "-inf".into() };
    }
    let magnitude = x.abs();
    if x == 0.0 || (1e-4..1e16).contains(&magnitude) {
        let s = x.to_string();
        return if s.contains('.') { s } else { format!("{s}.0") };
    }
    // `{:e}` prints `7e-6`; the exponent is written signed with two digits
    let s = format!("{x:e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => match exp.parse::<i32>() {
            Ok(e) => format!(
                "{mantissa}e{}{:02}",
                if e < 0 { '-' } else { '+' },
                e.abs()
            ),
            Err(_) => s,
        },
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn whole_floats_keep_their_point() {
        assert_eq!(Number::Float(0.0).to_string(), "0.0");
        assert_eq!(Number::Float(75.0).to_string(), "75.0");
        assert_eq!(Number::Float(2501.0).to_string(), "2501.0");
        assert_eq!(Number::Int(200).to_string(), "200");
    }

    #[test]
    fn fractions_use_the_shortest_form() {
        assert_eq!(format_float(6.2), "6.2");
        assert_eq!(format_float(0.066), "0.066");
        assert_eq!(format_float(0.00026), "0.00026");
        assert_eq!(format_float(-7.96498), "-7.96498");
    }

    #[test]
    fn tiny_and_huge_values_use_exponents() {
        assert_eq!(format_float(0.000007), "7e-06");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.5e-7), "1.5e-07");
    }

    #[test]
    fn parse_keeps_the_written_kind() {
        assert_eq!(Number::parse("250"), Some(Number::Int(250)));
        assert_eq!(Number::parse(" 250.0 "), Some(Number::Float(250.0)));
        assert_eq!(Number::parse("1e3"), Some(Number::Float(1000.0)));
        assert_eq!(Number::parse("abc"), None);
    }

    #[test]
    fn json_numbers_keep_their_kind() {
        let v: Vec<Number> = serde_json::from_str("[4, 75.0, -1]").unwrap();
        assert_eq!(v, vec![Number::Int(4), Number::Float(75.0), Number::Int(-1)]);
        assert_eq!(serde_json::to_string(&Number::Float(75.0)).unwrap(), "75.0");
        assert_eq!(Number::from_json(&serde_json::json!(2.5)), Some(Number::Float(2.5)));
    }
}
