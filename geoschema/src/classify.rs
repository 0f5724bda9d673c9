//! Classification d'une valeur de propriété GeoJSON en type scalaire
//!
//! Ordre des essais pour une chaîne : entier, flottant, date ISO-8601, texte.
//! Par défaut les nombres sont lus par préfixe (comme `parseInt`/`parseFloat`) :
//! `"42abc"` est un entier, `"2020-01-01"` aussi.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::types::ScalarType;

/// Date ISO-8601 lisible par TIMESTAMPTZ : `YYYY-MM-DD[(T| )HH:MM[:SS[.f]][Z|±HH[:MM]]]`
static ISO8601: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<y>\d{4})-(?P<m>\d{2})-(?P<d>\d{2})(?:[T ](?P<hh>\d{2}):(?P<mi>\d{2})(?::(?P<ss>\d{2})(?:\.\d+)?)?(?:Z|[+-](?P<oh>\d{2})(?::?(?P<om>\d{2}))?)?)?$",
    )
    .expect("ISO-8601 pattern is valid")
});

/// 2^63 : premier flottant hors de i64
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Lecture des nombres dans les chaînes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericParsing {
    /// Le plus long préfixe numérique valide suffit (`"42abc"` → 42)
    #[default]
    LeadingPrefix,
    /// La chaîne entière (aux espaces près) doit être un nombre
    Strict,
}

impl NumericParsing {
    /// Texte de l'entier reconnu dans `s`, selon la politique
    pub fn integer_text(self, s: &str) -> Option<&str> {
        match self {
            NumericParsing::LeadingPrefix => leading_integer(s),
            NumericParsing::Strict => {
                let trimmed = s.trim();
                leading_integer(trimmed).filter(|p| p.len() == trimmed.len())
            }
        }
    }

    /// Texte du flottant reconnu dans `s`, selon la politique
    pub fn float_text(self, s: &str) -> Option<&str> {
        match self {
            NumericParsing::LeadingPrefix => leading_float(s),
            NumericParsing::Strict => {
                let trimmed = s.trim();
                leading_float(trimmed).filter(|p| p.len() == trimmed.len())
            }
        }
    }
}

impl FromStr for NumericParsing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "leading_prefix" | "prefix" => Ok(Self::LeadingPrefix),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "Unknown numeric parsing mode: {other}. Use: prefix, strict"
            )),
        }
    }
}

/// Classe une valeur de propriété
pub fn classify(value: &Value, numbers: NumericParsing) -> ScalarType {
    match value {
        Value::Null => ScalarType::Any,
        Value::Number(n) => classify_number(n),
        Value::String(s) => classify_str(s, numbers),
        // Pas de règle pour ces formes : repli silencieux sur TEXT
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => ScalarType::Text,
    }
}

/// Entier si la partie fractionnaire est nulle (`2.0` compris)
fn classify_number(n: &Number) -> ScalarType {
    if n.is_i64() || n.is_u64() {
        return ScalarType::Integer;
    }

    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 => ScalarType::Integer,
        _ => ScalarType::Float,
    }
}

/// Une valeur classée INTEGER tient-elle dans un BIGINT ?
///
/// Faux pour `u64` au-delà de `i64::MAX`, `1e20` ou `"99999999999999999999"`.
pub fn fits_i64(value: &Value, numbers: NumericParsing) -> bool {
    match value {
        Value::Number(n) if n.is_i64() => true,
        Value::Number(n) => n
            .as_f64()
            .is_some_and(|f| (-I64_BOUND..I64_BOUND).contains(&f)),
        Value::String(s) => numbers
            .integer_text(s)
            .map_or(true, |digits| digits.parse::<i64>().is_ok()),
        _ => true,
    }
}

/// Classe une chaîne : entier, flottant, date, sinon texte
pub fn classify_str(s: &str, numbers: NumericParsing) -> ScalarType {
    if numbers.integer_text(s).is_some() {
        ScalarType::Integer
    } else if numbers.float_text(s).is_some() {
        ScalarType::Float
    } else if is_iso8601(s) {
        ScalarType::Date
    } else {
        ScalarType::Text
    }
}

/// Préfixe entier de `s` (espaces de tête ignorés, signe optionnel, au moins un chiffre)
pub fn leading_integer(s: &str) -> Option<&str> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits = bytes[sign..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();

    (digits > 0).then(|| &s[..sign + digits])
}

/// Préfixe flottant de `s` : `"1.5e3m"` → `"1.5e3"`, `".5"`, `"-Infinity"`
pub fn leading_float(s: &str) -> Option<&str> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let rest = &s[sign..];

    if rest.starts_with("Infinity") {
        return Some(&s[..sign + "Infinity".len()]);
    }

    // fast_float accepte aussi "nan"/"inf" : on exige un chiffre en tête
    let starts_numeric = match rest.as_bytes() {
        [b'0'..=b'9', ..] => true,
        [b'.', b'0'..=b'9', ..] => true,
        _ => false,
    };
    if !starts_numeric {
        return None;
    }

    match fast_float::parse_partial::<f64, _>(rest) {
        Ok((_, consumed)) if consumed > 0 => Some(&s[..sign + consumed]),
        _ => None,
    }
}

/// Date/heure ISO-8601 stricte, avec contrôle calendaire
pub fn is_iso8601(s: &str) -> bool {
    iso8601_parts(s).is_some()
}

fn iso8601_parts(s: &str) -> Option<()> {
    let caps = ISO8601.captures(s)?;
    let num = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());

    // L'an 0 n'existe pas pour PostgreSQL
    let year = i32::try_from(num("y")?).ok().filter(|y| *y >= 1)?;
    NaiveDate::from_ymd_opt(year, num("m")?, num("d")?)?;

    if let (Some(hh), Some(mi)) = (num("hh"), num("mi")) {
        NaiveTime::from_hms_opt(hh, mi, num("ss").unwrap_or(0))?;
    }

    if num("oh").is_some_and(|h| h > 15) || num("om").is_some_and(|m| m > 59) {
        return None;
    }

    Some(())
}
