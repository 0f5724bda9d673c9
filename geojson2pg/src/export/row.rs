//! Projection d'une feature en ligne COPY (format texte, séparateur tabulation)

use std::borrow::Cow;

use bytes::{BufMut, BytesMut};
use geojson::Feature;
use geoschema::{NumericParsing, ScalarType};
use serde_json::Value;

/// Marqueur NULL du format texte de COPY
pub const COPY_NULL: &[u8] = b"\\N";

/// Projection d'une feature vers les cellules d'une ligne
pub trait RowProjection {
    /// Valeur de la colonne `column` (de type `ty`) pour `feature`, `None` pour NULL
    fn cell<'f>(&self, feature: &'f Feature, column: &str, ty: ScalarType) -> Option<Cow<'f, str>>;
}

/// Projection par défaut : la propriété de même nom, convertie vers le type de colonne
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyProjection {
    pub numbers: NumericParsing,
}

impl PropertyProjection {
    pub fn new(numbers: NumericParsing) -> Self {
        Self { numbers }
    }
}

impl RowProjection for PropertyProjection {
    fn cell<'f>(&self, feature: &'f Feature, column: &str, ty: ScalarType) -> Option<Cow<'f, str>> {
        let value = feature.properties.as_ref()?.get(column)?;
        render_value(value, ty, self.numbers)
    }
}

/// Rend une valeur JSON pour une colonne du type donné.
///
/// Les chaînes sont relues avec les mêmes règles que la classification :
/// une colonne INTEGER reçoit `42` pour `"42abc"`. Une chaîne sans nombre
/// lisible dans une colonne numérique devient NULL.
pub fn render_value(value: &Value, ty: ScalarType, numbers: NumericParsing) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => match ty {
            ScalarType::Integer => numbers.integer_text(s).map(Cow::Borrowed),
            ScalarType::Float => numbers.float_text(s).map(Cow::Borrowed),
            ScalarType::Date | ScalarType::Text | ScalarType::Any => Some(Cow::Borrowed(s)),
        },
        Value::Number(n) => match (ty, n.as_f64()) {
            (ScalarType::Integer, Some(f)) if !(n.is_i64() || n.is_u64()) => {
                Some(Cow::Owned(format!("{:.0}", f)))
            }
            _ => Some(Cow::Owned(n.to_string())),
        },
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        Value::Array(_) | Value::Object(_) => Some(Cow::Owned(value.to_string())),
    }
}

/// Ajoute une valeur échappée pour le format texte de COPY
pub fn push_copy_text(buf: &mut BytesMut, value: &str) {
    for b in value.bytes() {
        match b {
            b'\\' => buf.put_slice(b"\\\\"),
            b'\t' => buf.put_slice(b"\\t"),
            b'\n' => buf.put_slice(b"\\n"),
            b'\r' => buf.put_slice(b"\\r"),
            _ => buf.put_u8(b),
        }
    }
}

/// Ajoute une cellule (valeur ou NULL)
pub fn push_copy_cell(buf: &mut BytesMut, value: Option<&str>) {
    match value {
        Some(v) => push_copy_text(buf, v),
        None => buf.put_slice(COPY_NULL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PREFIX: NumericParsing = NumericParsing::LeadingPrefix;

    fn render(value: Value, ty: ScalarType) -> Option<String> {
        render_value(&value, ty, PREFIX).map(Cow::into_owned)
    }

    #[test]
    fn test_render_strings_follow_column_type() {
        assert_eq!(render(json!("42abc"), ScalarType::Integer).as_deref(), Some("42"));
        assert_eq!(render(json!(" 7"), ScalarType::Integer).as_deref(), Some("7"));
        assert_eq!(render(json!("2020-01-01"), ScalarType::Integer).as_deref(), Some("2020"));
        assert_eq!(render(json!("3.5kg"), ScalarType::Float).as_deref(), Some("3.5"));
        assert_eq!(render(json!("abc"), ScalarType::Float), None);
        assert_eq!(render(json!("hello"), ScalarType::Text).as_deref(), Some("hello"));
        assert_eq!(
            render(json!("2020-01-01T10:00:00Z"), ScalarType::Date).as_deref(),
            Some("2020-01-01T10:00:00Z")
        );
    }

    #[test]
    fn test_render_numbers() {
        assert_eq!(render(json!(12), ScalarType::Integer).as_deref(), Some("12"));
        assert_eq!(render(json!(2.0), ScalarType::Integer).as_deref(), Some("2"));
        assert_eq!(render(json!(2.5), ScalarType::Float).as_deref(), Some("2.5"));
        assert_eq!(render(json!(12), ScalarType::Float).as_deref(), Some("12"));
        assert_eq!(render(json!(12), ScalarType::Text).as_deref(), Some("12"));
    }

    #[test]
    fn test_render_other_shapes() {
        assert_eq!(render(json!(null), ScalarType::Text), None);
        assert_eq!(render(json!(true), ScalarType::Text).as_deref(), Some("true"));
        assert_eq!(
            render(json!({"a": [1, 2]}), ScalarType::Text).as_deref(),
            Some(r#"{"a":[1,2]}"#)
        );
    }

    #[test]
    fn test_push_copy_text_escapes() {
        let mut buf = BytesMut::new();
        push_copy_text(&mut buf, "a\tb\nc\\d\re");
        assert_eq!(&buf[..], b"a\\tb\\nc\\\\d\\re");
    }

    #[test]
    fn test_push_copy_cell_null() {
        let mut buf = BytesMut::new();
        push_copy_cell(&mut buf, None);
        assert_eq!(&buf[..], b"\\N");
    }

    #[test]
    fn test_property_projection_missing_key_is_null() {
        let feature = Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: json!({"a": 1}).as_object().cloned(),
            foreign_members: None,
        };
        let projection = PropertyProjection::default();
        assert_eq!(projection.cell(&feature, "b", ScalarType::Integer), None);
        assert_eq!(
            projection.cell(&feature, "a", ScalarType::Integer).as_deref(),
            Some("1")
        );
    }
}
