//! Tests d'intégration : GeoJSON sur disque → script SQL complet

use std::borrow::Cow;
use std::path::PathBuf;

use geojson::Feature;
use geojson2pg::cli::{cmd_schema, cmd_script, InferenceArgs, ScriptArgs};
use geojson2pg::{write_script, ConversionStatus, Input, RowProjection, TableSpec};
use geoschema::{infer_schema, InferenceOptions, ScalarType};

const PARCELLES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "id": "38185000AB0001",
      "geometry": {"type": "Polygon", "coordinates": [[[5.70, 45.10], [5.71, 45.10], [5.71, 45.11], [5.70, 45.10]]]},
      "properties": {"section": "AB", "contenance": 1520, "lieu_dit": "Les Granges", "note": null}
    },
    {
      "type": "Feature",
      "id": "38185000AB0002",
      "geometry": {"type": "Point", "coordinates": [5.72, 45.18]},
      "properties": {"section": "AC", "contenance": "870.5", "lieu_dit": "Le Bourg\td'en haut"}
    },
    {
      "type": "Feature",
      "geometry": null,
      "properties": {"section": "ZK", "contenance": 12, "lieu_dit": "Pré\\Haut", "extra": true}
    }
  ]
}"#;

fn fixture(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    std::fs::write(&path, PARCELLES).unwrap();
    path
}

fn script_args(input: PathBuf, output: PathBuf) -> ScriptArgs {
    ScriptArgs {
        input,
        output: Some(output),
        table: None,
        schema_name: None,
        geometry_column: None,
        schema: None,
        config: None,
        no_drop: false,
        skip_index: false,
        report: None,
        inference: InferenceArgs::default(),
    }
}

#[test]
fn test_full_script_from_file() {
    let input = fixture("parcelles_full.geojson");
    let output = std::env::temp_dir().join("parcelles_full.sql");

    let report = cmd_script(&script_args(input.clone(), output.clone())).unwrap();
    let script = std::fs::read_to_string(&output).unwrap();

    assert_eq!(report.features_scanned, 3);
    assert_eq!(report.rows_written, 3);
    assert_eq!(report.null_geometries, 1);
    assert_eq!(report.status, ConversionStatus::Success);

    // Table nommée d'après le fichier, colonnes dans l'ordre de première apparition
    assert!(script.contains(
        r#"CREATE TABLE "parcelles_full" ("section" TEXT, "contenance" BIGINT, "lieu_dit" TEXT, "note" TEXT, "extra" TEXT);"#
    ));
    assert!(script.contains("SELECT AddGeometryColumn('', 'parcelles_full', 'geom', 4326, 'GEOMETRY', 2);"));

    let rows: Vec<&str> = script
        .lines()
        .skip_while(|l| !l.starts_with("COPY "))
        .skip(1)
        .take_while(|l| *l != "\\.")
        .collect();
    assert_eq!(rows.len(), 3);

    // "870.5" dans une colonne BIGINT : lecture par préfixe → 870
    assert!(rows[0].starts_with("AB\t1520\tLes Granges\t\\N\t\\N\tSRID=4326;POLYGON"));
    assert!(rows[1].starts_with("AC\t870\tLe Bourg\\td'en haut\t\\N\t\\N\tSRID=4326;POINT"));
    assert_eq!(rows[2], "ZK\t12\tPré\\\\Haut\t\\N\ttrue\t\\N");

    assert!(script.ends_with("COMMIT;\n"));

    std::fs::remove_file(input).ok();
    std::fs::remove_file(output).ok();
}

#[test]
fn test_strict_numbers_change_types() {
    let input = fixture("parcelles_strict.geojson");
    let output = std::env::temp_dir().join("parcelles_strict.sql");

    let mut args = script_args(input.clone(), output.clone());
    args.inference.strict_numbers = true;
    args.table = Some("parcelles".to_string());
    args.schema_name = Some("cadastre".to_string());

    let report = cmd_script(&args).unwrap();
    let script = std::fs::read_to_string(&output).unwrap();

    assert_eq!(report.table, r#""cadastre"."parcelles""#);
    assert!(script.contains(r#""contenance" DOUBLE PRECISION"#));
    assert!(script.contains("870.5\t"));

    std::fs::remove_file(input).ok();
    std::fs::remove_file(output).ok();
}

#[test]
fn test_schema_command_then_reuse() {
    let input = fixture("parcelles_schema.geojson");
    let schema_path = std::env::temp_dir().join("parcelles_schema.json");
    let output = std::env::temp_dir().join("parcelles_schema.sql");

    let schema = cmd_schema(&input, Some(schema_path.as_path()), None, &InferenceArgs::default()).unwrap();
    assert_eq!(schema.get("contenance"), Some(ScalarType::Integer));

    let mut args = script_args(input.clone(), output.clone());
    args.schema = Some(schema_path.clone());
    args.skip_index = true;
    args.no_drop = true;

    let report = cmd_script(&args).unwrap();
    // Schéma fourni : pas de passe d'inférence
    assert_eq!(report.features_scanned, 0);
    assert_eq!(report.rows_written, 3);

    let script = std::fs::read_to_string(&output).unwrap();
    assert!(!script.contains("DROP TABLE"));
    assert!(!script.contains("CREATE INDEX"));

    for path in [input, schema_path, output] {
        std::fs::remove_file(path).ok();
    }
}

#[test]
fn test_report_file() {
    let input = fixture("parcelles_report.geojson");
    let output = std::env::temp_dir().join("parcelles_report.sql");
    let report_path = std::env::temp_dir().join("parcelles_report.json");

    let mut args = script_args(input.clone(), output.clone());
    args.report = Some(report_path.clone());
    cmd_script(&args).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["rows_written"], 3);
    assert_eq!(json["columns"][1]["name"], "contenance");
    assert_eq!(json["columns"][1]["type"], "INTEGER");

    for path in [input, output, report_path] {
        std::fs::remove_file(path).ok();
    }
}

/// Projection qui met les valeurs texte en majuscules
struct Uppercase;

impl RowProjection for Uppercase {
    fn cell<'f>(&self, feature: &'f Feature, column: &str, ty: ScalarType) -> Option<Cow<'f, str>> {
        let value = feature.properties.as_ref()?.get(column)?;
        match (ty, value.as_str()) {
            (ScalarType::Text, Some(s)) => Some(Cow::Owned(s.to_uppercase())),
            _ => geojson2pg::export::row::render_value(value, ty, Default::default()),
        }
    }
}

#[test]
fn test_custom_row_projection() {
    let input = fixture("parcelles_projection.geojson");
    let features: Vec<Feature> = Input::from_arg(&input)
        .features()
        .unwrap()
        .collect::<anyhow::Result<_>>()
        .unwrap();
    let schema = infer_schema(&features, InferenceOptions::default()).unwrap();

    let (out, stats) = write_script(
        Vec::new(),
        TableSpec::new("parcelles"),
        schema,
        features.into_iter().map(Ok),
        &Uppercase,
    )
    .unwrap();
    let script = String::from_utf8(out).unwrap();

    assert_eq!(stats.rows_written, 3);
    assert!(script.contains("\tLES GRANGES\t"));

    std::fs::remove_file(input).ok();
}

#[test]
fn test_invalid_geometry_gives_partial_success() {
    let input = std::env::temp_dir().join("parcelles_partial.geojson");
    std::fs::write(
        &input,
        r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[5.72,45.18]},"properties":{"n":1}},
            {"type":"Feature","geometry":{"type":"LineString","coordinates":[[5.72,45.18]]},"properties":{"n":2}},
            {"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[0,0]]]},"properties":{"n":3}}
        ]}"#,
    )
    .unwrap();
    let output = std::env::temp_dir().join("parcelles_partial.sql");

    let report = cmd_script(&script_args(input.clone(), output.clone())).unwrap();
    assert_eq!(report.rows_written, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.status, ConversionStatus::PartialSuccess);

    let script = std::fs::read_to_string(&output).unwrap();
    assert!(!script.contains("LINESTRING"));
    assert!(!script.contains("POLYGON"));
    assert!(script.ends_with("COMMIT;\n"));

    std::fs::remove_file(input).ok();
    std::fs::remove_file(output).ok();
}
