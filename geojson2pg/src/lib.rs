//! # geojson2pg
//!
//! Conversion d'une FeatureCollection GeoJSON en script de chargement
//! PostgreSQL/PostGIS.
//!
//! ## Features
//!
//! - Inférence d'un type SQL par propriété (crate `geoschema`)
//! - DDL : CREATE TABLE, AddGeometryColumn, index GIST, transaction
//! - Bloc COPY en flux, géométries en EWKT (SRID 4326)
//! - Rapport de conversion JSON
//!
//! ## Usage CLI
//!
//! ```bash
//! # Script SQL sur stdout, à rejouer avec psql
//! geojson2pg --input communes.geojson | psql -d gis
//!
//! # Schéma inféré seul, puis réutilisé pour lire stdin en une passe
//! geojson2pg schema --input communes.geojson --output communes.schema.json
//! cat communes.geojson | geojson2pg --input - --table communes --schema communes.schema.json
//! ```

pub mod cli;
pub mod config;
pub mod export;
pub mod report;
pub mod source;

pub use config::ScriptConfig;
pub use export::{write_script, PropertyProjection, RowProjection, ScriptWriter, TableSpec};
pub use report::{ConversionReport, ConversionStatus};
pub use source::Input;
