//! # geoschema
//!
//! Inférence de types de colonnes SQL à partir des propriétés d'un flux de
//! features GeoJSON.
//!
//! ## Features
//!
//! - Treillis de types `INTEGER`, `FLOAT`, `TEXT`, `DATE`, `ANY` avec jointure
//!   commutative et associative
//! - Classification des valeurs (nombres, chaînes numériques, dates ISO-8601)
//! - Une seule passe sur le flux, sans garder les features en mémoire
//! - Résultat indépendant de l'ordre des features
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geoschema::{InferenceOptions, SchemaInferrer};
//!
//! let mut inferrer = SchemaInferrer::new(InferenceOptions::default());
//! for feature in reader.features() {
//!     inferrer.observe(&feature?);
//! }
//! let schema = inferrer.finish()?;
//!
//! for (name, ty) in schema.iter() {
//!     println!("{}: {}", name, ty);
//! }
//! ```

pub mod classify;
pub mod error;
pub mod infer;
pub mod types;

pub use classify::{classify, NumericParsing};
pub use error::SchemaError;
pub use infer::{infer_schema, try_infer_schema, Column, InferenceOptions, Schema, SchemaInferrer};
pub use types::{FloatDatePolicy, ScalarType, TypeSet};
