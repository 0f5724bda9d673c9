//! Configuration du script
//!
//! Priorité : valeurs par défaut < fichier JSON < variables d'environnement
//! (`.env` compris) < options de la ligne de commande.

use std::path::Path;

use anyhow::{Context, Result};
use geoschema::{FloatDatePolicy, InferenceOptions, NumericParsing};
use serde::{Deserialize, Serialize};

use crate::export::TableSpec;

/// Configuration principale
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Table cible (défaut : nom du fichier d'entrée)
    pub table: Option<String>,

    /// Schéma PostgreSQL cible
    pub schema_name: Option<String>,

    /// Nom de la colonne géométrique
    pub geometry_column: String,

    /// Émettre `DROP TABLE IF EXISTS`
    pub drop_existing: bool,

    /// Créer l'index spatial GIST
    pub create_index: bool,

    /// Options d'inférence des types
    pub inference: InferenceOptions,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            table: None,
            schema_name: None,
            geometry_column: "geom".to_string(),
            drop_existing: true,
            create_index: true,
            inference: InferenceOptions::default(),
        }
    }
}

/// Surcharges issues de la ligne de commande
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub table: Option<String>,
    pub schema_name: Option<String>,
    pub geometry_column: Option<String>,
    pub no_drop: bool,
    pub skip_index: bool,
    pub strict_numbers: bool,
    pub float_date: Option<FloatDatePolicy>,
}

impl ScriptConfig {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_json(&content)
    }

    fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse config JSON")
    }

    /// Fichier optionnel, puis environnement
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applique les variables `GEOJSON2PG_*` ; une valeur illisible est une erreur
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(table) = var("GEOJSON2PG_TABLE") {
            self.table = Some(table);
        }
        if let Some(schema) = var("GEOJSON2PG_SCHEMA") {
            self.schema_name = Some(schema);
        }
        if let Some(column) = var("GEOJSON2PG_GEOMETRY_COLUMN") {
            self.geometry_column = column;
        }
        if let Some(mode) = var("GEOJSON2PG_NUMBERS") {
            self.inference.numbers = mode
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid GEOJSON2PG_NUMBERS: {e}"))?;
        }
        if let Some(policy) = var("GEOJSON2PG_FLOAT_DATE") {
            self.inference.float_date = policy
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid GEOJSON2PG_FLOAT_DATE: {e}"))?;
        }
        Ok(())
    }

    /// Applique les options de la ligne de commande
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(table) = overrides.table {
            self.table = Some(table);
        }
        if let Some(schema) = overrides.schema_name {
            self.schema_name = Some(schema);
        }
        if let Some(column) = overrides.geometry_column {
            self.geometry_column = column;
        }
        if overrides.no_drop {
            self.drop_existing = false;
        }
        if overrides.skip_index {
            self.create_index = false;
        }
        if overrides.strict_numbers {
            self.inference.numbers = NumericParsing::Strict;
        }
        if let Some(policy) = overrides.float_date {
            self.inference.float_date = policy;
        }
    }

    /// Table cible ; `fallback_name` sert si aucune table n'est configurée
    pub fn table_spec(&self, fallback_name: Option<String>) -> Result<TableSpec> {
        let name = self
            .table
            .clone()
            .or(fallback_name)
            .context("No table name: use --table when reading from stdin")?;

        let mut spec = TableSpec::new(name);
        spec.schema = self.schema_name.clone();
        spec.geometry_column = self.geometry_column.clone();
        spec.drop_existing = self.drop_existing;
        spec.create_index = self.create_index;
        Ok(spec)
    }
}
