//! Rapport de conversion
//!
//! Compteurs de la passe d'écriture, schéma retenu et statut global,
//! affichables sur stderr ou sauvegardés en JSON.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use geoschema::{Column, Schema};
use serde::Serialize;

use crate::export::RowStats;

/// Statut global de la conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConversionStatus {
    /// Toutes les features ont été écrites
    Success,
    /// Certaines features ont été ignorées (géométrie invalide)
    PartialSuccess,
    /// Aucune ligne écrite alors que des features ont été ignorées
    Failed,
}

/// Rapport complet
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    /// Source lue
    pub input: String,
    /// Table générée (qualifiée)
    pub table: String,
    /// Durée totale
    pub duration_secs: f64,
    pub status: ConversionStatus,

    /// Features vues pendant l'inférence (0 si le schéma est fourni)
    pub features_scanned: usize,
    /// Lignes COPY écrites
    pub rows_written: u64,
    /// Lignes écrites avec une géométrie NULL
    pub null_geometries: u64,
    /// Features ignorées
    pub skipped: u64,

    /// Colonnes, dans l'ordre du CREATE TABLE
    pub columns: Vec<Column>,
}

impl ConversionReport {
    pub fn new(input: &str, table: &str) -> Self {
        Self {
            input: input.to_string(),
            table: table.to_string(),
            duration_secs: 0.0,
            status: ConversionStatus::Success,
            features_scanned: 0,
            rows_written: 0,
            null_geometries: 0,
            skipped: 0,
            columns: Vec::new(),
        }
    }

    pub fn record_schema(&mut self, schema: &Schema) {
        self.columns = schema.clone().into();
    }

    pub fn record_rows(&mut self, stats: RowStats) {
        self.rows_written = stats.rows_written;
        self.null_geometries = stats.null_geometries;
        self.skipped = stats.skipped;
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Calcule le statut final
    pub fn finalize(&mut self) {
        self.status = match (self.rows_written, self.skipped) {
            (_, 0) => ConversionStatus::Success,
            (0, _) => ConversionStatus::Failed,
            _ => ConversionStatus::PartialSuccess,
        };
    }

    /// Affiche le rapport sur stderr (stdout porte le script)
    pub fn display(&self) {
        eprintln!("\n{}", "=".repeat(60));
        eprintln!("CONVERSION REPORT - {}", self.table);
        eprintln!("{}", "=".repeat(60));

        eprintln!("\nInput: {}", self.input);
        eprintln!("Status: {:?}", self.status);
        eprintln!("Duration: {:.2}s", self.duration_secs);

        eprintln!("\n--- SUMMARY ---");
        eprintln!(
            "Rows: {} written ({} without geometry), {} skipped",
            self.rows_written, self.null_geometries, self.skipped
        );

        if !self.columns.is_empty() {
            eprintln!("\n--- COLUMNS ({}) ---", self.columns.len());
            for column in self.columns.iter().take(50) {
                eprintln!("  {}: {}", column.name, column.ty);
            }
            if self.columns.len() > 50 {
                eprintln!("  ... and {} more", self.columns.len() - 50);
            }
        }

        eprintln!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {} rows, {} columns, {} skipped",
            self.table,
            self.rows_written,
            self.columns.len(),
            self.skipped
        )
    }
}
