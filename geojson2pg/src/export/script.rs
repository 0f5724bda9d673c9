//! Génération du script SQL : DDL, bloc COPY, index spatial, transaction
//!
//! Le schéma doit être connu avant la première ligne : les features sont
//! ensuite écrites une par une, sans être gardées en mémoire.

use std::io::Write;

use anyhow::{Context, Result};
use bytes::{BufMut, BytesMut};
use geojson::Feature;
use geoschema::{ScalarType, Schema};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::ewkt::{ewkt_prefix, write_wkt, SRID};
use super::row::{push_copy_cell, RowProjection, COPY_NULL};
use super::ScriptError;

/// Table cible du script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Nom de la table
    pub name: String,
    /// Schéma PostgreSQL (défaut : schéma courant)
    pub schema: Option<String>,
    /// Nom de la colonne géométrique
    pub geometry_column: String,
    pub srid: u32,
    /// Émettre `DROP TABLE IF EXISTS` avant la création
    pub drop_existing: bool,
    /// Créer l'index GIST après le COPY
    pub create_index: bool,
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            geometry_column: "geom".to_string(),
            srid: SRID,
            drop_existing: true,
            create_index: true,
        }
    }

    /// Nom qualifié et quoté (`"schema"."table"`)
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(&self.name)),
            None => quote_ident(&self.name),
        }
    }

    /// Vérifie les identifiants avant toute écriture
    pub fn validate(&self, schema: &Schema) -> Result<(), ScriptError> {
        if self.name.trim().is_empty() {
            return Err(ScriptError::EmptyIdentifier("table"));
        }
        if self.geometry_column.trim().is_empty() {
            return Err(ScriptError::EmptyIdentifier("geometry column"));
        }
        if matches!(&self.schema, Some(s) if s.trim().is_empty()) {
            return Err(ScriptError::EmptyIdentifier("schema"));
        }
        if schema.contains(&self.geometry_column) {
            return Err(ScriptError::GeometryColumnConflict(
                self.geometry_column.clone(),
            ));
        }
        if schema.names().any(str::is_empty) {
            return Err(ScriptError::EmptyIdentifier("column"));
        }
        Ok(())
    }
}

/// Type PostgreSQL d'une colonne inférée
pub fn pg_type_for(ty: ScalarType) -> &'static str {
    match ty {
        ScalarType::Integer => "BIGINT",
        ScalarType::Float => "DOUBLE PRECISION",
        ScalarType::Text => "TEXT",
        ScalarType::Date => "TIMESTAMPTZ",
        // Aucune valeur observée : colonne permissive
        ScalarType::Any => "TEXT",
    }
}

/// Type PostgreSQL d'une colonne du schéma (NUMERIC pour les entiers hors BIGINT)
pub fn pg_column_type(schema: &Schema, name: &str, ty: ScalarType) -> &'static str {
    if ty == ScalarType::Integer && schema.exceeds_bigint(name) {
        "NUMERIC"
    } else {
        pg_type_for(ty)
    }
}

/// Quote un identifiant SQL (`a"b` → `"a""b"`)
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote une chaîne littérale SQL
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Résultat de l'écriture d'une feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// Ligne écrite avec sa géométrie
    Written,
    /// Ligne écrite, géométrie NULL
    NullGeometry,
    /// Géométrie non convertible : ligne ignorée
    Skipped,
}

/// Compteurs du bloc COPY
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowStats {
    pub rows_written: u64,
    pub null_geometries: u64,
    pub skipped: u64,
}

/// Écrivain de script : préambule à la création, une ligne par feature, épilogue à `finish`
pub struct ScriptWriter<W: Write> {
    out: W,
    table: TableSpec,
    schema: Schema,
    ewkt_prefix: Vec<u8>,
    row: BytesMut,
    wkt_buf: Vec<u8>,
    stats: RowStats,
}

impl<W: Write> ScriptWriter<W> {
    /// Valide la table et écrit le préambule jusqu'à la ligne `COPY ... FROM stdin;`
    pub fn begin(mut out: W, table: TableSpec, schema: Schema) -> Result<Self> {
        table.validate(&schema)?;
        write_preamble(&mut out, &table, &schema).context("Failed to write script preamble")?;

        info!(
            table = %table.qualified_name(),
            columns = schema.len(),
            "Writing COPY block"
        );

        Ok(Self {
            out,
            ewkt_prefix: ewkt_prefix(table.srid),
            table,
            schema,
            row: BytesMut::with_capacity(1024),
            wkt_buf: Vec::with_capacity(1024),
            stats: RowStats::default(),
        })
    }

    /// Écrit une feature comme ligne COPY
    pub fn write_feature<P>(&mut self, feature: &Feature, projection: &P) -> Result<RowOutcome>
    where
        P: RowProjection + ?Sized,
    {
        self.row.clear();

        for (name, ty) in self.schema.iter() {
            let cell = projection.cell(feature, name, ty);
            push_copy_cell(&mut self.row, cell.as_deref());
            self.row.put_u8(b'\t');
        }

        let outcome = match &feature.geometry {
            None => {
                self.row.put_slice(COPY_NULL);
                RowOutcome::NullGeometry
            }
            Some(geometry) => match write_wkt(geometry, &mut self.wkt_buf) {
                Ok(()) => {
                    self.row.put_slice(&self.ewkt_prefix);
                    self.row.put_slice(&self.wkt_buf);
                    RowOutcome::Written
                }
                Err(e) => {
                    warn!(feature = ?feature.id, error = %e, "Skipping feature");
                    self.stats.skipped += 1;
                    return Ok(RowOutcome::Skipped);
                }
            },
        };

        self.row.put_u8(b'\n');
        self.out
            .write_all(&self.row)
            .context("Failed to write COPY row")?;

        self.stats.rows_written += 1;
        if outcome == RowOutcome::NullGeometry {
            self.stats.null_geometries += 1;
        }

        Ok(outcome)
    }

    pub fn stats(&self) -> RowStats {
        self.stats
    }

    /// Termine le COPY, crée l'index et valide la transaction
    pub fn finish(mut self) -> Result<(W, RowStats)> {
        writeln!(self.out, "\\.")?;

        if self.table.create_index {
            writeln!(
                self.out,
                "CREATE INDEX {} ON {} USING GIST ({});",
                quote_ident(&format!("{}_{}_idx", self.table.name, self.table.geometry_column)),
                self.table.qualified_name(),
                quote_ident(&self.table.geometry_column)
            )?;
        }

        writeln!(self.out, "COMMIT;")?;
        self.out.flush().context("Failed to flush script output")?;

        debug!(
            rows = self.stats.rows_written,
            skipped = self.stats.skipped,
            "COPY block closed"
        );

        Ok((self.out, self.stats))
    }
}

fn write_preamble<W: Write>(out: &mut W, table: &TableSpec, schema: &Schema) -> std::io::Result<()> {
    let qualified = table.qualified_name();

    writeln!(out, "SET CLIENT_ENCODING TO UTF8;")?;
    writeln!(out, "SET STANDARD_CONFORMING_STRINGS TO ON;")?;
    writeln!(out, "BEGIN;")?;

    if let Some(pg_schema) = &table.schema {
        writeln!(out, "CREATE SCHEMA IF NOT EXISTS {};", quote_ident(pg_schema))?;
    }
    if table.drop_existing {
        writeln!(out, "DROP TABLE IF EXISTS {};", qualified)?;
    }

    let columns: Vec<String> = schema
        .iter()
        .map(|(name, ty)| format!("{} {}", quote_ident(name), pg_column_type(schema, name, ty)))
        .collect();
    writeln!(out, "CREATE TABLE {} ({});", qualified, columns.join(", "))?;

    writeln!(
        out,
        "SELECT AddGeometryColumn({}, {}, {}, {}, 'GEOMETRY', 2);",
        quote_literal(table.schema.as_deref().unwrap_or("")),
        quote_literal(&table.name),
        quote_literal(&table.geometry_column),
        table.srid
    )?;

    let mut copy_columns: Vec<String> = schema.names().map(quote_ident).collect();
    copy_columns.push(quote_ident(&table.geometry_column));
    writeln!(
        out,
        "COPY {} ({}) FROM stdin;",
        qualified,
        copy_columns.join(", ")
    )?;

    Ok(())
}

/// Écrit un script complet à partir d'un flux de features
pub fn write_script<W, I, P>(
    out: W,
    table: TableSpec,
    schema: Schema,
    features: I,
    projection: &P,
) -> Result<(W, RowStats)>
where
    W: Write,
    I: IntoIterator<Item = Result<Feature>>,
    P: RowProjection + ?Sized,
{
    let mut writer = ScriptWriter::begin(out, table, schema)?;
    for feature in features {
        writer.write_feature(&feature?, projection)?;
    }
    writer.finish()
}
