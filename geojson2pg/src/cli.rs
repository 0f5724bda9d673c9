//! Définition et implémentation des commandes CLI
//!
//! - commande par défaut : GeoJSON → script SQL (DDL + COPY)
//! - `schema` : inférence seule, schéma en JSON

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use geoschema::{FloatDatePolicy, InferenceOptions, Schema, SchemaInferrer};
use tracing::{debug, info};

use crate::config::{Overrides, ScriptConfig};
use crate::export::{write_script, PropertyProjection};
use crate::report::ConversionReport;
use crate::source::Input;

#[derive(Subcommand)]
pub enum Commands {
    /// Infer the column schema and print it as JSON (reusable with --schema)
    Schema {
        /// Path to the GeoJSON FeatureCollection ("-" for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        inference: InferenceArgs,
    },
}

/// Options d'inférence communes aux commandes
#[derive(Args, Debug, Clone, Default)]
pub struct InferenceArgs {
    /// Numeric strings must be entirely numeric ("42abc" becomes TEXT, dates stay DATE)
    #[arg(long)]
    pub strict_numbers: bool,

    /// Column type when both FLOAT and DATE values are seen: error, text
    #[arg(long)]
    pub float_date: Option<FloatDatePolicy>,
}

/// Arguments de la génération de script (commande par défaut)
#[derive(Args, Debug, Clone)]
pub struct ScriptArgs {
    /// Path to the GeoJSON FeatureCollection ("-" for stdin, requires --schema)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output SQL file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target table (default: input file name)
    #[arg(short, long)]
    pub table: Option<String>,

    /// Target PostgreSQL schema
    #[arg(long)]
    pub schema_name: Option<String>,

    /// Geometry column name (default: geom)
    #[arg(long)]
    pub geometry_column: Option<String>,

    /// Schema JSON file produced by the `schema` command (skips inference)
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Do not emit DROP TABLE IF EXISTS
    #[arg(long)]
    pub no_drop: bool,

    /// Do not create the GIST index
    #[arg(long)]
    pub skip_index: bool,

    /// Write a JSON conversion report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub inference: InferenceArgs,
}

impl ScriptArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            table: self.table.clone(),
            schema_name: self.schema_name.clone(),
            geometry_column: self.geometry_column.clone(),
            no_drop: self.no_drop,
            skip_index: self.skip_index,
            strict_numbers: self.inference.strict_numbers,
            float_date: self.inference.float_date,
        }
    }
}

/// Exécute la génération du script
pub fn cmd_script(args: &ScriptArgs) -> Result<ConversionReport> {
    let started = Instant::now();
    let input = Input::from_arg(&args.input);

    let mut config = ScriptConfig::resolve(args.config.as_deref())?;
    config.apply_overrides(args.overrides());
    let table = config.table_spec(input.default_table_name())?;

    // Le DDL précède les lignes : sans schéma fourni, une première passe l'infère
    let (schema, scanned) = match &args.schema {
        Some(path) => (load_schema(path)?, 0),
        None => {
            if !input.is_rereadable() {
                anyhow::bail!(
                    "Reading from stdin requires --schema: the input can only be read once"
                );
            }
            infer_from(&input, config.inference)?
        }
    };

    let mut report = ConversionReport::new(&input.describe(), &table.qualified_name());
    report.features_scanned = scanned;
    report.record_schema(&schema);

    // Avant d'ouvrir la sortie : une erreur ne doit pas vider un fichier existant
    table.validate(&schema)?;

    let out = open_output(args.output.as_deref())?;
    let projection = PropertyProjection::new(config.inference.numbers);
    let (_, stats) = write_script(out, table, schema, input.features()?, &projection)?;

    report.record_rows(stats);
    report.set_duration(started.elapsed());
    report.finalize();

    info!("{}", report.summary());

    if let Some(path) = &args.report {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
    }

    Ok(report)
}

/// Exécute la commande schema
pub fn cmd_schema(
    input: &Path,
    output: Option<&Path>,
    config: Option<&Path>,
    inference: &InferenceArgs,
) -> Result<Schema> {
    let input = Input::from_arg(input);

    let mut config = ScriptConfig::resolve(config)?;
    config.apply_overrides(Overrides {
        strict_numbers: inference.strict_numbers,
        float_date: inference.float_date,
        ..Default::default()
    });

    let (schema, _) = infer_from(&input, config.inference)?;

    let mut out = open_output(output)?;
    serde_json::to_writer_pretty(&mut out, &schema).context("Failed to write schema")?;
    writeln!(out)?;
    out.flush()?;

    Ok(schema)
}

/// Passe d'inférence : lit toutes les features une fois
fn infer_from(input: &Input, options: InferenceOptions) -> Result<(Schema, usize)> {
    info!(input = %input.describe(), ?options, "Inferring schema");

    let mut inferrer = SchemaInferrer::new(options);
    for feature in input.features()? {
        inferrer.observe(&feature?);

        let seen = inferrer.features_observed();
        if seen % 100_000 == 0 {
            debug!(features = seen, columns = inferrer.columns_seen(), "Inference progress");
        }
    }

    let scanned = inferrer.features_observed();
    let schema = inferrer
        .finish()
        .with_context(|| format!("Schema inference failed for {}", input.describe()))?;

    info!(features = scanned, columns = schema.len(), "Schema inferred");
    for (name, ty) in schema.iter() {
        debug!(column = name, ty = %ty, "Column");
    }

    Ok((schema, scanned))
}

/// Charge un schéma JSON (`[{"name": ..., "type": ...}]`)
fn load_schema(path: &Path) -> Result<Schema> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse schema file: {}", path.display()))
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create file: {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    })
}
