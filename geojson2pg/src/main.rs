//! Point d'entrée CLI pour geojson2pg

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use geojson2pg::cli::{self, Commands, ScriptArgs};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Générer un script de chargement PostgreSQL/PostGIS depuis un GeoJSON
#[derive(Parser)]
#[command(name = "geojson2pg")]
#[command(author, version)]
#[command(about = "Generate a PostgreSQL/PostGIS load script (DDL + COPY) from a GeoJSON FeatureCollection")]
#[command(long_about = "Infers one SQL column type per feature property, then writes CREATE TABLE, AddGeometryColumn, a COPY block with EWKT geometries (SRID 4326) and a GIST index.\n\nThe script goes to stdout (or --output); logs go to stderr. Use 'schema' to only print the inferred schema.")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Sous-commande (défaut: génération du script)
    #[command(subcommand)]
    command: Option<Commands>,

    /// Arguments de la génération du script (commande par défaut)
    #[command(flatten)]
    script: Option<ScriptArgs>,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::Schema {
            input,
            output,
            config,
            inference,
        }) => {
            info!(input = %input.display(), "Schema inference");
            cli::cmd_schema(&input, output.as_deref(), config.as_deref(), &inference)?;
        }
        None => {
            // Commande par défaut: script SQL
            let args = cli.script.context("Missing arguments: --input is required")?;
            info!(input = %args.input.display(), "GeoJSON to PostGIS script");
            let report = cli::cmd_script(&args)?;

            // stdout porte le script : le rapport détaillé seulement vers un fichier
            if args.output.is_some() && !cli.quiet {
                report.display();
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
