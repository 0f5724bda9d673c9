//! Modules d'export (script SQL, lignes COPY, EWKT)

pub mod ewkt;
pub mod row;
pub mod script;

use thiserror::Error;

pub use row::{PropertyProjection, RowProjection};
pub use script::{write_script, RowOutcome, RowStats, ScriptWriter, TableSpec};

/// Erreurs détectées avant l'écriture du script
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Identifiant vide (table, schéma, colonne)
    #[error("Empty {0} name")]
    EmptyIdentifier(&'static str),

    /// Une propriété porte le nom de la colonne géométrique
    #[error("Property '{0}' collides with the geometry column; choose another name with --geometry-column")]
    GeometryColumnConflict(String),
}
