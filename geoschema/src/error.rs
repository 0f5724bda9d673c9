//! Types d'erreurs pour le crate geoschema

use thiserror::Error;

use crate::types::ScalarType;

/// Erreurs pouvant survenir lors de l'inférence du schéma
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Jointure sans règle définie (FLOAT ⊔ DATE)
    #[error("Undefined type join for column '{column}': {left} and {right} have no common type")]
    UndefinedJoin {
        column: String,
        left: ScalarType,
        right: ScalarType,
    },

    /// Type inconnu lors de la lecture d'un schéma sérialisé
    #[error("Unknown column type: {0}")]
    UnknownType(String),

    /// Colonne déclarée deux fois dans un schéma sérialisé
    #[error("Duplicate column in schema: {0}")]
    DuplicateColumn(String),
}

impl SchemaError {
    /// Crée une erreur de jointure non définie avec le contexte de la colonne
    pub fn undefined_join(column: impl Into<String>, left: ScalarType, right: ScalarType) -> Self {
        Self::UndefinedJoin {
            column: column.into(),
            left,
            right,
        }
    }
}
