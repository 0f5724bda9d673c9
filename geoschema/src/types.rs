//! Treillis des types scalaires et accumulateur par colonne

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SchemaError;

/// Type SQL inféré pour une colonne
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScalarType {
    Integer,
    Float,
    Text,
    Date,
    /// Aucune observation (null uniquement) : élément neutre de la jointure
    Any,
}

impl ScalarType {
    /// Tous les types, dans l'ordre canonique
    pub const ALL: [ScalarType; 5] = [
        ScalarType::Any,
        ScalarType::Integer,
        ScalarType::Float,
        ScalarType::Text,
        ScalarType::Date,
    ];

    /// Jointure de deux types (borne supérieure).
    ///
    /// `Text` est absorbant, `Any` est neutre et `Integer ⊔ Date = Integer`.
    /// La paire `Float`/`Date` n'a pas de règle : retourne `None`.
    pub fn join(self, other: ScalarType) -> Option<ScalarType> {
        use ScalarType::*;

        match (self, other) {
            (Any, t) | (t, Any) => Some(t),
            (Text, _) | (_, Text) => Some(Text),
            (Integer, Integer) => Some(Integer),
            (Float, Float) => Some(Float),
            (Date, Date) => Some(Date),
            (Integer, Float) | (Float, Integer) => Some(Float),
            (Integer, Date) | (Date, Integer) => Some(Integer),
            (Float, Date) | (Date, Float) => None,
        }
    }

    /// Nom du type tel qu'exposé dans les schémas sérialisés
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::Integer => "INTEGER",
            ScalarType::Float => "FLOAT",
            ScalarType::Text => "TEXT",
            ScalarType::Date => "DATE",
            ScalarType::Any => "ANY",
        }
    }

    fn bit(self) -> u8 {
        match self {
            ScalarType::Any => 1,
            ScalarType::Integer => 1 << 1,
            ScalarType::Float => 1 << 2,
            ScalarType::Text => 1 << 3,
            ScalarType::Date => 1 << 4,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalarType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScalarType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SchemaError::UnknownType(s.to_string()))
    }
}

/// Résolution de la paire sans règle `Float ⊔ Date`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloatDatePolicy {
    /// Erreur dure : le schéma n'est pas construit
    #[default]
    Error,
    /// Repli sur `Text`
    Text,
}

impl FromStr for FloatDatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "text" => Ok(Self::Text),
            other => Err(format!("Unknown float/date policy: {other}. Use: error, text")),
        }
    }
}

/// Ensemble des types observés pour une colonne.
///
/// L'union est commutative, associative et idempotente : le type final ne
/// dépend que des observations, jamais de l'ordre d'arrivée des features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TypeSet(u8);

impl TypeSet {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, ty: ScalarType) {
        self.0 |= ty.bit();
    }

    pub fn contains(&self, ty: ScalarType) -> bool {
        self.0 & ty.bit() != 0
    }

    pub fn union(self, other: TypeSet) -> TypeSet {
        TypeSet(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Types observés, dans l'ordre canonique
    pub fn iter(&self) -> impl Iterator<Item = ScalarType> + '_ {
        ScalarType::ALL.into_iter().filter(|t| self.contains(*t))
    }

    /// Type final de la colonne.
    ///
    /// `Text` domine tout, y compris la paire `Float`/`Date`. Sans `Text`,
    /// la présence simultanée de `Float` et `Date` suit `policy` (`None` pour
    /// [`FloatDatePolicy::Error`]). Sinon, jointure des types observés.
    pub fn resolve(&self, policy: FloatDatePolicy) -> Option<ScalarType> {
        if self.contains(ScalarType::Text) {
            return Some(ScalarType::Text);
        }

        if self.contains(ScalarType::Float) && self.contains(ScalarType::Date) {
            return match policy {
                FloatDatePolicy::Error => None,
                FloatDatePolicy::Text => Some(ScalarType::Text),
            };
        }

        self.iter().try_fold(ScalarType::Any, ScalarType::join)
    }
}

impl FromIterator<ScalarType> for TypeSet {
    fn from_iter<I: IntoIterator<Item = ScalarType>>(iter: I) -> Self {
        let mut set = TypeSet::new();
        for ty in iter {
            set.insert(ty);
        }
        set
    }
}
