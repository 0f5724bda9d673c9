//! Inférence du schéma : une passe sur les features, un type par propriété

use geojson::{Feature, JsonObject};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::classify::{classify, fits_i64, NumericParsing};
use crate::types::{FloatDatePolicy, ScalarType, TypeSet};
use crate::SchemaError;

/// Options d'inférence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceOptions {
    /// Lecture des nombres dans les chaînes
    #[serde(default)]
    pub numbers: NumericParsing,

    /// Résolution de la paire FLOAT/DATE
    #[serde(default)]
    pub float_date: FloatDatePolicy,
}

/// Colonne d'un schéma sérialisé (`{"name": "...", "type": "INTEGER"}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ScalarType,
    /// Colonne INTEGER dont une valeur dépasse `i64` (rendue en NUMERIC)
    #[serde(default, skip_serializing_if = "is_false")]
    pub exceeds_bigint: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Schéma final : colonnes dans l'ordre de première apparition.
///
/// L'égalité compare les associations nom → type, sans tenir compte de l'ordre.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<Column>", try_from = "Vec<Column>")]
pub struct Schema {
    columns: IndexMap<String, ScalarType>,
    exceeds_bigint: IndexSet<String>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Type d'une colonne
    pub fn get(&self, name: &str) -> Option<ScalarType> {
        self.columns.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Colonnes dans l'ordre du CREATE TABLE
    pub fn iter(&self) -> impl Iterator<Item = (&str, ScalarType)> {
        self.columns.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    /// Colonne INTEGER avec au moins une valeur hors de `i64`
    pub fn exceeds_bigint(&self, name: &str) -> bool {
        self.exceeds_bigint.contains(name)
    }

    /// Noms des colonnes dans l'ordre du CREATE TABLE
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

impl From<Schema> for Vec<Column> {
    fn from(schema: Schema) -> Self {
        let wide = schema.exceeds_bigint;
        schema
            .columns
            .into_iter()
            .map(|(name, ty)| Column {
                exceeds_bigint: wide.contains(&name),
                name,
                ty,
            })
            .collect()
    }
}

impl TryFrom<Vec<Column>> for Schema {
    type Error = SchemaError;

    fn try_from(columns: Vec<Column>) -> Result<Self, Self::Error> {
        let mut map = IndexMap::with_capacity(columns.len());
        let mut wide = IndexSet::new();
        for column in columns {
            if map.contains_key(&column.name) {
                return Err(SchemaError::DuplicateColumn(column.name));
            }
            if column.exceeds_bigint && column.ty == ScalarType::Integer {
                wide.insert(column.name.clone());
            }
            map.insert(column.name, column.ty);
        }
        Ok(Self {
            columns: map,
            exceeds_bigint: wide,
        })
    }
}

/// Observations d'une colonne
#[derive(Debug, Clone, Copy, Default)]
struct Observed {
    types: TypeSet,
    /// Un entier hors de `i64` a été vu
    exceeds_bigint: bool,
}

impl Observed {
    fn record(&mut self, ty: ScalarType, exceeds_bigint: bool) {
        self.types.insert(ty);
        self.exceeds_bigint |= exceeds_bigint;
    }
}

/// Accumulateur du schéma pendant la lecture du flux de features
#[derive(Debug, Default)]
pub struct SchemaInferrer {
    options: InferenceOptions,
    columns: IndexMap<String, Observed>,
    features: usize,
}

impl SchemaInferrer {
    pub fn new(options: InferenceOptions) -> Self {
        Self {
            options,
            columns: IndexMap::new(),
            features: 0,
        }
    }

    /// Observe les propriétés d'une feature
    pub fn observe(&mut self, feature: &Feature) {
        self.observe_properties(feature.properties.as_ref());
    }

    /// Observe une table de propriétés (`None` : feature sans `properties`)
    pub fn observe_properties(&mut self, properties: Option<&JsonObject>) {
        self.features += 1;

        let Some(properties) = properties else {
            return;
        };

        for (key, value) in properties {
            let ty = classify(value, self.options.numbers);
            let exceeds_bigint =
                ty == ScalarType::Integer && !fits_i64(value, self.options.numbers);

            match self.columns.get_mut(key.as_str()) {
                Some(observed) => observed.record(ty, exceeds_bigint),
                None => {
                    trace!(column = key.as_str(), ty = %ty, "New column");
                    let mut observed = Observed::default();
                    observed.record(ty, exceeds_bigint);
                    self.columns.insert(key.clone(), observed);
                }
            }
        }
    }

    /// Nombre de features observées
    pub fn features_observed(&self) -> usize {
        self.features
    }

    /// Nombre de colonnes rencontrées jusqu'ici
    pub fn columns_seen(&self) -> usize {
        self.columns.len()
    }

    /// Termine la passe et résout le type de chaque colonne.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UndefinedJoin`] si une colonne mêle FLOAT et DATE avec
    /// [`FloatDatePolicy::Error`]. Aucun schéma partiel n'est retourné.
    pub fn finish(self) -> Result<Schema, SchemaError> {
        let mut columns = IndexMap::with_capacity(self.columns.len());
        let mut exceeds_bigint = IndexSet::new();

        for (name, observed) in self.columns {
            let ty = observed
                .types
                .resolve(self.options.float_date)
                .ok_or_else(|| SchemaError::undefined_join(&name, ScalarType::Float, ScalarType::Date))?;
            if ty == ScalarType::Integer && observed.exceeds_bigint {
                debug!(column = name.as_str(), "Integer values beyond BIGINT");
                exceeds_bigint.insert(name.clone());
            }
            columns.insert(name, ty);
        }

        debug!(
            features = self.features,
            columns = columns.len(),
            "Schema inferred"
        );

        Ok(Schema {
            columns,
            exceeds_bigint,
        })
    }
}

/// Infère le schéma d'une séquence de features
pub fn infer_schema<'a, I>(features: I, options: InferenceOptions) -> Result<Schema, SchemaError>
where
    I: IntoIterator<Item = &'a Feature>,
{
    let mut inferrer = SchemaInferrer::new(options);
    for feature in features {
        inferrer.observe(feature);
    }
    inferrer.finish()
}

/// Infère le schéma d'un flux faillible ; s'arrête à la première erreur amont
pub fn try_infer_schema<I, E>(features: I, options: InferenceOptions) -> Result<Schema, E>
where
    I: IntoIterator<Item = Result<Feature, E>>,
    E: From<SchemaError>,
{
    let mut inferrer = SchemaInferrer::new(options);
    for feature in features {
        inferrer.observe(&feature?);
    }
    Ok(inferrer.finish()?)
}
