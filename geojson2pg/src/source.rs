//! Lecture en flux des features GeoJSON (fichier ou entrée standard)

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geojson::{Feature, FeatureReader};

/// Source de features
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    /// `-` désigne l'entrée standard
    pub fn from_arg(path: &Path) -> Self {
        if path == Path::new("-") {
            Input::Stdin
        } else {
            Input::File(path.to_path_buf())
        }
    }

    /// Une deuxième passe est possible (fichier uniquement)
    pub fn is_rereadable(&self) -> bool {
        matches!(self, Input::File(_))
    }

    /// Nom de table par défaut : nom du fichier sans extension
    pub fn default_table_name(&self) -> Option<String> {
        match self {
            Input::Stdin => None,
            Input::File(path) => {
                let name = path.file_name()?.to_str()?;
                let stem = name
                    .strip_suffix(".geojson")
                    .or_else(|| name.strip_suffix(".json"))
                    .unwrap_or(name);
                Some(stem.to_string())
            }
        }
    }

    /// Ouvre un lecteur en flux sur la FeatureCollection
    pub fn open(&self) -> Result<FeatureReader<Box<dyn Read>>> {
        let reader: Box<dyn Read> = match self {
            Input::Stdin => Box::new(BufReader::new(std::io::stdin())),
            Input::File(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Cannot open {}", path.display()))?;
                Box::new(BufReader::with_capacity(64 * 1024, file))
            }
        };
        Ok(FeatureReader::from_reader(reader))
    }

    /// Itérateur des features, une à une
    pub fn features(&self) -> Result<impl Iterator<Item = Result<Feature>>> {
        let reader = self.open()?;
        Ok(reader
            .features()
            .map(|feature| feature.context("Invalid GeoJSON feature")))
    }

    pub fn describe(&self) -> String {
        match self {
            Input::Stdin => "<stdin>".to_string(),
            Input::File(path) => path.display().to_string(),
        }
    }
}
