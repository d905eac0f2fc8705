use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::Title;

/// Errors raised while loading the offline artifacts. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Artifact file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Artifact file did not deserialize into its expected shape.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Catalog contained no titles.
    #[error("catalog is empty")]
    EmptyCatalog,
    /// Matrix row count differs from catalog length.
    #[error("catalog has {catalog} titles but similarity matrix has {rows} rows")]
    DimensionMismatch { catalog: usize, rows: usize },
    /// A matrix row has the wrong number of columns.
    #[error("similarity row {row} has {found} columns, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// A score is NaN or infinite.
    #[error("similarity score at ({row}, {col}) is not finite")]
    NonFiniteScore { row: usize, col: usize },
}

/// Catalog and similarity matrix, loaded once and read-only afterwards.
///
/// The matrix is kept row-major in a single buffer of `len * len` scores.
#[derive(Debug)]
pub struct ArtifactStore {
    titles: Vec<Title>,
    scores: Vec<f32>,
    /// First catalog position of every distinct title
    positions: HashMap<String, usize>,
    loaded_at: DateTime<Utc>,
}

impl ArtifactStore {
    /// Reads both artifact files and validates that their shapes agree.
    pub fn load(
        catalog_path: impl AsRef<Path>,
        similarity_path: impl AsRef<Path>,
    ) -> Result<Self, ArtifactError> {
        let titles: Vec<Title> = read_json(catalog_path.as_ref())?;
        let matrix: Vec<Vec<f32>> = read_json(similarity_path.as_ref())?;

        let store = Self::from_parts(titles, matrix)?;

        tracing::info!(
            titles = store.len(),
            catalog = %catalog_path.as_ref().display(),
            similarity = %similarity_path.as_ref().display(),
            "Loaded recommendation artifacts"
        );

        Ok(store)
    }

    /// Builds a store from in-memory parts with the same validation as [`load`](Self::load).
    pub fn from_parts(titles: Vec<Title>, matrix: Vec<Vec<f32>>) -> Result<Self, ArtifactError> {
        let n = titles.len();
        if n == 0 {
            return Err(ArtifactError::EmptyCatalog);
        }
        if matrix.len() != n {
            return Err(ArtifactError::DimensionMismatch {
                catalog: n,
                rows: matrix.len(),
            });
        }

        let mut scores = Vec::with_capacity(n * n);
        for (row, values) in matrix.into_iter().enumerate() {
            if values.len() != n {
                return Err(ArtifactError::NotSquare {
                    row,
                    expected: n,
                    found: values.len(),
                });
            }
            if let Some(col) = values.iter().position(|v| !v.is_finite()) {
                return Err(ArtifactError::NonFiniteScore { row, col });
            }
            scores.extend(values);
        }

        let mut positions = HashMap::with_capacity(n);
        let mut duplicates = 0usize;
        for (i, title) in titles.iter().enumerate() {
            if positions.contains_key(&title.title) {
                duplicates += 1;
            } else {
                positions.insert(title.title.clone(), i);
            }
        }

        if duplicates > 0 {
            tracing::warn!(
                duplicates,
                "Catalog contains duplicate titles; lookups resolve to the first occurrence"
            );
        }

        Ok(Self {
            titles,
            scores,
            positions,
            loaded_at: Utc::now(),
        })
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// All catalog titles in catalog order
    pub fn titles(&self) -> &[Title] {
        &self.titles
    }

    pub fn title(&self, index: usize) -> Option<&Title> {
        self.titles.get(index)
    }

    /// Exact, case-sensitive lookup. Duplicate titles resolve to the first occurrence.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Similarity scores of `index` against every catalog item
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let n = self.len();
        if index >= n {
            return None;
        }
        Some(&self.scores[index * n..(index + 1) * n])
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
