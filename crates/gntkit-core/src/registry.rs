//! Dataset configuration table.
//!
//! The registry maps dataset names to their download URL and record kind.
//! It is plain data handed to whoever fetches or lays out the corpus; fetching
//! itself (and any retry policy around it) lives outside this crate.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::{GntFileSource, SourceError, discover_gnt_files};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// Isolated character samples (`.gnt`).
    Gnt,
    /// Handwritten text lines (`.dgr`).
    Dgr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub name: String,
    pub url: String,
    pub kind: DatasetKind,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown dataset '{name}'")]
    UnknownDataset { name: String },
    #[error("duplicate dataset '{name}'")]
    DuplicateDataset { name: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("registry JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset source error: {0}")]
    Source(#[from] SourceError),
}

/// Ordered set of datasets, unique by name.
///
/// # Examples
/// ```
/// use gntkit_core::{DatasetKind, DatasetRegistry};
///
/// let registry = DatasetRegistry::casia();
/// let test_set = registry.get("HWDB1.1tst_gnt")?;
/// assert_eq!(test_set.kind, DatasetKind::Gnt);
/// assert_eq!(registry.character_sets().count(), 4);
/// # Ok::<(), gntkit_core::RegistryError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRegistry {
    datasets: Vec<DatasetEntry>,
}

const CASIA_DATASETS: &[(&str, &str)] = &[
    (
        "competition-gnt",
        "http://www.nlpr.ia.ac.cn/databases/Download/competition/competition-gnt.zip",
    ),
    (
        "HWDB1.1trn_gnt_P1",
        "http://www.nlpr.ia.ac.cn/databases/Download/feature_data/HWDB1.1trn_gnt_P1.zip",
    ),
    (
        "HWDB1.1trn_gnt_P2",
        "http://www.nlpr.ia.ac.cn/databases/Download/feature_data/HWDB1.1trn_gnt_P2.zip",
    ),
    (
        "HWDB1.1tst_gnt",
        "http://www.nlpr.ia.ac.cn/databases/download/feature_data/HWDB1.1tst_gnt.zip",
    ),
];

impl DatasetRegistry {
    pub fn new(datasets: Vec<DatasetEntry>) -> Result<Self, RegistryError> {
        for (i, entry) in datasets.iter().enumerate() {
            if datasets[..i].iter().any(|other| other.name == entry.name) {
                return Err(RegistryError::DuplicateDataset {
                    name: entry.name.clone(),
                });
            }
        }
        Ok(Self { datasets })
    }

    /// The CASIA HWDB character datasets.
    pub fn casia() -> Self {
        Self {
            datasets: CASIA_DATASETS
                .iter()
                .map(|(name, url)| DatasetEntry {
                    name: name.to_string(),
                    url: url.to_string(),
                    kind: DatasetKind::Gnt,
                })
                .collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let parsed: DatasetRegistry = serde_json::from_str(json)?;
        Self::new(parsed.datasets)
    }

    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetEntry> {
        self.datasets.iter()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn get(&self, name: &str) -> Result<&DatasetEntry, RegistryError> {
        self.datasets
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| RegistryError::UnknownDataset {
                name: name.to_string(),
            })
    }

    pub fn character_sets(&self) -> impl Iterator<Item = &DatasetEntry> {
        self.datasets
            .iter()
            .filter(|entry| entry.kind == DatasetKind::Gnt)
    }

    pub fn sentence_sets(&self) -> impl Iterator<Item = &DatasetEntry> {
        self.datasets
            .iter()
            .filter(|entry| entry.kind == DatasetKind::Dgr)
    }

    /// Directory an extracted dataset is expected in: `<root>/<name>`.
    pub fn dataset_dir(&self, root: &Path, name: &str) -> Result<PathBuf, RegistryError> {
        let entry = self.get(name)?;
        Ok(root.join(&entry.name))
    }

    /// The `.gnt` members of an extracted dataset, sorted by path.
    pub fn members(&self, root: &Path, name: &str) -> Result<Vec<GntFileSource>, RegistryError> {
        let dir = self.dataset_dir(root, name)?;
        Ok(discover_gnt_files(&dir)?)
    }

    /// The `.gnt` members of every character dataset, dataset by dataset in
    /// registry order. Every character dataset must be extracted under `root`.
    pub fn character_set_members(&self, root: &Path) -> Result<Vec<GntFileSource>, RegistryError> {
        let mut members = Vec::new();
        for entry in self.character_sets() {
            members.extend(self.members(root, &entry.name)?);
        }
        Ok(members)
    }
}

impl Default for DatasetRegistry {
    fn default() -> Self {
        Self::casia()
    }
}
