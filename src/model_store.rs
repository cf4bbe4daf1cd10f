//! Directory of trained model artifacts.
//!
//! Each artifact is a directory named `{kind}_{index}_{accuracy}` holding the
//! serialized network and a text summary. The name is the only metadata the
//! UI relies on.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ml::mlp::SequentialModel;

/// Serialized network inside an artifact directory.
pub const MODEL_FILE: &str = "model.json";
/// Layer table plus test accuracy, for humans.
pub const SUMMARY_FILE: &str = "summary.txt";
const STAGING_PREFIX: &str = ".staging-";

#[derive(Debug, Error)]
pub enum ModelStoreError {
    #[error("Failed to create models folder {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to list models in {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read model {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write model {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to delete {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize model: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Invalid model file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Model {path} failed validation: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// One entry of the models directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    pub name: String,
    pub path: PathBuf,
}

impl ModelEntry {
    /// Decoded name parts, when the name follows the artifact naming rule.
    pub fn parsed_name(&self) -> Option<ArtifactName> {
        parse_artifact_name(&self.name)
    }
}

/// Components of an artifact name.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactName {
    pub kind: String,
    pub index: usize,
    pub accuracy: f32,
}

/// First five characters of the accuracy printed with six decimals.
///
/// Accuracy is clamped to `[0, 1]`; NaN counts as zero.
pub fn accuracy_prefix(accuracy: f32) -> String {
    let accuracy = if accuracy.is_nan() {
        0.0
    } else {
        accuracy.clamp(0.0, 1.0)
    };
    format!("{accuracy:.6}").chars().take(5).collect()
}

pub fn artifact_name(kind: &str, index: usize, accuracy: f32) -> String {
    format!("{kind}_{index}_{}", accuracy_prefix(accuracy))
}

/// Inverse of [`artifact_name`]; `None` for names that do not follow it.
pub fn parse_artifact_name(name: &str) -> Option<ArtifactName> {
    let mut parts = name.rsplitn(3, '_');
    let accuracy_text = parts.next()?;
    let index_text = parts.next()?;
    let kind = parts.next()?;
    if kind.is_empty() || index_text.is_empty() || !index_text.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let bytes = accuracy_text.as_bytes();
    let well_formed = bytes.len() == 5
        && bytes[0].is_ascii_digit()
        && bytes[1] == b'.'
        && bytes[2..].iter().all(u8::is_ascii_digit);
    if !well_formed {
        return None;
    }
    let accuracy: f32 = accuracy_text.parse().ok()?;
    if !(0.0..=1.0).contains(&accuracy) {
        return None;
    }
    Some(ArtifactName {
        kind: kind.to_string(),
        index: index_text.parse().ok()?,
        accuracy,
    })
}

/// Models folder that saved artifacts are enumerated from and written to.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    dir: PathBuf,
}

impl ModelRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ModelStoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| ModelStoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Entries sorted by name; in-progress saves are skipped.
    pub fn list(&self) -> Result<Vec<ModelEntry>, ModelStoreError> {
        let read_dir_error = |source| ModelStoreError::ReadDir {
            path: self.dir.clone(),
            source,
        };
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(read_dir_error)? {
            let entry = entry.map_err(read_dir_error)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(STAGING_PREFIX) {
                continue;
            }
            entries.push(ModelEntry {
                name,
                path: entry.path(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Number of entries already present.
    pub fn next_index(&self) -> Result<usize, ModelStoreError> {
        Ok(self.list()?.len())
    }

    /// Persist `model` under a freshly computed artifact name.
    ///
    /// If an older artifact already uses the computed name the index is bumped
    /// until a free one is found.
    pub fn save(
        &self,
        model: &SequentialModel,
        accuracy: f32,
    ) -> Result<ModelEntry, ModelStoreError> {
        let mut index = self.next_index()?;
        let name = loop {
            let name = artifact_name(model.kind(), index, accuracy);
            if !self.dir.join(&name).exists() {
                break name;
            }
            index += 1;
        };
        let staging = self.dir.join(format!("{STAGING_PREFIX}{name}"));
        let target = self.dir.join(&name);
        let result = write_artifact(&staging, model, accuracy).and_then(|()| {
            std::fs::rename(&staging, &target).map_err(|source| ModelStoreError::Write {
                path: target.clone(),
                source,
            })
        });
        if result.is_err() {
            let _ = std::fs::remove_dir_all(&staging);
        }
        result?;
        tracing::info!("Saved model to {}", target.display());
        Ok(ModelEntry { name, path: target })
    }

    /// Read and validate the network stored in `entry`.
    pub fn load(&self, entry: &ModelEntry) -> Result<SequentialModel, ModelStoreError> {
        let path = if entry.path.is_dir() {
            entry.path.join(MODEL_FILE)
        } else {
            entry.path.clone()
        };
        let bytes = std::fs::read(&path).map_err(|source| ModelStoreError::Read {
            path: path.clone(),
            source,
        })?;
        let model: SequentialModel =
            serde_json::from_slice(&bytes).map_err(|source| ModelStoreError::Parse {
                path: path.clone(),
                source,
            })?;
        model
            .validate()
            .map_err(|message| ModelStoreError::Invalid { path, message })?;
        Ok(model)
    }

    /// Remove an artifact directory recursively, or a plain file.
    pub fn delete(&self, entry: &ModelEntry) -> Result<(), ModelStoreError> {
        let result = if entry.path.is_dir() {
            std::fs::remove_dir_all(&entry.path)
        } else {
            std::fs::remove_file(&entry.path)
        };
        result.map_err(|source| ModelStoreError::Remove {
            path: entry.path.clone(),
            source,
        })?;
        tracing::info!("Deleted model {}", entry.path.display());
        Ok(())
    }
}

fn write_artifact(
    dir: &Path,
    model: &SequentialModel,
    accuracy: f32,
) -> Result<(), ModelStoreError> {
    let write = |path: PathBuf, data: &[u8]| {
        std::fs::write(&path, data).map_err(|source| ModelStoreError::Write { path, source })
    };
    std::fs::create_dir_all(dir).map_err(|source| ModelStoreError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let json = serde_json::to_vec(model)?;
    write(dir.join(MODEL_FILE), &json)?;
    let summary = format!("{}Test accuracy: {accuracy:.4}\n", model.summary());
    write(dir.join(SUMMARY_FILE), summary.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::mlp::Activation;

    fn tiny_model() -> SequentialModel {
        SequentialModel::with_layers([2, 2, 1], &[(3, Activation::Sigmoid)], 5)
    }

    #[test]
    fn accuracy_prefix_truncates_six_decimal_text() {
        assert_eq!(accuracy_prefix(0.88349), "0.883");
        assert_eq!(accuracy_prefix(1.0), "1.000");
        assert_eq!(accuracy_prefix(0.0), "0.000");
        assert_eq!(accuracy_prefix(f32::NAN), "0.000");
        assert_eq!(accuracy_prefix(1.7), "1.000");
        assert_eq!(accuracy_prefix(-0.2), "0.000");
    }

    #[test]
    fn artifact_name_follows_rule_for_every_accuracy() {
        for step in 0..=1000u32 {
            let accuracy = step as f32 / 1000.0;
            for index in [0usize, 3, 42] {
                let name = artifact_name("Sequential", index, accuracy);
                let parsed = parse_artifact_name(&name).expect(&name);
                assert_eq!(parsed.kind, "Sequential");
                assert_eq!(parsed.index, index);
                assert!(
                    (accuracy - parsed.accuracy).abs() < 0.0015,
                    "{name} for {accuracy}"
                );
                assert_eq!(name.rsplit('_').next().map(str::len), Some(5));
            }
        }
    }

    #[test]
    fn parse_rejects_foreign_names() {
        for name in ["notes.txt", "Sequential_x_0.500", "Sequential_1_0.5", "_1_0.500", "Seq_1_2.000"] {
            assert_eq!(parse_artifact_name(name), None, "{name}");
        }
    }

    #[test]
    fn save_list_load_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(dir.path().join("models")).unwrap();
        assert_eq!(registry.next_index().unwrap(), 0);

        let model = tiny_model();
        let first = registry.save(&model, 0.5).unwrap();
        assert_eq!(first.name, "Sequential_0_0.500");
        assert!(first.path.join(MODEL_FILE).is_file());
        let summary = std::fs::read_to_string(first.path.join(SUMMARY_FILE)).unwrap();
        assert!(summary.contains("Test accuracy: 0.5000"));

        let second = registry.save(&model, 0.91234).unwrap();
        assert_eq!(second.name, "Sequential_1_0.912");
        assert_eq!(registry.list().unwrap(), vec![first.clone(), second.clone()]);
        assert_eq!(registry.load(&second).unwrap(), model);

        registry.delete(&first).unwrap();
        assert_eq!(registry.list().unwrap(), vec![second]);
    }

    #[test]
    fn save_skips_names_taken_by_older_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(dir.path()).unwrap();
        std::fs::create_dir(dir.path().join("Sequential_0_0.700")).unwrap();
        std::fs::create_dir(dir.path().join("Sequential_1_0.700")).unwrap();
        std::fs::remove_dir(dir.path().join("Sequential_0_0.700")).unwrap();
        let entry = registry.save(&tiny_model(), 0.7).unwrap();
        assert_eq!(entry.name, "Sequential_2_0.700");
    }

    #[test]
    fn plain_files_are_listed_and_deletable() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(dir.path()).unwrap();
        let path = dir.path().join("legacy.json");
        std::fs::write(&path, serde_json::to_vec(&tiny_model()).unwrap()).unwrap();
        let entries = registry.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].parsed_name().is_none());
        assert_eq!(registry.load(&entries[0]).unwrap(), tiny_model());
        registry.delete(&entries[0]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_model_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(dir.path()).unwrap();
        let artifact = dir.path().join("Sequential_0_0.100");
        std::fs::create_dir(&artifact).unwrap();
        std::fs::write(artifact.join(MODEL_FILE), b"{not json").unwrap();
        let entry = registry.list().unwrap().remove(0);
        assert!(matches!(
            registry.load(&entry),
            Err(ModelStoreError::Parse { .. })
        ));
    }
}
