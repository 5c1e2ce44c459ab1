//! Persistence gateway for the manifest document.
//!
//! Every read or mutation of the manifest goes through a
//! [`ManifestStore`]: it composes the validation engine and the backup
//! manager, writes atomically, and keeps the last known-good bytes for
//! the failure path. One store instance serves one open manifest; the
//! snapshot it holds is owned by the instance, not shared process-wide.

mod backup;

pub use backup::write_backup;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::{format_errors, ValidationError};
use crate::models::Manifest;
use crate::validate;

/// Why a manifest could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("manifest validation failed:\n{}", format_errors(.0))]
    Invalid(Vec<ValidationError>),
}

/// Why a manifest could not be saved.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] serde_yaml::Error),
    /// The candidate failed validation; the on-disk manifest is
    /// untouched. `backup` is the sidecar holding the last known-good
    /// bytes, absent when no good state was ever loaded or saved.
    #[error("save rejected, manifest validation failed:\n{}", format_errors(.errors))]
    Rejected {
        errors: Vec<ValidationError>,
        backup: Option<PathBuf>,
    },
    /// The candidate failed validation *and* the backup write failed.
    /// Both are reported; neither masks the other.
    #[error(
        "save rejected, manifest validation failed:\n{}\nbackup also failed: {source}",
        format_errors(.errors)
    )]
    BackupFailed {
        errors: Vec<ValidationError>,
        #[source]
        source: io::Error,
    },
}

/// Load/save gateway for one manifest file.
pub struct ManifestStore {
    path: PathBuf,
    last_good: Option<Vec<u8>>,
}

impl ManifestStore {
    /// Create a store for `path`. No I/O happens until `load` or `save`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_good: None,
        }
    }

    /// Store rooted at a project directory, using the standard manifest
    /// file name.
    pub fn for_project(root: &Path) -> Self {
        Self::new(root.join(crate::schema::MANIFEST_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the manifest. On success the bytes become the
    /// last known-good snapshot; on failure storage is left untouched
    /// and no state is retained.
    pub fn load(&mut self) -> Result<Manifest, LoadError> {
        let bytes = fs::read(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;

        let raw: serde_yaml::Value = serde_yaml::from_slice(&bytes).map_err(|err| {
            LoadError::Invalid(vec![ValidationError::structural(
                "manifest",
                format!("not parseable as YAML: {err}"),
            )])
        })?;

        let manifest = validate::validate(&raw).map_err(LoadError::Invalid)?;
        self.last_good = Some(bytes);
        tracing::debug!(path = %self.path.display(), "manifest loaded");
        Ok(manifest)
    }

    /// Serialize, re-validate, and atomically write the candidate.
    ///
    /// The serialized form is validated again before it reaches disk, so
    /// a serialization bug can never corrupt the file. On rejection the
    /// last known-good snapshot is backed up to a sidecar and the
    /// on-disk manifest stays byte-identical.
    pub fn save(&mut self, manifest: &Manifest) -> Result<(), SaveError> {
        let text = serde_yaml::to_string(manifest)?;
        let raw: serde_yaml::Value = serde_yaml::from_str(&text)?;

        let errors = match validate::validate(&raw) {
            Ok(_) => {
                self.write_atomic(text.as_bytes())?;
                self.last_good = Some(text.into_bytes());
                tracing::debug!(path = %self.path.display(), "manifest saved");
                return Ok(());
            }
            Err(errors) => errors,
        };

        match &self.last_good {
            Some(bytes) => match write_backup(bytes, &self.path) {
                Ok(backup) => Err(SaveError::Rejected {
                    errors,
                    backup: Some(backup),
                }),
                Err(source) => Err(SaveError::BackupFailed { errors, source }),
            },
            None => Err(SaveError::Rejected {
                errors,
                backup: None,
            }),
        }
    }

    /// Write to a temp file in the same directory, fsync, then rename
    /// over the manifest. A crash mid-write leaves the prior file intact.
    fn write_atomic(&self, bytes: &[u8]) -> Result<(), SaveError> {
        let tmp = self
            .path
            .with_extension(format!("yaml.tmp.{}", std::process::id()));

        let result = (|| {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            drop(file);
            fs::rename(&tmp, &self.path)
        })();

        result.map_err(|source| {
            let _ = fs::remove_file(&tmp);
            SaveError::Io {
                path: self.path.clone(),
                source,
            }
        })
    }
}
