//! Timestamped sidecar backups of the last known-good manifest.
//!
//! Written only when a save attempt fails validation — never on
//! successful saves, never on load. Old backups are never rotated or
//! deleted here; cleanup is an explicit external action.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;

/// Write `bytes` (the last known-good manifest) to a sibling of
/// `manifest_path` named `<stem>.<timestamp>.bak.yaml`.
///
/// The timestamp is ISO 8601 with colons replaced by hyphens. If that
/// name is already taken (sub-second save retries), a `-1`, `-2`, …
/// suffix disambiguates rather than overwriting.
pub fn write_backup(bytes: &[u8], manifest_path: &Path) -> io::Result<PathBuf> {
    let stem = manifest_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("manifest");
    let dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S");

    let mut candidate = dir.join(format!("{stem}.{timestamp}.bak.yaml"));
    let mut attempt = 0u32;
    while candidate.exists() {
        attempt += 1;
        candidate = dir.join(format!("{stem}.{timestamp}-{attempt}.bak.yaml"));
    }

    std::fs::write(&candidate, bytes)?;
    tracing::warn!(backup = %candidate.display(), "wrote manifest backup");
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_names_carry_the_manifest_stem() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("manifest.yaml");

        let backup = write_backup(b"project:\n  name: demo\n", &manifest).unwrap();
        let name = backup.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("manifest."));
        assert!(name.ends_with(".bak.yaml"));
        assert_eq!(std::fs::read(&backup).unwrap(), b"project:\n  name: demo\n");
    }

    #[test]
    fn colliding_backups_get_a_suffix_instead_of_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("manifest.yaml");

        let first = write_backup(b"one", &manifest).unwrap();
        let second = write_backup(b"two", &manifest).unwrap();

        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }
}
