//! Load configuration files out of a zip archive.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path};

use thiserror::Error;
use tracing::debug;

/// Extensions of files treated as device configurations.
const CONFIG_EXTENSIONS: &[&str] = &["txt", "cfg", "conf"];

/// Upper bound on entries in one archive, directories included.
pub const MAX_ENTRIES: usize = 1024;

/// Upper bound on the extracted size of one configuration file.
pub const MAX_ENTRY_BYTES: u64 = 1024 * 1024;

/// Upper bound on the extracted size of all configuration files together.
pub const MAX_TOTAL_BYTES: u64 = 32 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to open archive {path}: {source}")]
    Open { path: String, source: io::Error },
    #[error("{path} is not a readable zip archive: {source}")]
    Zip {
        path: String,
        source: zip::result::ZipError,
    },
    #[error("archive {path} is empty")]
    Empty { path: String },
    #[error("archive {path} contains no configuration files (.txt, .cfg, .conf)")]
    NoConfigs { path: String },
    #[error("archive {path} contains unsafe entry '{entry}'")]
    UnsafeEntry { path: String, entry: String },
    #[error("archive {path} has {count} entries, more than the limit of {}", MAX_ENTRIES)]
    TooManyEntries { path: String, count: usize },
    #[error("archive {path} entry '{entry}' exceeds the size limit of {limit} bytes")]
    TooLarge {
        path: String,
        entry: String,
        limit: u64,
    },
    #[error("failed to extract '{entry}' from {path}: {source}")]
    Io {
        path: String,
        entry: String,
        source: io::Error,
    },
}

/// Configuration texts of one archive, keyed by device identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedArchive {
    /// File name of the archive, without directories.
    pub name: String,
    pub devices: BTreeMap<String, String>,
    /// Entries whose identifier was already taken by an earlier entry.
    pub duplicates: Vec<String>,
}

impl LoadedArchive {
    /// Build an archive from in-memory texts. Later duplicates are recorded,
    /// not loaded.
    pub fn from_texts<I, K, V>(name: &str, texts: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut archive = Self {
            name: name.to_string(),
            ..Self::default()
        };
        for (id, text) in texts {
            archive.insert(id.into(), text.into());
        }
        archive
    }

    fn insert(&mut self, id: String, text: String) {
        if self.devices.contains_key(&id) {
            debug!(archive = %self.name, id = %id, "duplicate device identifier");
            self.duplicates.push(id);
        } else {
            self.devices.insert(id, text);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Read every configuration file in a zip archive.
///
/// Eligible entries are extracted into a temporary directory that is
/// removed when this function returns, whatever the outcome.
pub fn load_archive(path: &Path) -> Result<LoadedArchive, ArchiveError> {
    let shown = path.display().to_string();
    let file = File::open(path).map_err(|source| ArchiveError::Open {
        path: shown.clone(),
        source,
    })?;
    let mut zip = zip::ZipArchive::new(file).map_err(|source| ArchiveError::Zip {
        path: shown.clone(),
        source,
    })?;
    if zip.len() == 0 {
        return Err(ArchiveError::Empty { path: shown });
    }
    if zip.len() > MAX_ENTRIES {
        return Err(ArchiveError::TooManyEntries {
            count: zip.len(),
            path: shown,
        });
    }

    let workdir = tempfile::tempdir().map_err(|source| ArchiveError::Io {
        path: shown.clone(),
        entry: String::new(),
        source,
    })?;

    let mut archive = LoadedArchive {
        name: file_name(path),
        ..LoadedArchive::default()
    };
    let mut total: u64 = 0;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|source| ArchiveError::Zip {
            path: shown.clone(),
            source,
        })?;
        let name = entry.name().to_string();
        if !is_safe(&name) {
            return Err(ArchiveError::UnsafeEntry {
                path: shown,
                entry: name,
            });
        }
        if entry.is_dir() || !is_eligible(&name) {
            debug!(archive = %shown, entry = %name, "skipping entry");
            continue;
        }
        let Some(id) = identifier(&name) else {
            continue;
        };

        let io_error = |source| ArchiveError::Io {
            path: shown.clone(),
            entry: name.clone(),
            source,
        };
        let target = workdir.path().join(format!("{index:05}.cfg"));
        let mut out = File::create(&target).map_err(io_error)?;
        // One byte past the limit tells an oversized entry from one at the limit.
        let written = io::copy(&mut (&mut entry).take(MAX_ENTRY_BYTES + 1), &mut out)
            .map_err(io_error)?;
        total += written;
        let limit = if written > MAX_ENTRY_BYTES {
            Some(MAX_ENTRY_BYTES)
        } else if total > MAX_TOTAL_BYTES {
            Some(MAX_TOTAL_BYTES)
        } else {
            None
        };
        if let Some(limit) = limit {
            return Err(ArchiveError::TooLarge {
                path: shown.clone(),
                entry: name.clone(),
                limit,
            });
        }
        let bytes = fs::read(&target).map_err(io_error)?;
        if bytes.contains(&0) {
            debug!(archive = %shown, entry = %name, "skipping binary entry");
            continue;
        }
        debug!(
            archive = %shown,
            entry = %name,
            id = %id,
            bytes = bytes.len(),
            "loaded configuration"
        );
        archive.insert(id, String::from_utf8_lossy(&bytes).into_owned());
    }

    if archive.is_empty() {
        return Err(ArchiveError::NoConfigs { path: shown });
    }
    Ok(archive)
}

/// Like [`load_archive`], but a missing or blank path yields an empty
/// archive. Neighbour tables are optional.
pub fn load_optional_archive(path: Option<&Path>) -> Result<LoadedArchive, ArchiveError> {
    match path {
        Some(path) if !path.as_os_str().is_empty() => load_archive(path),
        _ => Ok(LoadedArchive::default()),
    }
}

/// Relative names without `..` only.
fn is_safe(name: &str) -> bool {
    let normalized = name.replace('\\', "/");
    if normalized.starts_with('/') || normalized.as_bytes().get(1) == Some(&b':') {
        return false;
    }
    Path::new(&normalized)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn is_eligible(name: &str) -> bool {
    let normalized = name.replace('\\', "/");
    let hidden = normalized
        .split('/')
        .any(|part| part.starts_with('.') || part == "__MACOSX");
    if hidden {
        return false;
    }
    Path::new(&normalized)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            CONFIG_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// File name without directories and extension.
fn identifier(name: &str) -> Option<String> {
    let normalized = name.replace('\\', "/");
    Path::new(&normalized)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;

    use zip::write::SimpleFileOptions;

    use super::{
        load_archive, load_optional_archive, ArchiveError, LoadedArchive, MAX_ENTRIES,
        MAX_ENTRY_BYTES,
    };

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).expect("create zip");
        let mut zip = zip::ZipWriter::new(file);
        for (name, bytes) in entries {
            zip.start_file(*name, SimpleFileOptions::default())
                .expect("start entry");
            zip.write_all(bytes).expect("write entry");
        }
        zip.finish().expect("finish zip");
    }

    #[test]
    fn loads_eligible_entries_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lab.zip");
        write_zip(
            &path,
            &[
                ("lab/R1.txt", b"hostname R1\n"),
                ("lab/R2.CFG", b"hostname R2\n"),
                ("lab/notes.pdf", b"%PDF"),
                ("__MACOSX/lab/._R1.txt", b"junk"),
                ("lab/.hidden.txt", b"hostname X\n"),
                ("lab/binary.txt", b"hostname\0"),
                ("other/R1.conf", b"hostname R1-copy\n"),
            ],
        );
        let archive = load_archive(&path).expect("loads");
        assert_eq!(archive.name, "lab.zip");
        let ids: Vec<&str> = archive.devices.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["R1", "R2"]);
        assert_eq!(archive.devices["R1"], "hostname R1\n");
        assert_eq!(archive.duplicates, vec!["R1".to_string()]);
    }

    #[test]
    fn rejects_path_traversal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("evil.zip");
        write_zip(&path, &[("../R1.txt", b"hostname R1\n")]);
        assert!(matches!(
            load_archive(&path),
            Err(ArchiveError::UnsafeEntry { .. })
        ));
    }

    #[test]
    fn empty_and_config_free_archives_fail() {
        let dir = tempfile::tempdir().expect("tempdir");
        let empty = dir.path().join("empty.zip");
        write_zip(&empty, &[]);
        assert!(matches!(load_archive(&empty), Err(ArchiveError::Empty { .. })));

        let pdf = dir.path().join("pdf.zip");
        write_zip(&pdf, &[("report.pdf", b"%PDF")]);
        assert!(matches!(load_archive(&pdf), Err(ArchiveError::NoConfigs { .. })));

        let junk = dir.path().join("junk.zip");
        std::fs::write(&junk, b"not a zip").expect("write junk");
        assert!(matches!(load_archive(&junk), Err(ArchiveError::Zip { .. })));
    }

    #[test]
    fn oversized_entry_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("big.zip");
        let big = vec![b'!'; MAX_ENTRY_BYTES as usize + 1];
        write_zip(&path, &[("R1.txt", b"hostname R1\n"), ("R2.txt", &big)]);
        match load_archive(&path) {
            Err(ArchiveError::TooLarge { entry, limit, .. }) => {
                assert_eq!(entry, "R2.txt");
                assert_eq!(limit, MAX_ENTRY_BYTES);
            }
            other => panic!("expected a size error, got {other:?}"),
        }

        let at_limit = dir.path().join("limit.zip");
        let mut text = b"hostname R1\n".to_vec();
        text.resize(MAX_ENTRY_BYTES as usize, b'!');
        write_zip(&at_limit, &[("R1.txt", &text)]);
        assert_eq!(load_archive(&at_limit).expect("loads").devices.len(), 1);
    }

    #[test]
    fn too_many_entries_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("many.zip");
        let names: Vec<String> = (0..=MAX_ENTRIES).map(|i| format!("R{i}.txt")).collect();
        let entries: Vec<(&str, &[u8])> = names
            .iter()
            .map(|n| (n.as_str(), b"hostname R\n".as_slice()))
            .collect();
        write_zip(&path, &entries);
        assert!(matches!(
            load_archive(&path),
            Err(ArchiveError::TooManyEntries { count, .. }) if count == MAX_ENTRIES + 1
        ));
    }

    #[test]
    fn optional_archive_may_be_absent() {
        assert_eq!(
            load_optional_archive(None).expect("absent"),
            LoadedArchive::default()
        );
        assert!(load_optional_archive(Some(Path::new("")))
            .expect("blank")
            .is_empty());
    }

    #[test]
    fn in_memory_archives_record_duplicates() {
        let archive = LoadedArchive::from_texts("mem", [("R1", "a"), ("R1", "b")]);
        assert_eq!(archive.devices["R1"], "a");
        assert_eq!(archive.duplicates, vec!["R1".to_string()]);
    }
}
