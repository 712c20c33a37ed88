//! Input discovery and loading.
//!
//! Turns command-line paths into [`RawFile`]s. Directories are walked
//! recursively; each file's context date is its modification day unless the
//! caller pins one.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use askue_core::models::{IngestIssue, RawFile};
use chrono::{DateTime, Local, NaiveDate};
use tracing::{debug, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// Expand `paths` into a sorted, de-duplicated list of files.
///
/// Directories are walked recursively and filtered by `extension`
/// (case-insensitive, leading dot optional). Paths that are not directories
/// are kept as given so that unreadable ones surface as issues on load.
pub fn find_input_files(paths: &[PathBuf], extension: Option<&str>) -> Vec<PathBuf> {
    let wanted = extension
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty());

    let mut files: Vec<PathBuf> = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let before = files.len();
        files.extend(
            walkdir::WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| {
                    entry.file_type().is_file() && matches_extension(entry.path(), wanted.as_deref())
                })
                .map(|entry| entry.into_path()),
        );
        if files.len() == before {
            warn!("No input files found in {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    files
}

/// Read every path into a [`RawFile`].
///
/// `context_date` overrides the per-file modification date. Files that cannot
/// be read are reported as [`IngestIssue::FileRead`] and skipped.
pub fn load_raw_files(
    paths: &[PathBuf],
    context_date: Option<NaiveDate>,
) -> (Vec<RawFile>, Vec<IngestIssue>) {
    let mut files = Vec::with_capacity(paths.len());
    let mut issues = Vec::new();

    for path in paths {
        let name = display_name(path);
        match std::fs::read(path) {
            Ok(content) => {
                let date = context_date.unwrap_or_else(|| modified_date(path));
                debug!("Loaded {} ({} bytes, context {})", name, content.len(), date);
                files.push(RawFile::new(name, content, date));
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                issues.push(IngestIssue::FileRead {
                    file: name,
                    reason: e.to_string(),
                });
            }
        }
    }

    (files, issues)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn matches_extension(path: &Path, wanted: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(wanted))
            .unwrap_or(false),
    }
}

/// File name without directories, as shown to the user.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Local calendar day the file was last modified, or today.
fn modified_date(path: &Path) -> NaiveDate {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(local_date)
        .unwrap_or_else(|_| Local::now().date_naive())
}

fn local_date(time: SystemTime) -> NaiveDate {
    DateTime::<Local>::from(time).date_naive()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
