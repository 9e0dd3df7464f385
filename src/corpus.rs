//! Reading record files into ordered, validated corpus entries.
//!
//! Every line passes through [`validate_line`]; valid lines become
//! [`CorpusEntry`] values and failing lines become [`LineIssue`]s. Files are
//! read in parallel but always merged in path order, so the resulting entry
//! order (path, then line) does not depend on scheduling.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::errors::CorpusError;
use crate::record::{CorpusEntry, Record};
use crate::transport::fs::CorpusWalker;
use crate::validation::{LineIssue, validate_line};

/// One record file split into valid entries and per-line issues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorpusFile {
    /// File path.
    pub path: PathBuf,
    /// Valid records in line order.
    pub entries: Vec<CorpusEntry>,
    /// Failing lines in line order (blank lines included).
    pub issues: Vec<LineIssue>,
}

impl CorpusFile {
    /// Read and validate the file at `path`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| CorpusError::unreadable(path, err))?;
        Ok(Self::from_text(path, &text))
    }

    /// Validate already-loaded file contents.
    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Self {
        let path = path.into();
        let mut entries = Vec::new();
        let mut issues = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line_number = idx + 1;
            match validate_line(line) {
                Ok(record) => entries.push(CorpusEntry {
                    source: path.clone(),
                    line: line_number,
                    raw: line.trim().to_string(),
                    record,
                }),
                Err(error) => {
                    debug!(
                        path = %path.display(),
                        line = line_number,
                        error = %error,
                        "invalid record line"
                    );
                    issues.push(LineIssue {
                        line: line_number,
                        error,
                    });
                }
            }
        }
        Self {
            path,
            entries,
            issues,
        }
    }

    /// Valid records in line order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().map(|entry| &entry.record)
    }

    /// True when the file holds at least one valid record.
    pub fn has_records(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Number of failing lines.
    pub fn error_count(&self) -> usize {
        self.issues.len()
    }

    /// Merge every valid record of this file into a single record.
    pub fn merged(&self) -> Record {
        Record::merge(self.records())
    }
}

/// Read a record file and concatenate its valid records, skipping blank and
/// invalid lines.
pub fn merge_file(path: impl AsRef<Path>) -> Result<Record, CorpusError> {
    Ok(CorpusFile::read(path)?.merged())
}

/// A file that could not be read at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileFailure {
    /// File path.
    pub path: PathBuf,
    /// Human-readable reason.
    pub reason: String,
}

impl FileFailure {
    fn from_error(path: PathBuf, error: &CorpusError) -> Self {
        Self {
            path,
            reason: error.to_string(),
        }
    }
}

/// All record files under a root, read and validated.
#[derive(Clone, Debug, Default)]
pub struct CorpusScan {
    /// Readable files in path order.
    pub files: Vec<CorpusFile>,
    /// Unreadable files in path order.
    pub failures: Vec<FileFailure>,
}

impl CorpusScan {
    /// Walk `walker` and read every file it lists.
    ///
    /// Only an unreadable root is an error; unreadable files are recorded in
    /// [`CorpusScan::failures`].
    pub fn scan(walker: &CorpusWalker) -> Result<Self, CorpusError> {
        let paths = walker.files()?;
        info!(
            root = %walker.root().display(),
            files = paths.len(),
            "scanning corpus"
        );
        Ok(Self::from_paths(paths))
    }

    /// Read every path in parallel and merge results in path order.
    pub fn from_paths(mut paths: Vec<PathBuf>) -> Self {
        paths.sort();
        paths.dedup();
        let results: Vec<(PathBuf, Result<CorpusFile, CorpusError>)> = paths
            .into_par_iter()
            .map(|path| {
                let result = CorpusFile::read(&path);
                (path, result)
            })
            .collect();

        let mut scan = CorpusScan::default();
        for (path, result) in results {
            match result {
                Ok(file) => scan.files.push(file),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable file");
                    scan.failures.push(FileFailure::from_error(path, &err));
                }
            }
        }
        scan
    }

    /// Every valid entry, ordered by path then line.
    pub fn entries(&self) -> impl Iterator<Item = &CorpusEntry> {
        self.files.iter().flat_map(|file| file.entries.iter())
    }

    /// Number of valid entries.
    pub fn entry_count(&self) -> usize {
        self.files.iter().map(|file| file.entries.len()).sum()
    }

    /// Number of failing lines plus unreadable files.
    pub fn error_count(&self) -> usize {
        self.files.iter().map(CorpusFile::error_count).sum::<usize>() + self.failures.len()
    }

    /// True when no file was found at all.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;
    use tempfile::tempdir;

    #[test]
    fn from_text_separates_entries_and_issues_by_line() {
        let text = concat!(
            "{\"sentencia\": [\"a\"], \"tag\": [48]}\n",
            "\n",
            "{\"sentencia\": [\"a\", \"b\"], \"tag\": [0]}\n",
            "  {\"sentencia\": [\"c\"], \"tag\": [2]}  \n",
        );
        let file = CorpusFile::from_text("doc.json", text);
        assert_eq!(file.entries.len(), 2);
        assert_eq!(file.entries[0].line, 1);
        assert_eq!(file.entries[1].line, 4);
        assert_eq!(file.entries[1].raw, "{\"sentencia\": [\"c\"], \"tag\": [2]}");
        assert_eq!(
            file.issues,
            vec![
                LineIssue {
                    line: 2,
                    error: ValidationError::EmptyLine
                },
                LineIssue {
                    line: 3,
                    error: ValidationError::LengthMismatch { tokens: 2, tags: 1 }
                },
            ]
        );
        assert_eq!(file.merged().tokens, vec!["a", "c"]);
    }

    #[test]
    fn scan_orders_files_and_records_unreadable_ones() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("b.json"), "{\"sentencia\": [\"b\"], \"tag\": [48]}\n").unwrap();
        fs::write(root.join("a.json"), "{\"sentencia\": [\"a\"], \"tag\": [48]}\n").unwrap();
        fs::write(root.join("c.json"), [0xff, 0xfe, 0x00]).unwrap();

        let scan = CorpusScan::scan(&CorpusWalker::new(root)).unwrap();
        let names: Vec<String> = scan
            .entries()
            .map(|entry| entry.record.tokens[0].clone())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(scan.failures.len(), 1);
        assert_eq!(scan.failures[0].path, root.join("c.json"));
        assert_eq!(scan.error_count(), 1);
        assert_eq!(scan.entry_count(), 2);
    }

    #[test]
    fn merge_file_skips_invalid_lines() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("doc.json");
        fs::write(
            &path,
            "{\"sentencia\": [\"her2\"], \"tag\": [15]}\nbroken\n\n{\"sentencia\": [\"+3\"], \"tag\": [38]}\n",
        )
        .unwrap();
        let merged = merge_file(&path).unwrap();
        assert_eq!(merged.tokens, vec!["her2", "+3"]);
        assert_eq!(merged.tags, vec![15, 38]);
    }
}
