//! Structural validation of corpus records.
//!
//! Checks run in a fixed order and stop at the first failure, so each line
//! yields exactly one verdict.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constants::schema::{TAGS_FIELD, TOKENS_FIELD, UNRECOGNIZED_TAG_ID};
use crate::corpus::{CorpusFile, CorpusScan, FileFailure};
use crate::record::Record;
use crate::types::{LineNumber, TagId};

/// Why a single line failed validation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("malformed JSON: {0}")]
    MalformedEncoding(String),
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("field '{0}' must be a list")]
    WrongFieldType(&'static str),
    #[error("length mismatch: {tokens} tokens vs {tags} tags")]
    LengthMismatch { tokens: usize, tags: usize },
    #[error("tag at position {index} is not a number")]
    NonNumericTag { index: usize },
    #[error("token at position {index} is not a string")]
    NonTextualToken { index: usize },
    #[error("empty line")]
    EmptyLine,
}

impl ValidationError {
    /// True for blank padding lines, which are flagged but carry no record.
    pub fn is_empty_line(&self) -> bool {
        matches!(self, ValidationError::EmptyLine)
    }
}

/// Validate one raw line and decode it into a [`Record`].
pub fn validate_line(line: &str) -> Result<Record, ValidationError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyLine);
    }
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|err| ValidationError::MalformedEncoding(err.to_string()))?;
    validate_value(&value)
}

/// Validate an already-parsed JSON value and decode it into a [`Record`].
pub fn validate_value(value: &Value) -> Result<Record, ValidationError> {
    let Value::Object(object) = value else {
        return Err(ValidationError::MalformedEncoding(
            "expected a JSON object".to_string(),
        ));
    };
    let tokens = required_field(object, TOKENS_FIELD)?;
    let tags = required_field(object, TAGS_FIELD)?;

    let tokens = tokens
        .as_array()
        .ok_or(ValidationError::WrongFieldType(TOKENS_FIELD))?;
    let tags = tags
        .as_array()
        .ok_or(ValidationError::WrongFieldType(TAGS_FIELD))?;

    if tokens.len() != tags.len() {
        return Err(ValidationError::LengthMismatch {
            tokens: tokens.len(),
            tags: tags.len(),
        });
    }

    let tags = tags
        .iter()
        .enumerate()
        .map(|(index, tag)| tag_id(tag).ok_or(ValidationError::NonNumericTag { index }))
        .collect::<Result<Vec<_>, _>>()?;
    let tokens = tokens
        .iter()
        .enumerate()
        .map(|(index, token)| {
            token
                .as_str()
                .map(str::to_string)
                .ok_or(ValidationError::NonTextualToken { index })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Record { tokens, tags })
}

fn required_field<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Value, ValidationError> {
    object.get(field).ok_or(ValidationError::MissingField(field))
}

/// Any JSON number is a tag. Integer values (`12`, `12.0`, `1e3`) map to
/// their id; fractional or out-of-range values map to [`UNRECOGNIZED_TAG_ID`].
fn tag_id(value: &Value) -> Option<TagId> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(id) = number.as_i64() {
        return Some(id);
    }
    let id = number
        .as_f64()
        .filter(|float| {
            float.fract() == 0.0 && *float >= TagId::MIN as f64 && *float < TagId::MAX as f64
        })
        .map(|float| float as TagId)
        .unwrap_or(UNRECOGNIZED_TAG_ID);
    Some(id)
}

/// A validation failure attributed to a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineIssue {
    /// 1-based line number.
    pub line: LineNumber,
    /// Failure reason.
    pub error: ValidationError,
}

/// Validation verdict for one record file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileValidation {
    /// File path.
    pub path: PathBuf,
    /// Number of structurally valid records.
    pub valid_records: usize,
    /// Every failing line, in line order.
    pub issues: Vec<LineIssue>,
}

impl FileValidation {
    /// Build a verdict from a scanned file.
    pub fn from_file(file: &CorpusFile) -> Self {
        Self {
            path: file.path.clone(),
            valid_records: file.entries.len(),
            issues: file.issues.clone(),
        }
    }

    /// Number of errors, blank lines included.
    pub fn error_count(&self) -> usize {
        self.issues.len()
    }

    /// True when no line failed.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validation results for a set of files.
#[derive(Debug, Default)]
pub struct ValidationSummary {
    /// Per-file verdicts, ordered by path.
    pub files: Vec<FileValidation>,
    /// Files that could not be read at all.
    pub failures: Vec<FileFailure>,
}

impl ValidationSummary {
    /// Summarize a corpus scan.
    pub fn from_scan(scan: &CorpusScan) -> Self {
        Self {
            files: scan.files.iter().map(FileValidation::from_file).collect(),
            failures: scan.failures.clone(),
        }
    }

    /// Files examined, unreadable ones included.
    pub fn total_files(&self) -> usize {
        self.files.len() + self.failures.len()
    }

    /// Files with no errors.
    pub fn valid_files(&self) -> usize {
        self.files.iter().filter(|file| file.is_valid()).count()
    }

    /// Files with at least one error, unreadable ones included.
    pub fn invalid_files(&self) -> usize {
        self.total_files() - self.valid_files()
    }

    /// Total errors across all files. An unreadable file counts as one error.
    pub fn total_errors(&self) -> usize {
        self.files
            .iter()
            .map(FileValidation::error_count)
            .sum::<usize>()
            + self.failures.len()
    }

    /// Invalid files with their error counts, in path order.
    pub fn invalid_file_list(&self) -> Vec<(&Path, usize)> {
        let mut list: Vec<(&Path, usize)> = self
            .files
            .iter()
            .filter(|file| !file.is_valid())
            .map(|file| (file.path.as_path(), file.error_count()))
            .chain(
                self.failures
                    .iter()
                    .map(|failure| (failure.path.as_path(), 1)),
            )
            .collect();
        list.sort_by(|a, b| a.0.cmp(b.0));
        list
    }

    /// True when at least one error was recorded.
    pub fn has_errors(&self) -> bool {
        self.total_errors() > 0
    }
}
