use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::{LineNumber, TagId, Token};

/// One annotated sentence: tokens paired position-by-position with tag ids.
///
/// Records are never mutated in place; transformations build new records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Ordered token sequence.
    #[serde(rename = "sentencia")]
    pub tokens: Vec<Token>,
    /// Ordered tag ids, one per token.
    #[serde(rename = "tag")]
    pub tags: Vec<TagId>,
}

impl Record {
    /// Build a record from tokens and tags.
    pub fn new<T: Into<Token>>(tokens: impl IntoIterator<Item = T>, tags: Vec<TagId>) -> Self {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            tags,
        }
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when the record has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Concatenate records into one, keeping token and tag order.
    pub fn merge<'a>(records: impl IntoIterator<Item = &'a Record>) -> Record {
        let mut merged = Record::default();
        for record in records {
            merged.tokens.extend(record.tokens.iter().cloned());
            merged.tags.extend(record.tags.iter().copied());
        }
        merged
    }

    /// Compact JSON line for this record.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A validated record together with where it was read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorpusEntry {
    /// File the record was read from.
    pub source: PathBuf,
    /// 1-based line number within `source`.
    pub line: LineNumber,
    /// Line content as read (trailing newline and surrounding whitespace removed).
    pub raw: String,
    /// Decoded record.
    pub record: Record,
}

impl CorpusEntry {
    /// Location of this entry as `path, line N`.
    pub fn location(&self) -> EntryLocation {
        EntryLocation {
            source: self.source.clone(),
            line: self.line,
        }
    }

    /// True when the entry came from `path`.
    pub fn is_from(&self, path: &Path) -> bool {
        self.source == path
    }
}

/// File and line of a corpus entry.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryLocation {
    /// File path.
    pub source: PathBuf,
    /// 1-based line number.
    pub line: LineNumber,
}

impl std::fmt::Display for EntryLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, line {}", self.source.display(), self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_corpus_field_names() {
        let record = Record::new(["no", "cambios"], vec![48, 48]);
        let line = record.to_json_line().unwrap();
        assert_eq!(line, r#"{"sentencia":["no","cambios"],"tag":[48,48]}"#);
        let decoded: Record = serde_json::from_str(&line).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn merge_concatenates_in_order() {
        let first = Record::new(["her2", "+3"], vec![15, 38]);
        let second = Record::new(["en", "2020"], vec![48, 2]);
        let merged = Record::merge([&first, &second]);
        assert_eq!(merged.tokens, vec!["her2", "+3", "en", "2020"]);
        assert_eq!(merged.tags, vec![15, 38, 48, 2]);
        assert!(Record::merge(std::iter::empty()).is_empty());
    }

    #[test]
    fn location_renders_path_and_line() {
        let entry = CorpusEntry {
            source: PathBuf::from("a/b.json"),
            line: 3,
            raw: String::new(),
            record: Record::default(),
        };
        assert_eq!(entry.location().to_string(), "a/b.json, line 3");
        assert!(entry.is_from(Path::new("a/b.json")));
    }
}
