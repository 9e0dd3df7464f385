#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line runners backing the `corpus_*` binaries.
pub mod apps;
/// Scan, dedup, and split configuration types.
pub mod config;
/// Centralized constants used across schema, reports, and splits.
pub mod constants;
/// Reading record files into validated corpus entries.
pub mod corpus;
/// Duplicate sentence grouping, removal, and audit reports.
pub mod dedup;
/// Entity span decoding and entity reports.
pub mod entities;
/// Partition share helpers for split reports.
pub mod metrics;
/// Record and provenance types.
pub mod record;
/// BIO tag table and label lookups.
pub mod schema;
/// File-level train/validation/test splitting.
pub mod splits;
/// Input transports (filesystem walking).
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Sentence keys and display helpers.
pub mod utils;
/// Record validation and validation summaries.
pub mod validation;

mod errors;

pub use config::{DedupConfig, DedupMode, Normalization, ScanConfig, SplitConfig};
pub use corpus::{CorpusFile, CorpusScan, FileFailure, merge_file};
pub use dedup::{DuplicateGroup, DuplicateGroups, DuplicateResolver, RemovalPlan, dedup_corpus};
pub use entities::{EntityAccumulator, EntityMap, EntitySpan, decode_spans, extract_entities};
pub use errors::CorpusError;
pub use record::{CorpusEntry, EntryLocation, Record};
pub use schema::{BioLabel, TagLabel, TagSchema};
pub use splits::{CorpusSplitter, SplitLabel, SplitPlan, SplitRatios, split_corpus};
pub use transport::fs::CorpusWalker;
pub use types::{DisplayName, EntityType, LineNumber, Phrase, SentenceKey, TagId, Token};
pub use validation::{ValidationError, ValidationSummary, validate_line};
