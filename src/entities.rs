//! Entity span reconstruction from token/tag sequences.
//!
//! A span starts at a begin tag and greedily absorbs following tokens whose
//! tag is exactly the inside id of the same type. Inside tags that are not
//! absorbed this way (no open span, or an open span of another type) are
//! skipped like outside tokens and only counted as orphans.

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::corpus::{CorpusFile, CorpusScan};
use crate::errors::CorpusError;
use crate::record::Record;
use crate::schema::{BioLabel, TagLabel, TagSchema};
use crate::types::{EntityType, Phrase, TagId};

/// Entity type to the distinct phrases found for it.
///
/// Both levels are ordered so reports are deterministic.
pub type EntityMap = BTreeMap<EntityType, BTreeSet<Phrase>>;

/// A maximal begin/inside run of one entity type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntitySpan {
    /// Entity type.
    pub entity_type: &'static str,
    /// First token index (inclusive).
    pub start: usize,
    /// Last token index (exclusive).
    pub end: usize,
    /// Space-joined surface text.
    pub text: Phrase,
}

/// Spans decoded from one record plus diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpanDecode {
    /// Spans in token order; they never overlap.
    pub spans: Vec<EntitySpan>,
    /// Inside tags that did not continue an open span of their type.
    pub orphan_inside: usize,
    /// Tags missing from the schema (treated as outside).
    pub unrecognized: usize,
}

/// Decode entity spans from parallel token and tag slices.
///
/// Only the common prefix of both slices is scanned.
pub fn decode_spans<S: AsRef<str>>(
    tokens: &[S],
    tags: &[TagId],
    schema: &TagSchema,
) -> SpanDecode {
    let len = tokens.len().min(tags.len());
    let mut decoded = SpanDecode::default();
    let mut i = 0;
    while i < len {
        match schema.label_of(tags[i]) {
            TagLabel::Known(BioLabel::Begin { entity_type, .. }) => {
                let inside = schema.inside_id_of(entity_type);
                let mut j = i + 1;
                while j < len && Some(tags[j]) == inside {
                    j += 1;
                }
                let text = tokens[i..j]
                    .iter()
                    .map(AsRef::as_ref)
                    .collect::<Vec<&str>>()
                    .join(" ");
                decoded.spans.push(EntitySpan {
                    entity_type,
                    start: i,
                    end: j,
                    text,
                });
                i = j;
            }
            TagLabel::Known(BioLabel::Inside { .. }) => {
                decoded.orphan_inside += 1;
                i += 1;
            }
            TagLabel::Unrecognized(_) => {
                decoded.unrecognized += 1;
                i += 1;
            }
            TagLabel::Known(BioLabel::Outside) => i += 1,
        }
    }
    decoded
}

/// Entity phrases of one record, grouped by type.
pub fn extract_entities(record: &Record, schema: &TagSchema) -> EntityMap {
    let mut entities = EntityMap::new();
    for span in decode_spans(&record.tokens, &record.tags, schema).spans {
        entities
            .entry(span.entity_type.to_string())
            .or_default()
            .insert(span.text);
    }
    entities
}

fn merge_into(target: &mut EntityMap, source: &EntityMap) {
    for (entity_type, phrases) in source {
        target
            .entry(entity_type.clone())
            .or_default()
            .extend(phrases.iter().cloned());
    }
}

/// Per-file and corpus-wide entity collection for one run.
#[derive(Clone, Debug, Default)]
pub struct EntityAccumulator {
    /// Entities found in each file.
    pub per_file: BTreeMap<PathBuf, EntityMap>,
    /// Union over every file.
    pub corpus: EntityMap,
    /// Records processed.
    pub records: usize,
    /// Orphan inside tags seen.
    pub orphan_inside: usize,
    /// Unrecognized tag ids seen.
    pub unrecognized_tags: usize,
}

#[derive(Default)]
struct FileEntities {
    entities: EntityMap,
    records: usize,
    orphan_inside: usize,
    unrecognized_tags: usize,
}

fn collect_file(file: &CorpusFile, schema: &TagSchema) -> FileEntities {
    let mut collected = FileEntities::default();
    for record in file.records() {
        let decoded = decode_spans(&record.tokens, &record.tags, schema);
        collected.records += 1;
        collected.orphan_inside += decoded.orphan_inside;
        collected.unrecognized_tags += decoded.unrecognized;
        for span in decoded.spans {
            collected
                .entities
                .entry(span.entity_type.to_string())
                .or_default()
                .insert(span.text);
        }
    }
    collected
}

impl EntityAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect entities from every file of a scan (files processed in parallel).
    pub fn from_scan(scan: &CorpusScan, schema: &TagSchema) -> Self {
        let per_file: Vec<(&Path, FileEntities)> = scan
            .files
            .par_iter()
            .map(|file| (file.path.as_path(), collect_file(file, schema)))
            .collect();
        let mut accumulator = Self::new();
        for (path, collected) in per_file {
            accumulator.absorb(path, collected);
        }
        accumulator
    }

    /// Collect entities from one file.
    pub fn add_file(&mut self, file: &CorpusFile, schema: &TagSchema) {
        let collected = collect_file(file, schema);
        self.absorb(&file.path, collected);
    }

    fn absorb(&mut self, path: &Path, collected: FileEntities) {
        self.records += collected.records;
        self.orphan_inside += collected.orphan_inside;
        self.unrecognized_tags += collected.unrecognized_tags;
        merge_into(&mut self.corpus, &collected.entities);
        merge_into(
            self.per_file.entry(path.to_path_buf()).or_default(),
            &collected.entities,
        );
    }

    /// Distinct phrases across all types.
    pub fn total_entities(&self) -> usize {
        self.corpus.values().map(BTreeSet::len).sum()
    }

    /// Per-file sections followed by the corpus-wide listing.
    pub fn render_full_report(&self) -> String {
        let mut out = String::from("=== RESULTS BY FILE ===\n");
        for (path, entities) in &self.per_file {
            let _ = writeln!(out, "\nFile: {}", path.display());
            if entities.is_empty() {
                let _ = writeln!(out, "\n  No entities found in this file.");
            }
            for (entity_type, phrases) in entities {
                let _ = writeln!(out, "\n  {entity_type}:");
                for (idx, phrase) in phrases.iter().enumerate() {
                    let _ = writeln!(out, "    {}. \"{}\"", idx + 1, phrase);
                }
                let _ = writeln!(out, "    Total {entity_type}: {}", phrases.len());
            }
        }
        out.push('\n');
        out.push_str(&self.render_corpus_report());
        out
    }

    /// Corpus-wide listing: each type with numbered sorted phrases and a
    /// per-type total, then the grand total.
    pub fn render_corpus_report(&self) -> String {
        let mut out = String::from("=== ENTITIES BY TYPE ===\n");
        for (entity_type, phrases) in &self.corpus {
            let _ = writeln!(out, "\n{entity_type}:");
            for (idx, phrase) in phrases.iter().enumerate() {
                let _ = writeln!(out, "  {}. \"{}\"", idx + 1, phrase);
            }
            let _ = writeln!(out, "  Total {entity_type}: {}", phrases.len());
        }
        let _ = writeln!(out, "\nTotal entities found: {}", self.total_entities());
        out
    }

    /// Write the corpus-wide listing to `path`.
    pub fn write_report(&self, path: impl AsRef<Path>) -> Result<(), CorpusError> {
        let path = path.as_ref();
        fs::write(path, self.render_corpus_report())
            .map_err(|err| CorpusError::unwritable(path, err))
    }
}
