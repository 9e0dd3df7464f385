//! Corpus-wide duplicate sentence detection and removal.
//!
//! Entries are grouped by [`sentence_key`] in a total (path, line) order, so
//! the kept entry of every group is the earliest one regardless of how the
//! scan was scheduled. Report mode stops after grouping; apply mode rewrites
//! each affected file once, deleting its removable lines.

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{DedupConfig, DedupMode, Normalization};
use crate::constants::dedup::{
    REPORT_FILENAME_PREFIX, REPORT_FILENAME_TIMESTAMP, REPORT_HEADER_TIMESTAMP, REPORT_RULE_WIDTH,
};
use crate::corpus::CorpusScan;
use crate::errors::CorpusError;
use crate::record::{CorpusEntry, EntryLocation};
use crate::transport::fs::CorpusWalker;
use crate::types::{LineNumber, SentenceKey};
use crate::utils::sentence_key;

/// Entries sharing one sentence key, in (path, line) order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Normalized sentence key.
    pub key: SentenceKey,
    /// Every entry with this key; the first one is kept.
    pub entries: Vec<CorpusEntry>,
}

impl DuplicateGroup {
    /// Authoritative entry of the group.
    pub fn kept(&self) -> &CorpusEntry {
        &self.entries[0]
    }

    /// Entries marked for removal.
    pub fn removable(&self) -> &[CorpusEntry] {
        &self.entries[1..]
    }

    /// Number of entries sharing the key.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; groups are never built empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of grouping a corpus by sentence key.
#[derive(Clone, Debug, Default)]
pub struct DuplicateGroups {
    /// Groups with more than one entry, ordered by their kept entry.
    pub groups: Vec<DuplicateGroup>,
    /// Number of distinct keys seen.
    pub distinct_keys: usize,
    /// Number of entries grouped.
    pub entries_seen: usize,
}

impl DuplicateGroups {
    /// Total entries marked removable.
    pub fn removable_count(&self) -> usize {
        self.groups.iter().map(|group| group.removable().len()).sum()
    }

    /// True when every key is unique.
    pub fn is_unique(&self) -> bool {
        self.groups.is_empty()
    }

    /// Removal plan grouped by file.
    pub fn removal_plan(&self) -> RemovalPlan {
        let mut files: BTreeMap<PathBuf, Vec<Removal>> = BTreeMap::new();
        for group in &self.groups {
            let kept = group.kept().location();
            for entry in group.removable() {
                files.entry(entry.source.clone()).or_default().push(Removal {
                    line: entry.line,
                    raw: entry.raw.clone(),
                    kept: kept.clone(),
                });
            }
        }
        for removals in files.values_mut() {
            removals.sort_by_key(|removal| removal.line);
        }
        RemovalPlan { files }
    }

    /// Console listing of every duplicate group and its locations.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Entries: {}  Distinct sentences: {}  Duplicated sentences: {}  Removable: {}",
            self.entries_seen,
            self.distinct_keys,
            self.groups.len(),
            self.removable_count()
        );
        for (idx, group) in self.groups.iter().enumerate() {
            let _ = writeln!(out, "\n{}. \"{}\" ({} occurrences)", idx + 1, group.key, group.len());
            let _ = writeln!(out, "   keep:   {}", group.kept().location());
            for entry in group.removable() {
                let _ = writeln!(out, "   remove: {}", entry.location());
            }
        }
        out
    }
}

/// Groups entries by normalized sentence key.
#[derive(Clone, Copy, Debug, Default)]
pub struct DuplicateResolver {
    normalization: Normalization,
}

impl DuplicateResolver {
    /// Create a resolver using `normalization` for keys.
    pub fn new(normalization: Normalization) -> Self {
        Self { normalization }
    }

    /// Group `entries` and keep the earliest entry of each group.
    ///
    /// Entries are ordered by (path, line) first, so the caller's order does
    /// not affect which entry is kept.
    pub fn resolve<'a>(&self, entries: impl IntoIterator<Item = &'a CorpusEntry>) -> DuplicateGroups {
        let mut ordered: Vec<&CorpusEntry> = entries.into_iter().collect();
        ordered.sort_by(|a, b| (&a.source, a.line).cmp(&(&b.source, b.line)));

        let entries_seen = ordered.len();
        let mut by_key: IndexMap<SentenceKey, Vec<CorpusEntry>> = IndexMap::new();
        for entry in ordered {
            let key = sentence_key(&entry.record.tokens, self.normalization);
            by_key.entry(key).or_default().push(entry.clone());
        }
        let distinct_keys = by_key.len();
        let groups = by_key
            .into_iter()
            .filter(|(_, entries)| entries.len() > 1)
            .map(|(key, entries)| DuplicateGroup { key, entries })
            .collect();
        DuplicateGroups {
            groups,
            distinct_keys,
            entries_seen,
        }
    }
}

/// One line scheduled for deletion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Removal {
    /// 1-based line number in the file.
    pub line: LineNumber,
    /// Trimmed line content at scan time.
    pub raw: String,
    /// Location of the entry that was kept instead.
    pub kept: EntryLocation,
}

/// Removals grouped by file, each list in ascending line order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemovalPlan {
    /// File path to its removals.
    pub files: BTreeMap<PathBuf, Vec<Removal>>,
}

impl RemovalPlan {
    /// Total scheduled removals.
    pub fn removal_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// True when nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Rewrite every affected file, one rewrite per file.
    ///
    /// Files are independent: a failure on one file leaves it untouched and
    /// does not stop the others.
    pub fn apply(&self) -> ApplyOutcome {
        let results: Vec<(PathBuf, Result<usize, CorpusError>)> = self
            .files
            .par_iter()
            .map(|(path, removals)| (path.clone(), remove_lines(path, removals)))
            .collect();

        let mut outcome = ApplyOutcome::default();
        for (path, result) in results {
            match result {
                Ok(removed) => {
                    info!(path = %path.display(), removed, "rewrote file");
                    outcome.modified.push((path, removed));
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "file left unchanged");
                    outcome.failures.push((path, err));
                }
            }
        }
        outcome
    }
}

/// Result of applying a removal plan.
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    /// Rewritten files with the number of lines removed from each.
    pub modified: Vec<(PathBuf, usize)>,
    /// Files that could not be rewritten.
    pub failures: Vec<(PathBuf, CorpusError)>,
}

impl ApplyOutcome {
    /// Total lines removed.
    pub fn removed_count(&self) -> usize {
        self.modified.iter().map(|(_, removed)| removed).sum()
    }

    fn failed(&self, path: &Path) -> Option<&CorpusError> {
        self.failures
            .iter()
            .find(|(failed, _)| failed == path)
            .map(|(_, err)| err)
    }
}

/// Delete `removals` from the file at `path` and write it back.
///
/// Every scheduled line must still hold its scanned content; otherwise the
/// file is left untouched and [`CorpusError::StaleFile`] is returned.
fn remove_lines(path: &Path, removals: &[Removal]) -> Result<usize, CorpusError> {
    let text = fs::read_to_string(path).map_err(|err| CorpusError::unreadable(path, err))?;
    let mut lines: Vec<&str> = text.split_inclusive('\n').collect();

    for removal in removals {
        let current = removal
            .line
            .checked_sub(1)
            .and_then(|idx| lines.get(idx))
            .map(|line| line.trim());
        if current != Some(removal.raw.as_str()) {
            return Err(CorpusError::StaleFile {
                path: path.to_path_buf(),
                details: format!("line {} no longer matches the scanned record", removal.line),
            });
        }
    }

    let mut line_numbers: Vec<LineNumber> = removals.iter().map(|removal| removal.line).collect();
    line_numbers.sort_unstable_by(|a, b| b.cmp(a));
    line_numbers.dedup();
    for line in &line_numbers {
        lines.remove(line - 1);
    }

    fs::write(path, lines.concat()).map_err(|err| CorpusError::unwritable(path, err))?;
    Ok(line_numbers.len())
}

/// Audit report for an apply run, grouped by file.
pub fn render_audit_report(
    groups: &DuplicateGroups,
    plan: &RemovalPlan,
    outcome: &ApplyOutcome,
    generated: DateTime<Local>,
) -> String {
    let rule = "=".repeat(REPORT_RULE_WIDTH);
    let thin_rule = "-".repeat(REPORT_RULE_WIDTH);
    let mut out = String::from("DUPLICATE REMOVAL REPORT\n");
    let _ = writeln!(out, "Generated: {}", generated.format(REPORT_HEADER_TIMESTAMP));
    let _ = writeln!(out, "Duplicated sentences: {}", groups.groups.len());
    let _ = writeln!(out, "Removed entries: {}", outcome.removed_count());
    let _ = writeln!(out, "Files modified: {}", outcome.modified.len());
    let _ = writeln!(out, "{rule}");

    for (path, removals) in &plan.files {
        let _ = writeln!(out, "\nFILE: {}", path.display());
        if let Some(err) = outcome.failed(path) {
            let _ = writeln!(out, "NOT MODIFIED: {err}");
        }
        let _ = writeln!(out, "{thin_rule}");
        for removal in removals {
            let _ = writeln!(out, "  line {}: {}", removal.line, removal.raw);
            let _ = writeln!(out, "    kept at: {}", removal.kept);
        }
    }
    out
}

/// Report file name carrying `generated` as a timestamp.
pub fn report_file_name(generated: DateTime<Local>) -> String {
    format!(
        "{REPORT_FILENAME_PREFIX}{}.txt",
        generated.format(REPORT_FILENAME_TIMESTAMP)
    )
}

/// Result of a full dedup run.
#[derive(Debug)]
pub struct DedupOutcome {
    /// Duplicate groups found during the scan.
    pub groups: DuplicateGroups,
    /// Apply results, when running in apply mode.
    pub applied: Option<ApplyOutcome>,
    /// Written audit report, when running in apply mode.
    pub report_path: Option<PathBuf>,
    /// Invalid lines plus unreadable files excluded from grouping.
    pub scan_errors: usize,
}

impl DedupOutcome {
    /// True when a scan error or a failed rewrite was recorded.
    pub fn has_errors(&self) -> bool {
        self.scan_errors > 0
            || self
                .applied
                .as_ref()
                .is_some_and(|applied| !applied.failures.is_empty())
    }
}

/// Scan `root`, group duplicates, and in apply mode remove them.
pub fn dedup_corpus(root: &Path, config: &DedupConfig) -> Result<DedupOutcome, CorpusError> {
    let walker = CorpusWalker::from_config(root, &config.scan);
    let scan = CorpusScan::scan(&walker)?;
    if scan.is_empty() {
        return Err(CorpusError::NothingToDo(format!(
            "no record files found under '{}'",
            root.display()
        )));
    }
    let scan_errors = scan.error_count();
    if scan_errors > 0 {
        warn!(errors = scan_errors, "invalid lines or unreadable files excluded from grouping");
    }

    let groups = DuplicateResolver::new(config.normalization).resolve(scan.entries());
    info!(
        entries = groups.entries_seen,
        duplicated = groups.groups.len(),
        removable = groups.removable_count(),
        "grouped corpus by sentence"
    );

    let (applied, report_path) = match config.mode {
        DedupMode::Report => (None, None),
        DedupMode::Apply => {
            let plan = groups.removal_plan();
            let outcome = plan.apply();
            let generated = Local::now();
            let report_dir = config
                .report_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("."));
            fs::create_dir_all(&report_dir)
                .map_err(|err| CorpusError::unwritable(&report_dir, err))?;
            let report_path = report_dir.join(report_file_name(generated));
            fs::write(
                &report_path,
                render_audit_report(&groups, &plan, &outcome, generated),
            )
            .map_err(|err| CorpusError::unwritable(&report_path, err))?;
            info!(path = %report_path.display(), "wrote removal report");
            (Some(outcome), Some(report_path))
        }
    };

    Ok(DedupOutcome {
        groups,
        applied,
        report_path,
        scan_errors,
    })
}
