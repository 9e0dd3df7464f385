//! File-level train/validation/test partitioning.
//!
//! Whole files are assigned to partitions so sentences from one clinical
//! history never appear in two partitions. Ratios apply to file counts;
//! realized record ratios depend on file sizes.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{SplitConfig, SplitOutputNames};
use crate::constants::splits::{ALL_SPLITS, DISPLAY_NAME_LIMIT};
use crate::corpus::{CorpusFile, CorpusScan};
use crate::errors::CorpusError;
use crate::metrics::{PartitionShare, partition_shares};
use crate::transport::fs::{CorpusWalker, display_name};
use crate::types::DisplayName;
use crate::utils::truncated_list;

/// Dataset partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SplitLabel {
    /// Training split.
    Train,
    /// Validation split.
    Validation,
    /// Test split.
    Test,
}

impl fmt::Display for SplitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SplitLabel::Train => "TRAIN",
            SplitLabel::Validation => "VALID",
            SplitLabel::Test => "TEST",
        })
    }
}

/// File-count ratios for train/validation/test.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    /// Fraction assigned to train.
    pub train: f64,
    /// Fraction assigned to validation.
    pub validation: f64,
    /// Fraction assigned to test.
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.8,
            validation: 0.1,
            test: 0.1,
        }
    }
}

impl SplitRatios {
    /// Validate that ratios are non-negative and sum to `1.0` (within epsilon).
    pub fn normalized(self) -> Result<Self, CorpusError> {
        if self.train < 0.0 || self.validation < 0.0 || self.test < 0.0 {
            return Err(CorpusError::Configuration(
                "split ratios must be non-negative".to_string(),
            ));
        }
        let sum = self.train + self.validation + self.test;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(CorpusError::Configuration(format!(
                "split ratios must sum to 1.0, got {sum:.6}"
            )));
        }
        Ok(self)
    }
}

/// Number of files per partition for `total` files.
///
/// The two cut points are `floor(total * train)` and
/// `floor(total * (train + validation))`; every remaining file goes to test.
pub fn split_counts_for_total(total: usize, ratios: SplitRatios) -> [(SplitLabel, usize); 3] {
    let cut = |fraction: f64| -> usize {
        // The epsilon keeps sums like 0.7 + 0.2 from flooring one short.
        (((total as f64) * fraction + 1e-9).floor() as usize).min(total)
    };
    let train_cut = cut(ratios.train);
    let validation_cut = cut(ratios.train + ratios.validation).max(train_cut);
    [
        (SplitLabel::Train, train_cut),
        (SplitLabel::Validation, validation_cut - train_cut),
        (SplitLabel::Test, total - validation_cut),
    ]
}

/// Files assigned to one partition, in shuffled order.
#[derive(Clone, Debug)]
pub struct Partition {
    /// Partition label.
    pub label: SplitLabel,
    /// Whole files, each with its records in original line order.
    pub files: Vec<CorpusFile>,
}

impl Partition {
    fn new(label: SplitLabel) -> Self {
        Self {
            label,
            files: Vec::new(),
        }
    }

    /// Records across every file of this partition.
    pub fn record_count(&self) -> usize {
        self.files.iter().map(|file| file.entries.len()).sum()
    }

    /// Display names of the files in this partition.
    pub fn file_names(&self) -> Vec<DisplayName> {
        self.files
            .iter()
            .map(|file| display_name(&file.path))
            .collect()
    }

    /// Raw record lines in output order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .flat_map(|file| file.entries.iter().map(|entry| entry.raw.as_str()))
    }
}

/// Assignment of every eligible file to exactly one partition.
#[derive(Clone, Debug)]
pub struct SplitPlan {
    train: Partition,
    validation: Partition,
    test: Partition,
    /// Files dropped for holding no valid record.
    pub dropped: Vec<PathBuf>,
}

impl SplitPlan {
    /// Partition for `label`.
    pub fn partition(&self, label: SplitLabel) -> &Partition {
        match label {
            SplitLabel::Train => &self.train,
            SplitLabel::Validation => &self.validation,
            SplitLabel::Test => &self.test,
        }
    }

    /// Partitions in canonical order.
    pub fn partitions(&self) -> impl Iterator<Item = &Partition> {
        ALL_SPLITS.iter().map(|label| self.partition(*label))
    }

    /// Label of the partition holding `path`, if any.
    pub fn label_of(&self, path: &Path) -> Option<SplitLabel> {
        self.partitions()
            .find(|partition| partition.files.iter().any(|file| file.path == path))
            .map(|partition| partition.label)
    }

    /// Eligible files across all partitions.
    pub fn file_count(&self) -> usize {
        self.partitions().map(|partition| partition.files.len()).sum()
    }

    /// Records across all partitions.
    pub fn record_count(&self) -> usize {
        self.partitions().map(Partition::record_count).sum()
    }
}

/// Partitions files by ratio using an injected random source.
#[derive(Clone, Copy, Debug)]
pub struct CorpusSplitter {
    ratios: SplitRatios,
}

impl CorpusSplitter {
    /// Create a splitter; ratios must be valid.
    pub fn new(ratios: SplitRatios) -> Result<Self, CorpusError> {
        Ok(Self {
            ratios: ratios.normalized()?,
        })
    }

    /// Configured ratios.
    pub fn ratios(&self) -> SplitRatios {
        self.ratios
    }

    /// Shuffle eligible files with `rng` and cut them into partitions.
    ///
    /// Files are sorted by path before shuffling, so the same seed yields the
    /// same assignment regardless of input order. Files with no valid record
    /// are dropped and do not count toward the ratios.
    pub fn split<R: Rng + ?Sized>(
        &self,
        files: Vec<CorpusFile>,
        rng: &mut R,
    ) -> Result<SplitPlan, CorpusError> {
        let mut dropped = Vec::new();
        let mut eligible: Vec<CorpusFile> = Vec::with_capacity(files.len());
        for file in files {
            if file.has_records() {
                eligible.push(file);
            } else {
                warn!(path = %file.path.display(), "file has no valid records; skipping");
                dropped.push(file.path);
            }
        }
        if eligible.is_empty() {
            return Err(CorpusError::NothingToDo(
                "no files with valid records to split".to_string(),
            ));
        }
        eligible.sort_by(|a, b| a.path.cmp(&b.path));
        eligible.shuffle(rng);
        dropped.sort();

        let [(_, train_count), (_, validation_count), _] =
            split_counts_for_total(eligible.len(), self.ratios);
        let mut train = Partition::new(SplitLabel::Train);
        let mut validation = Partition::new(SplitLabel::Validation);
        let mut test = Partition::new(SplitLabel::Test);
        for (idx, file) in eligible.into_iter().enumerate() {
            if idx < train_count {
                train.files.push(file);
            } else if idx < train_count + validation_count {
                validation.files.push(file);
            } else {
                test.files.push(file);
            }
        }
        Ok(SplitPlan {
            train,
            validation,
            test,
            dropped,
        })
    }
}

/// Write each partition as one record per line into `output_dir`.
///
/// Returns the written paths in canonical split order.
pub fn write_partitions(
    plan: &SplitPlan,
    output_dir: &Path,
    names: &SplitOutputNames,
) -> Result<Vec<(SplitLabel, PathBuf)>, CorpusError> {
    fs::create_dir_all(output_dir).map_err(|err| CorpusError::unwritable(output_dir, err))?;
    let mut written = Vec::with_capacity(ALL_SPLITS.len());
    for partition in plan.partitions() {
        let path = output_dir.join(names.for_label(partition.label));
        write_lines(&path, partition.lines())?;
        info!(
            split = %partition.label,
            files = partition.files.len(),
            records = partition.record_count(),
            path = %path.display(),
            "wrote partition"
        );
        written.push((partition.label, path));
    }
    Ok(written)
}

fn write_lines<'a>(path: &Path, lines: impl Iterator<Item = &'a str>) -> Result<(), CorpusError> {
    let file = File::create(path).map_err(|err| CorpusError::unwritable(path, err))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|err| CorpusError::unwritable(path, err))?;
    }
    writer.flush().map_err(|err| CorpusError::unwritable(path, err))
}

/// Human-readable distribution of a split.
#[derive(Clone, Debug)]
pub struct SplitReport {
    /// Seed used for the shuffle.
    pub seed: u64,
    /// Per-partition shares.
    pub shares: Vec<PartitionShare>,
    /// Per-partition file paths with record counts (never truncated).
    pub files: Vec<(SplitLabel, Vec<(PathBuf, usize)>)>,
    /// Files dropped for holding no valid record.
    pub dropped: Vec<PathBuf>,
}

impl SplitReport {
    /// Build a report from a plan.
    pub fn from_plan(plan: &SplitPlan, seed: u64) -> Self {
        let files = plan
            .partitions()
            .map(|partition| {
                (
                    partition.label,
                    partition
                        .files
                        .iter()
                        .map(|file| (file.path.clone(), file.entries.len()))
                        .collect(),
                )
            })
            .collect();
        Self {
            seed,
            shares: partition_shares(plan),
            files,
            dropped: plan.dropped.clone(),
        }
    }

    /// Eligible files.
    pub fn total_files(&self) -> usize {
        self.shares.iter().map(|share| share.files).sum()
    }

    /// Records written.
    pub fn total_records(&self) -> usize {
        self.shares.iter().map(|share| share.records).sum()
    }

    /// Console summary with file names truncated for display.
    pub fn render_summary(&self) -> String {
        let rule = "=".repeat(60);
        let mut out = String::new();
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "FILE-LEVEL SPLIT SUMMARY");
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Seed: {}", self.seed);
        let _ = writeln!(out, "Files processed: {}", self.total_files());
        let _ = writeln!(out, "Records processed: {}", self.total_records());
        let _ = writeln!(out, "\nDISTRIBUTION:");
        for (share, (_, files)) in self.shares.iter().zip(&self.files) {
            let _ = writeln!(
                out,
                "  {:<6} {:3} files ({:.1}%) -> {:5} records ({:.1}%)",
                format!("{}:", share.label),
                share.files,
                share.file_share * 100.0,
                share.records,
                share.record_share * 100.0
            );
            let names: Vec<DisplayName> = files.iter().map(|(path, _)| display_name(path)).collect();
            let _ = writeln!(
                out,
                "         files: {}",
                truncated_list(&names, DISPLAY_NAME_LIMIT)
            );
        }
        if !self.dropped.is_empty() {
            let _ = writeln!(out, "\nDropped (no valid records): {}", self.dropped.len());
        }
        let _ = writeln!(out, "{rule}");
        out
    }

    /// Detailed report listing every file of every partition.
    pub fn render_detailed(&self) -> String {
        let mut out = String::from("FILE-LEVEL SPLIT REPORT\n");
        let _ = writeln!(out, "{}\n", "=".repeat(50));
        let _ = writeln!(out, "Seed: {}\n", self.seed);
        for (label, files) in &self.files {
            let _ = writeln!(out, "{} FILES ({}):", label, files.len());
            for (idx, (path, records)) in files.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  {:2}. {} ({} records)",
                    idx + 1,
                    path.display(),
                    records
                );
            }
            out.push('\n');
        }
        if !self.dropped.is_empty() {
            let _ = writeln!(out, "DROPPED FILES ({}):", self.dropped.len());
            for path in &self.dropped {
                let _ = writeln!(out, "  - {}", path.display());
            }
        }
        out
    }
}

/// Result of a full split run.
#[derive(Debug)]
pub struct SplitOutcome {
    /// Distribution report.
    pub report: SplitReport,
    /// Written partition files.
    pub outputs: Vec<(SplitLabel, PathBuf)>,
    /// Written detailed report path.
    pub report_path: PathBuf,
    /// Invalid lines plus unreadable files encountered while scanning.
    pub scan_errors: usize,
}

impl SplitOutcome {
    /// True when any error was recorded during the run.
    pub fn has_errors(&self) -> bool {
        self.scan_errors > 0
    }
}

/// Scan `root`, split its files, and write partitions plus the detailed report.
///
/// Errors only when the root is unreadable, nothing is eligible, the ratios
/// are invalid, or an output cannot be written.
pub fn split_corpus(root: &Path, config: &SplitConfig) -> Result<SplitOutcome, CorpusError> {
    let splitter = CorpusSplitter::new(config.ratios)?;
    let walker =
        CorpusWalker::from_config(root, &config.scan).with_excluded_path(&config.output_dir);
    let scan = CorpusScan::scan(&walker)?;
    if scan.is_empty() {
        return Err(CorpusError::NothingToDo(format!(
            "no record files found under '{}'",
            root.display()
        )));
    }
    let scan_errors = scan.error_count();
    if scan_errors > 0 {
        warn!(errors = scan_errors, "invalid lines or unreadable files excluded from split");
    }

    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    let plan = splitter.split(scan.files, &mut rng)?;

    let outputs = write_partitions(&plan, &config.output_dir, &config.names)?;
    let report = SplitReport::from_plan(&plan, seed);
    let report_path = config.output_dir.join(&config.names.report);
    fs::write(&report_path, report.render_detailed())
        .map_err(|err| CorpusError::unwritable(&report_path, err))?;
    info!(path = %report_path.display(), "wrote split report");

    Ok(SplitOutcome {
        report,
        outputs,
        report_path,
        scan_errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn file_with_records(name: &str, records: usize) -> CorpusFile {
        let text: String = (0..records)
            .map(|idx| format!("{{\"sentencia\": [\"{name}\", \"{idx}\"], \"tag\": [48, 48]}}\n"))
            .collect();
        CorpusFile::from_text(format!("{name}.json"), &text)
    }

    #[test]
    fn ratios_reject_bad_sums_and_negatives() {
        assert!(SplitRatios::default().normalized().is_ok());
        let bad_sum = SplitRatios {
            train: 0.8,
            validation: 0.1,
            test: 0.2,
        };
        assert!(bad_sum.normalized().is_err());
        let negative = SplitRatios {
            train: 1.2,
            validation: -0.1,
            test: -0.1,
        };
        assert!(negative.normalized().is_err());
    }

    #[test]
    fn counts_floor_cut_points_and_give_remainder_to_test() {
        let counts = split_counts_for_total(10, SplitRatios::default());
        assert_eq!(
            counts,
            [
                (SplitLabel::Train, 8),
                (SplitLabel::Validation, 1),
                (SplitLabel::Test, 1)
            ]
        );
        let counts = split_counts_for_total(7, SplitRatios::default());
        assert_eq!(counts[0].1, 5);
        assert_eq!(counts[1].1, 1);
        assert_eq!(counts[2].1, 1);
        let counts = split_counts_for_total(1, SplitRatios::default());
        assert_eq!(counts.map(|(_, n)| n), [0, 0, 1]);
        let uneven = SplitRatios {
            train: 0.7,
            validation: 0.2,
            test: 0.1,
        };
        assert_eq!(split_counts_for_total(10, uneven).map(|(_, n)| n), [7, 2, 1]);
    }

    #[test]
    fn split_assigns_whole_files_without_loss() {
        let files: Vec<CorpusFile> = (0..10)
            .map(|idx| file_with_records(&format!("doc{idx}"), idx + 1))
            .collect();
        let total_records: usize = files.iter().map(|f| f.entries.len()).sum();
        let splitter = CorpusSplitter::new(SplitRatios::default()).unwrap();
        let plan = splitter
            .split(files, &mut StdRng::seed_from_u64(7))
            .unwrap();

        assert_eq!(plan.partition(SplitLabel::Train).files.len(), 8);
        assert_eq!(plan.partition(SplitLabel::Validation).files.len(), 1);
        assert_eq!(plan.partition(SplitLabel::Test).files.len(), 1);
        assert_eq!(plan.record_count(), total_records);

        let mut seen_paths = HashSet::new();
        let mut seen_lines = HashSet::new();
        for partition in plan.partitions() {
            for file in &partition.files {
                assert!(seen_paths.insert(file.path.clone()));
            }
            for line in partition.lines() {
                assert!(seen_lines.insert(line.to_string()));
            }
        }
        assert_eq!(seen_lines.len(), total_records);
    }

    #[test]
    fn same_seed_same_assignment_regardless_of_input_order() {
        let files: Vec<CorpusFile> = (0..12)
            .map(|idx| file_with_records(&format!("doc{idx:02}"), 2))
            .collect();
        let mut reversed = files.clone();
        reversed.reverse();
        let splitter = CorpusSplitter::new(SplitRatios::default()).unwrap();
        let first = splitter.split(files, &mut StdRng::seed_from_u64(99)).unwrap();
        let second = splitter
            .split(reversed, &mut StdRng::seed_from_u64(99))
            .unwrap();
        for label in ALL_SPLITS {
            let a: Vec<&PathBuf> = first.partition(label).files.iter().map(|f| &f.path).collect();
            let b: Vec<&PathBuf> = second.partition(label).files.iter().map(|f| &f.path).collect();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn empty_files_are_dropped_and_not_counted() {
        let mut files: Vec<CorpusFile> = (0..10)
            .map(|idx| file_with_records(&format!("doc{idx}"), 1))
            .collect();
        files.push(CorpusFile::from_text("blank.json", "\n\n"));
        let splitter = CorpusSplitter::new(SplitRatios::default()).unwrap();
        let plan = splitter.split(files, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(plan.file_count(), 10);
        assert_eq!(plan.dropped, vec![PathBuf::from("blank.json")]);
        assert_eq!(plan.label_of(Path::new("blank.json")), None);
    }

    #[test]
    fn nothing_eligible_is_reported() {
        let splitter = CorpusSplitter::new(SplitRatios::default()).unwrap();
        let err = splitter
            .split(
                vec![CorpusFile::from_text("x.json", "not json\n")],
                &mut StdRng::seed_from_u64(1),
            )
            .unwrap_err();
        assert!(matches!(err, CorpusError::NothingToDo(_)));
    }

    #[test]
    fn summary_truncates_names_but_detailed_report_does_not() {
        let files: Vec<CorpusFile> = (0..10)
            .map(|idx| file_with_records(&format!("doc{idx}"), 1))
            .collect();
        let splitter = CorpusSplitter::new(SplitRatios::default()).unwrap();
        let plan = splitter.split(files, &mut StdRng::seed_from_u64(3)).unwrap();
        let report = SplitReport::from_plan(&plan, 3);
        assert_eq!(report.total_files(), 10);
        assert_eq!(report.total_records(), 10);
        let summary = report.render_summary();
        assert!(summary.contains("..."));
        assert!(summary.contains("TRAIN:"));
        let detailed = report.render_detailed();
        for idx in 0..10 {
            assert!(detailed.contains(&format!("doc{idx}.json (1 records)")));
        }
    }
}
