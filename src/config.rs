use std::path::PathBuf;

use crate::constants::splits::{
    DEFAULT_EXCLUDED_DIR, DEFAULT_OUTPUT_DIR, REPORT_FILENAME, TEST_FILENAME, TRAIN_FILENAME,
    VALIDATION_FILENAME,
};
use crate::constants::validation::DEFAULT_EXTENSIONS;
use crate::splits::{SplitLabel, SplitRatios};

/// Controls which files a corpus walk visits.
#[derive(Clone, Debug)]
pub struct ScanConfig {
    /// Accepted record-file extensions (case-insensitive, without the dot).
    pub extensions: Vec<String>,
    /// Directory names skipped at any depth.
    pub excluded_dirs: Vec<String>,
    /// Follow symlinks while walking.
    pub follow_links: bool,
    /// Skip directories whose name starts with `.`.
    pub skip_hidden: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            excluded_dirs: Vec::new(),
            follow_links: false,
            skip_hidden: true,
        }
    }
}

/// How sentence keys are normalized before grouping duplicates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Normalization {
    /// Tokens joined by a single space, case preserved.
    #[default]
    Verbatim,
    /// Tokens joined by a single space, then lowercased.
    CaseFolded,
}

/// Whether the duplicate resolver only reports or also rewrites files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DedupMode {
    /// List duplicate groups without touching any file.
    #[default]
    Report,
    /// Remove every non-kept duplicate line from its file.
    Apply,
}

/// Duplicate resolver configuration.
#[derive(Clone, Debug, Default)]
pub struct DedupConfig {
    /// Sentence key normalization.
    pub normalization: Normalization,
    /// Report-only or apply.
    pub mode: DedupMode,
    /// Directory for the timestamped removal report; `None` uses the
    /// current directory.
    pub report_dir: Option<PathBuf>,
    /// Files visited by the scan.
    pub scan: ScanConfig,
}

/// Output file names for the three partitions and the detailed report.
#[derive(Clone, Debug)]
pub struct SplitOutputNames {
    /// Train partition file name.
    pub train: String,
    /// Validation partition file name.
    pub validation: String,
    /// Test partition file name.
    pub test: String,
    /// Detailed distribution report file name.
    pub report: String,
}

impl Default for SplitOutputNames {
    fn default() -> Self {
        Self {
            train: TRAIN_FILENAME.to_string(),
            validation: VALIDATION_FILENAME.to_string(),
            test: TEST_FILENAME.to_string(),
            report: REPORT_FILENAME.to_string(),
        }
    }
}

impl SplitOutputNames {
    /// File name for the partition `label`.
    pub fn for_label(&self, label: SplitLabel) -> &str {
        match label {
            SplitLabel::Train => &self.train,
            SplitLabel::Validation => &self.validation,
            SplitLabel::Test => &self.test,
        }
    }
}

/// Corpus splitter configuration.
#[derive(Clone, Debug)]
pub struct SplitConfig {
    /// File-count ratios for train/validation/test.
    pub ratios: SplitRatios,
    /// RNG seed for the file shuffle; `None` draws a fresh seed from the OS.
    pub seed: Option<u64>,
    /// Directory receiving the partition files and the report.
    pub output_dir: PathBuf,
    /// Output file names.
    pub names: SplitOutputNames,
    /// Files visited by the scan. Excluded directory names live here.
    pub scan: ScanConfig,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            ratios: SplitRatios::default(),
            seed: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            names: SplitOutputNames::default(),
            scan: ScanConfig {
                excluded_dirs: vec![DEFAULT_EXCLUDED_DIR.to_string()],
                ..ScanConfig::default()
            },
        }
    }
}
