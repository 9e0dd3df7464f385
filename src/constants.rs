use crate::splits::SplitLabel;
use crate::types::TagId;

/// Constants describing the record schema and the tag table.
pub mod schema {
    use super::TagId;

    /// Field holding the ordered token sequence.
    pub const TOKENS_FIELD: &str = "sentencia";
    /// Field holding the ordered tag-id sequence.
    pub const TAGS_FIELD: &str = "tag";
    /// Conventional id written for tokens outside any entity.
    ///
    /// Other ids missing from the table decode as unrecognized and are
    /// skipped by the extractor like outside tokens.
    pub const OUTSIDE_TAG_ID: TagId = 48;
    /// Label used for outside tokens.
    pub const OUTSIDE_LABEL: &str = "O";
    /// Number of labelled ids in the table (ids `0..=47`).
    pub const TAG_COUNT: usize = 48;
    /// Id stored for numeric tags that are fractional or outside the `i64`
    /// range. It is missing from the table, so it decodes as unrecognized.
    pub const UNRECOGNIZED_TAG_ID: TagId = -1;
}

/// Constants used by the record validator and its reports.
pub mod validation {
    /// File extensions treated as record files by default.
    pub const DEFAULT_EXTENSIONS: [&str; 2] = ["json", "jsonl"];
}

/// Constants used by the entity extractor reports.
pub mod entities {
    /// Default file name for the flat entity report.
    pub const DEFAULT_REPORT_FILENAME: &str = "entities_report.txt";
}

/// Constants used by the duplicate resolver.
pub mod dedup {
    /// Prefix of the timestamped removal report file name.
    pub const REPORT_FILENAME_PREFIX: &str = "duplicates_report_";
    /// Timestamp format embedded in the report file name.
    pub const REPORT_FILENAME_TIMESTAMP: &str = "%Y-%m-%d_%H-%M-%S";
    /// Timestamp format written in the report header.
    pub const REPORT_HEADER_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";
    /// Width of the section rules in the removal report.
    pub const REPORT_RULE_WIDTH: usize = 80;
}

/// Constants used by the corpus splitter.
pub mod splits {
    use super::SplitLabel;

    /// Canonical partition order used when writing and reporting splits.
    pub const ALL_SPLITS: [SplitLabel; 3] =
        [SplitLabel::Train, SplitLabel::Validation, SplitLabel::Test];
    /// Default output directory for split files.
    pub const DEFAULT_OUTPUT_DIR: &str = "output_data";
    /// Default train output file name.
    pub const TRAIN_FILENAME: &str = "train.json";
    /// Default validation output file name.
    pub const VALIDATION_FILENAME: &str = "valid.json";
    /// Default test output file name.
    pub const TEST_FILENAME: &str = "test.json";
    /// Default detailed distribution report file name.
    pub const REPORT_FILENAME: &str = "division_report.txt";
    /// Folder skipped by default (known incomplete annotation batch).
    pub const DEFAULT_EXCLUDED_DIR: &str = "nuevos_andres check 2";
    /// Number of file names shown per partition in console summaries.
    pub const DISPLAY_NAME_LIMIT: usize = 5;
}
