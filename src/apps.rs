use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, error::ErrorKind};
use tracing::info;

use crate::config::{DedupConfig, DedupMode, Normalization, ScanConfig, SplitConfig};
use crate::constants::entities::DEFAULT_REPORT_FILENAME;
use crate::constants::splits::{DEFAULT_EXCLUDED_DIR, DEFAULT_OUTPUT_DIR};
use crate::corpus::CorpusScan;
use crate::dedup::dedup_corpus;
use crate::entities::EntityAccumulator;
use crate::errors::CorpusError;
use crate::schema::TagSchema;
use crate::splits::{SplitRatios, split_corpus};
use crate::transport::fs::CorpusWalker;
use crate::validation::ValidationSummary;

#[derive(Debug, Parser)]
#[command(
    name = "corpus_validate",
    disable_help_subcommand = true,
    about = "Validate every record file under a corpus tree",
    long_about = "Check each line of every record file for well-formed JSON, the sentencia/tag fields, matching lengths and numeric tags.",
    after_help = "Exits with status 1 when any line or file fails validation."
)]
struct ValidateCli {
    #[arg(default_value = ".", help = "Corpus root directory or a single record file")]
    root: PathBuf,
    #[arg(
        long = "exclude-dir",
        value_name = "NAME",
        help = "Directory name to skip at any depth, repeat as needed"
    )]
    exclude_dirs: Vec<String>,
    #[arg(long, help = "Print every failing line, not only per-file counts")]
    details: bool,
}

#[derive(Debug, Parser)]
#[command(
    name = "corpus_entities",
    disable_help_subcommand = true,
    about = "Extract entity phrases from BIO-tagged records",
    long_about = "Reconstruct entity phrases from token/tag sequences and write a per-type report."
)]
struct EntitiesCli {
    #[arg(default_value = ".", help = "Corpus root directory or a single record file")]
    root: PathBuf,
    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_REPORT_FILENAME,
        help = "Report file to write"
    )]
    output: PathBuf,
    #[arg(
        long = "per-file",
        help = "Also write the per-file sections to the report file"
    )]
    per_file: bool,
    #[arg(
        long = "exclude-dir",
        value_name = "NAME",
        help = "Directory name to skip at any depth, repeat as needed"
    )]
    exclude_dirs: Vec<String>,
}

#[derive(Debug, Parser)]
#[command(
    name = "corpus_dedup",
    disable_help_subcommand = true,
    about = "Find and remove duplicate sentences across a corpus tree",
    long_about = "Group records by sentence text; the first occurrence in path/line order is kept. Without --apply nothing is modified.",
    after_help = "With --apply a timestamped duplicates_report_<timestamp>.txt is written to --report-dir."
)]
struct DedupCli {
    #[arg(default_value = ".", help = "Corpus root directory")]
    root: PathBuf,
    #[arg(long, help = "Remove duplicate lines from their files")]
    apply: bool,
    #[arg(long = "case-fold", help = "Compare sentences case-insensitively")]
    case_fold: bool,
    #[arg(
        long = "report-dir",
        value_name = "DIR",
        help = "Directory for the removal report (defaults to the current directory)"
    )]
    report_dir: Option<PathBuf>,
    #[arg(
        long = "exclude-dir",
        value_name = "NAME",
        help = "Directory name to skip at any depth, repeat as needed"
    )]
    exclude_dirs: Vec<String>,
}

#[derive(Debug, Parser)]
#[command(
    name = "corpus_split",
    disable_help_subcommand = true,
    about = "Split a corpus into train/validation/test by whole files",
    long_about = "Shuffle record files with a seedable RNG and assign whole files to train, validation and test.",
    after_help = "Ratios apply to file counts; record ratios depend on file sizes."
)]
struct SplitCli {
    #[arg(default_value = ".", help = "Corpus root directory")]
    root: PathBuf,
    #[arg(long, help = "Deterministic seed for the file shuffle (random when omitted)")]
    seed: Option<u64>,
    #[arg(
        long = "split-ratios",
        value_name = "TRAIN,VALIDATION,TEST",
        value_parser = parse_split_ratios_arg,
        default_value = "0.8,0.1,0.1",
        help = "Comma-separated split ratios that must sum to 1.0"
    )]
    split: SplitRatios,
    #[arg(
        long = "output-dir",
        value_name = "DIR",
        default_value = DEFAULT_OUTPUT_DIR,
        help = "Directory receiving the split files and the report"
    )]
    output_dir: PathBuf,
    #[arg(
        long = "exclude-dir",
        value_name = "NAME",
        help = "Extra directory name to skip at any depth, repeat as needed ('nuevos_andres check 2' is always skipped)"
    )]
    exclude_dirs: Vec<String>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn scan_config(exclude_dirs: Vec<String>) -> ScanConfig {
    ScanConfig {
        excluded_dirs: exclude_dirs,
        ..ScanConfig::default()
    }
}

/// Default excluded folder followed by any user-supplied names.
fn split_excluded_dirs(extra: Vec<String>) -> Vec<String> {
    let mut dirs = vec![DEFAULT_EXCLUDED_DIR.to_string()];
    for dir in extra {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Validate a corpus tree and print the summary.
pub fn run_validate<I>(args_iter: I) -> Result<ExitCode, Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();
    let Some(cli) =
        parse_cli::<ValidateCli, _>(std::iter::once("corpus_validate".to_string()).chain(args_iter))?
    else {
        return Ok(ExitCode::SUCCESS);
    };

    let walker = CorpusWalker::from_config(&cli.root, &scan_config(cli.exclude_dirs));
    let scan = CorpusScan::scan(&walker)?;
    let summary = ValidationSummary::from_scan(&scan);

    println!("=== VALIDATION SUMMARY ===");
    println!("Total files: {}", summary.total_files());
    println!("Valid files: {}", summary.valid_files());
    println!("Invalid files: {}", summary.invalid_files());
    println!("Total errors: {}", summary.total_errors());
    let invalid = summary.invalid_file_list();
    if !invalid.is_empty() {
        println!("\nInvalid files:");
        for (path, errors) in &invalid {
            println!("  - {} ({} errors)", path.display(), errors);
        }
    }
    if cli.details {
        for file in summary.files.iter().filter(|file| !file.is_valid()) {
            for issue in &file.issues {
                println!("{}:{}: {}", file.path.display(), issue.line, issue.error);
            }
        }
        for failure in &summary.failures {
            println!("{}: {}", failure.path.display(), failure.reason);
        }
    }
    if summary.total_files() == 0 {
        println!("\nNo record files found under '{}'.", cli.root.display());
        return Ok(ExitCode::FAILURE);
    }
    Ok(exit_code(summary.has_errors()))
}

/// Extract entities from a file or tree and write the report.
pub fn run_extract_entities<I>(args_iter: I) -> Result<ExitCode, Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();
    let Some(cli) = parse_cli::<EntitiesCli, _>(
        std::iter::once("corpus_entities".to_string()).chain(args_iter),
    )?
    else {
        return Ok(ExitCode::SUCCESS);
    };

    let walker = CorpusWalker::from_config(&cli.root, &scan_config(cli.exclude_dirs));
    let scan = CorpusScan::scan(&walker)?;
    if scan.is_empty() {
        return Err(CorpusError::NothingToDo(format!(
            "no record files found under '{}'",
            cli.root.display()
        ))
        .into());
    }
    let accumulator = EntityAccumulator::from_scan(&scan, TagSchema::clinical());
    print!("{}", accumulator.render_full_report());
    if cli.per_file {
        fs::write(&cli.output, accumulator.render_full_report())
            .map_err(|err| CorpusError::unwritable(&cli.output, err))?;
    } else {
        accumulator.write_report(&cli.output)?;
    }
    info!(path = %cli.output.display(), "wrote entity report");

    println!("\nRecords processed: {}", accumulator.records);
    if accumulator.orphan_inside > 0 {
        println!("Inside tags without a begin tag: {}", accumulator.orphan_inside);
    }
    if accumulator.unrecognized_tags > 0 {
        println!("Unrecognized tag ids: {}", accumulator.unrecognized_tags);
    }
    println!("Report written to {}", cli.output.display());
    Ok(exit_code(scan.error_count() > 0))
}

/// Report or remove duplicate sentences.
pub fn run_dedup<I>(args_iter: I) -> Result<ExitCode, Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();
    let Some(cli) =
        parse_cli::<DedupCli, _>(std::iter::once("corpus_dedup".to_string()).chain(args_iter))?
    else {
        return Ok(ExitCode::SUCCESS);
    };

    let config = DedupConfig {
        normalization: if cli.case_fold {
            Normalization::CaseFolded
        } else {
            Normalization::Verbatim
        },
        mode: if cli.apply {
            DedupMode::Apply
        } else {
            DedupMode::Report
        },
        report_dir: cli.report_dir,
        scan: scan_config(cli.exclude_dirs),
    };
    let outcome = dedup_corpus(&cli.root, &config)?;

    print!("{}", outcome.groups.render());
    if let Some(applied) = &outcome.applied {
        println!("\nRemoved entries: {}", applied.removed_count());
        println!("Files modified: {}", applied.modified.len());
        for (path, err) in &applied.failures {
            println!("  not modified: {} ({})", path.display(), err);
        }
    } else if !outcome.groups.is_unique() {
        println!("\nRun again with --apply to remove the duplicates.");
    }
    if let Some(path) = &outcome.report_path {
        println!("Report written to {}", path.display());
    }
    if outcome.scan_errors > 0 {
        println!("Lines or files excluded by validation: {}", outcome.scan_errors);
    }
    Ok(exit_code(outcome.has_errors()))
}

/// Split a corpus by whole files and print the distribution.
pub fn run_split<I>(args_iter: I) -> Result<ExitCode, Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();
    let Some(cli) =
        parse_cli::<SplitCli, _>(std::iter::once("corpus_split".to_string()).chain(args_iter))?
    else {
        return Ok(ExitCode::SUCCESS);
    };

    let config = SplitConfig {
        ratios: cli.split,
        seed: cli.seed,
        output_dir: cli.output_dir,
        scan: scan_config(split_excluded_dirs(cli.exclude_dirs)),
        ..SplitConfig::default()
    };
    let outcome = split_corpus(&cli.root, &config)?;

    print!("{}", outcome.report.render_summary());
    for (label, path) in &outcome.outputs {
        println!("{label}: {}", path.display());
    }
    println!("Report: {}", outcome.report_path.display());
    if outcome.has_errors() {
        println!(
            "Lines or files excluded by validation: {}",
            outcome.scan_errors
        );
    }
    Ok(exit_code(outcome.has_errors()))
}

/// Map a runner result to the process exit code.
///
/// Errors print their display form to stderr (argument errors use clap's own
/// rendering) and exit with status 1.
pub fn exit_with(result: Result<ExitCode, Box<dyn Error>>) -> ExitCode {
    match result {
        Ok(code) => code,
        Err(err) => {
            match err.downcast_ref::<clap::Error>() {
                Some(clap_err) => {
                    let _ = clap_err.print();
                }
                None => eprintln!("error: {err}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn parse_split_ratios_arg(raw: &str) -> Result<SplitRatios, String> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 3 {
        return Err("--split-ratios expects exactly 3 comma-separated values".to_string());
    }
    let parse = |name: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid {name} ratio '{}': must be a float", value.trim()))
    };
    let ratios = SplitRatios {
        train: parse("train", parts[0])?,
        validation: parse("validation", parts[1])?,
        test: parse("test", parts[2])?,
    };
    ratios.normalized().map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_ratios_arg_accepts_three_values() {
        let ratios = parse_split_ratios_arg("0.7, 0.2, 0.1").unwrap();
        assert_eq!(ratios.train, 0.7);
        assert_eq!(ratios.validation, 0.2);
        assert_eq!(ratios.test, 0.1);
    }

    #[test]
    fn split_ratios_arg_rejects_bad_input() {
        assert!(parse_split_ratios_arg("0.8,0.2").is_err());
        assert!(parse_split_ratios_arg("0.8,abc,0.1").is_err());
        assert!(parse_split_ratios_arg("0.8,0.3,0.1").is_err());
        assert!(parse_split_ratios_arg("1.2,-0.1,-0.1").is_err());
    }

    #[test]
    fn parse_cli_returns_none_for_help() {
        let parsed =
            parse_cli::<SplitCli, _>(["corpus_split", "--help"].map(String::from)).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn split_cli_defaults_exclude_known_folder() {
        let cli = parse_cli::<SplitCli, _>(["corpus_split", "corpus"].map(String::from))
            .unwrap()
            .unwrap();
        assert_eq!(
            split_excluded_dirs(cli.exclude_dirs),
            vec![DEFAULT_EXCLUDED_DIR.to_string()]
        );
        assert_eq!(cli.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(cli.seed, None);
    }

    #[test]
    fn split_exclude_dirs_extend_the_default() {
        let cli = parse_cli::<SplitCli, _>(
            [
                "corpus_split",
                "corpus",
                "--exclude-dir",
                "borradores",
                "--exclude-dir",
                DEFAULT_EXCLUDED_DIR,
            ]
            .map(String::from),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            split_excluded_dirs(cli.exclude_dirs),
            vec![DEFAULT_EXCLUDED_DIR.to_string(), "borradores".to_string()]
        );
    }

    #[test]
    fn nothing_to_do_is_a_clean_failure() {
        let temp = tempfile::tempdir().unwrap();
        let output = temp.path().join("out");
        let result = run_split(
            [
                temp.path().display().to_string(),
                "--output-dir".to_string(),
                output.display().to_string(),
            ]
            .into_iter(),
        );
        let err = result.as_ref().unwrap_err();
        assert!(err.to_string().starts_with("nothing to do: "), "{err}");
        assert_eq!(
            format!("{:?}", exit_with(result)),
            format!("{:?}", ExitCode::FAILURE)
        );
        assert_eq!(
            format!("{:?}", exit_with(Ok(ExitCode::SUCCESS))),
            format!("{:?}", ExitCode::SUCCESS)
        );
    }

    #[test]
    fn dedup_cli_flags_map_to_config() {
        let cli = parse_cli::<DedupCli, _>(
            ["corpus_dedup", "corpus", "--apply", "--case-fold"].map(String::from),
        )
        .unwrap()
        .unwrap();
        assert!(cli.apply);
        assert!(cli.case_fold);
    }

    #[test]
    fn unknown_flags_are_errors() {
        assert!(parse_cli::<ValidateCli, _>(["corpus_validate", "--bogus"].map(String::from)).is_err());
    }
}
