use std::collections::HashSet;
use std::fs;
use std::path::Path;

use bio_corpus::config::{DedupConfig, DedupMode, ScanConfig, SplitConfig};
use bio_corpus::constants::splits::DEFAULT_EXCLUDED_DIR;
use bio_corpus::{
    CorpusScan, CorpusWalker, EntityAccumulator, SplitLabel, TagSchema, ValidationSummary,
    dedup_corpus, split_corpus,
};

fn record_line(tokens: &[&str], tags: &[i64]) -> String {
    let tokens: Vec<String> = tokens.iter().map(|t| format!("\"{t}\"")).collect();
    let tags: Vec<String> = tags.iter().map(ToString::to_string).collect();
    format!(
        "{{\"sentencia\": [{}], \"tag\": [{}]}}",
        tokens.join(", "),
        tags.join(", ")
    )
}

fn write_history(root: &Path, name: &str, lines: &[String]) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut text = lines.join("\n");
    text.push('\n');
    fs::write(path, text).unwrap();
}

/// Twelve histories: each has two unique sentences and one shared sentence.
fn build_corpus(root: &Path) {
    let shared = record_line(&["no", "cambios"], &[48, 48]);
    for idx in 0..12 {
        let dir = if idx % 2 == 0 { "oncologia" } else { "revision" };
        write_history(
            root,
            &format!("{dir}/historia_{idx:02}.json"),
            &[
                record_line(&["her2", "+3", "caso", &idx.to_string()], &[15, 38, 48, 2]),
                shared.clone(),
                record_line(&["paciente", &format!("p{idx}")], &[48, 48]),
            ],
        );
    }
    write_history(
        root,
        &format!("{DEFAULT_EXCLUDED_DIR}/pendiente.json"),
        &[record_line(&["sin", "revisar"], &[48, 48])],
    );
}

#[test]
fn validate_dedup_then_split_keeps_every_unique_sentence() {
    let temp = tempfile::tempdir().unwrap();
    let corpus = temp.path().join("corpus");
    build_corpus(&corpus);

    let scan_config = ScanConfig {
        excluded_dirs: vec![DEFAULT_EXCLUDED_DIR.to_string()],
        ..ScanConfig::default()
    };
    let scan = CorpusScan::scan(&CorpusWalker::from_config(&corpus, &scan_config)).unwrap();
    let summary = ValidationSummary::from_scan(&scan);
    assert_eq!(summary.total_files(), 12);
    assert!(!summary.has_errors());

    let dedup_config = DedupConfig {
        mode: DedupMode::Apply,
        report_dir: Some(temp.path().join("reports")),
        scan: scan_config.clone(),
        ..DedupConfig::default()
    };
    let dedup = dedup_corpus(&corpus, &dedup_config).unwrap();
    assert_eq!(dedup.groups.groups.len(), 1);
    let group = &dedup.groups.groups[0];
    assert_eq!(group.len(), 12);
    assert_eq!(
        group.kept().source,
        corpus.join("oncologia/historia_00.json")
    );
    assert_eq!(dedup.applied.as_ref().unwrap().removed_count(), 11);
    let report = fs::read_to_string(dedup.report_path.as_ref().unwrap()).unwrap();
    assert!(report.contains("Removed entries: 11"));
    assert!(report.contains("Files modified: 11"));

    let again = dedup_corpus(&corpus, &dedup_config).unwrap();
    assert!(again.groups.is_unique());

    let output_dir = corpus.join("output_data");
    let split_config = SplitConfig {
        seed: Some(42),
        output_dir: output_dir.clone(),
        ..SplitConfig::default()
    };
    let outcome = split_corpus(&corpus, &split_config).unwrap();
    assert!(!outcome.has_errors());
    assert_eq!(outcome.report.total_files(), 12);
    assert_eq!(outcome.report.total_records(), 12 * 2 + 1);

    let mut seen = HashSet::new();
    for (label, path) in &outcome.outputs {
        let text = fs::read_to_string(path).unwrap();
        for line in text.lines() {
            assert!(seen.insert(line.to_string()), "{label} repeats {line}");
            assert!(!line.contains("sin"), "excluded folder leaked into {label}");
        }
    }
    assert_eq!(seen.len(), 25);

    let counts: Vec<(SplitLabel, usize)> = outcome
        .report
        .shares
        .iter()
        .map(|share| (share.label, share.files))
        .collect();
    assert_eq!(
        counts,
        vec![
            (SplitLabel::Train, 9),
            (SplitLabel::Validation, 1),
            (SplitLabel::Test, 2)
        ]
    );

    let detailed = fs::read_to_string(&outcome.report_path).unwrap();
    for idx in 0..12 {
        assert!(detailed.contains(&format!("historia_{idx:02}.json")));
    }
}

#[test]
fn split_is_reproducible_and_ignores_its_own_output() {
    let temp = tempfile::tempdir().unwrap();
    let corpus = temp.path().join("corpus");
    build_corpus(&corpus);

    let config = SplitConfig {
        seed: Some(7),
        output_dir: corpus.join("output_data"),
        ..SplitConfig::default()
    };
    let first = split_corpus(&corpus, &config).unwrap();
    let first_test = fs::read_to_string(&first.outputs[2].1).unwrap();

    // Second run sees the first run's outputs under the root; they must be skipped.
    let second = split_corpus(&corpus, &config).unwrap();
    assert_eq!(second.report.total_files(), 12);
    assert_eq!(fs::read_to_string(&second.outputs[2].1).unwrap(), first_test);
    assert_eq!(first.report.files, second.report.files);
}

#[test]
fn invalid_lines_are_reported_and_excluded_downstream() {
    let temp = tempfile::tempdir().unwrap();
    let corpus = temp.path();
    write_history(
        corpus,
        "a.json",
        &[
            record_line(&["fecha", "2020"], &[48, 2]),
            "{\"sentencia\": [\"a\", \"b\"], \"tag\": [0]}".to_string(),
            "not json".to_string(),
        ],
    );

    let scan = CorpusScan::scan(&CorpusWalker::new(corpus)).unwrap();
    let summary = ValidationSummary::from_scan(&scan);
    assert_eq!(summary.invalid_files(), 1);
    assert_eq!(summary.total_errors(), 2);

    let entities = EntityAccumulator::from_scan(&scan, TagSchema::clinical());
    assert_eq!(entities.records, 1);
    assert_eq!(entities.total_entities(), 1);
    assert!(entities.corpus["DATE"].contains("2020"));
}
