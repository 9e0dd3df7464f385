use std::process::ExitCode;

use bio_corpus::apps::{exit_with, run_extract_entities};

fn main() -> ExitCode {
    exit_with(run_extract_entities(std::env::args().skip(1)))
}
