use std::process::ExitCode;

use bio_corpus::apps::{exit_with, run_dedup};

fn main() -> ExitCode {
    exit_with(run_dedup(std::env::args().skip(1)))
}
