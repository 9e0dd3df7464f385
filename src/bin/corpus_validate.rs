use std::process::ExitCode;

use bio_corpus::apps::{exit_with, run_validate};

fn main() -> ExitCode {
    exit_with(run_validate(std::env::args().skip(1)))
}
