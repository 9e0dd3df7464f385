use std::process::ExitCode;

use bio_corpus::apps::{exit_with, run_split};

fn main() -> ExitCode {
    exit_with(run_split(std::env::args().skip(1)))
}
