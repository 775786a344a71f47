//! # cecog
//!
//! Command-line tools for screening metadata and annotations.
//!
//! ## Usage
//!
//! ```bash
//! # Check a plate mapping against the positions of an experiment
//! cecog mapping validate mappings/plate01.txt --positions 0001,0002,0003
//!
//! # Import all marker files of a screen, one slice every 4 frames
//! cecog annotation import annotations/ --frame-step 4
//!
//! # 36 frames at 270 s per frame in hours
//! cecog time 36 --from frames --to hours -t 270
//!
//! # Correct classification tracks
//! cecog hmm smooth tracks.tsv --classes classes.txt --fit -o corrected.tsv
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity
    cli::init_logging(cli.verbosity());

    cli::dispatch(cli)
}
