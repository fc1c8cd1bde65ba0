//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "trailpack", version, about = "Per-park GPX merge and inspection tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Merge a park directory's GPX pack into one GPX file plus a JSON
    /// metadata document
    Merge {
        /// Park directories to process; outputs are named after each
        /// directory, lowercased
        #[arg(required = true)]
        parks: Vec<PathBuf>,

        /// Directory receiving {name}.json and {name}.gpx (must exist)
        #[arg(long, default_value = "../source")]
        out_dir: PathBuf,

        /// Seed for segment tag generation; random when omitted
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Compare two GeoJSON feature collections, ignoring synthetic id
    /// fields and sub-tolerance geometry jitter
    Compare {
        left: PathBuf,
        right: PathBuf,

        /// Feature property used to match features across the two inputs
        #[arg(long, default_value = "trailsroc-id")]
        id_property: String,

        /// Geometry deltas below this are ignored
        #[arg(long, default_value_t = crate::compare::DEFAULT_TOLERANCE)]
        tolerance: f64,
    },

    /// Round coordinate precision in a GPX file
    Truncate { input: PathBuf, output: PathBuf },
}
