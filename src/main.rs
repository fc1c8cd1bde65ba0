use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::process::ExitCode;
use trailpack::cli::{Cli, Command};
use trailpack::{compare, pipeline, truncate};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Merge {
            parks,
            out_dir,
            seed,
        } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            for park_dir in &parks {
                let name = pipeline::park_slug(park_dir)?;
                let (merged, meta) = pipeline::gather(park_dir, &mut rng)?;
                pipeline::write_outputs(&out_dir, &name, &merged, &meta)?;
                tracing::info!(park = %name, trails = meta.trails.len(), "merged park");
            }
        }
        Command::Compare {
            left,
            right,
            id_property,
            tolerance,
        } => {
            let report = compare::compare_files(&left, &right, &id_property, tolerance)?;
            if report.is_clean() {
                tracing::info!("no meaningful differences");
            } else {
                print!("{report}");
            }
        }
        Command::Truncate { input, output } => truncate::truncate_file(&input, &output)?,
    }
    Ok(())
}
