//! Diff two LEF models layer-by-layer and print size/fidelity stats for the
//! resulting differential encoding.

use clap::Parser;
use lef::config::LoaderConfig;
use lef::diff::{diff_models, DiffContext};
use lef::loader::{load_model, LoadStrategy};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(about = "Diff a speaker model against a base model")]
struct Args {
    base: PathBuf,
    speaker: PathBuf,

    /// 1 (conservative) through 5 (aggressive).
    #[arg(long, default_value_t = 3)]
    level: u8,
}

fn main() -> ExitCode {
    lef::logging::init_logging();
    let args = Args::parse();

    if !(1..=5).contains(&args.level) {
        eprintln!("--level must be between 1 and 5");
        return ExitCode::FAILURE;
    }

    let config = LoaderConfig::default();
    let base = match load_model(&args.base, LoadStrategy::Eager, &config) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("failed to load base model {}: {e}", args.base.display());
            return ExitCode::FAILURE;
        }
    };
    let speaker = match load_model(&args.speaker, LoadStrategy::Eager, &config) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("failed to load speaker model {}: {e}", args.speaker.display());
            return ExitCode::FAILURE;
        }
    };

    let ctx = DiffContext::optimization_level_to_params(args.level, config.diff.sparsity_threshold);
    let result = match diff_models(&base, &speaker, &ctx) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("diff failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("layers considered: {}", result.stats.layers_considered);
    println!("layers skipped (similar): {}", result.stats.layers_skipped_similar);
    println!("layers diffed: {}", result.stats.layers_diffed);
    println!("dense floats stored: {}", result.stats.dense_floats_stored);
    println!("sparse entries stored: {}", result.stats.sparse_entries_stored);

    ExitCode::SUCCESS
}
