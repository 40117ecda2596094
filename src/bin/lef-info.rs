//! Inspect a LEF or LEFX container: print its header, metadata, and layer
//! index, and verify layer checksums.

use clap::Parser;
use lef::config::LoaderConfig;
use lef::extension::load_extension;
use lef::format::LEFX_MAGIC;
use lef::loader::{load_model, verify::verify_layer_checksums, LoadStrategy};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(about = "Print a LEF/LEFX container's header, metadata, and layer index")]
struct Args {
    path: PathBuf,

    /// Use the memory-mapped loader instead of the eager loader.
    #[arg(long)]
    mmap: bool,

    /// Skip checksum verification.
    #[arg(long)]
    no_verify: bool,
}

fn main() -> ExitCode {
    lef::logging::init_logging();
    let args = Args::parse();

    let mut magic = [0u8; 4];
    if let Err(e) = std::fs::File::open(&args.path).and_then(|mut f| f.read_exact(&mut magic)) {
        eprintln!("failed to read {}: {e}", args.path.display());
        return ExitCode::FAILURE;
    }
    let magic = u32::from_le_bytes(magic);

    let result = if magic == LEFX_MAGIC {
        print_extension(&args.path)
    } else {
        print_model(&args)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_model(args: &Args) -> lef::error::LefResult<()> {
    let config = LoaderConfig::default();
    let strategy = if args.mmap { LoadStrategy::Mmap } else { LoadStrategy::Eager };
    let model = load_model(&args.path, strategy, &config)?;

    println!("container: LEF");
    println!("version: {}.{}", model.header.version_major, model.header.version_minor);
    println!("flags: {:?}", model.header.flags);
    println!("file_size: {} bytes", model.header.file_size);
    println!("model_hash: {:#010x}", model.header.model_hash);
    println!();
    println!("name: {}", model.meta.name);
    println!("version: {}", model.meta.version);
    println!("author: {}", model.meta.author);
    if !model.meta.description.is_empty() {
        println!("description: {}", model.meta.description);
    }
    println!(
        "architecture: input={} output={} hidden={} layers={} heads={} vocab={}",
        model.meta.input_dim,
        model.meta.output_dim,
        model.meta.hidden_dim,
        model.meta.num_layers,
        model.meta.num_heads,
        model.meta.vocab_size
    );
    println!(
        "audio: sample_rate={} mel_channels={} hop_length={} win_length={}",
        model.meta.sample_rate, model.meta.mel_channels, model.meta.hop_length, model.meta.win_length
    );
    println!(
        "quantization: default={:?} mixed_precision={}",
        model.meta.default_quantization, model.meta.mixed_precision
    );
    println!();
    println!("layers: {}", model.layer_count());
    for kind_count in model.layer_kind_counts() {
        println!("  {:?}: {}", kind_count.0, kind_count.1);
    }

    if !args.no_verify {
        let backing: &[u8] = model.backing.as_slice();
        verify_layer_checksums(backing, &model.layer_headers, model.header.flags, LoaderConfig::default().checksum_policy)?;
        println!();
        println!("checksums: OK");
    }

    Ok(())
}

fn print_extension(path: &PathBuf) -> lef::error::LefResult<()> {
    let ext = load_extension(path)?;

    println!("container: LEFX");
    println!("extension_id: {}", ext.header.extension_id);
    println!("extension_name: {}", ext.header.extension_name);
    println!("extension_type: {:?}", ext.header.extension_type);
    println!("base_model_name: {}", ext.header.base_model_name);
    println!("base_model_version: {}", ext.header.base_model_version);
    println!(
        "compat: {}.{} - {}.{}",
        ext.meta.compat_min_major,
        ext.meta.compat_min_minor,
        ext.meta.compat_max_major,
        ext.meta.compat_max_minor
    );
    println!("capability_flags: {:#010b}", ext.meta.capability_flags);
    println!("quality_score: {}", ext.meta.quality_score);
    println!("performance_impact: {}", ext.meta.performance_impact);
    println!();
    println!("dependencies: {}", ext.dependencies.len());
    for dep in &ext.dependencies {
        println!("  {} ({:?}, {:?})", dep.name, dep.dependency_type, dep.load_order);
    }
    println!("activation_rules: {}", ext.activation_rules.len());
    println!("layers: {}", ext.layer_headers.len());

    Ok(())
}
