/// Batch sampler entry point
use clap::{Parser, ValueEnum};
use point_cloud_sampler::artifact::JsonArtifactWriter;
use point_cloud_sampler::config::RunConfig;
use point_cloud_sampler::container::FileOpener;
use point_cloud_sampler::manifest::ManifestGenerator;
use point_cloud_sampler::pipeline::Pipeline;
use point_cloud_sampler::sampling::SamplingMode;
use point_cloud_sampler::{Result, SamplerError};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Fixed,
    Ratio,
}

/// Subsample large particle datasets and estimate per-point density for
/// side-by-side model comparison.
#[derive(Debug, Parser)]
#[command(name = "point-cloud-sampler", version)]
struct Cli {
    /// JSON run configuration (subjects, catalogues, parameters). `.hdf5`
    /// inputs need a build with `--features hdf5`.
    #[arg(short, long)]
    config: PathBuf,

    /// Output directory for subject artifacts and the run manifest
    #[arg(short, long, default_value = "docs")]
    out: PathBuf,

    #[arg(long, value_enum)]
    sample_mode: Option<ModeArg>,

    #[arg(long)]
    sample_fixed: Option<usize>,

    #[arg(long)]
    sample_ratio: Option<f64>,

    #[arg(long)]
    sample_min: Option<usize>,

    /// Neighbour count for the density estimate
    #[arg(long)]
    knn_k: Option<usize>,

    /// Base seed for every variant
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    threads: Option<usize>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Hide progress bars
    #[arg(short, long)]
    quiet: bool,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Command line values override the file.
    fn apply_overrides(&self, config: &mut RunConfig) {
        let params = &mut config.params;
        if let Some(mode) = self.sample_mode {
            params.sampling.mode = match mode {
                ModeArg::Fixed => SamplingMode::Fixed,
                ModeArg::Ratio => SamplingMode::Ratio,
            };
        }
        if let Some(count) = self.sample_fixed {
            params.sampling.fixed_count = count;
        }
        if let Some(ratio) = self.sample_ratio {
            params.sampling.ratio = ratio;
        }
        if let Some(minimum) = self.sample_min {
            params.sampling.minimum = minimum;
        }
        if let Some(k) = self.knn_k {
            params.density.k = k;
        }
        if let Some(seed) = self.seed {
            params.seed_base = seed;
        }
        if let Some(threads) = self.threads {
            params.threads = Some(threads);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let start = Instant::now();

    let mut config = RunConfig::load(&cli.config)?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if let Some(threads) = config.params.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| SamplerError::config(format!("thread pool: {e}")))?;
    }

    let subjects = config.resolve_subjects();
    info!(
        subjects = subjects.len(),
        mode = ?config.params.sampling.mode,
        out = %cli.out.display(),
        "starting batch"
    );

    let opener = FileOpener;
    let mut writer = JsonArtifactWriter::new(&cli.out)?;
    let outcome = Pipeline::new(&config.params, &opener)
        .with_progress(!cli.quiet)
        .run(&subjects, &mut writer);

    ManifestGenerator::new(&cli.out).generate(&outcome, &config.params)?;

    info!(
        produced = outcome.produced.len(),
        skipped = outcome.skipped.len(),
        elapsed_secs = start.elapsed().as_secs_f64(),
        "batch complete"
    );
    Ok(())
}
