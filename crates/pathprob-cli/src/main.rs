use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pathprob_core::config::PipelineConfig;
use pathprob_core::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

mod provenance;

#[derive(Parser)]
#[command(name = "pathprob")]
#[command(about = "AS-relationship probabilistic inference and leak-detection pipeline")]
struct Cli {
    /// Optional TOML file of `PipelineConfig` overrides, merged underneath
    /// the flags below.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    action: Action,
}

/// CLI overrides for `PipelineConfig` (spec section 3.3 of SPEC_FULL): every
/// field is optional here and merged on top of the TOML file (if any) and
/// the library's own defaults.
#[derive(Args, Debug, Default)]
struct ConfigOverrides {
    /// Directory holding the cache files named in spec section 5.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
    /// IP solver time budget in seconds (default 1800).
    #[arg(long, global = true)]
    solver_time_limit_secs: Option<u64>,
    /// Gibbs sampler sweeps discarded before tallying (default 0).
    #[arg(long, global = true)]
    burn_in: Option<usize>,
    /// Gibbs sampler sweeps tallied into the posterior (default 1000).
    #[arg(long, global = true)]
    n_iter: Option<usize>,
    /// Deterministic seed for the Gibbs sampler's RNG.
    #[arg(long, global = true)]
    rng_seed: Option<u64>,
    /// P2C propagator confidence threshold (default 0.8).
    #[arg(long, global = true)]
    propagator_threshold: Option<f64>,
    /// Leak-detector threshold (default 0.4).
    #[arg(long, global = true)]
    leak_threshold: Option<f64>,
}

impl ConfigOverrides {
    fn apply(self, mut cfg: PipelineConfig) -> PipelineConfig {
        if let Some(v) = self.cache_dir {
            cfg.cache_dir = v;
        }
        if let Some(v) = self.solver_time_limit_secs {
            cfg.solver_time_limit_secs = v;
        }
        if let Some(v) = self.burn_in {
            cfg.burn_in = v;
        }
        if let Some(v) = self.n_iter {
            cfg.n_iter = v;
        }
        if let Some(v) = self.rng_seed {
            cfg.rng_seed = v;
        }
        if let Some(v) = self.propagator_threshold {
            cfg.propagator_threshold = v;
        }
        if let Some(v) = self.leak_threshold {
            cfg.leak_threshold = v;
        }
        cfg
    }
}

#[derive(Subcommand)]
enum Action {
    /// Run the full inference pipeline over one or more path files,
    /// producing the combined probability file under `--cache-dir`.
    Infer {
        /// Input path files (spec section 4.1), concatenated as one stream.
        inputs: Vec<PathBuf>,
    },
    /// Score one or more AS paths against a previously inferred (or
    /// freshly rerun) probability map.
    Score {
        /// `AS1|AS2|...|ASn`-formatted paths to score.
        paths: Vec<String>,
        /// Rerun inference first instead of loading the cached combined
        /// file.
        #[arg(long)]
        inputs: Vec<PathBuf>,
    },
    /// Run the leak-detection evaluation harness (SPEC_FULL section 4) over
    /// a root directory of per-date `valid_path/`/`leak_path/` subtrees.
    LeakEval {
        /// Root directory of per-date collector subdirectories.
        root: PathBuf,
        /// Rerun inference first instead of loading the cached combined
        /// file.
        #[arg(long)]
        inputs: Vec<PathBuf>,
        /// Write the result JSON here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn load_config(config_path: &Option<PathBuf>, overrides: ConfigOverrides) -> Result<PipelineConfig> {
    let base = match config_path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("reading config file {}", p.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing config file {}", p.display()))?
        }
        None => PipelineConfig::default(),
    };
    Ok(overrides.apply(base))
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cli = Cli::parse();
    let cfg = load_config(&cli.config, cli.overrides)?;
    match cli.action {
        Action::Infer { inputs } => infer(inputs, &cfg),
        Action::Score { paths, inputs } => score(paths, inputs, &cfg),
        Action::LeakEval { root, inputs, out } => leak_eval(root, inputs, out, &cfg),
    }
}

fn infer(inputs: Vec<PathBuf>, cfg: &PipelineConfig) -> Result<()> {
    tracing::info!(inputs = ?inputs, cache_dir = ?cfg.cache_dir, "infer");
    let combined = pathprob_core::pipeline::run_inference(&inputs, cfg)
        .map_err(anyhow::Error::from)
        .context("running inference pipeline")?;
    tracing::info!(edges = combined.len(), "inference complete");

    let out_path = cfg.combined_cache();
    provenance::write_sidecar(
        &out_path,
        provenance::Payload::new(json!({
            "inputs": inputs,
            "solver_time_limit_secs": cfg.solver_time_limit_secs,
            "burn_in": cfg.burn_in,
            "n_iter": cfg.n_iter,
            "rng_seed": cfg.rng_seed,
            "propagator_threshold": cfg.propagator_threshold,
            "edges": combined.len(),
        })),
    )?;
    println!("{}", out_path.display());
    Ok(())
}

fn load_or_infer(inputs: &[PathBuf], cfg: &PipelineConfig) -> Result<(pathprob_core::as_id::Interner, std::collections::BTreeMap<Edge, Distribution>)> {
    let mut interner = pathprob_core::as_id::Interner::new();
    if inputs.is_empty() {
        let dist = pathprob_core::pipeline::load_combined(cfg, &mut interner)
            .map_err(anyhow::Error::from)
            .context("loading combined probability file (pass --inputs to rerun inference)")?;
        Ok((interner, dist))
    } else {
        let dist = pathprob_core::pipeline::run_inference(inputs, cfg)
            .map_err(anyhow::Error::from)
            .context("running inference pipeline")?;
        Ok((interner, dist))
    }
}

fn score(paths: Vec<String>, inputs: Vec<PathBuf>, cfg: &PipelineConfig) -> Result<()> {
    let (mut interner, dist) = load_or_infer(&inputs, cfg)?;
    let mut results = Vec::with_capacity(paths.len());
    for raw in &paths {
        let hops: Vec<_> = raw.split('|').map(|s| interner.intern(s)).collect();
        let s = pathprob_core::scorer::score_path(&hops, &dist);
        let leak = s < cfg.leak_threshold;
        tracing::info!(path = raw, score = s, leak, "scored");
        results.push(json!({ "path": raw, "score": s, "leak": leak }));
    }
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn leak_eval(root: PathBuf, inputs: Vec<PathBuf>, out: Option<PathBuf>, cfg: &PipelineConfig) -> Result<()> {
    let (mut interner, dist) = load_or_infer(&inputs, cfg)?;
    let dates = pathprob_core::leak_eval::discover_date_dirs(&root)
        .map_err(anyhow::Error::from)
        .with_context(|| format!("discovering date directories under {}", root.display()))?;
    tracing::info!(dates = dates.len(), root = ?root, "leak-eval");
    let result = pathprob_core::leak_eval::evaluate(&dates, &dist, cfg.leak_threshold, &mut interner)
        .map_err(anyhow::Error::from)
        .context("running leak-detection evaluation")?;
    let text = serde_json::to_string_pretty(&result)?;
    match &out {
        Some(path) => {
            write_text(path, &text)?;
            provenance::write_sidecar(
                path,
                provenance::Payload::new(json!({
                    "root": root,
                    "leak_threshold": cfg.leak_threshold,
                    "dates": dates.iter().map(|d| &d.date).collect::<Vec<_>>(),
                })),
            )?;
            println!("{}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
    }
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}
