//! Pipeline-wide configuration (spec section 3.3 of SPEC_FULL): the knobs
//! named as defaults throughout spec.md, gathered into one struct so the CLI
//! can derive `clap::Args` overrides on top of an optional TOML file.

use serde::{Deserialize, Serialize};

/// Default solver time budget (spec section 4.3), in seconds.
pub const DEFAULT_SOLVER_TIME_LIMIT_SECS: u64 = 1800;
/// Default Gibbs sampler burn-in (spec section 4.5); untested upstream
/// beyond 0 (spec section 9, second open question).
pub const DEFAULT_BURN_IN: usize = 0;
/// Default number of post-burn-in Gibbs sweeps (spec section 4.5).
pub const DEFAULT_N_ITER: usize = 1000;
/// Default propagator confidence threshold (spec section 4.6).
pub const DEFAULT_PROPAGATOR_THRESHOLD: f64 = 0.8;
/// Default leak-detector threshold (spec section 4.7 / 6).
pub const DEFAULT_LEAK_THRESHOLD: f64 = 0.4;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// IP solver time budget, in seconds, shared by both the core-link and
    /// edge-link formulations (spec section 4.3/4.4).
    pub solver_time_limit_secs: u64,
    /// Gibbs sampler sweeps discarded before tallying (spec section 4.5).
    pub burn_in: usize,
    /// Gibbs sampler sweeps tallied into the posterior frequency vector.
    pub n_iter: usize,
    /// Deterministic seed for the Gibbs sampler's pseudo-random source
    /// (spec section 4.5's reproducibility requirement).
    pub rng_seed: u64,
    /// `th` in the P2C edge-link propagator's confidence fold (spec section
    /// 4.6); the reference implementation calls this threshold `th` too.
    pub propagator_threshold: f64,
    /// `th` in the leak detector: a path scores below this is flagged as a
    /// leak (spec section 4.7).
    pub leak_threshold: f64,
    /// Directory holding the cache files named in spec section 5
    /// (`corepath.txt`, `core_link.txt`, `edge_link.txt`, `p2c_set.txt`,
    /// `reserved_paths.txt`, `pathprob.txt`).
    pub cache_dir: std::path::PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            solver_time_limit_secs: DEFAULT_SOLVER_TIME_LIMIT_SECS,
            burn_in: DEFAULT_BURN_IN,
            n_iter: DEFAULT_N_ITER,
            rng_seed: 0,
            propagator_threshold: DEFAULT_PROPAGATOR_THRESHOLD,
            leak_threshold: DEFAULT_LEAK_THRESHOLD,
            cache_dir: std::path::PathBuf::from("."),
        }
    }
}

impl PipelineConfig {
    pub fn corepath_cache(&self) -> std::path::PathBuf {
        self.cache_dir.join("corepath.txt")
    }

    pub fn core_link_cache(&self) -> std::path::PathBuf {
        self.cache_dir.join("core_link.txt")
    }

    pub fn init_core_link_cache(&self) -> std::path::PathBuf {
        self.cache_dir.join("init_core_link.txt")
    }

    pub fn edge_link_cache(&self) -> std::path::PathBuf {
        self.cache_dir.join("edge_link.txt")
    }

    pub fn p2c_set_cache(&self) -> std::path::PathBuf {
        self.cache_dir.join("p2c_set.txt")
    }

    pub fn reserved_paths_cache(&self) -> std::path::PathBuf {
        self.cache_dir.join("reserved_paths.txt")
    }

    pub fn combined_cache(&self) -> std::path::PathBuf {
        self.cache_dir.join("pathprob.txt")
    }
}
