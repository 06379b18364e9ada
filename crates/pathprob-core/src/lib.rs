//! AS-relationship probabilistic inference pipeline.
//!
//! Infers, for every observed AS-to-AS edge, a probability distribution
//! over three mutually exclusive relationship kinds — provider-to-customer,
//! peer-to-peer, and customer-to-provider — from a corpus of observed BGP
//! paths, then scores concrete AS paths against that distribution for
//! route-leak detection.
//!
//! Module layout mirrors the pipeline stages, leaves first: [`reader`] and
//! [`corepath`] produce the core subgraph; [`solver`] formulates and solves
//! both integer programs; [`sampler`] turns the core-link seed into a
//! posterior distribution; [`propagator`] resolves the remaining edges by
//! valley-free extension; [`scorer`] and [`leak_eval`] consume the result.
//! [`pipeline`] wires all of it together behind the cache-skip contract.

pub mod as_id;
pub mod config;
pub mod corepath;
pub mod edge;
pub mod error;
pub mod io_util;
pub mod leak_eval;
pub mod path;
pub mod pipeline;
pub mod propagator;
pub mod reader;
pub mod sampler;
pub mod scorer;
pub mod solver;

pub use edge::{DirectedEdge, Distribution, Edge, Label};
pub use error::{Error, Result};
pub use path::{Path, PathRecord};

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports for callers wiring the pipeline end to end.
pub mod prelude {
    pub use crate::as_id::{AsId, Interner};
    pub use crate::config::PipelineConfig;
    pub use crate::edge::{DirectedEdge, Distribution, Edge, Label};
    pub use crate::error::{Error, Result};
    pub use crate::path::{Path, PathRecord};
    pub use crate::pipeline::{load_combined, run_inference};
    pub use crate::scorer::{is_leak, score_path};
}
