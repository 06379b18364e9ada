//! Gibbs Sampler (spec section 4.5): turns the seed core-edge labeling from
//! the core-link solver into a posterior distribution over relationships by
//! repeatedly resampling every edge's label conditioned on the current
//! labels of its path-adjacent neighbors.
//!
//! Grounded directly in `gibbs_sampling.py`'s `ASGraph`/`GibbsSampling`: the
//! context histogram keyed by `(left, right)` neighbor pairs, the default
//! `last_rel = C2P` / `next_rel = P2C` when a neighbor is absent, and the
//! four-way bucket classification are all carried over unchanged.

use crate::as_id::AsId;
use crate::edge::{DirectedEdge, Distribution, Edge, Label};
use crate::path::Path;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Copy, Debug)]
pub struct SamplerConfig {
    pub burn_in: usize,
    pub n_iter: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            burn_in: 0,
            n_iter: 1000,
        }
    }
}

/// `(left, right)` neighbor identities observed at one position of one path.
type Context = (Option<AsId>, Option<AsId>);

/// Per-edge histogram of how often each `(left, right)` context was
/// observed, weighted by the owning path's count. Positions where the edge
/// is traversed `b -> a` have their context tuple reversed before counting
/// (spec section 4.5).
fn build_context_db(core_paths: &BTreeMap<Path, u64>) -> BTreeMap<Edge, BTreeMap<Context, u64>> {
    let mut db: BTreeMap<Edge, BTreeMap<Context, u64>> = BTreeMap::new();
    for (path, &count) in core_paths {
        let hops = path.hops();
        for i in 0..hops.len().saturating_sub(1) {
            let (edge, forward) =
                DirectedEdge::new(hops[i].clone(), hops[i + 1].clone()).canonical();
            let prev = if i > 0 {
                Some(hops[i - 1].clone())
            } else {
                None
            };
            let next = if i + 2 < hops.len() {
                Some(hops[i + 2].clone())
            } else {
                None
            };
            let context = if forward { (prev, next) } else { (next, prev) };
            *db.entry(edge).or_default().entry(context).or_insert(0) += count;
        }
    }
    db
}

/// Read `labeling`'s canonical label for `{from, to}` as if observed while
/// traveling `from -> to`, flipping P2C/C2P when `from` is the canonical
/// `b` endpoint.
fn label_in_direction(from: &AsId, to: &AsId, labeling: &HashMap<Edge, Label>) -> Option<Label> {
    let (edge, forward) = DirectedEdge::new(from.clone(), to.clone()).canonical();
    labeling
        .get(&edge)
        .map(|&l| crate::solver::maybe_flip(l, !forward))
}

#[derive(Clone, Copy, Default)]
struct Buckets {
    p2c: f64,
    p2p: f64,
    c2p: f64,
}

/// Conditional distribution of edge `e = (a, b)` given the current labels
/// of its context neighbors (spec section 4.5's four-way classification).
fn conditional(
    edge: &Edge,
    contexts: &BTreeMap<Context, u64>,
    labeling: &HashMap<Edge, Label>,
) -> Distribution {
    let mut buckets = Buckets::default();
    for ((left, right), &count) in contexts {
        let last_rel = left
            .as_ref()
            .and_then(|l| label_in_direction(l, &edge.a, labeling))
            .unwrap_or(Label::C2P);
        let next_rel = right
            .as_ref()
            .and_then(|r| label_in_direction(&edge.b, r, labeling))
            .unwrap_or(Label::P2C);
        let weight = count as f64;
        if last_rel == Label::C2P && matches!(next_rel, Label::C2P | Label::P2P) {
            buckets.c2p += weight;
        } else if last_rel == Label::C2P && next_rel == Label::P2C {
            buckets.p2p += weight;
        } else if matches!(last_rel, Label::P2P | Label::P2C) && next_rel == Label::P2C {
            buckets.p2c += weight;
        } else {
            buckets.p2p += weight;
        }
    }
    let total = buckets.p2c + buckets.p2p + buckets.c2p;
    if total == 0.0 {
        Distribution::UNIFORM
    } else {
        Distribution {
            p2c: buckets.p2c / total,
            p2p: buckets.p2p / total,
            c2p: buckets.c2p / total,
        }
    }
}

fn sample_label(dist: Distribution, rng: &mut StdRng) -> Label {
    let draw: f64 = rng.gen();
    if draw < dist.p2c {
        Label::P2C
    } else if draw < dist.p2c + dist.p2p {
        Label::P2P
    } else {
        Label::C2P
    }
}

/// One full pass over every core edge in canonical order, each resampled
/// given the others' current labels (a classical Gibbs sweep).
fn sweep(
    order: &[Edge],
    context_db: &BTreeMap<Edge, BTreeMap<Context, u64>>,
    labeling: &mut HashMap<Edge, Label>,
    rng: &mut StdRng,
) {
    static EMPTY: BTreeMap<Context, u64> = BTreeMap::new();
    for edge in order {
        let contexts = context_db.get(edge).unwrap_or(&EMPTY);
        let dist = conditional(edge, contexts, labeling);
        let label = sample_label(dist, rng);
        labeling.insert(edge.clone(), label);
    }
}

/// Run the sampler to completion and return the per-edge posterior
/// distribution. `seed` comes from the core-link solver (spec section 4.3);
/// its `Other` labels collapse into `P2P` as the sampler's starting state,
/// matching the serialized-code collapse used everywhere else in this
/// pipeline (spec section 9, third open question).
pub fn run(
    core_paths: &BTreeMap<Path, u64>,
    seed: &BTreeMap<Edge, Label>,
    cfg: SamplerConfig,
    rng_seed: u64,
) -> BTreeMap<Edge, Distribution> {
    let context_db = build_context_db(core_paths);
    let order: Vec<Edge> = context_db.keys().cloned().collect();
    if order.is_empty() {
        return BTreeMap::new();
    }

    let mut labeling: HashMap<Edge, Label> = order
        .iter()
        .map(|e| {
            let label = match seed.get(e).copied().unwrap_or(Label::P2P) {
                Label::Other => Label::P2P,
                other => other,
            };
            (e.clone(), label)
        })
        .collect();

    let mut rng = StdRng::seed_from_u64(rng_seed);
    for _ in 0..cfg.burn_in {
        sweep(&order, &context_db, &mut labeling, &mut rng);
    }

    let mut tally: BTreeMap<Edge, (u64, u64, u64)> =
        order.iter().map(|e| (e.clone(), (0, 0, 0))).collect();
    let n_iter = cfg.n_iter.max(1);
    for _ in 0..n_iter {
        sweep(&order, &context_db, &mut labeling, &mut rng);
        for e in &order {
            let counts = tally.get_mut(e).expect("every core edge has a tally slot");
            match labeling[e] {
                Label::P2C => counts.0 += 1,
                Label::P2P | Label::Other => counts.1 += 1,
                Label::C2P => counts.2 += 1,
            }
        }
    }

    let n = n_iter as f64;
    tally
        .into_iter()
        .map(|(e, (p2c, p2p, c2p))| {
            (
                e,
                Distribution {
                    p2c: p2c as f64 / n,
                    p2p: p2p as f64 / n,
                    c2p: c2p as f64 / n,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests;
