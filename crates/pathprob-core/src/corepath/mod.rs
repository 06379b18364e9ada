//! Core-Path Extractor (spec section 4.2).
//!
//! Builds a directed adjacency graph whose nodes are canonical edges rather
//! than ASes: for every pair of consecutive edges on an observed path of
//! length at least three, one is recorded as lying to the left or right of
//! the other, relative to that edge's own canonical `(min, max)` frame. An
//! edge is iteratively pruned once it has no recorded neighbor on one side,
//! until a fixed point is reached; the survivors are the core subgraph. A
//! second pass over every input path (including length-two paths) then
//! extracts the maximal contiguous substring that lies inside the core
//! subgraph and folds it into the output path/count map.
//!
//! Swapping which fixed frame each edge uses (first-observed orientation,
//! as upstream does it, versus the lexicographic canonical orientation used
//! here) only relabels which bucket is "left" and which is "right" for that
//! edge; it cannot change whether a bucket is empty, so the pruning fixed
//! point — and therefore the extracted core paths — is identical either way.

use crate::as_id::Interner;
use crate::edge::Edge;
use crate::error::Error;
use crate::path::{Path, PathRecord};
use crate::reader::PathReader;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Result of a from-scratch extraction. `core_edges` and `clinks` are
/// diagnostic: nothing downstream of the extractor consumes them, only
/// `core_paths` does (solver and sampler both rebuild their own graphs from
/// the path/count map). When an extraction is skipped because the cache
/// file already exists, both diagnostic sets come back empty.
#[derive(Debug, Default)]
pub struct CoreExtraction {
    pub core_paths: BTreeMap<Path, u64>,
    pub core_edges: BTreeSet<Edge>,
    pub clinks: BTreeSet<Edge>,
}

#[derive(Default, Clone)]
struct Sides {
    left: BTreeSet<Edge>,
    right: BTreeSet<Edge>,
}

fn orient(a: &crate::as_id::AsId, b: &crate::as_id::AsId) -> (Edge, bool) {
    if a < b {
        (Edge::canonical(a.clone(), b.clone()), true)
    } else {
        (Edge::canonical(a.clone(), b.clone()), false)
    }
}

/// Build the edge-adjacency graph from every path of length >= 3, then prune
/// to a fixed point. Mirrors the upstream two-sweep `get_core_path`
/// structure, generalized to use each edge's lexicographic frame instead of
/// its first-observed one (see module doc for why that is equivalent).
fn build_core_edges(files: &[PathBuf], interner: &mut Interner) -> Result<BTreeSet<Edge>, Error> {
    let mut graph: BTreeMap<Edge, Sides> = BTreeMap::new();
    let mut reader = PathReader::new(files.to_vec(), interner);
    for rec in &mut reader {
        let rec = rec?;
        let hops = rec.path.hops();
        if hops.len() < 3 {
            continue;
        }
        for w in hops.windows(3) {
            let (e_i, fwd_i) = orient(&w[0], &w[1]);
            let (e_j, fwd_j) = orient(&w[1], &w[2]);
            graph.entry(e_i.clone()).or_default();
            graph.entry(e_j.clone()).or_default();
            if fwd_i {
                graph.get_mut(&e_i).unwrap().right.insert(e_j.clone());
            } else {
                graph.get_mut(&e_i).unwrap().left.insert(e_j.clone());
            }
            if fwd_j {
                graph.get_mut(&e_j).unwrap().left.insert(e_i.clone());
            } else {
                graph.get_mut(&e_j).unwrap().right.insert(e_i.clone());
            }
        }
    }

    loop {
        let dangling: Vec<Edge> = graph
            .iter()
            .filter(|(_, s)| s.left.is_empty() || s.right.is_empty())
            .map(|(e, _)| e.clone())
            .collect();
        if dangling.is_empty() {
            break;
        }
        for e in &dangling {
            if let Some(sides) = graph.remove(e) {
                for n in sides.left.iter().chain(sides.right.iter()) {
                    if let Some(n_sides) = graph.get_mut(n) {
                        n_sides.left.remove(e);
                        n_sides.right.remove(e);
                    }
                }
            }
        }
    }

    Ok(graph.into_keys().collect())
}

/// Second sweep: re-read every input path (any length >= 2) and fold the
/// maximal contiguous run of core edges into `core_paths`, recording the
/// first core edge of each such run into `clinks`.
fn extract_core_paths(
    files: &[PathBuf],
    interner: &mut Interner,
    core_edges: &BTreeSet<Edge>,
) -> Result<(BTreeMap<Path, u64>, BTreeSet<Edge>), Error> {
    let mut core_paths: BTreeMap<Path, u64> = BTreeMap::new();
    let mut clinks: BTreeSet<Edge> = BTreeSet::new();
    let mut reader = PathReader::new(files.to_vec(), interner);
    for rec in &mut reader {
        let PathRecord { path, count } = rec?;
        let hops = path.hops();
        let mut left: Option<usize> = None;
        let mut right = hops.len() - 1;
        for i in 0..hops.len() - 1 {
            let (e, _) = orient(&hops[i], &hops[i + 1]);
            let in_core = core_edges.contains(&e);
            match left {
                None if in_core => {
                    left = Some(i);
                    clinks.insert(e);
                }
                Some(_) if !in_core => {
                    right = i;
                    break;
                }
                _ => {}
            }
        }
        if let Some(l) = left {
            let sub = path.slice(l, right);
            *core_paths.entry(sub).or_insert(0) += count;
        }
    }
    Ok((core_paths, clinks))
}

/// Extract the core subgraph and core paths from `files`, or load a
/// previously cached `core_paths` map verbatim from `cache_path` if it
/// already exists (spec section 5's cache-skip contract).
pub fn extract_or_load(
    cache_path: &std::path::Path,
    files: &[PathBuf],
    interner: &mut Interner,
) -> Result<CoreExtraction, Error> {
    if cache_path.exists() {
        let records = crate::io_util::read_path_records(cache_path, interner)?;
        let mut core_paths = BTreeMap::new();
        for r in records {
            *core_paths.entry(r.path).or_insert(0) += r.count;
        }
        return Ok(CoreExtraction {
            core_paths,
            core_edges: BTreeSet::new(),
            clinks: BTreeSet::new(),
        });
    }
    let core_edges = build_core_edges(files, interner)?;
    let (core_paths, clinks) = extract_core_paths(files, interner, &core_edges)?;
    let records: Vec<PathRecord> = core_paths
        .iter()
        .map(|(p, c)| PathRecord {
            path: p.clone(),
            count: *c,
        })
        .collect();
    crate::io_util::write_path_records(cache_path, records.iter())?;
    Ok(CoreExtraction {
        core_paths,
        core_edges,
        clinks,
    })
}

#[cfg(test)]
mod tests;
