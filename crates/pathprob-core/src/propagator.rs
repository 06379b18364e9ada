//! P2C Edge-Link Propagator (spec section 4.6): pushes the core-edge
//! labeling outward onto the prefix/suffix "ramps" that lead into the core
//! subgraph, then hands whatever is left over to the edge-link solver.
//!
//! Grounded directly in `p2c_edgelink.py`'s `P2CEdgeLinkInfer`: the
//! confidence check against each path's first/last core edge, the
//! asymmetric forward/reverse dependency registration between the prefix
//! and suffix branches, the reachability closure over those dependencies,
//! and the final `reserved_paths` trim are all carried over unchanged.

use crate::as_id::AsId;
use crate::edge::{DirectedEdge, Distribution, Edge};
use crate::error::Error;
use crate::path::{Path, PathRecord};
use crate::solver::edge_links;
use std::collections::{BTreeMap, BTreeSet};

/// A directed edge implies another directed edge is also P2C once the first
/// one is confirmed: `pred -> succ` means "if `pred` turns out P2C, so does
/// `succ`". Built from the ramp hops of every path that touches the core.
type P2cTopo = BTreeMap<DirectedEdge, BTreeSet<DirectedEdge>>;

pub struct Propagation {
    /// Directed edges confirmed P2C (`from` is provider) by direct
    /// valley-free extension from the core, before the edge-link solver
    /// ever runs.
    pub p2c_set: BTreeSet<DirectedEdge>,
    /// Path fragments left over after every confidently-resolved ramp edge
    /// has been trimmed away; these still need the edge-link solver.
    pub reserved_paths: BTreeMap<Path, u64>,
}

fn directed_distribution(
    core_dist: &BTreeMap<Edge, Distribution>,
    from: &AsId,
    to: &AsId,
) -> Option<Distribution> {
    let (edge, forward) = DirectedEdge::new(from.clone(), to.clone()).canonical();
    core_dist.get(&edge).map(|d| if forward { *d } else { d.reversed() })
}

fn add_list(topo: &mut P2cTopo, hops: &[AsId]) {
    if hops.len() <= 2 {
        return;
    }
    for w in hops.windows(3) {
        let pred = DirectedEdge::new(w[0].clone(), w[1].clone());
        let succ = DirectedEdge::new(w[1].clone(), w[2].clone());
        topo.entry(pred).or_default().insert(succ);
    }
}

fn add_list_rev(topo: &mut P2cTopo, hops: &[AsId]) {
    let rev: Vec<AsId> = hops.iter().rev().cloned().collect();
    add_list(topo, &rev);
}

/// Classify one observed path against the core: find the contiguous run of
/// core edges it touches (same left/right scan as the core-path extractor),
/// then push confidently-resolved P2C calls out along the prefix and suffix
/// ramps, registering topology dependencies for the rest.
fn fold_path(
    hops: &[AsId],
    count: u64,
    core_dist: &BTreeMap<Edge, Distribution>,
    threshold: f64,
    p2c_topo: &mut P2cTopo,
    p2c_seed: &mut BTreeSet<DirectedEdge>,
    temp_paths: &mut BTreeMap<Vec<AsId>, u64>,
) {
    let n = hops.len();
    let mut left: Option<usize> = None;
    let mut right = n - 1;
    for i in 0..n - 1 {
        let in_core =
            core_dist.contains_key(&Edge::canonical(hops[i].clone(), hops[i + 1].clone()));
        match left {
            None if in_core => left = Some(i),
            Some(_) if !in_core => {
                right = i;
                break;
            }
            _ => {}
        }
    }

    let Some(left) = left else {
        // The whole path is outside the core: record it verbatim (and
        // reversed) so the edge-link solver sees both directions.
        add_list(p2c_topo, hops);
        add_list_rev(p2c_topo, hops);
        *temp_paths.entry(hops.to_vec()).or_insert(0) += count;
        return;
    };

    // The L/R scan guarantees hops[left]/hops[left+1] (resp. hops[right-1]/
    // hops[right]) is itself a core edge, so these always resolve.
    let first = directed_distribution(core_dist, &hops[left], &hops[left + 1])
        .unwrap_or(Distribution::UNIFORM);
    if first.p2c >= 1.0 - threshold {
        if left > 0 {
            *temp_paths.entry(hops[..=left].to_vec()).or_insert(0) += count;
        }
        if left > 1 {
            add_list(p2c_topo, &hops[..=left]);
            add_list_rev(p2c_topo, &hops[..=left]);
        }
    } else if left >= 1 {
        p2c_seed.insert(DirectedEdge::new(hops[left].clone(), hops[left - 1].clone()));
        if left > 1 {
            add_list_rev(p2c_topo, &hops[..=left]);
        }
    }

    let last = directed_distribution(core_dist, &hops[right - 1], &hops[right])
        .unwrap_or(Distribution::UNIFORM);
    if last.c2p >= 1.0 - threshold {
        if right < n - 1 {
            *temp_paths.entry(hops[right..].to_vec()).or_insert(0) += count;
        }
        if right < n - 2 {
            add_list(p2c_topo, &hops[right..]);
            add_list_rev(p2c_topo, &hops[right..]);
        }
    } else if right <= n - 2 {
        p2c_seed.insert(DirectedEdge::new(hops[right].clone(), hops[right + 1].clone()));
        if right < n - 2 {
            add_list(p2c_topo, &hops[right..]);
        }
    }
}

/// Reachability closure of `seed` over `topo`: every directed edge the seed
/// set implies, directly or transitively, is also P2C.
fn bfs_closure(seed: BTreeSet<DirectedEdge>, topo: &P2cTopo) -> BTreeSet<DirectedEdge> {
    let mut known: BTreeSet<DirectedEdge> = BTreeSet::new();
    let mut queue: Vec<DirectedEdge> = seed.into_iter().collect();
    while let Some(link) = queue.pop() {
        if !known.insert(link.clone()) {
            continue;
        }
        if let Some(next) = topo.get(&link) {
            for nl in next {
                if !known.contains(nl) {
                    queue.push(nl.clone());
                }
            }
        }
    }
    known
}

/// Trim each leftover path fragment against the now-closed `p2c_set`: drop a
/// confirmed-P2C prefix (matched in reverse) and stop at the first
/// confirmed-P2C edge from the left, keeping only what remains in between.
fn trim_reserved(
    temp_paths: BTreeMap<Vec<AsId>, u64>,
    p2c_set: &BTreeSet<DirectedEdge>,
) -> BTreeMap<Path, u64> {
    let mut reserved: BTreeMap<Path, u64> = BTreeMap::new();
    for (hops, count) in temp_paths {
        let n = hops.len();
        let mut left = 0usize;
        let mut right = n - 1;
        let mut right_frozen = false;
        for i in 0..n - 1 {
            let fwd = DirectedEdge::new(hops[i].clone(), hops[i + 1].clone());
            let rev = fwd.reversed();
            if p2c_set.contains(&rev) {
                left = i + 1;
            }
            if !right_frozen && p2c_set.contains(&fwd) {
                right = i;
                right_frozen = true;
            }
        }
        if right > left {
            let sub = Path::from_validated(hops[left..=right].to_vec());
            *reserved.entry(sub).or_insert(0) += count;
        }
    }
    reserved
}

/// Run the full propagation pass over every observed path.
pub fn propagate(
    records: &[PathRecord],
    core_dist: &BTreeMap<Edge, Distribution>,
    threshold: f64,
) -> Propagation {
    let mut p2c_topo: P2cTopo = BTreeMap::new();
    let mut p2c_seed: BTreeSet<DirectedEdge> = BTreeSet::new();
    let mut temp_paths: BTreeMap<Vec<AsId>, u64> = BTreeMap::new();

    for rec in records {
        fold_path(
            rec.path.hops(),
            rec.count,
            core_dist,
            threshold,
            &mut p2c_topo,
            &mut p2c_seed,
            &mut temp_paths,
        );
    }

    let p2c_set = bfs_closure(p2c_seed, &p2c_topo);
    let reserved_paths = trim_reserved(temp_paths, &p2c_set);

    Propagation {
        p2c_set,
        reserved_paths,
    }
}

/// Assemble the final edge-link distribution map (spec section 4.6): every
/// `p2c_set` edge is certain P2C/C2P, every edge that occurs in exactly one
/// reserved path fragment is uniform, and everything else is routed through
/// the edge-link solver.
///
/// A 2-hop reserved path whose sole edge is itself a single-occurrence edge
/// is excluded from the solver input (it is already fully resolved above);
/// longer fragments are always sent to the solver even if they also contain
/// a single-occurrence edge internally, matching the reference
/// implementation's literal whole-fragment check.
pub fn assemble_edge_link_distribution(
    p2c_set: &BTreeSet<DirectedEdge>,
    reserved_paths: &BTreeMap<Path, u64>,
    time_limit_secs: u64,
) -> Result<BTreeMap<Edge, Distribution>, Error> {
    let mut links_times: BTreeMap<Edge, u64> = BTreeMap::new();
    for path in reserved_paths.keys() {
        for w in path.hops().windows(2) {
            *links_times
                .entry(Edge::canonical(w[0].clone(), w[1].clone()))
                .or_insert(0) += 1;
        }
    }
    let single_links: BTreeSet<Edge> = links_times
        .into_iter()
        .filter(|(_, count)| *count == 1)
        .map(|(edge, _)| edge)
        .collect();

    let mut elinks: BTreeMap<Edge, Distribution> = BTreeMap::new();
    for directed in p2c_set {
        let (edge, forward) = directed.canonical();
        let dist = if forward {
            Distribution::P2C_CERTAIN
        } else {
            Distribution::C2P_CERTAIN
        };
        elinks.insert(edge, dist);
    }
    for edge in &single_links {
        elinks.insert(edge.clone(), Distribution::UNIFORM);
    }

    let solver_paths: Vec<Vec<AsId>> = reserved_paths
        .keys()
        .filter(|path| {
            if path.len() == 2 {
                let hops = path.hops();
                let edge = Edge::canonical(hops[0].clone(), hops[1].clone());
                !single_links.contains(&edge)
            } else {
                true
            }
        })
        .map(|path| path.hops().to_vec())
        .collect();

    let solved = edge_links::solve(&solver_paths, time_limit_secs)?;
    for (edge, label) in solved {
        elinks.insert(edge, Distribution::from_label(label));
    }

    Ok(elinks)
}
