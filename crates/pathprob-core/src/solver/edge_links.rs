//! Edge-link integer program (spec section 4.4): the simpler IP used on the
//! non-core single-visit path fragments left over after the P2C propagator
//! has handled everything it can by direct valley-free extension.

use super::{build_directed_index, canonical_decode_plan, maybe_flip, Model};
use crate::as_id::AsId;
use crate::edge::{Edge, Label};
use crate::error::Error;
use good_lp::Expression;
use std::collections::{BTreeMap, BTreeSet};

const COMPONENT: &str = "edge-link solver";

pub fn solve(paths: &[Vec<AsId>], time_limit_secs: u64) -> Result<BTreeMap<Edge, Label>, Error> {
    let hops: Vec<&[AsId]> = paths.iter().map(|p| p.as_slice()).collect();
    let index = build_directed_index(hops.into_iter());
    let n = index.idx2edge.len();
    if n == 0 {
        return Ok(BTreeMap::new());
    }

    let mut model = Model::new();
    let x = model.add_binary_vars(n);
    let y = model.add_binary_vars(n);

    for i in 0..n {
        model.add_constraint((y[i] - x[i]).geq(0.0));
    }

    for &(i1, i2) in &index.reverse_pairs {
        model.add_constraint((x[i1] - x[i2]).eq(0.0));
        model.add_constraint((y[i1] + y[i2] - x[i1]).eq(1.0));
    }

    let mut idx_pair: BTreeSet<(usize, usize)> = BTreeSet::new();
    for idx_path in &index.idx_paths {
        let path_expr = idx_path
            .iter()
            .fold(Expression::from(0.0), |acc, &i| acc + x[i]);
        model.add_constraint(path_expr.leq(1.0));
        for w in idx_path.windows(2) {
            idx_pair.insert((w[0], w[1]));
        }
    }
    for (i, j) in idx_pair {
        model.add_constraint((y[j] - y[i]).geq(0.0));
        model.add_constraint((y[j] - x[j] - y[i] + x[i]).geq(0.0));
    }

    let objective = index
        .idx_paths
        .iter()
        .filter_map(|p| p.first())
        .fold(Expression::from(0.0), |acc, &first| acc - x[first]);
    let solved = model.minimize(objective, time_limit_secs, COMPONENT)?;

    let plan = canonical_decode_plan(&index);
    let mut out = BTreeMap::new();
    for (edge, (i, flip)) in plan {
        let xi = solved.is_one(x[i]);
        let yi = solved.is_one(y[i]);
        let label = if xi {
            Label::P2P
        } else if yi {
            Label::P2C
        } else {
            Label::C2P
        };
        out.insert(edge, maybe_flip(label, flip));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::as_id::Interner;

    #[test]
    fn single_edge_path_has_no_adjacency_constraint() {
        let mut it = Interner::new();
        let a = it.intern("A");
        let b = it.intern("B");
        let paths = vec![vec![a, b]];
        let result = solve(&paths, 30).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_map() {
        let result = solve(&[], 30).unwrap();
        assert!(result.is_empty());
    }
}
