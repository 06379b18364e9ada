//! Integer-program solver abstraction (spec section 4.3/4.4 and the design
//! note on a swappable IP solver).
//!
//! A thin wrapper around `good_lp` with the HiGHS backend, shaped like the
//! reference Python `_Solver` helper: add binary variables, add linear
//! constraints, set an objective, optimize under a time limit, read back
//! variable values. Swapping the concrete backend means swapping the
//! `.using(..)` call in [`Model::minimize`]/[`Model::maximize`]; nothing in
//! `core_links` or `edge_links` depends on `good_lp` directly, only on this
//! module's `Model`/`Solved` types.

pub mod core_links;
pub mod edge_links;

use crate::as_id::AsId;
use crate::edge::{DirectedEdge, Edge, Label};
use crate::error::Error;
use good_lp::{variable, Expression, ResolutionError, Solution as _, SolverModel, Variable};
use std::collections::{BTreeMap, HashMap};

pub struct Model {
    vars: good_lp::ProblemVariables,
    constraints: Vec<good_lp::Constraint>,
}

impl Model {
    pub fn new() -> Self {
        Self {
            vars: good_lp::ProblemVariables::new(),
            constraints: Vec::new(),
        }
    }

    pub fn add_binary_vars(&mut self, n: usize) -> Vec<Variable> {
        (0..n).map(|_| self.vars.add(variable().binary())).collect()
    }

    pub fn add_constraint(&mut self, constraint: good_lp::Constraint) {
        self.constraints.push(constraint);
    }

    pub fn minimize(
        self,
        objective: Expression,
        time_limit_secs: u64,
        component: &'static str,
    ) -> Result<Solved, Error> {
        let mut problem = self
            .vars
            .minimise(objective)
            .using(good_lp::solvers::highs::highs);
        problem.set_time_limit(time_limit_secs as f64);
        for c in self.constraints {
            problem = problem.with(c);
        }
        let solution = problem
            .solve()
            .map_err(|err| translate_err(err, component))?;
        Ok(Solved {
            solution: Box::new(solution),
        })
    }

    pub fn maximize(
        self,
        objective: Expression,
        time_limit_secs: u64,
        component: &'static str,
    ) -> Result<Solved, Error> {
        let mut problem = self
            .vars
            .maximise(objective)
            .using(good_lp::solvers::highs::highs);
        problem.set_time_limit(time_limit_secs as f64);
        for c in self.constraints {
            problem = problem.with(c);
        }
        let solution = problem
            .solve()
            .map_err(|err| translate_err(err, component))?;
        Ok(Solved {
            solution: Box::new(solution),
        })
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

fn translate_err(err: ResolutionError, component: &'static str) -> Error {
    match err {
        ResolutionError::Infeasible => Error::SolverInfeasible { component },
        _ => Error::SolverTimeout { component },
    }
}

pub struct Solved {
    solution: Box<dyn good_lp::Solution>,
}

impl Solved {
    pub fn value(&self, var: Variable) -> f64 {
        self.solution.value(var)
    }

    /// `true` when a binary variable's relaxed value rounds to 1.
    pub fn is_one(&self, var: Variable) -> bool {
        self.value(var) > 0.5
    }
}

/// Every distinct directed edge touched by a set of paths, indexed in
/// first-appearance order (deterministic given paths iterated in a fixed
/// order, e.g. the `core_paths` `BTreeMap`'s own key order).
pub struct DirectedIndex {
    pub idx2edge: Vec<DirectedEdge>,
    idx_of: HashMap<DirectedEdge, usize>,
    /// Per input path, the sequence of directed-edge indices in path order.
    pub idx_paths: Vec<Vec<usize>>,
    /// `(forward_idx, backward_idx)` pairs for every canonical edge observed
    /// in both directions.
    pub reverse_pairs: Vec<(usize, usize)>,
}

pub fn build_directed_index<'a>(paths: impl Iterator<Item = &'a [AsId]>) -> DirectedIndex {
    let mut idx2edge = Vec::new();
    let mut idx_of: HashMap<DirectedEdge, usize> = HashMap::new();
    let mut idx_paths = Vec::new();
    for hops in paths {
        let mut idx_path = Vec::with_capacity(hops.len().saturating_sub(1));
        for w in hops.windows(2) {
            let de = DirectedEdge::new(w[0].clone(), w[1].clone());
            let idx = *idx_of.entry(de.clone()).or_insert_with(|| {
                idx2edge.push(de);
                idx2edge.len() - 1
            });
            idx_path.push(idx);
        }
        idx_paths.push(idx_path);
    }
    let mut reverse_pairs = Vec::new();
    for (i, e) in idx2edge.iter().enumerate() {
        if e.from < e.to {
            if let Some(&j) = idx_of.get(&e.reversed()) {
                reverse_pairs.push((i, j));
            }
        }
    }
    DirectedIndex {
        idx2edge,
        idx_of,
        idx_paths,
        reverse_pairs,
    }
}

/// For every canonical edge touched by `index`, pick one directed occurrence
/// to decode from (preferring the canonical-forward one) plus whether the
/// decoded label must be flipped (P2C<->C2P) to read in canonical terms.
///
/// This replaces the reference solver's "skip one direction of each coupled
/// reverse pair at output time" step: since the reverse-coupling
/// constraints force both directions' variables into a consistent relation,
/// decoding either one (with the flip applied for the backward one) yields
/// the same canonical label, so there is no need to track a separate
/// skip-set.
pub fn canonical_decode_plan(index: &DirectedIndex) -> BTreeMap<Edge, (usize, bool)> {
    let mut plan: BTreeMap<Edge, (usize, bool)> = BTreeMap::new();
    for (i, e) in index.idx2edge.iter().enumerate() {
        let (canon, forward) = e.canonical();
        let need_flip = !forward;
        plan
            .entry(canon)
            .and_modify(|(cur_i, cur_flip)| {
                if *cur_flip && !need_flip {
                    *cur_i = i;
                    *cur_flip = need_flip;
                }
            })
            .or_insert((i, need_flip));
    }
    plan
}

pub fn maybe_flip(label: Label, flip: bool) -> Label {
    if !flip {
        return label;
    }
    match label {
        Label::P2C => Label::C2P,
        Label::C2P => Label::P2C,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::as_id::Interner;

    #[test]
    fn directed_index_assigns_ids_in_first_appearance_order() {
        let mut it = Interner::new();
        let a = it.intern("A");
        let b = it.intern("B");
        let c = it.intern("C");
        let p1 = vec![a.clone(), b.clone(), c.clone()];
        let p2 = vec![c, b, a];
        let index = build_directed_index(vec![p1.as_slice(), p2.as_slice()].into_iter());
        assert_eq!(index.idx2edge.len(), 4); // A->B, B->C, C->B, B->A
        assert_eq!(index.reverse_pairs.len(), 2);
    }
}
