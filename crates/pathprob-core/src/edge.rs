//! Canonical edges, directed edges, relationship labels, and the
//! probability distribution over them.
//!
//! Direction convention (spec section 3): a canonical edge `(a, b)` with
//! `a < b` labeled P2C means *a is provider, b is customer*; C2P is the
//! reverse; P2P is symmetric.

use crate::as_id::AsId;
use std::fmt;

/// Canonicalized, unordered pair `{a, b}` stored as `(min, max)`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub a: AsId,
    pub b: AsId,
}

impl Edge {
    /// Build the canonical edge for an observed (possibly reversed) pair.
    /// Panics if `x == y`: self-loops are rejected earlier, at path
    /// construction, and should never reach here.
    pub fn canonical(x: AsId, y: AsId) -> Self {
        assert_ne!(x, y, "self-loop edge");
        if x < y {
            Edge { a: x, b: y }
        } else {
            Edge { a: y, b: x }
        }
    }

    pub fn contains(&self, id: &AsId) -> bool {
        &self.a == id || &self.b == id
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.a, self.b)
    }
}

/// Directed edge `(from, to)`, used only inside the solver and the scorer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirectedEdge {
    pub from: AsId,
    pub to: AsId,
}

impl DirectedEdge {
    pub fn new(from: AsId, to: AsId) -> Self {
        Self { from, to }
    }

    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }

    /// The canonical (undirected) edge this directed edge belongs to, plus
    /// whether `self` runs in the canonical `a -> b` direction.
    pub fn canonical(&self) -> (Edge, bool) {
        if self.from < self.to {
            (
                Edge {
                    a: self.from.clone(),
                    b: self.to.clone(),
                },
                true,
            )
        } else {
            (
                Edge {
                    a: self.to.clone(),
                    b: self.from.clone(),
                },
                false,
            )
        }
    }
}

/// Hard relationship label. Values match the convention in spec section 3:
/// P2C(-1), P2P(0), C2P(1); `Other` is the solver's admitted-violation /
/// unsatisfiable state, which always serializes as `0` wherever spec
/// section 9's open questions say the boundary collapses P2P and Other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i8)]
pub enum Label {
    P2C = -1,
    P2P = 0,
    C2P = 1,
    Other = 2,
}

impl Label {
    pub fn code(self) -> i8 {
        self as i8
    }

    /// The code written to external files, where `Other` collapses into
    /// the same `0` as `P2P` (spec section 9, third open question).
    pub fn serialized_code(self) -> i8 {
        match self {
            Label::Other => 0,
            other => other.code(),
        }
    }

    pub fn from_code(code: i8) -> Option<Label> {
        match code {
            -1 => Some(Label::P2C),
            0 => Some(Label::P2P),
            1 => Some(Label::C2P),
            2 => Some(Label::Other),
            _ => None,
        }
    }
}

/// Probability distribution over the three mutually exclusive relationship
/// kinds, always referenced against the canonicalized edge ordering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Distribution {
    pub p2c: f64,
    pub p2p: f64,
    pub c2p: f64,
}

impl Distribution {
    pub const UNIFORM: Distribution = Distribution {
        p2c: 1.0 / 3.0,
        p2p: 1.0 / 3.0,
        c2p: 1.0 / 3.0,
    };

    pub const P2C_CERTAIN: Distribution = Distribution {
        p2c: 1.0,
        p2p: 0.0,
        c2p: 0.0,
    };

    pub const C2P_CERTAIN: Distribution = Distribution {
        p2c: 0.0,
        p2p: 0.0,
        c2p: 1.0,
    };

    pub const P2P_CERTAIN: Distribution = Distribution {
        p2c: 0.0,
        p2p: 1.0,
        c2p: 0.0,
    };

    pub fn from_label(label: Label) -> Distribution {
        match label {
            Label::P2C => Distribution::P2C_CERTAIN,
            Label::P2P | Label::Other => Distribution::P2P_CERTAIN,
            Label::C2P => Distribution::C2P_CERTAIN,
        }
    }

    /// Flip the distribution to read against the reverse edge orientation.
    pub fn reversed(&self) -> Distribution {
        Distribution {
            p2c: self.c2p,
            p2p: self.p2p,
            c2p: self.p2c,
        }
    }

    pub fn is_valid(&self) -> bool {
        let sum = self.p2c + self.p2p + self.c2p;
        (sum - 1.0).abs() < 1e-9
            && (0.0..=1.0).contains(&self.p2c)
            && (0.0..=1.0).contains(&self.p2p)
            && (0.0..=1.0).contains(&self.c2p)
    }
}
