//! Parameter-mode values and cross-server conflict resolution.
//!
//! Two linked servers can accept conflicting local changes to the same
//! parameter mode before either has heard from the other. Convergence
//! comes from ordering, not consensus: the newer change timestamp wins
//! outright, and an exact tie is settled by the mode's pure, commutative
//! resolver, which both sides compute identically from the same two
//! values.

use crate::def::{ParamSpec, ParamValue};

/// The live value of a parameter mode on one target, with the setter
/// context needed for conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSlot {
    /// The normalized value.
    pub value: ParamValue,
    /// Who set it.
    pub set_by: String,
    /// Unix timestamp of the change.
    pub set_at: i64,
}

/// Which side of a merge survived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    /// The remote assertion won; local state was updated.
    Updated,
    /// The local value stood; the remote assertion is discarded.
    KeptLocal,
}

/// Merge a remote assertion into a local slot.
///
/// Timestamps order first. On an exact tie the mode's resolver picks the
/// winner; without one, equal values keep local and unequal values fall
/// back to [`tie_break`] so both sides still converge.
pub fn merge_remote(
    local: &mut ParamSlot,
    spec: &ParamSpec,
    theirs: &ParamValue,
    their_by: &str,
    their_at: i64,
) -> Merge {
    if their_at > local.set_at {
        *local = ParamSlot {
            value: theirs.clone(),
            set_by: their_by.to_string(),
            set_at: their_at,
        };
        return Merge::Updated;
    }
    if their_at < local.set_at {
        return Merge::KeptLocal;
    }

    let winner = match spec.resolve {
        Some(resolve) => resolve(theirs, &local.value),
        None => tie_break(theirs, &local.value),
    };
    if winner == local.value {
        Merge::KeptLocal
    } else {
        local.value = winner;
        local.set_by = their_by.to_string();
        Merge::Updated
    }
}

/// Resolver-less fallback: order by rendered form. Arbitrary, but the
/// same on every server, which is all convergence needs.
#[must_use]
pub fn tie_break(a: &ParamValue, b: &ParamValue) -> ParamValue {
    if a.to_string() >= b.to_string() {
        a.clone()
    } else {
        b.clone()
    }
}

/// Stock resolver: the numerically higher value wins.
#[must_use]
pub fn resolve_numeric_max(a: &ParamValue, b: &ParamValue) -> ParamValue {
    match (a.as_int(), b.as_int()) {
        (Some(x), Some(y)) => {
            if x >= y {
                a.clone()
            } else {
                b.clone()
            }
        }
        _ => tie_break(a, b),
    }
}

/// Stock resolver: the lexicographically greater string wins.
#[must_use]
pub fn resolve_lexicographic(a: &ParamValue, b: &ParamValue) -> ParamValue {
    match (a.as_str(), b.as_str()) {
        (Some(x), Some(y)) => {
            if x >= y {
                a.clone()
            } else {
                b.clone()
            }
        }
        _ => tie_break(a, b),
    }
}
