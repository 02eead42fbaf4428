//! Monotonic domination of canonical words
//!
//! A word `w1` monotonically dominates `w2` if both have the same
//! controller-observable projection and every ATA obligation of `w1` also
//! appears in `w2`, at a compatible relative position. Since additional ATA
//! states only make it harder for the specification automaton to accept, a
//! dominated node cannot behave worse for the controller than its dominating
//! ancestor, so the search may prune it.

use std::collections::BTreeSet;

use crate::canonical_word::{ABRegionSymbol, ATARegionState, CanonicalABWord};
use crate::reg_a::reg_a;

/// The ATA states of each group, with groups holding none dropped
fn ata_groups<L: Ord + Clone>(word: &CanonicalABWord<L>) -> Vec<BTreeSet<&ATARegionState>> {
    word.iter()
        .map(|group| {
            group
                .iter()
                .filter_map(|symbol| match symbol {
                    ABRegionSymbol::ATARegionState(state) => Some(state),
                    ABRegionSymbol::TARegionState(_) => None,
                })
                .collect::<BTreeSet<_>>()
        })
        .filter(|group| !group.is_empty())
        .collect()
}

/// Check whether `dominator` monotonically dominates `dominated`
///
/// Both words must have the same `reg_a` projection, and the ATA groups of
/// the dominator must embed into those of the dominated word in an
/// order-preserving way.
pub fn monotonically_dominates<L: Clone + Ord>(
    dominator: &CanonicalABWord<L>,
    dominated: &CanonicalABWord<L>,
) -> bool {
    if reg_a(dominator) != reg_a(dominated) {
        return false;
    }
    let dominated_groups = ata_groups(dominated);
    let mut position = 0;
    for group in ata_groups(dominator) {
        match dominated_groups[position..]
            .iter()
            .position(|candidate| group.is_subset(candidate))
        {
            Some(offset) => position += offset + 1,
            None => return false,
        }
    }
    true
}

/// Check whether every word of `dominated` is monotonically dominated by
/// some word of `dominators`
pub fn set_monotonically_dominates<L: Clone + Ord>(
    dominators: &BTreeSet<CanonicalABWord<L>>,
    dominated: &BTreeSet<CanonicalABWord<L>>,
) -> bool {
    dominated.iter().all(|word| {
        dominators
            .iter()
            .any(|dominator| monotonically_dominates(dominator, word))
    })
}
