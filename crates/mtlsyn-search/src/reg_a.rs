//! The controller-observable projection of a canonical word
//!
//! The controller cannot observe the state of the specification automaton.
//! Two canonical words that agree after dropping all ATA states are
//! indistinguishable for the controller, so successors are partitioned into
//! child nodes by this projection.

use std::collections::BTreeSet;

use crate::canonical_word::{ABRegionSymbol, CanonicalABWord};

/// Drop all ATA states from a canonical word
///
/// Groups that only held ATA states are removed entirely.
pub fn reg_a<L: Clone + Ord>(word: &CanonicalABWord<L>) -> CanonicalABWord<L> {
    word.iter()
        .map(|group| {
            group
                .iter()
                .filter(|symbol| matches!(symbol, ABRegionSymbol::TARegionState(_)))
                .cloned()
                .collect::<BTreeSet<_>>()
        })
        .filter(|group| !group.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical_word::{ATARegionState, TARegionState};
    use mtlsyn_automata::ta::Location;
    use mtlsyn_logic::MTLFormula;

    #[test]
    fn test_reg_a_drops_ata_states() {
        let word: CanonicalABWord<&str> = vec![
            BTreeSet::from([
                ABRegionSymbol::TARegionState(TARegionState::new(Location("l0"), "x", 0)),
                ABRegionSymbol::ATARegionState(ATARegionState::new(MTLFormula::ap("a"), 0)),
            ]),
            BTreeSet::from([ABRegionSymbol::ATARegionState(ATARegionState::new(
                MTLFormula::ap("b"),
                3,
            ))]),
        ];
        assert_eq!(
            reg_a(&word),
            vec![BTreeSet::from([ABRegionSymbol::TARegionState(
                TARegionState::new(Location("l0"), "x", 0)
            )])]
        );
    }

    #[test]
    fn test_reg_a_is_idempotent() {
        let word: CanonicalABWord<&str> = vec![BTreeSet::from([ABRegionSymbol::TARegionState(
            TARegionState::new(Location("l0"), "x", 1),
        )])];
        assert_eq!(reg_a(&word), word);
        assert_eq!(reg_a(&reg_a(&word)), reg_a(&word));
    }
}
