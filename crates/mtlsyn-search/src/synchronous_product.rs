//! The symbolic step of the synchronous product
//!
//! A single symbolic step takes a concrete candidate of a canonical word,
//! fires all enabled plant transitions for a symbol, pairs each with every
//! minimal-model step of the specification automaton, and abstracts the
//! resulting joint configurations back into canonical words.

use std::collections::BTreeSet;

use mtlsyn_automata::ata::{self, AlternatingTimedAutomaton};
use mtlsyn_automata::regions::RegionIndex;
use mtlsyn_automata::ta::{Configuration as TaConfiguration, TimedAutomaton};
use mtlsyn_logic::MTLFormula;

use crate::canonical_word::{CanonicalABWord, get_canonical_word};

/// All canonical words reachable from the candidate configuration by taking
/// a `symbol`-transition
///
/// The result is a set: joint successors that fall into the same region
/// abstraction are collapsed.
pub fn get_next_canonical_words<L: Clone + Ord>(
    ta: &TimedAutomaton<L>,
    ata: &AlternatingTimedAutomaton<MTLFormula>,
    (ta_configuration, ata_configuration): (
        &TaConfiguration<L>,
        &ata::Configuration<MTLFormula>,
    ),
    symbol: &str,
    k: RegionIndex,
) -> BTreeSet<CanonicalABWord<L>> {
    let ta_successors = ta.make_symbol_step(ta_configuration, symbol);
    let ata_successors = ata.make_symbol_step(ata_configuration, symbol);
    let mut words = BTreeSet::new();
    for ta_successor in &ta_successors {
        for ata_successor in &ata_successors {
            words.insert(get_canonical_word(ta_successor, ata_successor, k));
        }
    }
    words
}
