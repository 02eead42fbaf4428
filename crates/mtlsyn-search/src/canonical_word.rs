//! Canonical words: the symbolic encoding of joint configurations
//!
//! A joint configuration of the plant TA and the specification ATA is
//! abstracted into a *canonical word*: the region states of all clocks,
//! partitioned into groups with equal fractional part and ordered by
//! increasing fractional part. Canonical words are finite in number (for a
//! fixed maximal constant K) and serve as the nodes of the search.
//!
//! A canonical word is well-formed iff
//! * the word and every group are non-empty,
//! * every group contains only even or only odd region indices (clocks at an
//!   integer value vs. clocks within an open interval),
//! * at most one group holds even indices, and it comes first (the integer
//!   fractional part 0 is the smallest).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use mtlsyn_automata::ata;
use mtlsyn_automata::ata_formula::State as AtaState;
use mtlsyn_automata::regions::{
    RegionIndex, get_fractional_part, get_maximal_region_index, get_region_index,
};
use mtlsyn_automata::ta::{Configuration as TaConfiguration, Location};
use mtlsyn_automata::Time;
use mtlsyn_display_utils::join_displayed;
use mtlsyn_logic::MTLFormula;

/// A plant clock pinned to a region: the TA location, the clock name and the
/// clock's region index
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TARegionState<L> {
    /// Location of the timed automaton
    pub location: Location<L>,
    /// Name of the clock
    pub clock: String,
    /// Region index of the clock value
    pub region_index: RegionIndex,
}

impl<L> TARegionState<L> {
    /// Create a new TA region state
    pub fn new<S: Into<String>>(location: Location<L>, clock: S, region_index: RegionIndex) -> Self {
        TARegionState {
            location,
            clock: clock.into(),
            region_index,
        }
    }
}

impl<L: fmt::Display> fmt::Display for TARegionState<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self.location, self.clock, self.region_index)
    }
}

/// An active ATA location together with the region of its clock copy
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ATARegionState {
    /// The active location, which is an MTL subformula
    pub formula: MTLFormula,
    /// Region index of the location's clock
    pub region_index: RegionIndex,
}

impl ATARegionState {
    /// Create a new ATA region state
    pub fn new(formula: MTLFormula, region_index: RegionIndex) -> Self {
        ATARegionState {
            formula,
            region_index,
        }
    }
}

impl fmt::Display for ATARegionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.formula, self.region_index)
    }
}

/// One symbol of a canonical word: either a plant region state or a
/// specification region state
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ABRegionSymbol<L> {
    /// A region state of the plant TA
    TARegionState(TARegionState<L>),
    /// A region state of the specification ATA
    ATARegionState(ATARegionState),
}

impl<L> ABRegionSymbol<L> {
    /// The region index of the state
    pub fn region_index(&self) -> RegionIndex {
        match self {
            ABRegionSymbol::TARegionState(state) => state.region_index,
            ABRegionSymbol::ATARegionState(state) => state.region_index,
        }
    }

    /// The same state, moved to the next region
    fn incremented(&self) -> ABRegionSymbol<L>
    where
        L: Clone,
    {
        match self {
            ABRegionSymbol::TARegionState(state) => {
                ABRegionSymbol::TARegionState(TARegionState {
                    location: state.location.clone(),
                    clock: state.clock.clone(),
                    region_index: state.region_index + 1,
                })
            }
            ABRegionSymbol::ATARegionState(state) => {
                ABRegionSymbol::ATARegionState(ATARegionState {
                    formula: state.formula.clone(),
                    region_index: state.region_index + 1,
                })
            }
        }
    }
}

impl<L: fmt::Display> fmt::Display for ABRegionSymbol<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ABRegionSymbol::TARegionState(state) => write!(f, "{state}"),
            ABRegionSymbol::ATARegionState(state) => write!(f, "{state}"),
        }
    }
}

/// A canonical word: groups of region states ordered by increasing
/// fractional part
pub type CanonicalABWord<L> = Vec<BTreeSet<ABRegionSymbol<L>>>;

/// Render a single group of a canonical word
pub fn group_to_string<L: fmt::Display>(group: &BTreeSet<ABRegionSymbol<L>>) -> String {
    if group.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", join_displayed(group, ", "))
    }
}

/// Render a canonical word
pub fn word_to_string<L: fmt::Display>(word: &CanonicalABWord<L>) -> String {
    if word.is_empty() {
        "[]".to_string()
    } else {
        format!(
            "[ {} ]",
            join_displayed(word.iter().map(group_to_string), ", ")
        )
    }
}

/// Ways in which a canonical word can be malformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidCanonicalWordError {
    /// The word contains no groups at all
    EmptyWord,
    /// The group at the given position is empty
    EmptyGroup(usize),
    /// The group at the given position mixes even and odd region indices
    MixedRegionParity(usize),
    /// The group at the given position holds even indices but is not the
    /// first group
    MisplacedIntegerGroup(usize),
}

impl fmt::Display for InvalidCanonicalWordError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InvalidCanonicalWordError::EmptyWord => {
                write!(f, "A canonical word must contain at least one group")
            }
            InvalidCanonicalWordError::EmptyGroup(index) => {
                write!(f, "Group {index} of the canonical word is empty")
            }
            InvalidCanonicalWordError::MixedRegionParity(index) => {
                write!(
                    f,
                    "Group {index} mixes integer-valued and fractional-valued region states"
                )
            }
            InvalidCanonicalWordError::MisplacedIntegerGroup(index) => {
                write!(
                    f,
                    "Group {index} holds integer-valued region states but only the first group may"
                )
            }
        }
    }
}

impl std::error::Error for InvalidCanonicalWordError {}

/// Check the well-formedness conditions of a canonical word
pub fn is_valid_canonical_word<L>(
    word: &CanonicalABWord<L>,
) -> Result<(), InvalidCanonicalWordError> {
    if word.is_empty() {
        return Err(InvalidCanonicalWordError::EmptyWord);
    }
    for (index, group) in word.iter().enumerate() {
        let Some(first) = group.iter().next() else {
            return Err(InvalidCanonicalWordError::EmptyGroup(index));
        };
        let parity = first.region_index() % 2;
        if group.iter().any(|symbol| symbol.region_index() % 2 != parity) {
            return Err(InvalidCanonicalWordError::MixedRegionParity(index));
        }
        if parity == 0 && index != 0 {
            return Err(InvalidCanonicalWordError::MisplacedIntegerGroup(index));
        }
    }
    Ok(())
}

/// Compute the canonical word of a joint configuration
///
/// Every clock of the TA configuration and every state of the ATA
/// configuration is mapped to its region state; states are grouped by the
/// fractional part of their clock value and the groups are ordered by
/// increasing fractional part.
pub fn get_canonical_word<L: Clone + Ord>(
    ta_configuration: &TaConfiguration<L>,
    ata_configuration: &ata::Configuration<MTLFormula>,
    k: RegionIndex,
) -> CanonicalABWord<L> {
    let mut states: Vec<(Time, ABRegionSymbol<L>)> = Vec::new();
    for (clock, value) in &ta_configuration.clock_valuations {
        states.push((
            get_fractional_part(*value),
            ABRegionSymbol::TARegionState(TARegionState {
                location: ta_configuration.location.clone(),
                clock: clock.clone(),
                region_index: get_region_index(*value, k),
            }),
        ));
    }
    for state in ata_configuration {
        states.push((
            get_fractional_part(state.clock_valuation),
            ABRegionSymbol::ATARegionState(ATARegionState {
                formula: state.location.clone(),
                region_index: get_region_index(state.clock_valuation, k),
            }),
        ));
    }
    states.sort_by(|(f1, s1), (f2, s2)| f1.total_cmp(f2).then_with(|| s1.cmp(s2)));

    let mut word: CanonicalABWord<L> = Vec::new();
    let mut current_fraction = None;
    for (fraction, symbol) in states {
        if current_fraction != Some(fraction.to_bits()) {
            current_fraction = Some(fraction.to_bits());
            word.push(BTreeSet::new());
        }
        if let Some(group) = word.last_mut() {
            group.insert(symbol);
        }
    }
    debug_assert!(is_valid_canonical_word(&word).is_ok());
    word
}

/// Check whether all region indices of a group are even
fn is_integer_group<L>(group: &BTreeSet<ABRegionSymbol<L>>) -> bool {
    group
        .iter()
        .next()
        .is_some_and(|symbol| symbol.region_index() % 2 == 0)
}

/// Compute the immediate time successor of a canonical word
///
/// The group with the largest fractional part reaches the next region
/// first. Its non-saturated members advance to the next (even) region and
/// become the new first group; saturated members stay behind. If the former
/// first group held clocks at an integer value, those clocks enter the next
/// open interval at the same instant. A word whose states are all saturated
/// is its own time successor.
pub fn get_time_successor<L: Clone + Ord>(
    word: &CanonicalABWord<L>,
    k: RegionIndex,
) -> CanonicalABWord<L> {
    let max_index = get_maximal_region_index(k);
    let Some(last_active) = word
        .iter()
        .rposition(|group| group.iter().any(|s| s.region_index() < max_index))
    else {
        return word.clone();
    };
    let mut advanced = BTreeSet::new();
    let mut saturated = BTreeSet::new();
    for symbol in &word[last_active] {
        if symbol.region_index() < max_index {
            advanced.insert(symbol.incremented());
        } else {
            saturated.insert(symbol.clone());
        }
    }
    let mut successor = vec![advanced];
    for (index, group) in word.iter().enumerate() {
        if index == last_active {
            if !saturated.is_empty() {
                successor.push(saturated.clone());
            }
        } else if index == 0 && is_integer_group(group) {
            successor.push(group.iter().map(|s| s.incremented()).collect());
        } else {
            successor.push(group.clone());
        }
    }
    debug_assert!(is_valid_canonical_word(&successor).is_ok());
    successor
}

/// The `n`-th time successor of a canonical word
pub fn get_nth_time_successor<L: Clone + Ord>(
    word: &CanonicalABWord<L>,
    n: RegionIndex,
    k: RegionIndex,
) -> CanonicalABWord<L> {
    let mut successor = word.clone();
    for _ in 0..n {
        successor = get_time_successor(&successor, k);
    }
    successor
}

/// Enumerate all time successors of a canonical word
///
/// Returns the pairs `(increment, successor)` starting with `(0, word)`
/// until the word saturates.
pub fn get_time_successors<L: Clone + Ord>(
    word: &CanonicalABWord<L>,
    k: RegionIndex,
) -> Vec<(RegionIndex, CanonicalABWord<L>)> {
    let mut successors = vec![(0, word.clone())];
    loop {
        let (increment, current) = successors
            .last()
            .map(|(i, w)| (*i, w.clone()))
            .unwrap_or_default();
        let next = get_time_successor(&current, k);
        if next == current {
            return successors;
        }
        successors.push((increment + 1, next));
    }
}

/// Pick a concrete joint configuration represented by the canonical word
///
/// Group `i` receives the fractional part `(i + 1) / (len + 1)` (0 for the
/// group holding integer-valued clocks); the integer part of each clock is
/// recovered from its region index. The TA part is `None` if the word
/// contains no plant states.
pub fn get_candidate<L: Clone + Ord>(
    word: &CanonicalABWord<L>,
) -> (
    Option<TaConfiguration<L>>,
    ata::Configuration<MTLFormula>,
) {
    let mut location = None;
    let mut clock_valuations = BTreeMap::new();
    let mut ata_configuration = BTreeSet::new();
    let group_count = word.len();
    for (index, group) in word.iter().enumerate() {
        for symbol in group {
            let fraction = if symbol.region_index() % 2 == 0 {
                0.0
            } else {
                (index as Time + 1.0) / (group_count as Time + 1.0)
            };
            let value = Time::from(symbol.region_index() / 2) + fraction;
            match symbol {
                ABRegionSymbol::TARegionState(state) => {
                    location = Some(state.location.clone());
                    clock_valuations.insert(state.clock.clone(), value);
                }
                ABRegionSymbol::ATARegionState(state) => {
                    ata_configuration.insert(AtaState::new(state.formula.clone(), value));
                }
            }
        }
    }
    (
        location.map(|location| TaConfiguration {
            location,
            clock_valuations,
        }),
        ata_configuration,
    )
}
