//! Alternating timed automata
//!
//! An alternating timed automaton (ATA) has a single implicit clock `x` and
//! transitions into positive boolean combinations of locations, so a run
//! tracks a *set* of active (location, clock) states rather than a single
//! location. A configuration is accepting iff every active location is
//! accepting; consequently the empty configuration accepts.
//!
//! The automaton may designate a sink location. A state whose transition
//! formula has no model (or that has no transition at all for the read
//! symbol) then moves to the sink, which is absorbing and non-accepting and
//! marks the branch as unsatisfiable.

use std::collections::BTreeSet;
use std::fmt;

use mtlsyn_display_utils::{indent_lines, join_displayed};

use crate::ata_formula::{Formula, State};
use crate::{Time, TimedWord};

/// A configuration of an ATA: the set of currently active states
pub type Configuration<L> = BTreeSet<State<L>>;

/// A transition of an ATA, leading from a location into a formula
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Transition<L> {
    source: L,
    symbol: String,
    formula: Formula<L>,
}

impl<L> Transition<L> {
    /// Create a new transition
    pub fn new<S: Into<String>>(source: L, symbol: S, formula: Formula<L>) -> Self {
        Transition {
            source,
            symbol: symbol.into(),
            formula,
        }
    }

    /// Source location of the transition
    pub fn source(&self) -> &L {
        &self.source
    }

    /// Symbol the transition is labeled with
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Formula the transition leads into
    pub fn formula(&self) -> &Formula<L> {
        &self.formula
    }
}

impl<L: fmt::Display> fmt::Display for Transition<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} --{}--> {}", self.source, self.symbol, self.formula)
    }
}

/// An alternating timed automaton
#[derive(Debug, Clone, PartialEq)]
pub struct AlternatingTimedAutomaton<L> {
    alphabet: BTreeSet<String>,
    initial_location: L,
    final_locations: BTreeSet<L>,
    transitions: Vec<Transition<L>>,
    sink_location: Option<L>,
}

impl<L: Clone + Ord> AlternatingTimedAutomaton<L> {
    /// Create a new ATA
    pub fn new<S, I>(
        alphabet: I,
        initial_location: L,
        final_locations: BTreeSet<L>,
        transitions: Vec<Transition<L>>,
        sink_location: Option<L>,
    ) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        AlternatingTimedAutomaton {
            alphabet: alphabet.into_iter().map(Into::into).collect(),
            initial_location,
            final_locations,
            transitions,
            sink_location,
        }
    }

    /// The alphabet of the automaton
    pub fn get_alphabet(&self) -> &BTreeSet<String> {
        &self.alphabet
    }

    /// The initial location of the automaton
    pub fn get_initial_location(&self) -> &L {
        &self.initial_location
    }

    /// The sink location, if the automaton has one
    pub fn get_sink_location(&self) -> Option<&L> {
        self.sink_location.as_ref()
    }

    /// An iterator over the transitions of the automaton
    pub fn get_transitions(&self) -> impl Iterator<Item = &Transition<L>> {
        self.transitions.iter()
    }

    /// The initial configuration: only the initial location is active, with
    /// clock value 0
    pub fn get_initial_configuration(&self) -> Configuration<L> {
        BTreeSet::from([State::new(self.initial_location.clone(), 0.0)])
    }

    /// Check whether every active location of the configuration is accepting
    ///
    /// The empty configuration is accepting.
    pub fn is_accepting_configuration(&self, configuration: &Configuration<L>) -> bool {
        configuration
            .iter()
            .all(|state| self.final_locations.contains(&state.location))
    }

    /// Minimal models for a single state reading `symbol`
    ///
    /// A state without a matching transition or whose transition formula has
    /// no model moves to the sink location if one is defined.
    fn get_minimal_models_of_state(
        &self,
        state: &State<L>,
        symbol: &str,
    ) -> BTreeSet<BTreeSet<State<L>>> {
        let models = self
            .transitions
            .iter()
            .find(|t| t.source == state.location && t.symbol == symbol)
            .map(|t| t.formula.get_minimal_models(state.clock_valuation))
            .unwrap_or_default();
        if models.is_empty() {
            match &self.sink_location {
                Some(sink) => BTreeSet::from([BTreeSet::from([State::new(sink.clone(), 0.0)])]),
                None => BTreeSet::new(),
            }
        } else {
            models
        }
    }

    /// All configurations reachable by reading `symbol` in the given
    /// configuration
    ///
    /// Each active state independently picks one minimal model of its
    /// transition formula; a successor configuration is the union of the
    /// chosen models. Reading a symbol in the empty configuration yields the
    /// empty configuration again.
    pub fn make_symbol_step(
        &self,
        configuration: &Configuration<L>,
        symbol: &str,
    ) -> BTreeSet<Configuration<L>> {
        let mut successors: BTreeSet<Configuration<L>> = BTreeSet::from([BTreeSet::new()]);
        for state in configuration {
            let models = self.get_minimal_models_of_state(state, symbol);
            if models.is_empty() {
                return BTreeSet::new();
            }
            successors = successors
                .iter()
                .flat_map(|successor| {
                    models
                        .iter()
                        .map(move |model| successor.union(model).cloned().collect())
                })
                .collect();
        }
        successors
    }

    /// The configuration after `delta` time units have elapsed
    pub fn make_time_step(&self, configuration: &Configuration<L>, delta: Time) -> Configuration<L> {
        configuration
            .iter()
            .map(|state| State::new(state.location.clone(), state.clock_valuation + delta))
            .collect()
    }

    /// Check whether the automaton accepts the given timed word
    ///
    /// Words with decreasing timestamps are rejected.
    pub fn accepts_word(&self, word: &TimedWord) -> bool {
        let mut configurations = BTreeSet::from([self.get_initial_configuration()]);
        let mut last_time = 0.0;
        for (symbol, time) in word {
            if *time < last_time {
                return false;
            }
            configurations = configurations
                .iter()
                .flat_map(|configuration| {
                    self.make_symbol_step(
                        &self.make_time_step(configuration, time - last_time),
                        symbol,
                    )
                })
                .collect();
            last_time = *time;
        }
        configurations
            .iter()
            .any(|configuration| self.is_accepting_configuration(configuration))
    }
}

impl<L: Clone + Ord + fmt::Display> fmt::Display for AlternatingTimedAutomaton<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "alphabet: {{{}}}", join_displayed(&self.alphabet, ", "))?;
        writeln!(f, "initial location: {}", self.initial_location)?;
        writeln!(
            f,
            "final locations: {{{}}}",
            join_displayed(&self.final_locations, ", ")
        )?;
        let transitions = join_displayed(&self.transitions, "\n");
        write!(f, "transitions:\n{}", indent_lines(&transitions))
    }
}
