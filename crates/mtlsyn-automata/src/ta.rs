//! Timed automata
//!
//! A timed automaton consists of locations connected by transitions that are
//! labeled with an action, guarded by clock constraints and may reset clocks.
//! The plant to be controlled is given as a timed automaton; the synthesized
//! controller is another timed automaton whose locations are sets of
//! canonical words.
//!
//! The location payload is generic so that both plain string-labeled plants
//! and the derived controller automata can share this type.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use mtlsyn_display_utils::{indent_lines, join_displayed};

use crate::{ClockConstraint, Time, TimedWord};

/// A location of a timed automaton
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location<L>(pub L);

impl<L: fmt::Display> fmt::Display for Location<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A concrete configuration of a timed automaton: the current location
/// together with a valuation of every clock
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration<L> {
    /// The current location
    pub location: Location<L>,
    /// The current value of every clock of the automaton
    pub clock_valuations: BTreeMap<String, Time>,
}

impl<L: Clone> Configuration<L> {
    /// The configuration after `delta` time units have elapsed
    pub fn make_time_step(&self, delta: Time) -> Configuration<L> {
        Configuration {
            location: self.location.clone(),
            clock_valuations: self
                .clock_valuations
                .iter()
                .map(|(clock, value)| (clock.clone(), value + delta))
                .collect(),
        }
    }
}

/// A transition of a timed automaton
///
/// # Example
///
/// ```
/// use mtlsyn_automata::ta::{Location, Transition};
/// use mtlsyn_automata::{ClockConstraint, ComparisonOp};
///
/// let t = Transition::new(Location("l0"), "a", Location("l1"))
///     .with_guard("x", ClockConstraint::new(ComparisonOp::Greater, 1))
///     .with_reset("x");
/// assert_eq!(t.symbol(), "a");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<L> {
    source: Location<L>,
    symbol: String,
    target: Location<L>,
    guard: BTreeMap<String, Vec<ClockConstraint>>,
    resets: BTreeSet<String>,
}

impl<L> Transition<L> {
    /// Create a new transition without guards or resets
    pub fn new<S: Into<String>>(source: Location<L>, symbol: S, target: Location<L>) -> Self {
        Transition {
            source,
            symbol: symbol.into(),
            target,
            guard: BTreeMap::new(),
            resets: BTreeSet::new(),
        }
    }

    /// Add a clock constraint to the guard of the transition
    ///
    /// A clock may be constrained multiple times; the guard is the
    /// conjunction of all constraints.
    pub fn with_guard<S: Into<String>>(mut self, clock: S, constraint: ClockConstraint) -> Self {
        self.guard.entry(clock.into()).or_default().push(constraint);
        self
    }

    /// Add a clock to the set of clocks reset by the transition
    pub fn with_reset<S: Into<String>>(mut self, clock: S) -> Self {
        self.resets.insert(clock.into());
        self
    }

    /// Source location of the transition
    pub fn source(&self) -> &Location<L> {
        &self.source
    }

    /// Symbol the transition is labeled with
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Target location of the transition
    pub fn target(&self) -> &Location<L> {
        &self.target
    }

    /// Guard of the transition as a map from clock name to its constraints
    pub fn guard(&self) -> &BTreeMap<String, Vec<ClockConstraint>> {
        &self.guard
    }

    /// Clocks reset by the transition
    pub fn resets(&self) -> &BTreeSet<String> {
        &self.resets
    }

    /// Check whether the guard is satisfied by the given clock valuations
    pub fn is_enabled(&self, clock_valuations: &BTreeMap<String, Time>) -> bool {
        self.guard.iter().all(|(clock, constraints)| {
            clock_valuations
                .get(clock)
                .is_some_and(|value| constraints.iter().all(|c| c.is_satisfied(*value)))
        })
    }
}

impl<L: fmt::Display> fmt::Display for Transition<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {} on {}", self.source, self.target, self.symbol)?;
        if !self.guard.is_empty() {
            let constraints = self
                .guard
                .iter()
                .flat_map(|(clock, cs)| cs.iter().map(move |c| format!("{clock} {c}")));
            write!(f, " when {}", join_displayed(constraints, ", "))?;
        }
        if !self.resets.is_empty() {
            write!(f, " reset {}", join_displayed(self.resets.iter(), ", "))?;
        }
        Ok(())
    }
}

/// Errors that can occur when constructing a timed automaton
#[derive(Debug, Clone, PartialEq)]
pub enum TimedAutomatonError<L> {
    /// A transition references a location that is not part of the automaton
    UnknownLocation(Location<L>),
    /// A transition references a clock that is not part of the automaton
    UnknownClock(String),
    /// A transition is labeled with a symbol outside the alphabet
    UnknownSymbol(String),
}

impl<L: fmt::Debug> fmt::Display for TimedAutomatonError<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimedAutomatonError::UnknownLocation(location) => {
                write!(
                    f,
                    "Transition references the location {:?}, which is not part of the automaton",
                    location.0
                )
            }
            TimedAutomatonError::UnknownClock(clock) => {
                write!(
                    f,
                    "Transition references the clock '{clock}', which is not part of the automaton"
                )
            }
            TimedAutomatonError::UnknownSymbol(symbol) => {
                write!(
                    f,
                    "Transition is labeled with the symbol '{symbol}', which is not in the alphabet"
                )
            }
        }
    }
}

impl<L: fmt::Debug> std::error::Error for TimedAutomatonError<L> {}

/// A timed automaton
///
/// # Example
///
/// ```
/// use mtlsyn_automata::ta::{Location, TimedAutomaton, Transition};
///
/// let mut ta = TimedAutomaton::new(["a"], Location("s0"), [Location("s0")]);
/// ta.add_transition(Transition::new(Location("s0"), "a", Location("s0")))
///     .unwrap();
/// assert!(ta.accepts_word(&vec![("a".to_string(), 1.0)]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimedAutomaton<L> {
    alphabet: BTreeSet<String>,
    locations: BTreeSet<Location<L>>,
    initial_location: Location<L>,
    final_locations: BTreeSet<Location<L>>,
    clocks: BTreeSet<String>,
    transitions: BTreeMap<Location<L>, Vec<Transition<L>>>,
}

impl<L: Clone + Ord> TimedAutomaton<L> {
    /// Create a new timed automaton without clocks or transitions
    ///
    /// The initial and the final locations are added to the location set.
    pub fn new<S, I, F>(alphabet: I, initial_location: Location<L>, final_locations: F) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
        F: IntoIterator<Item = Location<L>>,
    {
        let final_locations: BTreeSet<_> = final_locations.into_iter().collect();
        let mut locations: BTreeSet<_> = final_locations.iter().cloned().collect();
        locations.insert(initial_location.clone());
        TimedAutomaton {
            alphabet: alphabet.into_iter().map(Into::into).collect(),
            locations,
            initial_location,
            final_locations,
            clocks: BTreeSet::new(),
            transitions: BTreeMap::new(),
        }
    }

    /// Add a location to the automaton
    pub fn add_location(&mut self, location: Location<L>) {
        self.locations.insert(location);
    }

    /// Add a symbol to the alphabet of the automaton
    pub fn add_action<S: Into<String>>(&mut self, symbol: S) {
        self.alphabet.insert(symbol.into());
    }

    /// Add a clock to the automaton
    pub fn add_clock<S: Into<String>>(&mut self, clock: S) {
        self.clocks.insert(clock.into());
    }

    /// Mark a location as final, adding it to the location set if necessary
    pub fn add_final_location(&mut self, location: Location<L>) {
        self.locations.insert(location.clone());
        self.final_locations.insert(location);
    }

    /// Add a transition to the automaton
    ///
    /// Returns an error if the transition references a location, clock or
    /// symbol that is unknown to the automaton.
    pub fn add_transition(
        &mut self,
        transition: Transition<L>,
    ) -> Result<(), TimedAutomatonError<L>> {
        if !self.locations.contains(&transition.source) {
            return Err(TimedAutomatonError::UnknownLocation(
                transition.source.clone(),
            ));
        }
        if !self.locations.contains(&transition.target) {
            return Err(TimedAutomatonError::UnknownLocation(
                transition.target.clone(),
            ));
        }
        if !self.alphabet.contains(&transition.symbol) {
            return Err(TimedAutomatonError::UnknownSymbol(transition.symbol));
        }
        if let Some(clock) = transition
            .guard
            .keys()
            .chain(transition.resets.iter())
            .find(|clock| !self.clocks.contains(*clock))
        {
            return Err(TimedAutomatonError::UnknownClock(clock.clone()));
        }
        self.transitions
            .entry(transition.source.clone())
            .or_default()
            .push(transition);
        Ok(())
    }

    /// The alphabet of the automaton
    pub fn get_alphabet(&self) -> &BTreeSet<String> {
        &self.alphabet
    }

    /// The locations of the automaton
    pub fn get_locations(&self) -> &BTreeSet<Location<L>> {
        &self.locations
    }

    /// The initial location of the automaton
    pub fn get_initial_location(&self) -> &Location<L> {
        &self.initial_location
    }

    /// The final locations of the automaton
    pub fn get_final_locations(&self) -> &BTreeSet<Location<L>> {
        &self.final_locations
    }

    /// The clocks of the automaton
    pub fn get_clocks(&self) -> &BTreeSet<String> {
        &self.clocks
    }

    /// An iterator over all transitions of the automaton
    pub fn get_transitions(&self) -> impl Iterator<Item = &Transition<L>> {
        self.transitions.values().flatten()
    }

    /// The initial configuration: the initial location with all clocks at 0
    pub fn get_initial_configuration(&self) -> Configuration<L> {
        Configuration {
            location: self.initial_location.clone(),
            clock_valuations: self.clocks.iter().map(|c| (c.clone(), 0.0)).collect(),
        }
    }

    /// Check whether the configuration is in a final location
    pub fn is_accepting_configuration(&self, configuration: &Configuration<L>) -> bool {
        self.final_locations.contains(&configuration.location)
    }

    /// All configurations reachable by taking a `symbol`-transition from the
    /// given configuration
    ///
    /// The automaton may be non-deterministic, so there may be several
    /// successors. Clocks reset by the taken transition are set to 0.
    pub fn make_symbol_step(
        &self,
        configuration: &Configuration<L>,
        symbol: &str,
    ) -> Vec<Configuration<L>> {
        self.transitions
            .get(&configuration.location)
            .into_iter()
            .flatten()
            .filter(|t| t.symbol == symbol && t.is_enabled(&configuration.clock_valuations))
            .map(|t| Configuration {
                location: t.target.clone(),
                clock_valuations: configuration
                    .clock_valuations
                    .iter()
                    .map(|(clock, value)| {
                        if t.resets.contains(clock) {
                            (clock.clone(), 0.0)
                        } else {
                            (clock.clone(), *value)
                        }
                    })
                    .collect(),
            })
            .collect()
    }

    /// Check whether the automaton accepts the given timed word
    ///
    /// Words with decreasing timestamps are rejected.
    pub fn accepts_word(&self, word: &TimedWord) -> bool {
        self.accepts_word_from(&self.get_initial_configuration(), word, 0.0)
    }

    fn accepts_word_from(
        &self,
        configuration: &Configuration<L>,
        word: &[(String, Time)],
        last_time: Time,
    ) -> bool {
        let Some(((symbol, time), rest)) = word.split_first() else {
            return self.is_accepting_configuration(configuration);
        };
        if *time < last_time {
            return false;
        }
        let elapsed = configuration.make_time_step(time - last_time);
        self.make_symbol_step(&elapsed, symbol)
            .iter()
            .any(|successor| self.accepts_word_from(successor, rest, *time))
    }
}

impl<L: Clone + Ord + fmt::Display> fmt::Display for TimedAutomaton<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "alphabet: {{{}}}", join_displayed(&self.alphabet, ", "))?;
        writeln!(f, "clocks: {{{}}}", join_displayed(&self.clocks, ", "))?;
        writeln!(
            f,
            "locations: {{{}}}",
            join_displayed(&self.locations, ", ")
        )?;
        writeln!(f, "initial location: {}", self.initial_location)?;
        writeln!(
            f,
            "final locations: {{{}}}",
            join_displayed(&self.final_locations, ", ")
        )?;
        let transitions = join_displayed(self.get_transitions(), "\n");
        write!(f, "transitions:\n{}", indent_lines(&transitions))
    }
}
