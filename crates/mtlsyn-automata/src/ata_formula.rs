//! Formulas labeling the transitions of an alternating timed automaton
//!
//! A transition of an ATA does not point to a single successor location but
//! to a positive boolean combination of locations, clock constraints over the
//! automaton's single implicit clock `x`, and clock resets. Taking a
//! transition means choosing a *minimal model* of its formula: a minimal set
//! of (location, clock value) states that satisfies the formula.

use std::collections::BTreeSet;
use std::fmt;

use crate::{ClockConstraint, Time};

/// A single state of an ATA configuration: an active location together with
/// the value of its clock copy
#[derive(Debug, Clone)]
pub struct State<L> {
    /// The active location
    pub location: L,
    /// The clock value of this state
    pub clock_valuation: Time,
}

impl<L> State<L> {
    /// Create a new state
    pub fn new(location: L, clock_valuation: Time) -> Self {
        State {
            location,
            clock_valuation,
        }
    }
}

// Clock valuations are compared with total_cmp so that states can be stored
// in ordered sets.
impl<L: Ord> Ord for State<L> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.location
            .cmp(&other.location)
            .then(self.clock_valuation.total_cmp(&other.clock_valuation))
    }
}

impl<L: Ord> PartialOrd for State<L> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<L: Ord> PartialEq for State<L> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl<L: Ord> Eq for State<L> {}

impl<L: fmt::Display> fmt::Display for State<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.location, self.clock_valuation)
    }
}

/// A positive boolean formula over locations, clock constraints and resets
///
/// # Example
///
/// ```
/// use mtlsyn_automata::ata_formula::Formula;
///
/// let f = Formula::and(Formula::Location("s0"), Formula::Location("s1"));
/// assert_eq!(f.to_string(), "(s0 ∧ s1)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Formula<L> {
    /// Satisfied by the empty set of states
    True,
    /// Unsatisfiable
    False,
    /// Satisfied if the location is active with the current clock value
    Location(L),
    /// Constraint on the current clock value; no state is produced
    ClockConstraint(ClockConstraint),
    /// The subformula is evaluated with the clock reset to 0
    Reset(Box<Formula<L>>),
    /// Conjunction
    And(Box<Formula<L>>, Box<Formula<L>>),
    /// Disjunction
    Or(Box<Formula<L>>, Box<Formula<L>>),
}

impl<L> Formula<L> {
    /// Conjunction of two formulas
    pub fn and(lhs: Formula<L>, rhs: Formula<L>) -> Self {
        Formula::And(Box::new(lhs), Box::new(rhs))
    }

    /// Disjunction of two formulas
    pub fn or(lhs: Formula<L>, rhs: Formula<L>) -> Self {
        Formula::Or(Box::new(lhs), Box::new(rhs))
    }

    /// Reset the clock before evaluating the subformula
    pub fn reset(inner: Formula<L>) -> Self {
        Formula::Reset(Box::new(inner))
    }
}

impl<L: Clone + Ord> Formula<L> {
    /// Compute the minimal models of the formula for the given clock value
    ///
    /// A model is a set of states satisfying the formula, where a location
    /// atom produces a state with the current clock value and a reset atom
    /// produces states with clock value 0. A model is minimal if no strict
    /// subset of it is also a model. An unsatisfiable formula has no models;
    /// a tautology has the single model `∅`.
    pub fn get_minimal_models(&self, clock_valuation: Time) -> BTreeSet<BTreeSet<State<L>>> {
        match self {
            Formula::True => BTreeSet::from([BTreeSet::new()]),
            Formula::False => BTreeSet::new(),
            Formula::Location(location) => BTreeSet::from([BTreeSet::from([State::new(
                location.clone(),
                clock_valuation,
            )])]),
            Formula::ClockConstraint(constraint) => {
                if constraint.is_satisfied(clock_valuation) {
                    BTreeSet::from([BTreeSet::new()])
                } else {
                    BTreeSet::new()
                }
            }
            Formula::Reset(inner) => inner.get_minimal_models(0.0),
            Formula::And(lhs, rhs) => {
                let lhs_models = lhs.get_minimal_models(clock_valuation);
                let rhs_models = rhs.get_minimal_models(clock_valuation);
                let products = lhs_models
                    .iter()
                    .flat_map(|l| {
                        rhs_models
                            .iter()
                            .map(move |r| l.union(r).cloned().collect())
                    })
                    .collect();
                discard_non_minimal(products)
            }
            Formula::Or(lhs, rhs) => {
                let mut models = lhs.get_minimal_models(clock_valuation);
                models.extend(rhs.get_minimal_models(clock_valuation));
                discard_non_minimal(models)
            }
        }
    }
}

/// Remove every model that is a strict superset of another model
fn discard_non_minimal<L: Clone + Ord>(
    models: BTreeSet<BTreeSet<State<L>>>,
) -> BTreeSet<BTreeSet<State<L>>> {
    models
        .iter()
        .filter(|model| {
            !models
                .iter()
                .any(|other| *other != **model && other.is_subset(model))
        })
        .cloned()
        .collect()
}

impl<L: fmt::Display> fmt::Display for Formula<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Formula::True => write!(f, "⊤"),
            Formula::False => write!(f, "⊥"),
            Formula::Location(location) => write!(f, "{location}"),
            Formula::ClockConstraint(constraint) => write!(f, "x {constraint}"),
            Formula::Reset(inner) => write!(f, "x.{inner}"),
            Formula::And(lhs, rhs) => write!(f, "({lhs} ∧ {rhs})"),
            Formula::Or(lhs, rhs) => write!(f, "({lhs} ∨ {rhs})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ComparisonOp;

    #[test]
    fn test_print_constants() {
        assert_eq!(Formula::<String>::True.to_string(), "⊤");
        assert_eq!(Formula::<String>::False.to_string(), "⊥");
    }

    #[test]
    fn test_print_location_formula() {
        assert_eq!(Formula::Location("s0").to_string(), "s0");
        assert_eq!(Formula::Location(5).to_string(), "5");
    }

    #[test]
    fn test_print_clock_constraint_formula() {
        use ComparisonOp::*;
        let cases = [
            (Less, 1, "x < 1"),
            (LessEqual, 2, "x ≤ 2"),
            (Equal, 3, "x = 3"),
            (NotEqual, 4, "x ≠ 4"),
            (GreaterEqual, 5, "x ≥ 5"),
            (Greater, 6, "x > 6"),
        ];
        for (op, constant, expected) in cases {
            let f: Formula<String> =
                Formula::ClockConstraint(ClockConstraint::new(op, constant));
            assert_eq!(f.to_string(), expected);
        }
    }

    #[test]
    fn test_print_conjunction_formula() {
        let f = Formula::and(Formula::Location("s0"), Formula::Location("s1"));
        assert_eq!(f.to_string(), "(s0 ∧ s1)");
        let f = Formula::and(
            Formula::and(Formula::Location("s0"), Formula::Location("s1")),
            Formula::Location("s2"),
        );
        assert_eq!(f.to_string(), "((s0 ∧ s1) ∧ s2)");
        let f = Formula::and(
            Formula::Location("s2"),
            Formula::and(Formula::Location("s0"), Formula::Location("s1")),
        );
        assert_eq!(f.to_string(), "(s2 ∧ (s0 ∧ s1))");
    }

    #[test]
    fn test_print_disjunction_formula() {
        let f = Formula::or(Formula::Location("s0"), Formula::Location("s1"));
        assert_eq!(f.to_string(), "(s0 ∨ s1)");
        let f = Formula::or(
            Formula::and(Formula::Location("s0"), Formula::Location("s1")),
            Formula::Location("s2"),
        );
        assert_eq!(f.to_string(), "((s0 ∧ s1) ∨ s2)");
    }

    #[test]
    fn test_print_reset_clock_formula() {
        let f = Formula::reset(Formula::Location("s0"));
        assert_eq!(f.to_string(), "x.s0");
        let f = Formula::reset(Formula::and(
            Formula::Location("s0"),
            Formula::Location("s1"),
        ));
        assert_eq!(f.to_string(), "x.(s0 ∧ s1)");
    }

    #[test]
    fn test_minimal_models_of_constants() {
        assert_eq!(
            Formula::<String>::True.get_minimal_models(0.0),
            BTreeSet::from([BTreeSet::new()])
        );
        assert!(Formula::<String>::False.get_minimal_models(0.0).is_empty());
    }

    #[test]
    fn test_minimal_models_of_clock_constraints() {
        let f: Formula<String> =
            Formula::ClockConstraint(ClockConstraint::new(ComparisonOp::Greater, 1));
        assert!(f.get_minimal_models(0.5).is_empty());
        assert_eq!(
            f.get_minimal_models(1.5),
            BTreeSet::from([BTreeSet::new()])
        );
    }

    #[test]
    fn test_minimal_models_of_location_and_reset() {
        let f = Formula::Location("s0");
        assert_eq!(
            f.get_minimal_models(1.5),
            BTreeSet::from([BTreeSet::from([State::new("s0", 1.5)])])
        );
        let f = Formula::reset(Formula::Location("s0"));
        assert_eq!(
            f.get_minimal_models(1.5),
            BTreeSet::from([BTreeSet::from([State::new("s0", 0.0)])])
        );
    }

    #[test]
    fn test_minimal_models_of_conjunction() {
        let f = Formula::and(Formula::Location("s0"), Formula::Location("s1"));
        assert_eq!(
            f.get_minimal_models(1.0),
            BTreeSet::from([BTreeSet::from([
                State::new("s0", 1.0),
                State::new("s1", 1.0)
            ])])
        );
    }

    #[test]
    fn test_minimal_models_of_disjunction() {
        let f = Formula::or(Formula::Location("s0"), Formula::Location("s1"));
        assert_eq!(
            f.get_minimal_models(1.0),
            BTreeSet::from([
                BTreeSet::from([State::new("s0", 1.0)]),
                BTreeSet::from([State::new("s1", 1.0)]),
            ])
        );
    }

    #[test]
    fn test_non_minimal_models_are_discarded() {
        // (s0 ∨ (s0 ∧ s1)): the model {s0, s1} is subsumed by {s0}
        let f = Formula::or(
            Formula::Location("s0"),
            Formula::and(Formula::Location("s0"), Formula::Location("s1")),
        );
        assert_eq!(
            f.get_minimal_models(0.0),
            BTreeSet::from([BTreeSet::from([State::new("s0", 0.0)])])
        );
        // (s0 ∧ (s0 ∨ s1)): both conjuncts can be satisfied by s0 alone
        let f = Formula::and(
            Formula::Location("s0"),
            Formula::or(Formula::Location("s0"), Formula::Location("s1")),
        );
        assert_eq!(
            f.get_minimal_models(0.0),
            BTreeSet::from([BTreeSet::from([State::new("s0", 0.0)])])
        );
    }

    #[test]
    fn test_unsatisfied_constraint_prunes_conjunction() {
        let f = Formula::and(
            Formula::Location("s0"),
            Formula::ClockConstraint(ClockConstraint::new(ComparisonOp::Less, 1)),
        );
        assert!(f.get_minimal_models(2.0).is_empty());
        assert_eq!(f.get_minimal_models(0.5).len(), 1);
    }
}
