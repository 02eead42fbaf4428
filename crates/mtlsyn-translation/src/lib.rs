//! Translation of an MTL formula into an alternating timed automaton
//!
//! This crate implements the Ouaknine–Worrell construction: given an MTL
//! formula φ in positive normal form, it builds an alternating timed
//! automaton that accepts exactly the timed words satisfying φ. The
//! locations of the automaton are the until and dual-until subformulas of φ
//! plus a distinguished initial location; the accepting locations are
//! exactly the dual-until subformulas.
//!
//! The automaton also carries a sink location. No transition to the sink is
//! constructed explicitly; a run moves there whenever a transition formula
//! has no model, which marks that branch of the specification as
//! unsatisfiable.

use std::collections::BTreeSet;
use std::fmt;

use log::debug;
use mtlsyn_automata::ata::{AlternatingTimedAutomaton, Transition};
use mtlsyn_automata::ata_formula::Formula;
use mtlsyn_automata::{ClockConstraint, ComparisonOp};
use mtlsyn_logic::{AtomicProposition, BoundType, MTLFormula, TimeInterval};

/// Name of the distinguished initial location of every translated automaton
///
/// The alphabet of the formula must not contain this name.
pub const INITIAL_LOCATION_NAME: &str = "l0";

/// Name of the sink location of every translated automaton
pub const SINK_LOCATION_NAME: &str = "sink";

/// The distinguished initial location as an ATA location
pub fn initial_location() -> MTLFormula {
    MTLFormula::ap(INITIAL_LOCATION_NAME)
}

/// The sink location as an ATA location
pub fn sink_location() -> MTLFormula {
    MTLFormula::ap(SINK_LOCATION_NAME)
}

/// Errors that can occur during the translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// The alphabet contains the reserved initial location name
    AlphabetContainsInitialLocation,
    /// The formula is not in positive normal form
    NotInPositiveNormalForm(MTLFormula),
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TranslationError::AlphabetContainsInitialLocation => {
                write!(
                    f,
                    "The alphabet must not contain the reserved symbol '{INITIAL_LOCATION_NAME}'"
                )
            }
            TranslationError::NotInPositiveNormalForm(formula) => {
                write!(f, "The formula '{formula}' is not in positive normal form")
            }
        }
    }
}

impl std::error::Error for TranslationError {}

/// Clock constraint formula satisfied iff the clock value lies in `interval`
fn create_contains(interval: &TimeInterval) -> Formula<MTLFormula> {
    let lower = match interval.lower_bound() {
        BoundType::Weak => Some(ClockConstraint::new(
            ComparisonOp::GreaterEqual,
            interval.lower(),
        )),
        BoundType::Strict => Some(ClockConstraint::new(ComparisonOp::Greater, interval.lower())),
        BoundType::Infinite => None,
    };
    let upper = match interval.upper_bound() {
        BoundType::Weak => Some(ClockConstraint::new(
            ComparisonOp::LessEqual,
            interval.upper(),
        )),
        BoundType::Strict => Some(ClockConstraint::new(ComparisonOp::Less, interval.upper())),
        BoundType::Infinite => None,
    };
    match (lower, upper) {
        (None, None) => Formula::True,
        (Some(c), None) | (None, Some(c)) => Formula::ClockConstraint(c),
        (Some(l), Some(u)) => {
            Formula::and(Formula::ClockConstraint(l), Formula::ClockConstraint(u))
        }
    }
}

/// Clock constraint formula satisfied iff the clock value lies outside
/// `interval`
fn create_negated_contains(interval: &TimeInterval) -> Formula<MTLFormula> {
    let below = match interval.lower_bound() {
        BoundType::Weak => Some(ClockConstraint::new(ComparisonOp::Less, interval.lower())),
        BoundType::Strict => Some(ClockConstraint::new(
            ComparisonOp::LessEqual,
            interval.lower(),
        )),
        BoundType::Infinite => None,
    };
    let above = match interval.upper_bound() {
        BoundType::Weak => Some(ClockConstraint::new(ComparisonOp::Greater, interval.upper())),
        BoundType::Strict => Some(ClockConstraint::new(
            ComparisonOp::GreaterEqual,
            interval.upper(),
        )),
        BoundType::Infinite => None,
    };
    match (below, above) {
        (None, None) => Formula::False,
        (Some(c), None) | (None, Some(c)) => Formula::ClockConstraint(c),
        (Some(b), Some(a)) => {
            Formula::or(Formula::ClockConstraint(b), Formula::ClockConstraint(a))
        }
    }
}

/// The transition formula fragment activated when reading `symbol` in a
/// configuration where `formula` has to hold
///
/// For temporal subformulas this activates the corresponding location; with
/// `first` set (only for the initial location's transitions) the clock is
/// not reset. Expects the formula in positive normal form.
pub(crate) fn init(
    formula: &MTLFormula,
    symbol: &AtomicProposition,
    first: bool,
) -> Result<Formula<MTLFormula>, TranslationError> {
    match formula {
        MTLFormula::True => Ok(Formula::True),
        MTLFormula::False => Ok(Formula::False),
        MTLFormula::Atomic(ap) => Ok(if ap == symbol {
            Formula::True
        } else {
            Formula::False
        }),
        MTLFormula::Not(inner) => match &**inner {
            MTLFormula::Atomic(ap) => Ok(if ap == symbol {
                Formula::False
            } else {
                Formula::True
            }),
            MTLFormula::True => Ok(Formula::False),
            MTLFormula::False => Ok(Formula::True),
            _ => Err(TranslationError::NotInPositiveNormalForm(formula.clone())),
        },
        MTLFormula::And(lhs, rhs) => Ok(Formula::and(
            init(lhs, symbol, first)?,
            init(rhs, symbol, first)?,
        )),
        MTLFormula::Or(lhs, rhs) => Ok(Formula::or(
            init(lhs, symbol, first)?,
            init(rhs, symbol, first)?,
        )),
        MTLFormula::Until(_, _, _) | MTLFormula::DualUntil(_, _, _) => {
            if first {
                Ok(Formula::Location(formula.clone()))
            } else {
                Ok(Formula::reset(Formula::Location(formula.clone())))
            }
        }
        MTLFormula::Finally(_, _) | MTLFormula::Globally(_, _) => {
            Err(TranslationError::NotInPositiveNormalForm(formula.clone()))
        }
    }
}

/// Translate an MTL formula into an ATA accepting exactly the words that
/// satisfy the formula
///
/// The formula is brought into positive normal form first. If no alphabet is
/// given, the atomic propositions of the formula are used. The alphabet must
/// not contain the reserved initial location name.
///
/// # Example
///
/// ```
/// use mtlsyn_logic::{MTLFormula, TimeInterval};
/// use mtlsyn_translation::translate;
///
/// let spec = MTLFormula::True.until(MTLFormula::ap("a"), TimeInterval::unbounded());
/// let ata = translate(&spec, None).unwrap();
/// // the first symbol initializes the until, the second discharges it
/// assert!(ata.accepts_word(&vec![("a".to_string(), 1.0), ("a".to_string(), 2.0)]));
/// assert!(!ata.accepts_word(&vec![("a".to_string(), 1.0)]));
/// ```
pub fn translate(
    input_formula: &MTLFormula,
    alphabet: Option<BTreeSet<AtomicProposition>>,
) -> Result<AlternatingTimedAutomaton<MTLFormula>, TranslationError> {
    let formula = input_formula.to_positive_normal_form();
    let alphabet = alphabet.unwrap_or_else(|| formula.alphabet());
    if alphabet.contains(&AtomicProposition::new(INITIAL_LOCATION_NAME)) {
        return Err(TranslationError::AlphabetContainsInitialLocation);
    }
    let untils = formula.until_subformulas();
    let dual_untils = formula.dual_until_subformulas();

    let mut transitions = Vec::new();
    for symbol in &alphabet {
        transitions.push(Transition::new(
            initial_location(),
            symbol.name(),
            init(&formula, symbol, true)?,
        ));
        for until in &untils {
            if let MTLFormula::Until(lhs, rhs, interval) = until {
                let transition_formula = Formula::or(
                    Formula::and(init(rhs, symbol, false)?, create_contains(interval)),
                    Formula::and(
                        init(lhs, symbol, false)?,
                        Formula::Location(until.clone()),
                    ),
                );
                transitions.push(Transition::new(
                    until.clone(),
                    symbol.name(),
                    transition_formula,
                ));
            }
        }
        for dual_until in &dual_untils {
            if let MTLFormula::DualUntil(lhs, rhs, interval) = dual_until {
                let transition_formula = Formula::and(
                    Formula::or(init(rhs, symbol, false)?, create_negated_contains(interval)),
                    Formula::or(
                        init(lhs, symbol, false)?,
                        Formula::Location(dual_until.clone()),
                    ),
                );
                transitions.push(Transition::new(
                    dual_until.clone(),
                    symbol.name(),
                    transition_formula,
                ));
            }
        }
    }
    debug!(
        "Translated '{input_formula}' into an ATA with {} locations",
        untils.len() + dual_untils.len() + 1
    );
    Ok(AlternatingTimedAutomaton::new(
        alphabet.iter().map(|ap| ap.name().to_string()),
        initial_location(),
        dual_untils,
        transitions,
        Some(sink_location()),
    ))
}
