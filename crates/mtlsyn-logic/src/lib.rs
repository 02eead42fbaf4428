//! Metric Temporal Logic (MTL) formulas over timed words
//!
//! This crate defines the [`MTLFormula`] type used to describe undesired
//! behaviors of a plant. Formulas are built from atomic propositions, boolean
//! connectives and the timed temporal operators until and dual-until;
//! `finally` and `globally` are provided as derived operators. A formula can
//! be brought into *positive normal form* (negations pushed down to atomic
//! propositions, derived operators expanded), which is the form expected by
//! the translation into an alternating timed automaton.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

pub mod interval;

pub use interval::{BoundType, TimeInterval};

/// An atomic proposition, identified by its name
///
/// Atomic propositions double as the symbols of the timed words a formula is
/// interpreted over.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtomicProposition(String);

impl AtomicProposition {
    /// Create a new atomic proposition with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        AtomicProposition(name.into())
    }

    /// Name of the proposition
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AtomicProposition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Metric Temporal Logic formula
///
/// # Example
///
/// ```
/// use mtlsyn_logic::{AtomicProposition, BoundType, MTLFormula, TimeInterval};
///
/// // a U[2, ∞) b
/// let spec = MTLFormula::ap("a").until(
///     MTLFormula::ap("b"),
///     TimeInterval::new(2, BoundType::Weak, 0, BoundType::Infinite),
/// );
/// assert_eq!(
///     spec.alphabet(),
///     [AtomicProposition::new("a"), AtomicProposition::new("b")]
///         .into_iter()
///         .collect()
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MTLFormula {
    /// Always true
    True,
    /// Always false
    False,
    /// An atomic proposition
    Atomic(AtomicProposition),
    /// Negation ¬
    Not(Box<MTLFormula>),
    /// Conjunction ∧
    And(Box<MTLFormula>, Box<MTLFormula>),
    /// Disjunction ∨
    Or(Box<MTLFormula>, Box<MTLFormula>),
    /// Timed until
    Until(Box<MTLFormula>, Box<MTLFormula>, TimeInterval),
    /// Timed dual until, the dual of [`MTLFormula::Until`]
    DualUntil(Box<MTLFormula>, Box<MTLFormula>, TimeInterval),
    /// Timed finally, derived: `F_I φ = ⊤ U_I φ`
    Finally(Box<MTLFormula>, TimeInterval),
    /// Timed globally, derived: `G_I φ = ⊥ ~U_I φ`
    Globally(Box<MTLFormula>, TimeInterval),
}

impl MTLFormula {
    /// Create a formula consisting of a single atomic proposition
    pub fn ap<S: Into<String>>(name: S) -> Self {
        MTLFormula::Atomic(AtomicProposition::new(name))
    }

    /// `self U_I other`
    pub fn until(self, other: MTLFormula, interval: TimeInterval) -> Self {
        MTLFormula::Until(Box::new(self), Box::new(other), interval)
    }

    /// `self ~U_I other`
    pub fn dual_until(self, other: MTLFormula, interval: TimeInterval) -> Self {
        MTLFormula::DualUntil(Box::new(self), Box::new(other), interval)
    }

    /// `F_I self`
    pub fn finally(self, interval: TimeInterval) -> Self {
        MTLFormula::Finally(Box::new(self), interval)
    }

    /// `G_I self`
    pub fn globally(self, interval: TimeInterval) -> Self {
        MTLFormula::Globally(Box::new(self), interval)
    }

    /// Rewrite the formula into positive normal form
    ///
    /// In the resulting formula, negation only occurs directly above atomic
    /// propositions, and the derived operators `finally` and `globally` are
    /// expanded into until and dual until.
    pub fn to_positive_normal_form(&self) -> MTLFormula {
        match self {
            MTLFormula::True | MTLFormula::False | MTLFormula::Atomic(_) => self.clone(),
            MTLFormula::Not(inner) => inner.negation_normal_form(),
            MTLFormula::And(lhs, rhs) => MTLFormula::And(
                Box::new(lhs.to_positive_normal_form()),
                Box::new(rhs.to_positive_normal_form()),
            ),
            MTLFormula::Or(lhs, rhs) => MTLFormula::Or(
                Box::new(lhs.to_positive_normal_form()),
                Box::new(rhs.to_positive_normal_form()),
            ),
            MTLFormula::Until(lhs, rhs, interval) => MTLFormula::Until(
                Box::new(lhs.to_positive_normal_form()),
                Box::new(rhs.to_positive_normal_form()),
                *interval,
            ),
            MTLFormula::DualUntil(lhs, rhs, interval) => MTLFormula::DualUntil(
                Box::new(lhs.to_positive_normal_form()),
                Box::new(rhs.to_positive_normal_form()),
                *interval,
            ),
            MTLFormula::Finally(inner, interval) => MTLFormula::Until(
                Box::new(MTLFormula::True),
                Box::new(inner.to_positive_normal_form()),
                *interval,
            ),
            MTLFormula::Globally(inner, interval) => MTLFormula::DualUntil(
                Box::new(MTLFormula::False),
                Box::new(inner.to_positive_normal_form()),
                *interval,
            ),
        }
    }

    /// Positive normal form of the negation of the formula
    fn negation_normal_form(&self) -> MTLFormula {
        match self {
            MTLFormula::True => MTLFormula::False,
            MTLFormula::False => MTLFormula::True,
            MTLFormula::Atomic(_) => MTLFormula::Not(Box::new(self.clone())),
            MTLFormula::Not(inner) => inner.to_positive_normal_form(),
            MTLFormula::And(lhs, rhs) => MTLFormula::Or(
                Box::new(lhs.negation_normal_form()),
                Box::new(rhs.negation_normal_form()),
            ),
            MTLFormula::Or(lhs, rhs) => MTLFormula::And(
                Box::new(lhs.negation_normal_form()),
                Box::new(rhs.negation_normal_form()),
            ),
            MTLFormula::Until(lhs, rhs, interval) => MTLFormula::DualUntil(
                Box::new(lhs.negation_normal_form()),
                Box::new(rhs.negation_normal_form()),
                *interval,
            ),
            MTLFormula::DualUntil(lhs, rhs, interval) => MTLFormula::Until(
                Box::new(lhs.negation_normal_form()),
                Box::new(rhs.negation_normal_form()),
                *interval,
            ),
            // ¬F_I φ = G_I ¬φ and ¬G_I φ = F_I ¬φ, expanded
            MTLFormula::Finally(inner, interval) => MTLFormula::DualUntil(
                Box::new(MTLFormula::False),
                Box::new(inner.negation_normal_form()),
                *interval,
            ),
            MTLFormula::Globally(inner, interval) => MTLFormula::Until(
                Box::new(MTLFormula::True),
                Box::new(inner.negation_normal_form()),
                *interval,
            ),
        }
    }

    /// Call `visit` on the formula and all of its subformulas
    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a MTLFormula)) {
        visit(self);
        match self {
            MTLFormula::True | MTLFormula::False | MTLFormula::Atomic(_) => {}
            MTLFormula::Not(inner)
            | MTLFormula::Finally(inner, _)
            | MTLFormula::Globally(inner, _) => inner.walk(visit),
            MTLFormula::And(lhs, rhs)
            | MTLFormula::Or(lhs, rhs)
            | MTLFormula::Until(lhs, rhs, _)
            | MTLFormula::DualUntil(lhs, rhs, _) => {
                lhs.walk(visit);
                rhs.walk(visit);
            }
        }
    }

    /// All until subformulas, including the formula itself if it is an until
    pub fn until_subformulas(&self) -> BTreeSet<MTLFormula> {
        let mut result = BTreeSet::new();
        self.walk(&mut |f| {
            if matches!(f, MTLFormula::Until(_, _, _)) {
                result.insert(f.clone());
            }
        });
        result
    }

    /// All dual-until subformulas, including the formula itself if it is one
    pub fn dual_until_subformulas(&self) -> BTreeSet<MTLFormula> {
        let mut result = BTreeSet::new();
        self.walk(&mut |f| {
            if matches!(f, MTLFormula::DualUntil(_, _, _)) {
                result.insert(f.clone());
            }
        });
        result
    }

    /// The set of atomic propositions occurring in the formula
    pub fn alphabet(&self) -> BTreeSet<AtomicProposition> {
        let mut result = BTreeSet::new();
        self.walk(&mut |f| {
            if let MTLFormula::Atomic(ap) = f {
                result.insert(ap.clone());
            }
        });
        result
    }
}

impl Not for MTLFormula {
    type Output = Self;

    fn not(self) -> Self::Output {
        MTLFormula::Not(Box::new(self))
    }
}

impl BitAnd for MTLFormula {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        MTLFormula::And(Box::new(self), Box::new(rhs))
    }
}

impl BitOr for MTLFormula {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        MTLFormula::Or(Box::new(self), Box::new(rhs))
    }
}

impl fmt::Display for MTLFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MTLFormula::True => write!(f, "⊤"),
            MTLFormula::False => write!(f, "⊥"),
            MTLFormula::Atomic(ap) => write!(f, "{ap}"),
            MTLFormula::Not(inner) => write!(f, "¬{inner}"),
            MTLFormula::And(lhs, rhs) => write!(f, "({lhs} ∧ {rhs})"),
            MTLFormula::Or(lhs, rhs) => write!(f, "({lhs} ∨ {rhs})"),
            MTLFormula::Until(lhs, rhs, interval) if interval.is_unbounded() => {
                write!(f, "({lhs} U {rhs})")
            }
            MTLFormula::Until(lhs, rhs, interval) => write!(f, "({lhs} U{interval} {rhs})"),
            MTLFormula::DualUntil(lhs, rhs, interval) if interval.is_unbounded() => {
                write!(f, "({lhs} ~U {rhs})")
            }
            MTLFormula::DualUntil(lhs, rhs, interval) => write!(f, "({lhs} ~U{interval} {rhs})"),
            MTLFormula::Finally(inner, interval) if interval.is_unbounded() => {
                write!(f, "F {inner}")
            }
            MTLFormula::Finally(inner, interval) => write!(f, "F{interval} {inner}"),
            MTLFormula::Globally(inner, interval) if interval.is_unbounded() => {
                write!(f, "G {inner}")
            }
            MTLFormula::Globally(inner, interval) => write!(f, "G{interval} {inner}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_and_constants_are_normal() {
        let a = MTLFormula::ap("a");
        assert_eq!(a.to_positive_normal_form(), a);
        assert_eq!(MTLFormula::True.to_positive_normal_form(), MTLFormula::True);
        assert_eq!(
            MTLFormula::False.to_positive_normal_form(),
            MTLFormula::False
        );
    }

    #[test]
    fn test_negated_atomic_is_normal() {
        let f = !MTLFormula::ap("a");
        assert_eq!(f.to_positive_normal_form(), f);
    }

    #[test]
    fn test_double_negation_is_removed() {
        let a = MTLFormula::ap("a");
        assert_eq!((!!a.clone()).to_positive_normal_form(), a);
    }

    #[test]
    fn test_de_morgan() {
        let a = MTLFormula::ap("a");
        let b = MTLFormula::ap("b");
        assert_eq!(
            (!(a.clone() & b.clone())).to_positive_normal_form(),
            !a.clone() | !b.clone()
        );
        assert_eq!(
            (!(a.clone() | b.clone())).to_positive_normal_form(),
            !a & !b
        );
    }

    #[test]
    fn test_negated_until_becomes_dual_until() {
        let a = MTLFormula::ap("a");
        let b = MTLFormula::ap("b");
        let interval = TimeInterval::new(1, BoundType::Weak, 3, BoundType::Strict);
        let f = !a.clone().until(b.clone(), interval);
        assert_eq!(
            f.to_positive_normal_form(),
            (!a).dual_until(!b, interval)
        );
    }

    #[test]
    fn test_finally_and_globally_are_expanded() {
        let a = MTLFormula::ap("a");
        let interval = TimeInterval::new(0, BoundType::Weak, 2, BoundType::Weak);
        assert_eq!(
            a.clone().finally(interval).to_positive_normal_form(),
            MTLFormula::True.until(a.clone(), interval)
        );
        assert_eq!(
            a.clone().globally(interval).to_positive_normal_form(),
            MTLFormula::False.dual_until(a.clone(), interval)
        );
        // ¬F_I a = ⊥ ~U_I ¬a
        assert_eq!(
            (!a.clone().finally(interval)).to_positive_normal_form(),
            MTLFormula::False.dual_until(!a, interval)
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let a = MTLFormula::ap("a");
        let b = MTLFormula::ap("b");
        let f = !(a.clone().until(b.clone(), TimeInterval::unbounded()) & !a.clone())
            | b.globally(TimeInterval::unbounded());
        let normalized = f.to_positive_normal_form();
        assert_eq!(normalized.to_positive_normal_form(), normalized);
    }

    #[test]
    fn test_until_subformulas() {
        let a = MTLFormula::ap("a");
        let b = MTLFormula::ap("b");
        let inner = a.clone().until(b.clone(), TimeInterval::unbounded());
        let outer = inner.clone().until(a.clone(), TimeInterval::unbounded());
        let f = outer.clone() & b.clone().dual_until(a, TimeInterval::unbounded());
        assert_eq!(
            f.until_subformulas(),
            [inner, outer].into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(f.dual_until_subformulas().len(), 1);
    }

    #[test]
    fn test_alphabet() {
        let f = MTLFormula::ap("a") & (!MTLFormula::ap("b") | MTLFormula::ap("a"));
        assert_eq!(
            f.alphabet(),
            [AtomicProposition::new("a"), AtomicProposition::new("b")]
                .into_iter()
                .collect()
        );
    }

    #[test]
    fn test_display() {
        let a = MTLFormula::ap("a");
        let b = MTLFormula::ap("b");
        let interval = TimeInterval::new(2, BoundType::Weak, 0, BoundType::Infinite);
        assert_eq!(a.clone().until(b.clone(), interval).to_string(), "(a U[2, ∞) b)");
        assert_eq!((!a.clone() & b.clone()).to_string(), "(¬a ∧ b)");
        assert_eq!(
            a.until(b, TimeInterval::unbounded()).to_string(),
            "(a U b)"
        );
    }
}
