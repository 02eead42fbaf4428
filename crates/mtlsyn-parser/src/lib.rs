//! Parser for the mtlsyn synthesis problem format
//!
//! The parser uses the [pest](https://pest.rs/) parser generator with the
//! grammar defined in `problem.pest`. A problem file contains the plant as
//! a timed automaton, the undesired behavior as an MTL formula, the
//! partition of the alphabet into controller and environment actions, and
//! the maximal constant K:
//!
//! ```text
//! plant robot {
//!     alphabet a, b;
//!     clocks x;
//!     locations l0, l1;
//!     initial l0;
//!     accepting l0, l1;
//!     transitions {
//!         l0 -> l0 on a when x > 1 reset x;
//!         l0 -> l1 on b when x < 1;
//!     }
//! }
//! avoid a U[2, inf) b;
//! controller a;
//! environment b;
//! K = 2;
//! ```

use std::collections::BTreeSet;

use anyhow::{Context, Error, anyhow};
use lazy_static::lazy_static;
use log::debug;
use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

use mtlsyn_automata::regions::RegionIndex;
use mtlsyn_automata::ta::{Location, TimedAutomaton, Transition};
use mtlsyn_automata::{ClockConstraint, ComparisonOp};
use mtlsyn_logic::{BoundType, MTLFormula, TimeInterval};

#[allow(missing_docs)]
#[derive(Parser)]
#[grammar = "./problem.pest"]
struct PestProblemParser;

// Operator precedence of the MTL formula grammar, lowest to highest.
lazy_static! {
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        .op(Op::infix(Rule::or_op, Assoc::Left))
        .op(Op::infix(Rule::and_op, Assoc::Left))
        .op(Op::infix(Rule::until_op, Assoc::Right)
            | Op::infix(Rule::dual_until_op, Assoc::Right))
        .op(Op::prefix(Rule::not_op))
        .op(Op::prefix(Rule::finally_op) | Op::prefix(Rule::globally_op));
}

/// A parsed synthesis problem
#[derive(Debug, Clone)]
pub struct SynthesisProblem {
    /// Name of the plant
    pub name: String,
    /// The plant to be controlled
    pub plant: TimedAutomaton<String>,
    /// The undesired behavior
    pub specification: MTLFormula,
    /// The actions the controller may choose
    pub controller_actions: BTreeSet<String>,
    /// The actions controlled by the environment
    pub environment_actions: BTreeSet<String>,
    /// The maximal constant of the region abstraction
    pub k: RegionIndex,
}

/// Parser for the mtlsyn problem format
#[derive(Debug, Default)]
pub struct ProblemParser;

impl ProblemParser {
    /// Create a new parser
    pub fn new() -> Self {
        ProblemParser
    }

    /// Parse a synthesis problem from its textual representation
    pub fn parse_problem(&self, input: &str) -> Result<SynthesisProblem, Error> {
        let mut pairs = PestProblemParser::parse(Rule::problem, input)
            .map_err(|e| anyhow!("Failed to parse the problem file:\n{e}"))?;
        let problem = pairs
            .next()
            .ok_or_else(|| anyhow!("The problem file is empty"))?;

        let mut plant = None;
        let mut name = String::new();
        let mut specification = None;
        let mut controller_actions = BTreeSet::new();
        let mut environment_actions = BTreeSet::new();
        let mut k = None;
        for section in problem.into_inner() {
            match section.as_rule() {
                Rule::plant => {
                    let (plant_name, automaton) = parse_plant(section)?;
                    name = plant_name;
                    plant = Some(automaton);
                }
                Rule::specification => {
                    specification = Some(parse_formula(section.into_inner())?);
                }
                Rule::controller_decl => {
                    controller_actions = parse_identifier_list(section);
                }
                Rule::environment_decl => {
                    environment_actions = parse_identifier_list(section);
                }
                Rule::constant_decl => {
                    k = Some(parse_constant(section)?);
                }
                Rule::EOI => {}
                rule => return Err(anyhow!("Unexpected section {rule:?}")),
            }
        }
        let plant = plant.ok_or_else(|| anyhow!("The problem file misses the plant"))?;
        let specification =
            specification.ok_or_else(|| anyhow!("The problem file misses the specification"))?;
        let k = k.ok_or_else(|| anyhow!("The problem file misses the constant K"))?;

        validate_action_partition(&plant, &controller_actions, &environment_actions)?;
        debug!(
            "Parsed plant '{name}' with {} locations against '{specification}'",
            plant.get_locations().len()
        );
        Ok(SynthesisProblem {
            name,
            plant,
            specification,
            controller_actions,
            environment_actions,
            k,
        })
    }
}

/// Collect the identifiers of a section containing an identifier list
fn parse_identifier_list(section: Pair<Rule>) -> BTreeSet<String> {
    section
        .into_inner()
        .flat_map(|list| list.into_inner())
        .map(|identifier| identifier.as_str().to_string())
        .collect()
}

fn parse_constant(section: Pair<Rule>) -> Result<RegionIndex, Error> {
    let integer = section
        .into_inner()
        .next()
        .ok_or_else(|| anyhow!("The constant declaration misses its value"))?;
    integer
        .as_str()
        .parse()
        .with_context(|| "Failed to parse the constant K")
}

fn parse_comparison(text: &str) -> Result<ComparisonOp, Error> {
    match text {
        "<" => Ok(ComparisonOp::Less),
        "<=" => Ok(ComparisonOp::LessEqual),
        "==" => Ok(ComparisonOp::Equal),
        "!=" => Ok(ComparisonOp::NotEqual),
        ">=" => Ok(ComparisonOp::GreaterEqual),
        ">" => Ok(ComparisonOp::Greater),
        _ => Err(anyhow!("Unknown comparison operator '{text}'")),
    }
}

fn parse_plant(section: Pair<Rule>) -> Result<(String, TimedAutomaton<String>), Error> {
    let mut name = String::new();
    let mut alphabet = BTreeSet::new();
    let mut clocks = BTreeSet::new();
    let mut locations: BTreeSet<String> = BTreeSet::new();
    let mut initial = None;
    let mut accepting = BTreeSet::new();
    let mut transitions = Vec::new();
    for part in section.into_inner() {
        match part.as_rule() {
            Rule::identifier => name = part.as_str().to_string(),
            Rule::alphabet_decl => alphabet = parse_identifier_list(part),
            Rule::clocks_decl => clocks = parse_identifier_list(part),
            Rule::locations_decl => locations = parse_identifier_list(part),
            Rule::initial_decl => {
                initial = part.into_inner().next().map(|p| p.as_str().to_string());
            }
            Rule::accepting_decl => accepting = parse_identifier_list(part),
            Rule::transitions_decl => transitions = part.into_inner().collect(),
            rule => return Err(anyhow!("Unexpected rule {rule:?} in the plant")),
        }
    }
    let initial = initial.ok_or_else(|| anyhow!("The plant misses its initial location"))?;
    if !locations.contains(&initial) {
        return Err(anyhow!("The initial location '{initial}' is not declared"));
    }
    if let Some(unknown) = accepting.iter().find(|l| !locations.contains(*l)) {
        return Err(anyhow!("The accepting location '{unknown}' is not declared"));
    }

    let mut automaton = TimedAutomaton::new(
        alphabet,
        Location(initial),
        accepting.into_iter().map(Location),
    );
    for location in locations {
        automaton.add_location(Location(location));
    }
    for clock in clocks {
        automaton.add_clock(clock);
    }
    for transition in transitions {
        let transition = parse_transition(transition)?;
        automaton
            .add_transition(transition)
            .map_err(|e| anyhow!("Invalid transition in plant '{name}': {e}"))?;
    }
    Ok((name, automaton))
}

fn parse_transition(pair: Pair<Rule>) -> Result<Transition<String>, Error> {
    let mut parts = pair.into_inner();
    let source = parts
        .next()
        .ok_or_else(|| anyhow!("A transition misses its source location"))?;
    let target = parts
        .next()
        .ok_or_else(|| anyhow!("A transition misses its target location"))?;
    let symbol = parts
        .next()
        .ok_or_else(|| anyhow!("A transition misses its symbol"))?;
    let mut transition = Transition::new(
        Location(source.as_str().to_string()),
        symbol.as_str(),
        Location(target.as_str().to_string()),
    );
    for clause in parts {
        match clause.as_rule() {
            Rule::guard_clause => {
                for guard in clause.into_inner() {
                    let mut guard_parts = guard.into_inner();
                    let clock = guard_parts
                        .next()
                        .ok_or_else(|| anyhow!("A guard misses its clock"))?;
                    let comparison = guard_parts
                        .next()
                        .ok_or_else(|| anyhow!("A guard misses its comparison"))?;
                    let constant = guard_parts
                        .next()
                        .ok_or_else(|| anyhow!("A guard misses its constant"))?;
                    transition = transition.with_guard(
                        clock.as_str(),
                        ClockConstraint::new(
                            parse_comparison(comparison.as_str())?,
                            constant
                                .as_str()
                                .parse()
                                .with_context(|| "Failed to parse a guard constant")?,
                        ),
                    );
                }
            }
            Rule::reset_clause => {
                for clock in clause.into_inner().flat_map(|list| list.into_inner()) {
                    transition = transition.with_reset(clock.as_str());
                }
            }
            rule => return Err(anyhow!("Unexpected rule {rule:?} in a transition")),
        }
    }
    Ok(transition)
}

/// Parse an MTL formula with the precedence defined by [`PRATT_PARSER`]
fn parse_formula(pairs: Pairs<Rule>) -> Result<MTLFormula, Error> {
    PRATT_PARSER
        .map_primary(|primary| match primary.as_rule() {
            Rule::true_literal => Ok(MTLFormula::True),
            Rule::false_literal => Ok(MTLFormula::False),
            Rule::atomic => Ok(MTLFormula::ap(primary.as_str())),
            Rule::mtl_formula => parse_formula(primary.into_inner()),
            rule => Err(anyhow!("Unexpected rule {rule:?} in a formula")),
        })
        .map_prefix(|op, operand| match op.as_rule() {
            Rule::not_op => Ok(!operand?),
            Rule::finally_op => Ok(operand?.finally(operator_interval(op)?)),
            Rule::globally_op => Ok(operand?.globally(operator_interval(op)?)),
            rule => Err(anyhow!("Unexpected prefix operator {rule:?}")),
        })
        .map_infix(|lhs, op, rhs| match op.as_rule() {
            Rule::and_op => Ok(lhs? & rhs?),
            Rule::or_op => Ok(lhs? | rhs?),
            Rule::until_op => Ok(lhs?.until(rhs?, operator_interval(op)?)),
            Rule::dual_until_op => Ok(lhs?.dual_until(rhs?, operator_interval(op)?)),
            rule => Err(anyhow!("Unexpected infix operator {rule:?}")),
        })
        .parse(pairs.filter(|pair| pair.as_rule() != Rule::EOI))
}

/// The interval attached to a temporal operator, defaulting to `[0, ∞)`
fn operator_interval(op: Pair<Rule>) -> Result<TimeInterval, Error> {
    match op
        .into_inner()
        .find(|pair| pair.as_rule() == Rule::interval)
    {
        Some(interval) => parse_interval(interval),
        None => Ok(TimeInterval::unbounded()),
    }
}

fn parse_interval(pair: Pair<Rule>) -> Result<TimeInterval, Error> {
    let mut lower_bound = BoundType::Weak;
    let mut lower = 0;
    let mut upper_bound = BoundType::Infinite;
    let mut upper = 0;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::lower_bracket => {
                lower_bound = if part.as_str() == "[" {
                    BoundType::Weak
                } else {
                    BoundType::Strict
                };
            }
            Rule::integer => {
                lower = part
                    .as_str()
                    .parse()
                    .with_context(|| "Failed to parse an interval endpoint")?;
            }
            Rule::upper_endpoint => {
                if part.as_str() == "inf" {
                    upper_bound = BoundType::Infinite;
                } else {
                    upper = part
                        .as_str()
                        .parse()
                        .with_context(|| "Failed to parse an interval endpoint")?;
                    // the bound type is fixed by the closing bracket
                    upper_bound = BoundType::Weak;
                }
            }
            Rule::upper_bracket => {
                if upper_bound != BoundType::Infinite {
                    upper_bound = if part.as_str() == "]" {
                        BoundType::Weak
                    } else {
                        BoundType::Strict
                    };
                }
            }
            rule => return Err(anyhow!("Unexpected rule {rule:?} in an interval")),
        }
    }
    Ok(TimeInterval::new(lower, lower_bound, upper, upper_bound))
}

/// The controller and environment actions must partition the plant alphabet
fn validate_action_partition(
    plant: &TimedAutomaton<String>,
    controller_actions: &BTreeSet<String>,
    environment_actions: &BTreeSet<String>,
) -> Result<(), Error> {
    if let Some(action) = controller_actions.intersection(environment_actions).next() {
        return Err(anyhow!(
            "The action '{action}' is owned by both the controller and the environment"
        ));
    }
    for action in controller_actions.union(environment_actions) {
        if !plant.get_alphabet().contains(action) {
            return Err(anyhow!("The action '{action}' is not in the plant alphabet"));
        }
    }
    for action in plant.get_alphabet() {
        if !controller_actions.contains(action) && !environment_actions.contains(action) {
            return Err(anyhow!(
                "The action '{action}' is neither a controller nor an environment action"
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtlsyn_logic::BoundType;

    const ROBOT: &str = r#"
        plant robot {
            alphabet a, b;
            clocks x;
            locations l0, l1, l2;
            initial l0;
            accepting l0, l1, l2;
            transitions {
                l0 -> l0 on a when x > 1 reset x;
                l0 -> l1 on b when x < 1;
                l2 -> l1 on b;
            }
        }
        avoid a U[2, inf) b;
        controller a;
        environment b;
        K = 2;
    "#;

    #[test]
    fn test_parse_a_complete_problem() {
        let problem = ProblemParser::new().parse_problem(ROBOT).unwrap();
        assert_eq!(problem.name, "robot");
        assert_eq!(
            problem.plant.get_alphabet(),
            &BTreeSet::from(["a".to_string(), "b".to_string()])
        );
        assert_eq!(problem.plant.get_locations().len(), 3);
        assert_eq!(
            problem.plant.get_initial_location(),
            &Location("l0".to_string())
        );
        assert_eq!(problem.plant.get_clocks(), &BTreeSet::from(["x".to_string()]));
        assert_eq!(problem.plant.get_transitions().count(), 3);
        assert_eq!(
            problem.specification,
            MTLFormula::ap("a").until(
                MTLFormula::ap("b"),
                TimeInterval::new(2, BoundType::Weak, 0, BoundType::Infinite)
            )
        );
        assert_eq!(problem.controller_actions, BTreeSet::from(["a".to_string()]));
        assert_eq!(
            problem.environment_actions,
            BTreeSet::from(["b".to_string()])
        );
        assert_eq!(problem.k, 2);
    }

    #[test]
    fn test_parsed_guards_and_resets() {
        let problem = ProblemParser::new().parse_problem(ROBOT).unwrap();
        let transition = problem
            .plant
            .get_transitions()
            .find(|t| t.symbol() == "a")
            .unwrap();
        assert_eq!(
            transition.guard()["x"],
            vec![ClockConstraint::new(ComparisonOp::Greater, 1)]
        );
        assert_eq!(transition.resets(), &BTreeSet::from(["x".to_string()]));
    }

    #[test]
    fn test_parse_formula_operators() {
        let problem = ProblemParser::new()
            .parse_problem(&ROBOT.replace(
                "avoid a U[2, inf) b;",
                "avoid !a && F(0, 1] (a || b) && G b && true D false;",
            ))
            .unwrap();
        let a = MTLFormula::ap("a");
        let b = MTLFormula::ap("b");
        // conjunction is left-associative, the temporal operators bind
        // stronger
        let expected = (((!a.clone())
            & (a | b.clone()).finally(TimeInterval::new(
                0,
                BoundType::Strict,
                1,
                BoundType::Weak,
            )))
            & b.globally(TimeInterval::unbounded()))
            & MTLFormula::True.dual_until(MTLFormula::False, TimeInterval::unbounded());
        assert_eq!(problem.specification, expected);
    }

    #[test]
    fn test_undeclared_locations_are_rejected() {
        let input = ROBOT.replace("l2 -> l1 on b;", "l3 -> l1 on b;");
        let error = ProblemParser::new().parse_problem(&input).unwrap_err();
        assert!(error.to_string().contains("l3"));
    }

    #[test]
    fn test_incomplete_action_partition_is_rejected() {
        let input = ROBOT.replace("environment b;", "environment a;");
        assert!(ProblemParser::new().parse_problem(&input).is_err());
    }

    #[test]
    fn test_syntax_errors_are_reported() {
        assert!(ProblemParser::new().parse_problem("plant {").is_err());
    }
}
