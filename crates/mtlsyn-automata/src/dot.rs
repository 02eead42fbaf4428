//! Visualization of timed automata in the DOT format
//!
//! The [`ToDot`] trait renders an automaton as a graph in the
//! [DOT language](https://graphviz.org/doc/info/lang.html), which can be
//! turned into an image with Graphviz. Final locations are drawn with a
//! double border, the initial location is marked by an incoming arrow.

use std::fmt;

use mtlsyn_display_utils::{indent_lines, join_displayed};

use crate::ta::TimedAutomaton;

/// Graph-level options shared by all rendered automata
const GRAPH_OPTIONS: &str = "rankdir=LR node [fontname=\"Helvetica,Arial,sans-serif\"] \
edge [fontname=\"Helvetica,Arial,sans-serif\"];";

/// Types that can be rendered as a DOT graph
pub trait ToDot {
    /// Render the object in the DOT format
    fn to_dot(&self) -> String;
}

impl<L: Clone + Ord + fmt::Display> ToDot for TimedAutomaton<L> {
    fn to_dot(&self) -> String {
        let mut body = String::new();
        body.push_str(GRAPH_OPTIONS);
        body.push('\n');
        body.push_str("init [shape = point];\n");
        for location in self.get_locations() {
            let shape = if self.get_final_locations().contains(location) {
                "doublecircle"
            } else {
                "circle"
            };
            body.push_str(&format!("\"{location}\" [shape = {shape}];\n"));
        }
        body.push_str(&format!("init -> \"{}\";\n", self.get_initial_location()));
        for transition in self.get_transitions() {
            let mut label = transition.symbol().to_string();
            let guards = transition
                .guard()
                .iter()
                .flat_map(|(clock, cs)| cs.iter().map(move |c| format!("{clock} {c}")));
            let guards = join_displayed(guards, ", ");
            if !guards.is_empty() {
                label.push_str(&format!(", {guards}"));
            }
            if !transition.resets().is_empty() {
                label.push_str(&format!(
                    ", reset {{{}}}",
                    join_displayed(transition.resets().iter(), ", ")
                ));
            }
            body.push_str(&format!(
                "\"{}\" -> \"{}\" [label = \"{}\"];\n",
                transition.source(),
                transition.target(),
                label
            ));
        }
        format!("digraph ta {{\n{}}}\n", indent_lines(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ta::{Location, Transition};
    use crate::{ClockConstraint, ComparisonOp};

    #[test]
    fn test_ta_to_dot() {
        let mut ta = TimedAutomaton::new(["a"], Location("l0"), [Location("l1")]);
        ta.add_clock("x");
        ta.add_transition(
            Transition::new(Location("l0"), "a", Location("l1"))
                .with_guard("x", ClockConstraint::new(ComparisonOp::Less, 1))
                .with_reset("x"),
        )
        .unwrap();
        let dot = ta.to_dot();
        assert!(dot.starts_with("digraph ta {"));
        assert!(dot.contains("\"l1\" [shape = doublecircle];"));
        assert!(dot.contains("\"l0\" [shape = circle];"));
        assert!(dot.contains("init -> \"l0\";"));
        assert!(dot.contains("\"l0\" -> \"l1\" [label = \"a, x < 1, reset {x}\"];"));
    }
}
