//! Extraction of a controller automaton from a winning search tree
//!
//! When the root of a labeled search tree is `Top`, the subtree of
//! `Top`-labeled nodes encodes a winning strategy. It is materialized as a
//! timed automaton whose locations are the word sets of the winning nodes:
//! for every winning child there is a transition labeled with the action
//! that reaches it, guarded by the clock constraints of the time-successor
//! region in which the action was taken.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use mtlsyn_automata::regions::{RegionIndex, get_clock_constraints_from_region_index};
use mtlsyn_automata::ta::{Location, TimedAutomaton, Transition};
use mtlsyn_display_utils::join_displayed;

use crate::canonical_word::{ABRegionSymbol, CanonicalABWord, get_nth_time_successor, word_to_string};
use crate::reg_a::reg_a;
use crate::search_tree::{NodeLabel, SearchTreeNode};

/// A set of canonical words, used as the location type of the controller
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalWords<L>(pub BTreeSet<CanonicalABWord<L>>);

impl<L: fmt::Display> fmt::Display for CanonicalWords<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{{{}}}",
            join_displayed(self.0.iter().map(word_to_string), ", ")
        )
    }
}

/// Errors that can occur while extracting a controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerCreationError {
    /// The given node is not labeled as winning for the controller
    RootNotTop,
}

impl fmt::Display for ControllerCreationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ControllerCreationError::RootNotTop => {
                write!(
                    f,
                    "Cannot create a controller for a node that is not labeled with Top"
                )
            }
        }
    }
}

impl std::error::Error for ControllerCreationError {}

/// Build a controller automaton from the `Top`-labeled subtree under `root`
///
/// Clock resets are currently not reconstructed: it is unclear how to match
/// the words of a node against the words of its children to recover them,
/// so every controller transition has an empty reset set.
pub fn create_controller<L: Clone + Ord + std::fmt::Debug>(
    root: &Arc<SearchTreeNode<L>>,
    k: RegionIndex,
) -> Result<TimedAutomaton<CanonicalWords<L>>, ControllerCreationError> {
    let mut controller = TimedAutomaton::new(
        Vec::<String>::new(),
        Location(CanonicalWords(root.words.clone())),
        [],
    );
    add_node_to_controller(root, k, &mut controller)?;
    Ok(controller)
}

fn add_node_to_controller<L: Clone + Ord + std::fmt::Debug>(
    node: &Arc<SearchTreeNode<L>>,
    k: RegionIndex,
    controller: &mut TimedAutomaton<CanonicalWords<L>>,
) -> Result<(), ControllerCreationError> {
    if node.label() != NodeLabel::Top {
        return Err(ControllerCreationError::RootNotTop);
    }
    let source = Location(CanonicalWords(node.words.clone()));
    for successor in node.children.read().unwrap().iter() {
        if successor.label() != NodeLabel::Top {
            continue;
        }
        let target = Location(CanonicalWords(successor.words.clone()));
        controller.add_location(target.clone());
        controller.add_final_location(target.clone());
        for (region_increment, action) in &successor.incoming_actions {
            controller.add_action(action.clone());
            let mut transition =
                Transition::new(source.clone(), action.clone(), target.clone());
            if let Some(word) = node.words.first() {
                let time_successor = get_nth_time_successor(&reg_a(word), *region_increment, k);
                for group in &time_successor {
                    for symbol in group {
                        if let ABRegionSymbol::TARegionState(state) = symbol {
                            controller.add_clock(state.clock.clone());
                            for constraint in
                                get_clock_constraints_from_region_index(state.region_index, k)
                            {
                                transition = transition.with_guard(state.clock.clone(), constraint);
                            }
                        }
                    }
                }
            }
            controller
                .add_transition(transition)
                .expect("controller locations, actions and clocks are added before the transition");
        }
        add_node_to_controller(successor, k, controller)?;
    }
    Ok(())
}
