//! Nodes of the search tree and the incremental labeling rules
//!
//! The tree is strictly owning: every node owns its children, while the
//! parent link is a weak back-reference. Words and incoming actions are
//! immutable once a node is constructed; the node state, the label and the
//! child list are the only mutable fields and are guarded by locks. The
//! `is_expanded` flag is atomic so that every node is expanded by exactly
//! one worker.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, RwLock, Weak};

use log::trace;
use mtlsyn_automata::regions::RegionIndex;
use mtlsyn_display_utils::{indent_lines, join_displayed};

use crate::canonical_word::{CanonicalABWord, word_to_string};

/// The game-theoretic state of a node, determined during expansion
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeState {
    /// Not yet determined
    Unknown,
    /// The node is winning for the controller
    Good,
    /// The node violates the specification
    Bad,
    /// The node has no successors at all
    Dead,
}

/// The label of a node: the final verdict of the game
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeLabel {
    /// Not yet labeled
    Unlabeled,
    /// Winning for the controller
    Top,
    /// Winning for the environment
    Bottom,
    /// Labeling became irrelevant, the node is skipped
    Canceled,
}

/// Why a node received its label, kept for diagnostics and visualization
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LabelReason {
    /// No label assigned yet
    Unknown,
    /// Both the plant and the specification automaton accept
    BadNode,
    /// The node has no successors
    DeadNode,
    /// Every word contains the specification sink
    NoAtaSuccessor,
    /// An ancestor monotonically dominates the node
    MonotonicDomination,
    /// A winning controller action precedes every bad environment action
    GoodControllerActionFirst,
    /// A bad environment action precedes every winning controller action
    BadEnvironmentActionFirst,
    /// No environment action leads to a losing child
    NoBadEnvironmentAction,
}

impl fmt::Display for LabelReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LabelReason::Unknown => write!(f, "unknown"),
            LabelReason::BadNode => write!(f, "bad node"),
            LabelReason::DeadNode => write!(f, "dead node"),
            LabelReason::NoAtaSuccessor => write!(f, "no ATA successor"),
            LabelReason::MonotonicDomination => write!(f, "monotonic domination"),
            LabelReason::GoodControllerActionFirst => {
                write!(f, "good controller action first")
            }
            LabelReason::BadEnvironmentActionFirst => {
                write!(f, "bad environment action first")
            }
            LabelReason::NoBadEnvironmentAction => write!(f, "no bad environment action"),
        }
    }
}

/// A node of the search tree
pub struct SearchTreeNode<L> {
    /// The canonical words of this node, all with the same `reg_a`
    /// projection
    pub words: BTreeSet<CanonicalABWord<L>>,
    /// Back-reference to the parent; empty for the root
    pub parent: Weak<SearchTreeNode<L>>,
    /// The `(region increment, action)` pairs that reach this node
    pub incoming_actions: BTreeSet<(RegionIndex, String)>,
    /// The children, published once after expansion
    pub children: RwLock<Vec<Arc<SearchTreeNode<L>>>>,
    state: Mutex<NodeState>,
    label: Mutex<NodeLabel>,
    label_reason: Mutex<LabelReason>,
    /// Set once the node has been expanded (or discarded), never reset
    pub is_expanded: AtomicBool,
}

impl<L> SearchTreeNode<L> {
    /// Create a new node; the caller attaches it to the parent's child list
    pub fn new(
        words: BTreeSet<CanonicalABWord<L>>,
        parent: Option<&Arc<SearchTreeNode<L>>>,
        incoming_actions: BTreeSet<(RegionIndex, String)>,
    ) -> Arc<Self> {
        Arc::new(SearchTreeNode {
            words,
            parent: parent.map(Arc::downgrade).unwrap_or_default(),
            incoming_actions,
            children: RwLock::new(Vec::new()),
            state: Mutex::new(NodeState::Unknown),
            label: Mutex::new(NodeLabel::Unlabeled),
            label_reason: Mutex::new(LabelReason::Unknown),
            is_expanded: AtomicBool::new(false),
        })
    }

    /// The current state of the node
    pub fn state(&self) -> NodeState {
        *self.state.lock().unwrap()
    }

    /// Set the state of the node
    pub fn set_state(&self, state: NodeState) {
        *self.state.lock().unwrap() = state;
    }

    /// The current label of the node
    pub fn label(&self) -> NodeLabel {
        *self.label.lock().unwrap()
    }

    /// The reason for the current label
    pub fn label_reason(&self) -> LabelReason {
        *self.label_reason.lock().unwrap()
    }

    /// Record why the node is about to be labeled
    pub fn set_label_reason(&self, reason: LabelReason) {
        *self.label_reason.lock().unwrap() = reason;
    }

    /// Assign a label to the node
    ///
    /// With `cancel_children` set, labeling a node `Top` or `Bottom` marks
    /// all still-unlabeled descendants as canceled; they are skipped when
    /// dequeued.
    pub fn set_label(&self, label: NodeLabel, cancel_children: bool) {
        *self.label.lock().unwrap() = label;
        if cancel_children && matches!(label, NodeLabel::Top | NodeLabel::Bottom) {
            self.cancel_unlabeled_descendants();
        }
    }

    fn cancel_unlabeled_descendants(&self) {
        for child in self.children.read().unwrap().iter() {
            let canceled = {
                let mut label = child.label.lock().unwrap();
                if *label == NodeLabel::Unlabeled {
                    *label = NodeLabel::Canceled;
                    true
                } else {
                    false
                }
            };
            if canceled {
                child.cancel_unlabeled_descendants();
            }
        }
    }

    /// Try to label the parent now that this node has been labeled, and
    /// continue upwards as long as labels can be determined
    ///
    /// A parent can be labeled before all of its children are: the
    /// controller wins if it has a winning action strictly before every
    /// environment action that still might lose, and the environment wins
    /// if a losing environment action is confirmed and no controller action
    /// before it can still win.
    pub fn label_propagate(
        self: &Arc<Self>,
        controller_actions: &BTreeSet<String>,
        environment_actions: &BTreeSet<String>,
        terminate_early: bool,
    ) {
        let Some(parent) = self.parent.upgrade() else {
            return;
        };
        if parent.label() != NodeLabel::Unlabeled {
            return;
        }
        if let Some((label, reason)) =
            parent.determine_label(controller_actions, environment_actions)
        {
            trace!("Propagated label {label:?} ({reason})");
            parent.set_label_reason(reason);
            parent.set_label(label, terminate_early);
            parent.label_propagate(controller_actions, environment_actions, terminate_early);
        }
    }

    /// Determine the label of this node from the labels known so far, or
    /// `None` if the verdict still depends on unlabeled children
    fn determine_label(
        &self,
        controller_actions: &BTreeSet<String>,
        environment_actions: &BTreeSet<String>,
    ) -> Option<(NodeLabel, LabelReason)> {
        let children = self.children.read().unwrap();
        let mut first_good_controller_step: Option<RegionIndex> = None;
        let mut first_bad_environment_step: Option<RegionIndex> = None;
        let mut first_undecided_controller_step: Option<RegionIndex> = None;
        let mut first_undecided_environment_step: Option<RegionIndex> = None;
        for child in children.iter() {
            let label = child.label();
            for (step, action) in &child.incoming_actions {
                let controller = controller_actions.contains(action);
                let environment = environment_actions.contains(action);
                match label {
                    NodeLabel::Top if controller => {
                        min_assign(&mut first_good_controller_step, *step);
                    }
                    NodeLabel::Bottom if environment => {
                        min_assign(&mut first_bad_environment_step, *step);
                    }
                    NodeLabel::Unlabeled => {
                        if controller {
                            min_assign(&mut first_undecided_controller_step, *step);
                        }
                        if environment {
                            min_assign(&mut first_undecided_environment_step, *step);
                        }
                    }
                    _ => {}
                }
            }
        }
        // the earliest step at which the environment might still win
        let earliest_possible_bad = min_option(
            first_bad_environment_step,
            first_undecided_environment_step,
        );
        let Some(earliest_possible_bad) = earliest_possible_bad else {
            return Some((NodeLabel::Top, LabelReason::NoBadEnvironmentAction));
        };
        if first_good_controller_step.is_some_and(|good| good < earliest_possible_bad) {
            return Some((NodeLabel::Top, LabelReason::GoodControllerActionFirst));
        }
        if let Some(bad) = first_bad_environment_step {
            // the earliest step at which the controller might still win
            let earliest_possible_good = min_option(
                first_good_controller_step,
                first_undecided_controller_step,
            );
            if earliest_possible_good.is_none_or(|good| good >= bad) {
                return Some((NodeLabel::Bottom, LabelReason::BadEnvironmentActionFirst));
            }
        }
        None
    }
}

fn min_assign(current: &mut Option<RegionIndex>, value: RegionIndex) {
    *current = Some(current.map_or(value, |c| c.min(value)));
}

fn min_option(a: Option<RegionIndex>, b: Option<RegionIndex>) -> Option<RegionIndex> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Collect the node and all of its descendants in preorder
pub fn preorder<L>(node: &Arc<SearchTreeNode<L>>) -> Vec<Arc<SearchTreeNode<L>>> {
    let mut nodes = vec![Arc::clone(node)];
    for child in node.children.read().unwrap().iter() {
        nodes.extend(preorder(child));
    }
    nodes
}

impl<L: fmt::Display> fmt::Display for SearchTreeNode<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let actions = join_displayed(
            self.incoming_actions
                .iter()
                .map(|(step, action)| format!("({step}, {action})")),
            ", ",
        );
        write!(
            f,
            "{{{}}}: {} [{:?}, {:?}]",
            actions,
            join_displayed(self.words.iter().map(word_to_string), ", "),
            self.state(),
            self.label(),
        )
    }
}

/// Render the node, optionally with its whole subtree
pub fn node_to_string<L: fmt::Display>(node: &SearchTreeNode<L>, include_children: bool) -> String {
    let mut result = node.to_string();
    if include_children {
        for child in node.children.read().unwrap().iter() {
            result.push('\n');
            result.push_str(&indent_lines(&node_to_string(child, true)));
        }
    }
    result
}
