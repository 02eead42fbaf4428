//! Cost functions guiding the order of node expansion
//!
//! A heuristic assigns a cost to a search tree node; the search enqueues
//! each node with the negated cost so that cheaper nodes are expanded
//! first. Heuristics may keep internal state (the BFS and DFS orders are
//! realized with monotone counters).

use std::collections::BTreeSet;

use crate::search_tree::SearchTreeNode;

/// A cost function over search tree nodes
pub trait Heuristic<L> {
    /// Compute the cost of expanding `node`; lower costs run first
    fn compute_cost(&mut self, node: &SearchTreeNode<L>) -> i64;
}

/// Expand nodes in breadth-first order
///
/// Realized with a monotonically increasing counter: nodes discovered
/// earlier are cheaper.
#[derive(Debug, Default)]
pub struct BfsHeuristic {
    counter: i64,
}

impl<L> Heuristic<L> for BfsHeuristic {
    fn compute_cost(&mut self, _node: &SearchTreeNode<L>) -> i64 {
        self.counter += 1;
        self.counter
    }
}

/// Expand nodes in depth-first order
///
/// Realized with a monotonically decreasing counter: nodes discovered
/// later are cheaper.
#[derive(Debug, Default)]
pub struct DfsHeuristic {
    counter: i64,
}

impl<L> Heuristic<L> for DfsHeuristic {
    fn compute_cost(&mut self, _node: &SearchTreeNode<L>) -> i64 {
        self.counter -= 1;
        self.counter
    }
}

/// Prefer nodes that are reachable early in time
///
/// The cost of a node is the sum, along the path from the root, of the
/// smallest region increment of each node's incoming actions.
#[derive(Debug, Default)]
pub struct TimeHeuristic;

impl<L> Heuristic<L> for TimeHeuristic {
    fn compute_cost(&mut self, node: &SearchTreeNode<L>) -> i64 {
        let mut cost = node
            .incoming_actions
            .iter()
            .map(|(step, _)| i64::from(*step))
            .min()
            .unwrap_or(0);
        let mut ancestor = node.parent.upgrade();
        while let Some(current) = ancestor {
            cost += current
                .incoming_actions
                .iter()
                .map(|(step, _)| i64::from(*step))
                .min()
                .unwrap_or(0);
            ancestor = current.parent.upgrade();
        }
        cost
    }
}

/// Prefer nodes reached by an environment action
pub struct PreferEnvironmentActionHeuristic {
    environment_actions: BTreeSet<String>,
}

impl PreferEnvironmentActionHeuristic {
    /// Create the heuristic for the given set of environment actions
    pub fn new<S, I>(environment_actions: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        PreferEnvironmentActionHeuristic {
            environment_actions: environment_actions.into_iter().map(Into::into).collect(),
        }
    }
}

impl<L> Heuristic<L> for PreferEnvironmentActionHeuristic {
    fn compute_cost(&mut self, node: &SearchTreeNode<L>) -> i64 {
        if node
            .incoming_actions
            .iter()
            .any(|(_, action)| self.environment_actions.contains(action))
        {
            0
        } else {
            1
        }
    }
}

/// Prefer nodes with few canonical words
#[derive(Debug, Default)]
pub struct NumCanonicalWordsHeuristic;

impl<L> Heuristic<L> for NumCanonicalWordsHeuristic {
    fn compute_cost(&mut self, node: &SearchTreeNode<L>) -> i64 {
        node.words.len() as i64
    }
}

/// A weighted sum of other heuristics
pub struct CompositeHeuristic<L> {
    heuristics: Vec<(i64, Box<dyn Heuristic<L> + Send>)>,
}

impl<L> CompositeHeuristic<L> {
    /// Combine the given `(weight, heuristic)` pairs
    pub fn new(heuristics: Vec<(i64, Box<dyn Heuristic<L> + Send>)>) -> Self {
        CompositeHeuristic { heuristics }
    }
}

impl<L> Heuristic<L> for CompositeHeuristic<L> {
    fn compute_cost(&mut self, node: &SearchTreeNode<L>) -> i64 {
        self.heuristics
            .iter_mut()
            .map(|(weight, heuristic)| *weight * heuristic.compute_cost(node))
            .sum()
    }
}
