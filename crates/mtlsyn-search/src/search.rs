//! The game tree search for a winning controller
//!
//! Starting from the canonical word of the initial joint configuration, the
//! search expands nodes in the order given by a heuristic, either on a
//! priority thread pool or deterministically one step at a time. Expansion
//! classifies a node as bad (plant and specification both accept), good
//! (the specification is unsatisfiable or an ancestor dominates the node)
//! or inner, in which case its symbolic successors are partitioned into
//! children by their controller-observable projection.
//!
//! Labels are computed either in a batch pass after the tree is complete or
//! incrementally while the search is still running; both yield the same
//! labels on every node.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use log::trace;
use mtlsyn_automata::ata::AlternatingTimedAutomaton;
use mtlsyn_automata::regions::RegionIndex;
use mtlsyn_automata::ta::TimedAutomaton;
use mtlsyn_logic::MTLFormula;

use crate::canonical_word::{
    ABRegionSymbol, CanonicalABWord, get_candidate, get_canonical_word, get_time_successors,
};
use crate::heuristics::Heuristic;
use crate::operators::set_monotonically_dominates;
use crate::priority_pool::PriorityThreadPool;
use crate::reg_a::reg_a;
use crate::search_tree::{LabelReason, NodeLabel, NodeState, SearchTreeNode};
use crate::synchronous_product::get_next_canonical_words;

/// Check whether some word of the node avoids the specification sink
///
/// If every word contains the sink in one of its groups, no branch of the
/// specification automaton can ever accept from this node.
pub fn has_satisfiable_ata_configuration<L: Ord>(
    node: &SearchTreeNode<L>,
    sink: &MTLFormula,
) -> bool {
    !node.words.iter().all(|word| {
        word.iter().any(|group| {
            group.iter().any(|symbol| {
                matches!(symbol, ABRegionSymbol::ATARegionState(state) if state.formula == *sink)
            })
        })
    })
}

struct SearchContext<L> {
    ta: Arc<TimedAutomaton<L>>,
    ata: Arc<AlternatingTimedAutomaton<MTLFormula>>,
    controller_actions: BTreeSet<String>,
    environment_actions: BTreeSet<String>,
    k: RegionIndex,
    incremental_labeling: bool,
    terminate_early: bool,
    heuristic: Mutex<Box<dyn Heuristic<L> + Send>>,
}

/// Search the tree of canonical words for a winning controller strategy
pub struct TreeSearch<L> {
    context: Arc<SearchContext<L>>,
    pool: PriorityThreadPool<i64>,
    root: Arc<SearchTreeNode<L>>,
}

impl<L: Clone + Ord + Send + Sync + 'static> TreeSearch<L> {
    /// Initialize the search
    ///
    /// The controller and environment actions must partition the plant
    /// alphabet. `k` is the maximal constant occurring in any clock
    /// constraint of the plant or the specification.
    #[allow(clippy::too_many_arguments)]
    pub fn new<S: Into<String>>(
        ta: Arc<TimedAutomaton<L>>,
        ata: Arc<AlternatingTimedAutomaton<MTLFormula>>,
        controller_actions: impl IntoIterator<Item = S>,
        environment_actions: impl IntoIterator<Item = S>,
        k: RegionIndex,
        incremental_labeling: bool,
        terminate_early: bool,
        heuristic: Box<dyn Heuristic<L> + Send>,
    ) -> Self {
        let controller_actions: BTreeSet<String> =
            controller_actions.into_iter().map(Into::into).collect();
        let environment_actions: BTreeSet<String> =
            environment_actions.into_iter().map(Into::into).collect();
        debug_assert!(controller_actions.is_disjoint(&environment_actions));
        let root = SearchTreeNode::new(
            BTreeSet::from([get_canonical_word(
                &ta.get_initial_configuration(),
                &ata.get_initial_configuration(),
                k,
            )]),
            None,
            BTreeSet::new(),
        );
        let context = Arc::new(SearchContext {
            ta,
            ata,
            controller_actions,
            environment_actions,
            k,
            incremental_labeling,
            terminate_early,
            heuristic: Mutex::new(heuristic),
        });
        let pool = PriorityThreadPool::new();
        SearchContext::add_node_to_queue(&context, &pool, &root);
        TreeSearch {
            context,
            pool,
            root,
        }
    }

    /// The root of the search tree
    pub fn get_root(&self) -> &Arc<SearchTreeNode<L>> {
        &self.root
    }

    /// Build the complete search tree
    ///
    /// With `multi_threaded` set, the node expansions run on the thread
    /// pool; otherwise the queue is processed synchronously.
    pub fn build_tree(&self, multi_threaded: bool) {
        if multi_threaded {
            self.pool.start();
            self.pool.wait();
            self.pool.stop();
        } else {
            while self.step() {}
        }
    }

    /// Dequeue and run a single expansion job
    ///
    /// Returns false if the queue was empty.
    pub fn step(&self) -> bool {
        let job = self.pool.queue_access().pop();
        match job {
            Some((_, job)) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Compute the labels of the whole tree in a post-order pass
    pub fn label(&self) {
        self.label_node(&Arc::clone(&self.root));
    }

    fn label_node(&self, node: &Arc<SearchTreeNode<L>>) {
        match node.state() {
            NodeState::Good | NodeState::Dead => {
                node.set_label(NodeLabel::Top, self.context.terminate_early);
            }
            NodeState::Bad => {
                node.set_label(NodeLabel::Bottom, self.context.terminate_early);
            }
            NodeState::Unknown => {
                let children: Vec<_> = node.children.read().unwrap().clone();
                for child in &children {
                    self.label_node(child);
                }
                let mut first_good_controller_step = RegionIndex::MAX;
                let mut first_bad_environment_step = RegionIndex::MAX;
                let mut found_bad = false;
                for child in &children {
                    for (step, action) in &child.incoming_actions {
                        if child.label() == NodeLabel::Top
                            && self.context.controller_actions.contains(action)
                        {
                            first_good_controller_step = first_good_controller_step.min(*step);
                        } else if child.label() == NodeLabel::Bottom
                            && self.context.environment_actions.contains(action)
                        {
                            found_bad = true;
                            first_bad_environment_step = first_bad_environment_step.min(*step);
                        }
                    }
                }
                if !found_bad {
                    node.set_label_reason(LabelReason::NoBadEnvironmentAction);
                    node.set_label(NodeLabel::Top, self.context.terminate_early);
                } else if first_good_controller_step < first_bad_environment_step {
                    node.set_label_reason(LabelReason::GoodControllerActionFirst);
                    node.set_label(NodeLabel::Top, self.context.terminate_early);
                } else {
                    node.set_label_reason(LabelReason::BadEnvironmentActionFirst);
                    node.set_label(NodeLabel::Bottom, self.context.terminate_early);
                }
            }
        }
    }

    /// The number of nodes in the tree
    pub fn get_size(&self) -> usize {
        crate::search_tree::preorder(&self.root).len()
    }
}

impl<L: Clone + Ord + Send + Sync + 'static> SearchContext<L> {
    fn add_node_to_queue(
        context: &Arc<SearchContext<L>>,
        pool: &PriorityThreadPool<i64>,
        node: &Arc<SearchTreeNode<L>>,
    ) {
        let cost = context.heuristic.lock().unwrap().compute_cost(node);
        let job_context = Arc::clone(context);
        let job_pool = pool.clone();
        let job_node = Arc::clone(node);
        pool.add_job(
            move || Self::expand_node(&job_context, &job_pool, &job_node),
            -cost,
        );
    }

    /// Check whether some word of the node is accepted by both the plant
    /// and the specification automaton
    fn is_bad_node(&self, node: &SearchTreeNode<L>) -> bool {
        node.words.iter().any(|word| {
            let (ta_configuration, ata_configuration) = get_candidate(word);
            ta_configuration
                .is_some_and(|configuration| self.ta.is_accepting_configuration(&configuration))
                && self.ata.is_accepting_configuration(&ata_configuration)
        })
    }

    /// Check whether an ancestor of the node monotonically dominates it
    fn dominates_ancestor(&self, node: &SearchTreeNode<L>) -> bool {
        let mut ancestor = node.parent.upgrade();
        while let Some(current) = ancestor {
            if set_monotonically_dominates(&current.words, &node.words) {
                return true;
            }
            ancestor = current.parent.upgrade();
        }
        false
    }

    /// Process and expand a single node
    fn expand_node(
        context: &Arc<SearchContext<L>>,
        pool: &PriorityThreadPool<i64>,
        node: &Arc<SearchTreeNode<L>>,
    ) {
        if node.is_expanded.load(Ordering::SeqCst) || node.label() != NodeLabel::Unlabeled {
            return;
        }
        if context.is_bad_node(node) {
            node.set_label_reason(LabelReason::BadNode);
            node.set_state(NodeState::Bad);
            node.is_expanded.store(true, Ordering::SeqCst);
            if context.incremental_labeling {
                node.set_label(NodeLabel::Bottom, context.terminate_early);
                node.label_propagate(
                    &context.controller_actions,
                    &context.environment_actions,
                    context.terminate_early,
                );
            }
            return;
        }
        let satisfiable = match context.ata.get_sink_location() {
            Some(sink) => has_satisfiable_ata_configuration(node, sink),
            None => true,
        };
        if !satisfiable {
            node.set_label_reason(LabelReason::NoAtaSuccessor);
            node.set_state(NodeState::Good);
            node.is_expanded.store(true, Ordering::SeqCst);
            if context.incremental_labeling {
                node.set_label(NodeLabel::Top, context.terminate_early);
                node.label_propagate(
                    &context.controller_actions,
                    &context.environment_actions,
                    context.terminate_early,
                );
            }
            return;
        }
        if context.dominates_ancestor(node) {
            node.set_label_reason(LabelReason::MonotonicDomination);
            node.set_state(NodeState::Good);
            node.is_expanded.store(true, Ordering::SeqCst);
            if context.incremental_labeling {
                node.set_label(NodeLabel::Top, context.terminate_early);
                node.label_propagate(
                    &context.controller_actions,
                    &context.environment_actions,
                    context.terminate_early,
                );
            }
            return;
        }

        // Pre-compute the time successors of each word; they are shared
        // across all symbols.
        let time_successors: BTreeMap<&CanonicalABWord<L>, _> = node
            .words
            .iter()
            .map(|word| (word, get_time_successors(word, context.k)))
            .collect();
        // Partition the successors into child classes by their reg_a
        // projection.
        let mut child_words: BTreeMap<CanonicalABWord<L>, BTreeSet<CanonicalABWord<L>>> =
            BTreeMap::new();
        let mut child_actions: BTreeMap<CanonicalABWord<L>, BTreeSet<(RegionIndex, String)>> =
            BTreeMap::new();
        for symbol in context.ta.get_alphabet() {
            let mut successors = BTreeSet::new();
            for word in &node.words {
                for (increment, time_successor) in &time_successors[word] {
                    let (ta_candidate, ata_candidate) = get_candidate(time_successor);
                    let Some(ta_candidate) = ta_candidate else {
                        continue;
                    };
                    for next_word in get_next_canonical_words(
                        &context.ta,
                        &context.ata,
                        (&ta_candidate, &ata_candidate),
                        symbol,
                        context.k,
                    ) {
                        successors.insert((*increment, next_word));
                    }
                }
            }
            for (increment, successor) in successors {
                let class = reg_a(&successor);
                child_actions
                    .entry(class.clone())
                    .or_default()
                    .insert((increment, symbol.clone()));
                child_words.entry(class).or_default().insert(successor);
            }
        }
        let children: Vec<Arc<SearchTreeNode<L>>> = child_words
            .into_iter()
            .map(|(class, words)| {
                let actions = child_actions.remove(&class).unwrap_or_default();
                SearchTreeNode::new(words, Some(node), actions)
            })
            .collect();
        trace!("Expanded a node into {} children", children.len());

        // The node may have been canceled while its children were computed;
        // in that case they are discarded without being published.
        if node.label() == NodeLabel::Canceled {
            node.is_expanded.store(true, Ordering::SeqCst);
            return;
        }
        let is_dead = children.is_empty();
        *node.children.write().unwrap() = children;
        node.is_expanded.store(true, Ordering::SeqCst);
        for child in node.children.read().unwrap().iter() {
            Self::add_node_to_queue(context, pool, child);
        }
        if is_dead {
            node.set_state(NodeState::Dead);
            if context.incremental_labeling {
                node.set_label_reason(LabelReason::DeadNode);
                node.set_label(NodeLabel::Top, context.terminate_early);
                node.label_propagate(
                    &context.controller_actions,
                    &context.environment_actions,
                    context.terminate_early,
                );
            }
        }
    }
}
