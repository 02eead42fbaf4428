//! Tests for the main search algorithm: tree construction, labeling in both
//! batch and incremental mode, and the early-exit classifications.

use std::collections::BTreeSet;
use std::sync::Arc;

use mtlsyn_automata::ata::AlternatingTimedAutomaton;
use mtlsyn_automata::regions::RegionIndex;
use mtlsyn_automata::ta::{Location, TimedAutomaton, Transition};
use mtlsyn_automata::{ClockConstraint, ComparisonOp};
use mtlsyn_logic::{AtomicProposition, BoundType, MTLFormula, TimeInterval};
use mtlsyn_search::canonical_word::{
    ABRegionSymbol, ATARegionState, CanonicalABWord, TARegionState,
};
use mtlsyn_search::heuristics::BfsHeuristic;
use mtlsyn_search::search::{TreeSearch, has_satisfiable_ata_configuration};
use mtlsyn_search::search_tree::{
    NodeLabel, NodeState, SearchTreeNode, node_to_string, preorder,
};
use mtlsyn_translation::translate;

type TA = TimedAutomaton<&'static str>;
type Node = SearchTreeNode<&'static str>;
type Word = CanonicalABWord<&'static str>;

fn ta_state(location: &'static str, clock: &str, region_index: RegionIndex) -> ABRegionSymbol<&'static str> {
    ABRegionSymbol::TARegionState(TARegionState::new(Location(location), clock, region_index))
}

fn ata_state(formula: &MTLFormula, region_index: RegionIndex) -> ABRegionSymbol<&'static str> {
    ABRegionSymbol::ATARegionState(ATARegionState::new(formula.clone(), region_index))
}

fn actions(entries: &[(RegionIndex, &str)]) -> BTreeSet<(RegionIndex, String)> {
    entries
        .iter()
        .map(|(step, action)| (*step, action.to_string()))
        .collect()
}

fn new_search(
    ta: &Arc<TA>,
    ata: &Arc<AlternatingTimedAutomaton<MTLFormula>>,
    controller_actions: &[&str],
    environment_actions: &[&str],
    k: RegionIndex,
    incremental_labeling: bool,
) -> TreeSearch<&'static str> {
    TreeSearch::new(
        Arc::clone(ta),
        Arc::clone(ata),
        controller_actions.iter().copied(),
        environment_actions.iter().copied(),
        k,
        incremental_labeling,
        false,
        Box::new(BfsHeuristic::default()),
    )
}

/// Walk both trees in preorder and require equal words and labels
fn assert_same_tree(left: &Arc<Node>, right: &Arc<Node>) {
    let left_nodes = preorder(left);
    let right_nodes = preorder(right);
    assert_eq!(left_nodes.len(), right_nodes.len());
    for (l, r) in left_nodes.iter().zip(&right_nodes) {
        assert_eq!(l.words, r.words);
        assert_eq!(l.incoming_actions, r.incoming_actions);
        assert_eq!(
            l.label(),
            r.label(),
            "labels differ on node {}",
            node_to_string(l, false)
        );
    }
}

/// The plant and specification of the main search scenario: the controller
/// loops on 'a' while the environment may move to l1 with an early 'b'.
fn until_scenario() -> (Arc<TA>, Arc<AlternatingTimedAutomaton<MTLFormula>>, MTLFormula) {
    let mut ta = TA::new(
        ["a", "b"],
        Location("l0"),
        [Location("l0"), Location("l1"), Location("l2")],
    );
    ta.add_clock("x");
    ta.add_transition(
        Transition::new(Location("l0"), "a", Location("l0"))
            .with_guard("x", ClockConstraint::new(ComparisonOp::Greater, 1))
            .with_reset("x"),
    )
    .unwrap();
    ta.add_transition(
        Transition::new(Location("l0"), "b", Location("l1"))
            .with_guard("x", ClockConstraint::new(ComparisonOp::Less, 1)),
    )
    .unwrap();
    ta.add_transition(Transition::new(Location("l2"), "b", Location("l1")))
        .unwrap();
    let spec = MTLFormula::ap("a").until(
        MTLFormula::ap("b"),
        TimeInterval::new(2, BoundType::Weak, 0, BoundType::Infinite),
    );
    let ata = translate(
        &spec,
        Some(BTreeSet::from([
            AtomicProposition::new("a"),
            AtomicProposition::new("b"),
        ])),
    )
    .unwrap();
    (Arc::new(ta), Arc::new(ata), spec)
}

#[test]
fn test_the_search_tree_is_initialized_correctly() {
    let (ta, ata, _) = until_scenario();
    let search = new_search(&ta, &ata, &["a"], &["b"], 2, false);
    let root = search.get_root();
    assert_eq!(
        root.words,
        BTreeSet::from([vec![BTreeSet::from([
            ta_state("l0", "x", 0),
            ata_state(&MTLFormula::ap("l0"), 0),
        ])]])
    );
    assert_eq!(root.state(), NodeState::Unknown);
    assert!(root.parent.upgrade().is_none());
    assert!(root.incoming_actions.is_empty());
    assert!(root.children.read().unwrap().is_empty());
}

#[test]
fn test_the_first_step_computes_the_right_children() {
    let (ta, ata, spec) = until_scenario();
    let search = new_search(&ta, &ata, &["a"], &["b"], 2, false);
    assert!(search.step());
    let children: Vec<_> = search.get_root().children.read().unwrap().clone();
    assert_eq!(children.len(), 3);
    assert_eq!(
        children[0].words,
        BTreeSet::from([
            vec![
                BTreeSet::from([ta_state("l0", "x", 0)]),
                BTreeSet::from([ata_state(&spec, 3)]),
            ],
            vec![BTreeSet::from([
                ta_state("l0", "x", 0),
                ata_state(&spec, 4)
            ])],
            vec![
                BTreeSet::from([ta_state("l0", "x", 0)]),
                BTreeSet::from([ata_state(&spec, 5)]),
            ],
        ])
    );
    assert_eq!(
        children[0].incoming_actions,
        actions(&[(3, "a"), (4, "a"), (5, "a")])
    );
    assert_eq!(
        children[1].words,
        BTreeSet::from([vec![BTreeSet::from([
            ta_state("l1", "x", 0),
            ata_state(&spec, 0)
        ])]])
    );
    assert_eq!(children[1].incoming_actions, actions(&[(0, "b")]));
    assert_eq!(
        children[2].words,
        BTreeSet::from([vec![BTreeSet::from([
            ta_state("l1", "x", 1),
            ata_state(&spec, 1)
        ])]])
    );
    assert_eq!(children[2].incoming_actions, actions(&[(1, "b")]));
}

#[test]
fn test_the_next_steps_compute_the_right_children() {
    let (ta, ata, spec) = until_scenario();
    let sink = MTLFormula::ap("sink");
    let search = new_search(&ta, &ata, &["a"], &["b"], 2, false);
    assert!(search.step());
    assert!(search.step());
    let root_children: Vec<_> = search.get_root().children.read().unwrap().clone();
    assert_eq!(root_children.len(), 3);

    {
        // first child of the root, starting with [{(l0, x, 0)}, {(spec, 3)}]
        let children: Vec<_> = root_children[0].children.read().unwrap().clone();
        assert_eq!(children.len(), 3);
        assert_eq!(
            children[0].words,
            BTreeSet::from([vec![
                BTreeSet::from([ta_state("l0", "x", 0)]),
                BTreeSet::from([ata_state(&spec, 5)]),
            ]])
        );
        assert_eq!(
            children[0].incoming_actions,
            actions(&[(3, "a"), (4, "a"), (5, "a")])
        );
        assert_eq!(
            children[1].words,
            BTreeSet::from([
                vec![BTreeSet::from([ta_state("l1", "x", 0)])],
                vec![BTreeSet::from([
                    ta_state("l1", "x", 0),
                    ata_state(&sink, 0)
                ])],
            ])
        );
        assert_eq!(children[1].incoming_actions, actions(&[(0, "b")]));
        assert_eq!(
            children[2].words,
            BTreeSet::from([vec![BTreeSet::from([ta_state("l1", "x", 1)])]])
        );
        assert_eq!(children[2].incoming_actions, actions(&[(1, "b")]));
        assert_eq!(root_children[0].state(), NodeState::Unknown);
    }

    // the second and third child of the root have no time-symbol successors
    assert!(search.step());
    assert!(root_children[1].children.read().unwrap().is_empty());
    assert_eq!(root_children[1].state(), NodeState::Dead);

    assert!(search.step());
    assert!(root_children[2].children.read().unwrap().is_empty());
    assert_eq!(root_children[2].state(), NodeState::Dead);
}

#[test]
fn test_the_final_tree_and_its_labels() {
    let (ta, ata, _) = until_scenario();
    let search = new_search(&ta, &ata, &["a"], &["b"], 2, false);
    // the tree is fully built after exactly 7 steps
    for _ in 0..7 {
        assert!(search.step());
    }
    assert!(!search.step());
    search.label();

    let root = search.get_root();
    assert_eq!(search.get_size(), 7);
    let children: Vec<_> = root.children.read().unwrap().clone();
    let grandchildren: Vec<_> = children[0].children.read().unwrap().clone();
    assert_eq!(children.len(), 3);
    assert_eq!(grandchildren.len(), 3);
    assert!(children[1].children.read().unwrap().is_empty());
    assert!(children[2].children.read().unwrap().is_empty());
    for grandchild in &grandchildren {
        assert!(grandchild.children.read().unwrap().is_empty());
    }

    assert_eq!(root.state(), NodeState::Unknown);
    assert_eq!(children[0].state(), NodeState::Unknown);
    assert_eq!(children[1].state(), NodeState::Dead);
    assert_eq!(children[2].state(), NodeState::Dead);
    assert_eq!(grandchildren[0].state(), NodeState::Good);
    assert_eq!(grandchildren[1].state(), NodeState::Bad);
    assert_eq!(grandchildren[2].state(), NodeState::Bad);

    assert_eq!(root.label(), NodeLabel::Top);
    assert_eq!(children[0].label(), NodeLabel::Bottom);
    assert_eq!(children[1].label(), NodeLabel::Top);
    assert_eq!(children[2].label(), NodeLabel::Top);
    assert_eq!(grandchildren[0].label(), NodeLabel::Top);
    assert_eq!(grandchildren[1].label(), NodeLabel::Bottom);
    assert_eq!(grandchildren[2].label(), NodeLabel::Bottom);
}

#[test]
fn test_batch_and_incremental_labeling_agree() {
    let (ta, ata, _) = until_scenario();
    let search = new_search(&ta, &ata, &["a"], &["b"], 2, false);
    let search_incremental = new_search(&ta, &ata, &["a"], &["b"], 2, true);
    search.build_tree(false);
    search.label();
    search_incremental.build_tree(false);
    assert_same_tree(search.get_root(), search_incremental.get_root());
}

#[test]
fn test_multi_threaded_search_agrees_with_single_threaded() {
    let (ta, ata, _) = until_scenario();
    let search = new_search(&ta, &ata, &["a"], &["b"], 2, false);
    let search_parallel = new_search(&ta, &ata, &["a"], &["b"], 2, false);
    search.build_tree(false);
    search.label();
    search_parallel.build_tree(true);
    search_parallel.label();
    assert_same_tree(search.get_root(), search_parallel.get_root());
}

#[test]
fn test_search_without_solution() {
    // the environment can always extend the word with another 'e'
    let mut ta = TA::new(["e", "c"], Location("l0"), [Location("l0"), Location("l1")]);
    ta.add_clock("x");
    ta.add_transition(Transition::new(Location("l0"), "e", Location("l0")))
        .unwrap();
    ta.add_transition(Transition::new(Location("l1"), "c", Location("l1")))
        .unwrap();
    ta.add_transition(
        Transition::new(Location("l0"), "c", Location("l1"))
            .with_guard("x", ClockConstraint::new(ComparisonOp::Greater, 1)),
    )
    .unwrap();
    let spec = MTLFormula::True.until(MTLFormula::ap("e"), TimeInterval::unbounded());
    let ata = translate(
        &spec,
        Some(BTreeSet::from([
            AtomicProposition::new("e"),
            AtomicProposition::new("c"),
        ])),
    )
    .unwrap();
    let search = new_search(&Arc::new(ta), &Arc::new(ata), &["c"], &["e"], 2, false);
    search.build_tree(false);
    search.label();
    assert_eq!(search.get_root().label(), NodeLabel::Bottom);
}

#[test]
fn test_incremental_labeling_on_a_trivial_example() {
    let mut ta = TA::new(
        ["e0", "e1", "c"],
        Location("l0"),
        [Location("l1"), Location("l2")],
    );
    ta.add_clock("x");
    ta.add_transition(Transition::new(Location("l1"), "e0", Location("l1")))
        .unwrap();
    ta.add_transition(Transition::new(Location("l2"), "e1", Location("l2")))
        .unwrap();
    ta.add_transition(
        Transition::new(Location("l0"), "c", Location("l1"))
            .with_guard("x", ClockConstraint::new(ComparisonOp::GreaterEqual, 1)),
    )
    .unwrap();
    ta.add_transition(
        Transition::new(Location("l0"), "e1", Location("l2"))
            .with_guard("x", ClockConstraint::new(ComparisonOp::Greater, 1)),
    )
    .unwrap();
    let spec = MTLFormula::ap("c").until(
        MTLFormula::ap("e1"),
        TimeInterval::new(2, BoundType::Weak, 0, BoundType::Infinite),
    );
    let ata = Arc::new(translate(&spec, None).unwrap());
    let ta = Arc::new(ta);
    let search = new_search(&ta, &ata, &["c"], &["e0", "e1"], 2, false);
    let search_incremental = new_search(&ta, &ata, &["c"], &["e0", "e1"], 2, true);
    search.build_tree(false);
    search.label();
    search_incremental.build_tree(false);
    assert_same_tree(search.get_root(), search_incremental.get_root());
    assert_eq!(search.get_root().label(), NodeLabel::Top);
}

#[test]
fn test_simultaneous_good_and_bad_action() {
    let mut ta = TA::new(
        ["e", "e_bad", "c"],
        Location("l0"),
        [Location("l1"), Location("l2")],
    );
    ta.add_clock("x");
    ta.add_transition(Transition::new(Location("l0"), "e", Location("l1")))
        .unwrap();
    ta.add_transition(Transition::new(Location("l1"), "e_bad", Location("l1")))
        .unwrap();
    ta.add_transition(Transition::new(Location("l0"), "c", Location("l2")))
        .unwrap();
    let spec = MTLFormula::True.until(MTLFormula::ap("e_bad"), TimeInterval::unbounded());
    let ata = Arc::new(
        translate(
            &spec,
            Some(
                ["e", "e_bad", "c"]
                    .into_iter()
                    .map(AtomicProposition::new)
                    .collect(),
            ),
        )
        .unwrap(),
    );
    let ta = Arc::new(ta);
    let search = new_search(&ta, &ata, &["c"], &["e", "e_bad"], 1, false);
    let search_incremental = new_search(&ta, &ata, &["c"], &["e", "e_bad"], 1, true);
    search.build_tree(false);
    search.label();
    search_incremental.build_tree(false);
    assert_eq!(search_incremental.get_root().label(), NodeLabel::Bottom);
    assert_same_tree(search.get_root(), search_incremental.get_root());
}

#[test]
fn test_incremental_labeling_without_bad_environment_actions() {
    let mut ta = TA::new(["c", "e"], Location("l0"), [Location("l0"), Location("l1")]);
    ta.add_clock("x");
    ta.add_transition(Transition::new(Location("l0"), "c", Location("l0")))
        .unwrap();
    ta.add_transition(Transition::new(Location("l0"), "c", Location("l1")))
        .unwrap();
    ta.add_transition(Transition::new(Location("l1"), "c", Location("l1")))
        .unwrap();
    let spec = MTLFormula::True.until(MTLFormula::ap("c"), TimeInterval::unbounded());
    let ata = Arc::new(
        translate(
            &spec,
            Some(BTreeSet::from([
                AtomicProposition::new("c"),
                AtomicProposition::new("e"),
            ])),
        )
        .unwrap(),
    );
    let ta = Arc::new(ta);
    let search = new_search(&ta, &ata, &["c"], &["e"], 0, false);
    let search_incremental = new_search(&ta, &ata, &["c"], &["e"], 0, true);
    search.build_tree(false);
    search.label();
    search_incremental.build_tree(false);
    assert_eq!(search.get_root().label(), NodeLabel::Top);
    assert_eq!(search_incremental.get_root().label(), NodeLabel::Top);
}

#[test]
fn test_search_on_a_specification_that_gets_unsatisfiable() {
    let mut ta = TA::new(["c", "e"], Location("l0"), [Location("l1")]);
    ta.add_clock("c_clock");
    ta.add_transition(Transition::new(Location("l0"), "c", Location("l1")))
        .unwrap();
    let ata = Arc::new(
        translate(
            &MTLFormula::ap("e"),
            Some(BTreeSet::from([
                AtomicProposition::new("c"),
                AtomicProposition::new("e"),
            ])),
        )
        .unwrap(),
    );
    let search = new_search_with_early_termination(&Arc::new(ta), &ata, &["c"], &["e"], 0);
    search.build_tree(false);
    // the controller can directly choose 'c', which makes the specification
    // unsatisfiable
    assert_eq!(search.get_root().label(), NodeLabel::Top);
}

fn new_search_with_early_termination(
    ta: &Arc<TA>,
    ata: &Arc<AlternatingTimedAutomaton<MTLFormula>>,
    controller_actions: &[&str],
    environment_actions: &[&str],
    k: RegionIndex,
) -> TreeSearch<&'static str> {
    TreeSearch::new(
        Arc::clone(ta),
        Arc::clone(ata),
        controller_actions.iter().copied(),
        environment_actions.iter().copied(),
        k,
        true,
        true,
        Box::new(BfsHeuristic::default()),
    )
}

#[test]
fn test_node_with_unsatisfiable_ata_configurations() {
    let sink = MTLFormula::ap("sink");
    let a = MTLFormula::ap("a");
    let satisfiable_word: Word = vec![
        BTreeSet::from([ta_state("l0", "x", 0)]),
        BTreeSet::from([ata_state(&a, 1)]),
    ];
    let sink_word: Word = vec![
        BTreeSet::from([ta_state("l0", "x", 0)]),
        BTreeSet::from([ata_state(&sink, 1)]),
    ];
    let mixed_word: Word = vec![
        BTreeSet::from([ta_state("l0", "x", 0), ata_state(&a, 0)]),
        BTreeSet::from([ata_state(&sink, 1)]),
    ];

    let node = SearchTreeNode::new(
        BTreeSet::from([satisfiable_word.clone()]),
        None,
        BTreeSet::new(),
    );
    assert!(has_satisfiable_ata_configuration(&node, &sink));

    let node = SearchTreeNode::new(BTreeSet::from([sink_word.clone()]), None, BTreeSet::new());
    assert!(!has_satisfiable_ata_configuration(&node, &sink));

    // the sink in one group makes the whole word unsatisfiable
    let node = SearchTreeNode::new(BTreeSet::from([mixed_word]), None, BTreeSet::new());
    assert!(!has_satisfiable_ata_configuration(&node, &sink));

    // one satisfiable word is enough
    let node = SearchTreeNode::new(
        BTreeSet::from([satisfiable_word, sink_word]),
        None,
        BTreeSet::new(),
    );
    assert!(has_satisfiable_ata_configuration(&node, &sink));
}

mod constructed_propagation_cases {
    use super::*;

    fn dummy_words() -> BTreeSet<Word> {
        BTreeSet::from([vec![BTreeSet::from([
            ta_state("l0", "x", 0),
            ata_state(&MTLFormula::ap("a"), 0),
        ])]])
    }

    fn controller_actions() -> BTreeSet<String> {
        ["a", "b", "c"].into_iter().map(String::from).collect()
    }

    fn environment_actions() -> BTreeSet<String> {
        ["x", "y", "z"].into_iter().map(String::from).collect()
    }

    fn test_node(
        parent: Option<&Arc<Node>>,
        incoming: &[(RegionIndex, &str)],
        label: NodeLabel,
    ) -> Arc<Node> {
        let node = SearchTreeNode::new(dummy_words(), parent, actions(incoming));
        node.is_expanded
            .store(true, std::sync::atomic::Ordering::SeqCst);
        if label != NodeLabel::Unlabeled {
            node.set_label(label, false);
        }
        node
    }

    /// Build a root with three children and propagate from the second one
    fn propagate_three_children(
        labels: [NodeLabel; 3],
        incoming: [(RegionIndex, &str); 3],
    ) -> NodeLabel {
        let root = test_node(None, &[], NodeLabel::Unlabeled);
        let children: Vec<_> = labels
            .iter()
            .zip(incoming)
            .map(|(label, (step, action))| {
                test_node(Some(&root), &[(step, action)], *label)
            })
            .collect();
        *root.children.write().unwrap() = children;
        let propagating = root.children.read().unwrap()[1].clone();
        propagating.label_propagate(&controller_actions(), &environment_actions(), false);
        root.label()
    }

    #[test]
    fn test_single_step_propagation() {
        use NodeLabel::*;
        // an early good controller action wins
        assert_eq!(
            propagate_three_children([Top, Bottom, Bottom], [(0, "a"), (1, "x"), (2, "x")]),
            Top
        );
        // all environment actions are good
        assert_eq!(
            propagate_three_children([Bottom, Top, Top], [(0, "a"), (1, "x"), (2, "x")]),
            Top
        );
        // one environment action is bad and the controller cannot win first
        assert_eq!(
            propagate_three_children([Bottom, Top, Bottom], [(0, "a"), (1, "x"), (2, "x")]),
            Bottom
        );
        // the controller action comes second but still before the bad
        // environment action
        assert_eq!(
            propagate_three_children([Top, Top, Bottom], [(0, "x"), (1, "a"), (2, "z")]),
            Top
        );
        // the first environment action is already bad
        assert_eq!(
            propagate_three_children([Bottom, Top, Bottom], [(0, "x"), (1, "a"), (2, "z")]),
            Bottom
        );
    }

    #[test]
    fn test_multi_step_propagation_good_subtree() {
        let root = test_node(None, &[], NodeLabel::Unlabeled);
        let ch1 = test_node(Some(&root), &[(0, "a")], NodeLabel::Unlabeled);
        let ch2 = test_node(Some(&root), &[(1, "x")], NodeLabel::Bottom);
        let ch3 = test_node(Some(&root), &[(2, "x")], NodeLabel::Bottom);
        let ch4 = test_node(Some(&ch1), &[(0, "a")], NodeLabel::Bottom);
        let ch5 = test_node(Some(&ch1), &[(1, "x")], NodeLabel::Top);
        *ch1.children.write().unwrap() = vec![Arc::clone(&ch4), Arc::clone(&ch5)];
        *root.children.write().unwrap() =
            vec![Arc::clone(&ch1), Arc::clone(&ch2), Arc::clone(&ch3)];
        // ch1 has no bad environment action, so it becomes Top, and its
        // controller action at step 0 beats the bad environment actions
        ch4.label_propagate(&controller_actions(), &environment_actions(), false);
        assert_eq!(ch1.label(), NodeLabel::Top);
        assert_eq!(root.label(), NodeLabel::Top);
    }

    #[test]
    fn test_multi_step_propagation_good_controller_grandchild() {
        let root = test_node(None, &[], NodeLabel::Unlabeled);
        let ch1 = test_node(Some(&root), &[(0, "a")], NodeLabel::Unlabeled);
        let ch2 = test_node(Some(&root), &[(1, "x")], NodeLabel::Bottom);
        let ch3 = test_node(Some(&root), &[(2, "x")], NodeLabel::Bottom);
        let ch4 = test_node(Some(&ch1), &[(0, "a")], NodeLabel::Top);
        let ch5 = test_node(Some(&ch1), &[(1, "x")], NodeLabel::Bottom);
        *ch1.children.write().unwrap() = vec![Arc::clone(&ch4), Arc::clone(&ch5)];
        *root.children.write().unwrap() =
            vec![Arc::clone(&ch1), Arc::clone(&ch2), Arc::clone(&ch3)];
        // ch4 wins for the controller before ch5 loses
        ch4.label_propagate(&controller_actions(), &environment_actions(), false);
        assert_eq!(ch1.label(), NodeLabel::Top);
        assert_eq!(root.label(), NodeLabel::Top);
    }

    #[test]
    fn test_multi_step_propagation_bad_subtree() {
        let root = test_node(None, &[], NodeLabel::Unlabeled);
        let ch1 = test_node(Some(&root), &[(0, "a")], NodeLabel::Unlabeled);
        let ch2 = test_node(Some(&root), &[(1, "x")], NodeLabel::Top);
        let ch3 = test_node(Some(&root), &[(2, "x")], NodeLabel::Bottom);
        let ch4 = test_node(Some(&ch1), &[(0, "a")], NodeLabel::Bottom);
        let ch5 = test_node(Some(&ch1), &[(1, "x")], NodeLabel::Bottom);
        *ch1.children.write().unwrap() = vec![Arc::clone(&ch4), Arc::clone(&ch5)];
        *root.children.write().unwrap() =
            vec![Arc::clone(&ch1), Arc::clone(&ch2), Arc::clone(&ch3)];
        ch4.label_propagate(&controller_actions(), &environment_actions(), false);
        assert_eq!(ch1.label(), NodeLabel::Bottom);
        assert_eq!(root.label(), NodeLabel::Bottom);
    }

    #[test]
    fn test_multi_step_propagation_waits_for_unresolved_children() {
        let root = test_node(None, &[], NodeLabel::Unlabeled);
        let ch1 = test_node(Some(&root), &[(0, "a")], NodeLabel::Unlabeled);
        let ch2 = test_node(Some(&root), &[(1, "x")], NodeLabel::Unlabeled);
        let ch3 = test_node(Some(&root), &[(2, "x")], NodeLabel::Top);
        let ch4 = test_node(Some(&ch1), &[(0, "a")], NodeLabel::Bottom);
        let ch5 = test_node(Some(&ch1), &[(1, "x")], NodeLabel::Bottom);
        let ch6 = test_node(Some(&ch2), &[(0, "x")], NodeLabel::Top);
        *ch1.children.write().unwrap() = vec![Arc::clone(&ch4), Arc::clone(&ch5)];
        *ch2.children.write().unwrap() = vec![Arc::clone(&ch6)];
        *root.children.write().unwrap() =
            vec![Arc::clone(&ch1), Arc::clone(&ch2), Arc::clone(&ch3)];
        // ch1 resolves to Bottom, but the verdict of root still depends on
        // the unresolved environment child ch2
        ch4.label_propagate(&controller_actions(), &environment_actions(), false);
        assert_eq!(ch1.label(), NodeLabel::Bottom);
        assert_eq!(root.label(), NodeLabel::Unlabeled);
        // once ch2 resolves to Top, every environment action is good
        ch6.label_propagate(&controller_actions(), &environment_actions(), false);
        assert_eq!(ch2.label(), NodeLabel::Top);
        assert_eq!(root.label(), NodeLabel::Top);
    }
}
