mod util;

use boxrule::placement::NeighborAverage;
use boxrule::rule::LabelFrequencies;
use boxrule::rule::operator::OperatorRules;
use boxrule::{HostGraph, Label};
use rand::SeedableRng;
use rand::rngs::StdRng;
use util::{Canvas, all_nodes};

fn matches_of(rules: &OperatorRules, name: &str, graph: &HostGraph) -> Vec<boxrule::RuleMatch> {
    let pool = all_nodes(graph);
    let frequencies = LabelFrequencies::count(graph, &pool);
    rules
        .rule(name)
        .unwrap()
        .find_matches(graph, &pool, &frequencies)
}

#[test_log::test]
fn set_copies_the_value_label_onto_the_target() {
    let rules = OperatorRules::new();
    let mut canvas = Canvas::new();
    let chain = canvas.data_chain(&["set", "7", "x"]);

    let matches = matches_of(&rules, "set", &canvas.graph);
    assert_eq!(matches.len(), 1);
    rules
        .rule("set")
        .unwrap()
        .apply(&mut canvas.graph, &matches[0], &mut NeighborAverage)
        .unwrap();

    assert!(!canvas.graph.contains_node(chain[0]));
    assert!(!canvas.graph.contains_node(chain[1]));
    assert_eq!(canvas.graph.label(chain[2]), Some(Label::from("7")));
    assert_eq!(canvas.graph.node_count(), 1);
}

#[test_log::test]
fn delete_removes_operator_and_target() {
    let rules = OperatorRules::new();
    let mut canvas = Canvas::new();
    canvas.data_chain(&["delete", "anything"]);

    let matches = matches_of(&rules, "delete", &canvas.graph);
    assert_eq!(matches.len(), 1);
    rules
        .rule("delete")
        .unwrap()
        .apply(&mut canvas.graph, &matches[0], &mut NeighborAverage)
        .unwrap();
    assert_eq!(canvas.graph.node_count(), 0);
}

#[test_log::test]
fn connect_skips_pairs_that_are_already_adjacent() {
    let rules = OperatorRules::new();
    let mut canvas = Canvas::new();
    let chain = canvas.data_chain(&["a", "connect", "b"]);
    assert_eq!(matches_of(&rules, "connect", &canvas.graph).len(), 2);

    canvas.edge(chain[0], chain[2]);
    assert!(matches_of(&rules, "connect", &canvas.graph).is_empty());
    // the redundant operator still goes away
    assert_eq!(
        matches_of(&rules, "connect (already connected)", &canvas.graph).len(),
        2
    );
}

#[test_log::test]
fn connect_adds_the_edge_once() {
    let rules = OperatorRules::new();
    let mut canvas = Canvas::new();
    let chain = canvas.data_chain(&["a", "connect", "b"]);

    let matches = matches_of(&rules, "connect", &canvas.graph);
    rules
        .rule("connect")
        .unwrap()
        .apply(&mut canvas.graph, &matches[0], &mut NeighborAverage)
        .unwrap();
    assert!(canvas.graph.contains_edge(chain[0], chain[2]));
    assert!(!canvas.graph.contains_node(chain[1]));
}

#[test_log::test]
fn disconnect_removes_the_edge() {
    let rules = OperatorRules::new();
    let mut canvas = Canvas::new();
    let chain = canvas.data_chain(&["a", "disconnect", "b"]);
    canvas.edge(chain[0], chain[2]);

    let mut rng = StdRng::seed_from_u64(0);
    let fired = rules
        .settle(&mut canvas.graph, all_nodes, &mut NeighborAverage, &mut rng)
        .unwrap();
    assert_eq!(fired, 1);
    assert!(!canvas.graph.contains_edge(chain[0], chain[2]));
    assert_eq!(canvas.graph.node_count(), 2);
}

#[test_log::test]
fn settling_runs_every_operator_to_completion() {
    let rules = OperatorRules::new();
    let mut canvas = Canvas::new();
    let set = canvas.data_chain(&["set", "on", "lamp"]);
    let connect = canvas.data_chain(&["p", "connect", "q"]);
    canvas.data_chain(&["delete", "junk"]);
    let marker = canvas.data_chain(&["new", "fresh"]);

    let mut rng = StdRng::seed_from_u64(11);
    let fired = rules
        .settle(&mut canvas.graph, all_nodes, &mut NeighborAverage, &mut rng)
        .unwrap();
    assert_eq!(fired, 4);

    let mut labels = canvas
        .graph
        .nodes()
        .map(|(_, attr)| attr.label.to_string())
        .collect::<Vec<_>>();
    labels.sort();
    assert_eq!(labels, ["fresh", "on", "p", "q"]);
    assert_eq!(canvas.graph.label(set[2]), Some(Label::from("on")));
    assert!(canvas.graph.contains_edge(connect[0], connect[2]));
    assert!(canvas.graph.contains_node(marker[1]));

    let again = rules
        .settle(&mut canvas.graph, all_nodes, &mut NeighborAverage, &mut rng)
        .unwrap();
    assert_eq!(again, 0);
}
