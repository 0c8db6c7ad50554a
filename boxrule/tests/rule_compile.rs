mod util;

use boxrule::placement::NeighborAverage;
use boxrule::rule::LabelFrequencies;
use boxrule::rule::operator::OperatorRules;
use boxrule::{CompileOptions, HostGraph, Label, Rule, RuleMatch, compile_rule};
use rand::SeedableRng;
use rand::rngs::StdRng;
use util::{Canvas, DrawnBox};

fn compile(canvas: &Canvas, drawn: &DrawnBox, options: CompileOptions) -> Rule {
    let rule_box = canvas.box_of(drawn);
    compile_rule(
        rule_box.name(),
        &canvas.graph,
        &canvas.members(drawn),
        rule_box.spawn_offset(),
        &options,
    )
}

fn data_matches(canvas: &Canvas, rule: &Rule) -> Vec<RuleMatch> {
    let pool = below_boxes(&canvas.graph);
    let frequencies = LabelFrequencies::count(&canvas.graph, &pool);
    rule.find_matches(&canvas.graph, &pool, &frequencies)
}

/// Everything below the boxes: data plus freshly spawned nodes.
fn below_boxes(graph: &HostGraph) -> Vec<boxrule::NodeKey> {
    let mut keys = graph
        .nodes()
        .filter(|(_, attr)| attr.position.y > 120.0)
        .map(|(key, _)| key)
        .collect::<Vec<_>>();
    keys.sort();
    keys
}

fn apply_and_settle(canvas: &mut Canvas, rule: &Rule, rule_match: &RuleMatch) {
    rule.apply(&mut canvas.graph, rule_match, &mut NeighborAverage)
        .unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    OperatorRules::new()
        .settle(
            &mut canvas.graph,
            below_boxes,
            &mut NeighborAverage,
            &mut rng,
        )
        .unwrap();
}

#[test_log::test]
fn variable_value_is_copied_through_set() {
    let mut canvas = Canvas::new();
    let mut drawn = canvas.rule_box();
    let anchor = canvas.draw(&mut drawn, "∀");
    let source = canvas.draw(&mut drawn, "v");
    let slot = canvas.draw(&mut drawn, "slot");
    let set = canvas.draw(&mut drawn, "set");
    let value = canvas.draw(&mut drawn, "v");
    canvas.edge(anchor, source);
    canvas.edge(source, slot);
    canvas.edge(set, value);
    canvas.edge(value, slot);
    let data = canvas.data_chain(&["7", "slot"]);

    let rule = compile(&canvas, &drawn, CompileOptions::default());
    assert_eq!(rule.variables().len(), 1);
    assert_eq!(rule.pattern().node_count(), 2);

    let matches = data_matches(&canvas, &rule);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].context.get(&Label::from("v")), Some(Label::from("7")));

    apply_and_settle(&mut canvas, &rule, &matches[0]);
    assert_eq!(canvas.graph.label(data[0]), Some(Label::from("7")));
    assert_eq!(canvas.graph.label(data[1]), Some(Label::from("7")));
    assert!(canvas.outside_labeled("set").is_empty());
    assert_eq!(canvas.outside_labeled("7").len(), 2);
}

#[test_log::test]
fn connect_rule_stops_matching_once_connected() {
    let mut canvas = Canvas::new();
    let mut drawn = canvas.rule_box();
    let a = canvas.draw(&mut drawn, "a");
    let connect = canvas.draw(&mut drawn, "connect");
    let b = canvas.draw(&mut drawn, "b");
    canvas.edge(a, connect);
    canvas.edge(connect, b);
    let data_a = canvas.data("a");
    let data_b = canvas.data("b");

    let rule = compile(&canvas, &drawn, CompileOptions::default());
    assert_eq!(rule.negative_edges().len(), 1);
    let matches = data_matches(&canvas, &rule);
    assert_eq!(matches.len(), 1);

    apply_and_settle(&mut canvas, &rule, &matches[0]);
    assert!(canvas.graph.contains_edge(data_a, data_b));
    assert!(data_matches(&canvas, &rule).is_empty());
}

#[test_log::test]
fn delete_rule_removes_the_matched_node() {
    let mut canvas = Canvas::new();
    let mut drawn = canvas.rule_box();
    let delete = canvas.draw(&mut drawn, "delete");
    let victim = canvas.draw(&mut drawn, "victim");
    canvas.edge(delete, victim);
    let data = canvas.data_chain(&["victim", "bystander"]);

    let rule = compile(&canvas, &drawn, CompileOptions::default());
    let matches = data_matches(&canvas, &rule);
    assert_eq!(matches.len(), 1);
    apply_and_settle(&mut canvas, &rule, &matches[0]);
    assert!(!canvas.graph.contains_node(data[0]));
    assert!(canvas.graph.contains_node(data[1]));
    assert!(canvas.outside_labeled("delete").is_empty());
}

#[test_log::test]
fn inserted_nodes_are_placed_near_their_anchors() {
    let mut canvas = Canvas::new();
    let mut drawn = canvas.rule_box();
    let host = canvas.draw(&mut drawn, "host");
    let new = canvas.draw(&mut drawn, "new");
    let guest = canvas.draw(&mut drawn, "guest");
    canvas.edge(new, guest);
    canvas.edge(guest, host);
    let data = canvas.data("host");

    let rule = compile(&canvas, &drawn, CompileOptions::default());
    let matches = data_matches(&canvas, &rule);
    let inserted = rule
        .apply(&mut canvas.graph, &matches[0], &mut NeighborAverage)
        .unwrap();
    assert_eq!(inserted.len(), 2);

    let guest_copy = inserted
        .iter()
        .copied()
        .find(|&key| canvas.graph.label(key) == Some(Label::from("guest")))
        .unwrap();
    assert!(canvas.graph.contains_edge(guest_copy, data));
    assert_eq!(canvas.graph.position(guest_copy), canvas.graph.position(data));
}

#[test_log::test]
fn excluded_domain_keeps_variables_off_rule_constants() {
    let mut canvas = Canvas::new();
    let mut drawn = canvas.rule_box();
    let anchor = canvas.draw(&mut drawn, "∀");
    let x = canvas.draw(&mut drawn, "x");
    let k = canvas.draw(&mut drawn, "k");
    canvas.edge(anchor, x);
    canvas.edge(x, k);
    canvas.data_chain(&["k", "k"]);

    let strict = compile(&canvas, &drawn, CompileOptions::default());
    assert!(data_matches(&canvas, &strict).is_empty());

    let lenient = compile(
        &canvas,
        &drawn,
        CompileOptions {
            exclude_rule_constants: false,
        },
    );
    assert_eq!(data_matches(&canvas, &lenient).len(), 2);
}

#[test_log::test]
fn rule_is_a_snapshot_of_the_box() {
    let mut canvas = Canvas::new();
    let mut drawn = canvas.rule_box();
    let target = canvas.draw(&mut drawn, "target");
    canvas.data("target");

    let rule = compile(&canvas, &drawn, CompileOptions::default());
    canvas.graph.set_label(target, Label::from("renamed"));
    assert_eq!(data_matches(&canvas, &rule).len(), 1);
}
