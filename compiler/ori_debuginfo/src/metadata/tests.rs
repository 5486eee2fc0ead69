use pretty_assertions::assert_eq;

use super::*;

fn location(line: i64, scope: MetadataId) -> DiNode {
    DiNode::new(DiKind::Location)
        .field("line", DiValue::Int(line))
        .field("scope", DiValue::Node(scope))
}

#[test]
fn identical_tuples_are_uniqued() {
    let mut graph = MetadataGraph::new();
    let a = graph.add_tuple(vec![MdOperand::i32(2), MdOperand::str("Dwarf Version")]);
    let b = graph.add_tuple(vec![MdOperand::i32(2), MdOperand::str("Dwarf Version")]);
    let c = graph.add_tuple(vec![MdOperand::i32(2), MdOperand::str("Other")]);

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(graph.len(), 2);
}

#[test]
fn bit_width_distinguishes_tuples() {
    let mut graph = MetadataGraph::new();
    let narrow = graph.add_tuple(vec![MdOperand::i32(0)]);
    let wide = graph.add_tuple(vec![MdOperand::i64(0)]);
    let flag = graph.add_tuple(vec![MdOperand::bool(false)]);

    assert_ne!(narrow, wide);
    assert_ne!(narrow, flag);
}

#[test]
fn uniqued_debug_nodes_share_an_id() {
    let mut graph = MetadataGraph::new();
    let scope = graph.add_tuple(Vec::new());
    let first = graph.add_debug(location(4, scope), false);
    let second = graph.add_debug(location(4, scope), false);
    let other = graph.add_debug(location(5, scope), false);

    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[test]
fn distinct_debug_nodes_are_never_uniqued() {
    let mut graph = MetadataGraph::new();
    let scope = graph.add_tuple(Vec::new());
    let first = graph.add_debug(location(4, scope), true);
    let second = graph.add_debug(location(4, scope), true);

    assert_ne!(first, second);
    assert_eq!(
        graph.get(first),
        &Metadata::Debug {
            node: location(4, scope),
            distinct: true,
        }
    );
}

#[test]
fn list_content_is_visible_through_an_earlier_tuple() {
    let mut graph = MetadataGraph::new();
    let list = graph.new_list();
    let holder = graph.add_tuple(vec![MdOperand::i32(1), MdOperand::List(list)]);
    assert!(graph.list(list).is_empty());

    let a = graph.add_tuple(vec![MdOperand::str("a")]);
    let b = graph.add_tuple(vec![MdOperand::str("b")]);
    graph.push_to_list(list, a);
    graph.push_to_list(list, b);

    assert_eq!(
        graph.get(holder).as_tuple(),
        Some(&[MdOperand::i32(1), MdOperand::List(list)][..])
    );
    assert_eq!(graph.list(list), &[a, b]);
}

#[test]
fn tuples_over_different_lists_stay_separate() {
    let mut graph = MetadataGraph::new();
    let first = graph.new_list();
    let second = graph.new_list();

    let a = graph.add_tuple(vec![MdOperand::List(first)]);
    let b = graph.add_tuple(vec![MdOperand::List(second)]);
    assert_ne!(a, b);
}

#[test]
fn named_metadata_keeps_declaration_and_insertion_order() {
    let mut graph = MetadataGraph::new();
    let a = graph.add_tuple(vec![MdOperand::str("a")]);
    let b = graph.add_tuple(vec![MdOperand::str("b")]);

    graph.add_named("llvm.module.flags", b);
    graph.add_named("llvm.dbg.cu", a);
    graph.add_named("llvm.module.flags", a);

    assert_eq!(graph.named("llvm.module.flags"), &[b, a]);
    assert_eq!(graph.named("llvm.dbg.cu"), &[a]);
    assert!(graph.named("missing").is_empty());

    let names: Vec<&str> = graph
        .named_lists()
        .iter()
        .map(|named| named.name.as_str())
        .collect();
    assert_eq!(names, ["llvm.module.flags", "llvm.dbg.cu"]);
}

#[test]
fn di_node_field_lookup() {
    let node = DiNode::new(DiKind::Subprogram)
        .field("name", DiValue::Str("foo".into()))
        .field("line", DiValue::Int(10));

    assert_eq!(node.get("name"), Some(&DiValue::Str("foo".into())));
    assert_eq!(node.get("line"), Some(&DiValue::Int(10)));
    assert_eq!(node.get("scopeLine"), None);
}
