use super::*;
use crate::network::socket_map::SocketMapBuilder;

// Group Input -> Math -> Group Output, where the compiler duplicated the Math input "A".
fn fixture() -> (VirtualTree, Network, SocketMap) {
    let mut tree = VirtualTree::new();
    let gi = tree.add_node("Group Input", &[], &["Value"]);
    let math = tree.add_node("Math", &["A", "B"], &["Result"]);
    let go = tree.add_node("Group Output", &["Result"], &[]);

    let mut net = Network::new();
    let d_in = net.add_dummy("Group Input", &[], &["Value"]);
    let add = net.add_function("add", &["a", "b"], &["r"]);
    let add2 = net.add_function("add", &["a", "b"], &["r"]);
    let d_out = net.add_dummy("Group Output", &["Result"], &[]);

    let mut b = SocketMapBuilder::new(tree.socket_count(), net.socket_count());
    b.map_boundary_output(tree.output(gi, 0), net.node(d_in).outputs[0])
        .unwrap();
    b.map_input(tree.input(math, 0), net.node(add).inputs[0])
        .unwrap();
    b.map_input(tree.input(math, 0), net.node(add2).inputs[0])
        .unwrap();
    b.map_input(tree.input(math, 1), net.node(add).inputs[1])
        .unwrap();
    b.map_output(tree.output(math, 0), net.node(add).outputs[0])
        .unwrap();
    b.map_boundary_input(tree.input(go, 0), net.node(d_out).inputs[0])
        .unwrap();
    let map = b.finish().unwrap();
    (tree, net, map)
}

#[test]
fn dummy_lookups_resolve_boundary_sockets() {
    let (tree, net, map) = fixture();
    let mapped = MappedNetwork::new(&tree, net, map).unwrap();

    let value = tree.output(VNodeId(0), 0);
    let result = tree.input(VNodeId(2), 0);
    assert_eq!(mapped.lookup_dummy_output(value), OutputSocketId(0));
    assert_eq!(mapped.lookup_dummy_input(result), InputSocketId(7));
    assert_eq!(mapped.lookup_vsocket_input(InputSocketId(7)), result);
    assert_eq!(mapped.lookup_vsocket_output(OutputSocketId(0)), value);
    assert!(mapped.is_mapped_socket(InputSocketId(7)));
    assert!(!mapped.is_mapped_socket(InputSocketId(1)));
}

#[test]
fn batch_lookups_match_single_lookups() {
    let (tree, net, map) = fixture();
    let mapped = MappedNetwork::new(&tree, net, map).unwrap();

    let mut inputs = [InputSocketId(0)];
    mapped.lookup_dummy_inputs(&[tree.input(VNodeId(2), 0)], &mut inputs);
    assert_eq!(inputs, [InputSocketId(7)]);

    let mut outputs = [OutputSocketId(99)];
    mapped.lookup_dummy_outputs(&[tree.output(VNodeId(0), 0)], &mut outputs);
    assert_eq!(outputs, [OutputSocketId(0)]);
}

#[test]
#[should_panic(expected = "batch lengths differ")]
fn batch_lookup_rejects_length_mismatch() {
    let (tree, net, map) = fixture();
    let mapped = MappedNetwork::new(&tree, net, map).unwrap();
    let mut out = [InputSocketId(0); 2];
    mapped.lookup_dummy_inputs(&[tree.input(VNodeId(2), 0)], &mut out);
}

#[test]
#[should_panic(expected = "function node input")]
fn dummy_lookup_on_function_socket_panics() {
    let (tree, net, map) = fixture();
    let mapped = MappedNetwork::new(&tree, net, map).unwrap();
    mapped.lookup_dummy_input(tree.input(VNodeId(1), 1));
}

#[test]
fn fan_out_inputs_and_reverse_round_trip() {
    let (tree, net, map) = fixture();
    let mapped = MappedNetwork::new(&tree, net, map).unwrap();

    let a = tree.input(VNodeId(1), 0);
    assert_eq!(
        mapped.lookup_all_inputs(a).as_slice(),
        &[InputSocketId(1), InputSocketId(4)]
    );
    assert_eq!(mapped.lookup_output(tree.output(VNodeId(1), 0)), Some(OutputSocketId(3)));

    for s in (0..mapped.network().socket_count() as u32).map(SocketId) {
        if let Some(v) = mapped.socket_map().reverse(s) {
            assert!(mapped.socket_map().mapping(v).sockets().contains(&s));
        }
    }
}

#[test]
fn compiled_sockets_trace_back_to_original_nodes() {
    let (tree, net, map) = fixture();
    let mapped = MappedNetwork::new(&tree, net, map).unwrap();

    assert_eq!(mapped.original_node_of(InputSocketId(4)), Some(VNodeId(1)));
    assert_eq!(mapped.original_node_of(OutputSocketId(3)), Some(VNodeId(1)));
    assert_eq!(mapped.original_node_of(OutputSocketId(6)), None);
    assert_eq!(mapped.origin_of_socket(InputSocketId(2)), Some(VSocketId(2)));
}

#[test]
fn report_summarizes_every_vsocket() {
    let (tree, net, map) = fixture();
    let mapped = MappedNetwork::new(&tree, net, map).unwrap();
    let report = mapped.report();

    assert_eq!(report.vsockets, 5);
    assert_eq!(report.sockets, 8);
    assert_eq!(report.unmapped, 0);
    assert_eq!(report.fan_out, 1);
    assert_eq!(report.boundary, 2);
    assert_eq!(report.entries[1].socket, "A");
    assert_eq!(report.entries[1].compiled_nodes, vec!["add", "add"]);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["entries"][0]["direction"], "output");
    assert_eq!(json["entries"][0]["node"], "Group Input");
}

#[test]
fn size_mismatch_is_rejected() {
    let (tree, _, map) = fixture();
    let mut other = Network::new();
    other.add_dummy("x", &[], &["y"]);
    assert!(MappedNetwork::new(&tree, other, map).is_err());
}

#[test]
fn direction_mismatch_is_rejected() {
    let mut tree = VirtualTree::new();
    tree.add_node("n", &["in"], &[]);
    let mut net = Network::new();
    let f = net.add_function("f", &[], &["out"]);
    let forward = vec![Mapping::Single(net.node(f).outputs[0].into())];
    let map = SocketMap::from_parts(forward, vec![None]).unwrap();
    let err = MappedNetwork::new(&tree, net, map).unwrap_err();
    assert!(err.to_string().contains("different directions"));
}

#[test]
fn reverse_entry_on_function_node_is_rejected() {
    let mut tree = VirtualTree::new();
    let n = tree.add_node("n", &[], &["out"]);
    let mut net = Network::new();
    let f = net.add_function("f", &[], &["out"]);
    let mut b = SocketMapBuilder::new(1, 1);
    b.map_boundary_output(tree.output(n, 0), net.node(f).outputs[0])
        .unwrap();
    let map = b.finish().unwrap();
    let err = MappedNetwork::new(&tree, net, map).unwrap_err();
    assert!(err.to_string().contains("function node 'f'"));
}

#[test]
fn fanned_out_output_is_rejected() {
    let mut tree = VirtualTree::new();
    tree.add_node("n", &[], &["out"]);
    let mut net = Network::new();
    net.add_function("f", &[], &["a", "b"]);
    let forward = vec![Mapping::Multi(smallvec::smallvec![SocketId(0), SocketId(1)])];
    let map = SocketMap::from_parts(forward, vec![None, None]).unwrap();
    let err = MappedNetwork::new(&tree, net, map).unwrap_err();
    assert!(err.to_string().contains("fans out"));
}

#[test]
fn mapped_network_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MappedNetwork<'static>>();
}
