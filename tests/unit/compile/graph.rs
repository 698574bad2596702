use super::*;
use smallvec::smallvec;

fn two_node_graph(time: f64) -> RenderGraph {
    let mut b = GraphBuilder::new();
    let src = b
        .push(
            ShaderId::new("gen.bars"),
            BTreeMap::from([("time".to_owned(), ParamValue::F64(time))]),
            SmallVec::new(),
        )
        .unwrap();
    let out = b
        .push(
            ShaderId::new("cmp.stack"),
            BTreeMap::new(),
            smallvec![bind("layer0", 0, &OutputRef::of(src))],
        )
        .unwrap();
    b.finish(out).unwrap()
}

#[test]
fn ids_are_sequential_and_dump_is_stable() {
    let g = two_node_graph(0.5);
    assert_eq!(g.nodes[0].id, NodeId(0));
    assert_eq!(g.nodes[1].id, NodeId(1));
    assert_eq!(
        g.dump(),
        "RenderGraph\nnodes: 2\n  n0: gen.bars params={time=0.5}\n  n1: cmp.stack inputs=[layer0@0<-n0.out]\noutput: n1\n"
    );
}

#[test]
fn fingerprint_tracks_parameters() {
    assert_eq!(two_node_graph(0.5).fingerprint(), two_node_graph(0.5).fingerprint());
    assert_ne!(two_node_graph(0.5).fingerprint(), two_node_graph(0.25).fingerprint());
    assert_eq!(two_node_graph(0.5).fingerprint().to_string().len(), 32);
}

#[test]
fn forward_references_are_rejected() {
    let mut b = GraphBuilder::new();
    let err = b
        .push(
            ShaderId::new("fx.x"),
            BTreeMap::new(),
            smallvec![bind("src", 0, &OutputRef::of(NodeId(0)))],
        )
        .unwrap_err();
    assert!(matches!(err, MontageError::Compile(_)));
    assert!(b.finish(NodeId(0)).is_err());
}

#[test]
fn node_lookups() {
    let g = two_node_graph(1.0);
    let out = g.node(g.output).unwrap();
    assert_eq!(out.input_at(0).map(|i| i.node), Some(NodeId(0)));
    assert!(out.input("layer0").is_some());
    assert_eq!(g.nodes_with_shader("gen.bars").count(), 1);
    assert_eq!(
        g.node(NodeId(0)).unwrap().param("time"),
        Some(&ParamValue::F64(1.0))
    );
}
