use super::*;
use crate::{
    ClipBuilder, Ease, FACE_BLUR_EFFECT_ID, FeatureApplication, ManifestRegistry, RETIME_EFFECT_ID,
    Rect, TimelineBuilder, TrackBuilder, registry::standard::standard_registry,
};

fn compiler() -> TimelineCompiler<ManifestRegistry> {
    TimelineCompiler::with_default_config(standard_registry())
}

fn single_track(clips: Vec<Clip>) -> Timeline {
    let mut track = TrackBuilder::video("v1");
    for clip in clips {
        track = track.clip(clip);
    }
    TimelineBuilder::new("tl")
        .track(track.build().unwrap())
        .build()
        .unwrap()
}

/// A[0,1) fades out into B[0.5,1.5) over 0.5s.
fn crossfade_timeline() -> Timeline {
    single_track(vec![
        ClipBuilder::new("A", "media://a.mov", 0.0, 1.0)
            .transition_out(Transition::crossfade(0.5))
            .build()
            .unwrap(),
        ClipBuilder::new("B", "media://b.mov", 0.5, 1.0)
            .transition_in(Transition::crossfade(0.5))
            .build()
            .unwrap(),
    ])
}

fn compile_at(tl: &Timeline, at: f64) -> RenderRequest {
    compiler()
        .compile(tl, Time(at), Quality::Preview, &FrameContext::new())
        .unwrap()
}

fn f64_param(node: &crate::RenderNode, name: &str) -> f64 {
    node.param(name).and_then(ParamValue::as_f64).unwrap()
}

#[test]
fn paired_transition_emits_one_binary_node() {
    let req = compile_at(&crossfade_timeline(), 0.6);
    let g = &req.graph;

    let tx = g.nodes_with_shader("tx.crossfade").collect::<Vec<_>>();
    assert_eq!(tx.len(), 1);
    let tx = tx[0];
    let progress = f64_param(tx, "progress");
    assert!((progress - 0.2).abs() < 1e-9, "progress {progress}");
    assert!(progress < 0.5);

    let from = tx.input_at(PRIMARY_SLOT).unwrap();
    assert_eq!(from.port, TRANSITION_FROM_PORT);
    let to = tx.input_at(PRIMARY_SLOT + 1).unwrap();
    assert_eq!(to.port, TRANSITION_TO_PORT);

    // `from` traces back through ingestion to A's decode node.
    let from_ingest = g.node(from.node).unwrap();
    assert_eq!(from_ingest.shader.as_str(), "cs.idt");
    let from_source = g.node(from_ingest.input_at(0).unwrap().node).unwrap();
    assert_eq!(
        from_source.param("locator"),
        Some(&ParamValue::Str("media://a.mov".to_owned()))
    );

    let out = g.node(g.output).unwrap();
    assert_eq!(out.shader.as_str(), "cmp.stack");
    assert_eq!(out.inputs.len(), 1);
    assert_eq!(out.input_at(0).map(|b| b.node), Some(tx.id));
}

#[test]
fn every_source_is_followed_by_ingestion() {
    let req = compile_at(&crossfade_timeline(), 0.6);
    let g = &req.graph;
    let sources = g.nodes_with_shader("src.decode").collect::<Vec<_>>();
    assert_eq!(sources.len(), 2);
    for src in sources {
        let ingest = g
            .nodes
            .iter()
            .find(|n| n.input_at(0).is_some_and(|b| b.node == src.id))
            .unwrap();
        assert_eq!(ingest.shader.as_str(), "cs.idt");
        assert_eq!(
            ingest.param("working_space"),
            Some(&ParamValue::Str("acescg".to_owned()))
        );
        assert_eq!(
            ingest.param("source_kind"),
            Some(&ParamValue::Str("recorded".to_owned()))
        );
    }
}

#[test]
fn retime_scales_generator_time() {
    let tl = single_track(vec![
        ClipBuilder::new("g", "gen://bars", 0.0, 2.0)
            .feature(FeatureApplication::new(RETIME_EFFECT_ID).with_param("factor", 2.0_f64.into()))
            .build()
            .unwrap(),
    ]);
    let req = compile_at(&tl, 0.25);
    let gens = req.graph.nodes_with_shader("gen.bars").collect::<Vec<_>>();
    assert_eq!(gens.len(), 1);
    assert_eq!(gens[0].param("time"), Some(&ParamValue::F64(0.5)));
    // Temporal features never become nodes.
    assert_eq!(req.graph.nodes.len(), 3);
}

#[test]
fn generator_query_params_reach_the_source_node() {
    let tl = single_track(vec![
        ClipBuilder::new("g", "gen://noise?scale=2&mono", 1.0, 2.0)
            .offset(0.5)
            .build()
            .unwrap(),
    ]);
    let req = compile_at(&tl, 1.5);
    let src = &req.graph.nodes[0];
    assert_eq!(src.shader.as_str(), "gen.noise");
    assert_eq!(src.param("scale"), Some(&ParamValue::I64(2)));
    assert_eq!(src.param("mono"), Some(&ParamValue::Bool(true)));
    assert_eq!(f64_param(src, "time"), 1.0);
    assert_eq!(
        req.graph.nodes[1].param("source_kind"),
        Some(&ParamValue::Str("procedural".to_owned()))
    );
}

#[test]
fn paired_progress_uses_the_outgoing_ease() {
    let tl = single_track(vec![
        ClipBuilder::new("A", "media://a.mov", 0.0, 1.0)
            .transition_out(Transition::crossfade(0.5).with_ease(Ease::InQuad))
            .build()
            .unwrap(),
        ClipBuilder::new("B", "media://b.mov", 0.5, 1.0)
            .transition_in(Transition::crossfade(0.5))
            .build()
            .unwrap(),
    ]);
    let req = compile_at(&tl, 0.6);
    let tx = req.graph.nodes_with_shader("tx.crossfade").next().unwrap();
    // Raw progress 0.2, squared.
    assert!((f64_param(tx, "progress") - 0.04).abs() < 1e-9);
}

#[test]
fn unpaired_transitions_fade_a_single_clip() {
    let tl = single_track(vec![
        ClipBuilder::new("a", "media://a.mov", 0.0, 2.0)
            .transition_in(Transition::crossfade(0.5))
            .transition_out(Transition::crossfade(0.5))
            .build()
            .unwrap(),
    ]);

    let head = compile_at(&tl, 0.25);
    let tx = head.graph.nodes_with_shader("tx.crossfade").collect::<Vec<_>>();
    assert_eq!(tx.len(), 1);
    assert_eq!(tx[0].inputs.len(), 1);
    assert_eq!(tx[0].inputs[0].port, TRANSITION_TO_PORT);
    assert!((f64_param(tx[0], "progress") - 0.5).abs() < 1e-9);

    let tail = compile_at(&tl, 1.75);
    let tx = tail.graph.nodes_with_shader("tx.crossfade").collect::<Vec<_>>();
    assert_eq!(tx.len(), 1);
    assert_eq!(tx[0].inputs[0].port, TRANSITION_FROM_PORT);
    assert!((f64_param(tx[0], "progress") - 0.5).abs() < 1e-9);

    let middle = compile_at(&tl, 1.0);
    assert_eq!(middle.graph.nodes_with_shader("tx.crossfade").count(), 0);
}

#[test]
fn empty_frame_still_has_an_output() {
    let tl = crossfade_timeline();
    let req = compile_at(&tl, 5.0);
    assert_eq!(req.graph.nodes.len(), 1);
    assert_eq!(req.graph.output, NodeId(0));
    assert!(req.graph.nodes[0].inputs.is_empty());
}

#[test]
fn audio_tracks_do_not_contribute_layers() {
    let tl = TimelineBuilder::new("tl")
        .track(
            TrackBuilder::audio("a1")
                .clip(ClipBuilder::new("snd", "media://a.wav", 0.0, 2.0).build().unwrap())
                .build()
                .unwrap(),
        )
        .track(
            TrackBuilder::video("v1")
                .clip(ClipBuilder::new("pic", "media://p.mov", 0.0, 2.0).build().unwrap())
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let req = compile_at(&tl, 1.0);
    assert_eq!(req.graph.nodes_with_shader("src.decode").count(), 1);
    assert_eq!(req.graph.node(req.graph.output).unwrap().inputs.len(), 1);
}

#[test]
fn layers_follow_track_order() {
    let tl = TimelineBuilder::new("tl")
        .track(
            TrackBuilder::video("bottom")
                .clip(ClipBuilder::new("b", "media://b.mov", 0.0, 2.0).build().unwrap())
                .build()
                .unwrap(),
        )
        .track(
            TrackBuilder::video("top")
                .clip(ClipBuilder::new("t", "gen://solid", 0.0, 2.0).build().unwrap())
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let req = compile_at(&tl, 1.0);
    let g = &req.graph;
    let out = g.node(g.output).unwrap();
    let layers = out.inputs.iter().map(|b| (b.port.as_str(), b.slot)).collect::<Vec<_>>();
    assert_eq!(layers, vec![("layer0", 0), ("layer1", 1)]);
    let top = g.node(out.input("layer1").unwrap().node).unwrap();
    let top_src = g.node(top.input_at(0).unwrap().node).unwrap();
    assert_eq!(top_src.shader.as_str(), "gen.solid");
}

#[test]
fn unknown_effect_fails_compilation() {
    let tl = single_track(vec![
        ClipBuilder::new("a", "media://a.mov", 0.0, 1.0)
            .feature(FeatureApplication::new("fx.nope"))
            .build()
            .unwrap(),
    ]);
    let err = compiler()
        .compile(&tl, Time(0.5), Quality::Full, &FrameContext::new())
        .unwrap_err();
    assert!(matches!(err, MontageError::UnknownEffect(ref id) if id == "fx.nope"));
}

#[test]
fn non_finite_playhead_is_rejected() {
    let tl = crossfade_timeline();
    assert!(
        compiler()
            .compile(&tl, Time(f64::NAN), Quality::Full, &FrameContext::new())
            .is_err()
    );
}

#[test]
fn conditioned_port_binds_generator_only_with_regions() {
    let tl = single_track(vec![
        ClipBuilder::new("a", "media://a.mov", 0.0, 1.0)
            .feature(FeatureApplication::new(FACE_BLUR_EFFECT_ID))
            .build()
            .unwrap(),
    ]);

    let ctx = FrameContext::new().with_regions("a", vec![Rect::new(0.1, 0.1, 0.3, 0.4)]);
    let req = compiler()
        .compile(&tl, Time(0.5), Quality::Preview, &ctx)
        .unwrap();
    let g = &req.graph;
    let masks = g.nodes_with_shader("gen.region_mask").collect::<Vec<_>>();
    assert_eq!(masks.len(), 1);
    assert_eq!(masks[0].param("width"), Some(&ParamValue::I64(960)));
    assert_eq!(masks[0].param("height"), Some(&ParamValue::I64(540)));
    let mix = g.nodes_with_shader("fx.mask_mix").next().unwrap();
    assert_eq!(mix.input("mask").map(|b| (b.node, b.slot)), Some((masks[0].id, 2)));

    let bare = compile_at(&tl, 0.5);
    assert_eq!(bare.graph.nodes_with_shader("gen.region_mask").count(), 0);
    let mix = bare.graph.nodes_with_shader("fx.mask_mix").next().unwrap();
    assert_eq!(mix.inputs.len(), 2);
}

#[test]
fn quality_scales_resolution() {
    let tl = crossfade_timeline();
    let c = compiler();
    let ctx = FrameContext::new();
    let full = c.compile(&tl, Time(0.2), Quality::Full, &ctx).unwrap();
    let draft = c.compile(&tl, Time(0.2), Quality::Draft, &ctx).unwrap();
    assert_eq!((full.resolution.width, full.resolution.height), (1920, 1080));
    assert_eq!((draft.resolution.width, draft.resolution.height), (480, 270));
    assert_eq!(draft.quality, Quality::Draft);
    assert_eq!(full.graph, draft.graph);
}

#[test]
fn compilation_is_deterministic() {
    let tl = crossfade_timeline();
    let a = compile_at(&tl, 0.6);
    let b = compile_at(&tl, 0.6);
    assert_eq!(a, b);
    assert_eq!(a.graph.dump(), b.graph.dump());
    assert_eq!(a.graph.fingerprint(), b.graph.fingerprint());
    assert_ne!(
        a.graph.fingerprint(),
        compile_at(&tl, 0.7).graph.fingerprint()
    );
}

#[test]
fn compile_many_matches_sequential_compiles() {
    let tl = crossfade_timeline();
    let c = TimelineCompiler::new(
        standard_registry(),
        CompilerConfig {
            threads: Some(2),
            ..CompilerConfig::default()
        },
    )
    .unwrap();
    let ctx = FrameContext::new();
    let playheads = [0.0, 0.4, 0.6, 0.9, 1.2].map(Time);
    let many = c
        .compile_many(&tl, &playheads, Quality::Preview, &ctx)
        .unwrap();
    assert_eq!(many.len(), playheads.len());
    for (req, &at) in many.iter().zip(&playheads) {
        assert_eq!(req, &c.compile(&tl, at, Quality::Preview, &ctx).unwrap());
    }

    assert_eq!(c.pool.as_ref().map(rayon::ThreadPool::current_num_threads), Some(2));
    // The pool outlives a single call.
    let again = c
        .compile_many(&tl, &playheads, Quality::Preview, &ctx)
        .unwrap();
    assert_eq!(again, many);
}

#[test]
fn thread_pool_is_only_built_for_explicit_thread_counts() {
    assert!(compiler().pool.is_none());
    assert!(build_thread_pool(0).is_err());
    let zero = TimelineCompiler::new(
        standard_registry(),
        CompilerConfig {
            threads: Some(0),
            ..CompilerConfig::default()
        },
    );
    assert!(zero.is_err());
}

#[test]
fn pairing_requires_both_sides_and_an_overlap() {
    let a = ClipBuilder::new("a", "media://a.mov", 0.0, 1.0)
        .transition_out(Transition::crossfade(0.5))
        .build()
        .unwrap();
    let b = ClipBuilder::new("b", "media://b.mov", 0.5, 1.0)
        .transition_in(Transition::crossfade(0.5))
        .build()
        .unwrap();
    assert!(is_paired(&a, &b));

    let mut butted = b.clone();
    butted.start = Time(1.0);
    assert!(!is_paired(&a, &butted));

    let mut bare = b;
    bare.transition_in = None;
    assert!(!is_paired(&a, &bare));
}
