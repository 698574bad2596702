use super::*;

fn clip(id: &str, locator: &str, start: f64, duration: f64) -> Clip {
    Clip {
        id: ClipId::from(id),
        name: id.to_owned(),
        asset: AssetReference::new(format!("asset-{id}").as_str(), locator),
        start: Time(start),
        duration: Time(duration),
        offset: Time::ZERO,
        transition_in: None,
        transition_out: None,
        features: vec![],
    }
}

#[test]
fn end_time_and_overlap_are_symmetric() {
    let a = clip("a", "media://a.mov", 0.0, 1.0);
    let b = clip("b", "media://b.mov", 0.5, 1.0);
    let c = clip("c", "media://c.mov", 1.0, 1.0);
    assert_eq!(a.end(), Time(1.0));
    assert!(a.overlaps(&b) && b.overlaps(&a));
    assert!(!a.overlaps(&c) && !c.overlaps(&a));
    assert_eq!(a.overlap_with(&b), Time(0.5));
    assert_eq!(a.overlap_with(&c), Time::ZERO);
}

#[test]
fn locator_scheme_selects_source_kind() {
    let asset = AssetReference::new("n", "gen://noise?scale=2&speed=0.5&mode=fbm&invert");
    match asset.source() {
        SourceKind::Procedural { generator, params } => {
            assert_eq!(generator, "noise");
            assert_eq!(params.get("scale"), Some(&ParamValue::I64(2)));
            assert_eq!(params.get("speed"), Some(&ParamValue::F64(0.5)));
            assert_eq!(params.get("mode"), Some(&ParamValue::Str("fbm".into())));
            assert_eq!(params.get("invert"), Some(&ParamValue::Bool(true)));
        }
        SourceKind::Recorded => panic!("expected procedural"),
    }
    assert_eq!(
        AssetReference::new("m", "media://shot.mov").source(),
        SourceKind::Recorded
    );
}

#[test]
fn upsert_feature_replaces_by_effect_id() {
    let mut c = clip("a", "media://a.mov", 0.0, 1.0);
    c.upsert_feature(FeatureApplication::new("mv.blur").with_param("radius", 2.0.into()));
    c.upsert_feature(FeatureApplication::new(RETIME_EFFECT_ID).with_param("factor", 2.0.into()));
    c.upsert_feature(FeatureApplication::new("mv.blur").with_param("radius", 4.0.into()));
    assert_eq!(c.features.len(), 2);
    assert_eq!(c.features[0].effect.as_str(), "mv.blur");
    assert_eq!(
        c.feature("mv.blur").unwrap().params.get("radius"),
        Some(&ParamValue::F64(4.0))
    );
}

#[test]
fn retime_only_changes_procedural_source_rate() {
    let mut generated = clip("g", "gen://bars", 1.0, 2.0);
    generated.upsert_feature(
        FeatureApplication::new(RETIME_EFFECT_ID).with_param("factor", 2.0.into()),
    );
    assert_eq!(generated.retime_factor(), 2.0);
    assert_eq!(generated.source_time_at(Time(1.25)), Time(0.5));

    let mut recorded = clip("r", "media://r.mov", 1.0, 2.0);
    recorded.offset = Time(3.0);
    recorded.upsert_feature(
        FeatureApplication::new(RETIME_EFFECT_ID).with_param("factor", 2.0.into()),
    );
    assert_eq!(recorded.source_rate(), 1.0);
    assert_eq!(recorded.source_time_at(Time(1.5)), Time(3.5));
}

#[test]
fn recompute_duration_takes_max_end() {
    let mut tl = Timeline::new("tl");
    assert_eq!(tl.duration, Time::ZERO);
    let mut v = Track::new("v1", TrackKind::Video);
    v.clips.push(clip("a", "media://a.mov", 0.0, 1.0));
    v.clips.push(clip("b", "media://b.mov", 3.0, 0.5));
    let mut a = Track::new("a1", TrackKind::Audio);
    a.clips.push(clip("s", "media://s.wav", 0.0, 2.0));
    tl.tracks = vec![v, a];
    tl.recompute_duration();
    assert_eq!(tl.duration, Time(3.5));
}

#[test]
fn sort_is_stable_for_equal_starts() {
    let mut t = Track::new("v1", TrackKind::Video);
    t.clips.push(clip("late", "media://x", 2.0, 1.0));
    t.clips.push(clip("first", "media://x", 0.0, 1.0));
    t.clips.push(clip("second", "media://x", 0.0, 1.0));
    t.sort_clips();
    let ids = t.clips.iter().map(|c| c.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["first", "second", "late"]);
    assert_eq!(t.position(&ClipId::from("late")), Some(2));
}

#[test]
fn validate_rejects_duplicate_ids_and_bad_spans() {
    let mut tl = Timeline::new("tl");
    let mut v = Track::new("v1", TrackKind::Video);
    v.clips.push(clip("a", "media://a.mov", 0.0, 1.0));
    tl.tracks.push(v);
    tl.validate().unwrap();

    let mut dup = tl.clone();
    dup.tracks[0].clips.push(clip("a", "media://b.mov", 2.0, 1.0));
    assert!(dup.validate().is_err());

    let mut zero = tl.clone();
    zero.tracks[0].clips[0].duration = Time::ZERO;
    assert!(zero.validate().is_err());

    let mut no_gen = tl.clone();
    no_gen.tracks[0].clips[0].asset.locator = "gen://".to_owned();
    assert!(no_gen.validate().is_err());
}

#[test]
fn timeline_json_roundtrips_through_serde() {
    let mut tl = Timeline::new("tl");
    let mut v = Track::new("v1", TrackKind::Video);
    let mut c = clip("a", "gen://bars", 0.0, 1.0);
    c.transition_out = Some(Transition::crossfade(0.5));
    v.clips.push(c);
    tl.tracks.push(v);
    let json = serde_json::to_string(&tl).unwrap();
    let back = Timeline::from_json_str(&json).unwrap();
    assert_eq!(back, tl);
}
