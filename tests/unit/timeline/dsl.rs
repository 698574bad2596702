use super::*;

#[test]
fn builder_sorts_tracks_and_computes_duration() {
    let tl = TimelineBuilder::new("tl")
        .track(
            TrackBuilder::video("v1")
                .clip(ClipBuilder::new("b", "media://b.mov", 2.0, 1.5).build().unwrap())
                .clip(ClipBuilder::new("a", "media://a.mov", 0.0, 2.0).build().unwrap())
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    assert_eq!(tl.duration, Time(3.5));
    assert_eq!(tl.tracks[0].clips[0].id.as_str(), "a");
    assert_eq!(tl.tracks[0].clips[0].name, "a");
    assert_eq!(tl.tracks[0].clips[0].asset.id.as_str(), "media://a.mov");
}

#[test]
fn clip_builder_rejects_non_positive_duration() {
    assert!(ClipBuilder::new("a", "media://a.mov", 0.0, 0.0).build().is_err());
    assert!(ClipBuilder::new("", "media://a.mov", 0.0, 1.0).build().is_err());
}

#[test]
fn feature_builder_replaces_same_effect() {
    let c = ClipBuilder::new("a", "gen://bars", 0.0, 1.0)
        .feature(FeatureApplication::new("mv.retime").with_param("factor", 2.0.into()))
        .feature(FeatureApplication::new("mv.retime").with_param("factor", 3.0.into()))
        .build()
        .unwrap();
    assert_eq!(c.features.len(), 1);
    assert_eq!(c.retime_factor(), 3.0);
}

#[test]
fn timeline_builder_rejects_duplicate_clip_ids_across_tracks() {
    let res = TimelineBuilder::new("tl")
        .track(
            TrackBuilder::video("v1")
                .clip(ClipBuilder::new("x", "media://a", 0.0, 1.0).build().unwrap())
                .build()
                .unwrap(),
        )
        .track(
            TrackBuilder::audio("a1")
                .clip(ClipBuilder::new("x", "media://a", 0.0, 1.0).build().unwrap())
                .build()
                .unwrap(),
        )
        .build();
    assert!(res.is_err());
}
