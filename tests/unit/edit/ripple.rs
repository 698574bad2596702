use super::*;
use crate::{ClipBuilder, TimelineBuilder, TrackBuilder, Transition};

fn clip(id: &str, start: f64, duration: f64) -> crate::Clip {
    ClipBuilder::new(id, format!("media://{id}.mov"), start, duration)
        .build()
        .unwrap()
}

fn starts(track: &Track) -> Vec<(String, f64)> {
    track
        .clips
        .iter()
        .map(|c| (c.id.to_string(), c.start.secs()))
        .collect()
}

#[test]
fn index_shift_preserves_intentional_overlap() {
    let mut track = TrackBuilder::video("v1")
        .clip(clip("c", 2.0, 1.0))
        .clip(clip("a", 0.0, 1.0))
        .clip(clip("b", 0.5, 1.0))
        .build()
        .unwrap();

    shift_downstream_clips_on_track_by_index(&mut track, 1, Time(1.0));

    assert_eq!(
        starts(&track),
        vec![
            ("a".to_owned(), 0.0),
            ("b".to_owned(), 1.5),
            ("c".to_owned(), 3.0)
        ]
    );
}

#[test]
fn index_shift_clamps_at_zero() {
    let mut track = TrackBuilder::video("v1")
        .clip(clip("a", 0.0, 1.0))
        .clip(clip("b", 1.0, 1.0))
        .build()
        .unwrap();
    shift_downstream_clips_on_track_by_index(&mut track, 1, Time(-5.0));
    assert_eq!(track.clips[1].start, Time::ZERO);
}

#[test]
fn other_tracks_shift_by_threshold() {
    let mut tl = TimelineBuilder::new("tl")
        .track(TrackBuilder::video("v1").clip(clip("a", 0.0, 1.0)).build().unwrap())
        .track(
            TrackBuilder::video("v2")
                .clip(clip("early", 0.5, 0.2))
                .clip(clip("at", 1.0, 0.5))
                .clip(clip("late", 2.0, 0.5))
                .build()
                .unwrap(),
        )
        .track(TrackBuilder::audio("a1").clip(clip("s", 0.0, 0.5)).build().unwrap())
        .build()
        .unwrap();

    let touched = shift_clips_on_other_tracks_at_or_after(&mut tl, 0, Time(1.0), Time(0.5));

    assert_eq!(touched, vec![1]);
    assert_eq!(tl.tracks[0].clips[0].start, Time(0.0));
    assert_eq!(
        starts(&tl.tracks[1]),
        vec![
            ("early".to_owned(), 0.5),
            ("at".to_owned(), 1.5),
            ("late".to_owned(), 2.5)
        ]
    );
}

#[test]
fn paired_transition_is_clamped_to_overlap() {
    let mut track = TrackBuilder::video("v1")
        .clip(
            ClipBuilder::new("a", "media://a", 0.0, 1.0)
                .transition_out(Transition::crossfade(0.5))
                .build()
                .unwrap(),
        )
        .clip(
            ClipBuilder::new("b", "media://b", 0.8, 1.0)
                .transition_in(Transition::crossfade(0.5))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    normalize_paired_transitions(&mut track);

    let overlap = track.clips[0].overlap_with(&track.clips[1]);
    assert_eq!(
        track.clips[0].transition_out.as_ref().unwrap().duration,
        overlap
    );
    assert_eq!(
        track.clips[1].transition_in.as_ref().unwrap().duration,
        overlap
    );
}

#[test]
fn paired_transition_dissolves_without_overlap() {
    let mut track = TrackBuilder::video("v1")
        .clip(
            ClipBuilder::new("a", "media://a", 0.0, 1.0)
                .transition_out(Transition::crossfade(0.5))
                .build()
                .unwrap(),
        )
        .clip(
            ClipBuilder::new("b", "media://b", 1.0, 1.0)
                .transition_in(Transition::crossfade(0.5))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    normalize_paired_transitions(&mut track);

    assert!(track.clips[0].transition_out.is_none());
    assert!(track.clips[1].transition_in.is_none());
}

#[test]
fn unpaired_transitions_are_left_alone() {
    let mut track = TrackBuilder::video("v1")
        .clip(
            ClipBuilder::new("a", "media://a", 0.0, 1.0)
                .transition_out(Transition::crossfade(0.5))
                .build()
                .unwrap(),
        )
        .clip(clip("b", 3.0, 1.0))
        .build()
        .unwrap();

    normalize_paired_transitions(&mut track);

    assert_eq!(
        track.clips[0].transition_out.as_ref().unwrap().duration,
        Time(0.5)
    );
}

#[test]
fn linked_audio_requires_exact_alignment_on_audio_tracks() {
    let tl = TimelineBuilder::new("tl")
        .track(TrackBuilder::video("v1").clip(clip("v", 1.0, 2.0)).build().unwrap())
        .track(
            TrackBuilder::audio("a1")
                .clip(clip("linked", 1.0, 2.0))
                .clip(clip("shorter", 4.0, 1.0))
                .build()
                .unwrap(),
        )
        .track(TrackBuilder::audio("a2").clip(clip("off", 1.0, 2.5)).build().unwrap())
        .track(TrackBuilder::video("v2").clip(clip("twin", 1.0, 2.0)).build().unwrap())
        .build()
        .unwrap();

    assert_eq!(linked_audio(&tl, Time(1.0), Time(2.0)), vec![(1, 0)]);
}

#[test]
fn clear_boundary_transitions_clears_both_neighbours() {
    let mut track = TrackBuilder::video("v1")
        .clip(
            ClipBuilder::new("a", "media://a", 0.0, 1.0)
                .transition_in(Transition::crossfade(0.25))
                .transition_out(Transition::crossfade(0.5))
                .build()
                .unwrap(),
        )
        .clip(
            ClipBuilder::new("b", "media://b", 2.0, 1.0)
                .transition_in(Transition::crossfade(0.5))
                .transition_out(Transition::crossfade(0.25))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    track.sort_clips();

    // Pretend a clip sat between `a` and `b` at index 1.
    clear_boundary_transitions(&mut track, 1);

    assert!(track.clips[0].transition_in.is_some());
    assert!(track.clips[0].transition_out.is_none());
    assert!(track.clips[1].transition_in.is_none());
    assert!(track.clips[1].transition_out.is_some());
}

#[test]
fn detect_overlaps_reports_amounts() {
    let track = TrackBuilder::video("v1")
        .clip(clip("a", 0.0, 1.0))
        .clip(clip("b", 0.75, 1.0))
        .clip(clip("c", 1.5, 1.0))
        .build()
        .unwrap();

    let found = detect_overlaps(&track, &ClipId::new("b"));

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].other.as_str(), "a");
    assert_eq!(found[0].amount, Time(0.25));
    assert_eq!(found[1].other.as_str(), "c");
    assert_eq!(found[1].track.as_str(), "v1");
    assert!(detect_overlaps(&track, &ClipId::new("missing")).is_empty());
}
