//! Shared primitives for ripple, move and trim commands.
//!
//! Two ripple strategies coexist and must stay separate:
//! - the edited track shifts by *index* (everything stored after the edited clip), which keeps
//!   intentional overlaps such as crossfades intact;
//! - every other track shifts by *time threshold* (clips starting at or after the ripple point).

use crate::{
    foundation::core::Time,
    foundation::ids::{ClipId, TrackId},
    foundation::math::{TIME_EPSILON, approx_zero},
    timeline::model::{Timeline, Track, TrackKind},
};

/// An overlap between two clips on one track, detected after a permissive edit.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Overlap {
    pub(crate) track: TrackId,
    pub(crate) clip: ClipId,
    pub(crate) other: ClipId,
    pub(crate) amount: Time,
}

/// Sort `track`, then shift every clip at `index >= start_index` by `delta`, clamping starts at
/// zero.
///
/// Callers compute `start_index` against the sorted order; sorting here is idempotent.
pub(crate) fn shift_downstream_clips_on_track_by_index(
    track: &mut Track,
    start_index: usize,
    delta: Time,
) {
    track.sort_clips();
    for clip in track.clips.iter_mut().skip(start_index) {
        clip.start = (clip.start + delta).clamp_non_negative();
    }
}

/// Shift clips on every track except `excluding` whose start is at or after `ripple_point`.
///
/// Returns the indices of tracks that had at least one clip moved.
pub(crate) fn shift_clips_on_other_tracks_at_or_after(
    timeline: &mut Timeline,
    excluding: usize,
    ripple_point: Time,
    delta: Time,
) -> Vec<usize> {
    let threshold = ripple_point.secs() - TIME_EPSILON;
    let mut touched = Vec::new();
    for (ti, track) in timeline.tracks.iter_mut().enumerate() {
        if ti == excluding {
            continue;
        }
        let mut moved = false;
        for clip in track.clips.iter_mut() {
            if clip.start.secs() >= threshold {
                clip.start = (clip.start + delta).clamp_non_negative();
                moved = true;
            }
        }
        if moved {
            touched.push(ti);
        }
    }
    touched
}

/// Shrink or dissolve paired transitions so none exceeds its clips' overlap.
///
/// Expects a sorted track. Unpaired transitions (only one side set) are left untouched.
pub(crate) fn normalize_paired_transitions(track: &mut Track) {
    for i in 1..track.clips.len() {
        let (head, tail) = track.clips.split_at_mut(i);
        let a = &mut head[i - 1];
        let b = &mut tail[0];
        if a.transition_out.is_none() || b.transition_in.is_none() {
            continue;
        }

        let overlap = a.overlap_with(b);
        if overlap.secs() <= TIME_EPSILON {
            a.transition_out = None;
            b.transition_in = None;
            continue;
        }
        for tr in [a.transition_out.as_mut(), b.transition_in.as_mut()]
            .into_iter()
            .flatten()
        {
            if tr.duration > overlap {
                tr.duration = overlap;
            }
        }
    }
}

/// Re-sort and re-normalize a track after its clips moved or changed length.
pub(crate) fn settle_track(track: &mut Track) {
    track.sort_clips();
    normalize_paired_transitions(track);
}

/// Audio clips structurally linked to a video clip with the given pre-edit placement.
pub(crate) fn linked_audio(timeline: &Timeline, start: Time, duration: Time) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for (ti, track) in timeline.tracks.iter().enumerate() {
        if track.kind != TrackKind::Audio {
            continue;
        }
        for (ci, clip) in track.clips.iter().enumerate() {
            if clip.start == start && clip.duration == duration {
                out.push((ti, ci));
            }
        }
    }
    out
}

/// Clear the transitions facing a clip that was removed at `removed_index` of a sorted track.
pub(crate) fn clear_boundary_transitions(track: &mut Track, removed_index: usize) {
    if let Some(prev) = removed_index
        .checked_sub(1)
        .and_then(|i| track.clips.get_mut(i))
    {
        prev.transition_out = None;
    }
    if let Some(next) = track.clips.get_mut(removed_index) {
        next.transition_in = None;
    }
}

/// Overlaps between `clip` and any other clip on `track`, in storage order.
pub(crate) fn detect_overlaps(track: &Track, clip: &ClipId) -> Vec<Overlap> {
    let Some(subject) = track.clips.iter().find(|c| &c.id == clip) else {
        return Vec::new();
    };
    track
        .clips
        .iter()
        .filter(|other| &other.id != clip)
        .filter_map(|other| {
            let amount = subject.overlap_with(other);
            if amount.secs() > TIME_EPSILON {
                Some(Overlap {
                    track: track.id.clone(),
                    clip: clip.clone(),
                    other: other.id.clone(),
                    amount,
                })
            } else {
                None
            }
        })
        .collect()
}

pub(crate) fn is_zero_delta(delta: Time) -> bool {
    approx_zero(delta.secs())
}

#[cfg(test)]
#[path = "../../tests/unit/edit/ripple.rs"]
mod tests;
