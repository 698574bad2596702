use std::collections::{BTreeMap, BTreeSet};

use crate::{
    edit::apply::NoOpReason,
    edit::command::IntentCommand,
    edit::ripple::{
        Overlap, clear_boundary_transitions, detect_overlaps, is_zero_delta, linked_audio,
        settle_track, shift_clips_on_other_tracks_at_or_after,
        shift_downstream_clips_on_track_by_index,
    },
    edit::target::ClipTarget,
    foundation::core::Time,
    foundation::ids::{ClipId, TrackId},
    foundation::math::{IdHasher, TIME_EPSILON},
    timeline::model::{
        COLOR_GRADE_EFFECT_ID, Clip, FeatureApplication, ParamValue, RETIME_EFFECT_ID, Timeline,
    },
};

/// Result of transforming a draft timeline: overlaps to report, or the reason nothing happened.
///
/// On `Err` the draft may be partially written and must be discarded.
pub(crate) type Step = Result<Vec<Overlap>, NoOpReason>;

pub(crate) fn run(tl: &mut Timeline, command: &IntentCommand) -> Step {
    match command {
        IntentCommand::ApplyColorGrade {
            target,
            grade_target,
            params,
        } => apply_color_grade(tl, target, grade_target, params),
        IntentCommand::TrimClipEnd { target, at } => trim_clip_end(tl, target, *at),
        IntentCommand::RetimeClip { target, factor } => retime_clip(tl, target, *factor),
        IntentCommand::MoveClip { target, to_start } => move_clip(tl, target, *to_start),
        IntentCommand::TrimClipIn { target, to_offset } => trim_clip_in(tl, target, *to_offset),
        IntentCommand::BladeClip { target, at } => blade_clip(tl, target, *at),
        IntentCommand::RippleTrimOut { target, new_end } => ripple_trim_out(tl, target, *new_end),
        IntentCommand::RippleTrimIn { target, new_offset } => {
            ripple_trim_in(tl, target, *new_offset)
        }
        IntentCommand::RippleDelete { target } => ripple_delete(tl, target),
        IntentCommand::RippleInsert { track, clip } => ripple_insert(tl, track, clip),
    }
}

fn resolve(tl: &Timeline, target: &ClipTarget) -> Result<(usize, usize), NoOpReason> {
    target.resolve(tl).ok_or(NoOpReason::TargetNotFound)
}

fn settle_all(tl: &mut Timeline, touched: &BTreeSet<usize>) {
    for &ti in touched {
        if let Some(track) = tl.tracks.get_mut(ti) {
            settle_track(track);
        }
    }
}

fn apply_color_grade(
    tl: &mut Timeline,
    target: &ClipTarget,
    grade_target: &str,
    params: &BTreeMap<String, ParamValue>,
) -> Step {
    let (ti, ci) = resolve(tl, target)?;

    let mut feature = FeatureApplication::new(COLOR_GRADE_EFFECT_ID);
    feature.params = params.clone();
    feature
        .params
        .insert("region".to_owned(), ParamValue::Str(grade_target.to_owned()));

    let mut clip = tl.tracks[ti].clips[ci].clone();
    clip.upsert_feature(feature);
    tl.tracks[ti].clips[ci] = clip;
    Ok(Vec::new())
}

fn trim_clip_end(tl: &mut Timeline, target: &ClipTarget, at: Time) -> Step {
    let (ti, ci) = resolve(tl, target)?;
    if !at.is_finite() {
        return Err(NoOpReason::InvalidArgument);
    }
    let original = tl.tracks[ti].clips[ci].clone();
    let new_duration = at - original.start;
    if new_duration.secs() <= TIME_EPSILON {
        return Err(NoOpReason::NonPositiveDuration);
    }

    let linked = linked_audio(tl, original.start, original.duration);
    let mut touched = BTreeSet::from([ti]);
    for (ati, aci) in linked {
        let mut audio = tl.tracks[ati].clips[aci].clone();
        audio.duration = new_duration;
        tl.tracks[ati].clips[aci] = audio;
        touched.insert(ati);
    }

    let mut clip = original;
    clip.duration = new_duration;
    tl.tracks[ti].clips[ci] = clip;

    settle_all(tl, &touched);
    Ok(Vec::new())
}

fn retime_clip(tl: &mut Timeline, target: &ClipTarget, factor: f64) -> Step {
    let (ti, ci) = resolve(tl, target)?;
    if !factor.is_finite() || factor <= 0.0 {
        return Err(NoOpReason::InvalidArgument);
    }

    let mut clip = tl.tracks[ti].clips[ci].clone();
    clip.upsert_feature(FeatureApplication::new(RETIME_EFFECT_ID).with_param("factor", factor.into()));
    tl.tracks[ti].clips[ci] = clip;
    Ok(Vec::new())
}

fn move_clip(tl: &mut Timeline, target: &ClipTarget, to_start: Time) -> Step {
    let (ti, ci) = resolve(tl, target)?;
    if !to_start.is_finite() {
        return Err(NoOpReason::InvalidArgument);
    }
    let original = tl.tracks[ti].clips[ci].clone();
    let new_start = to_start.clamp_non_negative();
    let delta = new_start - original.start;

    let linked = linked_audio(tl, original.start, original.duration);
    let mut touched = BTreeSet::from([ti]);
    let mut moved = vec![(tl.tracks[ti].id.clone(), original.id.clone())];
    for (ati, aci) in linked {
        let mut audio = tl.tracks[ati].clips[aci].clone();
        audio.start = (audio.start + delta).clamp_non_negative();
        moved.push((tl.tracks[ati].id.clone(), audio.id.clone()));
        tl.tracks[ati].clips[aci] = audio;
        touched.insert(ati);
    }

    let mut clip = original;
    clip.start = new_start;
    tl.tracks[ti].clips[ci] = clip;

    settle_all(tl, &touched);

    let mut overlaps = Vec::new();
    for (track_id, clip_id) in &moved {
        if let Some(track) = tl.tracks.iter().find(|t| &t.id == track_id) {
            overlaps.extend(detect_overlaps(track, clip_id));
        }
    }
    Ok(overlaps)
}

fn trim_clip_in(tl: &mut Timeline, target: &ClipTarget, to_offset: Time) -> Step {
    let (ti, ci) = resolve(tl, target)?;
    if !to_offset.is_finite() || to_offset < Time::ZERO {
        return Err(NoOpReason::InvalidArgument);
    }

    let mut clip = tl.tracks[ti].clips[ci].clone();
    clip.offset = to_offset;
    tl.tracks[ti].clips[ci] = clip;
    Ok(Vec::new())
}

/// Deterministic id for one half of a bladed clip.
fn blade_id(original: &ClipId, half: char, at: Time) -> ClipId {
    let h = IdHasher::new()
        .str(original.as_str())
        .char(half)
        .f64(at.secs())
        .finish();
    ClipId::new(format!("{original}~{half}{h:x}"))
}

fn blade_clip(tl: &mut Timeline, target: &ClipTarget, at: Time) -> Step {
    let (ti, ci) = resolve(tl, target)?;
    let original = tl.tracks[ti].clips[ci].clone();
    if !(original.start < at && at < original.end()) {
        return Err(NoOpReason::SplitOutsideClip);
    }

    let first_id = blade_id(&original.id, 'a', at);
    let second_id = blade_id(&original.id, 'b', at);
    if tl.find_clip(&first_id).is_some() || tl.find_clip(&second_id).is_some() {
        return Err(NoOpReason::DuplicateClipId);
    }

    let mut first = original.clone();
    first.id = first_id;
    first.duration = at - original.start;
    first.transition_out = None;

    let mut second = original.clone();
    second.id = second_id;
    second.start = at;
    second.duration = original.duration - first.duration;
    second.offset = original.source_time_at(at);
    second.transition_in = None;

    let track = &mut tl.tracks[ti];
    track.clips[ci] = first;
    track.clips.insert(ci + 1, second);
    settle_track(track);
    Ok(Vec::new())
}

/// Ripple the edited track by index and every other track by threshold, then settle.
fn ripple_from(
    tl: &mut Timeline,
    ti: usize,
    clip_id: &ClipId,
    ripple_point: Time,
    delta: Time,
    mut touched: BTreeSet<usize>,
) {
    let track = &mut tl.tracks[ti];
    track.sort_clips();
    if let Some(idx) = track.position(clip_id) {
        shift_downstream_clips_on_track_by_index(track, idx + 1, delta);
    }
    touched.insert(ti);
    touched.extend(shift_clips_on_other_tracks_at_or_after(
        tl,
        ti,
        ripple_point,
        delta,
    ));
    settle_all(tl, &touched);
}

fn ripple_trim_out(tl: &mut Timeline, target: &ClipTarget, new_end: Time) -> Step {
    let (ti, ci) = resolve(tl, target)?;
    if !new_end.is_finite() {
        return Err(NoOpReason::InvalidArgument);
    }
    let original = tl.tracks[ti].clips[ci].clone();
    let new_duration = new_end - original.start;
    if new_duration.secs() <= TIME_EPSILON {
        return Err(NoOpReason::NonPositiveDuration);
    }
    let old_end = original.end();
    let delta = new_end - old_end;
    if is_zero_delta(delta) {
        return Err(NoOpReason::Unchanged);
    }

    let mut touched = BTreeSet::new();
    for (ati, aci) in linked_audio(tl, original.start, original.duration) {
        let mut audio = tl.tracks[ati].clips[aci].clone();
        audio.duration = new_duration;
        tl.tracks[ati].clips[aci] = audio;
        touched.insert(ati);
    }

    let mut clip = original;
    clip.duration = new_duration;
    let id = clip.id.clone();
    tl.tracks[ti].clips[ci] = clip;

    ripple_from(tl, ti, &id, old_end, delta, touched);
    Ok(Vec::new())
}

fn ripple_trim_in(tl: &mut Timeline, target: &ClipTarget, new_offset: Time) -> Step {
    let (ti, ci) = resolve(tl, target)?;
    if !new_offset.is_finite() || new_offset < Time::ZERO {
        return Err(NoOpReason::InvalidArgument);
    }
    let original = tl.tracks[ti].clips[ci].clone();
    let offset_delta = new_offset - original.offset;
    let new_duration = original.duration - offset_delta;
    if new_duration.secs() <= TIME_EPSILON {
        return Err(NoOpReason::NonPositiveDuration);
    }
    if is_zero_delta(offset_delta) {
        return Err(NoOpReason::Unchanged);
    }
    let old_end = original.end();
    let delta = (original.start + new_duration) - old_end;

    let mut touched = BTreeSet::new();
    for (ati, aci) in linked_audio(tl, original.start, original.duration) {
        let mut audio = tl.tracks[ati].clips[aci].clone();
        audio.duration = new_duration;
        audio.offset = (audio.offset + offset_delta).clamp_non_negative();
        tl.tracks[ati].clips[aci] = audio;
        touched.insert(ati);
    }

    let mut clip = original;
    clip.offset = new_offset;
    clip.duration = new_duration;
    let id = clip.id.clone();
    tl.tracks[ti].clips[ci] = clip;

    ripple_from(tl, ti, &id, old_end, delta, touched);
    Ok(Vec::new())
}

/// Remove `id` from track `ti`, clearing the facing transitions. Returns the removed clip.
fn remove_clip(tl: &mut Timeline, ti: usize, id: &ClipId) -> Option<(usize, Clip)> {
    let track = &mut tl.tracks[ti];
    track.sort_clips();
    let idx = track.position(id)?;
    let removed = track.clips.remove(idx);
    clear_boundary_transitions(track, idx);
    Some((idx, removed))
}

fn ripple_delete(tl: &mut Timeline, target: &ClipTarget) -> Step {
    let (ti, ci) = resolve(tl, target)?;
    let original = tl.tracks[ti].clips[ci].clone();
    let old_end = original.end();
    let delta = -original.duration;

    let linked = linked_audio(tl, original.start, original.duration)
        .into_iter()
        .map(|(ati, aci)| (ati, tl.tracks[ati].clips[aci].id.clone()))
        .collect::<Vec<_>>();

    let Some((idx, _)) = remove_clip(tl, ti, &original.id) else {
        return Err(NoOpReason::TargetNotFound);
    };
    shift_downstream_clips_on_track_by_index(&mut tl.tracks[ti], idx, delta);

    let mut touched = BTreeSet::from([ti]);
    for (ati, id) in &linked {
        remove_clip(tl, *ati, id);
        touched.insert(*ati);
    }

    touched.extend(shift_clips_on_other_tracks_at_or_after(
        tl, ti, old_end, delta,
    ));
    settle_all(tl, &touched);
    Ok(Vec::new())
}

fn ripple_insert(tl: &mut Timeline, track_id: &TrackId, clip: &Clip) -> Step {
    let Some(ti) = tl.track_index(track_id) else {
        return Err(NoOpReason::TrackNotFound);
    };
    if !clip.duration.is_finite() || clip.duration.secs() <= TIME_EPSILON {
        return Err(NoOpReason::NonPositiveDuration);
    }
    if !clip.start.is_finite()
        || clip.start < Time::ZERO
        || !clip.offset.is_finite()
        || clip.offset < Time::ZERO
    {
        return Err(NoOpReason::InvalidArgument);
    }
    if tl.find_clip(&clip.id).is_some() {
        return Err(NoOpReason::DuplicateClipId);
    }

    let track = &mut tl.tracks[ti];
    track.sort_clips();
    let threshold = clip.start.secs() - TIME_EPSILON;
    let idx = track
        .clips
        .iter()
        .position(|c| c.start.secs() >= threshold)
        .unwrap_or(track.clips.len());
    shift_downstream_clips_on_track_by_index(track, idx, clip.duration);
    track.clips.insert(idx, clip.clone());

    let mut touched = BTreeSet::from([ti]);
    touched.extend(shift_clips_on_other_tracks_at_or_after(
        tl,
        ti,
        clip.start,
        clip.duration,
    ));
    settle_all(tl, &touched);
    Ok(Vec::new())
}

#[cfg(test)]
#[path = "../../tests/unit/edit/ops.rs"]
mod tests;
