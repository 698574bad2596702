use std::collections::BTreeMap;
use std::fmt;

use crate::{
    edit::target::ClipTarget,
    foundation::core::Time,
    foundation::ids::TrackId,
    timeline::model::{Clip, ParamValue, Transition},
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
/// The closed set of timeline mutations.
///
/// This is the only sanctioned way to change a [`crate::Timeline`]; apply with
/// [`crate::apply_command`].
pub enum IntentCommand {
    /// Upsert the color grade feature on the target clip.
    ApplyColorGrade {
        /// Clip to grade.
        target: ClipTarget,
        /// Grading region name (e.g. `skin`, `sky`), folded in as the `region` parameter.
        grade_target: String,
        /// Grade parameters.
        #[serde(default)]
        params: BTreeMap<String, ParamValue>,
    },
    /// Set the clip end to `at` (timeline seconds); linked audio follows.
    TrimClipEnd {
        /// Clip to trim.
        target: ClipTarget,
        /// New end time.
        at: Time,
    },
    /// Attach a time-remap factor; interpreted at compile time.
    RetimeClip {
        /// Clip to retime.
        target: ClipTarget,
        /// Source seconds per timeline second.
        factor: f64,
    },
    /// Move the clip start; linked audio follows; overlaps are reported, never rejected.
    MoveClip {
        /// Clip to move.
        target: ClipTarget,
        /// New start time (clamped to zero).
        to_start: Time,
    },
    /// Slip edit: change the source trim-in only.
    TrimClipIn {
        /// Clip to slip.
        target: ClipTarget,
        /// New source offset.
        to_offset: Time,
    },
    /// Split the clip at `at` into two new clips.
    BladeClip {
        /// Clip to split.
        target: ClipTarget,
        /// Split point, strictly inside the clip span.
        at: Time,
    },
    /// Change the clip end and ripple downstream clips.
    RippleTrimOut {
        /// Clip to trim.
        target: ClipTarget,
        /// New end time.
        new_end: Time,
    },
    /// Change the source trim-in, shorten/lengthen the clip, and ripple downstream clips.
    RippleTrimIn {
        /// Clip to trim.
        target: ClipTarget,
        /// New source offset.
        new_offset: Time,
    },
    /// Remove the clip and close the gap.
    RippleDelete {
        /// Clip to remove.
        target: ClipTarget,
    },
    /// Insert a clip at its start time and push downstream clips later.
    RippleInsert {
        /// Destination track (any kind).
        track: TrackId,
        /// Clip to insert; its id must be unused.
        clip: Clip,
    },
}

impl IntentCommand {
    /// camelCase command name used in the audit log.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ApplyColorGrade { .. } => "applyColorGrade",
            Self::TrimClipEnd { .. } => "trimClipEnd",
            Self::RetimeClip { .. } => "retimeClip",
            Self::MoveClip { .. } => "moveClip",
            Self::TrimClipIn { .. } => "trimClipIn",
            Self::BladeClip { .. } => "bladeClip",
            Self::RippleTrimOut { .. } => "rippleTrimOut",
            Self::RippleTrimIn { .. } => "rippleTrimIn",
            Self::RippleDelete { .. } => "rippleDelete",
            Self::RippleInsert { .. } => "rippleInsert",
        }
    }

    /// Canonical, stably-ordered encoding: the command name followed by `key=value` fields in
    /// alphabetical key order.
    pub fn canonical(&self) -> String {
        let mut fields: Vec<(&'static str, String)> = match self {
            Self::ApplyColorGrade {
                target,
                grade_target,
                params,
            } => vec![
                ("target", target.to_string()),
                ("gradeTarget", format!("{grade_target:?}")),
                ("params", encode_params(params)),
            ],
            Self::TrimClipEnd { target, at } => {
                vec![("target", target.to_string()), ("at", at.to_string())]
            }
            Self::RetimeClip { target, factor } => {
                vec![("target", target.to_string()), ("factor", factor.to_string())]
            }
            Self::MoveClip { target, to_start } => vec![
                ("target", target.to_string()),
                ("toStart", to_start.to_string()),
            ],
            Self::TrimClipIn { target, to_offset } => vec![
                ("target", target.to_string()),
                ("toOffset", to_offset.to_string()),
            ],
            Self::BladeClip { target, at } => {
                vec![("target", target.to_string()), ("at", at.to_string())]
            }
            Self::RippleTrimOut { target, new_end } => vec![
                ("target", target.to_string()),
                ("newEnd", new_end.to_string()),
            ],
            Self::RippleTrimIn { target, new_offset } => vec![
                ("target", target.to_string()),
                ("newOffset", new_offset.to_string()),
            ],
            Self::RippleDelete { target } => vec![("target", target.to_string())],
            Self::RippleInsert { track, clip } => {
                vec![("track", track.to_string()), ("clip", encode_clip(clip))]
            }
        };
        fields.sort_by(|a, b| a.0.cmp(b.0));

        let mut out = String::from(self.name());
        for (k, v) in fields {
            out.push(' ');
            out.push_str(k);
            out.push('=');
            out.push_str(&v);
        }
        out
    }
}

impl fmt::Display for IntentCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

fn encode_params(params: &BTreeMap<String, ParamValue>) -> String {
    let body = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("{{{body}}}")
}

/// Every field of an inserted clip, keys sorted, free-form strings quoted.
fn encode_clip(clip: &Clip) -> String {
    let features = clip
        .features
        .iter()
        .map(|f| format!("{:?}{}", f.effect.as_str(), encode_params(&f.params)))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "{{asset={:?},duration={},features=[{features}],id={:?},name={:?},offset={},start={},transitionIn={},transitionOut={}}}",
        clip.asset.locator,
        clip.duration,
        clip.id.as_str(),
        clip.name,
        clip.offset,
        clip.start,
        encode_transition(clip.transition_in.as_ref()),
        encode_transition(clip.transition_out.as_ref()),
    )
}

fn encode_transition(tr: Option<&Transition>) -> String {
    match tr {
        None => "none".to_owned(),
        Some(tr) => format!(
            "{{duration={},ease={},kind={},params={}}}",
            tr.duration,
            tr.ease.name(),
            tr.kind.name(),
            encode_params(&tr.kind.params())
        ),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edit/command.rs"]
mod tests;
