use std::fmt;

use crate::{
    edit::command::IntentCommand,
    edit::ops,
    edit::trace::{EVENT_EDIT_BEGIN, EVENT_EDIT_END, EVENT_EDIT_OVERLAP, TraceEvent, TraceSink},
    timeline::model::Timeline,
};

/// Why a command left the timeline untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoOpReason {
    /// The [`crate::ClipTarget`] matched no clip on a video track.
    TargetNotFound,
    /// The destination track of an insert does not exist.
    TrackNotFound,
    /// The edit would leave a clip with zero or negative duration.
    NonPositiveDuration,
    /// A blade point is not strictly inside the clip span.
    SplitOutsideClip,
    /// A non-finite or out-of-range argument (negative offset, retime factor <= 0).
    InvalidArgument,
    /// The edit would introduce a clip id that is already in use.
    DuplicateClipId,
    /// The edit would not change anything.
    Unchanged,
}

impl NoOpReason {
    /// Snake-case reason used in trace `outcome` fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TargetNotFound => "target_not_found",
            Self::TrackNotFound => "track_not_found",
            Self::NonPositiveDuration => "non_positive_duration",
            Self::SplitOutsideClip => "split_outside_clip",
            Self::InvalidArgument => "invalid_argument",
            Self::DuplicateClipId => "duplicate_clip_id",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Result of [`apply_command`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditOutcome {
    /// The timeline was replaced by the edited copy.
    Applied,
    /// The timeline is unchanged.
    NoOp(NoOpReason),
}

impl EditOutcome {
    /// `true` when the edit changed the timeline.
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

impl fmt::Display for EditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => f.write_str("applied"),
            Self::NoOp(reason) => write!(f, "noop:{}", reason.as_str()),
        }
    }
}

/// Apply one command to `timeline`, reporting through `sink`.
///
/// The command runs against a clone; the clone replaces `timeline` only when the command applies,
/// so a rejected command never leaves a partial edit behind. Every call emits `edit.begin`, then
/// any `edit.overlap` events, then `edit.end`.
#[tracing::instrument(skip_all, fields(command = command.name()))]
pub fn apply_command(
    timeline: &mut Timeline,
    command: &IntentCommand,
    sink: &dyn TraceSink,
) -> EditOutcome {
    let encoded = command.canonical();
    sink.emit(TraceEvent::new(EVENT_EDIT_BEGIN).field("command", &encoded));

    let mut draft = timeline.clone();
    let outcome = match ops::run(&mut draft, command) {
        Ok(overlaps) => {
            draft.recompute_duration();
            for o in &overlaps {
                sink.emit(
                    TraceEvent::new(EVENT_EDIT_OVERLAP)
                        .field("track", &o.track)
                        .field("clip", &o.clip)
                        .field("other", &o.other)
                        .field("overlap", o.amount),
                );
            }
            *timeline = draft;
            EditOutcome::Applied
        }
        Err(reason) => {
            tracing::debug!(reason = reason.as_str(), "edit left timeline unchanged");
            EditOutcome::NoOp(reason)
        }
    };

    sink.emit(
        TraceEvent::new(EVENT_EDIT_END)
            .field("command", encoded)
            .field("outcome", outcome),
    );
    outcome
}

#[cfg(test)]
#[path = "../../tests/unit/edit/apply.rs"]
mod tests;
