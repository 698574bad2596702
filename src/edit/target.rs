use std::fmt;

use crate::{
    foundation::ids::ClipId,
    timeline::model::{Timeline, TrackKind},
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Which clip a command operates on. Only video tracks are searched.
pub enum ClipTarget {
    /// Earliest clip on the first video track.
    FirstVideoClip,
    /// Explicit clip identity.
    Id(ClipId),
}

impl ClipTarget {
    /// Target the clip with this id.
    pub fn id(id: impl Into<ClipId>) -> Self {
        Self::Id(id.into())
    }

    /// Resolve to `(track_index, clip_index)`, or `None` when nothing matches.
    pub fn resolve(&self, timeline: &Timeline) -> Option<(usize, usize)> {
        let mut video = timeline
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == TrackKind::Video);
        match self {
            Self::FirstVideoClip => {
                let (ti, track) = video.next()?;
                let ci = track
                    .clips
                    .iter()
                    .enumerate()
                    .min_by(|(ia, a), (ib, b)| a.start.cmp(&b.start).then(ia.cmp(ib)))
                    .map(|(ci, _)| ci)?;
                Some((ti, ci))
            }
            Self::Id(id) => video.find_map(|(ti, t)| t.position(id).map(|ci| (ti, ci))),
        }
    }
}

impl fmt::Display for ClipTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstVideoClip => f.write_str("first_video_clip"),
            Self::Id(id) => write!(f, "id:{id}"),
        }
    }
}
