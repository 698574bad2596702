use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{
    animation::ease::Ease,
    effects::transitions::TransitionKind,
    foundation::core::{Rect, Rgba8Premul, Time},
    foundation::error::{MontageError, MontageResult},
    foundation::ids::{AssetId, ClipId, EffectId, TimelineId, TrackId},
};

/// Effect id of the color grade written by [`crate::IntentCommand::ApplyColorGrade`].
pub const COLOR_GRADE_EFFECT_ID: &str = "mv.color_grade";

/// Effect id of the time remap written by [`crate::IntentCommand::RetimeClip`].
pub const RETIME_EFFECT_ID: &str = "mv.retime";

/// Locator scheme that marks a procedural generator source.
pub const GENERATOR_SCHEME: &str = "gen://";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// The editable document: an ordered list of tracks plus a cached duration.
///
/// A timeline is a plain value. It holds no references into itself and every edit is performed
/// on a copy that is written back as a whole (see [`crate::apply_command`]).
pub struct Timeline {
    /// Timeline identity.
    pub id: TimelineId,
    /// Tracks in compositing order (first track is the bottom layer).
    pub tracks: Vec<Track>,
    /// Cached maximum clip end time. Derived; refreshed by [`Timeline::recompute_duration`].
    #[serde(default)]
    pub duration: Time,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Media kind carried by a track.
pub enum TrackKind {
    /// Picture track; the only kind that contributes to compiled graphs.
    Video,
    /// Sound track; may hold clips linked to video clips.
    Audio,
    /// Auxiliary data (subtitles, markers). Never rippled specially.
    Data,
}

impl TrackKind {
    /// Serialized kind name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Data => "data",
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A track owns clips. Storage order is not guaranteed to be sorted by start time.
pub struct Track {
    /// Track identity.
    pub id: TrackId,
    /// Media kind.
    pub kind: TrackKind,
    /// Clips on this track.
    #[serde(default)]
    pub clips: Vec<Clip>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Media reference: stable identity plus a source locator.
pub struct AssetReference {
    /// Asset identity.
    pub id: AssetId,
    /// Source locator. `gen://` marks a procedural generator, anything else is recorded media.
    pub locator: String,
}

#[derive(Clone, Debug, PartialEq)]
/// How an [`AssetReference`] is resolved into pixels.
pub enum SourceKind {
    /// Procedural generator, e.g. `gen://noise?scale=2`.
    Procedural {
        /// Generator name (the locator path after the scheme).
        generator: String,
        /// Query parameters, parsed into typed values.
        params: BTreeMap<String, ParamValue>,
    },
    /// Decoded recorded media.
    Recorded,
}

impl AssetReference {
    /// Build a reference from an id and locator.
    pub fn new(id: impl Into<AssetId>, locator: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            locator: locator.into(),
        }
    }

    /// Classify the locator by scheme prefix.
    pub fn source(&self) -> SourceKind {
        let Some(rest) = self.locator.strip_prefix(GENERATOR_SCHEME) else {
            return SourceKind::Recorded;
        };
        let (generator, query) = match rest.split_once('?') {
            Some((g, q)) => (g, q),
            None => (rest, ""),
        };
        let mut params = BTreeMap::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((k, v)) => {
                    params.insert(k.to_owned(), ParamValue::parse_scalar(v));
                }
                None => {
                    params.insert(pair.to_owned(), ParamValue::Bool(true));
                }
            }
        }
        SourceKind::Procedural {
            generator: generator.to_owned(),
            params,
        }
    }

    /// `true` for `gen://` locators.
    pub fn is_procedural(&self) -> bool {
        self.locator.starts_with(GENERATOR_SCHEME)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A clip places a span of an asset on a track.
pub struct Clip {
    /// Stable identity.
    pub id: ClipId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Referenced media.
    pub asset: AssetReference,
    /// Timeline placement start.
    pub start: Time,
    /// Timeline placement length.
    pub duration: Time,
    /// Trim-in into the source.
    #[serde(default)]
    pub offset: Time,
    /// Transition at the clip head.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_in: Option<Transition>,
    /// Transition at the clip tail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_out: Option<Transition>,
    /// Clip-level effects, applied in list order.
    #[serde(default)]
    pub features: Vec<FeatureApplication>,
}

impl Clip {
    /// Exclusive end of the clip span.
    pub fn end(&self) -> Time {
        self.start + self.duration
    }

    /// `true` when `t` is inside `[start, end)`.
    pub fn contains(&self, t: Time) -> bool {
        self.start <= t && t < self.end()
    }

    /// Symmetric half-open interval overlap test.
    pub fn overlaps(&self, other: &Clip) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// Signed overlap length; zero or negative when the spans are disjoint.
    pub fn overlap_with(&self, other: &Clip) -> Time {
        self.end().min(other.end()) - self.start.max(other.start)
    }

    /// Replace the feature with the same effect id in place, or append it.
    pub fn upsert_feature(&mut self, feature: FeatureApplication) {
        match self
            .features
            .iter_mut()
            .find(|f| f.effect == feature.effect)
        {
            Some(existing) => *existing = feature,
            None => self.features.push(feature),
        }
    }

    /// Feature applying `effect`, if any.
    pub fn feature(&self, effect: &str) -> Option<&FeatureApplication> {
        self.features.iter().find(|f| f.effect.as_str() == effect)
    }

    /// Combined time-remap factor of all retime features (1.0 when none).
    pub fn retime_factor(&self) -> f64 {
        self.features
            .iter()
            .filter(|f| f.effect.as_str() == RETIME_EFFECT_ID)
            .filter_map(|f| f.params.get("factor").and_then(ParamValue::as_f64))
            .filter(|v| v.is_finite() && *v > 0.0)
            .product()
    }

    /// Source seconds advanced per timeline second.
    ///
    /// Retime only applies to procedural sources; recorded media always plays at 1.0.
    pub fn source_rate(&self) -> f64 {
        if self.asset.is_procedural() {
            self.retime_factor()
        } else {
            1.0
        }
    }

    /// Effective source time shown at timeline time `t`.
    pub fn source_time_at(&self, t: Time) -> Time {
        self.offset + (t - self.start).scale(self.source_rate())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A transition attached to one edge of a clip.
pub struct Transition {
    /// Compositing style.
    pub kind: TransitionKind,
    /// Window length.
    pub duration: Time,
    /// Curve applied to progress before compositing.
    #[serde(default)]
    pub ease: Ease,
}

impl Transition {
    /// Linear crossfade of `secs` seconds.
    pub fn crossfade(secs: f64) -> Self {
        Self {
            kind: TransitionKind::Crossfade,
            duration: Time(secs),
            ease: Ease::Linear,
        }
    }

    /// Replace the progress curve.
    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// An authored effect on a clip. Identity is `effect`.
pub struct FeatureApplication {
    /// Capability id resolved through the registry at compile time.
    pub effect: EffectId,
    /// Parameters, kept in sorted key order.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl FeatureApplication {
    /// Feature with no parameters.
    pub fn new(effect: impl Into<EffectId>) -> Self {
        Self {
            effect: effect.into(),
            params: BTreeMap::new(),
        }
    }

    /// Builder-style parameter insert.
    pub fn with_param(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.params.insert(name.into(), value);
        self
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
/// Typed parameter value carried by features and render nodes.
pub enum ParamValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer.
    I64(i64),
    /// Real number.
    F64(f64),
    /// Free-form string (region names, directions, asset ids).
    Str(String),
    /// Premultiplied color.
    Color(Rgba8Premul),
    /// Normalized rectangles (conditioning geometry).
    Rects(Vec<Rect>),
}

impl ParamValue {
    /// Numeric view of `F64` and `I64` values.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F64(v) => Some(v),
            Self::I64(v) => Some(v as f64),
            _ => None,
        }
    }

    /// String payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn parse_scalar(raw: &str) -> Self {
        if let Ok(v) = raw.parse::<i64>() {
            return Self::I64(v);
        }
        if let Ok(v) = raw.parse::<f64>() {
            return Self::F64(v);
        }
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => Self::Str(raw.to_owned()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::Color(c) => write!(f, "rgba({},{},{},{})", c.r, c.g, c.b, c.a),
            Self::Rects(rects) => {
                f.write_str("[")?;
                for (i, r) in rects.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    write!(f, "{},{},{},{}", r.x0, r.y0, r.x1, r.y1)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl Track {
    /// Empty track.
    pub fn new(id: impl Into<TrackId>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
            clips: Vec::new(),
        }
    }

    /// Stable sort by start time; clips with equal starts keep their storage order.
    pub fn sort_clips(&mut self) {
        self.clips.sort_by(|a, b| a.start.cmp(&b.start));
    }

    /// Storage index of the clip with `id`.
    pub fn position(&self, id: &ClipId) -> Option<usize> {
        self.clips.iter().position(|c| &c.id == id)
    }
}

impl Timeline {
    /// Empty timeline.
    pub fn new(id: impl Into<TimelineId>) -> Self {
        Self {
            id: id.into(),
            tracks: Vec::new(),
            duration: Time::ZERO,
        }
    }

    /// Refresh the cached duration from the current clip placement.
    pub fn recompute_duration(&mut self) {
        self.duration = self
            .tracks
            .iter()
            .flat_map(|t| t.clips.iter())
            .map(Clip::end)
            .max()
            .unwrap_or(Time::ZERO)
            .clamp_non_negative();
    }

    /// `(track_index, clip_index)` of a clip on any track.
    pub fn find_clip(&self, id: &ClipId) -> Option<(usize, usize)> {
        self.tracks
            .iter()
            .enumerate()
            .find_map(|(ti, t)| t.position(id).map(|ci| (ti, ci)))
    }

    /// Borrow a clip by id on any track.
    pub fn clip(&self, id: &ClipId) -> Option<&Clip> {
        let (ti, ci) = self.find_clip(id)?;
        Some(&self.tracks[ti].clips[ci])
    }

    /// Index of the track with `id`.
    pub fn track_index(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    /// Validate structural invariants that edits rely on.
    pub fn validate(&self) -> MontageResult<()> {
        let mut track_ids = BTreeSet::new();
        let mut clip_ids = BTreeSet::new();
        for track in &self.tracks {
            if track.id.as_str().trim().is_empty() {
                return Err(MontageError::validation("track id must be non-empty"));
            }
            if !track_ids.insert(&track.id) {
                return Err(MontageError::validation(format!(
                    "duplicate track id '{}'",
                    track.id
                )));
            }
            for clip in &track.clips {
                if !clip_ids.insert(&clip.id) {
                    return Err(MontageError::validation(format!(
                        "duplicate clip id '{}'",
                        clip.id
                    )));
                }
                validate_clip(clip)?;
            }
        }
        Ok(())
    }

    /// Parse a timeline from JSON.
    pub fn from_json_str(s: &str) -> MontageResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| MontageError::serde(format!("parse timeline JSON: {e}")))
    }

    /// Parse a timeline from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> MontageResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            MontageError::validation(format!("open timeline JSON '{}': {e}", path.display()))
        })?;
        serde_json::from_reader(BufReader::new(f))
            .map_err(|e| MontageError::serde(format!("parse timeline JSON: {e}")))
    }
}

fn validate_clip(clip: &Clip) -> MontageResult<()> {
    for (name, value) in [
        ("start", clip.start),
        ("duration", clip.duration),
        ("offset", clip.offset),
    ] {
        if !value.is_finite() {
            return Err(MontageError::validation(format!(
                "clip '{}' {name} must be finite",
                clip.id
            )));
        }
    }
    if clip.start < Time::ZERO || clip.offset < Time::ZERO {
        return Err(MontageError::validation(format!(
            "clip '{}' start/offset must be >= 0",
            clip.id
        )));
    }
    if !clip.duration.is_positive() {
        return Err(MontageError::validation(format!(
            "clip '{}' duration must be > 0",
            clip.id
        )));
    }
    if let SourceKind::Procedural { generator, .. } = clip.asset.source()
        && generator.trim().is_empty()
    {
        return Err(MontageError::validation(format!(
            "clip '{}' generator locator has no generator name",
            clip.id
        )));
    }
    for tr in clip.transition_in.iter().chain(clip.transition_out.iter()) {
        if !tr.duration.is_finite() || !tr.duration.is_positive() {
            return Err(MontageError::validation(format!(
                "clip '{}' transition duration must be finite and > 0",
                clip.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/model.rs"]
mod tests;
