use crate::{
    foundation::core::Time,
    foundation::error::{MontageError, MontageResult},
    foundation::ids::{AssetId, ClipId, TimelineId, TrackId},
    timeline::model::{
        AssetReference, Clip, FeatureApplication, Timeline, Track, TrackKind, Transition,
    },
};

/// Builder for [`Timeline`](crate::Timeline).
pub struct TimelineBuilder {
    id: TimelineId,
    tracks: Vec<Track>,
}

impl TimelineBuilder {
    /// Create a builder for a new timeline.
    pub fn new(id: impl Into<TimelineId>) -> Self {
        Self {
            id: id.into(),
            tracks: Vec::new(),
        }
    }

    /// Append a track.
    pub fn track(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }

    /// Build, validate and compute the cached duration.
    pub fn build(self) -> MontageResult<Timeline> {
        let mut tl = Timeline {
            id: self.id,
            tracks: self.tracks,
            duration: Time::ZERO,
        };
        tl.validate()?;
        for track in &mut tl.tracks {
            track.sort_clips();
        }
        tl.recompute_duration();
        Ok(tl)
    }
}

/// Builder for [`Track`](crate::Track) values.
pub struct TrackBuilder {
    id: TrackId,
    kind: TrackKind,
    clips: Vec<Clip>,
}

impl TrackBuilder {
    /// Builder for a video track.
    pub fn video(id: impl Into<TrackId>) -> Self {
        Self::new(id, TrackKind::Video)
    }

    /// Builder for an audio track.
    pub fn audio(id: impl Into<TrackId>) -> Self {
        Self::new(id, TrackKind::Audio)
    }

    /// Create a track builder of any kind.
    pub fn new(id: impl Into<TrackId>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
            clips: Vec::new(),
        }
    }

    /// Append clip to the track.
    pub fn clip(mut self, clip: Clip) -> Self {
        self.clips.push(clip);
        self
    }

    /// Build [`Track`](crate::Track).
    pub fn build(self) -> MontageResult<Track> {
        if self.id.as_str().trim().is_empty() {
            return Err(MontageError::validation("track id must be non-empty"));
        }
        Ok(Track {
            id: self.id,
            kind: self.kind,
            clips: self.clips,
        })
    }
}

/// Builder for [`Clip`](crate::Clip) values.
pub struct ClipBuilder {
    id: ClipId,
    name: Option<String>,
    asset: AssetReference,
    start: Time,
    duration: Time,
    offset: Time,
    features: Vec<FeatureApplication>,
    transition_in: Option<Transition>,
    transition_out: Option<Transition>,
}

impl ClipBuilder {
    /// Create a clip builder with identity, locator and placement in seconds.
    ///
    /// The asset id defaults to the locator string.
    pub fn new(
        id: impl Into<ClipId>,
        locator: impl Into<String>,
        start_secs: f64,
        duration_secs: f64,
    ) -> Self {
        let locator = locator.into();
        Self {
            id: id.into(),
            name: None,
            asset: AssetReference {
                id: AssetId::new(locator.clone()),
                locator,
            },
            start: Time(start_secs),
            duration: Time(duration_secs),
            offset: Time::ZERO,
            features: Vec::new(),
            transition_in: None,
            transition_out: None,
        }
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override the asset identity.
    pub fn asset_id(mut self, id: impl Into<AssetId>) -> Self {
        self.asset.id = id.into();
        self
    }

    /// Set trim-in into the source, in seconds.
    pub fn offset(mut self, secs: f64) -> Self {
        self.offset = Time(secs);
        self
    }

    /// Append (or replace) a feature.
    pub fn feature(mut self, feature: FeatureApplication) -> Self {
        match self.features.iter_mut().find(|f| f.effect == feature.effect) {
            Some(existing) => *existing = feature,
            None => self.features.push(feature),
        }
        self
    }

    /// Set the head transition.
    pub fn transition_in(mut self, tr: Transition) -> Self {
        self.transition_in = Some(tr);
        self
    }

    /// Set the tail transition.
    pub fn transition_out(mut self, tr: Transition) -> Self {
        self.transition_out = Some(tr);
        self
    }

    /// Build [`Clip`](crate::Clip); rejects empty ids and non-positive durations.
    pub fn build(self) -> MontageResult<Clip> {
        if self.id.as_str().trim().is_empty() {
            return Err(MontageError::validation("clip id must be non-empty"));
        }
        if self.asset.locator.trim().is_empty() {
            return Err(MontageError::validation("clip locator must be non-empty"));
        }
        if !self.duration.is_finite() || !self.duration.is_positive() {
            return Err(MontageError::validation(format!(
                "clip '{}' duration must be finite and > 0",
                self.id
            )));
        }
        Ok(Clip {
            name: self.name.unwrap_or_else(|| self.id.to_string()),
            id: self.id,
            asset: self.asset,
            start: self.start,
            duration: self.duration,
            offset: self.offset,
            transition_in: self.transition_in,
            transition_out: self.transition_out,
            features: self.features,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/dsl.rs"]
mod tests;
