use std::collections::BTreeMap;
use std::str::FromStr;

use crate::{
    animation::ease::Ease,
    foundation::core::{Rgba8Premul, Time},
    foundation::error::{MontageError, MontageResult},
    foundation::ids::ShaderId,
    timeline::model::ParamValue,
};

/// Input port of a transition compositor carrying the outgoing clip.
pub const TRANSITION_FROM_PORT: &str = "from";
/// Input port of a transition compositor carrying the incoming clip.
pub const TRANSITION_TO_PORT: &str = "to";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Direction of a wipe transition.
pub enum WipeDir {
    /// Reveal from the left edge.
    LeftToRight,
    /// Reveal from the right edge.
    RightToLeft,
    /// Reveal from the top edge.
    TopToBottom,
    /// Reveal from the bottom edge.
    BottomToTop,
}

impl WipeDir {
    /// Value of the `dir` compositor parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeftToRight => "left_to_right",
            Self::RightToLeft => "right_to_left",
            Self::TopToBottom => "top_to_bottom",
            Self::BottomToTop => "bottom_to_top",
        }
    }
}

impl FromStr for WipeDir {
    type Err = MontageError;

    fn from_str(s: &str) -> MontageResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left_to_right" | "lefttoright" | "ltr" => Ok(Self::LeftToRight),
            "right_to_left" | "righttoleft" | "rtl" => Ok(Self::RightToLeft),
            "top_to_bottom" | "toptobottom" | "ttb" => Ok(Self::TopToBottom),
            "bottom_to_top" | "bottomtotop" | "btt" => Ok(Self::BottomToTop),
            other => Err(MontageError::validation(format!(
                "unknown wipe direction '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Compositing style of a transition.
pub enum TransitionKind {
    /// Hard switch at the midpoint of the window.
    Cut,
    /// Linear mix between outgoing and incoming.
    Crossfade,
    /// Fade through a solid color.
    DipToColor {
        /// Color reached at progress 0.5.
        color: Rgba8Premul,
    },
    /// Directional reveal of the incoming clip.
    Wipe {
        /// Reveal direction.
        dir: WipeDir,
    },
}

impl TransitionKind {
    /// Snake-case kind name; also the shader suffix.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cut => "cut",
            Self::Crossfade => "crossfade",
            Self::DipToColor { .. } => "dip_to_color",
            Self::Wipe { .. } => "wipe",
        }
    }

    /// Compositor kernel selected by this transition's type.
    pub fn shader(&self) -> ShaderId {
        ShaderId::new(format!("tx.{}", self.name()))
    }

    /// Kind-specific compositor parameters (progress is added by the compiler).
    pub fn params(&self) -> BTreeMap<String, ParamValue> {
        let mut out = BTreeMap::new();
        match self {
            Self::Cut | Self::Crossfade => {}
            Self::DipToColor { color } => {
                out.insert("color".to_owned(), ParamValue::Color(*color));
            }
            Self::Wipe { dir } => {
                out.insert("dir".to_owned(), ParamValue::Str(dir.as_str().to_owned()));
            }
        }
        out
    }
}

/// Eased progress of `at` inside a window `[window_start, window_start + duration)`.
///
/// Raw progress is clamped to `[0, 1]` and then passed through `ease`; a non-positive duration
/// yields 1.0.
pub fn transition_progress(at: Time, window_start: Time, duration: Time, ease: Ease) -> f64 {
    if !duration.is_positive() {
        return 1.0;
    }
    let raw = ((at - window_start).secs() / duration.secs()).clamp(0.0, 1.0);
    ease.apply(raw)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/transitions.rs"]
mod tests;
