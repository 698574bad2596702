use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{
    foundation::core::Rect,
    foundation::error::{MontageError, MontageResult},
    foundation::ids::ClipId,
};

/// Per-frame conditioning data supplied by an external analysis stage.
///
/// Rectangles are normalized to `[0, 1]` in both axes. Clips without an entry (or with an empty
/// list) leave their conditioned ports unbound.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameContext {
    /// Regions of interest per clip.
    #[serde(default)]
    pub regions: BTreeMap<ClipId, Vec<Rect>>,
}

impl FrameContext {
    /// Context with no regions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style region insert.
    pub fn with_regions(mut self, clip: impl Into<ClipId>, rects: Vec<Rect>) -> Self {
        self.regions.insert(clip.into(), rects);
        self
    }

    /// Non-empty region list for `clip`.
    pub fn regions_for(&self, clip: &ClipId) -> Option<&[Rect]> {
        self.regions
            .get(clip)
            .map(Vec::as_slice)
            .filter(|r| !r.is_empty())
    }

    /// Parse a frame context from JSON.
    pub fn from_json_str(s: &str) -> MontageResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| MontageError::serde(format!("parse frame context JSON: {e}")))
    }

    /// Parse a frame context from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> MontageResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            MontageError::validation(format!(
                "open frame context JSON '{}': {e}",
                path.display()
            ))
        })?;
        serde_json::from_reader(BufReader::new(f))
            .map_err(|e| MontageError::serde(format!("parse frame context JSON: {e}")))
    }
}
