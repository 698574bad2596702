use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{
    foundation::core::Resolution,
    foundation::error::{MontageError, MontageResult},
    foundation::ids::ShaderId,
};

/// Compiler settings.
///
/// Every field has a default, so a JSON config only needs the fields it changes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Full-quality output size; lower quality tiers scale it down.
    pub base_resolution: Resolution,
    /// Working color space name passed to every ingestion node.
    pub working_color_space: String,
    /// Ingestion (IDT) shader inserted after every source.
    pub ingest_shader: ShaderId,
    /// Shader that decodes recorded media.
    pub decode_shader: ShaderId,
    /// Final compositing shader.
    pub final_shader: ShaderId,
    /// Worker threads for [`crate::TimelineCompiler::compile_many`]; `None` uses rayon's default.
    pub threads: Option<usize>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            base_resolution: Resolution {
                width: 1920,
                height: 1080,
            },
            working_color_space: "acescg".to_owned(),
            ingest_shader: ShaderId::new("cs.idt"),
            decode_shader: ShaderId::new("src.decode"),
            final_shader: ShaderId::new("cmp.stack"),
            threads: None,
        }
    }
}

impl CompilerConfig {
    /// Reject empty shader names, an empty color space, a zero resolution and zero threads.
    pub fn validate(&self) -> MontageResult<()> {
        Resolution::new(self.base_resolution.width, self.base_resolution.height)?;
        if self.working_color_space.trim().is_empty() {
            return Err(MontageError::validation(
                "config 'working_color_space' must be non-empty",
            ));
        }
        for (name, shader) in [
            ("ingest_shader", &self.ingest_shader),
            ("decode_shader", &self.decode_shader),
            ("final_shader", &self.final_shader),
        ] {
            if shader.as_str().trim().is_empty() {
                return Err(MontageError::validation(format!(
                    "config '{name}' must be non-empty"
                )));
            }
        }
        if self.threads == Some(0) {
            return Err(MontageError::validation(
                "config 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }

    /// Parse and validate a config from JSON.
    pub fn from_json_str(s: &str) -> MontageResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| MontageError::serde(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a config file.
    pub fn from_path(path: impl AsRef<Path>) -> MontageResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            MontageError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| MontageError::serde(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
