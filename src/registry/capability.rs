use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{
    foundation::error::{MontageError, MontageResult},
    foundation::ids::EffectId,
    registry::manifest::Manifest,
};

/// Resolves effect ids to manifests during compilation.
///
/// Implementations are shared by parallel compiles and must be `Send + Sync`.
pub trait CapabilityRegistry: Send + Sync {
    /// Manifest for `id`, or `None` when the effect is unknown.
    fn lookup(&self, id: &EffectId) -> Option<&Manifest>;
}

/// In-memory registry keyed by effect id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ManifestRegistry {
    manifests: BTreeMap<EffectId, Manifest>,
}

impl ManifestRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add a manifest, replacing any previous one with the same id.
    pub fn register(&mut self, manifest: Manifest) -> MontageResult<()> {
        manifest.validate()?;
        if self.manifests.contains_key(&manifest.effect) {
            tracing::debug!(effect = %manifest.effect, "replacing registered manifest");
        }
        self.manifests.insert(manifest.effect.clone(), manifest);
        Ok(())
    }

    /// Builder-style [`ManifestRegistry::register`].
    pub fn with(mut self, manifest: Manifest) -> MontageResult<Self> {
        self.register(manifest)?;
        Ok(self)
    }

    /// Number of registered manifests.
    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    /// Registered ids in sorted order.
    pub fn effect_ids(&self) -> impl Iterator<Item = &EffectId> {
        self.manifests.keys()
    }

    /// Parse a JSON array of manifests and register each one.
    pub fn from_json_str(s: &str) -> MontageResult<Self> {
        let manifests: Vec<Manifest> = serde_json::from_str(s)
            .map_err(|e| MontageError::serde(format!("parse manifest JSON: {e}")))?;
        Self::from_manifests(manifests)
    }

    /// Read a JSON array of manifests from disk.
    pub fn from_path(path: impl AsRef<Path>) -> MontageResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            MontageError::validation(format!("open manifest JSON '{}': {e}", path.display()))
        })?;
        let manifests: Vec<Manifest> = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| MontageError::serde(format!("parse manifest JSON: {e}")))?;
        Self::from_manifests(manifests)
    }

    /// Insert without validation; for manifests whose validity is covered by tests.
    pub(crate) fn insert_trusted(&mut self, manifest: Manifest) {
        self.manifests.insert(manifest.effect.clone(), manifest);
    }

    fn from_manifests(manifests: Vec<Manifest>) -> MontageResult<Self> {
        let mut reg = Self::new();
        for m in manifests {
            reg.register(m)?;
        }
        Ok(reg)
    }
}

impl CapabilityRegistry for ManifestRegistry {
    fn lookup(&self, id: &EffectId) -> Option<&Manifest> {
        self.manifests.get(id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/registry/capability.rs"]
mod tests;
