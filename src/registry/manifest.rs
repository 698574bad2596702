use std::collections::BTreeSet;

use crate::{
    compile::scheduler::PassScheduler,
    foundation::error::{MontageError, MontageResult},
    foundation::ids::{EffectId, ShaderId},
    timeline::model::ParamValue,
};

/// Output name used when a pass does not declare any.
pub const DEFAULT_OUTPUT: &str = "out";

/// Port name conventionally used for the primary image input.
pub const DEFAULT_PRIMARY_PORT: &str = "src";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Declarative description of one effect: its ports, parameters and pass wiring.
pub struct Manifest {
    /// Capability id referenced by [`crate::FeatureApplication::effect`].
    pub effect: EffectId,
    /// Single-pass kernel used when no pass wiring is declared.
    pub kernel: ShaderId,
    /// Port that receives the upstream image.
    #[serde(default = "default_primary_port")]
    pub primary_port: String,
    /// Pixel effects emit nodes; temporal effects are interpreted during source resolution.
    #[serde(default)]
    pub stage: EffectStage,
    /// Declared input ports.
    #[serde(default)]
    pub ports: Vec<PortDecl>,
    /// Declared parameters with defaults.
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    /// Pass wiring. Empty for legacy single-kernel effects.
    #[serde(default)]
    pub passes: Vec<PassDecl>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// When an effect is interpreted.
pub enum EffectStage {
    /// Emits render nodes.
    #[default]
    Pixel,
    /// Changes which source frame is sampled; emits no nodes.
    Temporal,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A named effect input.
pub struct PortDecl {
    /// Port name, unique within the manifest.
    pub name: String,
    /// How the port is fed.
    #[serde(default)]
    pub role: PortRole,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// How a port receives its input.
pub enum PortRole {
    /// The upstream image of the clip.
    #[default]
    Primary,
    /// An extra image supplied by the caller; skipped when unbound.
    Auxiliary,
    /// Produced by a generator from frame-context geometry; skipped when no geometry exists.
    Conditioned {
        /// Shader of the generator node that produces this port's input.
        generator: ShaderId,
    },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A named parameter and its default value.
pub struct ParamDecl {
    /// Parameter name.
    pub name: String,
    /// Value used when the feature does not set it.
    pub default: ParamValue,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One pass of a multi-pass effect.
pub struct PassDecl {
    /// Pass name, unique within the manifest.
    pub name: String,
    /// Kernel executed by this pass.
    pub kernel: ShaderId,
    /// Inputs in slot order. The first bound input is the primary input.
    pub inputs: Vec<PassInput>,
    /// Named outputs. The first one is the default output.
    #[serde(default = "default_outputs")]
    pub outputs: Vec<String>,
    /// Parameter names this pass receives; empty means all.
    #[serde(default)]
    pub params: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A named pass input and where it comes from.
pub struct PassInput {
    /// Kernel-facing input name.
    pub port: String,
    /// Data source.
    pub from: PassSource,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Source of a pass input.
pub enum PassSource {
    /// An effect-level port.
    Effect(String),
    /// An output of another pass.
    Pass {
        /// Producing pass name.
        pass: String,
        /// Output name on the producing pass.
        #[serde(default = "default_output")]
        output: String,
    },
}

fn default_primary_port() -> String {
    DEFAULT_PRIMARY_PORT.to_owned()
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_owned()
}

fn default_outputs() -> Vec<String> {
    vec![default_output()]
}

impl PassDecl {
    /// The output other passes get when they do not name one.
    pub fn default_output(&self) -> &str {
        self.outputs
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_OUTPUT)
    }
}

impl Manifest {
    /// Single-kernel manifest with only a primary port.
    pub fn single_pass(effect: impl Into<EffectId>, kernel: impl Into<ShaderId>) -> Self {
        Self {
            effect: effect.into(),
            kernel: kernel.into(),
            primary_port: default_primary_port(),
            stage: EffectStage::Pixel,
            ports: vec![PortDecl {
                name: default_primary_port(),
                role: PortRole::Primary,
            }],
            params: Vec::new(),
            passes: Vec::new(),
        }
    }

    /// Declared port by name.
    pub fn port(&self, name: &str) -> Option<&PortDecl> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Declared pass by name.
    pub fn pass(&self, name: &str) -> Option<&PassDecl> {
        self.passes.iter().find(|p| p.name == name)
    }

    /// `true` when the manifest compiles to one node: no passes, or one pass fed only by
    /// effect ports.
    pub fn is_legacy(&self) -> bool {
        match self.passes.as_slice() {
            [] => true,
            [only] => only
                .inputs
                .iter()
                .all(|i| matches!(i.from, PassSource::Effect(_))),
            _ => false,
        }
    }

    /// Check ids, port declarations and pass wiring (including cycles).
    pub fn validate(&self) -> MontageResult<()> {
        if self.effect.as_str().trim().is_empty() {
            return Err(MontageError::manifest("effect id must be non-empty"));
        }
        let ctx = self.effect.as_str();
        if self.kernel.as_str().trim().is_empty() {
            return Err(MontageError::manifest(format!("{ctx}: kernel must be non-empty")));
        }

        let mut port_names = BTreeSet::new();
        for port in &self.ports {
            if !port_names.insert(port.name.as_str()) {
                return Err(MontageError::manifest(format!(
                    "{ctx}: duplicate port '{}'",
                    port.name
                )));
            }
            if let PortRole::Conditioned { generator } = &port.role
                && generator.as_str().trim().is_empty()
            {
                return Err(MontageError::manifest(format!(
                    "{ctx}: conditioned port '{}' needs a generator",
                    port.name
                )));
            }
        }
        match self.port(&self.primary_port) {
            Some(PortDecl {
                role: PortRole::Primary,
                ..
            }) => {}
            Some(_) => {
                return Err(MontageError::manifest(format!(
                    "{ctx}: primary port '{}' must have role 'primary'",
                    self.primary_port
                )));
            }
            None => {
                return Err(MontageError::manifest(format!(
                    "{ctx}: primary port '{}' is not declared",
                    self.primary_port
                )));
            }
        }

        let mut param_names = BTreeSet::new();
        for p in &self.params {
            if !param_names.insert(p.name.as_str()) {
                return Err(MontageError::manifest(format!(
                    "{ctx}: duplicate param '{}'",
                    p.name
                )));
            }
        }

        for pass in &self.passes {
            if pass.kernel.as_str().trim().is_empty() {
                return Err(MontageError::manifest(format!(
                    "{ctx}: pass '{}' kernel must be non-empty",
                    pass.name
                )));
            }
            if pass.inputs.is_empty() {
                return Err(MontageError::manifest(format!(
                    "{ctx}: pass '{}' declares no inputs",
                    pass.name
                )));
            }
            if pass.outputs.is_empty() {
                return Err(MontageError::manifest(format!(
                    "{ctx}: pass '{}' declares no outputs",
                    pass.name
                )));
            }
            for input in &pass.inputs {
                if let PassSource::Effect(port) = &input.from
                    && !port_names.contains(port.as_str())
                {
                    return Err(MontageError::manifest(format!(
                        "{ctx}: pass '{}' reads undeclared port '{port}'",
                        pass.name
                    )));
                }
            }
        }

        // Pass references, output names, duplicate names and cycles.
        PassScheduler::new(self).map(|_| ())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/registry/manifest.rs"]
mod tests;
