use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use smallvec::SmallVec;

use crate::{
    compile::fingerprint::{GraphFingerprint, fingerprint_graph},
    foundation::core::{Quality, Resolution, Time},
    foundation::error::{MontageError, MontageResult},
    foundation::ids::ShaderId,
    registry::manifest::DEFAULT_OUTPUT,
    timeline::model::ParamValue,
};

/// Index of a node inside its [`RenderGraph`]. Ids are assigned sequentially.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Reference to one named output of a node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OutputRef {
    /// Producing node.
    pub node: NodeId,
    /// Output name on that node.
    pub output: String,
}

impl OutputRef {
    /// Default output of `node`.
    pub fn of(node: NodeId) -> Self {
        Self {
            node,
            output: DEFAULT_OUTPUT.to_owned(),
        }
    }
}

/// A node input: which port, at which slot, reads which upstream output.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InputBinding {
    /// Kernel-facing input name.
    pub port: String,
    /// Positional slot. Slot 0 is the primary input.
    pub slot: u32,
    /// Upstream node.
    pub node: NodeId,
    /// Upstream output name.
    pub output: String,
}

/// One shader invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderNode {
    /// Node id, equal to its index in [`RenderGraph::nodes`].
    pub id: NodeId,
    /// Shader to run.
    pub shader: ShaderId,
    /// Uniform parameters in key order.
    pub parameters: BTreeMap<String, ParamValue>,
    /// Inputs in slot order.
    pub inputs: SmallVec<[InputBinding; 4]>,
}

impl RenderNode {
    /// Input bound at `slot`.
    pub fn input_at(&self, slot: u32) -> Option<&InputBinding> {
        self.inputs.iter().find(|i| i.slot == slot)
    }

    /// Binding for the named port.
    pub fn input(&self, port: &str) -> Option<&InputBinding> {
        self.inputs.iter().find(|i| i.port == port)
    }

    /// Parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }
}

/// Acyclic shader graph for one frame. Nodes are stored in a valid execution order.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderGraph {
    /// Nodes in creation order; every input refers to an earlier node.
    pub nodes: Vec<RenderNode>,
    /// Node whose default output is the frame.
    pub output: NodeId,
}

impl RenderGraph {
    /// Node by id; ids index `nodes` directly.
    pub fn node(&self, id: NodeId) -> Option<&RenderNode> {
        self.nodes.get(id.0 as usize)
    }

    /// Nodes running `shader`, in id order.
    pub fn nodes_with_shader<'a>(
        &'a self,
        shader: &'a str,
    ) -> impl Iterator<Item = &'a RenderNode> + 'a {
        self.nodes.iter().filter(move |n| n.shader.as_str() == shader)
    }

    /// Stable 128-bit digest of the graph structure and parameters.
    pub fn fingerprint(&self) -> GraphFingerprint {
        fingerprint_graph(self)
    }

    /// Deterministic text form used by golden tests and the CLI.
    pub fn dump(&self) -> String {
        let mut s = String::new();
        s.push_str("RenderGraph\n");
        let _ = writeln!(s, "nodes: {}", self.nodes.len());
        for node in &self.nodes {
            let _ = write!(s, "  {}: {}", node.id, node.shader);
            if !node.inputs.is_empty() {
                s.push_str(" inputs=[");
                for (i, b) in node.inputs.iter().enumerate() {
                    if i > 0 {
                        s.push_str(", ");
                    }
                    let _ = write!(s, "{}@{}<-{}.{}", b.port, b.slot, b.node, b.output);
                }
                s.push(']');
            }
            if !node.parameters.is_empty() {
                s.push_str(" params={");
                for (i, (k, v)) in node.parameters.iter().enumerate() {
                    if i > 0 {
                        s.push_str(", ");
                    }
                    let _ = write!(s, "{k}={v}");
                }
                s.push('}');
            }
            s.push('\n');
        }
        let _ = writeln!(s, "output: {}", self.output);
        s
    }
}

/// Compiled frame: the graph plus how to render it.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRequest {
    /// Shader graph.
    pub graph: RenderGraph,
    /// Output size after applying the quality tier.
    pub resolution: Resolution,
    /// Requested quality tier.
    pub quality: Quality,
    /// Timeline time the graph was compiled for.
    pub playhead: Time,
}

/// Append-only graph construction with sequential ids.
#[derive(Debug, Default)]
pub(crate) struct GraphBuilder {
    nodes: Vec<RenderNode>,
}

impl GraphBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a node. Every input must reference a node that already exists.
    pub(crate) fn push(
        &mut self,
        shader: ShaderId,
        parameters: BTreeMap<String, ParamValue>,
        inputs: SmallVec<[InputBinding; 4]>,
    ) -> MontageResult<NodeId> {
        let id = NodeId(
            u32::try_from(self.nodes.len())
                .map_err(|_| MontageError::compile("render graph node count exceeds u32"))?,
        );
        if let Some(bad) = inputs.iter().find(|b| b.node >= id) {
            return Err(MontageError::compile(format!(
                "node {id} ({shader}) reads from {} which does not precede it",
                bad.node
            )));
        }
        self.nodes.push(RenderNode {
            id,
            shader,
            parameters,
            inputs,
        });
        Ok(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn finish(self, output: NodeId) -> MontageResult<RenderGraph> {
        if output.0 as usize >= self.nodes.len() {
            return Err(MontageError::compile(format!(
                "graph output {output} does not exist"
            )));
        }
        Ok(RenderGraph {
            nodes: self.nodes,
            output,
        })
    }
}

/// Build an input binding from an output reference.
pub(crate) fn bind(port: &str, slot: u32, from: &OutputRef) -> InputBinding {
    InputBinding {
        port: port.to_owned(),
        slot,
        node: from.node,
        output: from.output.clone(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/graph.rs"]
mod tests;
