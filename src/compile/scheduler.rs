use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use smallvec::SmallVec;

use crate::{
    compile::graph::{GraphBuilder, InputBinding, NodeId, OutputRef, bind},
    foundation::error::{MontageError, MontageResult},
    registry::manifest::{Manifest, PassSource, PortRole},
    timeline::model::{FeatureApplication, ParamValue},
};

/// Slot of a node's primary input.
pub const PRIMARY_SLOT: u32 = 0;

/// Effect-level port name -> upstream output feeding it.
pub(crate) type PortBindings = BTreeMap<String, OutputRef>;

/// Expands one effect manifest into render nodes.
///
/// Determinism rule: when several passes are ready, the lowest declaration index goes first.
pub(crate) struct PassScheduler<'m> {
    manifest: &'m Manifest,
    order: Vec<usize>,
}

impl<'m> PassScheduler<'m> {
    /// Resolve pass references and compute the execution order.
    pub(crate) fn new(manifest: &'m Manifest) -> MontageResult<Self> {
        let ctx = manifest.effect.as_str();
        let n = manifest.passes.len();

        let mut by_name = BTreeMap::<&str, usize>::new();
        for (i, pass) in manifest.passes.iter().enumerate() {
            if by_name.insert(pass.name.as_str(), i).is_some() {
                return Err(MontageError::manifest(format!(
                    "{ctx}: duplicate pass '{}'",
                    pass.name
                )));
            }
        }

        let mut indeg = vec![0u32; n];
        let mut dependents = vec![Vec::<usize>::new(); n];
        for (i, pass) in manifest.passes.iter().enumerate() {
            let mut deps = SmallVec::<[usize; 4]>::new();
            for input in &pass.inputs {
                let PassSource::Pass {
                    pass: producer,
                    output,
                } = &input.from
                else {
                    continue;
                };
                let Some(&pi) = by_name.get(producer.as_str()) else {
                    return Err(MontageError::manifest(format!(
                        "{ctx}: pass '{}' reads unknown pass '{producer}'",
                        pass.name
                    )));
                };
                if !manifest.passes[pi].outputs.iter().any(|o| o == output) {
                    return Err(MontageError::manifest(format!(
                        "{ctx}: pass '{}' reads unknown output '{producer}.{output}'",
                        pass.name
                    )));
                }
                if !deps.contains(&pi) {
                    deps.push(pi);
                }
            }
            for pi in deps {
                dependents[pi].push(i);
                indeg[i] = indeg[i].saturating_add(1);
            }
        }

        let mut ready = BinaryHeap::<Reverse<usize>>::new();
        for (i, &deg) in indeg.iter().enumerate() {
            if deg == 0 {
                ready.push(Reverse(i));
            }
        }

        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(i)) = ready.pop() {
            order.push(i);
            for &dep in &dependents[i] {
                let d = &mut indeg[dep];
                *d = d.saturating_sub(1);
                if *d == 0 {
                    ready.push(Reverse(dep));
                }
            }
        }

        if order.len() != n {
            let stuck = (0..n)
                .filter(|i| !order.contains(i))
                .map(|i| manifest.passes[i].name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(MontageError::manifest(format!(
                "{ctx}: pass cycle involving [{stuck}]"
            )));
        }

        Ok(Self { manifest, order })
    }

    /// Pass indices in execution order.
    pub(crate) fn order(&self) -> &[usize] {
        &self.order
    }

    /// Emit nodes for `feature` and return the effect's output.
    ///
    /// `bindings` must contain the primary port. A pass input sits at the slot of its declaration
    /// index; optional ports missing from `bindings` leave that slot empty.
    pub(crate) fn expand(
        &self,
        feature: &FeatureApplication,
        bindings: &PortBindings,
        graph: &mut GraphBuilder,
    ) -> MontageResult<OutputRef> {
        let m = self.manifest;
        if !bindings.contains_key(&m.primary_port) {
            return Err(MontageError::compile(format!(
                "{}: primary port '{}' is unbound",
                m.effect, m.primary_port
            )));
        }
        let params = merged_params(m, feature);

        if m.is_legacy() {
            let (kernel, params) = match m.passes.first() {
                Some(only) => (only.kernel.clone(), select_params(&params, &only.params)),
                None => (m.kernel.clone(), params),
            };
            let inputs = legacy_inputs(m, bindings);
            let node = graph.push(kernel, params, inputs)?;
            return Ok(OutputRef::of(node));
        }

        let mut produced = BTreeMap::<&str, NodeId>::new();
        let mut last = None;
        for &pi in &self.order {
            let pass = &m.passes[pi];
            let mut inputs = SmallVec::<[InputBinding; 4]>::new();
            for (slot, input) in (PRIMARY_SLOT..).zip(&pass.inputs) {
                let from = match &input.from {
                    PassSource::Effect(port) => match bindings.get(port) {
                        Some(b) => b.clone(),
                        None => continue,
                    },
                    PassSource::Pass {
                        pass: producer,
                        output,
                    } => {
                        let node = produced.get(producer.as_str()).copied().ok_or_else(|| {
                            MontageError::manifest(format!(
                                "{}: pass '{}' scheduled before '{producer}'",
                                m.effect, pass.name
                            ))
                        })?;
                        OutputRef {
                            node,
                            output: output.clone(),
                        }
                    }
                };
                inputs.push(bind(&input.port, slot, &from));
            }
            if inputs.is_empty() {
                return Err(MontageError::compile(format!(
                    "{}: pass '{}' has no bound inputs",
                    m.effect, pass.name
                )));
            }

            let pass_params = select_params(&params, &pass.params);
            let node = graph.push(pass.kernel.clone(), pass_params, inputs)?;
            produced.insert(pass.name.as_str(), node);
            last = Some(OutputRef {
                node,
                output: pass.default_output().to_owned(),
            });
        }

        tracing::debug!(
            effect = %m.effect,
            passes = self.order().len(),
            "expanded multi-pass effect"
        );
        last.ok_or_else(|| MontageError::compile(format!("{}: no passes emitted", m.effect)))
    }
}

/// Manifest defaults overridden by feature values.
fn merged_params(m: &Manifest, feature: &FeatureApplication) -> BTreeMap<String, ParamValue> {
    let mut out = m
        .params
        .iter()
        .map(|p| (p.name.clone(), p.default.clone()))
        .collect::<BTreeMap<_, _>>();
    for (k, v) in &feature.params {
        out.insert(k.clone(), v.clone());
    }
    out
}

/// The subset named by `wanted`, or everything when `wanted` is empty.
fn select_params(
    params: &BTreeMap<String, ParamValue>,
    wanted: &[String],
) -> BTreeMap<String, ParamValue> {
    if wanted.is_empty() {
        return params.clone();
    }
    params
        .iter()
        .filter(|(k, _)| wanted.contains(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Primary port at slot 0, then every other declared port at `1 + i` in declaration order.
///
/// Unbound ports leave their slot empty, so a port's slot never depends on which others are bound.
fn legacy_inputs(m: &Manifest, bindings: &PortBindings) -> SmallVec<[InputBinding; 4]> {
    let mut inputs = SmallVec::new();
    if let Some(primary) = bindings.get(&m.primary_port) {
        inputs.push(bind(&m.primary_port, PRIMARY_SLOT, primary));
    }
    let secondary = m
        .ports
        .iter()
        .filter(|p| p.name != m.primary_port && !matches!(p.role, PortRole::Primary));
    for (slot, port) in (PRIMARY_SLOT + 1..).zip(secondary) {
        if let Some(b) = bindings.get(&port.name) {
            inputs.push(bind(&port.name, slot, b));
        }
    }
    inputs
}

#[cfg(test)]
#[path = "../../tests/unit/compile/scheduler.rs"]
mod tests;
