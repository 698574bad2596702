use std::collections::BTreeMap;

use rayon::prelude::*;
use smallvec::{SmallVec, smallvec};

use crate::{
    compile::context::FrameContext,
    compile::graph::{GraphBuilder, InputBinding, NodeId, OutputRef, RenderRequest, bind},
    compile::scheduler::{PRIMARY_SLOT, PassScheduler, PortBindings},
    config::CompilerConfig,
    effects::transitions::{TRANSITION_FROM_PORT, TRANSITION_TO_PORT, transition_progress},
    foundation::core::{Quality, Resolution, Time},
    foundation::error::{MontageError, MontageResult},
    foundation::ids::ShaderId,
    foundation::math::TIME_EPSILON,
    registry::capability::CapabilityRegistry,
    registry::manifest::{EffectStage, PortRole},
    timeline::model::{Clip, ParamValue, SourceKind, Timeline, Track, TrackKind, Transition},
};

/// Port name used by ingestion nodes for their single input.
const INGEST_INPUT_PORT: &str = "src";

/// Compiles timeline snapshots into render graphs.
///
/// Compilation is pure: it reads the timeline, the registry and the frame context and never
/// mutates any of them. A compiler can be shared across threads when `R` is.
pub struct TimelineCompiler<R> {
    registry: R,
    config: CompilerConfig,
    /// Dedicated pool for [`Self::compile_many`]; `None` runs on rayon's global pool.
    pool: Option<rayon::ThreadPool>,
}

impl<R: CapabilityRegistry> TimelineCompiler<R> {
    /// Create a compiler after validating `config`.
    ///
    /// When `config.threads` is set, the worker pool is built here once and reused by every
    /// [`Self::compile_many`] call.
    pub fn new(registry: R, config: CompilerConfig) -> MontageResult<Self> {
        config.validate()?;
        let pool = config.threads.map(build_thread_pool).transpose()?;
        Ok(Self {
            registry,
            config,
            pool,
        })
    }

    /// Create a compiler with [`CompilerConfig::default`].
    pub fn with_default_config(registry: R) -> Self {
        Self {
            registry,
            config: CompilerConfig::default(),
            pool: None,
        }
    }

    /// Validated configuration this compiler was built with.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Registry used to resolve clip features.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Compile the frame visible at `at`.
    #[tracing::instrument(skip(self, timeline, frame_context), fields(timeline = %timeline.id))]
    pub fn compile(
        &self,
        timeline: &Timeline,
        at: Time,
        quality: Quality,
        frame_context: &FrameContext,
    ) -> MontageResult<RenderRequest> {
        if !at.is_finite() {
            return Err(MontageError::validation("playhead must be finite"));
        }
        let resolution = self.config.base_resolution.scaled(quality.scale_factor());

        let mut frame = FrameCompiler {
            registry: &self.registry,
            config: &self.config,
            ctx: frame_context,
            resolution,
            at,
            graph: GraphBuilder::new(),
        };

        let mut layers = Vec::<OutputRef>::new();
        for track in timeline.tracks.iter().filter(|t| t.kind == TrackKind::Video) {
            frame.compile_track(track, &mut layers)?;
        }

        let inputs = layers
            .iter()
            .enumerate()
            .map(|(i, l)| bind(&format!("layer{i}"), i as u32, l))
            .collect::<SmallVec<[InputBinding; 4]>>();
        let output = frame
            .graph
            .push(self.config.final_shader.clone(), BTreeMap::new(), inputs)?;

        tracing::debug!(
            layers = layers.len(),
            nodes = frame.graph.len(),
            "compiled frame"
        );

        Ok(RenderRequest {
            graph: frame.graph.finish(output)?,
            resolution,
            quality,
            playhead: at,
        })
    }

    /// Compile several playheads of one snapshot in parallel; results keep input order.
    pub fn compile_many(
        &self,
        timeline: &Timeline,
        playheads: &[Time],
        quality: Quality,
        frame_context: &FrameContext,
    ) -> MontageResult<Vec<RenderRequest>> {
        let run = || {
            playheads
                .par_iter()
                .map(|&at| self.compile(timeline, at, quality, frame_context))
                .collect::<MontageResult<Vec<_>>>()
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}

fn build_thread_pool(threads: usize) -> MontageResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(MontageError::validation("'threads' must be >= 1 when set"));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| MontageError::compile(format!("failed to build rayon thread pool: {e}")))
}

/// State for compiling one frame.
struct FrameCompiler<'a, R> {
    registry: &'a R,
    config: &'a CompilerConfig,
    ctx: &'a FrameContext,
    resolution: Resolution,
    at: Time,
    graph: GraphBuilder,
}

impl<R: CapabilityRegistry> FrameCompiler<'_, R> {
    /// Append one layer per active clip or transition pair on `track`.
    fn compile_track(&mut self, track: &Track, layers: &mut Vec<OutputRef>) -> MontageResult<()> {
        let mut sorted = track.clips.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| a.start.cmp(&b.start));

        let mut i = 0;
        while i < sorted.len() {
            let clip = sorted[i];
            if !clip.contains(self.at) {
                i += 1;
                continue;
            }

            let next = sorted.get(i + 1).copied();
            if let Some(next) = next
                && next.contains(self.at)
                && is_paired(clip, next)
                && let Some(tr) = clip.transition_out.as_ref()
            {
                let from = self.compile_clip(clip)?;
                let to = self.compile_clip(next)?;
                let progress = transition_progress(self.at, next.start, tr.duration, tr.ease);
                let node = self.push_transition(
                    tr,
                    progress,
                    smallvec![
                        bind(TRANSITION_FROM_PORT, PRIMARY_SLOT, &from),
                        bind(TRANSITION_TO_PORT, PRIMARY_SLOT + 1, &to),
                    ],
                )?;
                layers.push(node);
                i += 2;
                continue;
            }

            let prev = i.checked_sub(1).map(|p| sorted[p]);
            let mut out = self.compile_clip(clip)?;

            if let Some(tr) = clip.transition_in.as_ref()
                && !prev.is_some_and(|p| is_paired(p, clip))
                && self.at < clip.start + tr.duration
            {
                let progress = transition_progress(self.at, clip.start, tr.duration, tr.ease);
                out = self.push_transition(
                    tr,
                    progress,
                    smallvec![bind(TRANSITION_TO_PORT, PRIMARY_SLOT, &out)],
                )?;
            }
            if let Some(tr) = clip.transition_out.as_ref()
                && !next.is_some_and(|n| is_paired(clip, n))
                && self.at >= clip.end() - tr.duration
            {
                let window_start = clip.end() - tr.duration;
                let progress = transition_progress(self.at, window_start, tr.duration, tr.ease);
                out = self.push_transition(
                    tr,
                    progress,
                    smallvec![bind(TRANSITION_FROM_PORT, PRIMARY_SLOT, &out)],
                )?;
            }

            layers.push(out);
            i += 1;
        }
        Ok(())
    }

    /// Source, ingestion and effect chain of one clip.
    fn compile_clip(&mut self, clip: &Clip) -> MontageResult<OutputRef> {
        let source = self.push_source(clip)?;

        let source_kind = if clip.asset.is_procedural() {
            "procedural"
        } else {
            "recorded"
        };
        let ingest = self.graph.push(
            self.config.ingest_shader.clone(),
            BTreeMap::from([
                (
                    "source_kind".to_owned(),
                    ParamValue::Str(source_kind.to_owned()),
                ),
                (
                    "working_space".to_owned(),
                    ParamValue::Str(self.config.working_color_space.clone()),
                ),
            ]),
            smallvec![bind(INGEST_INPUT_PORT, PRIMARY_SLOT, &OutputRef::of(source))],
        )?;

        let registry = self.registry;
        let ctx = self.ctx;
        let mut current = OutputRef::of(ingest);
        for feature in &clip.features {
            let manifest = registry
                .lookup(&feature.effect)
                .ok_or_else(|| MontageError::unknown_effect(feature.effect.as_str()))?;
            if manifest.stage == EffectStage::Temporal {
                continue;
            }

            let mut bindings = PortBindings::new();
            bindings.insert(manifest.primary_port.clone(), current.clone());
            for port in &manifest.ports {
                let PortRole::Conditioned { generator } = &port.role else {
                    continue;
                };
                match ctx.regions_for(&clip.id) {
                    Some(rects) => {
                        let node = self.graph.push(
                            generator.clone(),
                            BTreeMap::from([
                                ("height".to_owned(), ParamValue::I64(self.resolution.height.into())),
                                ("rects".to_owned(), ParamValue::Rects(rects.to_vec())),
                                ("width".to_owned(), ParamValue::I64(self.resolution.width.into())),
                            ]),
                            SmallVec::new(),
                        )?;
                        bindings.insert(port.name.clone(), OutputRef::of(node));
                    }
                    None => {
                        tracing::debug!(
                            clip = %clip.id,
                            effect = %feature.effect,
                            port = %port.name,
                            "no frame-context regions; conditioned port left unbound"
                        );
                    }
                }
            }

            current = PassScheduler::new(manifest)?.expand(feature, &bindings, &mut self.graph)?;
        }
        Ok(current)
    }

    fn push_source(&mut self, clip: &Clip) -> MontageResult<NodeId> {
        let time = clip.source_time_at(self.at);
        match clip.asset.source() {
            SourceKind::Procedural {
                generator,
                mut params,
            } => {
                params.insert("time".to_owned(), ParamValue::F64(time.secs()));
                self.graph
                    .push(ShaderId::new(format!("gen.{generator}")), params, SmallVec::new())
            }
            SourceKind::Recorded => {
                if (clip.retime_factor() - 1.0).abs() > TIME_EPSILON {
                    tracing::debug!(
                        clip = %clip.id,
                        factor = clip.retime_factor(),
                        "retime ignored for recorded media"
                    );
                }
                self.graph.push(
                    self.config.decode_shader.clone(),
                    BTreeMap::from([
                        (
                            "asset".to_owned(),
                            ParamValue::Str(clip.asset.id.to_string()),
                        ),
                        (
                            "locator".to_owned(),
                            ParamValue::Str(clip.asset.locator.clone()),
                        ),
                        ("time".to_owned(), ParamValue::F64(time.secs())),
                    ]),
                    SmallVec::new(),
                )
            }
        }
    }

    fn push_transition(
        &mut self,
        tr: &Transition,
        progress: f64,
        inputs: SmallVec<[InputBinding; 4]>,
    ) -> MontageResult<OutputRef> {
        let mut params = tr.kind.params();
        params.insert("progress".to_owned(), ParamValue::F64(progress));
        let node = self.graph.push(tr.kind.shader(), params, inputs)?;
        Ok(OutputRef::of(node))
    }
}

/// Adjacent clips whose shared boundary carries a transition on both sides.
fn is_paired(a: &Clip, b: &Clip) -> bool {
    a.transition_out.is_some() && b.transition_in.is_some() && a.overlap_with(b).secs() > TIME_EPSILON
}

#[cfg(test)]
#[path = "../../tests/unit/compile/compiler.rs"]
mod tests;
