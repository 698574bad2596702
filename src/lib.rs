//! Montage is the editorial core of a non-linear video editor.
//!
//! It owns a timeline document, mutates it only through a closed set of edit commands, and
//! compiles the frame visible at a playhead into a render graph for a downstream GPU engine.
//!
//! # Pipeline overview
//!
//! 1. **Edit**: `Timeline + IntentCommand -> Timeline` via [`apply_command`] (ripple, trim,
//!    blade, move, grade, retime), with an audit trail through a [`TraceSink`].
//! 2. **Compile**: `Timeline + playhead -> RenderRequest` via [`TimelineCompiler::compile`]
//!    (sources, ingestion, effect passes, transitions, final composite).
//! 3. **Render**: out of scope; the [`RenderGraph`] is handed to an external engine.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Value semantics**: a timeline is a plain value; edits run on a copy that replaces the
//!   original only when the command applies.
//! - **Capability-driven effects**: the compiler never matches on effect names. Effects are
//!   described by [`Manifest`]s looked up through a [`CapabilityRegistry`].
//! - **Deterministic output**: node ids are sequential and every map is ordered, so equal inputs
//!   produce equal graphs ([`RenderGraph::dump`], [`RenderGraph::fingerprint`]).
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod compile;
mod config;
mod edit;
mod effects;
mod foundation;
mod registry;
mod timeline;

pub use animation::ease::Ease;
pub use compile::compiler::TimelineCompiler;
pub use compile::context::FrameContext;
pub use compile::fingerprint::GraphFingerprint;
pub use compile::graph::{
    InputBinding, NodeId, OutputRef, RenderGraph, RenderNode, RenderRequest,
};
pub use compile::scheduler::PRIMARY_SLOT;
pub use config::CompilerConfig;
pub use edit::apply::{EditOutcome, NoOpReason, apply_command};
pub use edit::command::IntentCommand;
pub use edit::target::ClipTarget;
pub use edit::trace::{
    EVENT_EDIT_BEGIN, EVENT_EDIT_END, EVENT_EDIT_OVERLAP, MemoryTraceSink, NullTraceSink,
    TraceEvent, TraceSink, TracingSink,
};
pub use effects::transitions::{
    TRANSITION_FROM_PORT, TRANSITION_TO_PORT, TransitionKind, WipeDir, transition_progress,
};
pub use foundation::core::{Quality, Rect, Resolution, Rgba8Premul, Time};
pub use foundation::error::{MontageError, MontageResult};
pub use foundation::ids::{AssetId, ClipId, EffectId, ShaderId, TimelineId, TrackId};
pub use registry::capability::{CapabilityRegistry, ManifestRegistry};
pub use registry::manifest::{
    DEFAULT_OUTPUT, DEFAULT_PRIMARY_PORT, EffectStage, Manifest, ParamDecl, PassDecl, PassInput,
    PassSource, PortDecl, PortRole,
};
pub use registry::standard::{
    FACE_BLUR_EFFECT_ID, GAUSSIAN_BLUR_EFFECT_ID, REGION_MASK_GENERATOR, standard_manifests,
    standard_registry,
};
pub use timeline::dsl::{ClipBuilder, TimelineBuilder, TrackBuilder};
pub use timeline::model::{
    AssetReference, COLOR_GRADE_EFFECT_ID, Clip, FeatureApplication, GENERATOR_SCHEME,
    ParamValue, RETIME_EFFECT_ID, SourceKind, Timeline, Track, TrackKind, Transition,
};
