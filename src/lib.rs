//! hookdance is a deterministic, beat-synchronized lyric animation engine.
//!
//! Playback is driven by an audio clock and a beat grid:
//!
//! - Ingest a generated [`CinematicDirection`] (repair, validate, backfill) into a
//!   [`DirectionOutcome`]
//! - Build a [`PlaybackEngine`] from [`SessionInputs`] and an [`EngineConfig`]
//! - Call [`PlaybackEngine::frame`] once per display frame with any [`Canvas2d`] surface
//!
//! Given the same song, spec and seed every frame is reproducible; [`DisplayList::fingerprint`]
//! hashes a recorded frame for comparison.
#![forbid(unsafe_code)]

mod config;
mod foundation;

pub(crate) mod direction;
pub(crate) mod generation;
pub(crate) mod model;
pub(crate) mod physics;
pub(crate) mod random;
pub(crate) mod render;
pub(crate) mod session;

pub use crate::config::EngineConfig;
pub use crate::foundation::core::{
    Affine, CanvasSize, Point, Rect, Rgb, Rgba, Transform2D, Vec2,
};
pub use crate::foundation::error::{DanceError, DanceResult};
pub use crate::random::seeded::{SeededRng, hash_seed};

pub use crate::model::audio_dna::{AudioDna, HookConfig, HookRegion, normalize_hooks};
pub use crate::model::beat_grid::{BEATS_PER_BAR, BeatGrid};
pub use crate::model::direction::{
    CameraLanguage, Chapter, CinematicDirection, Climax, Ending, IconPosition, IconStyle,
    StoryboardEntry, TensionPoint, TypographyShift, WordDirective, WordDirectives,
};
pub use crate::model::lyrics::{LyricLine, active_line_index, normalize_word, split_words};
pub use crate::model::physics_spec::{
    DEFAULT_PALETTE, ParticleConfig, PhysicsParams, PhysicsSpec, SpecOverrides, SystemKind,
    TypographyProfile, resolve_palette,
};
pub use crate::model::record::{FALLBACK_BPM, SeedValue, SongRecord};

pub use crate::direction::icons::{
    IconGlyph, IconPlan, IconPlannerConfig, icon_spacing, lookup_icon, plan_icons,
};
pub use crate::direction::interpret::DirectionInterpreter;
pub use crate::direction::repair::{RepairFailure, RepairStage, RepairedJson, repair_json_text};
pub use crate::direction::synthesize::{SynthesisAction, fallback_direction, synthesize_missing};
pub use crate::direction::validate::{
    DefectPathElem, DirectionDefect, validate_direction, validate_document,
};
pub use crate::direction::{
    DirectionOutcome, PreparedDirection, ingest_direction, ingest_value, prepare_direction,
};

pub use crate::physics::integrator::PhysicsIntegrator;
pub use crate::physics::state::PhysicsState;

pub use crate::render::canvas::{
    BlendMode, Canvas2d, DisplayList, DrawCommand, DrawState, FrameFingerprint, TextAlign,
};
pub use crate::render::constellation::{ConstellationField, ConstellationNode, NodePhase};
pub use crate::render::cpu::{CpuCanvas, FrameRgba};
pub use crate::render::effects::{
    EffectFn, EffectRegistry, EffectState, Envelope, StyledWord, draw_icon, envelope,
    hook_final_lines, select_effect_key,
};
pub use crate::render::surprise::{MicroSurprise, SurpriseKind, draw_surprise, micro_surprise};
pub use crate::render::text::{BUNDLED_FONT, FontBook, ShapedText};
pub use crate::render::words::{WordClass, classify_word, fit_font_size, word_color};

pub use crate::session::clock::{AudioClock, ManualClock};
pub use crate::session::engine::{
    FrameReport, PlaybackEngine, PlaybackPatch, PlaybackSession, SessionInputs,
};
pub use crate::session::worker::{
    MessageKind, RenderWorker, WorkerEvent, WorkerInit, WorkerMessage, WorkerState,
};

pub use crate::generation::gateway::{
    GatewayError, GatewayRequest, GenerationGateway, RequestKind, RetryPolicy,
};
pub use crate::generation::history::{
    DiversityConfig, GenerationHistory, GenerationRecord, palettes_too_similar,
};
pub use crate::generation::service::{
    AudioDnaOutcome, AudioDnaRequest, DirectionRequest, GenerationService,
};
