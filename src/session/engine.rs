use crate::config::EngineConfig;
use crate::direction::icons::IconPlannerConfig;
use crate::direction::interpret::DirectionInterpreter;
use crate::direction::synthesize::fallback_direction;
use crate::direction::{ingest_value, prepare_direction};
use crate::foundation::core::{Affine, Point, Rect, Rgb};
use crate::foundation::error::DanceResult;
use crate::model::audio_dna::{HookRegion, normalize_hooks};
use crate::model::beat_grid::BeatGrid;
use crate::model::direction::{CinematicDirection, IconPosition};
use crate::model::lyrics::{LyricLine, active_line_index, normalize_word, split_words};
use crate::model::physics_spec::{PhysicsSpec, SpecOverrides};
use crate::model::record::SongRecord;
use crate::physics::integrator::PhysicsIntegrator;
use crate::physics::state::PhysicsState;
use crate::render::canvas::{BlendMode, Canvas2d};
use crate::render::constellation::ConstellationField;
use crate::render::effects::{
    EffectRegistry, EffectState, StyledWord, draw_icon, hook_final_lines, select_effect_key,
};
use crate::render::surprise::{SurpriseKind, draw_surprise, micro_surprise};
use crate::render::words::{WordClass, classify_word, fit_font_size, word_color};
use crate::session::clock::AudioClock;

/// Share of the canvas width a lyric line may occupy.
const LINE_WIDTH_RATIO: f64 = 0.86;
const MIN_FONT_PX: f64 = 12.0;
/// How far the background leans toward the chapter color.
const CHAPTER_TINT: f64 = 0.25;
const PROGRESS_BAR_PX: f64 = 6.0;

/// Everything a playback session is built from.
#[derive(Clone, Debug, Default)]
pub struct SessionInputs {
    /// Timed lyric lines; validated when the engine is built.
    pub lines: Vec<LyricLine>,
    /// Beat grid; an empty grid plays without impulses.
    pub beat_grid: BeatGrid,
    /// Physics spec before session overrides.
    pub spec: PhysicsSpec,
    /// Direction to play; `None` plays the built-in fallback.
    pub direction: Option<CinematicDirection>,
    /// Hook regions; normalized to two regions when non-empty.
    pub hooks: Vec<HookRegion>,
    /// Song length in seconds; when not positive, the later of the last line end and last beat.
    pub duration_s: f64,
    /// `(id, text)` comments seeded into the constellation.
    pub comments: Vec<(String, String)>,
}

impl SessionInputs {
    /// Inputs without direction, hooks or comments.
    pub fn new(
        lines: Vec<LyricLine>,
        beat_grid: BeatGrid,
        spec: PhysicsSpec,
        duration_s: f64,
    ) -> Self {
        Self {
            lines,
            beat_grid,
            spec,
            direction: None,
            hooks: Vec::new(),
            duration_s,
            comments: Vec::new(),
        }
    }

    /// Inputs for a persisted song row. A stored direction is repaired and backfilled.
    pub fn from_record(rec: &SongRecord) -> Self {
        let direction = rec
            .cinematic_direction
            .as_ref()
            .map(|v| ingest_value(v, &rec.lyrics).into_playable(&rec.lyrics));
        Self {
            lines: rec.lyrics.clone(),
            beat_grid: rec.beat_grid_or_synthetic(),
            spec: rec.effective_spec(),
            direction,
            hooks: rec.hooks.clone().unwrap_or_default(),
            duration_s: rec.duration(),
            comments: Vec::new(),
        }
    }
}

/// Partial update of playback parameters; `None` leaves a parameter unchanged.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct PlaybackPatch {
    /// Skip drawing while the surface is not visible. Beats keep flowing.
    pub hidden: Option<bool>,
    /// Applied to the clock by [`PlaybackSession::update`].
    pub muted: Option<bool>,
    /// Beats between micro-surprises; 0 disables them.
    pub micro_surprise_interval: Option<u32>,
    /// Draw the playback progress bar.
    pub show_progress: Option<bool>,
    /// Replaces the current session overrides.
    pub overrides: Option<SpecOverrides>,
}

/// What one frame did.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    /// Clock time the frame was computed for.
    pub time_s: f64,
    /// Number of beats at or before `time_s`.
    pub beat_index: usize,
    /// Active lyric line, if any.
    pub line_index: Option<usize>,
    /// Effect key the active line was drawn with.
    pub effect: Option<String>,
    /// Micro-surprise drawn this frame.
    pub surprise: Option<SurpriseKind>,
    /// False while hidden; physics still advanced.
    pub drawn: bool,
    /// Beat impulses fed to the integrator this frame.
    pub fed_beats: usize,
    /// Beats passed over without an impulse because playback jumped ahead.
    pub skipped_beats: usize,
    /// Time moved backwards since the previous frame.
    pub seeked: bool,
    /// Integrator state after this frame.
    pub physics: PhysicsState,
}

/// Per-session render loop state. The clock is read every frame; nothing else drives time.
#[derive(Debug)]
pub struct PlaybackEngine {
    lines: Vec<LyricLine>,
    beats: BeatGrid,
    base_spec: PhysicsSpec,
    spec: PhysicsSpec,
    overrides: SpecOverrides,
    duration_s: f64,
    integrator: PhysicsIntegrator,
    interpreter: DirectionInterpreter,
    direction_palette: bool,
    icons: IconPlannerConfig,
    registry: EffectRegistry,
    hooks: Vec<HookRegion>,
    hook_finals: Vec<usize>,
    constellation: ConstellationField,
    cursor: usize,
    last_time: Option<f64>,
    hidden: bool,
    show_progress: bool,
    surprise_interval: u32,
    surprise_window_s: f64,
    max_catchup_beats: usize,
}

impl PlaybackEngine {
    pub fn new(inputs: SessionInputs, config: &EngineConfig) -> DanceResult<Self> {
        LyricLine::validate_sequence(&inputs.lines)?;
        let lines = inputs.lines;
        let beats = inputs.beat_grid.normalized();
        let duration_s = if inputs.duration_s.is_finite() && inputs.duration_s > 0.0 {
            inputs.duration_s
        } else {
            let last_line = lines.last().map_or(0.0, |l| l.end);
            last_line.max(beats.last_beat().unwrap_or(0.0))
        };

        let direction_palette = inputs.direction.is_some();
        let doc = inputs
            .direction
            .unwrap_or_else(|| fallback_direction(&lines));
        let prepared = prepare_direction(doc, &lines, &config.icons);
        tracing::debug!(
            synthesized = prepared.actions.len(),
            icons_added = prepared.icons.added.len(),
            "direction prepared"
        );
        let interpreter = DirectionInterpreter::new(&prepared.doc, duration_s);

        let hooks = if inputs.hooks.is_empty() {
            Vec::new()
        } else {
            normalize_hooks(&inputs.hooks, duration_s, &config.hooks)
        };
        let hook_finals = hook_final_lines(&lines, &hooks);

        Ok(Self {
            integrator: PhysicsIntegrator::new(&inputs.spec, config.tick_hz),
            base_spec: inputs.spec.clone(),
            spec: inputs.spec,
            overrides: SpecOverrides::default(),
            duration_s,
            interpreter,
            direction_palette,
            icons: config.icons,
            registry: EffectRegistry::builtin(),
            hooks,
            hook_finals,
            constellation: ConstellationField::with_comments(config.canvas, inputs.comments),
            lines,
            beats,
            cursor: 0,
            last_time: None,
            hidden: false,
            show_progress: config.show_progress,
            surprise_interval: config.micro_surprise_interval,
            surprise_window_s: config.micro_surprise_window_s,
            max_catchup_beats: config.max_catchup_beats.max(1),
        })
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn duration(&self) -> f64 {
        self.duration_s
    }

    /// Effective spec (base spec with overrides applied).
    pub fn spec(&self) -> &PhysicsSpec {
        &self.spec
    }

    pub fn hooks(&self) -> &[HookRegion] {
        &self.hooks
    }

    pub fn interpreter(&self) -> &DirectionInterpreter {
        &self.interpreter
    }

    pub fn physics(&self) -> &PhysicsState {
        self.integrator.state()
    }

    /// Beats already fed (or skipped) by the cursor.
    pub fn beat_cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn registry_mut(&mut self) -> &mut EffectRegistry {
        &mut self.registry
    }

    pub fn constellation(&self) -> &ConstellationField {
        &self.constellation
    }

    pub fn push_comment(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.constellation.push_comment(id, text);
    }

    /// Swap in a new direction. Beat cursor, physics and clock are untouched.
    pub fn set_direction(&mut self, doc: CinematicDirection) {
        let prepared = prepare_direction(doc, &self.lines, &self.icons);
        self.interpreter = DirectionInterpreter::new(&prepared.doc, self.duration_s);
        self.direction_palette = true;
        tracing::debug!(icons_added = prepared.icons.added.len(), "direction replaced");
    }

    /// Apply a partial parameter update.
    pub fn update(&mut self, patch: PlaybackPatch) {
        if let Some(hidden) = patch.hidden {
            self.hidden = hidden;
        }
        if let Some(interval) = patch.micro_surprise_interval {
            self.surprise_interval = interval;
        }
        if let Some(show) = patch.show_progress {
            self.show_progress = show;
        }
        if let Some(overrides) = patch.overrides {
            self.spec = overrides.apply(&self.base_spec);
            self.integrator.set_spec(&self.spec);
            self.integrator.set_energy(overrides.energy());
            self.overrides = overrides;
        }
    }

    /// Drop all motion and re-seat the beat cursor at `time_s`.
    pub fn seek_reset(&mut self, time_s: f64) {
        let t = sanitize_time(time_s, 0.0);
        self.integrator.reset();
        self.cursor = self.beats.beats_at_or_before(t);
        self.last_time = Some(t);
    }

    /// Advance to the clock's time and draw one frame. Never fails.
    pub fn frame(&mut self, clock: &dyn AudioClock, canvas: &mut dyn Canvas2d) -> FrameReport {
        let t = sanitize_time(clock.current_time(), self.last_time.unwrap_or(0.0));
        let target = self.beats.beats_at_or_before(t);
        let mut fed = 0;
        let mut skipped = 0;
        let mut seeked = false;
        let mut dt = 0.0;

        match self.last_time {
            Some(prev) if t < prev => {
                tracing::debug!(from = prev, to = t, "seek backwards; physics reset");
                self.seek_reset(t);
                seeked = true;
            }
            Some(prev) => dt = t - prev,
            None => {}
        }
        if target < self.cursor {
            self.cursor = target;
        }
        if target > self.cursor {
            let pending = target - self.cursor;
            if pending > self.max_catchup_beats {
                skipped = pending - self.max_catchup_beats;
                self.cursor += skipped;
                tracing::debug!(skipped, at = t, "beat catch-up capped");
            }
            let intensity = self.interpreter.intensity(self.interpreter.progress_at(t));
            for i in self.cursor..target {
                self.integrator
                    .on_beat(0.5 + 0.5 * intensity, BeatGrid::is_downbeat(i));
                fed += 1;
            }
            self.cursor = target;
        }
        self.last_time = Some(t);

        let line_index = active_line_index(&self.lines, t);
        let words = line_index.map_or(0, |i| split_words(&self.lines[i].text).len());
        self.integrator.set_word_count(words);
        let physics = self.integrator.tick().clone();
        self.constellation.update(dt);

        let mut report = FrameReport {
            time_s: t,
            beat_index: target,
            line_index,
            effect: None,
            surprise: None,
            drawn: false,
            fed_beats: fed,
            skipped_beats: skipped,
            seeked,
            physics,
        };
        if self.hidden {
            return report;
        }

        let progress = self.interpreter.progress_at(t);
        let intensity = self.interpreter.intensity(progress);
        let palette = self.palette(progress);

        canvas.save();
        canvas.set_transform(Affine::IDENTITY);
        canvas.set_global_alpha(1.0);
        canvas.set_blend(BlendMode::SourceOver);
        canvas.clear(palette[0]);
        self.constellation.draw(canvas, &palette);

        if let Some(i) = line_index {
            let key = self.draw_line(canvas, i, t, progress, intensity, &palette, &report.physics);
            report.effect = Some(key);
        }

        if let Some(last) = target.checked_sub(1).and_then(|i| self.beats.beats.get(i)) {
            let surprise =
                micro_surprise(target, self.surprise_interval, t - last, self.surprise_window_s);
            if let Some(s) = surprise {
                draw_surprise(canvas, &s, &palette);
                report.surprise = Some(s.kind);
            }
        }

        if self.show_progress && self.duration_s > 0.0 {
            let (w, h) = canvas.size().as_f64();
            let k = (t / self.duration_s).clamp(0.0, 1.0);
            let top = h - PROGRESS_BAR_PX;
            canvas.fill_rect(Rect::new(0.0, top, w, h), palette[2].with_alpha(0.15));
            canvas.fill_rect(Rect::new(0.0, top, w * k, h), palette[1].with_alpha(0.9));
        }
        canvas.restore();
        report.drawn = true;
        report
    }

    /// `[background, accent, text]` for the current chapter.
    fn palette(&self, progress: f64) -> [Rgb; 3] {
        let mut palette = if self.direction_palette && self.overrides.palette.is_none() {
            self.interpreter.palette()
        } else {
            self.spec.resolved_palette()
        };
        if let Some(tint) = self.interpreter.chapter_color(progress) {
            palette[0] = palette[0].mix(tint, CHAPTER_TINT);
        }
        palette
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_line(
        &self,
        canvas: &mut dyn Canvas2d,
        index: usize,
        t: f64,
        progress: f64,
        intensity: f64,
        palette: &[Rgb; 3],
        physics: &PhysicsState,
    ) -> String {
        let line = &self.lines[index];
        let entry = self.interpreter.line_direction(index);
        let uppercase = match self
            .interpreter
            .typography_shift(progress)
            .and_then(|s| s.text_transform.as_deref())
        {
            Some("uppercase") => true,
            Some("lowercase" | "none") => false,
            _ => self.spec.typography_profile.uppercase,
        };
        let hero = entry
            .hero_word
            .as_deref()
            .map(normalize_word)
            .filter(|w| !w.is_empty());

        let words: Vec<StyledWord> = split_words(&line.text)
            .into_iter()
            .map(|w| {
                let mut class = classify_word(w, self.interpreter.word_directive(w));
                if hero.as_deref() == Some(normalize_word(w).as_str()) {
                    class = WordClass::Impact;
                }
                StyledWord {
                    text: if uppercase { w.to_uppercase() } else { w.to_owned() },
                    class,
                    color: word_color(class, palette),
                }
            })
            .collect();

        let (w, h) = canvas.size().as_f64();
        let ratio = self.spec.typography_profile.size_ratio;
        let ratio = if ratio.is_finite() && ratio > 0.0 { ratio.min(0.5) } else { 0.06 };
        let display: Vec<&str> = words.iter().map(|s| s.text.as_str()).collect();
        let font_size = fit_font_size(
            &display.join(" "),
            w * LINE_WIDTH_RATIO,
            h * ratio,
            MIN_FONT_PX,
            |s, px| canvas.measure_text(s, px),
        );

        let is_final = self.hook_finals.binary_search(&index).is_ok();
        let key = select_effect_key(
            self.interpreter.effect_for_line(index),
            &self.spec.effect_pool,
            self.spec.logic_seed,
            index,
            is_final,
        );
        let state = EffectState {
            line_index: index,
            words: &words,
            line_progress: line.progress_at(t),
            time_s: t,
            center: Point::new(w / 2.0, h / 2.0),
            font_size,
            palette: *palette,
            physics,
            entry_style: &entry.entry_style,
            exit_style: &entry.exit_style,
            intensity,
            seed: self.spec.logic_seed ^ (index as u32).wrapping_mul(0x9e37_79b9),
        };

        let behind = entry.has_icon()
            && IconPosition::parse_or_default(entry.icon_position.as_deref())
                == IconPosition::Behind;
        if behind {
            draw_icon(canvas, &entry, &state);
        }
        canvas.save();
        self.registry.get(key)(canvas, &state);
        canvas.restore();
        if entry.has_icon() && !behind {
            draw_icon(canvas, &entry, &state);
        }
        key.to_owned()
    }
}

fn sanitize_time(t: f64, fallback: f64) -> f64 {
    if t.is_finite() { t.max(0.0) } else { fallback }
}

/// An engine bound to its clock. Tearing down (or dropping) pauses the clock.
#[derive(Debug)]
pub struct PlaybackSession<C: AudioClock> {
    engine: PlaybackEngine,
    clock: C,
    torn_down: bool,
}

impl<C: AudioClock> PlaybackSession<C> {
    pub fn new(engine: PlaybackEngine, clock: C) -> Self {
        Self {
            engine,
            clock,
            torn_down: false,
        }
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PlaybackEngine {
        &mut self.engine
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn play(&mut self) {
        if !self.torn_down {
            self.clock.play();
        }
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Draw one frame; `None` once torn down.
    pub fn frame(&mut self, canvas: &mut dyn Canvas2d) -> Option<FrameReport> {
        if self.torn_down {
            return None;
        }
        Some(self.engine.frame(&self.clock, canvas))
    }

    pub fn update(&mut self, patch: PlaybackPatch) {
        if let Some(muted) = patch.muted {
            self.clock.set_muted(muted);
        }
        self.engine.update(patch);
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Stop producing frames and release the clock.
    pub fn teardown(&mut self) {
        if !self.torn_down {
            self.clock.pause();
            self.torn_down = true;
            tracing::debug!("playback session torn down");
        }
    }
}

impl<C: AudioClock> Drop for PlaybackSession<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/engine.rs"]
mod tests;
