use crate::config::EngineConfig;
use crate::direction::repair::{RepairStage, repair_json_text};
use crate::direction::{DirectionOutcome, ingest_direction};
use crate::foundation::core::Rgb;
use crate::foundation::error::DanceResult;
use crate::generation::gateway::{GatewayRequest, GenerationGateway, RequestKind, RetryPolicy};
use crate::generation::history::{DiversityConfig, GenerationHistory, GenerationRecord};
use crate::model::audio_dna::{AudioDna, HookConfig, normalize_hooks};
use crate::model::beat_grid::BeatGrid;
use crate::model::lyrics::LyricLine;
use crate::random::seeded::hash_seed;

/// Inputs of a direction generation call.
#[derive(Clone, Copy, Debug)]
pub struct DirectionRequest<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    /// Lines the storyboard must cover.
    pub lines: &'a [LyricLine],
    pub beat_grid: Option<&'a BeatGrid>,
    /// Free-form scene hint forwarded to the generator.
    pub scene_context: Option<&'a str>,
}

/// Inputs of an audio-DNA generation call.
#[derive(Clone, Copy, Debug)]
pub struct AudioDnaRequest<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub lines: &'a [LyricLine],
    pub beat_grid: Option<&'a BeatGrid>,
    /// Song length; bounds the normalized hooks.
    pub duration_s: f64,
    /// Encoded audio, forwarded as the request attachment.
    pub audio: &'a [u8],
}

/// Tagged audio-DNA parse result.
#[derive(Clone, Debug, PartialEq)]
pub enum AudioDnaOutcome {
    Ok(AudioDna),
    /// Decoded, but some sections were dropped or repaired.
    Partial(AudioDna, Vec<String>),
    /// Text was unusable; carries the canned document and the raw text.
    Fallback(AudioDna, String),
}

impl AudioDnaOutcome {
    /// The decoded (or canned) document.
    pub fn dna(&self) -> &AudioDna {
        match self {
            Self::Ok(d) | Self::Partial(d, _) | Self::Fallback(d, _) => d,
        }
    }

    pub fn into_dna(self) -> AudioDna {
        match self {
            Self::Ok(d) | Self::Partial(d, _) | Self::Fallback(d, _) => d,
        }
    }

    /// Sections dropped or repaired while decoding.
    pub fn notes(&self) -> &[String] {
        match self {
            Self::Partial(_, notes) => notes,
            _ => &[],
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(..))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ok(_) => "ok",
            Self::Partial(..) => "partial",
            Self::Fallback(..) => "fallback",
        }
    }
}

/// Owns the gateway and the bounded generation history.
pub struct GenerationService<G> {
    gateway: G,
    history: GenerationHistory,
    retry: RetryPolicy,
    diversity: DiversityConfig,
    hooks: HookConfig,
    resubmits: u64,
}

impl<G: GenerationGateway> GenerationService<G> {
    pub fn new(gateway: G, history: GenerationHistory, config: &EngineConfig) -> Self {
        Self {
            gateway,
            history,
            retry: config.retry,
            diversity: config.diversity,
            hooks: config.hooks,
            resubmits: 0,
        }
    }

    /// Service with a fresh history capped by `config.diversity.history_cap`.
    pub fn with_config(gateway: G, config: &EngineConfig) -> Self {
        let history = GenerationHistory::new(config.diversity.history_cap);
        Self::new(gateway, history, config)
    }

    pub fn history(&self) -> &GenerationHistory {
        &self.history
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Total diversity resubmissions issued by this service.
    pub fn resubmits(&self) -> u64 {
        self.resubmits
    }

    /// Request a direction document. Only transport failures are errors
    /// ([`crate::DanceError::Gateway`]).
    #[tracing::instrument(skip_all, fields(title = req.title, lines = req.lines.len()))]
    pub fn generate_direction(
        &mut self,
        req: &DirectionRequest<'_>,
    ) -> DanceResult<DirectionOutcome> {
        let payload = serde_json::json!({
            "title": req.title,
            "artist": req.artist,
            "lines": req.lines,
            "beatGrid": req.beat_grid,
            "sceneContext": req.scene_context,
        });
        let request = GatewayRequest::new(RequestKind::Direction, payload, self.retry.timeout());
        let text = self.retry.complete(&mut self.gateway, &request)?;
        Ok(ingest_direction(&text, req.lines))
    }

    /// Request an audio-DNA document, resubmitting when its palette repeats a recent one.
    #[tracing::instrument(skip_all, fields(title = req.title, bytes = req.audio.len()))]
    pub fn generate_audio_dna(
        &mut self,
        req: &AudioDnaRequest<'_>,
    ) -> DanceResult<AudioDnaOutcome> {
        let payload = serde_json::json!({
            "title": req.title,
            "artist": req.artist,
            "lines": req.lines,
            "beatGrid": req.beat_grid,
            "durationS": req.duration_s,
        });
        let mut note: Option<String> = None;
        let mut resubmits = 0;
        loop {
            let mut request =
                GatewayRequest::new(RequestKind::AudioDna, payload.clone(), self.retry.timeout())
                    .with_attachment(req.audio.to_vec());
            if let Some(n) = &note {
                request = request.with_corrective_note(n.clone());
            }
            let text = self.retry.complete(&mut self.gateway, &request)?;
            let outcome = self.decode_audio_dna(&text, req);
            if outcome.is_fallback() {
                return Ok(outcome);
            }

            let record = GenerationRecord::from_spec(&outcome.dna().effective_spec());
            if let Some(prev) = self
                .history
                .too_similar(&record, self.diversity.min_rgb_distance)
                && resubmits < self.diversity.max_resubmits
            {
                note = Some(corrective_note(&prev.palette));
                resubmits += 1;
                self.resubmits += 1;
                tracing::warn!(
                    field = "physics_spec.palette",
                    action = "resubmit",
                    attempt = resubmits,
                    "palette too similar to a recent generation"
                );
                continue;
            }
            self.history.push(record);
            return Ok(outcome);
        }
    }

    fn decode_audio_dna(&self, text: &str, req: &AudioDnaRequest<'_>) -> AudioDnaOutcome {
        let repaired = match repair_json_text(text) {
            Ok(r) => r,
            Err(failure) => {
                tracing::warn!(
                    field = "document",
                    action = "fallback",
                    bytes = failure.raw.len(),
                    "audio dna text is unparseable"
                );
                let seed = hash_seed(&format!("{}\u{1f}{}", req.title, req.artist));
                let dna = AudioDna::fallback(req.duration_s, seed, &self.hooks);
                return AudioDnaOutcome::Fallback(dna, failure.raw);
            }
        };

        let (mut dna, mut notes) = AudioDna::from_value_lenient(&repaired.value);
        if repaired.stage == RepairStage::Truncated {
            notes.push("document was truncated; recovered the complete prefix".to_owned());
        }
        let hooks = normalize_hooks(&dna.hottest_hooks, req.duration_s, &self.hooks);
        if hooks != dna.hottest_hooks {
            notes.push(format!(
                "hottest_hooks normalized from {} region(s)",
                dna.hottest_hooks.len()
            ));
            dna.hottest_hooks = hooks;
        }
        if notes.is_empty() {
            AudioDnaOutcome::Ok(dna)
        } else {
            AudioDnaOutcome::Partial(dna, notes)
        }
    }
}

fn corrective_note(previous: &[Rgb; 3]) -> String {
    format!(
        "The palette is too close to a recent song ({}, {}, {}). Choose a clearly different \
         palette: every slot must differ noticeably.",
        previous[0].to_hex(),
        previous[1].to_hex(),
        previous[2].to_hex()
    )
}

#[cfg(test)]
#[path = "../../tests/unit/generation/service.rs"]
mod tests;
