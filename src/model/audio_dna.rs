use crate::model::physics_spec::{ParticleConfig, PhysicsSpec, TypographyProfile};
use crate::model::{decode_field, decode_list};

/// A labelled span of the song chosen for short-form animation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HookRegion {
    /// Start in seconds.
    pub start: f64,
    /// End in seconds.
    pub end: f64,
    /// Human-readable label ("chorus", "drop", ...).
    #[serde(default)]
    pub label: String,
}

impl HookRegion {
    /// Region length in seconds.
    pub fn len(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Return `true` for zero-length regions.
    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }

    /// Return `true` when the two regions share any time.
    pub fn overlaps(&self, other: &HookRegion) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Return `true` when `t` lies in `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
}

/// Hook-length constraints.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Minimum region length in seconds.
    pub min_len_s: f64,
    /// Maximum region length in seconds.
    pub max_len_s: f64,
    /// Gap between an existing and a synthesized region.
    pub gap_s: f64,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            min_len_s: 8.0,
            max_len_s: 12.0,
            gap_s: 2.0,
        }
    }
}

/// Per-song audio analysis produced by the generation gateway.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioDna {
    /// Exactly two regions after [`normalize_hooks`].
    #[serde(default)]
    pub hottest_hooks: Vec<HookRegion>,
    /// Prose description of the track.
    #[serde(default)]
    pub description: String,
    /// Mood keyword.
    #[serde(default)]
    pub mood: String,
    /// Visual world description.
    #[serde(default)]
    pub world: String,
    /// Physics parameterization for playback.
    #[serde(default)]
    pub physics_spec: PhysicsSpec,
    /// Particle configuration, when given at top level.
    #[serde(default, rename = "particleConfig", skip_serializing_if = "Option::is_none")]
    pub particle_config: Option<ParticleConfig>,
    /// Typography profile, when given at top level.
    #[serde(default, rename = "typographyProfile", skip_serializing_if = "Option::is_none")]
    pub typography_profile: Option<TypographyProfile>,
    /// Vocabulary the generator associates with the song.
    #[serde(default)]
    pub lexicon: Vec<String>,
}

impl AudioDna {
    /// Decode leniently, keeping whatever sections decode on their own.
    pub fn from_value_lenient(value: &serde_json::Value) -> (Self, Vec<String>) {
        if let Ok(doc) = <Self as serde::Deserialize>::deserialize(value) {
            return (doc, Vec::new());
        }
        let Some(obj) = value.as_object() else {
            return (
                Self::default(),
                vec!["audio dna document is not a JSON object".to_owned()],
            );
        };
        let mut doc = Self::default();
        let mut dropped = Vec::new();
        decode_list(obj, "hottest_hooks", &mut doc.hottest_hooks, &mut dropped, |_| None);
        decode_field(obj, "description", &mut doc.description, &mut dropped);
        decode_field(obj, "mood", &mut doc.mood, &mut dropped);
        decode_field(obj, "world", &mut doc.world, &mut dropped);
        decode_field(obj, "physics_spec", &mut doc.physics_spec, &mut dropped);
        decode_field(obj, "particleConfig", &mut doc.particle_config, &mut dropped);
        decode_field(obj, "typographyProfile", &mut doc.typography_profile, &mut dropped);
        decode_list(obj, "lexicon", &mut doc.lexicon, &mut dropped, |_| None);
        (doc, dropped)
    }

    /// Spec with top-level particle/typography sections folded in.
    pub fn effective_spec(&self) -> PhysicsSpec {
        let mut spec = self.physics_spec.clone();
        if let Some(p) = &self.particle_config {
            spec.particle_config = p.clone();
        }
        if let Some(t) = &self.typography_profile {
            spec.typography_profile = t.clone();
        }
        spec
    }

    /// Canned document used when the gateway output cannot be parsed at all.
    pub fn fallback(duration_s: f64, logic_seed: u32, cfg: &HookConfig) -> Self {
        let spec = PhysicsSpec {
            logic_seed,
            ..PhysicsSpec::default()
        };
        Self {
            hottest_hooks: normalize_hooks(&[], duration_s, cfg),
            description: String::new(),
            mood: "neutral".to_owned(),
            world: String::new(),
            physics_spec: spec,
            particle_config: None,
            typography_profile: None,
            lexicon: Vec::new(),
        }
    }
}

/// Force `hooks` into exactly two non-overlapping regions inside `[0, duration_s]`.
///
/// Regions are clamped to the configured length range and to the song. Overlapping regions are
/// dropped (earliest wins). A missing second region is synthesized `gap_s` after the first,
/// or before it when there is no room after. Songs too short for two full regions get two
/// equal halves separated by the gap. Output is sorted by start.
pub fn normalize_hooks(hooks: &[HookRegion], duration_s: f64, cfg: &HookConfig) -> Vec<HookRegion> {
    let min_len = cfg.min_len_s.max(0.0);
    let max_len = cfg.max_len_s.max(min_len);
    let gap = cfg.gap_s.max(0.0);
    let default_len = (min_len + max_len) / 2.0;
    let duration = if duration_s.is_finite() && duration_s > 0.0 {
        duration_s
    } else {
        2.0 * default_len + gap
    };

    let fit = |start: f64, len: f64, label: String| -> HookRegion {
        let len = len.clamp(min_len, max_len).min(duration);
        let start = start.clamp(0.0, (duration - len).max(0.0));
        HookRegion {
            start,
            end: start + len,
            label,
        }
    };

    let mut candidates: Vec<HookRegion> = hooks
        .iter()
        .filter(|h| h.start.is_finite() && h.end.is_finite())
        .map(|h| fit(h.start, h.end - h.start, h.label.clone()))
        .collect();
    candidates.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut out: Vec<HookRegion> = Vec::with_capacity(2);
    for c in candidates {
        if out.len() == 2 {
            break;
        }
        if out.iter().any(|k| k.overlaps(&c)) {
            tracing::warn!(field = "hottest_hooks", action = "drop_overlapping", start = c.start);
            continue;
        }
        out.push(c);
    }
    if out.len() != hooks.len() {
        tracing::warn!(
            field = "hottest_hooks",
            action = "normalize",
            given = hooks.len(),
            kept = out.len()
        );
    }

    if out.is_empty() {
        tracing::warn!(field = "hottest_hooks", action = "synthesize_first");
        out.push(fit(duration * 0.25, default_len, "hook 1".to_owned()));
    }

    if out.len() == 1 {
        let first = out[0].clone();
        let len = first.len().max(min_len.min(duration));
        let after = first.end + gap;
        let before = first.start - gap - len;
        let second = if after + len <= duration {
            HookRegion {
                start: after,
                end: after + len,
                label: "hook 2".to_owned(),
            }
        } else if before >= 0.0 {
            HookRegion {
                start: before,
                end: before + len,
                label: "hook 2".to_owned(),
            }
        } else {
            let half = ((duration - gap) / 2.0).max(0.0);
            out.clear();
            out.push(HookRegion {
                start: 0.0,
                end: half,
                label: first.label.clone(),
            });
            HookRegion {
                start: half + gap.min(duration - half),
                end: duration,
                label: "hook 2".to_owned(),
            }
        };
        tracing::warn!(
            field = "hottest_hooks",
            action = "synthesize_second",
            start = second.start,
            end = second.end
        );
        out.push(second);
    }

    out.sort_by(|a, b| a.start.total_cmp(&b.start));
    out
}

#[cfg(test)]
#[path = "../../tests/unit/model/audio_dna.rs"]
mod tests;
