use crate::foundation::core::Rgb;
use crate::foundation::math::clamp_finite;

/// Palette used when a spec carries fewer than three valid colors.
pub const DEFAULT_PALETTE: [&str; 3] = ["#0b0b14", "#e94560", "#f4f1ea"];

/// Physics "system" selecting which state channels respond to beats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemKind {
    /// Brittle text that shatters on strong downbeats.
    Fracture,
    /// Punchy scale/shake response.
    #[default]
    Pressure,
    /// Slow scale and glow swell.
    Breath,
    /// Heat accumulation and glow.
    Combustion,
    /// Rotation and circular drift.
    Orbit,
}

impl SystemKind {
    /// All systems in declaration order.
    pub const ALL: [SystemKind; 5] = [
        SystemKind::Fracture,
        SystemKind::Pressure,
        SystemKind::Breath,
        SystemKind::Combustion,
        SystemKind::Orbit,
    ];

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fracture => "fracture",
            Self::Pressure => "pressure",
            Self::Breath => "breath",
            Self::Combustion => "combustion",
            Self::Orbit => "orbit",
        }
    }

    /// Parse a lowercase or mixed-case name.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

/// Numeric parameters of the spring-damper model.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PhysicsParams {
    /// Inertia, clamped to `[0.1, 10]`.
    #[serde(default = "default_mass")]
    pub mass: f64,
    /// Spring stiffness factor in `[0, 1]`.
    #[serde(default = "default_elasticity")]
    pub elasticity: f64,
    /// Damping factor in `[0, 1]`.
    #[serde(default = "default_damping")]
    pub damping: f64,
    /// Tendency to fracture in `[0, 1]`.
    #[serde(default)]
    pub brittleness: f64,
    /// Heat retention in `[0, 1]`.
    #[serde(default)]
    pub heat: f64,
}

fn default_mass() -> f64 {
    1.0
}

fn default_elasticity() -> f64 {
    0.5
}

fn default_damping() -> f64 {
    0.5
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            mass: default_mass(),
            elasticity: default_elasticity(),
            damping: default_damping(),
            brittleness: 0.0,
            heat: 0.0,
        }
    }
}

impl PhysicsParams {
    /// Copy with every parameter clamped into its documented range.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            mass: clamp_finite(self.mass, 0.1, 10.0, d.mass),
            elasticity: clamp_finite(self.elasticity, 0.0, 1.0, d.elasticity),
            damping: clamp_finite(self.damping, 0.0, 1.0, d.damping),
            brittleness: clamp_finite(self.brittleness, 0.0, 1.0, d.brittleness),
            heat: clamp_finite(self.heat, 0.0, 1.0, d.heat),
        }
    }
}

/// Typography hints produced alongside the physics spec.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographyProfile {
    /// Font family name (informational for raster backends without shaping).
    #[serde(default = "default_font_family")]
    pub font_family: String,
    /// CSS-like weight (100..900).
    #[serde(default = "default_font_weight")]
    pub font_weight: u32,
    /// Extra spacing between letters, in em.
    #[serde(default)]
    pub letter_spacing: f64,
    /// Render the line in upper case.
    #[serde(default)]
    pub uppercase: bool,
    /// Base font size as a fraction of canvas height.
    #[serde(default = "default_size_ratio")]
    pub size_ratio: f64,
}

fn default_font_family() -> String {
    "Inter".to_owned()
}

fn default_font_weight() -> u32 {
    700
}

fn default_size_ratio() -> f64 {
    0.06
}

impl Default for TypographyProfile {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            font_weight: default_font_weight(),
            letter_spacing: 0.0,
            uppercase: false,
            size_ratio: default_size_ratio(),
        }
    }
}

/// Background particle field configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleConfig {
    /// Particle style key (`embers`, `dust`, `rain`, `none`, ...).
    #[serde(default = "default_particle_system")]
    pub system: String,
    /// Relative particle count in `[0, 1]`.
    #[serde(default = "default_density")]
    pub density: f64,
    /// Relative drift speed.
    #[serde(default = "default_speed")]
    pub speed: f64,
}

fn default_particle_system() -> String {
    "dust".to_owned()
}

fn default_density() -> f64 {
    0.3
}

fn default_speed() -> f64 {
    1.0
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            system: default_particle_system(),
            density: default_density(),
            speed: default_speed(),
        }
    }
}

/// Per-song physics parameterization. Read-only during playback.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PhysicsSpec {
    /// Which channels respond to beats.
    #[serde(default)]
    pub system: SystemKind,
    /// Spring-damper parameters.
    #[serde(default)]
    pub params: PhysicsParams,
    /// Ordered palette: background, accent, text (at least three entries).
    #[serde(default)]
    pub palette: Vec<String>,
    /// Effect keys that per-line selection draws from.
    #[serde(default)]
    pub effect_pool: Vec<String>,
    /// Seed for deterministic effect selection and jitter.
    #[serde(default)]
    pub logic_seed: u32,
    /// Typography hints.
    #[serde(default, rename = "typographyProfile")]
    pub typography_profile: TypographyProfile,
    /// Background particles.
    #[serde(default, rename = "particleConfig")]
    pub particle_config: ParticleConfig,
}

impl Default for PhysicsSpec {
    fn default() -> Self {
        Self {
            system: SystemKind::default(),
            params: PhysicsParams::default(),
            palette: DEFAULT_PALETTE.iter().map(|s| (*s).to_owned()).collect(),
            effect_pool: vec!["resolve".to_owned()],
            logic_seed: 0,
            typography_profile: TypographyProfile::default(),
            particle_config: ParticleConfig::default(),
        }
    }
}

impl PhysicsSpec {
    /// Resolve the palette into exactly three colors, falling back slot by slot.
    pub fn resolved_palette(&self) -> [Rgb; 3] {
        resolve_palette(&self.palette)
    }
}

/// Resolve hex strings into `[background, accent, text]`, falling back per slot.
pub fn resolve_palette(palette: &[String]) -> [Rgb; 3] {
    let mut valid = palette.iter().filter_map(|s| Rgb::parse_hex(s));
    let mut out = [Rgb::BLACK; 3];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = valid
            .next()
            .or_else(|| Rgb::parse_hex(DEFAULT_PALETTE[i]))
            .unwrap_or(Rgb::WHITE);
    }
    out
}

/// Transient session overrides layered on top of a spec without mutating it.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpecOverrides {
    /// Replacement palette.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
    /// Replacement system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemKind>,
    /// Impulse multiplier, clamped to `[0, 3]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
}

impl SpecOverrides {
    /// Produce the effective spec for a session.
    pub fn apply(&self, spec: &PhysicsSpec) -> PhysicsSpec {
        let mut out = spec.clone();
        if let Some(palette) = &self.palette
            && palette.iter().filter(|c| Rgb::is_valid_hex(c)).count() >= 3
        {
            out.palette = palette.clone();
        }
        if let Some(system) = self.system {
            out.system = system;
        }
        out
    }

    /// Effective impulse multiplier.
    pub fn energy(&self) -> f64 {
        self.energy.map_or(1.0, |e| clamp_finite(e, 0.0, 3.0, 1.0))
    }

    /// Return `true` when nothing is overridden.
    pub fn is_empty(&self) -> bool {
        self.palette.is_none() && self.system.is_none() && self.energy.is_none()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/physics_spec.rs"]
mod tests;
