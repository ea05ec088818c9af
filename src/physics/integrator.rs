use std::f64::consts::TAU;

use crate::foundation::core::Vec2;
use crate::foundation::math::clamp_finite;
use crate::model::physics_spec::{PhysicsParams, PhysicsSpec, SystemKind};
use crate::physics::state::{
    OFFSET_LIMIT, POSITION_LIMIT, PhysicsState, VELOCITY_LIMIT, WORD_OFFSET_LIMIT,
};
use crate::random::seeded::SeededRng;

/// Largest time step a single tick may integrate.
pub const MAX_DT: f64 = 0.1;

const TAU_SHAKE: f64 = 0.12;
const TAU_GLOW: f64 = 0.6;
const TAU_HEAT: f64 = 1.5;
const TAU_BLUR: f64 = 0.2;
const TAU_SHATTER: f64 = 0.8;
const TAU_ROTATION: f64 = 0.35;

const VELOCITY_KICK: f64 = 6.0;
const WORD_KICK: f64 = 90.0;
const SHAKE_PX: f64 = 18.0;
const ORBIT_RADIUS_PX: f64 = 24.0;
const BREATH_PERIOD_S: f64 = 4.0;
const DOWNBEAT_WEIGHT: f64 = 1.0;
const OFFBEAT_WEIGHT: f64 = 0.5;
const MAX_PENDING_MAGNITUDE: f64 = 8.0;
const SUBSTEP: f64 = 0.01;

/// Fracture engages above this shatter level on a downbeat.
const FRACTURE_ON: f64 = 0.6;
/// Fracture releases below this shatter level.
const FRACTURE_OFF: f64 = 0.15;
const FRACTURE_MIN_BRITTLENESS: f64 = 0.5;

/// How strongly each channel answers a beat for one system.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ChannelWeights {
    shake: f64,
    glow: f64,
    heat: f64,
    shatter: f64,
    blur: f64,
    rotation: f64,
    spring: f64,
}

fn weights(system: SystemKind) -> ChannelWeights {
    match system {
        SystemKind::Fracture => ChannelWeights {
            shake: 0.6,
            glow: 0.2,
            heat: 0.1,
            shatter: 0.9,
            blur: 0.3,
            rotation: 0.15,
            spring: 0.8,
        },
        SystemKind::Pressure => ChannelWeights {
            shake: 0.8,
            glow: 0.3,
            heat: 0.1,
            shatter: 0.0,
            blur: 0.2,
            rotation: 0.05,
            spring: 1.0,
        },
        SystemKind::Breath => ChannelWeights {
            shake: 0.1,
            glow: 0.6,
            heat: 0.05,
            shatter: 0.0,
            blur: 0.1,
            rotation: 0.0,
            spring: 0.4,
        },
        SystemKind::Combustion => ChannelWeights {
            shake: 0.3,
            glow: 0.5,
            heat: 0.7,
            shatter: 0.0,
            blur: 0.2,
            rotation: 0.05,
            spring: 0.7,
        },
        SystemKind::Orbit => ChannelWeights {
            shake: 0.2,
            glow: 0.3,
            heat: 0.1,
            shatter: 0.0,
            blur: 0.1,
            rotation: 0.3,
            spring: 0.6,
        },
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Pending {
    magnitude: f64,
    downbeat: bool,
    count: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Envelopes {
    shake: f64,
    glow: f64,
    heat: f64,
    blur: f64,
    shatter: f64,
    rotation: f64,
}

/// Discrete-time spring-damper that turns beat impulses into a [`PhysicsState`].
///
/// One instance per playback session. All jitter comes from a [`SeededRng`] seeded with the
/// spec's `logic_seed`, so identical beat schedules produce identical states.
#[derive(Clone, Debug)]
pub struct PhysicsIntegrator {
    system: SystemKind,
    params: PhysicsParams,
    logic_seed: u32,
    energy: f64,
    dt: f64,
    rng: SeededRng,
    pending: Pending,
    env: Envelopes,
    elapsed: f64,
    orbit_angle: f64,
    word_velocity: Vec<Vec2>,
    state: PhysicsState,
}

impl PhysicsIntegrator {
    /// Create an integrator stepping at `tick_hz`.
    pub fn new(spec: &PhysicsSpec, tick_hz: f64) -> Self {
        let dt = if tick_hz.is_finite() && tick_hz > 0.0 {
            (1.0 / tick_hz).clamp(0.0, MAX_DT)
        } else {
            1.0 / 60.0
        };
        Self {
            system: spec.system,
            params: spec.params.sanitized(),
            logic_seed: spec.logic_seed,
            energy: 1.0,
            dt,
            rng: SeededRng::new(spec.logic_seed),
            pending: Pending::default(),
            env: Envelopes::default(),
            elapsed: 0.0,
            orbit_angle: 0.0,
            word_velocity: Vec::new(),
            state: PhysicsState::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &PhysicsState {
        &self.state
    }

    /// Active system.
    pub fn system(&self) -> SystemKind {
        self.system
    }

    /// Fixed step in seconds.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Swap the parameterization (session overrides) without resetting motion.
    pub fn set_spec(&mut self, spec: &PhysicsSpec) {
        self.system = spec.system;
        self.params = spec.params.sanitized();
        if spec.logic_seed != self.logic_seed {
            self.logic_seed = spec.logic_seed;
            self.rng = SeededRng::new(spec.logic_seed);
        }
    }

    /// Impulse multiplier, clamped to `[0, 3]`.
    pub fn set_energy(&mut self, energy: f64) {
        self.energy = clamp_finite(energy, 0.0, 3.0, 1.0);
    }

    /// Resize per-word channels for a new active line.
    pub fn set_word_count(&mut self, n: usize) {
        if self.state.word_offsets.len() != n {
            self.state.word_offsets = vec![Vec2::ZERO; n];
            self.word_velocity = vec![Vec2::ZERO; n];
        }
    }

    /// Return to rest and restart the jitter stream.
    pub fn reset(&mut self) {
        let words = self.state.word_offsets.len();
        self.rng.reset();
        self.pending = Pending::default();
        self.env = Envelopes::default();
        self.elapsed = 0.0;
        self.orbit_angle = 0.0;
        self.state = PhysicsState::default();
        self.set_word_count(words);
    }

    /// Queue a beat impulse for the next tick.
    pub fn on_beat(&mut self, strength: f64, is_downbeat: bool) {
        let strength = clamp_finite(strength, 0.0, 2.0, 0.0);
        let weight = if is_downbeat {
            DOWNBEAT_WEIGHT
        } else {
            OFFBEAT_WEIGHT
        };
        let m = strength * weight * self.energy;
        self.pending.magnitude = (self.pending.magnitude + m).min(MAX_PENDING_MAGNITUDE);
        self.pending.downbeat |= is_downbeat;
        self.pending.count = self.pending.count.saturating_add(1);
    }

    /// Advance one step and return the new state.
    pub fn tick(&mut self) -> &PhysicsState {
        let dt = self.dt;
        let w = weights(self.system);
        let p = self.params;
        let pending = std::mem::take(&mut self.pending);
        let m = pending.magnitude;

        if pending.count > 0 && m > 0.0 {
            self.state.velocity += m * VELOCITY_KICK * w.spring / p.mass;
            self.env.shake += m * w.shake;
            self.env.glow += m * w.glow;
            self.env.heat += m * w.heat * (0.5 + p.heat);
            self.env.blur += m * w.blur * 4.0;
            self.env.shatter += m * w.shatter * p.brittleness;
            let sign = if self.rng.chance(0.5) { 1.0 } else { -1.0 };
            self.env.rotation += sign * m * w.rotation;
            for v in &mut self.word_velocity {
                *v += self.rng.in_disc(m * WORD_KICK);
            }
            if self.system == SystemKind::Orbit {
                self.orbit_angle += m * 0.4;
            }
        }

        // Semi-implicit spring toward rest, sub-stepped so stiff springs stay stable.
        let k = (20.0 + p.elasticity * 120.0) / p.mass;
        let c = (2.0 + p.damping * 18.0) / p.mass;
        let steps = (dt / SUBSTEP).ceil().max(1.0) as usize;
        let h = dt / steps as f64;
        let damp = (-c * h).exp();
        let word_damp = (-c * 0.8 * h).exp();
        for _ in 0..steps {
            self.state.velocity = (self.state.velocity * damp - k * self.state.position * h)
                .clamp(-VELOCITY_LIMIT, VELOCITY_LIMIT);
            self.state.position = (self.state.position + self.state.velocity * h)
                .clamp(-POSITION_LIMIT, POSITION_LIMIT);
            for (o, v) in self
                .state
                .word_offsets
                .iter_mut()
                .zip(self.word_velocity.iter_mut())
            {
                *v = *v * word_damp - *o * (k * 0.5 * h);
                *o += *v * h;
                o.x = o.x.clamp(-WORD_OFFSET_LIMIT, WORD_OFFSET_LIMIT);
                o.y = o.y.clamp(-WORD_OFFSET_LIMIT, WORD_OFFSET_LIMIT);
            }
        }

        let heat_tau = TAU_HEAT * (1.0 + 2.0 * p.heat);
        self.env.shake = (self.env.shake * (-dt / TAU_SHAKE).exp()).clamp(0.0, 1.0);
        self.env.glow = (self.env.glow * (-dt / TAU_GLOW).exp()).clamp(0.0, 1.0);
        self.env.heat = (self.env.heat * (-dt / heat_tau).exp()).clamp(0.0, 1.0);
        self.env.blur = (self.env.blur * (-dt / TAU_BLUR).exp()).clamp(0.0, 1.0);
        self.env.shatter = (self.env.shatter * (-dt / TAU_SHATTER).exp()).clamp(0.0, 1.0);
        self.env.rotation = (self.env.rotation * (-dt / TAU_ROTATION).exp()).clamp(-1.0, 1.0);

        self.elapsed += dt;
        if self.elapsed > 1e6 {
            self.elapsed %= BREATH_PERIOD_S;
        }
        let breath = (TAU * self.elapsed / BREATH_PERIOD_S).sin();
        self.orbit_angle = (self.orbit_angle + dt * 0.8) % TAU;

        let jitter = self.rng.in_disc(self.env.shake * SHAKE_PX);
        let mut offset = jitter + Vec2::new(0.0, -self.state.position * 10.0);
        let mut scale = 1.0 + self.state.position * 0.08;
        let mut glow = self.env.glow;
        let mut rotation = self.env.rotation * 0.6;
        match self.system {
            SystemKind::Breath => {
                scale += 0.04 * breath;
                glow += 0.15 * (breath + 1.0) / 2.0;
            }
            SystemKind::Orbit => {
                offset +=
                    Vec2::new(self.orbit_angle.cos(), self.orbit_angle.sin()) * ORBIT_RADIUS_PX;
                rotation += 0.05 * self.orbit_angle.sin();
            }
            SystemKind::Combustion => {
                glow += 0.3 * self.env.heat;
            }
            SystemKind::Pressure => {
                scale += 0.1 * self.env.shake;
            }
            SystemKind::Fracture => {}
        }

        self.state.offset_x = offset.x.clamp(-OFFSET_LIMIT, OFFSET_LIMIT);
        self.state.offset_y = offset.y.clamp(-OFFSET_LIMIT, OFFSET_LIMIT);
        self.state.scale = scale;
        self.state.rotation = rotation;
        self.state.shake = self.env.shake;
        self.state.glow = glow;
        self.state.heat = self.env.heat;
        self.state.blur = self.env.blur * 12.0;
        self.state.shatter = self.env.shatter;

        if self.system == SystemKind::Fracture {
            if pending.downbeat
                && p.brittleness >= FRACTURE_MIN_BRITTLENESS
                && self.env.shatter >= FRACTURE_ON
            {
                self.state.is_fractured = true;
            } else if self.env.shatter < FRACTURE_OFF {
                self.state.is_fractured = false;
            }
        } else {
            self.state.is_fractured = false;
        }

        if self.state.clamp() {
            tracing::debug!("physics: non-finite channel reset");
            self.env = Envelopes::default();
            self.word_velocity.iter_mut().for_each(|v| *v = Vec2::ZERO);
        }
        &self.state
    }
}

#[cfg(test)]
#[path = "../../tests/unit/physics/integrator.rs"]
mod tests;
