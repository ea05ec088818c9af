use crate::foundation::core::Vec2;

/// Maximum absolute line offset in pixels.
pub const OFFSET_LIMIT: f64 = 120.0;
/// Maximum absolute rotation in radians.
pub const ROTATION_LIMIT: f64 = 0.6;
/// Scale range.
pub const SCALE_RANGE: (f64, f64) = (0.5, 2.0);
/// Maximum absolute spring velocity.
pub const VELOCITY_LIMIT: f64 = 50.0;
/// Maximum absolute spring displacement.
pub const POSITION_LIMIT: f64 = 4.0;
/// Maximum blur radius in pixels.
pub const BLUR_MAX: f64 = 12.0;
/// Maximum absolute per-word offset (each axis) in pixels.
pub const WORD_OFFSET_LIMIT: f64 = 40.0;

/// Transient render input produced by the integrator every tick.
///
/// Every channel is finite and inside its documented bound after [`PhysicsState::clamp`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsState {
    /// Horizontal line offset in pixels.
    pub offset_x: f64,
    /// Vertical line offset in pixels.
    pub offset_y: f64,
    /// Line rotation in radians.
    pub rotation: f64,
    /// Uniform line scale.
    pub scale: f64,
    /// Spring velocity.
    pub velocity: f64,
    /// Spring displacement.
    pub position: f64,
    /// Blur radius in pixels.
    pub blur: f64,
    /// Shake amount in `[0, 1]`.
    pub shake: f64,
    /// Glow amount in `[0, 1]`.
    pub glow: f64,
    /// Heat amount in `[0, 1]`.
    pub heat: f64,
    /// Shatter amount in `[0, 1]`.
    pub shatter: f64,
    /// Whether the line is currently broken apart.
    pub is_fractured: bool,
    /// Per-word offsets in pixels.
    pub word_offsets: Vec<Vec2>,
}

impl Default for PhysicsState {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            rotation: 0.0,
            scale: 1.0,
            velocity: 0.0,
            position: 0.0,
            blur: 0.0,
            shake: 0.0,
            glow: 0.0,
            heat: 0.0,
            shatter: 0.0,
            is_fractured: false,
            word_offsets: Vec::new(),
        }
    }
}

fn clamp_or(v: f64, lo: f64, hi: f64, rest: f64) -> (f64, bool) {
    if v.is_finite() {
        (v.clamp(lo, hi), false)
    } else {
        (rest, true)
    }
}

impl PhysicsState {
    /// Force every channel into bounds, resetting non-finite values to rest.
    ///
    /// Returns `true` when at least one channel was non-finite.
    pub fn clamp(&mut self) -> bool {
        let mut reset = false;
        let mut fix = |v: &mut f64, lo: f64, hi: f64, rest: f64| {
            let (x, r) = clamp_or(*v, lo, hi, rest);
            *v = x;
            reset |= r;
        };
        fix(&mut self.offset_x, -OFFSET_LIMIT, OFFSET_LIMIT, 0.0);
        fix(&mut self.offset_y, -OFFSET_LIMIT, OFFSET_LIMIT, 0.0);
        fix(&mut self.rotation, -ROTATION_LIMIT, ROTATION_LIMIT, 0.0);
        fix(&mut self.scale, SCALE_RANGE.0, SCALE_RANGE.1, 1.0);
        fix(&mut self.velocity, -VELOCITY_LIMIT, VELOCITY_LIMIT, 0.0);
        fix(&mut self.position, -POSITION_LIMIT, POSITION_LIMIT, 0.0);
        fix(&mut self.blur, 0.0, BLUR_MAX, 0.0);
        fix(&mut self.shake, 0.0, 1.0, 0.0);
        fix(&mut self.glow, 0.0, 1.0, 0.0);
        fix(&mut self.heat, 0.0, 1.0, 0.0);
        fix(&mut self.shatter, 0.0, 1.0, 0.0);
        for w in &mut self.word_offsets {
            fix(&mut w.x, -WORD_OFFSET_LIMIT, WORD_OFFSET_LIMIT, 0.0);
            fix(&mut w.y, -WORD_OFFSET_LIMIT, WORD_OFFSET_LIMIT, 0.0);
        }
        reset
    }

    /// Return `true` when every channel is finite and in bounds.
    pub fn is_within_bounds(&self) -> bool {
        let within = |v: f64, lo: f64, hi: f64| v.is_finite() && lo <= v && v <= hi;
        within(self.offset_x, -OFFSET_LIMIT, OFFSET_LIMIT)
            && within(self.offset_y, -OFFSET_LIMIT, OFFSET_LIMIT)
            && within(self.rotation, -ROTATION_LIMIT, ROTATION_LIMIT)
            && within(self.scale, SCALE_RANGE.0, SCALE_RANGE.1)
            && within(self.velocity, -VELOCITY_LIMIT, VELOCITY_LIMIT)
            && within(self.position, -POSITION_LIMIT, POSITION_LIMIT)
            && within(self.blur, 0.0, BLUR_MAX)
            && within(self.shake, 0.0, 1.0)
            && within(self.glow, 0.0, 1.0)
            && within(self.heat, 0.0, 1.0)
            && within(self.shatter, 0.0, 1.0)
            && self.word_offsets.iter().all(|w| {
                within(w.x, -WORD_OFFSET_LIMIT, WORD_OFFSET_LIMIT)
                    && within(w.y, -WORD_OFFSET_LIMIT, WORD_OFFSET_LIMIT)
            })
    }

    /// Offset as a vector.
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.offset_x, self.offset_y)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/physics/state.rs"]
mod tests;
