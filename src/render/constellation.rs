use std::f64::consts::TAU;

use crate::foundation::core::{CanvasSize, Point, Rgb, Vec2};
use crate::foundation::math::lerp;
use crate::random::seeded::SeededRng;
use crate::render::canvas::{Canvas2d, TextAlign};
use crate::render::text::FontBook;

/// Seconds a new comment stays centered.
pub const CENTER_HOLD_S: f64 = 3.0;
/// Seconds spent moving from the center into the river.
pub const TRANSITION_S: f64 = 1.0;
/// Number of river rows.
pub const RIVER_ROWS: usize = 3;
/// River scroll speed in pixels per second.
pub const RIVER_SPEED: f64 = 120.0;
/// Largest time step applied by one update.
const MAX_STEP_S: f64 = 0.25;

const CONSTELLATION_SIZE: f64 = 18.0;
const CENTER_SIZE: f64 = 42.0;
const RIVER_SIZE: f64 = 24.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodePhase {
    Constellation,
    Transitioning,
    Center,
    River,
}

/// A comment floating over the lyric canvas.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstellationNode {
    pub id: String,
    pub text: String,
    /// Home position as a fraction of the canvas.
    pub seed_x: f64,
    pub seed_y: f64,
    pub x: f64,
    pub y: f64,
    /// Pixels per second.
    pub drift_speed: f64,
    pub drift_angle: f64,
    pub phase: NodePhase,
    pub river_row_index: usize,
    pub base_opacity: f64,
    #[serde(skip)]
    phase_time: f64,
    /// Shaped width at river size; the node recycles once it has fully left the screen.
    #[serde(skip)]
    river_width: f64,
}

/// All comment nodes of one playback session.
#[derive(Clone, Debug)]
pub struct ConstellationField {
    size: CanvasSize,
    fonts: FontBook,
    nodes: Vec<ConstellationNode>,
    next_row: usize,
}

impl ConstellationField {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            size,
            fonts: FontBook::bundled(),
            nodes: Vec::new(),
            next_row: 0,
        }
    }

    /// Field seeded with existing comments, all drifting in the constellation.
    pub fn with_comments<I, S>(size: CanvasSize, comments: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut field = Self::new(size);
        for (id, text) in comments {
            let node = field.seeded_node(id.into(), text.into(), NodePhase::Constellation);
            field.nodes.push(node);
        }
        field
    }

    pub fn nodes(&self) -> &[ConstellationNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a fresh comment. It takes the center; a previously centered comment moves on.
    pub fn push_comment(&mut self, id: impl Into<String>, text: impl Into<String>) {
        for n in &mut self.nodes {
            if n.phase == NodePhase::Center {
                n.phase = NodePhase::Transitioning;
                n.phase_time = 0.0;
            }
        }
        let mut node = self.seeded_node(id.into(), text.into(), NodePhase::Center);
        let (cx, cy) = self.center();
        node.x = cx;
        node.y = cy;
        node.river_row_index = self.next_row;
        self.next_row = (self.next_row + 1) % RIVER_ROWS;
        self.nodes.push(node);
    }

    fn seeded_node(&self, id: String, text: String, phase: NodePhase) -> ConstellationNode {
        let mut rng = SeededRng::from_key(&id);
        let (w, h) = self.size.as_f64();
        let seed_x = rng.range(0.05, 0.95);
        let seed_y = rng.range(0.05, 0.95);
        ConstellationNode {
            seed_x,
            seed_y,
            x: seed_x * w,
            y: seed_y * h,
            drift_speed: rng.range(4.0, 12.0),
            drift_angle: rng.range(0.0, TAU),
            phase,
            river_row_index: 0,
            base_opacity: rng.range(0.15, 0.4),
            phase_time: 0.0,
            river_width: self.fonts.measure(&text, RIVER_SIZE),
            id,
            text,
        }
    }

    fn center(&self) -> (f64, f64) {
        let (w, h) = self.size.as_f64();
        (w / 2.0, h * 0.3)
    }

    fn river_y(&self, row: usize) -> f64 {
        let (_, h) = self.size.as_f64();
        h * (0.72 + 0.06 * (row % RIVER_ROWS) as f64)
    }

    /// Advance every node by `dt` seconds. Negative or non-finite steps are ignored.
    pub fn update(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let dt = dt.min(MAX_STEP_S);
        let (w, h) = self.size.as_f64();
        let (cx, cy) = self.center();
        let river: Vec<f64> = (0..RIVER_ROWS).map(|r| self.river_y(r)).collect();

        for n in &mut self.nodes {
            n.phase_time += dt;
            match n.phase {
                NodePhase::Constellation => {
                    n.drift_angle = (n.drift_angle + 0.1 * dt).rem_euclid(TAU);
                    n.x = (n.x + n.drift_angle.cos() * n.drift_speed * dt).rem_euclid(w);
                    n.y = (n.y + n.drift_angle.sin() * n.drift_speed * dt).rem_euclid(h);
                }
                NodePhase::Center => {
                    n.x = cx;
                    n.y = cy;
                    if n.phase_time >= CENTER_HOLD_S {
                        n.phase = NodePhase::Transitioning;
                        n.phase_time = 0.0;
                    }
                }
                NodePhase::Transitioning => {
                    let k = (n.phase_time / TRANSITION_S).clamp(0.0, 1.0);
                    n.x = lerp(cx, w, k);
                    n.y = lerp(cy, river[n.river_row_index % RIVER_ROWS], k);
                    if k >= 1.0 {
                        n.phase = NodePhase::River;
                        n.phase_time = 0.0;
                    }
                }
                NodePhase::River => {
                    n.x -= RIVER_SPEED * dt;
                    n.y = river[n.river_row_index % RIVER_ROWS];
                    if n.x < -n.river_width {
                        n.phase = NodePhase::Constellation;
                        n.phase_time = 0.0;
                        n.x = n.seed_x * w;
                        n.y = n.seed_y * h;
                    }
                }
            }
        }
    }

    /// Draw every node under a `[background, accent, text]` palette.
    pub fn draw(&self, canvas: &mut dyn Canvas2d, palette: &[Rgb; 3]) {
        let text = palette[2];
        for n in &self.nodes {
            let at = Point::new(n.x, n.y);
            match n.phase {
                NodePhase::Constellation => {
                    canvas.fill_circle(
                        at - Vec2::new(0.0, CONSTELLATION_SIZE),
                        2.0,
                        palette[1].with_alpha(n.base_opacity),
                    );
                    canvas.fill_text(
                        &n.text,
                        at,
                        CONSTELLATION_SIZE,
                        text.with_alpha(n.base_opacity),
                        TextAlign::Center,
                    );
                }
                NodePhase::Center => {
                    let color = text.with_alpha(1.0);
                    canvas.fill_text(&n.text, at, CENTER_SIZE, color, TextAlign::Center);
                }
                NodePhase::Transitioning => {
                    let k = (n.phase_time / TRANSITION_S).clamp(0.0, 1.0);
                    let size = lerp(CENTER_SIZE, RIVER_SIZE, k);
                    let color = text.with_alpha(1.0 - 0.2 * k);
                    canvas.fill_text(&n.text, at, size, color, TextAlign::Center);
                }
                NodePhase::River => {
                    let color = text.with_alpha(0.8);
                    canvas.fill_text(&n.text, at, RIVER_SIZE, color, TextAlign::Left);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/constellation.rs"]
mod tests;
