//! Gradient effect: tints covered glyphs along a moving two-color ramp.

use super::{looping_progress, param_color, param_f32, Effect, GlyphSlots};
use crate::core::color::Rgba;
use crate::core::glyph::Glyph;

/// Interpolates each glyph's color between two endpoints, phased by glyph
/// position and time. Loops indefinitely; only an end token or reveal
/// completion closes it.
///
/// Parameters (positional, all optional):
/// 1. first color (default white)
/// 2. second color (default white)
/// 3. distance: spacing of the ramp across glyphs (default 1)
/// 4. frequency: ramp cycles per unit time (default 1)
#[derive(Debug, Clone)]
pub struct GradientEffect {
    color1: Rgba,
    color2: Rgba,
    distance: f32,
    frequency: f32,
    total_time: f32,
}

impl GradientEffect {
    const DEFAULT_DISTANCE: f32 = 0.975;
    const DEFAULT_FREQUENCY: f32 = 2.0;

    pub fn from_params(params: &[&str]) -> Self {
        Self {
            color1: param_color(params, 0, Rgba::WHITE),
            color2: param_color(params, 1, Rgba::WHITE),
            distance: param_f32(params, 2, 1.0).max(0.001),
            frequency: param_f32(params, 3, 1.0).max(0.001),
            total_time: 0.0,
        }
    }

    pub fn new(color1: Rgba, color2: Rgba) -> Self {
        Self {
            color1,
            color2,
            distance: 1.0,
            frequency: 1.0,
            total_time: 0.0,
        }
    }

    fn progress_at(&self, local_index: usize) -> f32 {
        let distance_mod = (1.0 / self.distance) * (1.0 - Self::DEFAULT_DISTANCE);
        let period = (1.0 / self.frequency) * Self::DEFAULT_FREQUENCY;
        looping_progress(self.total_time, period, distance_mod * local_index as f32)
    }
}

impl Effect for GradientEffect {
    fn update(&mut self, dt: f32) {
        self.total_time += dt;
    }

    fn apply(
        &mut self,
        _glyph: Glyph,
        local_index: usize,
        global_index: usize,
        _dt: f32,
        slots: &mut GlyphSlots<'_>,
    ) {
        let progress = self.progress_at(local_index);
        slots.recolor(global_index, Rgba::lerp(self.color1, self.color2, progress));
    }
}
