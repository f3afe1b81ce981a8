//! Wave effect: a vertical sine ripple traveling through the glyph range.

use std::f32::consts::TAU;

use glam::Vec2;

use super::{param_f32, Effect, GlyphSlots};
use crate::core::glyph::Glyph;

/// Offsets each covered glyph vertically along a traveling sine wave.
/// Loops indefinitely.
///
/// Parameters (positional, all optional):
/// 1. distance: phase spacing between adjacent glyphs (default 1)
/// 2. frequency: wave cycles per second (default 1)
/// 3. intensity: amplitude as a fraction of line height (default 1)
#[derive(Debug, Clone)]
pub struct WaveEffect {
    distance: f32,
    frequency: f32,
    intensity: f32,
    total_time: f32,
}

impl WaveEffect {
    /// Base amplitude as a fraction of line height at intensity 1.
    const BASE_AMPLITUDE: f32 = 0.25;
    /// Base phase step between adjacent glyphs at distance 1.
    const BASE_STEP: f32 = 0.2;

    pub fn from_params(params: &[&str]) -> Self {
        Self {
            distance: param_f32(params, 0, 1.0),
            frequency: param_f32(params, 1, 1.0).max(0.001),
            intensity: param_f32(params, 2, 1.0),
            total_time: 0.0,
        }
    }

    /// Vertical offset for a glyph, given the height of its line.
    fn offset_at(&self, local_index: usize, line_height: f32) -> f32 {
        let phase =
            self.total_time * self.frequency - local_index as f32 * self.distance * Self::BASE_STEP;
        (phase * TAU).sin() * line_height * Self::BASE_AMPLITUDE * self.intensity
    }
}

impl Effect for WaveEffect {
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
        let y = self.offset_at(local_index, slots.line_height(global_index));
        slots.translate(global_index, Vec2::new(0.0, y));
    }
}
