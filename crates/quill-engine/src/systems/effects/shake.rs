//! Shake effect: deterministic per-glyph position jitter.

use glam::Vec2;

use super::rng::Rng;
use super::{param_f32, Effect, GlyphSlots};
use crate::core::glyph::Glyph;

/// Jitters each covered glyph around its rest position. The jitter is resampled
/// in discrete time buckets from an `Rng` seeded by glyph index and bucket, so
/// a replay with the same deltas shakes identically. Loops indefinitely.
///
/// Parameters (positional, all optional):
/// 1. distance: jitter radius as a fraction of line height (default 1)
/// 2. intensity: resample rate multiplier (default 1)
#[derive(Debug, Clone)]
pub struct ShakeEffect {
    distance: f32,
    intensity: f32,
    total_time: f32,
}

impl ShakeEffect {
    /// Jitter radius as a fraction of line height at distance 1.
    const BASE_RADIUS: f32 = 0.12;
    /// Resamples per second at intensity 1.
    const BASE_RATE: f32 = 16.0;

    pub fn from_params(params: &[&str]) -> Self {
        Self {
            distance: param_f32(params, 0, 1.0),
            intensity: param_f32(params, 1, 1.0).max(0.001),
            total_time: 0.0,
        }
    }

    fn jitter_at(&self, global_index: usize, line_height: f32) -> Vec2 {
        let bucket = (self.total_time * Self::BASE_RATE * self.intensity) as u64;
        let mut rng = Rng::seeded_from(global_index as u64, bucket);
        let radius = line_height * Self::BASE_RADIUS * self.distance;
        Vec2::new(
            rng.next_range(-radius, radius),
            rng.next_range(-radius, radius),
        )
    }
}

impl Effect for ShakeEffect {
    fn update(&mut self, dt: f32) {
        self.total_time += dt;
    }

    fn apply(
        &mut self,
        _glyph: Glyph,
        _local_index: usize,
        global_index: usize,
        _dt: f32,
        slots: &mut GlyphSlots<'_>,
    ) {
        let jitter = self.jitter_at(global_index, slots.line_height(global_index));
        slots.translate(global_index, jitter);
    }
}
