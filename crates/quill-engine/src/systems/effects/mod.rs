//! Per-glyph visual effects: protocol, registry, and builtin effects.
//!
//! An effect is a time-driven transform bound to a glyph index range. Every
//! tick the reveal machine updates each active effect and lets it contribute
//! offset/scale/rotation/color to the glyphs it covers, through a `GlyphSlots`
//! view. Effects never touch the canonical text.

mod gradient;
mod rng;
mod shake;
mod wave;

pub use gradient::GradientEffect;
pub use rng::Rng;
pub use shake::ShakeEffect;
pub use wave::WaveEffect;

use std::fmt;

use glam::Vec2;

use crate::core::color::Rgba;
use crate::core::glyph::Glyph;
use crate::core::layout::Layout;

/// Mutable view over one tick's per-glyph transform slots.
///
/// Offsets and sizing hold two floats per glyph (x then y); rotations one
/// degree value per glyph. Recoloring substitutes the glyph in the working
/// layout. Out-of-range indices are ignored.
pub struct GlyphSlots<'a> {
    offsets: &'a mut [f32],
    sizing: &'a mut [f32],
    rotations: &'a mut [f32],
    working: &'a mut Layout,
}

impl<'a> GlyphSlots<'a> {
    pub(crate) fn new(
        offsets: &'a mut [f32],
        sizing: &'a mut [f32],
        rotations: &'a mut [f32],
        working: &'a mut Layout,
    ) -> Self {
        Self {
            offsets,
            sizing,
            rotations,
            working,
        }
    }

    /// The working-layout glyph at a flat index.
    pub fn glyph(&self, index: usize) -> Option<Glyph> {
        self.working.get(index)
    }

    /// Line height of the line containing the glyph (0 when out of range).
    pub fn line_height(&self, index: usize) -> f32 {
        self.working
            .location_of(index)
            .map(|(line, _)| self.working.lines[line].height)
            .unwrap_or(0.0)
    }

    /// Add to a glyph's draw offset.
    pub fn translate(&mut self, index: usize, delta: Vec2) {
        if let Some(slot) = self.offsets.get_mut(index * 2..index * 2 + 2) {
            slot[0] += delta.x;
            slot[1] += delta.y;
        }
    }

    /// Multiply a glyph's size factors.
    pub fn scale(&mut self, index: usize, factor: Vec2) {
        if let Some(slot) = self.sizing.get_mut(index * 2..index * 2 + 2) {
            slot[0] *= factor.x;
            slot[1] *= factor.y;
        }
    }

    /// Add to a glyph's rotation, in degrees around its center.
    pub fn rotate(&mut self, index: usize, degrees: f32) {
        if let Some(slot) = self.rotations.get_mut(index) {
            *slot += degrees;
        }
    }

    /// Substitute the working-layout glyph's color.
    pub fn recolor(&mut self, index: usize, color: Rgba) {
        if let Some(glyph) = self.working.get(index) {
            self.working.set(index, glyph.with_color(color));
        }
    }
}

/// A polymorphic unit of time-driven glyph transformation.
pub trait Effect: fmt::Debug {
    /// Advance internal phase/timers.
    fn update(&mut self, dt: f32);

    /// Contribute this effect's transform for one covered glyph.
    /// `local_index` is relative to the effect's start glyph.
    fn apply(
        &mut self,
        glyph: Glyph,
        local_index: usize,
        global_index: usize,
        dt: f32,
        slots: &mut GlyphSlots<'_>,
    );

    /// Finished effects are evicted from the active set.
    fn is_finished(&self) -> bool {
        false
    }
}

/// An effect bound to a glyph index range, tagged with its registry kind.
///
/// `index_end == -1` means open: the effect extends to the reveal cursor until
/// a matching end token (or completion) closes it.
#[derive(Debug)]
pub struct ActiveEffect {
    /// Uppercase start-token name; end tokens match by tag equality.
    pub kind: String,
    /// First covered glyph, inclusive.
    pub index_start: i32,
    /// Last covered glyph, inclusive; -1 while open.
    pub index_end: i32,
    pub effect: Box<dyn Effect>,
}

impl ActiveEffect {
    pub fn new(kind: impl Into<String>, effect: Box<dyn Effect>) -> Self {
        Self {
            kind: kind.into(),
            index_start: 0,
            index_end: -1,
            effect,
        }
    }

    pub fn is_open(&self) -> bool {
        self.index_end < 0
    }

    pub fn close_at(&mut self, index: i32) {
        self.index_end = index;
    }
}

/// Builds an effect from its positional token parameters.
pub type EffectBuilder = fn(&[&str]) -> Box<dyn Effect>;

#[derive(Debug, Clone)]
struct EffectEntry {
    start: String,
    end: String,
    build: EffectBuilder,
}

/// Maps effect token names to builders.
///
/// Explicitly constructed and cloned into each label; treat as immutable once
/// labels are running.
#[derive(Debug, Clone, Default)]
pub struct EffectRegistry {
    entries: Vec<EffectEntry>,
}

impl EffectRegistry {
    /// An empty registry (no effect tokens recognized).
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the builtin effects:
    /// `GRADIENT`/`ENDGRADIENT`, `WAVE`/`ENDWAVE`, `SHAKE`/`ENDSHAKE`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("GRADIENT", "ENDGRADIENT", |p| {
            Box::new(GradientEffect::from_params(p))
        });
        registry.register("WAVE", "ENDWAVE", |p| Box::new(WaveEffect::from_params(p)));
        registry.register("SHAKE", "ENDSHAKE", |p| Box::new(ShakeEffect::from_params(p)));
        registry
    }

    /// Register an effect under a start/end token pair (names uppercased).
    /// Re-registering a start name replaces the previous entry.
    pub fn register(&mut self, start: &str, end: &str, build: EffectBuilder) {
        let start = start.to_uppercase();
        self.entries.retain(|e| e.start != start);
        self.entries.push(EffectEntry {
            start,
            end: end.to_uppercase(),
            build,
        });
    }

    /// Remove the effect registered under a start token name.
    pub fn unregister(&mut self, start: &str) {
        let start = start.to_uppercase();
        self.entries.retain(|e| e.start != start);
    }

    /// Build an effect for a recognized start token, tagged with its kind.
    pub fn build_start(&self, name: &str, params: &[&str]) -> Option<ActiveEffect> {
        self.entries
            .iter()
            .find(|e| e.start == name)
            .map(|e| ActiveEffect::new(e.start.clone(), (e.build)(params)))
    }

    /// The kind tag closed by a recognized end token.
    pub fn end_kind(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.end == name)
            .map(|e| e.start.as_str())
    }
}

/// Positional float parameter with fallback. Absent, empty, or malformed
/// parameters fall back to the default.
pub fn param_f32(params: &[&str], index: usize, default: f32) -> f32 {
    match params.get(index).map(|p| p.trim()).filter(|p| !p.is_empty()) {
        Some(text) => text.parse().unwrap_or_else(|_| {
            log::warn!("bad float effect parameter {:?}, using {}", text, default);
            default
        }),
        None => default,
    }
}

/// Positional color parameter with fallback.
pub fn param_color(params: &[&str], index: usize, default: Rgba) -> Rgba {
    match params.get(index).map(|p| p.trim()).filter(|p| !p.is_empty()) {
        Some(text) => Rgba::parse(text).unwrap_or_else(|| {
            log::warn!("bad color effect parameter {:?}", text);
            default
        }),
        None => default,
    }
}

/// Phase in [0, 1) that advances with `total_time / period` plus an offset,
/// wrapping indefinitely. A non-positive period pins the phase at 0.
pub(crate) fn looping_progress(total_time: f32, period: f32, offset: f32) -> f32 {
    if period <= 0.0 {
        return 0.0;
    }
    (total_time / period + offset).rem_euclid(1.0)
}
