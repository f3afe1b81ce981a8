use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::renderer::font::FontGrid;
use crate::systems::reveal::TypingLabel;

/// Per-glyph render data, 8 floats = 32 bytes stride, shareable with any
/// host renderer as a raw float slice.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct GlyphInstance {
    /// X position in world space (pen position plus effect offset).
    pub x: f32,
    /// Y position in world space.
    pub y: f32,
    /// Rotation in radians around the glyph center.
    pub rotation: f32,
    /// Rendered width in world units (cell width times effect sizing).
    pub scale_x: f32,
    /// Rendered height in world units.
    pub scale_y: f32,
    /// Atlas column of the glyph cell.
    pub atlas_col: f32,
    /// Atlas row of the glyph cell.
    pub atlas_row: f32,
    /// Glyph color as RGBA8888 bits.
    pub color_bits: f32,
}

impl GlyphInstance {
    pub const FLOATS: usize = 8;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// Flat instance list for the revealed portion of a label.
///
/// Rebuild once per frame after `TypingLabel::advance`; the buffer walks the
/// working layout (revealed glyphs only) and bakes in the label's per-glyph
/// offset/sizing/rotation arrays.
pub struct GlyphBuffer {
    pub instances: Vec<GlyphInstance>,
}

impl GlyphBuffer {
    pub fn new() -> Self {
        Self {
            instances: Vec::with_capacity(256),
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// The instance data as a raw float slice (8 floats per instance).
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.instances)
    }

    /// Rebuild instances from a label's revealed glyphs.
    ///
    /// The pen starts at `origin` (top-left) and moves down one line height
    /// per line. Line-break glyphs and characters outside the font grid
    /// produce no instance; unmapped characters still advance the pen so
    /// spacing is preserved.
    pub fn rebuild(&mut self, label: &TypingLabel, font: &FontGrid, origin: Vec2) {
        self.instances.clear();
        let advance = font.advance();
        let mut pen_y = origin.y;
        let mut index = 0usize;

        for line in &label.working_layout().lines {
            let mut pen_x = origin.x;
            for glyph in &line.glyphs {
                let gi = index;
                index += 1;
                if glyph.is_line_break() {
                    continue;
                }
                let Some((col, row)) = font.cell_of(glyph.character()) else {
                    pen_x += advance;
                    continue;
                };
                let off_x = label.offsets.get(gi * 2).copied().unwrap_or(0.0);
                let off_y = label.offsets.get(gi * 2 + 1).copied().unwrap_or(0.0);
                let size_x = label.sizing.get(gi * 2).copied().unwrap_or(1.0);
                let size_y = label.sizing.get(gi * 2 + 1).copied().unwrap_or(1.0);
                let rotation = label.rotations.get(gi).copied().unwrap_or(0.0);

                self.instances.push(GlyphInstance {
                    x: pen_x + off_x,
                    y: pen_y + off_y,
                    rotation: rotation.to_radians(),
                    scale_x: font.cell_width * size_x,
                    scale_y: font.cell_height * size_y,
                    atlas_col: col,
                    atlas_row: row,
                    color_bits: f32::from_bits(glyph.color().0),
                });
                pen_x += advance;
            }
            pen_y += line.height;
        }
    }
}

impl Default for GlyphBuffer {
    fn default() -> Self {
        Self::new()
    }
}
