//! Glyph layout storage and the text-layout collaborator seam.
//!
//! A `Layout` owns an ordered list of `Line`s, each an ordered list of glyphs
//! plus cached metrics. Layouts are populated by a `TextLayouter` from a clean
//! (directive-free) string; the reveal machine keeps two of them per label:
//! the canonical layout with the full text and a working duplicate that grows
//! as glyphs are revealed.

use super::color::Rgba;
use super::glyph::Glyph;

/// One laid-out line: glyphs plus cached metrics.
#[derive(Debug, Clone, Default)]
pub struct Line {
    pub glyphs: Vec<Glyph>,
    pub width: f32,
    pub height: f32,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }
}

/// An ordered sequence of lines with aggregate metrics.
#[derive(Debug, Clone)]
pub struct Layout {
    pub lines: Vec<Line>,
    pub base_color: Rgba,
    width: f32,
    height: f32,
    target_width: f32,
}

impl Layout {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            base_color: Rgba::WHITE,
            width: 0.0,
            height: 0.0,
            target_width: 0.0,
        }
    }

    /// Remove all lines and reset metrics. Base color and target width persist.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.width = 0.0;
        self.height = 0.0;
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Start a new empty line and return a mutable reference to it.
    pub fn push_line(&mut self) -> &mut Line {
        self.lines.push(Line::new());
        self.lines.last_mut().unwrap()
    }

    /// Append a glyph to the last line, creating one if the layout is empty.
    pub fn add(&mut self, glyph: Glyph) {
        if self.lines.is_empty() {
            self.push_line();
        }
        self.lines.last_mut().unwrap().glyphs.push(glyph);
    }

    /// Total number of glyphs across all lines.
    pub fn glyph_count(&self) -> usize {
        self.lines.iter().map(|l| l.glyphs.len()).sum()
    }

    /// Glyph at a flat index spanning line boundaries.
    pub fn get(&self, index: usize) -> Option<Glyph> {
        let mut index = index;
        for line in &self.lines {
            if index < line.glyphs.len() {
                return Some(line.glyphs[index]);
            }
            index -= line.glyphs.len();
        }
        None
    }

    /// Replace the glyph at a flat index. Returns false when out of range.
    pub fn set(&mut self, index: usize, glyph: Glyph) -> bool {
        let mut index = index;
        for line in &mut self.lines {
            if index < line.glyphs.len() {
                line.glyphs[index] = glyph;
                return true;
            }
            index -= line.glyphs.len();
        }
        false
    }

    /// Map a flat glyph index to (line index, column within line).
    pub fn location_of(&self, index: usize) -> Option<(usize, usize)> {
        let mut index = index;
        for (li, line) in self.lines.iter().enumerate() {
            if index < line.glyphs.len() {
                return Some((li, index));
            }
            index -= line.glyphs.len();
        }
        None
    }

    /// Recompute aggregate width/height from the per-line metrics.
    pub fn recalculate_size(&mut self) {
        self.width = self.lines.iter().map(|l| l.width).fold(0.0, f32::max);
        self.height = self.lines.iter().map(|l| l.height).sum();
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Wrap target width; 0 disables wrapping.
    pub fn target_width(&self) -> f32 {
        self.target_width
    }

    pub fn set_target_width(&mut self, width: f32) {
        self.target_width = width.max(0.0);
    }

    /// The laid-out text, line breaks included.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.glyph_count());
        for line in &self.lines {
            for glyph in &line.glyphs {
                out.push(glyph.character());
            }
        }
        out
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}

/// Lays a clean string out into a `Layout`.
///
/// Implementations populate lines, glyphs, and per-line metrics, honor the
/// layout's target width for soft wrapping, and must be re-invocable when the
/// target width changes. Every char of the input produces exactly one glyph;
/// `'\n'` produces a zero-advance line-break glyph that terminates its line.
pub trait TextLayouter {
    fn layout_text(&mut self, text: &str, layout: &mut Layout);
}

/// Fixed-advance reference layouter for grid-atlas fonts.
#[derive(Debug, Clone)]
pub struct MonospaceLayouter {
    /// Glyph cell width in world units.
    pub cell_width: f32,
    /// Glyph cell height in world units (one line of text).
    pub cell_height: f32,
    /// Horizontal advance as a fraction of cell width.
    pub spacing: f32,
}

impl Default for MonospaceLayouter {
    fn default() -> Self {
        Self {
            cell_width: 16.0,
            cell_height: 16.0,
            spacing: 0.55,
        }
    }
}

impl MonospaceLayouter {
    pub fn new(cell_width: f32, cell_height: f32) -> Self {
        Self {
            cell_width,
            cell_height,
            ..Default::default()
        }
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    /// Horizontal advance per glyph.
    pub fn advance(&self) -> f32 {
        self.cell_width * self.spacing
    }
}

impl TextLayouter for MonospaceLayouter {
    fn layout_text(&mut self, text: &str, layout: &mut Layout) {
        layout.clear();
        let advance = self.advance();
        let target = layout.target_width();
        let base_color = layout.base_color;

        let mut line = Line::new();
        line.height = self.cell_height;
        for ch in text.chars() {
            if ch == '\n' {
                line.glyphs.push(Glyph::new('\n', base_color));
                layout.lines.push(std::mem::take(&mut line));
                line.height = self.cell_height;
                continue;
            }
            if target > 0.0 && !line.glyphs.is_empty() && line.width + advance > target {
                layout.lines.push(std::mem::take(&mut line));
                line.height = self.cell_height;
            }
            line.glyphs.push(Glyph::new(ch, base_color));
            line.width += advance;
        }
        layout.lines.push(line);
        layout.recalculate_size();
    }
}
