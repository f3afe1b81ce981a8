//! Grid-atlas font description for the render adapter.
//!
//! A font atlas is a grid of glyph cells laid out in ASCII order, typically
//! 16 columns x 6 rows covering printable ASCII (32-127). The grid is an
//! explicit value handed to the buffer builder; there is no implicit font
//! catalog.

/// Describes a grid font atlas and its cell metrics.
#[derive(Debug, Clone)]
pub struct FontGrid {
    /// Which texture atlas holds the glyph cells.
    pub atlas: u32,
    /// Number of columns in the atlas grid.
    pub cols: u32,
    /// Number of rows in the atlas grid.
    pub rows: u32,
    /// First ASCII code in the atlas (typically 32 = space).
    pub start_char: u8,
    /// Rendered cell width in world units.
    pub cell_width: f32,
    /// Rendered cell height in world units.
    pub cell_height: f32,
    /// Horizontal advance as a fraction of cell width.
    pub spacing: f32,
}

impl Default for FontGrid {
    fn default() -> Self {
        Self {
            atlas: 0,
            cols: 16,
            rows: 6,
            start_char: 32,
            cell_width: 16.0,
            cell_height: 16.0,
            spacing: 0.55,
        }
    }
}

impl FontGrid {
    pub fn new(atlas: u32) -> Self {
        Self {
            atlas,
            ..Default::default()
        }
    }

    pub fn with_grid(mut self, cols: u32, rows: u32) -> Self {
        self.cols = cols;
        self.rows = rows;
        self
    }

    pub fn with_cell_size(mut self, width: f32, height: f32) -> Self {
        self.cell_width = width;
        self.cell_height = height;
        self
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    /// Horizontal advance per glyph.
    pub fn advance(&self) -> f32 {
        self.cell_width * self.spacing
    }

    /// Atlas cell (col, row) for a character, or `None` when the font
    /// does not cover it.
    pub fn cell_of(&self, ch: char) -> Option<(f32, f32)> {
        let code = ch as u32;
        let start = self.start_char as u32;
        if code < start {
            return None;
        }
        let index = code - start;
        if index >= self.cols * self.rows {
            return None;
        }
        Some(((index % self.cols) as f32, (index / self.cols) as f32))
    }
}
