pub mod api;
pub mod core;
pub mod parser;
pub mod renderer;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::listener::TypingListener;
pub use core::color::Rgba;
pub use core::config::RevealConfig;
pub use core::glyph::Glyph;
pub use core::layout::{Layout, Line, MonospaceLayouter, TextLayouter};
pub use parser::token::{TokenCategory, TokenEntry, TokenPayload};
pub use renderer::font::FontGrid;
pub use renderer::instance::{GlyphBuffer, GlyphInstance};
pub use systems::effects::{
    ActiveEffect, Effect, EffectBuilder, EffectRegistry, GlyphSlots, GradientEffect, Rng,
    ShakeEffect, WaveEffect,
};
pub use systems::reveal::{natural_jitter, TypingLabel};
