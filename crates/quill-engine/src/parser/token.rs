//! Parsed directive tokens.

use crate::systems::effects::ActiveEffect;

/// The directive classes the reveal machine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCategory {
    Speed,
    Wait,
    Event,
    Reset,
    EffectStart,
    EffectEnd,
}

/// Directive payload, tagged by what it carries.
#[derive(Debug)]
pub enum TokenPayload {
    /// New seconds-per-char value; negative selects natural jitter mode.
    Speed(f32),
    /// Seconds added to the reveal cooldown.
    Wait(f32),
    /// Listener event name.
    Event(String),
    /// Restore default speed and close open effects.
    Reset,
    /// Effect to activate at the cursor.
    EffectStart(ActiveEffect),
    /// Kind tag of the effect(s) to close.
    EffectEnd(String),
}

/// One parsed directive, anchored to the raw text stream.
///
/// `raw_index` is the char position of the opening brace in the
/// directive-bearing text; `end_index` is one past the closing brace. Entries
/// fire when the raw cursor reaches `raw_index` and jump it to `end_index`.
#[derive(Debug)]
pub struct TokenEntry {
    pub raw_index: i32,
    pub end_index: i32,
    pub payload: TokenPayload,
}

impl TokenEntry {
    pub fn category(&self) -> TokenCategory {
        match self.payload {
            TokenPayload::Speed(_) => TokenCategory::Speed,
            TokenPayload::Wait(_) => TokenCategory::Wait,
            TokenPayload::Event(_) => TokenCategory::Event,
            TokenPayload::Reset => TokenCategory::Reset,
            TokenPayload::EffectStart(_) => TokenCategory::EffectStart,
            TokenPayload::EffectEnd(_) => TokenCategory::EffectEnd,
        }
    }
}
