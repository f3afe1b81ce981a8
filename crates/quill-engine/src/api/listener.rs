//! The listener contract every host can plug into a label.

use crate::core::glyph::Glyph;

/// Callbacks fired by a label as its reveal progresses.
///
/// All methods default to no-ops, so hosts implement only what they need; a
/// label without a listener silently skips notifications.
pub trait TypingListener {
    /// A glyph was just revealed.
    fn on_char(&mut self, glyph: Glyph) {
        let _ = glyph;
    }

    /// An `{EVENT=name}` directive fired.
    fn event(&mut self, name: &str) {
        let _ = name;
    }

    /// The reveal reached the end of the text.
    fn end(&mut self) {}

    /// Resolve a `{VAR=name}` directive the label itself cannot.
    /// Names arrive uppercased. Return `None` to leave it unresolved.
    fn replace_variable(&mut self, name: &str) -> Option<String> {
        let _ = name;
        None
    }
}
