// systems/reveal.rs
//
// The reveal state machine. A TypingLabel owns the canonical layout (full
// text), a working duplicate that grows as glyphs reveal, the directive
// stack, the glyph cursor, and the active effect set, and advances all of it
// from per-frame delta time.
//
// Usage:
//   let mut label = TypingLabel::new("Hi {VAR=NAME}!{WAIT=0.5} Ready?");
//   label.set_variable("name", "Ada");
//   loop { label.advance(dt); /* draw label.working_layout() */ }

use std::collections::HashMap;

use crate::api::listener::TypingListener;
use crate::core::config::RevealConfig;
use crate::core::layout::{Layout, MonospaceLayouter, TextLayouter};
use crate::parser::scan::{self, ParseOutcome};
use crate::parser::token::{TokenEntry, TokenPayload};
use crate::systems::effects::{ActiveEffect, EffectRegistry, GlyphSlots};

/// Deterministic jitter multiplier for natural typing mode, in [-2.4, -0.4).
/// Multiplied by a negative `text_speed` it spreads the per-char interval over
/// 0.4x-2.4x of its base value. Pure function of the glyph index, so a replay
/// types with identical rhythm.
pub fn natural_jitter(glyph_index: i32) -> f32 {
    let seed = (glyph_index as i64 as u64) ^ 0x9E37_79B9_7F4A_7C15;
    let bits = (seed.wrapping_mul(0xD1B5_4A32_D192_ED03) >> 41) as u32;
    f32::from_bits(bits | 0x4000_0000) - 4.4
}

/// Progressive text reveal over an annotated string.
///
/// Construct with the annotated text, then call [`advance`](Self::advance)
/// once per frame. The revealed glyphs live in the working layout; per-glyph
/// draw transforms accumulate in [`offsets`](Self::offsets),
/// [`sizing`](Self::sizing), and [`rotations`](Self::rotations).
pub struct TypingLabel {
    // Collections
    variables: HashMap<String, String>,
    /// Descending raw-index order; the tail is always the next entry due.
    token_entries: Vec<TokenEntry>,
    active_effects: Vec<ActiveEffect>,

    // Collaborators
    config: RevealConfig,
    registry: EffectRegistry,
    layouter: Box<dyn TextLayouter>,
    listener: Option<Box<dyn TypingListener>>,

    // Text snapshots (owned, swapped on write)
    original_text: String,
    intermediate_text: String,
    clean_text: String,
    default_token: String,

    // Layouts
    layout: Layout,
    working_layout: Layout,

    /// Two floats per glyph: x then y draw offset.
    pub offsets: Vec<f32>,
    /// Two floats per glyph: x then y size multiplier.
    pub sizing: Vec<f32>,
    /// One float per glyph: rotation in degrees around the glyph center.
    pub rotations: Vec<f32>,

    // Cursor state
    text_speed: f32,
    char_cooldown: f32,
    /// Last consumed index into the intermediate text (directives included).
    raw_char_index: i32,
    /// Last revealed glyph index (renderable chars only).
    glyph_char_index: i32,
    glyph_char_compensation: i32,
    parsed: bool,
    paused: bool,
    ended: bool,
    skipping: bool,
    ignoring_events: bool,
    ignoring_effects: bool,
}

impl TypingLabel {
    pub fn new(text: &str) -> Self {
        Self::with_config(text, RevealConfig::default())
    }

    pub fn with_config(text: &str, config: RevealConfig) -> Self {
        let text_speed = config.default_speed_per_char;
        Self {
            variables: HashMap::new(),
            token_entries: Vec::new(),
            active_effects: Vec::new(),
            config,
            registry: EffectRegistry::with_builtins(),
            layouter: Box::new(MonospaceLayouter::default()),
            listener: None,
            original_text: text.to_string(),
            intermediate_text: String::new(),
            clean_text: String::new(),
            default_token: String::new(),
            layout: Layout::new(),
            working_layout: Layout::new(),
            offsets: Vec::new(),
            sizing: Vec::new(),
            rotations: Vec::new(),
            text_speed,
            char_cooldown: 0.0,
            raw_char_index: -1,
            glyph_char_index: -1,
            glyph_char_compensation: 0,
            parsed: false,
            paused: false,
            ended: false,
            skipping: false,
            ignoring_events: false,
            ignoring_effects: false,
        }
    }

    /// Replace the effect registry (before the first advance).
    pub fn with_registry(mut self, registry: EffectRegistry) -> Self {
        self.registry = registry;
        self.parsed = false;
        self
    }

    /// Replace the text layouter (before the first advance).
    pub fn with_layouter(mut self, layouter: Box<dyn TextLayouter>) -> Self {
        self.layouter = layouter;
        self.parsed = false;
        self
    }

    // -- Text handling --

    /// Replace the text and restart the reveal. A label that had already
    /// ended stays fully revealed (skips the new text silently).
    pub fn set_text(&mut self, text: &str) {
        let had_ended = self.ended;
        self.restart_with(text);
        if had_ended {
            self.skip_to_end(true, false);
        }
    }

    /// Reset all reveal state and re-parse the stored original text.
    pub fn restart(&mut self) {
        self.reset_state();
        self.parse_tokens();
    }

    /// Restart with new text substituted for the original.
    pub fn restart_with(&mut self, text: &str) {
        self.original_text = text.to_string();
        self.restart();
    }

    fn reset_state(&mut self) {
        self.token_entries.clear();
        self.active_effects.clear();
        self.working_layout.clear();
        self.offsets.clear();
        self.sizing.clear();
        self.rotations.clear();
        self.text_speed = self.config.default_speed_per_char;
        self.char_cooldown = 0.0;
        self.raw_char_index = -1;
        self.glyph_char_index = -1;
        self.glyph_char_compensation = 0;
        self.parsed = false;
        self.paused = false;
        self.ended = false;
        self.skipping = false;
        self.ignoring_events = false;
        self.ignoring_effects = false;
    }

    /// Parse the annotated text: expand variables, scan directives, lay out
    /// the clean text. Runs lazily from `advance` when needed.
    pub fn parse_tokens(&mut self) {
        let source = format!("{{NORMAL}}{}{}", self.default_token, self.original_text);

        let variables = &self.variables;
        let globals = &self.config.global_vars;
        let listener = &mut self.listener;
        let mut resolve = |name: &str| {
            variables
                .get(name)
                .cloned()
                .or_else(|| globals.get(name).cloned())
                .or_else(|| listener.as_mut().and_then(|l| l.replace_variable(name)))
        };
        let expanded = scan::expand_variables(&source, &mut resolve);

        let ParseOutcome { clean, mut entries } =
            scan::parse(&expanded, &self.config, &self.registry);
        // Ascending from the scanner; stored descending so the tail pops in
        // firing order.
        entries.reverse();
        self.token_entries = entries;
        self.intermediate_text = expanded;
        self.clean_text = clean;

        self.layouter.layout_text(&self.clean_text, &mut self.layout);
        self.working_layout.base_color = self.layout.base_color;
        self.working_layout.clear();
        self.sync_working_layout();
        self.parsed = true;
    }

    // -- Reveal control --

    /// Force the reveal to drain on the next `advance`.
    /// `ignore_events` suppresses `{EVENT}` callbacks while draining;
    /// `ignore_effects` instantly cancels all active effects.
    pub fn skip_to_end(&mut self, ignore_events: bool, ignore_effects: bool) {
        self.skipping = true;
        self.ignoring_events = ignore_events;
        self.ignoring_effects = ignore_effects;
    }

    /// Restore normal progression after `skip_to_end`.
    pub fn cancel_skip(&mut self) {
        if self.skipping {
            self.skipping = false;
            self.ignoring_events = false;
            self.ignoring_effects = false;
        }
    }

    /// Halt cursor movement. Effects keep animating while paused.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_skipping(&self) -> bool {
        self.skipping
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }

    // -- Variables / listener --

    /// Register a replacement for `{VAR=name}`. Names are uppercased.
    pub fn set_variable(&mut self, name: &str, value: &str) {
        self.variables
            .insert(name.to_uppercase(), value.to_string());
    }

    /// Replace all registered variables.
    pub fn set_variables(&mut self, variables: &HashMap<String, String>) {
        self.variables.clear();
        for (name, value) in variables {
            self.variables.insert(name.to_uppercase(), value.clone());
        }
    }

    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    /// Token text inserted after `{NORMAL}` before the text on every parse.
    pub fn set_default_token(&mut self, token: &str) {
        self.default_token = token.to_string();
        self.parsed = false;
    }

    pub fn set_listener(&mut self, listener: Box<dyn TypingListener>) {
        self.listener = Some(listener);
    }

    pub fn take_listener(&mut self) -> Option<Box<dyn TypingListener>> {
        self.listener.take()
    }

    /// Fire an event by name. `always` bypasses the skip-mode suppression.
    pub fn trigger_event(&mut self, event: &str, always: bool) {
        if always || !self.ignoring_events {
            if let Some(listener) = self.listener.as_mut() {
                listener.event(event);
            }
        }
    }

    // -- Accessors --

    /// The canonical layout holding the full, final text.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The in-progress layout holding only revealed glyphs.
    pub fn working_layout(&self) -> &Layout {
        &self.working_layout
    }

    /// Index of the last revealed glyph (-1 before the first).
    pub fn glyph_index(&self) -> i32 {
        self.glyph_char_index
    }

    /// Index of the last consumed raw char in the intermediate text.
    pub fn raw_index(&self) -> i32 {
        self.raw_char_index
    }

    /// Current seconds-per-char; negative while in natural mode.
    pub fn text_speed(&self) -> f32 {
        self.text_speed
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    /// The display string after directive stripping.
    pub fn clean_text(&self) -> &str {
        &self.clean_text
    }

    /// The directive-bearing stream the raw cursor walks: reset prefix plus
    /// default token plus original text, variables expanded.
    pub fn intermediate_text(&self) -> &str {
        &self.intermediate_text
    }

    /// The currently revealed text.
    pub fn visible_text(&self) -> String {
        self.working_layout.to_text()
    }

    pub fn active_effect_count(&self) -> usize {
        self.active_effects.len()
    }

    /// Re-wrap both layouts to a new target width. The revealed glyph count
    /// is preserved (wrapping only redistributes glyphs across lines).
    pub fn set_target_width(&mut self, width: f32) {
        self.layout.set_target_width(width);
        self.working_layout.set_target_width(width);
        if self.parsed {
            self.layouter.layout_text(&self.clean_text, &mut self.layout);
            self.working_layout.clear();
            self.sync_working_layout();
        }
    }

    /// Queue a symmetric cursor correction: each pending step moves the glyph
    /// cursor one glyph (forward when positive, back when negative) in place
    /// of a reveal, consuming one cooldown interval.
    pub(crate) fn add_glyph_compensation(&mut self, steps: i32) {
        self.glyph_char_compensation += steps;
    }

    // -- Core tick --

    /// Advance the reveal by `dt` seconds and refresh per-glyph transforms.
    /// Call once per frame.
    pub fn advance(&mut self, dt: f32) {
        if !self.parsed {
            self.parse_tokens();
        }

        if self.skipping || (!self.ended && !self.paused) {
            self.char_cooldown -= dt;
            if self.skipping || self.char_cooldown <= 0.0 {
                self.process_char_progression();
            }
        }

        self.layout.recalculate_size();
        self.working_layout.recalculate_size();

        // Identity transforms for every canonical glyph, rebuilt each tick.
        let glyph_count = self.layout.glyph_count();
        self.offsets.clear();
        self.offsets.resize(glyph_count * 2, 0.0);
        self.sizing.clear();
        self.sizing.resize(glyph_count * 2, 1.0);
        self.rotations.clear();
        self.rotations.resize(glyph_count, 0.0);

        if self.ignoring_effects {
            self.active_effects.clear();
            return;
        }

        // Apply effects in reverse insertion order: later effects layer over
        // earlier ones and finished entries can be removed while iterating.
        let cursor = self.glyph_char_index;
        let working_len = self.working_layout.glyph_count() as i32;
        let mut effects = std::mem::take(&mut self.active_effects);
        {
            let mut slots = GlyphSlots::new(
                &mut self.offsets,
                &mut self.sizing,
                &mut self.rotations,
                &mut self.working_layout,
            );
            for i in (0..effects.len()).rev() {
                effects[i].effect.update(dt);
                if effects[i].effect.is_finished() {
                    effects.remove(i);
                    continue;
                }
                // Closed before covering anything: nothing left to animate.
                if !effects[i].is_open() && effects[i].index_end < effects[i].index_start {
                    effects.remove(i);
                    continue;
                }
                let fx = &mut effects[i];
                let start = fx.index_start.max(0);
                let end = if fx.index_end >= 0 {
                    fx.index_end.min(cursor)
                } else {
                    cursor
                };
                let end = end.min(working_len - 1);
                let mut j = start;
                while j <= end {
                    if let Some(glyph) = slots.glyph(j as usize) {
                        let local = (j - fx.index_start).max(0) as usize;
                        fx.effect.apply(glyph, local, j as usize, dt, &mut slots);
                    }
                    j += 1;
                }
            }
        }
        self.active_effects = effects;
    }

    /// Consume due directives and reveal glyphs while the cooldown allows.
    fn process_char_progression(&mut self) {
        let mut char_counter: u32 = 0;

        while self.skipping || self.char_cooldown <= 0.0 {
            // A pending compensation step replaces a reveal.
            if self.glyph_char_compensation != 0 {
                if self.glyph_char_compensation > 0 {
                    self.glyph_char_index += 1;
                    self.glyph_char_compensation -= 1;
                } else {
                    self.glyph_char_index -= 1;
                    self.glyph_char_compensation += 1;
                }
                self.charge_interval(1.0);
                self.sync_working_layout();
                continue;
            }

            // Entries behind the raw cursor can only appear after a re-parse
            // mid-reveal; drop them rather than blocking the stack.
            while self
                .token_entries
                .last()
                .is_some_and(|e| e.raw_index <= self.raw_char_index)
            {
                let stale = self.token_entries.pop();
                log::debug!("dropping stale token entry {:?}", stale);
            }

            // Fire the directive anchored at the next raw position.
            if self
                .token_entries
                .last()
                .is_some_and(|e| e.raw_index == self.raw_char_index + 1)
            {
                let entry = self.token_entries.pop().unwrap();
                self.raw_char_index = entry.end_index - 1;
                match entry.payload {
                    TokenPayload::Speed(value) => {
                        self.text_speed = value;
                    }
                    TokenPayload::Wait(value) => {
                        self.char_cooldown += value;
                    }
                    TokenPayload::Event(name) => {
                        self.trigger_event(&name, false);
                    }
                    TokenPayload::Reset => {
                        self.text_speed = self.config.default_speed_per_char;
                        self.close_open_effects(None);
                    }
                    TokenPayload::EffectStart(mut fx) => {
                        // Starting a kind implicitly closes the open one.
                        let kind = fx.kind.clone();
                        self.close_open_effects(Some(&kind));
                        fx.index_start = self.glyph_char_index + 1;
                        self.active_effects.push(fx);
                    }
                    TokenPayload::EffectEnd(kind) => {
                        self.close_open_effects(Some(&kind));
                    }
                }
                continue;
            }

            // Completion.
            let layout_size = self.layout.glyph_count() as i32;
            if layout_size == 0 || self.glyph_char_index + 1 >= layout_size {
                self.skipping = false;
                if !self.ended {
                    self.ended = true;
                    self.close_open_effects(None);
                    self.sync_working_layout();
                    if let Some(listener) = self.listener.as_mut() {
                        listener.end();
                    }
                }
                break;
            }

            // Reveal one glyph.
            self.raw_char_index += 1;
            self.glyph_char_index += 1;
            let Some(revealed) = self.layout.get(self.glyph_char_index as usize) else {
                break;
            };
            let multiplier = self.config.interval_multiplier(revealed.character());
            self.charge_interval(multiplier);
            self.sync_working_layout();
            if let Some(listener) = self.listener.as_mut() {
                listener.on_char(revealed);
            }

            char_counter += 1;
            let limit = self.config.char_limit_per_tick;
            if !self.skipping && limit > 0 && char_counter >= limit {
                self.char_cooldown = self.char_cooldown.max(self.text_speed.abs());
                break;
            }
        }
    }

    fn charge_interval(&mut self, multiplier: f32) {
        if self.text_speed < 0.0 {
            self.char_cooldown +=
                self.text_speed * natural_jitter(self.glyph_char_index) * multiplier;
        } else {
            self.char_cooldown += self.text_speed * multiplier;
        }
    }

    /// Close open effects at the current cursor; `kind` restricts by tag.
    /// Closing keeps an effect alive for the glyphs it already covers.
    fn close_open_effects(&mut self, kind: Option<&str>) {
        let cursor = self.glyph_char_index;
        for fx in &mut self.active_effects {
            if fx.is_open() && kind.map_or(true, |k| fx.kind == k) {
                fx.close_at(cursor);
            }
        }
    }

    /// Grow or shrink the working layout so it holds exactly the revealed
    /// glyphs, mirroring the canonical line structure and metrics.
    fn sync_working_layout(&mut self) {
        let canonical_count = self.layout.glyph_count();
        let target = (self.glyph_char_index + 1).clamp(0, canonical_count as i32) as usize;

        let mut count = self.working_layout.glyph_count();
        while count < target {
            let Some((line_idx, _)) = self.layout.location_of(count) else {
                break;
            };
            let Some(glyph) = self.layout.get(count) else {
                break;
            };
            while self.working_layout.lines.len() <= line_idx {
                self.working_layout.push_line();
            }
            let canonical_line = &self.layout.lines[line_idx];
            let line = &mut self.working_layout.lines[line_idx];
            line.width = canonical_line.width;
            line.height = canonical_line.height;
            line.glyphs.push(glyph);
            count += 1;
        }
        while count > target {
            while self.working_layout.lines.len() > 1
                && self
                    .working_layout
                    .lines
                    .last()
                    .is_some_and(|l| l.glyphs.is_empty())
            {
                self.working_layout.lines.pop();
            }
            match self.working_layout.lines.last_mut() {
                Some(line) if !line.glyphs.is_empty() => {
                    line.glyphs.pop();
                    count -= 1;
                }
                _ => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::color::Rgba;
    use crate::core::glyph::Glyph;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recording {
        log: Rc<RefCell<Vec<String>>>,
    }

    struct RecordingListener {
        log: Rc<RefCell<Vec<String>>>,
        vars: HashMap<String, String>,
    }

    impl TypingListener for RecordingListener {
        fn on_char(&mut self, glyph: Glyph) {
            self.log
                .borrow_mut()
                .push(format!("char:{}", glyph.character()));
        }

        fn event(&mut self, name: &str) {
            self.log.borrow_mut().push(format!("event:{}", name));
        }

        fn end(&mut self) {
            self.log.borrow_mut().push("end".to_string());
        }

        fn replace_variable(&mut self, name: &str) -> Option<String> {
            self.vars.get(name).cloned()
        }
    }

    fn recorded_label(text: &str, speed: f32) -> (TypingLabel, Rc<RefCell<Vec<String>>>) {
        let recording = Recording::default();
        let log = recording.log.clone();
        let mut config = RevealConfig::default();
        config.default_speed_per_char = speed;
        let mut label = TypingLabel::with_config(text, config);
        label.set_listener(Box::new(RecordingListener {
            log: recording.log,
            vars: HashMap::new(),
        }));
        (label, log)
    }

    fn events_of(log: &Rc<RefCell<Vec<String>>>, prefix: &str) -> Vec<String> {
        log.borrow()
            .iter()
            .filter(|l| l.starts_with(prefix))
            .cloned()
            .collect()
    }

    #[test]
    fn hello_reveals_fully_in_one_advance() {
        let (mut label, log) = recorded_label("Hello", 0.05);
        label.advance(1.0);
        assert_eq!(label.visible_text(), "Hello");
        assert!(label.has_ended());
        assert_eq!(events_of(&log, "end").len(), 1);
        assert_eq!(events_of(&log, "char:").len(), 5);
    }

    #[test]
    fn wait_delays_the_next_glyph() {
        let (mut label, _log) = recorded_label("A{WAIT=1.0}B", 0.05);
        label.advance(0.05);
        assert_eq!(label.visible_text(), "A");
        assert!(!label.has_ended());
        label.advance(1.0);
        assert_eq!(label.visible_text(), "AB");
    }

    #[test]
    fn wait_does_not_change_which_glyph_is_next() {
        let (mut plain, plain_log) = recorded_label("AB", 0.05);
        let (mut waited, waited_log) = recorded_label("A{WAIT=0.3}B", 0.05);
        for _ in 0..40 {
            plain.advance(0.05);
            waited.advance(0.05);
        }
        assert!(plain.has_ended() && waited.has_ended());
        assert_eq!(
            events_of(&plain_log, "char:"),
            events_of(&waited_log, "char:")
        );
    }

    #[test]
    fn zero_speed_drains_within_the_tick_budget() {
        let mut config = RevealConfig::default();
        config.char_limit_per_tick = 4;
        let mut label = TypingLabel::with_config("{SPEED=0.0}abcdefgh", config);
        label.advance(0.016);
        assert_eq!(label.visible_text().len(), 4);
        label.advance(0.016);
        assert_eq!(label.visible_text().len(), 8);
        label.advance(0.016);
        assert!(label.has_ended());
    }

    #[test]
    fn zero_budget_means_unbounded() {
        let mut config = RevealConfig::default();
        config.char_limit_per_tick = 0;
        let mut label = TypingLabel::with_config("{SPEED=0.0}abcdefgh", config);
        label.advance(0.016);
        assert!(label.has_ended());
        assert_eq!(label.visible_text(), "abcdefgh");
    }

    #[test]
    fn skip_to_end_is_silent_and_clears_effects() {
        let (mut label, log) = recorded_label("{GRADIENT=#ff0000;#0000ff}ab{EVENT=boom}cdef", 0.05);
        label.skip_to_end(true, true);
        label.advance(0.016);
        assert!(label.has_ended());
        assert!(!label.is_skipping());
        assert_eq!(label.active_effect_count(), 0);
        assert_eq!(label.visible_text(), "abcdef");
        assert!(events_of(&log, "event:").is_empty());
        assert_eq!(events_of(&log, "end").len(), 1);
    }

    #[test]
    fn skip_without_ignoring_fires_events() {
        let (mut label, log) = recorded_label("ab{EVENT=boom}cd", 0.05);
        label.skip_to_end(false, false);
        label.advance(0.016);
        assert!(label.has_ended());
        assert_eq!(events_of(&log, "event:"), vec!["event:boom"]);
    }

    #[test]
    fn event_fires_when_the_cursor_reaches_it() {
        let (mut label, log) = recorded_label("ab{EVENT=mid}cd", 0.05);
        label.advance(0.09);
        assert_eq!(label.visible_text(), "ab");
        assert!(events_of(&log, "event:").is_empty());
        label.advance(0.05);
        assert_eq!(events_of(&log, "event:"), vec!["event:mid"]);
        assert_eq!(label.visible_text(), "abc");
    }

    #[test]
    fn natural_jitter_is_deterministic_and_bounded() {
        for index in [-1, 0, 1, 7, 1000, 123_456] {
            let a = natural_jitter(index);
            let b = natural_jitter(index);
            assert_eq!(a, b);
            assert!((-2.4..-0.4).contains(&a), "jitter {} at {}", a, index);
        }
        assert_ne!(natural_jitter(3), natural_jitter(4));
    }

    #[test]
    fn natural_mode_replays_identically() {
        let (mut a, log_a) = recorded_label("{NATURAL=0.05}abcdefghij", 0.05);
        let (mut b, log_b) = recorded_label("{NATURAL=0.05}abcdefghij", 0.05);
        for _ in 0..20 {
            a.advance(0.037);
            b.advance(0.037);
        }
        assert_eq!(*log_a.borrow(), *log_b.borrow());
        assert_eq!(a.visible_text(), b.visible_text());
    }

    #[test]
    fn effect_end_without_open_effect_is_a_noop() {
        let (mut label, _log) = recorded_label("ab{ENDGRADIENT}cd", 0.05);
        for _ in 0..20 {
            label.advance(0.05);
        }
        assert!(label.has_ended());
        assert_eq!(label.active_effect_count(), 0);
        assert_eq!(label.visible_text(), "abcd");
    }

    #[test]
    fn working_layout_matches_canonical_at_completion() {
        let (mut label, _log) = recorded_label("line one\nline two\nand three", 0.01);
        label.advance(0.005);
        // Partial reveal keeps working below canonical.
        assert!(label.working_layout().glyph_count() <= label.layout().glyph_count());
        for _ in 0..100 {
            label.advance(0.05);
            assert!(label.working_layout().glyph_count() <= label.layout().glyph_count());
        }
        assert!(label.has_ended());
        assert_eq!(
            label.working_layout().glyph_count(),
            label.layout().glyph_count()
        );
        assert_eq!(label.working_layout().to_text(), label.layout().to_text());
        assert_eq!(
            label.working_layout().line_count(),
            label.layout().line_count()
        );
    }

    #[test]
    fn gradient_recolors_only_its_range() {
        let (mut label, _log) =
            recorded_label("{GRADIENT=#ff0000;#ff0000}ab{ENDGRADIENT}cd", 0.05);
        for _ in 0..20 {
            label.advance(0.05);
        }
        assert!(label.has_ended());
        let working = label.working_layout();
        assert_eq!(working.get(0).unwrap().color(), Rgba::RED);
        assert_eq!(working.get(1).unwrap().color(), Rgba::RED);
        assert_eq!(working.get(2).unwrap().color(), Rgba::WHITE);
        assert_eq!(working.get(3).unwrap().color(), Rgba::WHITE);
        // Canonical text is never recolored.
        assert_eq!(label.layout().get(0).unwrap().color(), Rgba::WHITE);
    }

    #[test]
    fn starting_a_kind_closes_the_open_one() {
        let (mut label, _log) = recorded_label(
            "{GRADIENT=#ff0000;#ff0000}ab{GRADIENT=#0000ff;#0000ff}cd",
            0.05,
        );
        for _ in 0..20 {
            label.advance(0.05);
        }
        assert!(label.has_ended());
        assert_eq!(label.active_effect_count(), 2);
        let working = label.working_layout();
        assert_eq!(working.get(0).unwrap().color(), Rgba::RED);
        assert_eq!(working.get(1).unwrap().color(), Rgba::RED);
        assert_eq!(working.get(2).unwrap().color(), Rgba::BLUE);
        assert_eq!(working.get(3).unwrap().color(), Rgba::BLUE);
    }

    #[test]
    fn open_effects_close_at_completion() {
        let (mut label, _log) = recorded_label("{WAVE}abc", 0.05);
        for _ in 0..10 {
            label.advance(0.05);
        }
        assert!(label.has_ended());
        // Still active, still animating the glyphs it covered.
        assert_eq!(label.active_effect_count(), 1);
        let wave_offsets: Vec<f32> = label.offsets.clone();
        label.advance(0.05);
        assert_ne!(wave_offsets, label.offsets);
    }

    #[test]
    fn paused_cursor_holds_but_effects_tick() {
        let (mut label, _log) = recorded_label("{WAVE=1;3}abcdef", 0.02);
        label.advance(0.1);
        let visible = label.visible_text();
        assert!(!visible.is_empty());
        label.pause();
        let before = label.offsets.clone();
        label.advance(0.73);
        assert_eq!(label.visible_text(), visible);
        assert_ne!(before, label.offsets);
        label.resume();
        label.advance(10.0);
        assert!(label.has_ended());
    }

    #[test]
    fn reset_token_restores_default_speed() {
        let (mut label, _log) = recorded_label("{SPEED=0.0}ab{RESET}cd", 0.05);
        label.advance(0.001);
        // a, b drain instantly; RESET restores 0.05 before d's cooldown.
        assert_eq!(label.visible_text(), "abc");
        assert!(!label.has_ended());
        assert!((label.text_speed() - 0.05).abs() < 1e-6);
        label.advance(1.0);
        assert!(label.has_ended());
    }

    #[test]
    fn end_fires_exactly_once_until_restart() {
        let (mut label, log) = recorded_label("ab", 0.01);
        for _ in 0..10 {
            label.advance(0.1);
        }
        assert_eq!(events_of(&log, "end").len(), 1);
        label.restart();
        assert!(!label.has_ended());
        assert_eq!(label.visible_text(), "");
        for _ in 0..10 {
            label.advance(0.1);
        }
        assert_eq!(events_of(&log, "end").len(), 2);
    }

    #[test]
    fn empty_text_ends_immediately() {
        let (mut label, log) = recorded_label("", 0.05);
        label.advance(0.016);
        assert!(label.has_ended());
        assert_eq!(label.visible_text(), "");
        assert_eq!(events_of(&log, "end").len(), 1);
    }

    #[test]
    fn unknown_directive_is_revealed_literally() {
        let (mut label, _log) = recorded_label("a{XYZ=9}b", 0.05);
        label.skip_to_end(true, true);
        label.advance(0.016);
        assert_eq!(label.visible_text(), "a{XYZ=9}b");
    }

    #[test]
    fn label_variables_resolve_before_listener() {
        let (mut label, _log) = recorded_label("Hi {VAR=NAME}", 0.0);
        label.set_variable("name", "Ada");
        label.advance(0.016);
        assert!(label.has_ended());
        assert_eq!(label.visible_text(), "Hi Ada");
    }

    #[test]
    fn listener_resolves_unregistered_variables() {
        let recording = Recording::default();
        let mut config = RevealConfig::default();
        config.default_speed_per_char = 0.0;
        let mut label = TypingLabel::with_config("Hi {VAR=WHO}", config);
        let mut vars = HashMap::new();
        vars.insert("WHO".to_string(), "you".to_string());
        label.set_listener(Box::new(RecordingListener {
            log: recording.log,
            vars,
        }));
        label.advance(0.016);
        assert_eq!(label.visible_text(), "Hi you");
    }

    #[test]
    fn global_variables_resolve() {
        let config = RevealConfig::default().with_global_var("game", "Quill");
        let mut label = TypingLabel::with_config("{SPEED=0.0}{VAR=GAME}!", config);
        label.advance(0.016);
        assert_eq!(label.visible_text(), "Quill!");
    }

    #[test]
    fn default_token_prefixes_every_parse() {
        let (mut label, _log) = recorded_label("abcdef", 0.05);
        label.set_default_token("{SPEED=0.0}");
        label.advance(0.016);
        assert!(label.has_ended());
        label.restart();
        label.advance(0.016);
        assert!(label.has_ended());
    }

    #[test]
    fn interval_multiplier_pauses_after_marked_chars() {
        let mut config = RevealConfig::default();
        config.default_speed_per_char = 0.05;
        config = config.with_interval_multiplier('.', 4.0);
        let mut label = TypingLabel::with_config("a.b", config);
        label.advance(0.04);
        assert_eq!(label.visible_text(), "a");
        // The period charges 0.2 of cooldown when it reveals.
        label.advance(0.04);
        assert_eq!(label.visible_text(), "a.");
        label.advance(0.1);
        assert_eq!(label.visible_text(), "a.");
        label.advance(0.1);
        assert_eq!(label.visible_text(), "a.b");
    }

    #[test]
    fn compensation_steps_shift_the_cursor_symmetrically() {
        let (mut label, _log) = recorded_label("abcdef", 0.1);
        label.advance(0.09);
        assert_eq!(label.visible_text(), "a");
        assert_eq!(label.glyph_index(), 0);
        let raw_before = label.raw_index();

        // Each pending step consumes one interval instead of a reveal.
        label.add_glyph_compensation(2);
        label.advance(0.09);
        assert_eq!(label.glyph_index(), 1);
        assert_eq!(label.raw_index(), raw_before);
        label.advance(0.09);
        assert_eq!(label.glyph_index(), 2);
        assert_eq!(label.raw_index(), raw_before);
        assert_eq!(label.visible_text(), "abc");

        // And symmetrically backwards.
        label.add_glyph_compensation(-1);
        label.advance(0.09);
        assert_eq!(label.glyph_index(), 1);
        assert_eq!(label.visible_text(), "ab");

        for _ in 0..30 {
            label.advance(0.1);
        }
        assert!(label.has_ended());
        assert_eq!(label.visible_text(), "abcdef");
    }

    #[test]
    fn rewrap_preserves_revealed_glyphs() {
        let (mut label, _log) = recorded_label("aaaa bbbb cccc", 0.05);
        label.advance(0.3);
        let visible = label.visible_text();
        assert!(!visible.is_empty() && !label.has_ended());
        label.set_target_width(25.0);
        assert!(label.layout().line_count() > 1);
        assert_eq!(label.visible_text(), visible);
        for _ in 0..30 {
            label.advance(0.1);
        }
        assert!(label.has_ended());
        assert_eq!(
            label.working_layout().to_text(),
            label.layout().to_text()
        );
    }

    #[test]
    fn transform_arrays_are_sized_to_the_canonical_layout() {
        let (mut label, _log) = recorded_label("abcd", 0.05);
        label.advance(0.05);
        assert_eq!(label.offsets.len(), 8);
        assert_eq!(label.sizing.len(), 8);
        assert_eq!(label.rotations.len(), 4);
        assert!(label.sizing.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn set_text_after_end_stays_revealed() {
        let (mut label, _log) = recorded_label("ab", 0.05);
        label.skip_to_end(true, false);
        label.advance(0.016);
        assert!(label.has_ended());
        label.set_text("new words");
        label.advance(0.016);
        assert!(label.has_ended());
        assert_eq!(label.visible_text(), "new words");
    }

    #[test]
    fn cancel_skip_restores_pacing() {
        let (mut label, log) = recorded_label("abcdefgh{EVENT=late}", 0.05);
        label.skip_to_end(true, true);
        label.cancel_skip();
        label.advance(0.04);
        assert_eq!(label.visible_text(), "a");
        for _ in 0..20 {
            label.advance(0.05);
        }
        assert!(label.has_ended());
        // Events fire again once skip mode is cancelled.
        assert_eq!(events_of(&log, "event:"), vec!["event:late"]);
    }
}
