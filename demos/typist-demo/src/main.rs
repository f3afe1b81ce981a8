//! Drives a typing label at a fixed timestep and prints each reveal step.

use std::io::Write;

use glam::Vec2;
use quill_engine::{FontGrid, Glyph, GlyphBuffer, RevealConfig, TypingLabel, TypingListener};

struct ConsoleListener;

impl TypingListener for ConsoleListener {
    fn on_char(&mut self, glyph: Glyph) {
        print!("{}", glyph.character());
        let _ = std::io::stdout().flush();
    }

    fn event(&mut self, name: &str) {
        print!("[{}]", name);
    }

    fn end(&mut self) {
        println!("\n-- end of text --");
    }
}

fn main() {
    let config = RevealConfig::default()
        .with_interval_multiplier('.', 6.0)
        .with_interval_multiplier(',', 3.0)
        .with_global_var("engine", "quill");

    let mut label = TypingLabel::with_config(
        "Booting {VAR=ENGINE}...{WAIT=0.5}\n\
         {GRADIENT=#ff8800;#00aaff}A typed greeting,{ENDGRADIENT} \
         {EVENT=chime}{FAST}now quite a bit faster, \
         {NATURAL=0.04}then naturally uneven.{WAIT=0.3}\n\
         {WAVE}And this line keeps waving.",
        config,
    );
    label.set_listener(Box::new(ConsoleListener));

    // Fixed 60 Hz stepping, the way a game loop would drive it.
    let dt = 1.0 / 60.0;
    let mut elapsed = 0.0f32;
    while !label.has_ended() && elapsed < 30.0 {
        label.advance(dt);
        elapsed += dt;
    }

    // A frame's worth of render data for a host renderer.
    let mut buffer = GlyphBuffer::new();
    label.advance(dt);
    buffer.rebuild(&label, &FontGrid::default(), Vec2::ZERO);
    println!(
        "revealed {} glyphs across {} lines into {} instances ({} floats)",
        label.working_layout().glyph_count(),
        label.working_layout().line_count(),
        buffer.instance_count(),
        buffer.as_floats().len(),
    );

    // Replay instantly.
    label.restart();
    label.skip_to_end(true, true);
    label.advance(dt);
    println!("skipped replay:\n{}", label.visible_text());
}
