//! Markup scanner: turns annotated text into a clean display string plus a
//! time-ordered directive list.
//!
//! Directive syntax is `{NAME}` or `{NAME=PARAM}`; effect parameters split on
//! `;`. Parsing fails open: malformed or unrecognized syntax passes through as
//! literal text, never an error: a typed document must stay renderable.

use super::token::{TokenEntry, TokenPayload};
use crate::core::config::RevealConfig;
use crate::systems::effects::EffectRegistry;

/// Speed-alias multipliers of the default per-char interval.
const SLOWER: f32 = 2.0;
const SLOW: f32 = 1.5;
const FAST: f32 = 0.5;
const FASTER: f32 = 0.25;

/// Variable-expansion passes before giving up (cycle guard).
const MAX_VAR_PASSES: u32 = 8;

/// Result of a parse: the display string and the directives anchored into the
/// raw stream, in ascending `raw_index` order.
#[derive(Debug)]
pub struct ParseOutcome {
    pub clean: String,
    pub entries: Vec<TokenEntry>,
}

/// Replace every `{VAR=NAME}` directive using `resolve` (name uppercased).
/// Replacement values may themselves contain directives or variables; the
/// text is re-scanned until stable, bounded by `MAX_VAR_PASSES`. Unresolved
/// variables expand to nothing.
pub fn expand_variables(
    source: &str,
    resolve: &mut dyn FnMut(&str) -> Option<String>,
) -> String {
    let mut text = source.to_string();
    for _ in 0..MAX_VAR_PASSES {
        let (expanded, replaced) = expand_once(&text, resolve);
        text = expanded;
        if !replaced {
            break;
        }
    }
    text
}

fn expand_once(
    source: &str,
    resolve: &mut dyn FnMut(&str) -> Option<String>,
) -> (String, bool) {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut replaced = false;
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '{' {
            if let Some(close) = find_close(&chars, i) {
                let inner: String = chars[i + 1..close].iter().collect();
                if let Some((name, param)) = split_directive(&inner) {
                    if name == "VAR" && !param.is_empty() {
                        match resolve(&param.to_uppercase()) {
                            Some(value) => out.push_str(&value),
                            None => {
                                log::debug!("unresolved variable {{VAR={}}}", param);
                            }
                        }
                        replaced = true;
                        i = close + 1;
                        continue;
                    }
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    (out, replaced)
}

/// Scan the raw stream left to right, producing the clean display string and
/// the directive entries. Text with no directives parses to itself with an
/// empty entry list.
pub fn parse(source: &str, config: &RevealConfig, registry: &EffectRegistry) -> ParseOutcome {
    let chars: Vec<char> = source.chars().collect();
    let mut clean = String::with_capacity(source.len());
    let mut entries = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '{' {
            clean.push(chars[i]);
            i += 1;
            continue;
        }
        let Some(close) = find_close(&chars, i) else {
            // Unterminated brace: literal.
            clean.push(chars[i]);
            i += 1;
            continue;
        };
        let inner: String = chars[i + 1..close].iter().collect();
        match recognize(&inner, config, registry) {
            Some(payload) => {
                entries.push(TokenEntry {
                    raw_index: i as i32,
                    end_index: (close + 1) as i32,
                    payload,
                });
            }
            None => {
                log::debug!("unrecognized directive {{{}}}, passing through", inner);
                for &ch in &chars[i..=close] {
                    clean.push(ch);
                }
            }
        }
        i = close + 1;
    }

    ParseOutcome { clean, entries }
}

fn find_close(chars: &[char], open: usize) -> Option<usize> {
    chars[open + 1..]
        .iter()
        .position(|&c| c == '}')
        .map(|offset| open + 1 + offset)
}

/// Split `NAME` / `NAME=PARAM`, uppercasing the name. Empty names are
/// rejected (e.g. `{}` or `{=x}`).
fn split_directive(inner: &str) -> Option<(String, String)> {
    let (name, param) = match inner.split_once('=') {
        Some((name, param)) => (name, param),
        None => (inner, ""),
    };
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_uppercase(), param.to_string()))
}

fn recognize(
    inner: &str,
    config: &RevealConfig,
    registry: &EffectRegistry,
) -> Option<TokenPayload> {
    let (name, param) = split_directive(inner)?;
    let default_speed = config.default_speed_per_char;

    let payload = match name.as_str() {
        "RESET" | "NORMAL" => TokenPayload::Reset,
        "SPEED" => TokenPayload::Speed(parse_f32(&param, default_speed).max(0.0)),
        "SLOWER" => TokenPayload::Speed(default_speed * SLOWER),
        "SLOW" => TokenPayload::Speed(default_speed * SLOW),
        "FAST" => TokenPayload::Speed(default_speed * FAST),
        "FASTER" => TokenPayload::Speed(default_speed * FASTER),
        // Negative speed selects deterministic per-glyph jitter.
        "NATURAL" => TokenPayload::Speed(-parse_f32(&param, default_speed).abs()),
        "WAIT" => TokenPayload::Wait(parse_f32(&param, config.default_wait).max(0.0)),
        "EVENT" => TokenPayload::Event(param),
        _ => {
            let params: Vec<&str> = if param.is_empty() {
                Vec::new()
            } else {
                param.split(';').collect()
            };
            if let Some(effect) = registry.build_start(&name, &params) {
                TokenPayload::EffectStart(effect)
            } else if let Some(kind) = registry.end_kind(&name) {
                TokenPayload::EffectEnd(kind.to_string())
            } else {
                return None;
            }
        }
    };
    Some(payload)
}

fn parse_f32(param: &str, default: f32) -> f32 {
    let param = param.trim();
    if param.is_empty() {
        return default;
    }
    param.parse().unwrap_or_else(|_| {
        log::debug!("bad numeric directive parameter {:?}, using {}", param, default);
        default
    })
}
