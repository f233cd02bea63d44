//! `regex_anticipation_append`: lets a user-registered regex plugin declare
//! an unterminated-tail marker independently of the streaming anticipator's
//! built-in stack (which already covers code/strike/strong/em/math).

use super::plugin::InlinePlugin;

const DEFAULT_MAX_SCAN_CHARS: usize = 240;

/// Convenience entry point over the default plugin set.
pub fn regex_anticipation_append_default(text: &str) -> Option<String> {
    regex_anticipation_append(text, &super::plugins::default_plugins())
}

/// Scans the tail of `text` for each plugin's `anticipation` spec, in
/// registration order, and returns the first non-null append.
pub fn regex_anticipation_append(text: &str, plugins: &[InlinePlugin]) -> Option<String> {
    for plugin in plugins {
        let Some(spec) = &plugin.anticipation else {
            continue;
        };
        let max_scan = spec.max_scan_chars.unwrap_or(DEFAULT_MAX_SCAN_CHARS);
        let tail_start = text.len().saturating_sub(max_scan);
        let tail = &text[tail_start..];

        let unterminated = if spec.end == spec.start {
            tail.matches(spec.start).count() % 2 == 1
        } else {
            match tail.rfind(spec.start) {
                Some(last_start) => !tail[last_start + spec.start.len()..].contains(spec.end),
                None => false,
            }
        };

        if unterminated {
            return Some(spec.append.to_string());
        }
    }
    None
}
