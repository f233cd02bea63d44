/// ATX heading block type with owned delimiter knowledge.
pub struct Heading;

impl Heading {
    /// Returns `Some(level)` if `remainder` opens an ATX heading (`#` through
    /// `######` followed by whitespace or end of line).
    pub fn detect(remainder: &str) -> Option<u8> {
        let t = remainder.trim_end_matches(['\r', '\n']);
        let hashes = t.bytes().take_while(|&b| b == b'#').count();
        if hashes == 0 || hashes > 6 {
            return None;
        }
        match t.as_bytes().get(hashes) {
            None => Some(hashes as u8),
            Some(b' ') | Some(b'\t') => Some(hashes as u8),
            _ => None,
        }
    }

    /// Strips the leading `#` run and a single optional closing `#` run,
    /// returning the normalized heading text.
    pub fn strip_markers(remainder: &str, level: u8) -> String {
        let t = remainder.trim_end_matches(['\r', '\n']);
        let rest = t[level as usize..].trim_start();
        let trimmed_end = rest.trim_end();
        let closing_start = trimmed_end
            .rfind(|c: char| c != '#')
            .map(|i| i + 1)
            .unwrap_or(0);
        if closing_start < trimmed_end.len() && trimmed_end.as_bytes()[closing_start] == b'#' {
            trimmed_end[..closing_start].trim_end().to_string()
        } else {
            trimmed_end.to_string()
        }
    }
}
