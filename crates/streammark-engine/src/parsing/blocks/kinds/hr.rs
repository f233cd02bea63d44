/// Thematic break (`hr`) block type: a line made up of 3+ of the same
/// `-`, `*` or `_` character, interspersed with any amount of whitespace.
pub struct ThematicBreak;

impl ThematicBreak {
    pub fn detect(remainder: &str) -> bool {
        let t = remainder.trim_end_matches(['\r', '\n']).trim();
        if t.len() < 3 {
            return false;
        }
        let mut marker = None;
        let mut count = 0usize;
        for c in t.chars() {
            if c == ' ' {
                continue;
            }
            if !matches!(c, '-' | '*' | '_') {
                return false;
            }
            match marker {
                None => marker = Some(c),
                Some(m) if m != c => return false,
                _ => {}
            }
            count += 1;
        }
        count >= 3
    }
}
