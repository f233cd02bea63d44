/// HTML block opener detection with owned delimiter knowledge.
pub struct HtmlBlock;

impl HtmlBlock {
    /// A line opens an HTML block if it starts with `<` followed by a tag
    /// name, a closing-tag slash, a comment marker, or a declaration.
    pub fn detect(remainder: &str) -> bool {
        let t = remainder.trim_start();
        let mut chars = t.chars();
        if chars.next() != Some('<') {
            return false;
        }
        matches!(
            chars.next(),
            Some(c) if c.is_ascii_alphabetic() || c == '/' || c == '!' || c == '?'
        )
    }
}
