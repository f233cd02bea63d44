/// Footnote definition (`[^label]: text`) block opener, with owned delimiter
/// knowledge. Distinct from the `footnote-ref` inline node and the synthetic
/// `footnotes` block a document plugin may append.
pub struct FootnoteDef;

impl FootnoteDef {
    /// Returns the label if `remainder` opens a footnote definition.
    pub fn detect(remainder: &str) -> Option<&str> {
        let t = remainder.trim_end_matches(['\r', '\n']);
        let rest = t.strip_prefix("[^")?;
        let (label, after) = rest.split_once(']')?;
        if label.is_empty() || label.contains(char::is_whitespace) {
            return None;
        }
        after.starts_with(':').then_some(label)
    }
}
