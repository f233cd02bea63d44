//! HTML sanitizer seam: raw inline/block HTML segments are never emitted
//! to a patch unsanitized. The built-in sanitizer keeps a conservative
//! allow-list of tags and strips everything else to text, favoring a
//! small, explicit, defensible allow-list over a denylist.

const ALLOWED_TAGS: &[&str] = &[
    "a", "b", "br", "code", "del", "em", "i", "img", "p", "pre", "span", "strong", "sub", "sup",
    "u",
];

pub trait HtmlSanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

pub struct AllowListSanitizer;

impl HtmlSanitizer for AllowListSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut rest = html;
        while let Some(lt) = rest.find('<') {
            out.push_str(&rest[..lt]);
            let tail = &rest[lt..];
            match tail.find('>') {
                Some(end) => {
                    let tag_src = &tail[1..end];
                    let name: String = tag_src
                        .trim_start_matches('/')
                        .chars()
                        .take_while(|c| c.is_alphanumeric())
                        .collect::<String>()
                        .to_ascii_lowercase();
                    if ALLOWED_TAGS.contains(&name.as_str()) {
                        out.push_str(&tail[..=end]);
                    }
                    rest = &tail[end + 1..];
                }
                None => {
                    rest = "";
                    break;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_allow_listed_tags() {
        let s = AllowListSanitizer;
        assert_eq!(s.sanitize("<b>bold</b>"), "<b>bold</b>");
    }

    #[test]
    fn strips_disallowed_tags() {
        let s = AllowListSanitizer;
        assert_eq!(s.sanitize("<script>evil()</script>ok"), "evil()ok");
    }
}
