#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarkerKind {
    Bullet,
    Ordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMarker {
    pub kind: ListMarkerKind,
    /// Width in bytes of the marker plus the single following space, used by
    /// the builder to decide whether a later line is an indented continuation.
    pub width: usize,
}

/// List item marker (bullet or ordered) with owned delimiter knowledge.
pub struct ListMarkers;

impl ListMarkers {
    pub fn detect(remainder: &str) -> Option<ListMarker> {
        let t = remainder.trim_end_matches(['\r', '\n']);
        let bytes = t.as_bytes();
        if bytes.is_empty() {
            return None;
        }
        if matches!(bytes[0], b'-' | b'*' | b'+') && (bytes.get(1) == Some(&b' ') || bytes.len() == 1) {
            let width = if bytes.len() == 1 { 1 } else { 2 };
            return Some(ListMarker {
                kind: ListMarkerKind::Bullet,
                width,
            });
        }
        let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
        if digits > 0 && digits <= 9 {
            if let Some(&marker) = bytes.get(digits) {
                if marker == b'.' || marker == b')' {
                    let after = digits + 1;
                    if bytes.get(after) == Some(&b' ') || bytes.len() == after {
                        let width = if bytes.len() == after { after } else { after + 1 };
                        return Some(ListMarker {
                            kind: ListMarkerKind::Ordered,
                            width,
                        });
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_bullets() {
        assert_eq!(
            ListMarkers::detect("- item").map(|m| m.kind),
            Some(ListMarkerKind::Bullet)
        );
        assert_eq!(
            ListMarkers::detect("* item").map(|m| m.kind),
            Some(ListMarkerKind::Bullet)
        );
    }

    #[test]
    fn detects_ordered() {
        assert_eq!(
            ListMarkers::detect("1. item").map(|m| m.kind),
            Some(ListMarkerKind::Ordered)
        );
        assert_eq!(
            ListMarkers::detect("12) item").map(|m| m.kind),
            Some(ListMarkerKind::Ordered)
        );
    }

    #[test]
    fn rejects_non_markers() {
        assert!(ListMarkers::detect("-nope").is_none());
        assert!(ListMarkers::detect("hello").is_none());
    }
}
