//! Block kinds, each owning its own syntax-detection knowledge: delimiters,
//! marker regexes and the `sig`/`strip`/`detect` helpers that recognize them.
//! Classifier and builder code call these helpers rather than hardcoding
//! markdown punctuation inline.

pub mod block_quote;
pub mod code_fence;
pub mod footnote_def;
pub mod heading;
pub mod html_block;
pub mod hr;
pub mod list_marker;
pub mod paragraph;

pub use block_quote::BlockQuote;
pub use code_fence::{CodeFence, FenceKind, FenceSig};
pub use footnote_def::FootnoteDef;
pub use heading::Heading;
pub use html_block::HtmlBlock;
pub use hr::ThematicBreak;
pub use list_marker::{ListMarker, ListMarkerKind, ListMarkers};
pub use paragraph::Paragraph;
