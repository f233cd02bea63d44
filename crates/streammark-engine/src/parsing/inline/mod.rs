//! # Inline Parsing
//!
//! Tokenizes a text run into a tree of [`crate::model::InlineNode`]s using an
//! ordered fold of regex/AST plugins, each owning its own delimiters.
//!
//! ## Modules
//!
//! - **`plugin`**: the `InlinePlugin` shape and the ordered fold engine
//! - **`plugins`**: the default 13-plugin set, in fixed precedence order
//! - **`kinds`**: inline-specific types with owned delimiters (code spans)
//! - **`cursor`**: `Cursor` for hand-written scans that regex can't express
//! - **`cache`**: bounded LRU cache keyed by input text
//! - **`anticipation`**: `regex_anticipation_append` for user-registered plugins
//! - **`parser`**: `InlineParser`/`parse_inline`, the public entry points
//!
//! ## Raw Zone Precedence
//!
//! Because the fold only recurses into *container* node children (strong,
//! em, strike, link), a leaf produced by an earlier plugin — a code span,
//! math span — is never revisited by a later plugin. Code spans run at
//! priority 5, well before emphasis/strikethrough, so `` `*not em*` ``
//! becomes a single code node rather than emphasized text.

pub mod anticipation;
pub mod cache;
pub mod cursor;
pub mod kinds;
pub mod plugin;
pub mod plugins;
pub mod parser;

pub use anticipation::regex_anticipation_append;
pub use parser::{parse_inline, InlineParser};
