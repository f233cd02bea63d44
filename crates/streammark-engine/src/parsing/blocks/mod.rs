//! # Block Parsing
//!
//! Two-phase block parsing: line classification followed by block
//! construction, as a pure-Rust replacement for a full markdown grammar
//! engine.
//!
//! ## Parsing Phases
//!
//! 1. **Line Classification** (`classify`): Each line is classified into a `LineClass`
//!    containing local facts (indentation, blockquote depth, fence detection, marker
//!    detection, blank status)
//! 2. **Block Construction** (`builder`): [`BlockBuilder::build`] walks the classified
//!    line slice, with bounded lookahead for multi-line closers (lists, blockquotes),
//!    and emits a flat, ordered list of top-level `BlockNode`s
//!
//! ## Modules
//!
//! - **`types`**: Core types (`BlockNode`, `BlockKind`)
//! - **`kinds`**: Block-specific types with owned delimiters (fence, heading, hr, list
//!   marker, html opener, footnote-def, blockquote, paragraph)
//! - **`classify`**: `MarkdownLineClassifier` produces `LineClass` for each line
//! - **`open`**: `try_open_leaf` dispatch for detecting which kind of block opens
//! - **`builder`**: `BlockBuilder` for block construction
//!
//! ## Key Invariants
//!
//! - Blocks are flat: nested structure inside a blockquote or list is not
//!   decomposed into further `BlockNode`s here; it is reconstructed from the
//!   block's own span later, during snapshot lowering.
//! - Fenced and indented code blocks are raw zones: no inline parsing inside.
//! - All block nodes store byte spans into the rope.

pub mod builder;
pub mod classify;
pub mod content;
pub mod kinds;
pub mod open;
pub mod types;

pub use builder::BlockBuilder;
pub use classify::{LineClass, MarkdownLineClassifier};
pub use content::{ContentLine, ContentView};
pub use types::{BlockKind, BlockNode};
