//! Inline-specific types that own their syntax delimiters. All delimiter
//! constants and the scanning logic that depends on them live here, not
//! scattered through plugin code.

pub mod code_span;

pub use code_span::CodeSpan;
