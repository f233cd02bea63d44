//! Error taxonomy for the engine.
//!
//! Every variant except [`EngineError::InvariantViolation`] is local-recovery:
//! callers catch it at the boundary where it occurred, log it, and fall back to
//! a documented degraded behavior rather than letting it escape message
//! processing. Only an invariant violation is fatal and causes the pipeline
//! controller to emit `RESET` and discard state.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("grammar parse produced no blocks, falling back to line scanner")]
    ParseFailure,

    #[error("highlighter failed for language {lang}: {message}")]
    HighlighterFailure { lang: String, message: String },

    #[error("sanitizer failed: {message}")]
    SanitizerFailure { message: String },

    #[error("mdx compile failed for block {block_id}: {message}")]
    MdxCompileFailure { block_id: String, message: String },

    #[error("document plugin {plugin_id} failed: {message}")]
    PluginFailure { plugin_id: String, message: String },

    #[error("message dispatch failed while handling {phase}: {message}")]
    MessageDispatchFailure { phase: String, message: String },

    #[error("invariant violation: {message}")]
    InvariantViolation { message: String },
}

impl EngineError {
    /// Only [`EngineError::InvariantViolation`] is a programmer-error fatal
    /// condition; everything else is recovered locally per the error taxonomy.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::InvariantViolation { .. })
    }
}
