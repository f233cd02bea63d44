//! Core parsing and data-model crate for the streaming Markdown-to-document
//! engine: block extraction, inline parsing, and the shared wire types.

pub mod anticipator;
pub mod backpressure;
pub mod coalesce;
pub mod code_enrich;
pub mod differ;
pub mod enrich;
pub mod error;
pub mod highlight;
pub mod mdx;
pub mod metrics;
pub mod mixed;
pub mod model;
pub mod parsing;
pub mod pipeline;
pub mod plugins;
pub mod sanitize;
pub mod snapshot_builder;

pub use error::EngineError;
