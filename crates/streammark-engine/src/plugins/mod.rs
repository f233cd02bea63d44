//! Document plugins (DP): post-extraction passes over the whole block list
//! that can add, remove, or annotate blocks and contribute "protected
//! ranges" later stages must not re-tokenize. Plugins run in registration
//! order and at most one instance of a given plugin type may be registered.

pub mod footnotes;
pub mod tables;

use std::ops::Range;

use crate::model::Block;

/// A byte range (of the raw document) that downstream inline/mixed-content
/// processing must treat as opaque, e.g. a footnote-definition block body
/// already consumed into the aggregated footnotes block.
pub type ProtectedRange = Range<usize>;

pub struct PluginOutput {
    pub blocks: Vec<Block>,
    pub protected_ranges: Vec<ProtectedRange>,
}

pub trait DocumentPlugin: Send + Sync {
    /// Stable key; used to enforce the at-most-one-instance-per-type rule.
    fn key(&self) -> &'static str;

    fn apply(&mut self, content: &str, blocks: Vec<Block>, protected: Vec<ProtectedRange>) -> PluginOutput;
}

pub struct PluginPipeline {
    plugins: Vec<Box<dyn DocumentPlugin>>,
}

impl PluginPipeline {
    pub fn new() -> Self {
        Self { plugins: Vec::new() }
    }

    pub fn register(&mut self, plugin: Box<dyn DocumentPlugin>) -> Result<(), String> {
        if self.plugins.iter().any(|p| p.key() == plugin.key()) {
            return Err(format!("plugin '{}' already registered", plugin.key()));
        }
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn run(&mut self, content: &str, blocks: Vec<Block>) -> PluginOutput {
        let mut out = PluginOutput { blocks, protected_ranges: Vec::new() };
        for plugin in &mut self.plugins {
            out = plugin.apply(content, out.blocks, out.protected_ranges);
        }
        out
    }
}

impl Default for PluginPipeline {
    fn default() -> Self {
        Self::new()
    }
}
