//! MDX detection and the MDX compilation lifecycle.
//!
//! Detection heuristics flag a block as an MDX candidate when
//! it contains JSX-looking tags or `{expr}` segments outside of math/code.
//! Compilation has two modes: in `Server` mode the engine never compiles —
//! it emits a pending ref and waits for an external `MdxCompiled`/`MdxError`
//! control message; in `Worker` mode an in-process [`MdxCompiler`] is called
//! directly, with an LRU cache (capacity 128) and single-flight dedup so two
//! blocks with byte-identical source only compile once.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::model::CompiledMdxModule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileMode {
    Server,
    Worker,
}

pub trait MdxCompiler: Send + Sync {
    fn compile(&self, source: &str) -> Result<CompiledMdxModule, String>;
}

/// Looks for a JSX-style tag (`<Capitalized`) or an MDX `{expr}` segment
/// (from the mixed-content splitter's output) to decide whether a block
/// that already parsed as HTML should instead be retyped as MDX.
pub fn is_mdx_candidate(segments: &[crate::model::MixedContentSegment]) -> bool {
    segments.iter().any(|seg| match seg.kind {
        crate::model::SegmentKind::Mdx => true,
        crate::model::SegmentKind::Html => looks_like_component(&seg.value),
        crate::model::SegmentKind::Text => false,
    })
}

fn looks_like_component(html: &str) -> bool {
    html.trim_start()
        .trim_start_matches('<')
        .chars()
        .next()
        .map(|c| c.is_uppercase())
        .unwrap_or(false)
}

pub struct MdxCache {
    inner: LruCache<String, CompiledMdxModule>,
    in_flight: BTreeSet<String>,
}

impl MdxCache {
    pub fn new() -> Self {
        Self::with_capacity(128)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: LruCache::new(NonZeroUsize::new(capacity.max(1)).unwrap()),
            in_flight: BTreeSet::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    pub fn get(&mut self, source: &str) -> Option<CompiledMdxModule> {
        self.inner.get(source).cloned()
    }

    /// Marks `source` as in flight; returns `false` if another caller has
    /// already claimed it (single-flight dedup — only the first caller
    /// should actually invoke the compiler).
    pub fn claim(&mut self, source: &str) -> bool {
        self.in_flight.insert(source.to_string())
    }

    pub fn resolve(&mut self, source: &str, module: CompiledMdxModule) {
        self.in_flight.remove(source);
        self.inner.put(source.to_string(), module);
    }

    pub fn fail(&mut self, source: &str) {
        self.in_flight.remove(source);
    }
}

impl Default for MdxCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiles `source` according to `mode`. In `Server` mode this always
/// returns `Ok(None)` (pending — an external control message will resolve
/// it); the caller is expected to carry forward a prior compiled module
/// when the raw source is byte-identical across a re-parse.
pub fn compile(
    mode: CompileMode,
    compiler: &dyn MdxCompiler,
    cache: &mut MdxCache,
    source: &str,
) -> Result<Option<CompiledMdxModule>, String> {
    if let Some(hit) = cache.get(source) {
        return Ok(Some(hit));
    }
    match mode {
        CompileMode::Server => Ok(None),
        CompileMode::Worker => {
            if !cache.claim(source) {
                return Ok(None);
            }
            match compiler.compile(source) {
                Ok(module) => {
                    cache.resolve(source, module.clone());
                    Ok(Some(module))
                }
                Err(e) => {
                    cache.fail(source);
                    Err(e)
                }
            }
        }
    }
}

pub fn carry_forward(prior_source: &str, new_source: &str, prior: Option<CompiledMdxModule>) -> Option<CompiledMdxModule> {
    if prior_source == new_source { prior } else { None }
}

#[derive(Default)]
pub struct EchoCompiler;

impl MdxCompiler for EchoCompiler {
    fn compile(&self, source: &str) -> Result<CompiledMdxModule, String> {
        Ok(CompiledMdxModule {
            id: format!("mdx:{:x}", simple_hash(source)),
            code: source.to_string(),
            deps: Vec::new(),
            source: source.to_string(),
        })
    }
}

fn simple_hash(s: &str) -> u64 {
    let mut h: u64 = 1469598103934665603;
    for b in s.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(1099511628211);
    }
    h
}
