//! `streammark`: a thin driver binary. Reads a document from a file (or
//! stdin), feeds it through the pipeline controller as a single INIT
//! followed by a FINALIZE, and prints each emitted `WorkerOut` message as a
//! JSON line.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use streammark_engine::anticipator::{AnticipationConfig, AnticipationFlags};
use streammark_engine::backpressure::BackpressureConfig;
use streammark_engine::mdx::CompileMode;
use streammark_engine::pipeline::{PipelineController, PipelineTuning, WorkerIn};

#[derive(Parser, Debug)]
#[command(name = "streammark", about = "Stream a Markdown document through the engine")]
struct Args {
    /// Path to a Markdown file; reads stdin if omitted.
    file: Option<PathBuf>,

    /// Path to an engine config TOML file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a trailing METRICS-only line summarizing the run.
    #[arg(long)]
    metrics: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => streammark_config::EngineConfig::load(path).context("loading engine config")?,
        None => streammark_config::EngineConfig::default(),
    };

    let content = match &args.file {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };

    let mut pipeline = PipelineController::with_tuning(to_tuning(&config));
    let init_outs = pipeline.handle(WorkerIn::Init { content });
    print_all(&init_outs)?;

    let final_outs = pipeline.handle(WorkerIn::Finalize);
    print_all(&final_outs)?;

    if args.metrics {
        if let Some(streammark_engine::pipeline::WorkerOut::Patch { tx, metrics, .. }) =
            final_outs.iter().find(|o| matches!(o, streammark_engine::pipeline::WorkerOut::Patch { .. }))
        {
            let line = serde_json::json!({ "type": "metrics", "tx": tx, "metrics": metrics });
            println!("{}", serde_json::to_string(&line)?);
        }
    }

    Ok(())
}

fn print_all(outs: &[streammark_engine::pipeline::WorkerOut]) -> anyhow::Result<()> {
    for out in outs {
        println!("{}", serde_json::to_string(out)?);
    }
    Ok(())
}

/// Bridges the loaded `streammark_config::EngineConfig` into the engine's
/// own tuning knobs; the engine crate stays independent of the config
/// crate's TOML/serde machinery and only sees plain values.
fn to_tuning(config: &streammark_config::EngineConfig) -> PipelineTuning {
    let a = &config.anticipation;
    let anticipation = AnticipationConfig::Flags(AnticipationFlags {
        inline: a.inline,
        math_inline: a.math_inline,
        math_block: a.math_block,
        html: a.html,
        mdx: a.mdx,
        regex: a.regex,
    });
    let b = &config.backpressure;
    let mdx_compile_mode = match config.mdx_compile_mode {
        streammark_config::MdxCompileMode::Server => CompileMode::Server,
        streammark_config::MdxCompileMode::Worker => CompileMode::Worker,
    };
    PipelineTuning {
        inline_cache_capacity: config.inline_cache_capacity,
        highlight_cache_capacity: config.highlight_cache_capacity,
        mdx_cache_capacity: config.mdx_cache_capacity,
        max_coalesce_window: config.max_coalesce_window,
        anticipation,
        backpressure: BackpressureConfig {
            target_queue_depth: b.target_queue_depth,
            max_queue_depth: b.max_queue_depth,
            smoothing_factor: b.smoothing_factor,
            low_credit_cutoff: b.low_credit_cutoff,
            min_heavy_patch_budget: b.min_heavy_patch_budget,
            max_heavy_patch_budget: b.max_heavy_patch_budget,
        },
        mdx_compile_mode,
    }
}
