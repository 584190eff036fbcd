use std::env;
use std::sync::Arc;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use clinrag_context::{compose_system_context, synonym_table, AuditTrailBuilder, RetrievalPipeline, TracingAuditSink};
use clinrag_core::config::{Config, Settings};
use clinrag_core::Corpus;
use clinrag_entities::EntityExtractor;

const USAGE: &str = "Usage: clinrag <query|entities|answer-dry-run> \"<text>\" [max_tokens]";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn build_pipeline(settings: &Settings) -> anyhow::Result<RetrievalPipeline> {
    let corpus_dir = settings.corpus_dir(&env::current_dir()?);
    let corpus = Arc::new(Corpus::load_dir(&corpus_dir).with_context(|| format!("loading corpus from {}", corpus_dir.display()))?);

    let pb = ProgressBar::new(corpus.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks embedded ({percent}%)")?
            .progress_chars("#>-"),
    );
    let pipeline = RetrievalPipeline::from_corpus_with_progress(settings, corpus, Some(&pb))?;
    pb.finish_and_clear();
    Ok(pipeline)
}

fn required_text(args: &[String], cmd: &str) -> String {
    args.first().cloned().unwrap_or_else(|| {
        eprintln!("Usage: clinrag {cmd} \"<text>\" [max_tokens]");
        std::process::exit(1)
    })
}

fn max_tokens(args: &[String], settings: &Settings) -> anyhow::Result<usize> {
    match args.get(1) {
        Some(raw) => raw.parse().with_context(|| format!("max_tokens must be a non-negative integer, got {raw:?}")),
        None => Ok(settings.retrieval.budget.max_tokens),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let (cmd, args) = parse_args();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let settings = config.settings()?;

    match cmd.as_str() {
        "entities" => {
            let text = required_text(&args, "entities");
            let codes = EntityExtractor::new(synonym_table(&settings))?.extract(&text);
            println!("{}", serde_json::to_string_pretty(&codes)?);
        }
        "query" => {
            let text = required_text(&args, "query");
            let max_tokens = max_tokens(&args, &settings)?;
            let pipeline = build_pipeline(&settings)?;
            let outcome = pipeline.retrieve_context(&text, max_tokens).await;
            let audit = AuditTrailBuilder::build(&outcome.bundle, &outcome.ranked);
            AuditTrailBuilder::deliver(&TracingAuditSink, &audit);
            let report = json!({
                "bundle": outcome.bundle,
                "entities": outcome.entities,
                "audit": audit,
                "failures": outcome.failures.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "rejected": outcome.rejected.iter().map(ToString::to_string).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "answer-dry-run" => {
            let text = required_text(&args, "answer-dry-run");
            let max_tokens = max_tokens(&args, &settings)?;
            let pipeline = build_pipeline(&settings)?;
            let outcome = pipeline.retrieve_context(&text, max_tokens).await;
            println!("{}", compose_system_context(&outcome.bundle));
        }
        _ => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            std::process::exit(1);
        }
    }
    Ok(())
}
