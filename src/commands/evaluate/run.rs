use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use super::coverage::{CoverageSettings, evaluate_coverage};
use super::loader::{QaColumns, load_chunks, load_qa_pairs};
use crate::cli::EvaluateArgs;
use crate::commands::provider_settings;
use crate::config::{env_var, load_config, resolve_config_path, resolve_credentials};
use crate::embedding::clock::SystemClock;
use crate::embedding::{build_embedder, resolve_provider};
use crate::model::CoverageSummary;
use crate::text::{EMBEDDING_TEXT_MAX_CHARS, TextNormalizer};
use crate::util::write_json_pretty;

pub fn run(args: EvaluateArgs, config_path: Option<&Path>) -> Result<()> {
    let config_path = resolve_config_path(config_path)?;
    let stored = load_config(&config_path)?;
    let credentials = resolve_credentials(
        args.gemini_api_key.as_deref(),
        args.openai_api_key.as_deref(),
        &stored,
        env_var,
    );
    let provider = resolve_provider(args.provider.provider, &credentials);
    let settings = provider_settings(provider, credentials, &args.provider);

    let chunks = load_chunks(&args.chunks_json)?;
    let columns = QaColumns {
        question: &args.question_column,
        answer: &args.answer_column,
    };
    let qa_pairs = load_qa_pairs(&args.qa_csv, &columns, &args.encoding)?;

    let embedder = build_embedder(&settings, Arc::new(SystemClock))
        .with_context(|| format!("failed to configure {} embeddings", provider.as_str()))?;
    let normalizer = TextNormalizer::new()?;
    let coverage = CoverageSettings {
        top_k: args.top_k,
        max_embed_chars: EMBEDDING_TEXT_MAX_CHARS,
        sentence_threshold: args.sentence_threshold,
        coverage_threshold: args.coverage_threshold,
    };

    let (results, summary) =
        evaluate_coverage(&chunks, &qa_pairs, embedder.as_ref(), &normalizer, coverage);

    write_json_pretty(&args.output, &results)
        .with_context(|| format!("failed to save results to {}", args.output.display()))?;
    info!(path = %args.output.display(), results = results.len(), "wrote coverage results");

    log_summary(&summary);
    Ok(())
}

fn log_summary(summary: &CoverageSummary) {
    match summary.percentage() {
        Some(percentage) => info!(
            total_questions = summary.total_questions,
            found = summary.found_count,
            coverage_pct = %format!("{percentage:.2}"),
            "coverage evaluation complete"
        ),
        None => info!("no questions evaluated"),
    }
}
