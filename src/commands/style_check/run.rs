use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use super::check::check_style;
use crate::cli::StyleCheckArgs;
use crate::commands::provider_settings;
use crate::config::{env_var, load_config, resolve_config_path, resolve_credentials};
use crate::embedding::{ProviderKind, build_embedder};
use crate::embedding::clock::SystemClock;
use crate::model::StyleReference;
use crate::text::TextNormalizer;
use crate::util::{ensure_file_exists, read_json, write_json_stdout};

pub fn run(args: StyleCheckArgs, config_path: Option<&Path>) -> Result<()> {
    ensure_file_exists(&args.input_txt, "input file")?;
    let text = fs::read_to_string(&args.input_txt)
        .with_context(|| format!("failed to read {}", args.input_txt.display()))?;
    let references = read_json::<Vec<StyleReference>>(&args.style_json, "style embeddings file")?;
    info!(
        path = %args.style_json.display(),
        references = references.len(),
        "loaded style references"
    );

    let config_path = resolve_config_path(config_path)?;
    let stored = load_config(&config_path)?;
    let credentials = resolve_credentials(
        args.api_key.as_deref(),
        args.openai_api_key.as_deref(),
        &stored,
        env_var,
    );
    let provider = args.provider.provider.unwrap_or(ProviderKind::Gemini);
    let settings = provider_settings(provider, credentials, &args.provider);
    let embedder = build_embedder(&settings, Arc::new(SystemClock))
        .with_context(|| format!("failed to configure {} embeddings", provider.as_str()))?;
    let normalizer = TextNormalizer::new()?;

    let flagged = check_style(
        &text,
        &references,
        embedder.as_ref(),
        &normalizer,
        args.threshold,
    );

    write_json_stdout(&flagged)?;
    if flagged.is_empty() {
        println!("No style issues found.");
    } else {
        println!("Off-style passages found.");
    }
    Ok(())
}
