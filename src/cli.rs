use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::embedding::ProviderKind;

#[derive(Parser, Debug)]
#[command(
    name = "doc-coverage",
    version,
    about = "Measure how well a documentation corpus answers a set of questions"
)]
pub struct Cli {
    /// Where the `api` command stores the Gemini key (default ~/.doc-coverage/config.json).
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a QA set against pre-embedded documentation chunks.
    Evaluate(EvaluateArgs),
    /// Flag sentences that drift from a reference style set.
    StyleCheck(StyleCheckArgs),
    /// Store the Gemini API key, or show the stored one masked.
    Api(ApiArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub gemini_base_url: Option<String>,

    #[arg(long)]
    pub openai_base_url: Option<String>,

    #[arg(long, default_value_t = 150)]
    pub requests_per_minute: usize,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    pub qa_csv: PathBuf,

    pub chunks_json: PathBuf,

    #[arg(short = 'k', long = "top-k", default_value_t = 5)]
    pub top_k: usize,

    #[arg(short = 'o', long, default_value = "coverage_results.json")]
    pub output: PathBuf,

    #[arg(long)]
    pub gemini_api_key: Option<String>,

    #[arg(long)]
    pub openai_api_key: Option<String>,

    #[arg(long, default_value = "question")]
    pub question_column: String,

    #[arg(long, default_value = "response")]
    pub answer_column: String,

    #[arg(long, default_value = "utf-8")]
    pub encoding: String,

    #[arg(long, default_value_t = 0.65)]
    pub sentence_threshold: f64,

    #[arg(long, default_value_t = 0.70)]
    pub coverage_threshold: f64,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Args, Debug, Clone)]
pub struct StyleCheckArgs {
    pub input_txt: PathBuf,

    pub style_json: PathBuf,

    #[arg(default_value_t = 0.8)]
    pub threshold: f64,

    /// Gemini key; falls back to `GOOGLE_API_KEY` and then the stored key.
    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long)]
    pub openai_api_key: Option<String>,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    pub key: Option<String>,

    #[arg(long, default_value_t = false)]
    pub show: bool,
}
