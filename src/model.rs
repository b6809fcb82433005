use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

pub const NOT_AVAILABLE: &str = "N/A";

pub type Embedding = Vec<f32>;

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Reads an embedding that may be null, missing, or malformed. Anything that
/// is not an array of numbers becomes `None` so the item is skipped instead of
/// failing the whole file.
fn lenient_embedding<'de, D>(deserializer: D) -> Result<Option<Embedding>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(embedding_from_value))
}

fn embedding_from_value(value: Value) -> Option<Embedding> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            warn!(kind = json_kind(&other), "ignoring embedding that is not an array");
            return None;
        }
    };

    let mut embedding = Embedding::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Some(number) = item.as_f64() else {
            warn!(
                index,
                kind = json_kind(item),
                "ignoring embedding with a non-numeric component"
            );
            return None;
        };
        embedding.push(number as f32);
    }
    Some(embedding)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    #[serde(default = "not_available")]
    pub document_title: String,
    #[serde(default = "not_available")]
    pub chunk_title: String,
    #[serde(default = "not_available")]
    pub document_filepath: String,
    #[serde(default)]
    pub document_slug: Option<String>,
    #[serde(default)]
    pub chunk_content: String,
    #[serde(default, deserialize_with = "lenient_embedding")]
    pub embedding: Option<Embedding>,
}

impl Chunk {
    /// Human-readable reference used in coverage details.
    pub fn reference(&self) -> String {
        format!("Doc: {} | Sec: {}", self.document_title, self.chunk_title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaPair {
    pub question: String,
    pub ideal_answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentenceStatus {
    #[serde(rename = "Covered")]
    Covered,
    #[serde(rename = "Not Covered")]
    NotCovered,
    #[serde(rename = "Sentence Embedding Failed")]
    EmbeddingFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentenceCoverageDetail {
    pub sentence: String,
    pub status: SentenceStatus,
    pub max_similarity: f64,
    pub matched_chunk_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkSummary {
    pub document_title: String,
    pub chunk_title: String,
    pub filepath: String,
    pub similarity_to_query: f64,
    pub content_preview: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvaluationStatus {
    #[serde(rename = "Found (Sufficient Coverage)")]
    FoundSufficientCoverage,
    #[serde(rename = "Not Found (Insufficient Coverage)")]
    NotFoundInsufficientCoverage,
    #[serde(rename = "Empty/Invalid Ideal Answer")]
    EmptyOrInvalidIdealAnswer,
    #[serde(rename = "Question Embedding Failed")]
    EmbeddingFailedForQuestion,
}

impl EvaluationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FoundSufficientCoverage => "Found (Sufficient Coverage)",
            Self::NotFoundInsufficientCoverage => "Not Found (Insufficient Coverage)",
            Self::EmptyOrInvalidIdealAnswer => "Empty/Invalid Ideal Answer",
            Self::EmbeddingFailedForQuestion => "Question Embedding Failed",
        }
    }

    pub fn is_found(self) -> bool {
        matches!(self, Self::FoundSufficientCoverage)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResult {
    pub question: String,
    pub ideal_answer: String,
    pub status: EvaluationStatus,
    pub coverage_details: Vec<SentenceCoverageDetail>,
    pub top_k_relevant_chunks: Vec<ChunkSummary>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageSummary {
    pub total_questions: usize,
    pub found_count: usize,
}

impl CoverageSummary {
    /// Share of questions with sufficient coverage, or `None` when nothing was evaluated.
    pub fn percentage(&self) -> Option<f64> {
        if self.total_questions == 0 {
            return None;
        }
        Some(self.found_count as f64 / self.total_questions as f64 * 100.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StyleReference {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_embedding")]
    pub embedding: Option<Embedding>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StyleViolation {
    pub sentence: String,
    pub similarity: f64,
}
