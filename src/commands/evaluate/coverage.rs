use tracing::{info, warn};

use crate::embedding::Embedder;
use crate::model::{
    Chunk, ChunkSummary, CoverageSummary, EvaluationResult, EvaluationStatus, NOT_AVAILABLE,
    QaPair, SentenceCoverageDetail, SentenceStatus,
};
use crate::semantic::{SimilarityMatch, cosine_similarity, is_comparable, top_k};
use crate::text::{EMBEDDING_TEXT_MAX_CHARS, TextNormalizer};

pub const DEFAULT_TOP_K: usize = 5;
pub const SENTENCE_COVERED_THRESHOLD: f64 = 0.65;
pub const ANSWER_COVERED_RATIO: f64 = 0.70;
const CONTENT_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageSettings {
    pub top_k: usize,
    pub max_embed_chars: usize,
    pub sentence_threshold: f64,
    pub coverage_threshold: f64,
}

impl Default for CoverageSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_embed_chars: EMBEDDING_TEXT_MAX_CHARS,
            sentence_threshold: SENTENCE_COVERED_THRESHOLD,
            coverage_threshold: ANSWER_COVERED_RATIO,
        }
    }
}

pub struct CoverageEvaluator<'a> {
    chunks: &'a [Chunk],
    embedder: &'a dyn Embedder,
    normalizer: &'a TextNormalizer,
    settings: CoverageSettings,
}

impl<'a> CoverageEvaluator<'a> {
    pub fn new(
        chunks: &'a [Chunk],
        embedder: &'a dyn Embedder,
        normalizer: &'a TextNormalizer,
        settings: CoverageSettings,
    ) -> Self {
        Self {
            chunks,
            embedder,
            normalizer,
            settings,
        }
    }

    /// Evaluates every pair in order and tallies the questions found.
    pub fn evaluate_all(&self, qa_pairs: &[QaPair]) -> (Vec<EvaluationResult>, CoverageSummary) {
        let total = qa_pairs.len();
        let mut summary = CoverageSummary {
            total_questions: total,
            found_count: 0,
        };
        let mut results = Vec::<EvaluationResult>::with_capacity(total);

        info!(
            questions = total,
            top_k = self.settings.top_k,
            sentence_threshold = self.settings.sentence_threshold,
            coverage_threshold = self.settings.coverage_threshold,
            "starting coverage evaluation"
        );

        for (index, qa) in qa_pairs.iter().enumerate() {
            info!(
                position = index + 1,
                total,
                question = %preview(&qa.question, 100),
                "evaluating question"
            );
            let result = self.evaluate_question(qa);
            if result.status.is_found() {
                summary.found_count += 1;
            }
            results.push(result);
        }

        (results, summary)
    }

    pub fn evaluate_question(&self, qa: &QaPair) -> EvaluationResult {
        let question_text = self
            .normalizer
            .embeddable_text(&qa.question, self.settings.max_embed_chars);
        let Some(query_embedding) = self.embedder.embed(&question_text) else {
            warn!(question = %preview(&qa.question, 100), "question embedding failed; skipping");
            return result_for(
                qa,
                EvaluationStatus::EmbeddingFailedForQuestion,
                Vec::new(),
                Vec::new(),
            );
        };

        let relevant = top_k(&query_embedding, self.chunks, self.settings.top_k);
        let top_chunks = relevant.iter().map(summarize_match).collect::<Vec<ChunkSummary>>();

        let sentences = self.normalizer.split_answer_sentences(&qa.ideal_answer);
        if sentences.is_empty() {
            warn!(
                question = %preview(&qa.question, 100),
                "ideal answer is empty or has no sentences after cleanup"
            );
            return result_for(
                qa,
                EvaluationStatus::EmptyOrInvalidIdealAnswer,
                Vec::new(),
                top_chunks,
            );
        }

        let details = sentences
            .iter()
            .map(|sentence| self.score_sentence(sentence, &relevant))
            .collect::<Vec<SentenceCoverageDetail>>();
        let covered = details
            .iter()
            .filter(|detail| detail.status == SentenceStatus::Covered)
            .count();
        let ratio = covered as f64 / details.len() as f64;
        let status = if ratio >= self.settings.coverage_threshold {
            EvaluationStatus::FoundSufficientCoverage
        } else {
            EvaluationStatus::NotFoundInsufficientCoverage
        };

        info!(
            status = status.as_str(),
            covered,
            sentences = details.len(),
            coverage_pct = %format!("{:.2}", ratio * 100.0),
            "question evaluated"
        );

        result_for(qa, status, details, top_chunks)
    }

    /// Scans the retrieved chunks in rank order and stops at the first one
    /// that clears the sentence threshold.
    fn score_sentence(
        &self,
        sentence: &str,
        relevant: &[SimilarityMatch<'_>],
    ) -> SentenceCoverageDetail {
        let sentence_text = self
            .normalizer
            .embeddable_text(sentence, self.settings.max_embed_chars);
        let Some(sentence_embedding) = self.embedder.embed(&sentence_text) else {
            return SentenceCoverageDetail {
                sentence: sentence.to_string(),
                status: SentenceStatus::EmbeddingFailed,
                max_similarity: 0.0,
                matched_chunk_ref: NOT_AVAILABLE.to_string(),
            };
        };

        let mut best_similarity = 0.0_f64;
        let mut matched_chunk_ref = NOT_AVAILABLE.to_string();
        let mut covered = false;

        for candidate in relevant {
            let Some(chunk_embedding) = candidate.chunk.embedding.as_deref() else {
                continue;
            };
            if !is_comparable(&sentence_embedding, chunk_embedding) {
                warn!(
                    chunk = %candidate.chunk.reference(),
                    sentence_dim = sentence_embedding.len(),
                    chunk_dim = chunk_embedding.len(),
                    "skipping chunk with mismatched embedding dimension"
                );
                continue;
            }

            let similarity = cosine_similarity(&sentence_embedding, chunk_embedding);
            if similarity > best_similarity {
                best_similarity = similarity;
                matched_chunk_ref = candidate.chunk.reference();
            }
            if similarity >= self.settings.sentence_threshold {
                covered = true;
                break;
            }
        }

        SentenceCoverageDetail {
            sentence: sentence.to_string(),
            status: if covered {
                SentenceStatus::Covered
            } else {
                SentenceStatus::NotCovered
            },
            max_similarity: best_similarity,
            matched_chunk_ref,
        }
    }
}

fn result_for(
    qa: &QaPair,
    status: EvaluationStatus,
    coverage_details: Vec<SentenceCoverageDetail>,
    top_k_relevant_chunks: Vec<ChunkSummary>,
) -> EvaluationResult {
    EvaluationResult {
        question: qa.question.clone(),
        ideal_answer: qa.ideal_answer.clone(),
        status,
        coverage_details,
        top_k_relevant_chunks,
    }
}

fn summarize_match(candidate: &SimilarityMatch<'_>) -> ChunkSummary {
    ChunkSummary {
        document_title: candidate.chunk.document_title.clone(),
        chunk_title: candidate.chunk.chunk_title.clone(),
        filepath: candidate.chunk.document_filepath.clone(),
        similarity_to_query: candidate.similarity,
        content_preview: content_preview(&candidate.chunk.chunk_content),
    }
}

pub(super) fn content_preview(content: &str) -> String {
    if content.chars().count() > CONTENT_PREVIEW_CHARS {
        format!("{}...", preview(content, CONTENT_PREVIEW_CHARS))
    } else {
        content.to_string()
    }
}

fn preview(text: &str, max_chars: usize) -> &str {
    crate::text::truncate_chars(text, max_chars)
}

pub fn evaluate_coverage(
    chunks: &[Chunk],
    qa_pairs: &[QaPair],
    embedder: &dyn Embedder,
    normalizer: &TextNormalizer,
    settings: CoverageSettings,
) -> (Vec<EvaluationResult>, CoverageSummary) {
    CoverageEvaluator::new(chunks, embedder, normalizer, settings).evaluate_all(qa_pairs)
}
