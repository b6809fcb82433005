use tracing::debug;

use crate::embedding::Embedder;
use crate::model::{NOT_AVAILABLE, StyleReference, StyleViolation};
use crate::semantic::cosine_similarity;
use crate::text::{EMBEDDING_TEXT_MAX_CHARS, TextNormalizer};

/// Flags every sentence whose closest reference embedding stays under
/// `threshold`. Sentences that cannot be embedded are left out.
pub fn check_style(
    text: &str,
    references: &[StyleReference],
    embedder: &dyn Embedder,
    normalizer: &TextNormalizer,
    threshold: f64,
) -> Vec<StyleViolation> {
    let mut flagged = Vec::<StyleViolation>::new();

    for sentence in normalizer.split_style_sentences(text) {
        let clean = normalizer.embeddable_text(&sentence, EMBEDDING_TEXT_MAX_CHARS);
        if clean.is_empty() {
            continue;
        }
        let Some(embedding) = embedder.embed(&clean) else {
            debug!(sentence = %sentence, "skipping sentence without embedding");
            continue;
        };

        let (best_similarity, closest) = closest_reference(&embedding, references);

        if best_similarity < threshold {
            debug!(
                sentence = %sentence,
                similarity = best_similarity,
                closest = closest.unwrap_or(NOT_AVAILABLE),
                "sentence is off-style"
            );
            flagged.push(StyleViolation {
                sentence,
                similarity: best_similarity,
            });
        }
    }

    flagged
}

/// Highest similarity over every reference with an embedding, starting at
/// 0.0, plus the text of the reference that produced it.
pub(super) fn closest_reference<'a>(
    embedding: &[f32],
    references: &'a [StyleReference],
) -> (f64, Option<&'a str>) {
    let mut best_similarity = 0.0_f64;
    let mut closest = None;

    for reference in references {
        let Some(candidate) = reference.embedding.as_deref() else {
            continue;
        };
        if candidate.is_empty() {
            continue;
        }
        let similarity = cosine_similarity(embedding, candidate);
        if similarity > best_similarity {
            best_similarity = similarity;
            closest = reference.text.as_deref();
        }
    }

    (best_similarity, closest)
}
