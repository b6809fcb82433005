use crate::model::Chunk;

#[derive(Debug, Clone, Copy)]
pub struct SimilarityMatch<'a> {
    pub similarity: f64,
    pub chunk: &'a Chunk,
}

/// Cosine similarity accumulated in f64.
///
/// Empty vectors, vectors of different lengths and zero-norm vectors are not
/// comparable and score 0.0.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f64 {
    if left.is_empty() || right.is_empty() || left.len() != right.len() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut left_norm = 0.0_f64;
    let mut right_norm = 0.0_f64;
    for (left_value, right_value) in left.iter().zip(right.iter()) {
        let left_value = f64::from(*left_value);
        let right_value = f64::from(*right_value);
        dot += left_value * right_value;
        left_norm += left_value * left_value;
        right_norm += right_value * right_value;
    }

    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }

    dot / (left_norm.sqrt() * right_norm.sqrt())
}

pub fn is_comparable(query: &[f32], candidate: &[f32]) -> bool {
    !candidate.is_empty() && candidate.len() == query.len()
}

/// Ranks chunks by similarity to `query` and keeps the best `k`.
///
/// Chunks without an embedding, with an empty one, or with a different
/// dimensionality are skipped. Ties keep input order.
pub fn top_k<'a>(query: &[f32], chunks: &'a [Chunk], k: usize) -> Vec<SimilarityMatch<'a>> {
    let mut matches = chunks
        .iter()
        .filter_map(|chunk| {
            let embedding = chunk.embedding.as_deref()?;
            if !is_comparable(query, embedding) {
                return None;
            }
            Some(SimilarityMatch {
                similarity: cosine_similarity(query, embedding),
                chunk,
            })
        })
        .collect::<Vec<SimilarityMatch<'a>>>();

    matches.sort_by(|left, right| right.similarity.total_cmp(&left.similarity));
    matches.truncate(k);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(title: &str, embedding: Option<Vec<f32>>) -> Chunk {
        Chunk {
            document_title: "Doc".to_string(),
            chunk_title: title.to_string(),
            document_filepath: "doc.md".to_string(),
            document_slug: None,
            chunk_content: String::new(),
            embedding,
        }
    }

    #[test]
    fn cosine_similarity_of_vector_with_itself_is_one() {
        let vector = [0.3_f32, -1.2, 4.5];
        assert!((cosine_similarity(&vector, &vector) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_similarity_guards_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn top_k_orders_by_similarity() {
        let chunks = vec![
            chunk("A", Some(vec![1.0, 0.0])),
            chunk("B", Some(vec![0.5, 0.5])),
            chunk("C", Some(vec![-1.0, 0.0])),
        ];

        let top = top_k(&[1.0, 0.0], &chunks, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].chunk, &chunks[0]);
        assert_eq!(top[1].chunk, &chunks[1]);
        assert!(top[0].similarity > top[1].similarity);
    }

    #[test]
    fn top_k_skips_missing_empty_and_mismatched_embeddings() {
        let chunks = vec![
            chunk("missing", None),
            chunk("empty", Some(Vec::new())),
            chunk("wide", Some(vec![1.0, 0.0, 0.0])),
            chunk("ok", Some(vec![0.0, 1.0])),
        ];

        let top = top_k(&[1.0, 0.0], &chunks, 10);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].chunk.chunk_title, "ok");
    }

    #[test]
    fn top_k_never_exceeds_k_and_keeps_ties_in_input_order() {
        let chunks = (0..6)
            .map(|index| chunk(&format!("tie-{index}"), Some(vec![2.0, 2.0])))
            .collect::<Vec<Chunk>>();

        let top = top_k(&[1.0, 1.0], &chunks, 3);
        let titles = top
            .iter()
            .map(|value| value.chunk.chunk_title.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(titles, vec!["tie-0", "tie-1", "tie-2"]);
        assert!(top_k(&[1.0, 1.0], &chunks, 0).is_empty());
    }
}
