use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;
use tracing::{info, warn};

use crate::model::{Chunk, QaPair};
use crate::util::{ensure_file_exists, read_json};

/// Loads the chunk file and keeps only chunks that carry an embedding.
pub(super) fn load_chunks(path: &Path) -> Result<Vec<Chunk>> {
    let chunks = read_json::<Vec<Chunk>>(path, "chunks file")?;
    let total = chunks.len();
    let chunks = chunks
        .into_iter()
        .filter(|chunk| chunk.embedding.is_some())
        .collect::<Vec<Chunk>>();

    if chunks.is_empty() {
        bail!(
            "no chunks with embeddings found in {} ({total} chunks read)",
            path.display()
        );
    }

    info!(
        path = %path.display(),
        loaded = chunks.len(),
        skipped_without_embedding = total - chunks.len(),
        "loaded document chunks"
    );
    Ok(chunks)
}

#[derive(Debug, Clone)]
pub(super) struct QaColumns<'a> {
    pub question: &'a str,
    pub answer: &'a str,
}

/// Reads the QA table, decoding it with the WHATWG `encoding` label first.
pub(super) fn load_qa_pairs(
    path: &Path,
    columns: &QaColumns<'_>,
    encoding: &str,
) -> Result<Vec<QaPair>> {
    ensure_file_exists(path, "QA file")?;
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let text = decode_text(&raw, encoding)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    let pairs = parse_qa_pairs(&text, columns)
        .with_context(|| format!("failed to parse QA csv: {}", path.display()))?;

    if pairs.is_empty() {
        bail!("no QA pairs found in {}", path.display());
    }

    info!(path = %path.display(), pairs = pairs.len(), encoding, "loaded QA pairs");
    Ok(pairs)
}

fn decode_text(raw: &[u8], label: &str) -> Result<String> {
    let Some(encoding) = Encoding::for_label(label.trim().as_bytes()) else {
        bail!("unknown text encoding: {label}");
    };
    let (text, actual, had_errors) = encoding.decode(raw);
    if had_errors {
        warn!(
            encoding = actual.name(),
            "input contained malformed sequences; replaced with U+FFFD"
        );
    }
    Ok(text.into_owned())
}

fn parse_qa_pairs(text: &str, columns: &QaColumns<'_>) -> Result<Vec<QaPair>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().context("failed to read csv header")?.clone();
    let question_idx = headers.iter().position(|name| name.trim() == columns.question);
    let answer_idx = headers.iter().position(|name| name.trim() == columns.answer);
    if question_idx.is_none() || answer_idx.is_none() {
        warn!(
            question_column = columns.question,
            answer_column = columns.answer,
            "QA csv is missing an expected column; every row will be skipped"
        );
    }

    let mut pairs = Vec::<QaPair>::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read csv row {}", row + 2))?;
        let question = question_idx.and_then(|idx| record.get(idx));
        let answer = answer_idx.and_then(|idx| record.get(idx));

        let (Some(question), Some(answer)) = (question, answer) else {
            warn!(row = row + 2, "skipping QA row without question or answer value");
            continue;
        };
        pairs.push(QaPair {
            question: question.to_string(),
            ideal_answer: answer.to_string(),
        });
    }

    Ok(pairs)
}
