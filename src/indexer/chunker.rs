use super::tokenizer::ChunkTokenizer;
use crate::error::ChunkingError;
use crate::types::{Document, TextSpan};
use anyhow::Result;
use std::sync::Arc;

/// Token-window splitter for documents longer than the embedding budget.
///
/// Windows hold `size` tokens and advance by `size - overlap`, so neighbouring
/// chunks share the text of `overlap` tokens.
pub struct CodeChunker {
    size: usize,
    overlap: usize,
    tokenizer: Arc<dyn ChunkTokenizer>,
}

impl CodeChunker {
    pub fn new(size: usize, overlap: usize, tokenizer: Arc<dyn ChunkTokenizer>) -> Result<Self> {
        if size == 0 {
            return Err(ChunkingError::InvalidChunkSize("chunk size must be greater than 0".into()).into());
        }
        if overlap >= size {
            return Err(ChunkingError::InvalidChunkSize(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, size
            ))
            .into());
        }

        Ok(Self {
            size,
            overlap,
            tokenizer,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Byte spans of the chunks of `text`, in order
    pub fn split_text(&self, text: &str) -> Result<Vec<TextSpan>> {
        let offsets = self
            .tokenizer
            .token_offsets(text)
            .map_err(|e| ChunkingError::TokenizationFailed(format!("{:#}", e)))?;

        let token_count = offsets.len();
        if token_count <= self.size {
            return Ok(vec![TextSpan {
                start: 0,
                end: text.len(),
            }]);
        }

        let step = self.size - self.overlap;
        let mut spans = Vec::new();
        let mut first = 0;

        loop {
            let next = (first + self.size).min(token_count);
            let start = if first == 0 { 0 } else { offsets[first].0 };
            let end = if next >= token_count {
                text.len()
            } else {
                offsets[next].0
            };
            spans.push(TextSpan { start, end });

            if next >= token_count {
                break;
            }
            first += step;
        }

        Ok(spans)
    }

    /// Split every document; short documents pass through unchanged.
    ///
    /// Each chunk carries a copy of its parent's metadata.
    pub fn split_documents(&self, documents: Vec<Document>) -> Result<Vec<Document>> {
        let mut chunks = Vec::with_capacity(documents.len());

        for document in documents {
            let spans = self.split_text(&document.content)?;
            if spans.len() == 1 {
                chunks.push(document);
                continue;
            }

            tracing::debug!(
                "Split {} document from {} into {} chunks",
                document.metadata.unit_type,
                document.metadata.file,
                spans.len()
            );

            for span in spans {
                let content = document.content.get(span.start..span.end).ok_or_else(|| {
                    ChunkingError::TokenizationFailed(format!(
                        "token offset {}..{} is not a character boundary",
                        span.start, span.end
                    ))
                })?;
                chunks.push(Document {
                    content: content.to_string(),
                    metadata: document.metadata.clone(),
                });
            }
        }

        Ok(chunks)
    }
}
