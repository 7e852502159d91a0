//! Recursive character text splitter
//!
//! Splits on the coarsest separator present (paragraph, line, word,
//! character), recursing into pieces that are still too long, then merges
//! neighbouring pieces back into chunks of at most `chunk_size` characters
//! with up to `chunk_overlap` characters shared between consecutive chunks.

use std::collections::VecDeque;

use arag_core::Document;

const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split on `separator`, keeping it at the front of every piece but the first
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut pieces = Vec::new();
    let mut parts = text.split(separator);
    if let Some(first) = parts.next() {
        pieces.push(first.to_string());
    }
    for part in parts {
        pieces.push(format!("{}{}", separator, part));
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Split every document; each chunk carries a copy of its document's
    /// metadata and nothing else.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.page_content)
                    .into_iter()
                    .map(|chunk| Document::with_metadata(chunk, doc.metadata.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().cloned().unwrap_or_default();
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = String::new();
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate.clone();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut short_pieces = Vec::new();

        for piece in split_keeping_separator(text, &separator) {
            if char_len(&piece) < self.chunk_size {
                short_pieces.push(piece);
                continue;
            }

            if !short_pieces.is_empty() {
                chunks.extend(self.merge(&short_pieces));
                short_pieces.clear();
            }

            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !short_pieces.is_empty() {
            chunks.extend(self.merge(&short_pieces));
        }

        chunks
    }

    /// Greedily pack pieces into chunks, carrying a tail of at most
    /// `chunk_overlap` characters into the next chunk
    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                push_trimmed(&mut chunks, &current);

                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match current.pop_front() {
                        Some(dropped) => total -= char_len(dropped),
                        None => break,
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        push_trimmed(&mut chunks, &current);
        chunks
    }
}

fn push_trimmed(chunks: &mut Vec<String>, current: &VecDeque<&str>) {
    let joined: String = current.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(500, 50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arag_core::Metadata;
    use serde_json::json;

    #[test]
    fn test_overlapping_word_chunks() {
        let splitter = TextSplitter::new(10, 5);
        assert_eq!(
            splitter.split_text("aaaa bbbb cccc dddd"),
            vec!["aaaa bbbb", "bbbb cccc", "cccc dddd"]
        );
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = TextSplitter::default();
        let text = "# Campanha\n\nPúblico: pais de alunos.\nTom: acolhedor.";
        assert_eq!(splitter.split_text(text), vec![text.to_string()]);
    }

    #[test]
    fn test_falls_back_to_characters() {
        let splitter = TextSplitter::new(5, 0);
        assert_eq!(splitter.split_text("abcdefghijkl"), vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn test_paragraphs_split_before_words() {
        let splitter = TextSplitter::new(40, 0);
        let text = "Primeiro parágrafo curto.\n\nSegundo parágrafo também curto.";
        assert_eq!(
            splitter.split_text(text),
            vec!["Primeiro parágrafo curto.", "Segundo parágrafo também curto."]
        );
    }

    #[test]
    fn test_chunks_respect_size() {
        let splitter = TextSplitter::new(40, 10);
        let text = "Gere uma mensagem de CRM de contagem regressiva para o curso de programação \
            em Python que começa em uma live.\n\nUse tom animado, inclua data e horário, \
            e termine com uma chamada para ação clara.";
        let chunks = splitter.split_text(text);
        assert!(chunks.len() > 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
    }

    #[test]
    fn test_split_documents_keeps_metadata() {
        let mut metadata = Metadata::new();
        metadata.insert("file_path".into(), json!("crm/a.md"));
        let doc = Document::with_metadata("aaaa bbbb cccc dddd", metadata.clone());

        let chunks = TextSplitter::new(10, 5).split_documents(&[doc]);
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert_eq!(chunk.metadata, metadata);
        }
    }
}
