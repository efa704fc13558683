//! docrag-engine
//!
//! Retrieval-augmented answering: search the vector store, fold the
//! hits into a prompt, and ask a chat-completion provider. Generation
//! failures degrade into the answer text instead of failing the query,
//! so retrieval results are never lost to a flaky model call.

pub mod openai;

use anyhow::Result;
use docrag_core::types::{ChatMessage, QueryResult, RetrievalResult};
use docrag_core::traits::GenerationProvider;
use docrag_index::VectorStore;
use tracing::{debug, warn};

pub use openai::OpenAiChat;

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

const SYSTEM_PERSONA: &str = "You are an assistant that answers questions based on document content. \
     Please answer questions based on the provided document content. \
     If there is no relevant information in the documents, please state so.";

const EMPTY_CONTEXT: &str = "No relevant documents found.";

pub struct RagEngine {
    provider: Box<dyn GenerationProvider>,
    model: String,
    temperature: f32,
}

impl RagEngine {
    pub fn new(provider: Box<dyn GenerationProvider>, model: impl Into<String>) -> Self {
        Self { provider, model: model.into(), temperature: DEFAULT_TEMPERATURE }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Run one retrieval-augmented query. Retrieval errors propagate;
    /// generation errors are captured into the answer text and the
    /// retrieved chunks and context are returned regardless.
    pub fn query(&self, store: &VectorStore, question: &str, top_k: usize) -> Result<QueryResult> {
        let retrieved_docs = store.search(question, top_k)?;
        debug!("retrieved {} chunks for query", retrieved_docs.len());

        let context = build_context(&retrieved_docs);
        let prompt = build_prompt(question, &context);
        let messages = [ChatMessage::system(SYSTEM_PERSONA), ChatMessage::user(prompt)];

        let answer = match self.provider.complete(&self.model, &messages, self.temperature) {
            Ok(text) => text,
            Err(e) => {
                warn!("generation failed: {e}");
                format!("Error generating answer: {e}")
            }
        };

        Ok(QueryResult { answer, retrieved_docs, context })
    }
}

/// Number the retrieved chunks (1-based) into one context block. An
/// empty result set yields a fixed sentinel line so the prompt still
/// reads sensibly.
pub fn build_context(retrieved_docs: &[RetrievalResult]) -> String {
    if retrieved_docs.is_empty() {
        return EMPTY_CONTEXT.to_string();
    }
    let parts: Vec<String> = retrieved_docs
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("[Document Chunk {}]\n{}\n", i + 1, doc.text))
        .collect();
    parts.join("\n")
}

pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "Please answer the question based on the following document content.\n\
         Document Content: {context}\n\
         Question: {question}\n\
         Please answer the question based on the document content above. \
         If there is no relevant information in the documents, \
         please state that the answer cannot be found in the documents."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrag_core::types::SourceInfo;

    fn result(text: &str) -> RetrievalResult {
        RetrievalResult {
            text: text.to_string(),
            score: 0.5,
            similarity: 1.0 / 1.5,
            metadata: SourceInfo::new(),
            chunk_index: 0,
        }
    }

    #[test]
    fn context_labels_chunks_from_one() {
        let docs = vec![result("first chunk"), result("second chunk")];
        let context = build_context(&docs);
        assert_eq!(
            context,
            "[Document Chunk 1]\nfirst chunk\n\n[Document Chunk 2]\nsecond chunk\n"
        );
    }

    #[test]
    fn empty_retrieval_yields_the_sentinel() {
        assert_eq!(build_context(&[]), "No relevant documents found.");
    }

    #[test]
    fn prompt_embeds_question_and_context() {
        let prompt = build_prompt("what is rust?", "ctx-block");
        assert!(prompt.contains("Question: what is rust?"));
        assert!(prompt.contains("Document Content: ctx-block"));
    }
}
