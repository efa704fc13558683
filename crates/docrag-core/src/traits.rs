use crate::types::ChatMessage;

/// Maps text to fixed-dimension vectors. `dim` is fixed per model and
/// known at construction; every vector returned by `embed_batch` has
/// exactly `dim` components.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn model_name(&self) -> &str;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Chat-style completion service.
pub trait GenerationProvider: Send + Sync {
    fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> anyhow::Result<String>;
}
