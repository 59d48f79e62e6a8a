use serde::{Deserialize, Serialize};

/// Body of `POST /embeddings` for a single input.
#[derive(Debug, Serialize)]
pub(crate) struct EmbeddingRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

impl EmbeddingResponse {
    pub(crate) fn into_first(self) -> Option<Vec<f32>> {
        self.data
            .into_iter()
            .min_by_key(|data| data.index)
            .map(|data| data.embedding)
            .filter(|embedding| !embedding.is_empty())
    }
}
