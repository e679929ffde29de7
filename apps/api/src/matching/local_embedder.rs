//! Local BERT sentence embedder (candle), weights fetched from the Hugging Face hub.

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::{Tokenizer, TruncationParams};

use crate::matching::semantic::{EmbeddingError, SentenceEmbedder};

/// Longest token sequence fed to the model; longer texts are truncated.
const MAX_SEQ_LEN: usize = 256;

impl From<candle_core::Error> for EmbeddingError {
    fn from(e: candle_core::Error) -> Self {
        EmbeddingError::Inference(e.to_string())
    }
}

pub struct LocalEmbedder {
    model_id: String,
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl LocalEmbedder {
    pub fn load(model_id: &str) -> Result<Self, EmbeddingError> {
        let unavailable = |what: &str, e: String| {
            EmbeddingError::Unavailable(format!("{what} for {model_id}: {e}"))
        };

        let device = Device::Cpu;
        let api = Api::new().map_err(|e| unavailable("hub client", e.to_string()))?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .map_err(|e| unavailable("config.json", e.to_string()))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| unavailable("tokenizer.json", e.to_string()))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| unavailable("model.safetensors", e.to_string()))?;

        let config_json = std::fs::read_to_string(config_path)
            .map_err(|e| unavailable("config.json", e.to_string()))?;
        let config: Config = serde_json::from_str(&config_json)
            .map_err(|e| unavailable("config.json", e.to_string()))?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| unavailable("tokenizer", e.to_string()))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| unavailable("tokenizer truncation", e.to_string()))?;
        tokenizer.with_padding(None);

        // SAFETY: the weights file is a read-only cache entry owned by hf-hub.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device) }
            .map_err(|e| unavailable("weights", e.to_string()))?;
        let model =
            BertModel::load(vb, &config).map_err(|e| unavailable("model", e.to_string()))?;

        Ok(Self {
            model_id: model_id.to_string(),
            model,
            tokenizer,
            device,
        })
    }
}

impl SentenceEmbedder for LocalEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Attention-masked mean pooling over the last hidden state.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Inference(format!("tokenization failed: {e}")))?;

        let token_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = token_ids.zeros_like()?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;

        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?.clamp(1e-9, f32::MAX)?;
        let pooled = summed.broadcast_div(&counts)?.squeeze(0)?;

        Ok(pooled.to_vec1::<f32>()?)
    }
}
