use candle_core::{Device, Tensor, D};
use candle_nn::ops::softmax;
use candle_transformers::models::modernbert::{
    ClassifierConfig, ClassifierPooling, Config,
    ModernBertForSequenceClassification as CandleModernBertForSequenceClassification,
};
use serde::Deserialize;
use std::collections::HashMap;
use tokenizers::Tokenizer;

use crate::error::{PipelineError, Result};
use crate::loaders::{with_truncation, CheckpointLoader, TokenizerLoader};
use crate::pipelines::sentiment::pipeline::Prediction;

/// Available ModernBERT model sizes.
#[derive(Debug, Clone, Copy)]
pub enum ModernBertSize {
    /// Base model (~150M parameters).
    Base,
    /// Large model (~400M parameters).
    Large,
}

impl ModernBertSize {
    fn sentiment_repo(self) -> &'static str {
        match self {
            ModernBertSize::Base => "clapAI/modernBERT-base-multilingual-sentiment",
            ModernBertSize::Large => "clapAI/modernBERT-large-multilingual-sentiment",
        }
    }
}

impl std::fmt::Display for ModernBertSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModernBertSize::Base => "modernbert-base",
            ModernBertSize::Large => "modernbert-large",
        };
        write!(f, "{name}")
    }
}

impl crate::pipelines::cache::ModelOptions for ModernBertSize {
    fn cache_key(&self) -> String {
        self.to_string()
    }
}

pub struct SentimentModernBertModel {
    model: CandleModernBertForSequenceClassification,
    tokenizer: Tokenizer,
    device: Device,
    labels: Vec<String>,
}

impl SentimentModernBertModel {
    pub fn new(size: ModernBertSize, device: Device) -> Result<Self> {
        let repo_id = size.sentiment_repo();

        let (config_str, vb) = CheckpointLoader::new(repo_id).load(&device)?;
        let mut config: Config = serde_json::from_str(&config_str)?;
        let class_cfg: ClassifierConfigJson = serde_json::from_str(&config_str)?;

        let labels = labels_by_id(&class_cfg.id2label);
        patch_config_num_labels(&mut config, labels.len());

        let model = CandleModernBertForSequenceClassification::load(vb, &config)?;
        let max_length = class_cfg.max_tokens();
        let tokenizer = with_truncation(TokenizerLoader::new(repo_id).load()?, max_length, 0)?;

        tracing::info!(
            repo = repo_id,
            labels = ?labels,
            max_length,
            "sentiment model loaded"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            labels,
        })
    }

    fn scores_from_probs(&self, probs: &[f32]) -> Vec<Prediction> {
        probs
            .iter()
            .enumerate()
            .map(|(id, &score)| Prediction {
                label: self
                    .labels
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| format!("label_{id}")),
                score,
            })
            .collect()
    }
}

impl crate::pipelines::sentiment::model::SentimentAnalysisModel for SentimentModernBertModel {
    type Options = ModernBertSize;

    fn new(options: Self::Options, device: Device) -> Result<Self> {
        SentimentModernBertModel::new(options, device)
    }

    fn predict_scores(&self, text: &str) -> Result<Vec<Prediction>> {
        let tokens = self.tokenizer.encode(text, true).map_err(|e| {
            PipelineError::Tokenization(format!(
                "Tokenization failed on '{}': {}",
                &text.chars().take(50).collect::<String>(),
                e
            ))
        })?;

        let input_ids = Tensor::new(tokens.get_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(tokens.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let logits = self.model.forward(&input_ids, &attention_mask)?;
        let probs = softmax(&logits, D::Minus1)?.squeeze(0)?.to_vec1::<f32>()?;

        Ok(self.scores_from_probs(&probs))
    }

    fn predict_scores_batch(&self, texts: &[&str]) -> Result<Vec<Result<Vec<Prediction>>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let pad_token_id = self
            .tokenizer
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| self.tokenizer.token_to_id("<pad>"))
            .or_else(|| self.tokenizer.token_to_id("[PAD]"))
            .unwrap_or(0);

        let mut results: Vec<Result<Vec<Prediction>>> = Vec::with_capacity(texts.len());
        let mut valid = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match self.tokenizer.encode(*text, true) {
                Ok(encoding) => {
                    valid.push((i, encoding));
                    results.push(Ok(Vec::new()));
                }
                Err(e) => results.push(Err(PipelineError::Tokenization(format!(
                    "Tokenization failed on '{}': {}",
                    &text.chars().take(50).collect::<String>(),
                    e
                )))),
            }
        }

        if valid.is_empty() {
            return Ok(results);
        }

        let max_len = valid.iter().map(|(_, e)| e.len()).max().unwrap_or(0);

        let mut all_token_ids: Vec<u32> = Vec::with_capacity(valid.len() * max_len);
        let mut all_attention_masks: Vec<u32> = Vec::with_capacity(valid.len() * max_len);

        for (_, encoding) in &valid {
            let mut token_ids = encoding.get_ids().to_vec();
            let mut attention_mask = encoding.get_attention_mask().to_vec();
            token_ids.resize(max_len, pad_token_id);
            attention_mask.resize(max_len, 0);
            all_token_ids.extend(token_ids);
            all_attention_masks.extend(attention_mask);
        }

        let batch_size = valid.len();
        let input_ids = Tensor::from_vec(all_token_ids, (batch_size, max_len), &self.device)?;
        let attention_mask =
            Tensor::from_vec(all_attention_masks, (batch_size, max_len), &self.device)?;

        let logits = self.model.forward(&input_ids, &attention_mask)?;
        let probs_2d = softmax(&logits, D::Minus1)?.to_vec2::<f32>()?;

        for ((orig_idx, _), probs) in valid.iter().zip(probs_2d) {
            results[*orig_idx] = Ok(self.scores_from_probs(&probs));
        }

        Ok(results)
    }

    fn device(&self) -> &Device {
        &self.device
    }
}

#[derive(Deserialize)]
struct ClassifierConfigJson {
    #[serde(default)]
    id2label: HashMap<String, String>,
    #[serde(default)]
    max_position_embeddings: Option<usize>,
}

const DEFAULT_MAX_TOKENS: usize = 512;

impl ClassifierConfigJson {
    /// Longest input, in tokens, the position embeddings cover.
    fn max_tokens(&self) -> usize {
        self.max_position_embeddings.unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

/// Order `id2label` by numeric id, filling gaps with `label_{id}`.
fn labels_by_id(id2label: &HashMap<String, String>) -> Vec<String> {
    let mut indexed: Vec<(usize, &String)> = id2label
        .iter()
        .filter_map(|(id, label)| id.parse::<usize>().ok().map(|id| (id, label)))
        .collect();
    indexed.sort_by_key(|(id, _)| *id);

    let len = indexed.last().map(|(id, _)| id + 1).unwrap_or(0);
    let mut labels: Vec<String> = (0..len).map(|id| format!("label_{id}")).collect();
    for (id, label) in indexed {
        labels[id] = label.clone();
    }
    labels
}

fn patch_config_num_labels(config: &mut Config, num_labels: usize) {
    let matches = config
        .classifier_config
        .as_ref()
        .map(|c| c.id2label.len())
        .unwrap_or(0)
        == num_labels;

    if !matches {
        let id2label: HashMap<String, String> = (0..num_labels)
            .map(|i| (i.to_string(), format!("label_{i}")))
            .collect();
        let label2id: HashMap<String, String> = id2label
            .iter()
            .map(|(k, v)| (v.clone(), k.clone()))
            .collect();

        config.classifier_config = Some(ClassifierConfig {
            id2label,
            label2id,
            classifier_pooling: ClassifierPooling::default(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_ordered_by_numeric_id() {
        let id2label: HashMap<String, String> = [
            ("10", "ten"),
            ("2", "negative"),
            ("0", "positive"),
            ("1", "neutral"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let labels = labels_by_id(&id2label);
        assert_eq!(labels.len(), 11);
        assert_eq!(&labels[..3], &["positive", "neutral", "negative"]);
        assert_eq!(labels[5], "label_5");
        assert_eq!(labels[10], "ten");
    }

    #[test]
    fn non_numeric_ids_are_ignored() {
        let id2label: HashMap<String, String> =
            [("x".to_string(), "bogus".to_string())].into_iter().collect();
        assert!(labels_by_id(&id2label).is_empty());
    }

    #[test]
    fn inputs_are_capped_at_the_position_embedding_count() {
        let cfg: ClassifierConfigJson =
            serde_json::from_str(r#"{"max_position_embeddings": 8192}"#).unwrap();
        assert_eq!(cfg.max_tokens(), 8192);

        let cfg: ClassifierConfigJson = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.max_tokens(), DEFAULT_MAX_TOKENS);
    }
}
