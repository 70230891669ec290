use candle_core::{DType, Device, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use candle_transformers::models::xlm_roberta::{Config as XlmRobertaConfig, XLMRobertaModel};
use serde::Deserialize;
use std::collections::HashMap;
use tokenizers::{Encoding, Tokenizer};

use crate::error::{PipelineError, Result};
use crate::loaders::{with_truncation, CheckpointLoader, TokenizerLoader};
use crate::pipelines::pos_tagging::{PosScheme, Token};

const DEFAULT_MAX_TOKENS: usize = 512;
const EMBEDDING_BATCH_SIZE: usize = 32;
// Tokens repeated at the start of each overflow window of a long sentence.
const WINDOW_STRIDE: usize = 32;

// ============ POS tagging ============

/// Available BERT part-of-speech tagger sizes (Universal POS labels).
#[derive(Debug, Clone, Copy)]
pub enum BertPosSize {
    /// Base model (~110M parameters).
    Base,
    /// Large model (~340M parameters).
    Large,
}

impl BertPosSize {
    fn repo(self) -> &'static str {
        match self {
            BertPosSize::Base => "KoichiYasuoka/bert-base-japanese-upos",
            BertPosSize::Large => "KoichiYasuoka/bert-large-japanese-upos",
        }
    }
}

impl std::fmt::Display for BertPosSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BertPosSize::Base => "bert-upos-base",
            BertPosSize::Large => "bert-upos-large",
        };
        write!(f, "{name}")
    }
}

impl crate::pipelines::cache::ModelOptions for BertPosSize {
    fn cache_key(&self) -> String {
        self.to_string()
    }
}

#[derive(Deserialize)]
struct TokenClassifierConfigJson {
    hidden_size: usize,
    #[serde(default)]
    id2label: HashMap<String, String>,
    #[serde(default)]
    max_position_embeddings: Option<usize>,
}

pub struct BertPosModel {
    encoder: BertModel,
    classifier: Linear,
    tokenizer: Tokenizer,
    id2label: HashMap<u32, String>,
    device: Device,
}

impl BertPosModel {
    pub fn new(size: BertPosSize, device: Device) -> Result<Self> {
        let repo_id = size.repo();

        let (config_str, vb) = CheckpointLoader::new(repo_id).load(&device)?;
        let config: BertConfig = serde_json::from_str(&config_str)?;
        let head: TokenClassifierConfigJson = serde_json::from_str(&config_str)?;

        let id2label: HashMap<u32, String> = head
            .id2label
            .into_iter()
            .filter_map(|(id, label)| id.parse::<u32>().ok().map(|id| (id, label)))
            .collect();
        if id2label.is_empty() {
            return Err(PipelineError::Unexpected(format!(
                "'{repo_id}' has no id2label mapping; not a token classifier"
            )));
        }

        let encoder = BertModel::load(vb.clone(), &config)?;
        let classifier =
            candle_nn::linear(head.hidden_size, id2label.len(), vb.pp("classifier"))?;

        let max_length = head.max_position_embeddings.unwrap_or(DEFAULT_MAX_TOKENS);
        let tokenizer =
            with_truncation(TokenizerLoader::new(repo_id).load()?, max_length, WINDOW_STRIDE)?;

        tracing::info!(repo = repo_id, labels = id2label.len(), "pos tagger loaded");

        Ok(Self {
            encoder,
            classifier,
            tokenizer,
            id2label,
            device,
        })
    }

    fn tag_sentence(
        &self,
        sentence: &str,
        base_offset: usize,
        out: &mut Vec<Token>,
    ) -> Result<()> {
        let encoding = self.tokenizer.encode(sentence, true).map_err(|e| {
            PipelineError::Tokenization(format!(
                "Tokenization failed on '{}': {}",
                &sentence.chars().take(50).collect::<String>(),
                e
            ))
        })?;

        // Overflow windows keep offsets into the full sentence.
        let windows: Vec<&Encoding> = std::iter::once(&encoding)
            .chain(encoding.get_overflowing())
            .collect();
        if windows.len() > 1 {
            tracing::debug!(
                chars = sentence.chars().count(),
                windows = windows.len(),
                "long sentence tagged in overlapping windows"
            );
        }

        let mut per_window = Vec::with_capacity(windows.len());
        for window in windows {
            let predicted = self.predict_window(window)?;
            per_window.push(self.labelled_spans(window, &predicted)?);
        }

        let labelled = merge_windows(per_window);
        for group in group_entities(&labelled) {
            let Some(text) = sentence.get(group.start..group.end) else {
                continue;
            };
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            tracing::trace!(
                offset = base_offset + group.start,
                text,
                pos = group.entity,
                "token"
            );
            out.push(Token {
                text: text.to_string(),
                lemma: text.to_string(),
                pos: group.entity.to_string(),
                tag: group.first_label.to_string(),
            });
        }
        Ok(())
    }

    fn predict_window(&self, window: &Encoding) -> Result<Vec<u32>> {
        let input_ids = Tensor::new(window.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask =
            Tensor::new(window.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let hidden = self
            .encoder
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let logits = self.classifier.forward(&hidden)?;
        Ok(logits.argmax(D::Minus1)?.squeeze(0)?.to_vec1::<u32>()?)
    }

    fn labelled_spans<'a>(
        &'a self,
        encoding: &Encoding,
        predicted: &[u32],
    ) -> Result<Vec<LabelledSpan<'a>>> {
        let mut spans = Vec::with_capacity(predicted.len());
        for (idx, &label_id) in predicted.iter().enumerate() {
            if encoding.get_special_tokens_mask().get(idx) == Some(&1) {
                continue;
            }
            let (start, end) = encoding.get_offsets()[idx];
            if start == end {
                continue;
            }
            let label = self.id2label.get(&label_id).ok_or_else(|| {
                PipelineError::Unexpected(format!("Predicted label ID {label_id} not in id2label"))
            })?;
            spans.push(LabelledSpan {
                start,
                end,
                label: label.as_str(),
            });
        }
        Ok(spans)
    }
}

impl crate::pipelines::pos_tagging::PosTaggingModel for BertPosModel {
    type Options = BertPosSize;

    fn new(options: Self::Options, device: Device) -> Result<Self> {
        BertPosModel::new(options, device)
    }

    fn tag(&self, text: &str) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        for (offset, sentence) in split_sentences(text) {
            self.tag_sentence(sentence, offset, &mut tokens)?;
        }
        Ok(tokens)
    }

    fn scheme(&self) -> PosScheme {
        PosScheme::Upos
    }

    fn device(&self) -> &Device {
        &self.device
    }
}

/// A sub-word with its byte span in the sentence and predicted label.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LabelledSpan<'a> {
    start: usize,
    end: usize,
    label: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct EntityGroup<'a> {
    start: usize,
    end: usize,
    entity: &'a str,
    first_label: &'a str,
}

fn split_bio(label: &str) -> (bool, &str) {
    if let Some(rest) = label.strip_prefix("B-") {
        (true, rest)
    } else if let Some(rest) = label.strip_prefix("I-") {
        (false, rest)
    } else {
        (false, label)
    }
}

/// Concatenate per-window spans, skipping the stride overlap a window shares with the
/// one before it. Overlapping sub-words keep the earlier window's label.
fn merge_windows<'a>(windows: Vec<Vec<LabelledSpan<'a>>>) -> Vec<LabelledSpan<'a>> {
    let mut merged: Vec<LabelledSpan<'a>> = Vec::new();
    for window in windows {
        let covered = merged.last().map_or(0, |span| span.end);
        merged.extend(window.into_iter().filter(|span| span.start >= covered));
    }
    merged
}

/// "Simple" aggregation: consecutive sub-words with the same label merge unless a `B-`
/// prefix opens a new entity.
fn group_entities<'a>(spans: &[LabelledSpan<'a>]) -> Vec<EntityGroup<'a>> {
    let mut groups: Vec<EntityGroup<'a>> = Vec::new();
    for span in spans {
        let (begins, entity) = split_bio(span.label);
        match groups.last_mut() {
            Some(last) if last.entity == entity && !begins => {
                last.end = span.end;
            }
            _ => groups.push(EntityGroup {
                start: span.start,
                end: span.end,
                entity,
                first_label: span.label,
            }),
        }
    }
    groups
}

/// Split after sentence-final punctuation and newlines, returning byte offsets.
fn split_sentences(text: &str) -> Vec<(usize, &str)> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        if matches!(ch, '。' | '！' | '？' | '!' | '?' | '\n') {
            let end = idx + ch.len_utf8();
            push_sentence(text, start, end, &mut sentences);
            start = end;
        }
    }
    push_sentence(text, start, text.len(), &mut sentences);
    sentences
}

fn push_sentence<'a>(
    text: &'a str,
    start: usize,
    end: usize,
    out: &mut Vec<(usize, &'a str)>,
) {
    let sentence = &text[start..end];
    if !sentence.trim().is_empty() {
        out.push((start, sentence));
    }
}

// ============ Sentence embeddings ============

/// Available multilingual E5 sentence-embedding sizes.
#[derive(Debug, Clone, Copy)]
pub enum BertEmbeddingSize {
    /// Small model (~118M parameters, 384 dimensions).
    Small,
    /// Base model (~278M parameters, 768 dimensions). XLM-RoBERTa architecture.
    Base,
}

impl BertEmbeddingSize {
    fn repo(self) -> &'static str {
        match self {
            BertEmbeddingSize::Small => "intfloat/multilingual-e5-small",
            BertEmbeddingSize::Base => "intfloat/multilingual-e5-base",
        }
    }
}

impl std::fmt::Display for BertEmbeddingSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BertEmbeddingSize::Small => "multilingual-e5-small",
            BertEmbeddingSize::Base => "multilingual-e5-base",
        };
        write!(f, "{name}")
    }
}

impl crate::pipelines::cache::ModelOptions for BertEmbeddingSize {
    fn cache_key(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncoderArchitecture {
    Bert,
    XlmRoberta,
}

#[derive(Deserialize)]
struct ArchitectureJson {
    #[serde(default)]
    model_type: Option<String>,
}

/// Read `model_type` from a checkpoint's `config.json`. A missing field means BERT.
fn encoder_architecture(config_json: &str) -> Result<EncoderArchitecture> {
    let arch: ArchitectureJson = serde_json::from_str(config_json)?;
    match arch.model_type.as_deref() {
        None | Some("bert") => Ok(EncoderArchitecture::Bert),
        Some("xlm-roberta") | Some("xlm_roberta") => Ok(EncoderArchitecture::XlmRoberta),
        Some(other) => Err(PipelineError::Unexpected(format!(
            "Unsupported sentence encoder architecture '{other}'"
        ))),
    }
}

enum SentenceEncoder {
    Bert(BertModel),
    XlmRoberta(XLMRobertaModel),
}

impl SentenceEncoder {
    fn load(config_json: &str, vb: VarBuilder) -> Result<Self> {
        match encoder_architecture(config_json)? {
            EncoderArchitecture::Bert => {
                let config: BertConfig = serde_json::from_str(config_json)?;
                Ok(Self::Bert(BertModel::load(vb, &config)?))
            }
            EncoderArchitecture::XlmRoberta => {
                let config: XlmRobertaConfig = serde_json::from_str(config_json)?;
                // Some exports nest the encoder under `roberta.`.
                let model = XLMRobertaModel::new(&config, vb.clone())
                    .or_else(|_| XLMRobertaModel::new(&config, vb.pp("roberta")))?;
                Ok(Self::XlmRoberta(model))
            }
        }
    }

    fn architecture(&self) -> EncoderArchitecture {
        match self {
            Self::Bert(_) => EncoderArchitecture::Bert,
            Self::XlmRoberta(_) => EncoderArchitecture::XlmRoberta,
        }
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let hidden = match self {
            Self::Bert(model) => model.forward(input_ids, token_type_ids, Some(attention_mask))?,
            Self::XlmRoberta(model) => {
                model.forward(input_ids, attention_mask, token_type_ids, None, None, None)?
            }
        };
        Ok(hidden)
    }
}

// E5 checkpoints are trained with a task prefix on every input.
const E5_PREFIX: &str = "query: ";

pub struct BertEmbeddingModel {
    encoder: SentenceEncoder,
    tokenizer: Tokenizer,
    device: Device,
}

impl BertEmbeddingModel {
    pub fn new(size: BertEmbeddingSize, device: Device) -> Result<Self> {
        let repo_id = size.repo();

        let (config_str, vb) = CheckpointLoader::new(repo_id).load(&device)?;
        let encoder = SentenceEncoder::load(&config_str, vb)?;
        let tokenizer =
            with_truncation(TokenizerLoader::new(repo_id).load()?, DEFAULT_MAX_TOKENS, 0)?;

        tracing::info!(
            repo = repo_id,
            architecture = ?encoder.architecture(),
            "embedding model loaded"
        );

        Ok(Self {
            encoder,
            tokenizer,
            device,
        })
    }

    fn embed_chunk(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let inputs: Vec<String> = texts.iter().map(|t| format!("{E5_PREFIX}{t}")).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| PipelineError::Tokenization(format!("Batch tokenization failed: {e}")))?;

        let pad_token_id = self
            .tokenizer
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| self.tokenizer.token_to_id("<pad>"))
            .or_else(|| self.tokenizer.token_to_id("[PAD]"))
            .unwrap_or(0);

        let max_len = encodings.iter().map(|e| e.len()).max().unwrap_or(0);
        let mut all_token_ids: Vec<u32> = Vec::with_capacity(encodings.len() * max_len);
        let mut all_attention_masks: Vec<u32> = Vec::with_capacity(encodings.len() * max_len);

        for encoding in &encodings {
            let mut token_ids = encoding.get_ids().to_vec();
            let mut attention_mask = encoding.get_attention_mask().to_vec();
            token_ids.resize(max_len, pad_token_id);
            attention_mask.resize(max_len, 0);
            all_token_ids.extend(token_ids);
            all_attention_masks.extend(attention_mask);
        }

        let batch_size = encodings.len();
        let input_ids = Tensor::from_vec(all_token_ids, (batch_size, max_len), &self.device)?;
        let attention_mask =
            Tensor::from_vec(all_attention_masks, (batch_size, max_len), &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        let hidden = self
            .encoder
            .forward(&input_ids, &token_type_ids, &attention_mask)?;

        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?;
        let pooled = summed.broadcast_div(&counts)?;
        let norms = pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
        let normalized = pooled.broadcast_div(&norms)?;

        Ok(normalized.to_vec2::<f32>()?)
    }
}

impl crate::pipelines::keyphrase::EmbeddingModel for BertEmbeddingModel {
    type Options = BertEmbeddingSize;

    fn new(options: Self::Options, device: Device) -> Result<Self> {
        BertEmbeddingModel::new(options, device)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(EMBEDDING_BATCH_SIZE) {
            out.extend(self.embed_chunk(chunk)?);
        }
        Ok(out)
    }

    fn device(&self) -> &Device {
        &self.device
    }
}
