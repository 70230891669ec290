use serde::Serialize;
use std::sync::Arc;

use super::candidates::{ngram_candidates, word_units};
use super::mmr::mmr_select;
use super::model::EmbeddingModel;
use crate::config::{AnalysisConfig, DEFAULT_DIVERSITY, DEFAULT_NGRAM_RANGE, DEFAULT_TOP_N};
use crate::error::{PipelineError, Result};
use crate::pipelines::pos_tagging::{PosScheme, Token};
use crate::pipelines::stats::PipelineStats;
use crate::stopwords::StopWords;

// ============ Parameters ============

/// Candidate and ranking settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyphraseParams {
    /// Maximum number of keyphrases returned.
    pub top_n: usize,
    /// Inclusive `(min, max)` number of words per candidate.
    pub ngram_range: (usize, usize),
    /// Trade-off between relevance (0.0) and variety (1.0).
    pub diversity: f32,
}

impl Default for KeyphraseParams {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            ngram_range: DEFAULT_NGRAM_RANGE,
            diversity: DEFAULT_DIVERSITY,
        }
    }
}

impl From<&AnalysisConfig> for KeyphraseParams {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            top_n: config.top_n,
            ngram_range: config.ngram_range,
            diversity: config.diversity,
        }
    }
}

impl KeyphraseParams {
    /// Check the ranges.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if `top_n` or the minimum n-gram length is zero,
    /// the n-gram range is reversed, or `diversity` lies outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        let (min, max) = self.ngram_range;
        if self.top_n == 0 {
            return Err(PipelineError::InvalidInput("top_n must be at least 1".into()));
        }
        if min == 0 {
            return Err(PipelineError::InvalidInput(
                "ngram_range minimum must be at least 1".into(),
            ));
        }
        if min > max {
            return Err(PipelineError::InvalidInput(format!(
                "ngram_range ({min}, {max}) has its minimum above its maximum"
            )));
        }
        if !(0.0..=1.0).contains(&self.diversity) {
            return Err(PipelineError::InvalidInput(format!(
                "diversity must be within [0, 1], got {}",
                self.diversity
            )));
        }
        Ok(())
    }
}

// ============ Output types ============

/// A ranked phrase with its relevance to the document.
///
/// Relevance is a cosine similarity rounded to 4 decimals, not a frequency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyphrase {
    /// Candidate phrase.
    pub text: String,
    /// Cosine similarity to the whole document.
    pub relevance: f32,
}

/// Output from [`KeyphrasePipeline::run`].
#[derive(Debug)]
pub struct Output {
    /// Selected phrases, most relevant first.
    pub keyphrases: Vec<Keyphrase>,
    /// Number of distinct candidates considered.
    pub candidates: usize,
    /// Execution statistics.
    pub stats: PipelineStats,
}

fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

// ============ Pipeline ============

/// Picks relevant but varied phrases from a document with sentence embeddings.
///
/// Construct with [`KeyphrasePipelineBuilder`](super::KeyphrasePipelineBuilder).
///
/// # Examples
///
/// ```rust,no_run
/// # use ja_text_pipelines::keyphrase::{BertEmbeddingSize, KeyphrasePipelineBuilder};
/// # fn main() -> ja_text_pipelines::error::Result<()> {
/// let pipeline = KeyphrasePipelineBuilder::bert(BertEmbeddingSize::Small)
///     .top_n(3)
///     .build()?;
///
/// let output = pipeline.run("人工知能の研究は自然言語処理と画像認識の分野で進んでいる。")?;
/// for phrase in &output.keyphrases {
///     println!("{} ({:.4})", phrase.text, phrase.relevance);
/// }
/// # Ok(())
/// # }
/// ```
pub struct KeyphrasePipeline<M: EmbeddingModel> {
    pub(crate) model: Arc<M>,
    pub(crate) params: KeyphraseParams,
    pub(crate) stopwords: StopWords,
}

impl<M: EmbeddingModel> KeyphrasePipeline<M> {
    /// Rank phrases of `text`, splitting it into words by script.
    pub fn run(&self, text: &str) -> Result<Output> {
        self.rank(text, word_units(text, None), &self.stopwords, &self.params)
    }

    /// Rank phrases built from `tokens`, typically the output of a POS tagger for `text`.
    pub fn run_with_tokens(
        &self,
        text: &str,
        tokens: &[Token],
        scheme: PosScheme,
    ) -> Result<Output> {
        self.rank(
            text,
            word_units(text, Some((tokens, scheme))),
            &self.stopwords,
            &self.params,
        )
    }

    /// Rank with explicit stop words and settings instead of the pipeline's own.
    ///
    /// `tokens` replaces script segmentation when given.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if `params` fail validation.
    pub fn run_with(
        &self,
        text: &str,
        tokens: Option<(&[Token], PosScheme)>,
        stopwords: &StopWords,
        params: &KeyphraseParams,
    ) -> Result<Output> {
        params.validate()?;
        self.rank(text, word_units(text, tokens), stopwords, params)
    }

    fn rank(
        &self,
        text: &str,
        units: Vec<&str>,
        stopwords: &StopWords,
        params: &KeyphraseParams,
    ) -> Result<Output> {
        let stats_builder = PipelineStats::start();

        let candidates = if text.trim().is_empty() {
            Vec::new()
        } else {
            ngram_candidates(&units, stopwords, params.ngram_range)
        };

        if candidates.is_empty() {
            tracing::debug!("no keyphrase candidates");
            return Ok(Output {
                keyphrases: Vec::new(),
                candidates: 0,
                stats: stats_builder.finish(0),
            });
        }

        let mut inputs: Vec<&str> = Vec::with_capacity(candidates.len() + 1);
        inputs.push(text);
        inputs.extend(candidates.iter().map(String::as_str));

        let embeddings = self.model.embed_batch(&inputs)?;
        if embeddings.len() != inputs.len() {
            return Err(PipelineError::Unexpected(format!(
                "Embedding model returned {} vectors for {} inputs",
                embeddings.len(),
                inputs.len()
            )));
        }
        let Some((document, candidate_vectors)) = embeddings.split_first() else {
            return Err(PipelineError::Unexpected("Embedding model returned no vectors".into()));
        };

        let mut keyphrases: Vec<Keyphrase> = mmr_select(
            document,
            candidate_vectors,
            params.top_n,
            params.diversity,
        )
        .into_iter()
        .map(|(idx, similarity)| Keyphrase {
            text: candidates[idx].clone(),
            relevance: round4(similarity),
        })
        .collect();
        keyphrases.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));

        tracing::debug!(
            candidates = candidates.len(),
            selected = keyphrases.len(),
            "keyphrases ranked"
        );

        Ok(Output {
            keyphrases,
            candidates: candidates.len(),
            stats: stats_builder.finish(candidates.len()),
        })
    }

    /// Settings this pipeline ranks with.
    pub fn params(&self) -> &KeyphraseParams {
        &self.params
    }

    /// Stop words removed from candidates.
    pub fn stopwords(&self) -> &StopWords {
        &self.stopwords
    }

    /// Returns the device (CPU/GPU) the model is running on.
    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DIM: usize = 64;

    /// Bag-of-characters embedding: phrases sharing characters with the document score high.
    struct CharBag {
        calls: AtomicUsize,
        device: Device,
    }

    impl EmbeddingModel for CharBag {
        type Options = ();

        fn new(_: (), device: Device) -> Result<Self> {
            Ok(Self {
                calls: AtomicUsize::new(0),
                device,
            })
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0; DIM];
                    for c in t.chars() {
                        v[c as usize % DIM] += 1.0;
                    }
                    v
                })
                .collect())
        }

        fn device(&self) -> &Device {
            &self.device
        }
    }

    struct Truncating {
        device: Device,
    }

    impl EmbeddingModel for Truncating {
        type Options = ();

        fn new(_: (), device: Device) -> Result<Self> {
            Ok(Self { device })
        }

        fn embed_batch(&self, _: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]])
        }

        fn device(&self) -> &Device {
            &self.device
        }
    }

    fn pipeline<M: EmbeddingModel<Options = ()>>(params: KeyphraseParams) -> KeyphrasePipeline<M> {
        KeyphrasePipeline {
            model: Arc::new(M::new((), Device::Cpu).unwrap()),
            params,
            stopwords: StopWords::fallback(),
        }
    }

    const TEXT: &str = "自然言語処理の研究と画像認識の研究が進む。自然言語処理は面白い。";

    #[test]
    fn default_params_are_valid() {
        KeyphraseParams::default().validate().unwrap();
    }

    #[test]
    fn invalid_params_are_rejected() {
        let base = KeyphraseParams::default();
        let cases = [
            KeyphraseParams { top_n: 0, ..base },
            KeyphraseParams { ngram_range: (0, 2), ..base },
            KeyphraseParams { ngram_range: (3, 2), ..base },
            KeyphraseParams { diversity: -0.1, ..base },
            KeyphraseParams { diversity: 1.5, ..base },
            KeyphraseParams { diversity: f32::NAN, ..base },
        ];
        for params in cases {
            assert!(
                matches!(params.validate(), Err(PipelineError::InvalidInput(_))),
                "{params:?} should be rejected"
            );
        }
    }

    #[test]
    fn blank_text_gives_no_keyphrases_without_embedding() {
        let pipeline = pipeline::<CharBag>(KeyphraseParams::default());
        let output = pipeline.run("  \n ").unwrap();
        assert!(output.keyphrases.is_empty());
        assert_eq!(pipeline.model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn only_stopwords_give_no_keyphrases() {
        let pipeline = pipeline::<CharBag>(KeyphraseParams::default());
        let output = pipeline.run("の、が。も").unwrap();
        assert_eq!(output.candidates, 0);
        assert!(output.keyphrases.is_empty());
        assert_eq!(pipeline.model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn output_is_bounded_sorted_and_rounded() {
        let params = KeyphraseParams {
            top_n: 3,
            ..Default::default()
        };
        let pipeline = pipeline::<CharBag>(params);
        let output = pipeline.run(TEXT).unwrap();

        assert_eq!(output.keyphrases.len(), 3);
        assert!(output.candidates >= 3);
        for pair in output.keyphrases.windows(2) {
            assert!(pair[0].relevance >= pair[1].relevance);
        }
        for phrase in &output.keyphrases {
            assert!(phrase.text.chars().all(|c| TEXT.contains(c)));
            assert_eq!(phrase.relevance, round4(phrase.relevance));
            assert!(phrase.relevance > 0.0 && phrase.relevance <= 1.0);
        }
        assert_eq!(pipeline.model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn keyphrases_are_distinct() {
        let params = KeyphraseParams {
            top_n: 50,
            diversity: 0.0,
            ..Default::default()
        };
        let output = pipeline::<CharBag>(params).run(TEXT).unwrap();

        assert_eq!(output.keyphrases.len(), output.candidates);
        let mut texts: Vec<&str> = output.keyphrases.iter().map(|k| k.text.as_str()).collect();
        texts.sort_unstable();
        texts.dedup();
        assert_eq!(texts.len(), output.keyphrases.len());
    }

    #[test]
    fn tokens_replace_script_segmentation() {
        let params = KeyphraseParams {
            ngram_range: (1, 1),
            top_n: 10,
            ..Default::default()
        };
        let tokens = vec![
            Token::new("自然言語", "名詞-普通名詞"),
            Token::new("処理", "名詞-普通名詞"),
            Token::new("の", "助詞-格助詞"),
            Token::new("。", "補助記号-句点"),
        ];
        let output = pipeline::<CharBag>(params)
            .run_with_tokens("自然言語処理の。", &tokens, PosScheme::Unidic)
            .unwrap();

        let mut texts: Vec<&str> = output.keyphrases.iter().map(|k| k.text.as_str()).collect();
        texts.sort_unstable();
        assert_eq!(texts, vec!["処理", "自然言語"]);
    }

    #[test]
    fn run_with_overrides_stopwords_and_params() {
        let pipeline = pipeline::<CharBag>(KeyphraseParams::default());
        let stopwords: StopWords = ["研究"].into_iter().collect();
        let params = KeyphraseParams {
            top_n: 2,
            ngram_range: (1, 1),
            diversity: 0.0,
        };

        let output = pipeline.run_with(TEXT, None, &stopwords, &params).unwrap();
        assert_eq!(output.keyphrases.len(), 2);
        assert!(output.keyphrases.iter().all(|k| k.text != "研究"));

        let bad = KeyphraseParams { top_n: 0, ..params };
        let err = pipeline.run_with(TEXT, None, &stopwords, &bad).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn mismatched_embeddings_are_an_error() {
        let err = pipeline::<Truncating>(KeyphraseParams::default())
            .run(TEXT)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Unexpected(_)));
    }
}
