//! One analysis session over a document.
//!
//! Models are loaded once by the caller and handed to [`Analyzer`] as optional shared
//! handles. Each feature is reported on its own [`Panel`]: a missing handle makes its panel
//! [`Panel::Unavailable`], and an inference error makes it [`Panel::Failed`] without
//! affecting the others.
//!
//! ```rust
//! use ja_text_pipelines::analysis::{Analyzer, ModelHandles, Panel};
//! use ja_text_pipelines::config::AnalysisConfig;
//! use ja_text_pipelines::stopwords::StopWords;
//!
//! let analyzer = Analyzer::new(
//!     AnalysisConfig::default(),
//!     ModelHandles::default(),
//!     StopWords::fallback(),
//! )
//! .unwrap();
//!
//! let report = analyzer.run("吾輩は猫である。").unwrap();
//! assert_eq!(report.sentiment, Panel::Unavailable);
//! assert_eq!(report.keywords, Panel::Unavailable);
//! ```

use serde::Serialize;
use std::sync::Arc;

use crate::config::AnalysisConfig;
use crate::error::{PipelineError, Result};
use crate::pipelines::keyphrase::{
    EmbeddingModel, Keyphrase, KeyphraseParams, KeyphrasePipeline,
};
use crate::pipelines::keywords::{FrequencyKeywordExtractor, KeywordCount};
use crate::pipelines::pos_tagging::{PosScheme, PosTaggingModel, PosTaggingPipeline, Token};
use crate::pipelines::sentiment::{
    Prediction, SentimentAnalysisModel, SentimentAnalysisPipeline,
};
use crate::stopwords::StopWords;

// ============ Backend seams ============

/// Anything that scores sentiment classes for a text.
pub trait SentimentClassifier: Send + Sync {
    /// Every class with its probability.
    fn classify(&self, text: &str) -> Result<Vec<Prediction>>;
}

/// Anything that splits a text into POS-tagged tokens.
pub trait Tagger: Send + Sync {
    /// Tokens in input order.
    fn tag(&self, text: &str) -> Result<Vec<Token>>;

    /// Label vocabulary of the emitted tokens.
    fn scheme(&self) -> PosScheme;
}

/// Anything that ranks keyphrases of a text.
pub trait KeyphraseRanker: Send + Sync {
    /// Up to `params.top_n` phrases, most relevant first.
    fn rank(
        &self,
        text: &str,
        tokens: Option<(&[Token], PosScheme)>,
        stopwords: &StopWords,
        params: &KeyphraseParams,
    ) -> Result<Vec<Keyphrase>>;
}

impl<M> SentimentClassifier for SentimentAnalysisPipeline<M>
where
    M: SentimentAnalysisModel + Send + Sync,
{
    fn classify(&self, text: &str) -> Result<Vec<Prediction>> {
        Ok(self.run(text)?.scores)
    }
}

impl<M> Tagger for PosTaggingPipeline<M>
where
    M: PosTaggingModel + Send + Sync,
{
    fn tag(&self, text: &str) -> Result<Vec<Token>> {
        Ok(self.run(text)?.tokens)
    }

    fn scheme(&self) -> PosScheme {
        PosTaggingPipeline::scheme(self)
    }
}

impl<M> KeyphraseRanker for KeyphrasePipeline<M>
where
    M: EmbeddingModel + Send + Sync,
{
    fn rank(
        &self,
        text: &str,
        tokens: Option<(&[Token], PosScheme)>,
        stopwords: &StopWords,
        params: &KeyphraseParams,
    ) -> Result<Vec<Keyphrase>> {
        Ok(self.run_with(text, tokens, stopwords, params)?.keyphrases)
    }
}

/// Models available to a session. `None` marks a model that was not loaded.
#[derive(Clone, Default)]
pub struct ModelHandles {
    /// Sentiment classifier.
    pub sentiment: Option<Arc<dyn SentimentClassifier>>,
    /// POS tagger, required for frequency keywords and the token table.
    pub tagger: Option<Arc<dyn Tagger>>,
    /// Keyphrase ranker.
    pub keyphrases: Option<Arc<dyn KeyphraseRanker>>,
}

// ============ Report ============

/// State of one feature's result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Panel<T> {
    /// The feature ran and produced a value.
    Ready(T),
    /// The feature's model is not loaded.
    Unavailable,
    /// The feature ran and failed with this message.
    Failed(String),
}

impl<T> Panel<T> {
    /// The value, if the feature succeeded.
    pub fn ready(&self) -> Option<&T> {
        match self {
            Panel::Ready(value) => Some(value),
            _ => None,
        }
    }

    fn from_result(feature: &str, result: Result<T>) -> Self {
        match result {
            Ok(value) => Panel::Ready(value),
            Err(e) => {
                tracing::error!(feature, error = %e, "analysis step failed");
                Panel::Failed(e.to_string())
            }
        }
    }
}

/// Sentiment panel contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentSummary {
    /// Most likely class.
    pub prediction: Prediction,
    /// Every class with its probability.
    pub scores: Vec<Prediction>,
}

/// Results of one [`Analyzer::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Overall sentiment.
    pub sentiment: Panel<SentimentSummary>,
    /// Embedding-ranked keyphrases.
    pub keyphrases: Panel<Vec<Keyphrase>>,
    /// Most frequent content words.
    pub keywords: Panel<Vec<KeywordCount>>,
    /// Token table.
    pub tokens: Panel<Vec<Token>>,
    /// Label vocabulary used for `keywords`, when tokens were produced.
    pub scheme: Option<PosScheme>,
}

// ============ Analyzer ============

/// Runs every available feature over a text.
pub struct Analyzer {
    config: AnalysisConfig,
    handles: ModelHandles,
    stopwords: StopWords,
}

impl Analyzer {
    /// Create a session.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if `config` fails validation.
    pub fn new(
        config: AnalysisConfig,
        handles: ModelHandles,
        stopwords: StopWords,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            handles,
            stopwords,
        })
    }

    /// Settings in effect.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze `text`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] for empty or whitespace-only text. Feature
    /// failures never surface here; they are reported on their panel.
    pub fn run(&self, text: &str) -> Result<AnalysisReport> {
        if text.trim().is_empty() {
            return Err(PipelineError::InvalidInput("Enter some text to analyze".into()));
        }

        let sentiment = match &self.handles.sentiment {
            None => Panel::Unavailable,
            Some(classifier) => {
                Panel::from_result("sentiment", classify(classifier.as_ref(), text))
            }
        };

        let (tokens, scheme) = match &self.handles.tagger {
            None => (Panel::Unavailable, None),
            Some(tagger) => {
                let scheme = self.config.pos_scheme.unwrap_or_else(|| tagger.scheme());
                (Panel::from_result("pos_tagging", tagger.tag(text)), Some(scheme))
            }
        };

        let keywords = match (&tokens, scheme) {
            (Panel::Ready(tokens), Some(scheme)) => Panel::Ready(
                FrequencyKeywordExtractor::from_config(&self.config, scheme).extract(tokens),
            ),
            (Panel::Failed(message), _) => Panel::Failed(message.clone()),
            _ => Panel::Unavailable,
        };

        let keyphrases = match &self.handles.keyphrases {
            None => Panel::Unavailable,
            Some(ranker) => {
                let tagged = tokens.ready().zip(scheme).map(|(t, s)| (t.as_slice(), s));
                let params = KeyphraseParams::from(&self.config);
                Panel::from_result(
                    "keyphrases",
                    ranker.rank(text, tagged, &self.stopwords, &params),
                )
            }
        };

        let scheme = scheme.filter(|_| tokens.ready().is_some());

        Ok(AnalysisReport {
            sentiment,
            keyphrases,
            keywords,
            tokens,
            scheme,
        })
    }
}

fn classify(classifier: &dyn SentimentClassifier, text: &str) -> Result<SentimentSummary> {
    let scores = classifier.classify(text)?;
    let prediction = crate::pipelines::sentiment::pipeline::top_prediction(&scores)
        .cloned()
        .ok_or_else(|| PipelineError::Unexpected("Classifier returned no class scores".into()))?;
    Ok(SentimentSummary { prediction, scores })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSentiment;

    impl SentimentClassifier for FixedSentiment {
        fn classify(&self, _: &str) -> Result<Vec<Prediction>> {
            Ok(vec![
                Prediction {
                    label: "positive".into(),
                    score: 0.8,
                },
                Prediction {
                    label: "negative".into(),
                    score: 0.2,
                },
            ])
        }
    }

    struct BrokenSentiment;

    impl SentimentClassifier for BrokenSentiment {
        fn classify(&self, _: &str) -> Result<Vec<Prediction>> {
            Err(PipelineError::Unexpected("out of memory".into()))
        }
    }

    /// Splits on whitespace; every word is a noun.
    struct WhitespaceTagger;

    impl Tagger for WhitespaceTagger {
        fn tag(&self, text: &str) -> Result<Vec<Token>> {
            Ok(text
                .split_whitespace()
                .map(|w| Token::new(w, "名詞-普通名詞"))
                .collect())
        }

        fn scheme(&self) -> PosScheme {
            PosScheme::Unidic
        }
    }

    struct BrokenTagger;

    impl Tagger for BrokenTagger {
        fn tag(&self, _: &str) -> Result<Vec<Token>> {
            Err(PipelineError::Dictionary("lattice overflow".into()))
        }

        fn scheme(&self) -> PosScheme {
            PosScheme::Ipadic
        }
    }

    /// Echoes the word units it received as keyphrases.
    struct EchoRanker;

    impl KeyphraseRanker for EchoRanker {
        fn rank(
            &self,
            text: &str,
            tokens: Option<(&[Token], PosScheme)>,
            stopwords: &StopWords,
            params: &KeyphraseParams,
        ) -> Result<Vec<Keyphrase>> {
            let words: Vec<String> = match tokens {
                Some((tokens, _)) => tokens.iter().map(|t| t.text.clone()).collect(),
                None => vec![text.to_string()],
            };
            Ok(words
                .into_iter()
                .filter(|w| !stopwords.contains(w))
                .take(params.top_n)
                .map(|text| Keyphrase {
                    text,
                    relevance: 1.0,
                })
                .collect())
        }
    }

    fn analyzer(handles: ModelHandles) -> Analyzer {
        Analyzer::new(AnalysisConfig::default(), handles, StopWords::fallback()).unwrap()
    }

    fn all_handles() -> ModelHandles {
        ModelHandles {
            sentiment: Some(Arc::new(FixedSentiment)),
            tagger: Some(Arc::new(WhitespaceTagger)),
            keyphrases: Some(Arc::new(EchoRanker)),
        }
    }

    #[test]
    fn blank_text_is_rejected() {
        let err = analyzer(all_handles()).run(" \n\t").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = AnalysisConfig {
            top_n: 0,
            ..Default::default()
        };
        let result = Analyzer::new(config, ModelHandles::default(), StopWords::default());
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn every_panel_ready_with_all_handles() {
        let report = analyzer(all_handles()).run("猫 犬 猫 は").unwrap();

        let sentiment = report.sentiment.ready().unwrap();
        assert_eq!(sentiment.prediction.label, "positive");
        assert_eq!(sentiment.scores.len(), 2);

        let keywords = report.keywords.ready().unwrap();
        assert_eq!(keywords[0].text, "猫");
        assert_eq!(keywords[0].count, 2);

        assert_eq!(report.tokens.ready().unwrap().len(), 4);
        assert_eq!(report.scheme, Some(PosScheme::Unidic));

        let phrases: Vec<&str> = report
            .keyphrases
            .ready()
            .unwrap()
            .iter()
            .map(|k| k.text.as_str())
            .collect();
        assert_eq!(phrases, vec!["猫", "犬", "猫"]);
    }

    #[test]
    fn missing_handles_make_panels_unavailable() {
        let report = analyzer(ModelHandles::default()).run("猫").unwrap();
        assert_eq!(report.sentiment, Panel::Unavailable);
        assert_eq!(report.keyphrases, Panel::Unavailable);
        assert_eq!(report.keywords, Panel::Unavailable);
        assert_eq!(report.tokens, Panel::Unavailable);
        assert_eq!(report.scheme, None);
    }

    #[test]
    fn one_failure_does_not_stop_the_others() {
        let handles = ModelHandles {
            sentiment: Some(Arc::new(BrokenSentiment)),
            ..all_handles()
        };
        let report = analyzer(handles).run("猫 犬").unwrap();

        assert_eq!(report.sentiment, Panel::Failed("out of memory".into()));
        assert!(report.keywords.ready().is_some());
        assert!(report.keyphrases.ready().is_some());
    }

    #[test]
    fn failed_tagger_fails_keywords_but_not_keyphrases() {
        let handles = ModelHandles {
            tagger: Some(Arc::new(BrokenTagger)),
            ..all_handles()
        };
        let report = analyzer(handles).run("猫 犬").unwrap();

        assert!(matches!(report.tokens, Panel::Failed(_)));
        assert!(matches!(report.keywords, Panel::Failed(_)));
        assert_eq!(report.scheme, None);
        // Without tokens the ranker falls back to the raw text.
        let phrases = report.keyphrases.ready().unwrap();
        assert_eq!(phrases[0].text, "猫 犬");
    }

    #[test]
    fn configured_scheme_overrides_the_tagger() {
        let config = AnalysisConfig {
            pos_scheme: Some(PosScheme::Upos),
            ..Default::default()
        };
        let analyzer = Analyzer::new(config, all_handles(), StopWords::fallback()).unwrap();
        let report = analyzer.run("猫 犬").unwrap();

        assert_eq!(report.scheme, Some(PosScheme::Upos));
        // UniDic labels mean nothing under UPOS.
        assert_eq!(report.keywords, Panel::Ready(Vec::new()));
    }

    #[test]
    fn report_serializes_panel_status() {
        let report = analyzer(ModelHandles {
            sentiment: Some(Arc::new(FixedSentiment)),
            ..Default::default()
        })
        .run("猫")
        .unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sentiment"]["status"], "ready");
        assert_eq!(json["sentiment"]["value"]["prediction"]["label"], "positive");
        assert_eq!(json["tokens"]["status"], "unavailable");
    }
}
