use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::config::{AnalysisConfig, DEFAULT_ALLOWED_CATEGORIES, DEFAULT_TOP_N};
use crate::pipelines::pos_tagging::{CoarseCategory, PosScheme, Token};

/// A surface form and how many times it occurred.
///
/// Counts are raw frequencies and are not comparable with keyphrase relevance scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    /// Surface form as it appeared in the text.
    pub text: String,
    /// Number of occurrences among allowed tokens.
    pub count: usize,
}

/// Counts tokens of selected coarse categories and returns the most frequent surfaces.
///
/// # Examples
///
/// ```rust
/// use ja_text_pipelines::keywords::FrequencyKeywordExtractor;
/// use ja_text_pipelines::pos_tagging::{CoarseCategory, PosScheme, Token};
///
/// let tokens = vec![
///     Token::new("猫", "名詞-普通名詞"),
///     Token::new("猫", "名詞-普通名詞"),
///     Token::new("走る", "動詞"),
/// ];
///
/// let extractor = FrequencyKeywordExtractor::new(PosScheme::Unidic)
///     .with_allowed_categories([CoarseCategory::Noun]);
/// let keywords = extractor.extract(&tokens);
///
/// assert_eq!(keywords.len(), 1);
/// assert_eq!((keywords[0].text.as_str(), keywords[0].count), ("猫", 2));
/// ```
#[derive(Debug, Clone)]
pub struct FrequencyKeywordExtractor {
    top_n: usize,
    allowed: HashSet<CoarseCategory>,
    scheme: PosScheme,
}

impl FrequencyKeywordExtractor {
    /// Extractor for tokens labelled with `scheme`, using the default `top_n` and categories.
    pub fn new(scheme: PosScheme) -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            allowed: DEFAULT_ALLOWED_CATEGORIES.iter().copied().collect(),
            scheme,
        }
    }

    /// Extractor configured from `config`, falling back to `scheme` when the config does
    /// not override it.
    pub fn from_config(config: &AnalysisConfig, scheme: PosScheme) -> Self {
        Self::new(config.pos_scheme.unwrap_or(scheme))
            .with_top_n(config.top_n)
            .with_allowed_categories(config.allowed_categories.iter().copied())
    }

    /// Maximum number of keywords returned.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Coarse categories whose tokens are counted.
    pub fn with_allowed_categories(
        mut self,
        categories: impl IntoIterator<Item = CoarseCategory>,
    ) -> Self {
        self.allowed = categories.into_iter().collect();
        self
    }

    /// Coarse categories whose tokens are counted.
    pub fn allowed_categories(&self) -> &HashSet<CoarseCategory> {
        &self.allowed
    }

    /// Label scheme used to read token categories.
    pub fn scheme(&self) -> PosScheme {
        self.scheme
    }

    /// Rank allowed surfaces by descending count; equal counts keep first-seen order.
    ///
    /// Tokens without a recognizable category are skipped. Never fails.
    pub fn extract(&self, tokens: &[Token]) -> Vec<KeywordCount> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();

        for token in tokens {
            let Some(category) = token.category(self.scheme) else {
                continue;
            };
            if !self.allowed.contains(&category) {
                continue;
            }
            let slot = *slots.entry(token.text.as_str()).or_insert_with(|| {
                counts.push((token.text.as_str(), 0));
                counts.len() - 1
            });
            counts[slot].1 += 1;
        }

        // Stable sort keeps first-seen order among equal counts.
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        counts
            .into_iter()
            .take(self.top_n)
            .map(|(text, count)| KeywordCount {
                text: text.to_string(),
                count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, pos: &str) -> Token {
        Token::new(text, pos)
    }

    fn nouns_only() -> FrequencyKeywordExtractor {
        FrequencyKeywordExtractor::new(PosScheme::Unidic)
            .with_allowed_categories([CoarseCategory::Noun])
    }

    fn pairs(keywords: &[KeywordCount]) -> Vec<(&str, usize)> {
        keywords.iter().map(|k| (k.text.as_str(), k.count)).collect()
    }

    #[test]
    fn counts_repeated_nouns() {
        let tokens = vec![
            token("猫", "名詞-普通名詞"),
            token("猫", "名詞-普通名詞"),
            token("走る", "動詞"),
        ];
        assert_eq!(pairs(&nouns_only().extract(&tokens)), vec![("猫", 2)]);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(nouns_only().extract(&[]).is_empty());
    }

    #[test]
    fn no_allowed_tokens_gives_empty_output() {
        let tokens = vec![token("走る", "動詞"), token("が", "助詞-格助詞")];
        assert!(nouns_only().extract(&tokens).is_empty());
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let tokens = vec![token("A", "名詞"), token("B", "名詞")];
        let keywords = nouns_only().with_top_n(1).extract(&tokens);
        assert_eq!(pairs(&keywords), vec![("A", 1)]);
    }

    #[test]
    fn top_n_larger_than_matches_returns_all() {
        let tokens = vec![token("A", "名詞"), token("B", "名詞"), token("A", "名詞")];
        let keywords = nouns_only().with_top_n(10).extract(&tokens);
        assert_eq!(pairs(&keywords), vec![("A", 2), ("B", 1)]);
    }

    #[test]
    fn missing_pos_is_excluded() {
        let tokens: Vec<Token> =
            serde_json::from_str(r#"[{"text": "猫"}, {"text": "犬", "pos": "名詞"}]"#).unwrap();
        assert_eq!(pairs(&nouns_only().extract(&tokens)), vec![("犬", 1)]);
    }

    #[test]
    fn only_the_first_segment_is_matched() {
        // "普通名詞" is a sub-category here, never a coarse category.
        let tokens = vec![token("形", "普通名詞-名詞"), token("色", "名詞-普通名詞")];
        assert_eq!(pairs(&nouns_only().extract(&tokens)), vec![("色", 1)]);
    }

    #[test]
    fn later_frequent_words_overtake_earlier_ones() {
        let tokens = vec![
            token("雨", "名詞"),
            token("空", "名詞"),
            token("青い", "形容詞-一般"),
            token("空", "名詞"),
            token("青い", "形容詞-一般"),
            token("空", "名詞"),
        ];
        let extractor = FrequencyKeywordExtractor::new(PosScheme::Unidic);
        assert_eq!(
            pairs(&extractor.extract(&tokens)),
            vec![("空", 3), ("青い", 2), ("雨", 1)]
        );
    }

    #[test]
    fn scheme_decides_which_labels_match() {
        let tokens = vec![token("静か", "形状詞-一般"), token("PROPN", "PROPN")];
        let unidic = FrequencyKeywordExtractor::new(PosScheme::Unidic)
            .with_allowed_categories([CoarseCategory::AdjectivalNoun]);
        assert_eq!(pairs(&unidic.extract(&tokens)), vec![("静か", 1)]);

        let upos = FrequencyKeywordExtractor::new(PosScheme::Upos);
        assert_eq!(pairs(&upos.extract(&tokens)), vec![("PROPN", 1)]);
    }

    #[test]
    fn from_config_applies_overrides() {
        let config = AnalysisConfig {
            top_n: 1,
            allowed_categories: vec![CoarseCategory::Verb],
            pos_scheme: Some(PosScheme::Ipadic),
            ..Default::default()
        };
        let extractor = FrequencyKeywordExtractor::from_config(&config, PosScheme::Upos);
        assert_eq!(extractor.scheme(), PosScheme::Ipadic);

        let tokens = vec![token("食べる", "動詞-自立"), token("飲む", "動詞-自立")];
        assert_eq!(pairs(&extractor.extract(&tokens)), vec![("食べる", 1)]);
    }

    #[test]
    fn output_respects_ordering_and_bounds() {
        let vocabulary = ["猫", "犬", "鳥", "魚", "馬"];
        let labels = ["名詞-普通名詞", "動詞-一般", "形容詞-一般", "", "助詞"];
        // Deterministic pseudo-random token streams.
        let mut state: u32 = 7;
        let mut next = move || {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as usize
        };

        for round in 0..50 {
            let len = next() % 40;
            let tokens: Vec<Token> = (0..len)
                .map(|_| token(vocabulary[next() % 5], labels[next() % 5]))
                .collect();
            let top_n = 1 + round % 6;
            let extractor = FrequencyKeywordExtractor::new(PosScheme::Unidic).with_top_n(top_n);
            let keywords = extractor.extract(&tokens);

            let allowed: Vec<&Token> = tokens
                .iter()
                .filter(|t| {
                    matches!(
                        t.category(PosScheme::Unidic),
                        Some(CoarseCategory::Noun | CoarseCategory::Adjective)
                    )
                })
                .collect();
            let mut distinct: Vec<&str> = Vec::new();
            for t in &allowed {
                if !distinct.contains(&t.text.as_str()) {
                    distinct.push(&t.text);
                }
            }

            assert!(keywords.len() <= top_n);
            assert!(keywords.len() <= distinct.len());
            assert_eq!(keywords, extractor.extract(&tokens));

            for pair in keywords.windows(2) {
                assert!(pair[0].count >= pair[1].count);
                if pair[0].count == pair[1].count {
                    let first = distinct.iter().position(|d| *d == pair[0].text).unwrap();
                    let second = distinct.iter().position(|d| *d == pair[1].text).unwrap();
                    assert!(first < second);
                }
            }
            for keyword in &keywords {
                assert!(distinct.contains(&keyword.text.as_str()));
                let expected = allowed.iter().filter(|t| t.text == keyword.text).count();
                assert_eq!(keyword.count, expected);
            }
        }
    }

    #[test]
    fn repeated_categories_collapse_even_when_not_adjacent() {
        let extractor = FrequencyKeywordExtractor::new(PosScheme::Unidic).with_allowed_categories([
            CoarseCategory::Noun,
            CoarseCategory::Verb,
            CoarseCategory::Noun,
        ]);
        assert_eq!(extractor.allowed_categories().len(), 2);

        let tokens = vec![
            token("猫", "名詞-普通名詞"),
            token("走る", "動詞-一般"),
            token("猫", "名詞-普通名詞"),
            token("が", "助詞-格助詞"),
        ];
        assert_eq!(pairs(&extractor.extract(&tokens)), vec![("猫", 2), ("走る", 1)]);
    }
}
