use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

/// Top-level part of speech, independent of any analyzer's label vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoarseCategory {
    /// Common noun (名詞).
    Noun,
    /// Proper noun (固有名詞 / `PROPN`).
    ProperNoun,
    /// Pronoun (代名詞 / `PRON`).
    Pronoun,
    /// Adjective (形容詞 / `ADJ`).
    Adjective,
    /// Na-adjective stem (形状詞).
    AdjectivalNoun,
    /// Adnominal (連体詞 / `DET`).
    Adnominal,
    /// Verb (動詞 / `VERB`).
    Verb,
    /// Adverb (副詞 / `ADV`).
    Adverb,
    /// Particle (助詞 / `ADP`, `PART`).
    Particle,
    /// Auxiliary verb (助動詞 / `AUX`).
    AuxiliaryVerb,
    /// Conjunction (接続詞 / `CCONJ`, `SCONJ`).
    Conjunction,
    /// Interjection (感動詞 / `INTJ`).
    Interjection,
    /// Prefix (接頭辞, 接頭詞).
    Prefix,
    /// Suffix (接尾辞).
    Suffix,
    /// Symbol or punctuation (記号, 補助記号 / `PUNCT`, `SYM`).
    Symbol,
    /// Whitespace (空白).
    Whitespace,
    /// Numeral (`NUM`).
    Numeral,
    /// Known label without a finer mapping (フィラー, その他 / `X`).
    Other,
}

impl CoarseCategory {
    /// Punctuation and whitespace never make meaningful keyword candidates.
    pub fn is_punctuation(self) -> bool {
        matches!(self, CoarseCategory::Symbol | CoarseCategory::Whitespace)
    }
}

/// Label vocabulary of a POS backend.
///
/// Backends disagree on their top-level labels (`形状詞` only exists in UniDic, `接頭詞` only
/// in IPADIC, UPOS models emit English tags), so each one gets its own adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosScheme {
    /// UniDic-style labels such as `名詞-普通名詞-一般`.
    Unidic,
    /// IPADIC-style labels such as `名詞-固有名詞-地域-一般`.
    Ipadic,
    /// Universal POS tags, optionally with `B-`/`I-` prefixes.
    Upos,
}

impl PosScheme {
    /// Map a `-`-separated POS path to its coarse category.
    ///
    /// Only the first segment is inspected. Empty or unknown labels yield `None`.
    ///
    /// ```rust
    /// use ja_text_pipelines::pos_tagging::{CoarseCategory, PosScheme};
    ///
    /// assert_eq!(
    ///     PosScheme::Unidic.coarse_category("名詞-普通名詞-一般"),
    ///     Some(CoarseCategory::Noun)
    /// );
    /// assert_eq!(PosScheme::Upos.coarse_category("B-PROPN"), Some(CoarseCategory::ProperNoun));
    /// assert_eq!(PosScheme::Ipadic.coarse_category(""), None);
    /// ```
    pub fn coarse_category(self, pos: &str) -> Option<CoarseCategory> {
        let head = pos.split('-').next().unwrap_or_default().trim();
        if head.is_empty() {
            return None;
        }
        match self {
            PosScheme::Unidic => unidic_category(head),
            PosScheme::Ipadic => ipadic_category(head),
            PosScheme::Upos => upos_category(strip_bio(pos)),
        }
    }
}

fn unidic_category(head: &str) -> Option<CoarseCategory> {
    let category = match head {
        "名詞" => CoarseCategory::Noun,
        "固有名詞" => CoarseCategory::ProperNoun,
        "代名詞" => CoarseCategory::Pronoun,
        "形容詞" => CoarseCategory::Adjective,
        "形状詞" => CoarseCategory::AdjectivalNoun,
        "連体詞" => CoarseCategory::Adnominal,
        "動詞" => CoarseCategory::Verb,
        "副詞" => CoarseCategory::Adverb,
        "助詞" => CoarseCategory::Particle,
        "助動詞" => CoarseCategory::AuxiliaryVerb,
        "接続詞" => CoarseCategory::Conjunction,
        "感動詞" => CoarseCategory::Interjection,
        "接頭辞" => CoarseCategory::Prefix,
        "接尾辞" => CoarseCategory::Suffix,
        "記号" | "補助記号" => CoarseCategory::Symbol,
        "空白" => CoarseCategory::Whitespace,
        _ => return None,
    };
    Some(category)
}

fn ipadic_category(head: &str) -> Option<CoarseCategory> {
    let category = match head {
        "名詞" => CoarseCategory::Noun,
        "固有名詞" => CoarseCategory::ProperNoun,
        "形容詞" => CoarseCategory::Adjective,
        "連体詞" => CoarseCategory::Adnominal,
        "動詞" => CoarseCategory::Verb,
        "副詞" => CoarseCategory::Adverb,
        "助詞" => CoarseCategory::Particle,
        "助動詞" => CoarseCategory::AuxiliaryVerb,
        "接続詞" => CoarseCategory::Conjunction,
        "感動詞" => CoarseCategory::Interjection,
        "接頭詞" => CoarseCategory::Prefix,
        "記号" => CoarseCategory::Symbol,
        "フィラー" | "その他" => CoarseCategory::Other,
        _ => return None,
    };
    Some(category)
}

// UPOS labels carry no `-` hierarchy; the only dash is the BIO prefix.
fn strip_bio(label: &str) -> &str {
    label
        .strip_prefix("B-")
        .or_else(|| label.strip_prefix("I-"))
        .unwrap_or(label)
        .trim()
}

fn upos_category(tag: &str) -> Option<CoarseCategory> {
    let category = match tag {
        "NOUN" => CoarseCategory::Noun,
        "PROPN" => CoarseCategory::ProperNoun,
        "PRON" => CoarseCategory::Pronoun,
        "ADJ" => CoarseCategory::Adjective,
        "DET" => CoarseCategory::Adnominal,
        "VERB" => CoarseCategory::Verb,
        "ADV" => CoarseCategory::Adverb,
        "ADP" | "PART" => CoarseCategory::Particle,
        "AUX" => CoarseCategory::AuxiliaryVerb,
        "CCONJ" | "SCONJ" => CoarseCategory::Conjunction,
        "INTJ" => CoarseCategory::Interjection,
        "PUNCT" | "SYM" => CoarseCategory::Symbol,
        "NUM" => CoarseCategory::Numeral,
        "X" => CoarseCategory::Other,
        _ => return None,
    };
    Some(category)
}

impl fmt::Display for PosScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PosScheme::Unidic => "unidic",
            PosScheme::Ipadic => "ipadic",
            PosScheme::Upos => "upos",
        };
        write!(f, "{name}")
    }
}

impl FromStr for PosScheme {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unidic" => Ok(PosScheme::Unidic),
            "ipadic" => Ok(PosScheme::Ipadic),
            "upos" => Ok(PosScheme::Upos),
            other => Err(PipelineError::Config(format!(
                "Unknown POS scheme '{other}'. Expected one of: unidic, ipadic, upos"
            ))),
        }
    }
}
