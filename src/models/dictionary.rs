use candle_core::Device;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use vibrato::{Dictionary, Tokenizer};

use crate::error::{PipelineError, Result};
use crate::pipelines::pos_tagging::{PosScheme, Token};

/// Location and label vocabulary of a MeCab-compatible system dictionary.
///
/// Dictionaries may be plain or zstd-compressed (`.zst`), as distributed with vibrato.
#[derive(Debug, Clone)]
pub struct DictionaryOptions {
    /// Path to `system.dic` or `system.dic.zst`.
    pub path: PathBuf,
    /// Vocabulary of the dictionary's POS features. Must be `Ipadic` or `Unidic`.
    pub scheme: PosScheme,
}

impl DictionaryOptions {
    /// Describe a dictionary at `path` using `scheme` labels.
    pub fn new(path: impl Into<PathBuf>, scheme: PosScheme) -> Self {
        Self {
            path: path.into(),
            scheme,
        }
    }
}

impl crate::pipelines::cache::ModelOptions for DictionaryOptions {
    fn cache_key(&self) -> String {
        format!("dictionary-{}-{}", self.scheme, self.path.display())
    }
}

pub struct DictionaryPosModel {
    tokenizer: Tokenizer,
    scheme: PosScheme,
    device: Device,
}

impl DictionaryPosModel {
    pub fn new(options: DictionaryOptions, device: Device) -> Result<Self> {
        if options.scheme == PosScheme::Upos {
            return Err(PipelineError::Config(
                "Dictionary analyzers use ipadic or unidic labels, not upos".into(),
            ));
        }
        if !device.is_cpu() {
            tracing::debug!("dictionary analyzer ignores the requested accelerator");
        }

        let dictionary = read_dictionary(&options.path)?;
        let tokenizer = Tokenizer::new(dictionary).ignore_space(true)?;

        tracing::info!(
            path = %options.path.display(),
            scheme = %options.scheme,
            "dictionary analyzer loaded"
        );

        Ok(Self {
            tokenizer,
            scheme: options.scheme,
            device: Device::Cpu,
        })
    }
}

fn read_dictionary(path: &Path) -> Result<Dictionary> {
    let file = File::open(path).map_err(|e| {
        PipelineError::Dictionary(format!(
            "Failed to open dictionary '{}': {}",
            path.display(),
            e
        ))
    })?;
    let reader = BufReader::new(file);

    let reader: Box<dyn Read> = if path.extension().is_some_and(|e| e == "zst") {
        Box::new(zstd::Decoder::new(reader)?)
    } else {
        Box::new(reader)
    };

    Ok(Dictionary::read(reader)?)
}

impl crate::pipelines::pos_tagging::PosTaggingModel for DictionaryPosModel {
    type Options = DictionaryOptions;

    fn new(options: Self::Options, device: Device) -> Result<Self> {
        DictionaryPosModel::new(options, device)
    }

    fn tag(&self, text: &str) -> Result<Vec<Token>> {
        let mut worker = self.tokenizer.new_worker();
        let mut tokens = Vec::new();

        // The lattice is built per line; newlines never join two words.
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            worker.reset_sentence(line);
            worker.tokenize();
            tokens.extend(
                worker
                    .token_iter()
                    .map(|t| token_from_feature(t.surface(), t.feature(), self.scheme)),
            );
        }

        Ok(tokens)
    }

    fn scheme(&self) -> PosScheme {
        self.scheme
    }

    fn device(&self) -> &Device {
        &self.device
    }
}

/// Number of leading feature fields that hold the POS hierarchy.
const POS_FIELDS: usize = 4;

fn lemma_field(scheme: PosScheme) -> usize {
    match scheme {
        PosScheme::Unidic => 7,
        _ => 6,
    }
}

/// Convert a MeCab-style CSV feature into a token record.
fn token_from_feature(surface: &str, feature: &str, scheme: PosScheme) -> Token {
    let fields: Vec<&str> = feature.split(',').collect();

    let pos = fields
        .iter()
        .take(POS_FIELDS)
        .copied()
        .filter(|f| !f.is_empty() && *f != "*")
        .collect::<Vec<_>>()
        .join("-");

    let lemma = fields
        .get(lemma_field(scheme))
        .copied()
        .filter(|f| !f.is_empty() && *f != "*")
        .unwrap_or(surface);

    Token {
        text: surface.to_string(),
        lemma: lemma.to_string(),
        pos,
        tag: feature.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::pos_tagging::CoarseCategory;

    #[test]
    fn ipadic_feature_becomes_hyphenated_path() {
        let token = token_from_feature(
            "東京",
            "名詞,固有名詞,地域,一般,*,*,東京,トウキョウ,トーキョー",
            PosScheme::Ipadic,
        );
        assert_eq!(token.text, "東京");
        assert_eq!(token.pos, "名詞-固有名詞-地域-一般");
        assert_eq!(token.lemma, "東京");
        assert_eq!(token.category(PosScheme::Ipadic), Some(CoarseCategory::Noun));
    }

    #[test]
    fn ipadic_lemma_is_base_form() {
        let token = token_from_feature(
            "食べ",
            "動詞,自立,*,*,一段,連用形,食べる,タベ,タベ",
            PosScheme::Ipadic,
        );
        assert_eq!(token.pos, "動詞-自立");
        assert_eq!(token.lemma, "食べる");
    }

    #[test]
    fn unidic_lemma_uses_its_own_column() {
        let token = token_from_feature(
            "美味しい",
            "形容詞,一般,*,*,形容詞,連体形-一般,オイシイ,美味しい,美味しい,オイシー",
            PosScheme::Unidic,
        );
        assert_eq!(token.pos, "形容詞-一般");
        assert_eq!(token.lemma, "美味しい");
        assert_eq!(token.category(PosScheme::Unidic), Some(CoarseCategory::Adjective));
    }

    #[test]
    fn unknown_words_fall_back_to_surface() {
        let token = token_from_feature("ぽよ", "名詞,一般,*,*,*,*,*", PosScheme::Ipadic);
        assert_eq!(token.lemma, "ぽよ");

        let token = token_from_feature("ぽよ", "", PosScheme::Ipadic);
        assert_eq!(token.pos, "");
        assert_eq!(token.lemma, "ぽよ");
    }

    #[test]
    fn upos_scheme_is_rejected() {
        let options = DictionaryOptions::new("unused.dic", PosScheme::Upos);
        let err = DictionaryPosModel::new(options, Device::Cpu).err().unwrap();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn missing_dictionary_is_reported() {
        let options = DictionaryOptions::new("/no/such/system.dic.zst", PosScheme::Ipadic);
        let err = DictionaryPosModel::new(options, Device::Cpu).err().unwrap();
        assert!(matches!(err, PipelineError::Dictionary(_)));
    }
}
