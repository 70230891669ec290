#![cfg(feature = "integration")]

use ja_text_pipelines::error::Result;
use ja_text_pipelines::keywords::FrequencyKeywordExtractor;
use ja_text_pipelines::pos_tagging::{
    BertPosSize, CoarseCategory, PosScheme, PosTaggingPipelineBuilder,
};

#[test]
fn bert_tagger_labels_japanese() -> Result<()> {
    let pipeline = PosTaggingPipelineBuilder::bert(BertPosSize::Base).build()?;
    assert_eq!(pipeline.scheme(), PosScheme::Upos);

    let text = "猫が魚を食べた。";
    let output = pipeline.run(text)?;

    assert!(!output.tokens.is_empty());
    for token in &output.tokens {
        assert!(text.contains(&token.text), "{} is not a substring", token.text);
        assert!(token.category(output.scheme).is_some(), "{token:?}");
    }
    assert!(output
        .tokens
        .iter()
        .any(|t| t.category(output.scheme) == Some(CoarseCategory::Noun)));
    Ok(())
}

#[test]
fn bert_tokens_feed_the_extractor() -> Result<()> {
    let pipeline = PosTaggingPipelineBuilder::bert(BertPosSize::Base).build()?;
    let output = pipeline.run("猫が好きだ。猫は可愛い。")?;

    let keywords = FrequencyKeywordExtractor::new(output.scheme).extract(&output.tokens);
    assert_eq!(keywords.first().map(|k| k.text.as_str()), Some("猫"));
    Ok(())
}

#[test]
fn blank_text_has_no_tokens() -> Result<()> {
    let pipeline = PosTaggingPipelineBuilder::bert(BertPosSize::Base).build()?;
    assert!(pipeline.run("   ")?.tokens.is_empty());
    Ok(())
}
