#![cfg(feature = "integration")]

use ja_text_pipelines::error::Result;
use ja_text_pipelines::sentiment::{ModernBertSize, SentimentAnalysisPipelineBuilder};
use ja_text_pipelines::ModelCache;

#[test]
fn sentiment_basic() -> Result<()> {
    let pipeline = SentimentAnalysisPipelineBuilder::modernbert(ModernBertSize::Base).build()?;

    let output = pipeline.run("このレストランは本当に美味しかった！")?;
    assert!(!output.prediction.label.trim().is_empty());
    assert!(output.prediction.score >= 0.0 && output.prediction.score <= 1.0);

    let total: f32 = output.scores.iter().map(|p| p.score).sum();
    assert!((total - 1.0).abs() < 1e-3);
    Ok(())
}

#[test]
fn sentiment_batch_matches_single() -> Result<()> {
    let pipeline = SentimentAnalysisPipelineBuilder::modernbert(ModernBertSize::Base).build()?;

    let texts: &[&str] = &[
        "最高の一日でした。",
        "最悪のサービスだった。",
        "明日は月曜日です。",
    ];

    let batch = pipeline.run_batch(texts)?;
    assert_eq!(batch.results.len(), texts.len());

    for (text, result) in texts.iter().zip(batch.results) {
        let single = pipeline.run(text)?;
        let scores = result.scores?;
        let top = scores
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .unwrap();
        assert_eq!(top.label, single.prediction.label, "label mismatch for {text}");
    }
    Ok(())
}

#[test]
fn cached_builds_reuse_weights() -> Result<()> {
    let cache = ModelCache::new();
    let _first = SentimentAnalysisPipelineBuilder::modernbert(ModernBertSize::Base)
        .build_cached(&cache)?;
    let _second = SentimentAnalysisPipelineBuilder::modernbert(ModernBertSize::Base)
        .build_cached(&cache)?;

    assert_eq!(cache.len(), 1);
    Ok(())
}
