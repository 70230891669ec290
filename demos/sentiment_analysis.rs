use ja_text_pipelines::error::Result;
use ja_text_pipelines::sentiment::{ModernBertSize, SentimentAnalysisPipelineBuilder};

fn main() -> Result<()> {
    println!("Building pipeline...");

    let pipeline = SentimentAnalysisPipelineBuilder::modernbert(ModernBertSize::Base).build()?;

    println!("Pipeline built successfully.");

    let text = "新しいスマートフォンはとても使いやすくて気に入っています。";

    let output = pipeline.run(text)?;

    println!("\n=== Sentiment Analysis Result ===");
    println!("Text: \"{}\"", text);
    println!(
        "Sentiment: {} (confidence: {:.4})",
        output.prediction.label, output.prediction.score
    );
    for class in &output.scores {
        println!("  {:<10} {:.4}", class.label, class.score);
    }
    println!(
        "Completed in {:.2}ms",
        output.stats.total_time.as_secs_f64() * 1000.0
    );

    println!("\n=== Batch Inference ===");
    let texts = &[
        "この映画は最高でした！",
        "対応が遅くて二度と利用しません。",
        "今日は曇りです。",
    ];

    let output = pipeline.run_batch(texts)?;

    for r in output.results {
        let scores = r.scores?;
        if let Some(top) = scores.iter().max_by(|a, b| a.score.total_cmp(&b.score)) {
            println!("{} -> {} ({:.2})", r.text, top.label, top.score);
        }
    }

    Ok(())
}
