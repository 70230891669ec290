use ja_text_pipelines::error::Result;
use ja_text_pipelines::keyphrase::{BertEmbeddingSize, KeyphrasePipelineBuilder};
use ja_text_pipelines::stopwords::StopWords;

fn main() -> Result<()> {
    let (stopwords, source) = StopWords::load("stopwords-ja.txt");
    println!("Stop words: {source}");

    println!("Building pipeline...");

    let pipeline = KeyphrasePipelineBuilder::bert(BertEmbeddingSize::Small)
        .top_n(5)
        .ngram_range(1, 2)
        .diversity(0.7)
        .stopwords(stopwords)
        .build()?;

    let text = "人工知能の研究は急速に進んでおり、自然言語処理や画像認識の分野で大きな成果が\
                出ている。特に大規模言語モデルは翻訳や要約などの応用で注目されている。";

    let output = pipeline.run(text)?;

    println!("\n=== Keyphrases ({} candidates) ===", output.candidates);
    for phrase in &output.keyphrases {
        println!("{:<20} {:.4}", phrase.text, phrase.relevance);
    }
    println!(
        "Completed in {:.2}ms",
        output.stats.total_time.as_secs_f64() * 1000.0
    );

    Ok(())
}
