use ja_text_pipelines::error::Result;
use ja_text_pipelines::keywords::FrequencyKeywordExtractor;
use ja_text_pipelines::pos_tagging::{DictionaryOptions, PosScheme, PosTaggingPipelineBuilder};

fn main() -> Result<()> {
    let dictionary = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ipadic-mecab-2_7_0/system.dic.zst".to_string());

    println!("Loading dictionary from {dictionary}...");

    let pipeline =
        PosTaggingPipelineBuilder::dictionary(DictionaryOptions::new(dictionary, PosScheme::Ipadic))
            .build()?;

    let text = "東京の猫は東京の犬よりも静かだ。猫は魚が好きで、犬は肉が好きだ。";
    let output = pipeline.run(text)?;

    println!("\n=== Tokens ===");
    for token in &output.tokens {
        println!("{}\t{}", token.text, token.pos);
    }

    let keywords = FrequencyKeywordExtractor::new(output.scheme)
        .with_top_n(5)
        .extract(&output.tokens);

    println!("\n=== Frequent keywords ===");
    for keyword in keywords {
        println!("{}\t{}", keyword.text, keyword.count);
    }

    Ok(())
}
