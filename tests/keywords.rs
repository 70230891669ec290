use ja_text_pipelines::keywords::{FrequencyKeywordExtractor, KeywordCount};
use ja_text_pipelines::pos_tagging::{CoarseCategory, PosScheme, Token};

fn extract(tokens: &[Token], top_n: usize) -> Vec<(String, usize)> {
    FrequencyKeywordExtractor::new(PosScheme::Unidic)
        .with_top_n(top_n)
        .with_allowed_categories([CoarseCategory::Noun])
        .extract(tokens)
        .into_iter()
        .map(|KeywordCount { text, count }| (text, count))
        .collect()
}

#[test]
fn repeated_noun_is_counted() {
    let tokens = vec![
        Token::new("猫", "名詞-普通名詞"),
        Token::new("猫", "名詞-普通名詞"),
        Token::new("走る", "動詞"),
    ];
    assert_eq!(extract(&tokens, 10), vec![("猫".to_string(), 2)]);
}

#[test]
fn empty_sequence() {
    assert!(extract(&[], 10).is_empty());
}

#[test]
fn only_disallowed_categories() {
    let tokens = vec![Token::new("走る", "動詞"), Token::new("を", "助詞-格助詞")];
    assert!(extract(&tokens, 10).is_empty());
}

#[test]
fn tie_keeps_first_seen() {
    let tokens = vec![Token::new("A", "名詞"), Token::new("B", "名詞")];
    assert_eq!(extract(&tokens, 1), vec![("A".to_string(), 1)]);
}

#[test]
fn top_n_above_distinct_count() {
    let tokens = vec![
        Token::new("A", "名詞"),
        Token::new("B", "名詞"),
        Token::new("A", "名詞"),
    ];
    assert_eq!(
        extract(&tokens, 10),
        vec![("A".to_string(), 2), ("B".to_string(), 1)]
    );
}

#[test]
fn tagged_records_from_json() {
    let tokens: Vec<Token> = serde_json::from_str(
        r#"[
            {"text": "東京", "lemma": "東京", "pos": "名詞-固有名詞-地名-一般", "tag": "名詞"},
            {"text": "は", "pos": "助詞-係助詞"},
            {"text": "東京", "pos": "名詞-固有名詞-地名-一般"},
            {"text": "?"}
        ]"#,
    )
    .unwrap();
    assert_eq!(extract(&tokens, 10), vec![("東京".to_string(), 2)]);
}

#[test]
fn extraction_is_repeatable() {
    let tokens = vec![
        Token::new("空", "名詞"),
        Token::new("海", "名詞"),
        Token::new("海", "名詞"),
    ];
    assert_eq!(extract(&tokens, 2), extract(&tokens, 2));
}
