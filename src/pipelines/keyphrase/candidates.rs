use crate::pipelines::pos_tagging::{PosScheme, Token};
use crate::stopwords::StopWords;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Kanji,
    Hiragana,
    Katakana,
    Alphanumeric,
}

fn script_of(c: char) -> Option<Script> {
    match c {
        '\u{3005}' | '\u{3006}' | '\u{3007}' | '\u{303b}' => Some(Script::Kanji),
        '\u{3400}'..='\u{4dbf}' | '\u{4e00}'..='\u{9fff}' | '\u{f900}'..='\u{faff}' => {
            Some(Script::Kanji)
        }
        '\u{3041}'..='\u{309f}' => Some(Script::Hiragana),
        '\u{30fb}' => None,
        '\u{30a0}'..='\u{30ff}' | '\u{31f0}'..='\u{31ff}' | '\u{ff66}'..='\u{ff9f}' => {
            Some(Script::Katakana)
        }
        c if c.is_alphanumeric() => Some(Script::Alphanumeric),
        _ => None,
    }
}

/// Split `text` into maximal runs of one script. Punctuation and whitespace separate runs
/// and are dropped.
pub(crate) fn script_runs(text: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut current: Option<(usize, Script)> = None;

    for (i, c) in text.char_indices() {
        let script = script_of(c);
        match (current, script) {
            (Some((_, open)), Some(s)) if open == s => {}
            (Some((start, _)), next) => {
                runs.push(&text[start..i]);
                current = next.map(|s| (i, s));
            }
            (None, next) => current = next.map(|s| (i, s)),
        }
    }
    if let Some((start, _)) = current {
        runs.push(&text[start..]);
    }

    runs
}

/// Surface forms a candidate list is built from: the given tokens minus punctuation and
/// whitespace, or script runs when no tokens are available.
pub(crate) fn word_units<'a>(
    text: &'a str,
    tokens: Option<(&'a [Token], PosScheme)>,
) -> Vec<&'a str> {
    match tokens {
        Some((tokens, scheme)) => tokens
            .iter()
            .filter(|t| !t.category(scheme).is_some_and(|c| c.is_punctuation()))
            .map(|t| t.text.trim())
            .filter(|t| !t.is_empty())
            .collect(),
        None => script_runs(text),
    }
}

/// N-grams of `units` after stop-word removal, joined without separators and deduplicated
/// in first-seen order.
pub(crate) fn ngram_candidates(
    units: &[&str],
    stopwords: &StopWords,
    (min, max): (usize, usize),
) -> Vec<String> {
    let kept: Vec<&str> = units
        .iter()
        .copied()
        .filter(|u| !stopwords.contains(u))
        .collect();

    let mut seen = std::collections::HashSet::new();
    let mut candidates = Vec::new();

    for start in 0..kept.len() {
        for n in min..=max {
            let Some(window) = kept.get(start..start + n) else {
                break;
            };
            let phrase = window.concat();
            if seen.insert(phrase.clone()) {
                candidates.push(phrase);
            }
        }
    }

    candidates
}
