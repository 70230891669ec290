//! `ja-annotate`: sentiment, keyphrases, frequency keywords and POS tags for Japanese text.

use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use ja_text_pipelines::analysis::{AnalysisReport, Analyzer, ModelHandles, Panel, Tagger};
use ja_text_pipelines::config::AnalysisConfig;
use ja_text_pipelines::error::Result;
use ja_text_pipelines::keyphrase::{BertEmbeddingSize, KeyphraseParams, KeyphrasePipelineBuilder};
use ja_text_pipelines::pos_tagging::{
    BertPosSize, DictionaryOptions, PosScheme, PosTaggingPipelineBuilder,
};
use ja_text_pipelines::sentiment::{ModernBertSize, SentimentAnalysisPipelineBuilder};
use ja_text_pipelines::stopwords::StopWords;
use ja_text_pipelines::{input, ModelCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PosBackend {
    /// BERT token classifier (Universal POS tags)
    Bert,
    /// MeCab-style system dictionary via vibrato
    Dictionary,
}

#[derive(Parser)]
#[command(
    name = "ja-annotate",
    about = "Annotate Japanese text with sentiment, keyphrases, keywords and POS tags"
)]
#[command(group(ArgGroup::new("input").required(true).args(["text", "file"])))]
struct Args {
    /// Text to analyze
    text: Option<String>,

    /// Read the text from a UTF-8 file instead
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// TOML config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of keyphrases and keywords
    #[arg(long)]
    top_n: Option<usize>,

    /// Shortest keyphrase candidate, in words
    #[arg(long)]
    ngram_min: Option<usize>,

    /// Longest keyphrase candidate, in words
    #[arg(long)]
    ngram_max: Option<usize>,

    /// Keyphrase diversity between 0.0 (relevance only) and 1.0
    #[arg(long)]
    diversity: Option<f32>,

    /// Stop-word file, one word per line
    #[arg(long)]
    stopwords: Option<PathBuf>,

    /// Part-of-speech backend
    #[arg(long, value_enum, default_value_t = PosBackend::Bert)]
    pos_backend: PosBackend,

    /// System dictionary for the dictionary backend (system.dic or system.dic.zst)
    #[arg(long)]
    dictionary: Option<PathBuf>,

    /// Label scheme of the POS tags (ipadic, unidic, upos)
    #[arg(long)]
    scheme: Option<PosScheme>,

    /// Skip sentiment analysis
    #[arg(long, default_value_t = false)]
    no_sentiment: bool,

    /// Skip keyphrase ranking
    #[arg(long, default_value_t = false)]
    no_keyphrases: bool,

    /// Run models on this CUDA device
    #[arg(long)]
    cuda: Option<usize>,

    /// Print one JSON document instead of text panels
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Args {
    fn config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_toml_file(path)?,
            None => AnalysisConfig::default(),
        };

        if let Some(top_n) = self.top_n {
            config.top_n = top_n;
        }
        if let Some(min) = self.ngram_min {
            config.ngram_range.0 = min;
        }
        if let Some(max) = self.ngram_max {
            config.ngram_range.1 = max;
        }
        if let Some(diversity) = self.diversity {
            config.diversity = diversity;
        }
        if let Some(path) = &self.stopwords {
            config.stopwords_path = path.clone();
        }
        if let Some(scheme) = self.scheme {
            config.pos_scheme = Some(scheme);
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ja_text_pipelines=info,ja_annotate=info")),
        )
        .init();

    let args = Args::parse();

    let config = match args.config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    if args.pos_backend == PosBackend::Dictionary && args.dictionary.is_none() {
        eprintln!("Error: --pos-backend dictionary requires --dictionary <path>");
        return ExitCode::from(2);
    }

    let text = match (&args.text, &args.file) {
        (_, Some(path)) => input::read_text_file(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "input file ignored");
            eprintln!("Warning: {e}. Continuing with empty input.");
            String::new()
        }),
        (Some(text), None) => text.clone(),
        (None, None) => String::new(),
    };

    let (stopwords, source) = StopWords::load(&config.stopwords_path);
    tracing::info!(%source, words = stopwords.len(), "stop words ready");

    let handles = load_models(&args, &config, &stopwords);

    let analyzer = match Analyzer::new(config, handles, stopwords) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    let report = match analyzer.run(&text) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Warning: {e}");
            return ExitCode::SUCCESS;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error: failed to render report: {e}"),
        }
    } else {
        print_report(&report);
    }

    ExitCode::SUCCESS
}

/// Load every requested model once. A model that fails to load is reported and left out.
fn load_models(args: &Args, config: &AnalysisConfig, stopwords: &StopWords) -> ModelHandles {
    let cache = ModelCache::new();
    let mut handles = ModelHandles::default();

    if !args.no_sentiment {
        let builder = SentimentAnalysisPipelineBuilder::modernbert(ModernBertSize::Base);
        let builder = match args.cuda {
            Some(index) => builder.cuda(index),
            None => builder.cpu(),
        };
        match builder.build_cached(&cache) {
            Ok(pipeline) => handles.sentiment = Some(Arc::new(pipeline)),
            Err(e) => report_load_failure("sentiment", &e),
        }
    }

    let tagger: Result<Arc<dyn Tagger>> = match (&args.pos_backend, &args.dictionary) {
        (PosBackend::Dictionary, Some(path)) => {
            let scheme = config.pos_scheme.unwrap_or(PosScheme::Ipadic);
            PosTaggingPipelineBuilder::dictionary(DictionaryOptions::new(path, scheme))
                .build_cached(&cache)
                .map(|p| Arc::new(p) as Arc<dyn Tagger>)
        }
        _ => {
            let builder = PosTaggingPipelineBuilder::bert(BertPosSize::Base);
            let builder = match args.cuda {
                Some(index) => builder.cuda(index),
                None => builder.cpu(),
            };
            builder
                .build_cached(&cache)
                .map(|p| Arc::new(p) as Arc<dyn Tagger>)
        }
    };
    match tagger {
        Ok(tagger) => handles.tagger = Some(tagger),
        Err(e) => report_load_failure("pos tagging", &e),
    }

    if !args.no_keyphrases {
        let builder = KeyphrasePipelineBuilder::bert(BertEmbeddingSize::Small)
            .params(KeyphraseParams::from(config))
            .stopwords(stopwords.clone());
        let builder = match args.cuda {
            Some(index) => builder.cuda(index),
            None => builder.cpu(),
        };
        match builder.build_cached(&cache) {
            Ok(pipeline) => handles.keyphrases = Some(Arc::new(pipeline)),
            Err(e) => report_load_failure("keyphrases", &e),
        }
    }

    handles
}

fn report_load_failure(feature: &str, error: &ja_text_pipelines::error::PipelineError) {
    tracing::error!(feature, %error, "model failed to load");
    eprintln!("Warning: {feature} is unavailable: {error}");
}

fn print_report(report: &AnalysisReport) {
    println!("== Sentiment ==");
    print_panel(&report.sentiment, |summary| {
        println!(
            "{} ({:.2})",
            summary.prediction.label, summary.prediction.score
        );
        for class in &summary.scores {
            println!("  {:<10} {:.4}", class.label, class.score);
        }
    });

    println!("\n== Keyphrases ==");
    print_panel(&report.keyphrases, |phrases| {
        if phrases.is_empty() {
            println!("(none)");
        }
        for phrase in phrases {
            println!("  {:<20} {:.4}", phrase.text, phrase.relevance);
        }
    });

    println!("\n== Frequent keywords ==");
    print_panel(&report.keywords, |keywords| {
        if keywords.is_empty() {
            println!("(none)");
        }
        for keyword in keywords {
            println!("  {:<20} {}", keyword.text, keyword.count);
        }
    });

    println!("\n== Tokens ==");
    print_panel(&report.tokens, |tokens| {
        println!("  {:<12} pos", "text");
        for token in tokens {
            println!("  {:<12} {}", token.text, token.pos);
        }
    });
}

fn print_panel<T>(panel: &Panel<T>, render: impl FnOnce(&T)) {
    match panel {
        Panel::Ready(value) => render(value),
        Panel::Unavailable => println!("(unavailable)"),
        Panel::Failed(message) => println!("(failed: {message})"),
    }
}
