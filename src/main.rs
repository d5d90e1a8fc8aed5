use anyhow::Result;
use phishaware_translation::config::Config;
use phishaware_translation::i18n::{Language, TranslationMetrics};
use phishaware_translation::{BatchTranslateClient, TranslationService, TranslationStore};
use std::io::BufRead;
use tracing::info;

/// Warm the translation cache for a list of strings and print the results.
///
/// Reads newline-separated source strings from stdin; the target language
/// code is the first CLI argument (falling back to DEFAULT_LANGUAGE).
/// Exits zero even when the translation service is down: fail-open means
/// the output equals the input.
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("phishaware_translation=info".parse()?),
        )
        .init();

    // Load configuration from environment
    let config = Config::from_env()?;

    let language_code = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config.default_language.clone());
    let language = Language::from_code(&language_code)?;

    let store = TranslationStore::new();
    let client = BatchTranslateClient::from_config(&config, store)?;
    let service = TranslationService::new(client);
    service.set_language(language);

    let stdin = std::io::stdin();
    let texts: Vec<String> = stdin
        .lock()
        .lines()
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    info!(
        "Warming cache for {} strings in {}",
        texts.len(),
        language.name()
    );
    service.pre_translate(&texts).await;

    for text in &texts {
        println!("{} -> {}", text, service.t(text));
    }

    let report = TranslationMetrics::global().report();
    info!(
        "Done: {} batch call(s), {:.0}% cache hit rate",
        report.api_calls, report.cache_hit_rate
    );

    Ok(())
}
