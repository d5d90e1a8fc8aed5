//! Batching, coalescing HTTP client for the translation service.
//!
//! `BatchTranslateClient` turns a list of source strings into cache entries
//! with as few network calls as possible: duplicates are collapsed, strings
//! already cached are skipped, and strings covered by another caller's
//! in-flight request are awaited instead of re-requested. The public entry
//! point never fails; on any error the affected strings fall back to their
//! source text so pages can always render.

use crate::config::Config;
use crate::i18n::{Language, TranslationMetrics};
use crate::retry::{with_retry_if, RetryConfig};
use crate::store::TranslationStore;
use anyhow::{Context, Result};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Key for the in-flight request map: source text plus target language code.
type PendingKey = (String, &'static str);

/// A batch fetch that several callers may await concurrently.
type BatchFuture = Shared<BoxFuture<'static, ()>>;

/// Errors from a single batch request. Contained inside the client; callers
/// of [`BatchTranslateClient::translate_batch`] never see them.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to reach translation service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed translation response: {0}")]
    Malformed(String),
}

impl TranslateError {
    /// 429 and 5xx responses, transport failures, and decode failures are
    /// transient; other 4xx client errors are not worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslateError::Api { status, .. } => *status == 429 || *status >= 500,
            TranslateError::Transport(_) => true,
            TranslateError::Malformed(_) => true,
        }
    }
}

/// Request payload for the batch translation endpoint.
#[derive(Debug, Serialize)]
struct BatchTranslationRequest {
    texts: Vec<String>,
    target_language: String,
}

/// Response payload: translations in the same order as the requested texts.
#[derive(Debug, Deserialize)]
struct BatchTranslationResponse {
    translations: Vec<String>,
}

/// Deduplicating, coalescing batch client.
///
/// Cloning is cheap; clones share the same store and in-flight request map,
/// so coalescing works across clones.
#[derive(Clone)]
pub struct BatchTranslateClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    retry: RetryConfig,
    store: TranslationStore,
    pending: Arc<Mutex<HashMap<PendingKey, BatchFuture>>>,
}

impl BatchTranslateClient {
    /// Create a client for the given endpoint with default settings.
    pub fn new(endpoint: impl Into<String>, store: TranslationStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: None,
            retry: RetryConfig::api_call(),
            store,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a client from the application configuration.
    ///
    /// The request timeout from the config applies to every batch call;
    /// a timed-out call is handled like any other transport failure.
    pub fn from_config(config: &Config, store: TranslationStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client for translation service")?;

        Ok(Self {
            http,
            endpoint: config.translate_api_url.clone(),
            api_key: config.translate_api_key.clone(),
            retry: RetryConfig::api_call(),
            store,
            pending: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Override the retry configuration.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The store this client populates.
    pub fn store(&self) -> &TranslationStore {
        &self.store
    }

    /// Translate a list of strings, returning translations in input order.
    ///
    /// The input may contain duplicates and empty strings. Strings the
    /// service did not translate (missing from the response, or the whole
    /// batch failed) come back as their source text. This method does not
    /// fail: worst case, the output equals the input.
    pub async fn translate_batch(&self, texts: &[String], language: Language) -> Vec<String> {
        // The canonical language is the identity: no cache, no network.
        if language.is_canonical() {
            return texts.to_vec();
        }

        let mut waits: Vec<BatchFuture> = Vec::new();
        let mut joined_in_flight = false;

        // Partitioning and pending registration happen under one lock so
        // two overlapping calls cannot both classify a string as fresh.
        {
            let mut pending = self.pending.lock().expect("pending mutex poisoned");
            let mut seen: HashSet<&str> = HashSet::new();
            let mut fresh: Vec<String> = Vec::new();

            for text in texts {
                if text.is_empty() || !seen.insert(text.as_str()) {
                    continue;
                }
                if self.store.has(text, language) {
                    continue;
                }
                if let Some(in_flight) = pending.get(&(text.clone(), language.code())) {
                    waits.push(in_flight.clone());
                    joined_in_flight = true;
                } else {
                    fresh.push(text.clone());
                }
            }

            if !fresh.is_empty() {
                let fetch = self.batch_fetch(fresh.clone(), language);
                for text in &fresh {
                    pending.insert((text.clone(), language.code()), fetch.clone());
                }
                waits.push(fetch);
            }
        }

        if joined_in_flight {
            TranslationMetrics::global().record_coalesced_wait();
        }

        // Awaiting the same shared future more than once is harmless.
        futures::future::join_all(waits).await;

        texts
            .iter()
            .map(|text| {
                self.store
                    .get(text, language)
                    .unwrap_or_else(|| text.clone())
            })
            .collect()
    }

    /// Build the shared future that performs one network round-trip for a
    /// deduplicated set of uncached strings and writes the results into the
    /// store. Pending markers are cleared on success and on failure, so a
    /// failed batch can be retried by a later call.
    fn batch_fetch(&self, texts: Vec<String>, language: Language) -> BatchFuture {
        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();
        let retry = self.retry.clone();
        let store = self.store.clone();
        let pending = Arc::clone(&self.pending);

        async move {
            let metrics = TranslationMetrics::global();
            metrics.record_api_call();

            let outcome = with_retry_if(
                &retry,
                &format!("Batch translation to {}", language.name()),
                || send_batch(&http, &endpoint, api_key.as_deref(), &texts, language),
                TranslateError::is_retryable,
            )
            .await;

            match outcome {
                Ok(translations) => {
                    if translations.len() < texts.len() {
                        warn!(
                            "Translation service returned {} of {} requested strings for {}",
                            translations.len(),
                            texts.len(),
                            language.code()
                        );
                    }
                    // zip drops any excess translations and leaves untranslated
                    // tails to the source-text fallback at resolve time
                    let pairs: Vec<(String, String)> =
                        texts.iter().cloned().zip(translations).collect();
                    store.set_batch(language, &pairs);
                    debug!(
                        "Cached {} translations for {}",
                        pairs.len(),
                        language.code()
                    );
                }
                Err(e) => {
                    metrics.record_api_failure();
                    warn!(
                        "Batch translation to {} failed, falling back to source text: {}",
                        language.name(),
                        e
                    );
                }
            }

            let mut pending = pending.lock().expect("pending mutex poisoned");
            for text in &texts {
                pending.remove(&(text.clone(), language.code()));
            }
        }
        .boxed()
        .shared()
    }
}

/// Perform one POST to the translation endpoint.
async fn send_batch(
    http: &reqwest::Client,
    endpoint: &str,
    api_key: Option<&str>,
    texts: &[String],
    language: Language,
) -> std::result::Result<Vec<String>, TranslateError> {
    let request = BatchTranslationRequest {
        texts: texts.to_vec(),
        target_language: language.code().to_string(),
    };

    let mut builder = http.post(endpoint).json(&request);
    if let Some(key) = api_key {
        builder = builder.header("Authorization", format!("Bearer {}", key));
    }

    let response = builder.send().await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
        return Err(TranslateError::Api { status, body });
    }

    let parsed: BatchTranslationResponse = response
        .json()
        .await
        .map_err(|e| TranslateError::Malformed(e.to_string()))?;

    Ok(parsed.translations)
}
