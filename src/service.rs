//! Page-facing translation service.
//!
//! `TranslationService` is what UI code talks to: a synchronous, cache-only
//! lookup (`t`), an awaited lookup (`t_async`), and a bulk cache warmer
//! (`pre_translate`). It also owns the active language and the readiness
//! state machine pages gate their render on, so untranslated text never
//! flashes while a warm-up is in flight.
//!
//! Readiness is epoch-guarded: every language change bumps an epoch, and a
//! warm-up that started under an older epoch cannot mark the new language
//! ready. Pages that render dynamic content should check `is_ready()`
//! rather than assume a sibling warm-up has completed.

use crate::client::BatchTranslateClient;
use crate::fields::{extract_translatable, rehydrate};
use crate::i18n::{Language, TranslationMetrics};
use crate::store::TranslationStore;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Render-readiness of the current language.
///
/// `NotReady -> Loading -> Ready` for translation targets; the canonical
/// language is `Ready` immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationReadiness {
    /// Language selected, cache not warmed yet
    NotReady,
    /// A `pre_translate` for the current language is in flight
    Loading,
    /// Synchronous lookups will hit the cache
    Ready,
}

struct LanguageState {
    language: Language,
    readiness: TranslationReadiness,
    /// Bumped on every language change; stale warm-ups compare against it
    epoch: u64,
}

/// Shared handle to the translation service. Clones observe the same
/// language, readiness, and cache.
#[derive(Clone)]
pub struct TranslationService {
    store: TranslationStore,
    client: BatchTranslateClient,
    state: Arc<Mutex<LanguageState>>,
}

impl TranslationService {
    /// Create a service starting in the canonical language (already ready).
    pub fn new(client: BatchTranslateClient) -> Self {
        Self {
            store: client.store().clone(),
            client,
            state: Arc::new(Mutex::new(LanguageState {
                language: Language::canonical(),
                readiness: TranslationReadiness::Ready,
                epoch: 0,
            })),
        }
    }

    /// The currently selected language.
    pub fn language(&self) -> Language {
        self.state.lock().expect("state mutex poisoned").language
    }

    /// Current readiness of the selected language.
    pub fn readiness(&self) -> TranslationReadiness {
        self.state.lock().expect("state mutex poisoned").readiness
    }

    /// Whether synchronous lookups for the selected language will hit cache.
    pub fn is_ready(&self) -> bool {
        self.readiness() == TranslationReadiness::Ready
    }

    /// Switch the active language.
    ///
    /// The cache is not cleared: translations for other languages stay warm
    /// for quick switching back. Readiness drops to `NotReady` until the
    /// next `pre_translate` completes (canonical is ready immediately).
    pub fn set_language(&self, language: Language) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        state.language = language;
        state.epoch += 1;
        state.readiness = if language.is_canonical() {
            TranslationReadiness::Ready
        } else {
            TranslationReadiness::NotReady
        };
        debug!("Language set to {} (epoch {})", language.code(), state.epoch);
    }

    /// Synchronous, cache-only lookup.
    ///
    /// Returns the cached translation for the current language, or `text`
    /// verbatim on a miss. Never blocks, never fails, never touches the
    /// network; warming the cache is `pre_translate`'s job.
    pub fn t(&self, text: &str) -> String {
        let language = self.language();
        if language.is_canonical() {
            return text.to_string();
        }

        let metrics = TranslationMetrics::global();
        match self.store.get(text, language) {
            Some(translated) => {
                metrics.record_cache_hit();
                translated
            }
            None => {
                metrics.record_cache_miss();
                text.to_string()
            }
        }
    }

    /// Awaited lookup: cached value if present, otherwise one (coalesced)
    /// network round-trip. Falls back to `text` on failure.
    pub async fn t_async(&self, text: &str) -> String {
        let language = self.language();
        if language.is_canonical() {
            return text.to_string();
        }

        if let Some(translated) = self.store.get(text, language) {
            TranslationMetrics::global().record_cache_hit();
            return translated;
        }

        let texts = [text.to_string()];
        let mut results = self.client.translate_batch(&texts, language).await;
        results.pop().unwrap_or_else(|| text.to_string())
    }

    /// Warm the cache for a page's strings in one batch.
    ///
    /// Drives the readiness machine: `Loading` while the batch is in
    /// flight, `Ready` once it lands. A language change during the flight
    /// leaves the new language `NotReady` (the stale result still lands in
    /// the shared cache, which is harmless).
    pub async fn pre_translate(&self, texts: &[String]) {
        let (language, epoch) = {
            let mut state = self.state.lock().expect("state mutex poisoned");
            if state.language.is_canonical() {
                state.readiness = TranslationReadiness::Ready;
                return;
            }
            state.readiness = TranslationReadiness::Loading;
            (state.language, state.epoch)
        };

        self.client.translate_batch(texts, language).await;

        let mut state = self.state.lock().expect("state mutex poisoned");
        if state.epoch == epoch {
            state.readiness = TranslationReadiness::Ready;
        } else {
            debug!(
                "Discarding readiness from stale warm-up for {} (epoch {} != {})",
                language.code(),
                epoch,
                state.epoch
            );
        }
    }

    /// Translate the fields of a JSON entity in place.
    ///
    /// Extracts the strings addressed by `paths`, warms the cache for them,
    /// and writes the translations back in extraction order.
    pub async fn pre_translate_value(&self, value: &mut Value, paths: &[&str]) {
        let texts = extract_translatable(value, paths);
        if texts.is_empty() {
            return;
        }
        self.pre_translate(&texts).await;

        let translations: Vec<String> = texts.iter().map(|text| self.t(text)).collect();
        rehydrate(value, paths, &translations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryConfig;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_service(endpoint: &str) -> TranslationService {
        let client = BatchTranslateClient::new(endpoint, TranslationStore::new())
            .with_retry_config(RetryConfig::no_retry());
        TranslationService::new(client)
    }

    fn translations_response(translations: &[&str]) -> serde_json::Value {
        serde_json::json!({ "translations": translations })
    }

    fn strings(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    // ==================== Initial State Tests ====================

    #[tokio::test]
    async fn test_starts_canonical_and_ready() {
        let service = test_service("http://invalid-url.test");
        assert_eq!(service.language(), Language::ENGLISH);
        assert!(service.is_ready());
    }

    // ==================== t() Tests ====================

    #[tokio::test]
    async fn test_t_is_identity_for_canonical_language() {
        let service = test_service("http://invalid-url.test");
        assert_eq!(service.t("Email"), "Email");
    }

    #[tokio::test]
    async fn test_t_falls_back_to_source_on_cold_cache() {
        let service = test_service("http://invalid-url.test");
        service.set_language(Language::URDU);

        // Never undefined, never an error: source text comes back verbatim
        assert_eq!(service.t("Email"), "Email");
        assert_eq!(service.t(""), "");
    }

    #[tokio::test]
    async fn test_t_reads_from_warm_cache() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(translations_response(&["ای میل", "واٹس ایپ"])),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let service = test_service(&mock_server.uri());
        service.set_language(Language::URDU);
        service.pre_translate(&strings(&["Email", "WhatsApp"])).await;

        assert_eq!(service.t("Email"), "ای میل");
        assert_eq!(service.t("WhatsApp"), "واٹس ایپ");
    }

    // ==================== t_async() Tests ====================

    #[tokio::test]
    async fn test_t_async_identity_for_canonical() {
        let service = test_service("http://invalid-url-should-not-be-called.test");
        assert_eq!(service.t_async("Email").await, "Email");
    }

    #[tokio::test]
    async fn test_t_async_fetches_on_miss() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(translations_response(&["ای میل"])),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let service = test_service(&mock_server.uri());
        service.set_language(Language::URDU);

        assert_eq!(service.t_async("Email").await, "ای میل");
        // Second call is served from cache; wiremock verifies one request
        assert_eq!(service.t_async("Email").await, "ای میل");
    }

    #[tokio::test]
    async fn test_t_async_concurrent_callers_coalesce() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(translations_response(&["ای میل"]))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let service = test_service(&mock_server.uri());
        service.set_language(Language::URDU);

        let (first, second) = tokio::join!(service.t_async("Email"), service.t_async("Email"));
        assert_eq!(first, "ای میل");
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_t_async_falls_back_on_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let service = test_service(&mock_server.uri());
        service.set_language(Language::URDU);

        assert_eq!(service.t_async("Email").await, "Email");
    }

    // ==================== Readiness Tests ====================

    #[tokio::test]
    async fn test_set_language_resets_readiness() {
        let service = test_service("http://invalid-url.test");

        service.set_language(Language::URDU);
        assert_eq!(service.readiness(), TranslationReadiness::NotReady);

        service.set_language(Language::ENGLISH);
        assert_eq!(service.readiness(), TranslationReadiness::Ready);
    }

    #[tokio::test]
    async fn test_pre_translate_flips_ready() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(translations_response(&["ای میل"])),
            )
            .mount(&mock_server)
            .await;

        let service = test_service(&mock_server.uri());
        service.set_language(Language::URDU);
        assert!(!service.is_ready());

        service.pre_translate(&strings(&["Email"])).await;
        assert!(service.is_ready());
    }

    #[tokio::test]
    async fn test_pre_translate_reports_loading_while_in_flight() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(translations_response(&["ای میل"]))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&mock_server)
            .await;

        let service = test_service(&mock_server.uri());
        service.set_language(Language::URDU);

        let warm = {
            let service = service.clone();
            tokio::spawn(async move {
                service.pre_translate(&strings(&["Email"])).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(service.readiness(), TranslationReadiness::Loading);

        warm.await.expect("warm-up task");
        assert!(service.is_ready());
    }

    #[tokio::test]
    async fn test_pre_translate_failure_still_flips_ready() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let service = test_service(&mock_server.uri());
        service.set_language(Language::URDU);

        // Fail-open: the page renders in the source language rather than
        // being stuck behind a readiness gate
        service.pre_translate(&strings(&["Email"])).await;
        assert!(service.is_ready());
        assert_eq!(service.t("Email"), "Email");
    }

    #[tokio::test]
    async fn test_stale_warm_up_does_not_mark_new_language_ready() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(translations_response(&["ای میل"]))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&mock_server)
            .await;

        let service = test_service(&mock_server.uri());
        service.set_language(Language::URDU);

        let warm = {
            let service = service.clone();
            tokio::spawn(async move {
                service.pre_translate(&strings(&["Email"])).await;
            })
        };

        // Switch languages while the Urdu warm-up is in flight
        tokio::time::sleep(Duration::from_millis(50)).await;
        service.set_language(Language::SPANISH);

        warm.await.expect("warm-up task");
        assert_eq!(service.readiness(), TranslationReadiness::NotReady);

        // The stale batch still landed in the shared cache (harmless)
        assert!(service.store.has("Email", Language::URDU));
    }

    #[tokio::test]
    async fn test_pre_translate_under_canonical_is_immediate() {
        let service = test_service("http://invalid-url-should-not-be-called.test");
        service.pre_translate(&strings(&["Email", "WhatsApp"])).await;
        assert!(service.is_ready());
    }

    // ==================== Cache Retention Tests ====================

    #[tokio::test]
    async fn test_language_switch_keeps_other_languages_warm() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(translations_response(&["ای میل"])),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let service = test_service(&mock_server.uri());
        service.set_language(Language::URDU);
        service.pre_translate(&strings(&["Email"])).await;

        // Switch away and back: the Urdu entry must survive
        service.set_language(Language::ENGLISH);
        service.set_language(Language::URDU);
        assert_eq!(service.t("Email"), "ای میل");
    }

    // ==================== Entity Translation Tests ====================

    #[tokio::test]
    async fn test_pre_translate_value_rewrites_fields() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(translations_response(&[
                "فشنگ ای میلز کی شناخت",
                "وائس فشنگ",
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let service = test_service(&mock_server.uri());
        service.set_language(Language::URDU);

        let mut courses = json!([
            { "id": 1, "title": "Spotting Phishing Emails" },
            { "id": 2, "title": "Voice Phishing" }
        ]);
        service.pre_translate_value(&mut courses, &["title"]).await;

        assert_eq!(courses[0]["title"], "فشنگ ای میلز کی شناخت");
        assert_eq!(courses[1]["title"], "وائس فشنگ");
        assert_eq!(courses[0]["id"], 1);
    }

    #[tokio::test]
    async fn test_pre_translate_value_no_translatable_fields() {
        let service = test_service("http://invalid-url-should-not-be-called.test");
        service.set_language(Language::URDU);

        let mut entity = json!({ "id": 9, "score": 80 });
        let original = entity.clone();
        service
            .pre_translate_value(&mut entity, &["title", "description"])
            .await;

        assert_eq!(entity, original);
    }
}
