//! In-memory translation store.
//!
//! Process-wide cache mapping `(source text, target language)` to the
//! translated text. The store lives for the whole session; switching the
//! active language does not clear it, so translations for other languages
//! stay warm for quick switching back.

use crate::i18n::Language;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Cache key: source text plus target language code.
type CacheKey = (String, &'static str);

/// Shared handle to the translation cache.
///
/// Cloning is cheap and all clones observe the same entries. Every mutation
/// is a single `Mutex` acquisition with no suspension points, so writes are
/// atomic with respect to each other; for a given key the last write wins.
#[derive(Debug, Clone, Default)]
pub struct TranslationStore {
    entries: Arc<Mutex<HashMap<CacheKey, String>>>,
}

impl TranslationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the cached translation for a text in a language.
    pub fn get(&self, text: &str, language: Language) -> Option<String> {
        let entries = self.entries.lock().expect("store mutex poisoned");
        entries.get(&(text.to_string(), language.code())).cloned()
    }

    /// Insert or overwrite the translation for a text in a language.
    pub fn set(&self, text: &str, language: Language, translated: &str) {
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        entries.insert((text.to_string(), language.code()), translated.to_string());
    }

    /// Insert several `(source, translated)` pairs for a language at once.
    pub fn set_batch(&self, language: Language, pairs: &[(String, String)]) {
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        for (source, translated) in pairs {
            entries.insert((source.clone(), language.code()), translated.clone());
        }
    }

    /// Check whether a translation is cached for a text in a language.
    pub fn has(&self, text: &str, language: Language) -> bool {
        let entries = self.entries.lock().expect("store mutex poisoned");
        entries.contains_key(&(text.to_string(), language.code()))
    }

    /// Number of cached entries across all languages.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("store mutex poisoned").len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached entry, for all languages.
    pub fn clear(&self) {
        self.entries.lock().expect("store mutex poisoned").clear();
    }
}
