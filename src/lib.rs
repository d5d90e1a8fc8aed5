//! Translation cache and batch dispatcher for the PhishAware training platform.
//!
//! UI strings and course content are authored in English; this crate keeps
//! an in-memory cache of their translations, fills it through a batching,
//! request-coalescing HTTP client, and exposes a page-facing service with
//! synchronous lookup, awaited lookup, and bulk pre-warming. Every layer is
//! fail-open: when the translation service is unreachable, pages render the
//! source text instead of an error.
//!
//! # Layers
//!
//! - [`store::TranslationStore`]: process-wide `(text, language)` cache
//! - [`client::BatchTranslateClient`]: deduplication, batching, coalescing,
//!   retries, and the wire format of the remote translation endpoint
//! - [`service::TranslationService`]: language selection, readiness state,
//!   and the `t` / `t_async` / `pre_translate` API pages consume
//! - [`fields`]: generic extraction/rehydration of translatable JSON fields
//! - [`i18n`]: language registry, validated `Language` type, metrics

pub mod client;
pub mod config;
pub mod fields;
pub mod i18n;
pub mod retry;
pub mod service;
pub mod store;

pub use client::BatchTranslateClient;
pub use i18n::Language;
pub use service::{TranslationReadiness, TranslationService};
pub use store::TranslationStore;
