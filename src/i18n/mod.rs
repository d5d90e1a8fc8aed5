//! Internationalization (i18n) module for multi-language support.
//!
//! This module provides the language-related foundations of the translation
//! layer: the registry of supported languages, the validated `Language`
//! type, and translation observability counters.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for all supported languages and their metadata
//! - `language`: Type-safe Language type validated against the registry
//! - `metrics`: Translation observability and metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use phishaware_translation::i18n::{Language, LanguageRegistry};
//!
//! // Get canonical language (English)
//! let canonical = Language::canonical();
//!
//! // Create language from code
//! let urdu = Language::from_code("ur")?;
//!
//! // List all enabled languages
//! let languages = LanguageRegistry::get().list_enabled();
//! ```

mod language;
mod metrics;
mod registry;

pub use language::Language;
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
