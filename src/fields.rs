//! Generic extraction and rehydration of translatable fields.
//!
//! Backend entities (courses, campaigns, incident reports) arrive as JSON
//! and carry a handful of human-readable fields that need translating.
//! Rather than hand-rolling per-entity plumbing, callers name the fields by
//! dot-separated paths: `extract_translatable` collects the strings in a
//! deterministic traversal order, and `rehydrate` writes translations back
//! in that same order. Arrays encountered along a path are mapped over.
//!
//! `rehydrate(v, paths, extract_translatable(v, paths))` leaves `v`
//! unchanged; a translations slice shorter than the extracted list leaves
//! the remaining fields untouched.

use serde_json::Value;

/// Collect the translatable strings addressed by `paths`, in traversal
/// order. Empty strings and non-string leaves are skipped.
pub fn extract_translatable(value: &Value, paths: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    for path in paths {
        let segments: Vec<&str> = path.split('.').collect();
        collect(value, &segments, &mut out);
    }
    out
}

/// Write `translations` back into the fields addressed by `paths`, walking
/// in the same order as [`extract_translatable`]. Surplus fields (when the
/// slice runs short) keep their source text.
pub fn rehydrate(value: &mut Value, paths: &[&str], translations: &[String]) {
    let mut remaining = translations.iter();
    for path in paths {
        let segments: Vec<&str> = path.split('.').collect();
        apply(value, &segments, &mut remaining);
    }
}

fn collect(value: &Value, segments: &[&str], out: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect(item, segments, out);
            }
        }
        Value::Object(map) => {
            if let Some((head, rest)) = segments.split_first() {
                if let Some(child) = map.get(*head) {
                    if rest.is_empty() {
                        collect_leaf(child, out);
                    } else {
                        collect(child, rest, out);
                    }
                }
            }
        }
        _ => {}
    }
}

fn collect_leaf(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.is_empty() => out.push(s.clone()),
        Value::Array(items) => {
            for item in items {
                collect_leaf(item, out);
            }
        }
        _ => {}
    }
}

fn apply<'a>(
    value: &mut Value,
    segments: &[&str],
    remaining: &mut impl Iterator<Item = &'a String>,
) {
    match value {
        Value::Array(items) => {
            for item in items {
                apply(item, segments, remaining);
            }
        }
        Value::Object(map) => {
            if let Some((head, rest)) = segments.split_first() {
                if let Some(child) = map.get_mut(*head) {
                    if rest.is_empty() {
                        apply_leaf(child, remaining);
                    } else {
                        apply(child, rest, remaining);
                    }
                }
            }
        }
        _ => {}
    }
}

fn apply_leaf<'a>(value: &mut Value, remaining: &mut impl Iterator<Item = &'a String>) {
    match value {
        Value::String(s) if !s.is_empty() => {
            if let Some(translated) = remaining.next() {
                *s = translated.clone();
            }
        }
        Value::Array(items) => {
            for item in items {
                apply_leaf(item, remaining);
            }
        }
        _ => {}
    }
}
