// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translation lookup and UI language selection.
//!
//! The core only needs a synchronous key→string function. [`Catalog`] serves
//! it from nested JSON catalogs (bundled for `en`, `es`, `ca`, or loaded from
//! a directory) with `{{param}}` interpolation; unknown keys echo back.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, error};

/// Languages with a bundled catalog.
pub const AVAILABLE_LANGUAGES: &[&str] = &["en", "es", "ca"];

/// Used when nothing else resolves.
pub const FALLBACK_LANGUAGE: &str = "en";

/// Pure, synchronous key→string lookup.
pub trait Translator: Send + Sync {
    fn instant(&self, key: &str, params: &[(&str, &str)]) -> String;

    /// The active UI language, if one is set.
    fn current_lang(&self) -> Option<String>;
}

/// Flattened translation catalog for a single language.
#[derive(Debug, Clone)]
pub struct Catalog {
    lang: String,
    entries: HashMap<String, String>,
}

impl Catalog {
    /// Parse a nested JSON catalog; nested objects become dotted keys.
    pub fn from_json(lang: &str, json: &str) -> anyhow::Result<Self> {
        let root: Value = serde_json::from_str(json)?;
        if !root.is_object() {
            anyhow::bail!("translation catalog for {lang} is not a JSON object");
        }
        let mut entries = HashMap::new();
        flatten("", &root, &mut entries);
        Ok(Self { lang: lang.to_owned(), entries })
    }

    /// One of the catalogs compiled into the binary.
    pub fn bundled(lang: &str) -> anyhow::Result<Self> {
        let json = match lang {
            "en" => include_str!("../i18n/en.json"),
            "es" => include_str!("../i18n/es.json"),
            "ca" => include_str!("../i18n/ca.json"),
            other => anyhow::bail!("no bundled catalog for language: {other}"),
        };
        Self::from_json(lang, json)
    }

    /// Load `<dir>/<lang>.json`.
    pub fn load_dir(dir: &Path, lang: &str) -> anyhow::Result<Self> {
        let path = dir.join(format!("{lang}.json"));
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        Self::from_json(lang, &contents)
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl Translator for Catalog {
    fn instant(&self, key: &str, params: &[(&str, &str)]) -> String {
        match self.get(key) {
            Some(template) => interpolate(template, params),
            None => key.to_owned(),
        }
    }

    fn current_lang(&self) -> Option<String> {
        Some(self.lang.clone())
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() { k.clone() } else { format!("{prefix}.{k}") };
                flatten(&key, v, out);
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_owned(), s.clone());
        }
        Value::Null => {}
        other => {
            out.insert(prefix.to_owned(), other.to_string());
        }
    }
}

/// Substitute `{{name}}` placeholders (inner whitespace allowed).
///
/// Placeholders without a matching parameter are left verbatim.
pub fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = rest[start + 2..start + 2 + len].trim();
        match params.iter().find(|(k, _)| *k == name) {
            Some((_, v)) => out.push_str(v),
            None => out.push_str(&rest[start..start + 4 + len]),
        }
        rest = &rest[start + 4 + len..];
    }
    out.push_str(rest);
    out
}

/// Reduce a locale tag (`es-ES`, `ca_ES.UTF-8`) to its language code.
pub fn short_code(tag: &str) -> String {
    let code = tag.split(|c| c == '-' || c == '_' || c == '.').next().unwrap_or_default();
    code.trim().to_lowercase()
}

fn is_available(lang: &str) -> bool {
    AVAILABLE_LANGUAGES.contains(&lang)
}

/// Pick the UI language.
///
/// Order: stored preference, then the system locale, then the configured
/// default, then [`FALLBACK_LANGUAGE`]. Unavailable candidates are skipped.
pub fn resolve_language(stored: Option<&str>, system: Option<&str>, default: &str) -> String {
    if let Some(stored) = stored.filter(|s| !s.trim().is_empty()) {
        let lang = short_code(stored);
        if is_available(&lang) {
            return lang;
        }
        error!(lang = %stored, "stored language is not available");
    }

    if let Some(lang) = system.map(short_code).filter(|l| is_available(l)) {
        return lang;
    }

    let lang = short_code(default);
    if is_available(&lang) {
        return lang;
    }
    error!(lang = %default, "default language is not available");
    FALLBACK_LANGUAGE.to_owned()
}

/// The process locale from `LC_ALL`, `LC_MESSAGES` or `LANG`.
pub fn system_locale() -> Option<String> {
    system_locale_with(|name| std::env::var(name).ok())
}

/// Inner implementation that accepts a lookup function for testability.
fn system_locale_with(get_env: impl Fn(&str) -> Option<String>) -> Option<String> {
    for var in ["LC_ALL", "LC_MESSAGES", "LANG"] {
        if let Some(value) = get_env(var) {
            let value = value.trim();
            if value.is_empty() || value == "C" || value.starts_with("C.") || value == "POSIX" {
                continue;
            }
            return Some(value.to_owned());
        }
    }
    debug!("no usable system locale");
    None
}

#[cfg(test)]
#[path = "i18n_tests.rs"]
mod tests;
