// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rich-text rendering of the credential preview shown in the notification
//! prompt. Every server-supplied string is escaped before it is embedded.

use chrono::{DateTime, Locale, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::i18n::{short_code, Translator, FALLBACK_LANGUAGE};
use crate::protocol::{CredentialPreview, Power};

/// Escape `& < > " '` for embedding in rich text.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render the preview block, or an empty string when it has nothing to show.
///
/// Missing or blank fields are omitted rather than shown as empty lines.
pub fn preview_html(preview: &CredentialPreview, translator: &dyn Translator) -> String {
    let mut lines = Vec::new();
    let mut field = |key: &str, value: Option<&String>| {
        if let Some(value) = value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
            lines.push(format!("{}: {}<br/>", translator.instant(key, &[]), escape_html(value)));
        }
    };
    field("confirmation.preview.subject", preview.subject_name.as_ref());
    field("confirmation.preview.organization", preview.organization.as_ref());
    field("confirmation.preview.issuer", preview.issuer.as_ref());

    let powers: Vec<String> = preview
        .power
        .iter()
        .map(|p| format_power(p, translator))
        .filter(|p| !p.is_empty())
        .collect();
    if !powers.is_empty() {
        lines.push(format!("{}:<br/>", translator.instant("confirmation.preview.powers", &[])));
        for power in powers {
            lines.push(format!("&bull; {power}<br/>"));
        }
    }

    if let Some(raw) = preview.expiration_date.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        let lang = translator.current_lang();
        lines.push(format!(
            "{}: {}<br/>",
            translator.instant("confirmation.preview.expiration", &[]),
            format_expiration(raw, lang.as_deref())
        ));
    }

    if lines.is_empty() {
        return String::new();
    }
    format!("<div style=\"margin-top:10px\">{}</div>", lines.concat())
}

/// `function (domain): action, action` with translated, escaped tokens.
pub fn format_power(power: &Power, translator: &dyn Translator) -> String {
    let function = power.function.trim();
    if function.is_empty() {
        return String::new();
    }
    let mut out = escape_html(&translator.instant(function, &[]));
    if let Some(domain) = power.domain.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        out.push_str(&format!(" ({})", escape_html(domain)));
    }
    let actions: Vec<String> = power
        .action
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(|a| escape_html(&translator.instant(a, &[])))
        .collect();
    if !actions.is_empty() {
        out.push_str(": ");
        out.push_str(&actions.join(", "));
    }
    out
}

/// Long-form localized date (day, full month name, year).
///
/// Unparseable input renders as its escaped literal text.
pub fn format_expiration(raw: &str, lang: Option<&str>) -> String {
    let lang = lang.map(short_code).unwrap_or_else(|| FALLBACK_LANGUAGE.to_owned());
    let (locale, pattern) = match lang.as_str() {
        "es" => (Locale::es_ES, "%-d de %B de %Y"),
        "ca" => (Locale::ca_ES, "%-d de %B de %Y"),
        _ => (Locale::en_US, "%B %-d, %Y"),
    };
    match parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)) {
        Some(midnight) => {
            Utc.from_utc_datetime(&midnight).format_localized(pattern, locale).to_string()
        }
        None => escape_html(raw),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok().map(|dt| dt.date())
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
