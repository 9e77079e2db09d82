// src/services/locale.rs
// DOCUMENTATION: Request locale resolution and translated names
// PURPOSE: Pick the response language and read names out of translation maps

use serde_json::Value;

use crate::config::Config;

const RTL_LOCALES: [&str; 4] = ["ar", "he", "fa", "ur"];

/// Resolve the locale for a request
///
/// An explicit `lang` parameter wins when supported, then the highest
/// weighted supported language in `Accept-Language`, then the default.
pub fn resolve_locale(
    query_lang: Option<&str>,
    accept_language: Option<&str>,
    config: &Config,
) -> String {
    if let Some(lang) = query_lang.and_then(|l| primary_subtag(l)) {
        if config.supported_locales.contains(&lang) {
            return lang;
        }
        log::debug!("Unsupported lang parameter '{}', trying Accept-Language", lang);
    }

    if let Some(header) = accept_language {
        for candidate in parse_accept_language(header) {
            if config.supported_locales.contains(&candidate) {
                return candidate;
            }
        }
    }

    config.default_locale.clone()
}

/// Languages from an Accept-Language header, best first
/// Entries with q=0 are dropped; ties keep header order
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut weighted: Vec<(String, f32, usize)> = header
        .split(',')
        .enumerate()
        .filter_map(|(position, entry)| {
            let mut parts = entry.split(';');
            let tag = primary_subtag(parts.next()?)?;
            if tag == "*" {
                return None;
            }

            let quality = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);

            if quality <= 0.0 {
                return None;
            }
            Some((tag, quality, position))
        })
        .collect();

    weighted.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.2.cmp(&b.2))
    });

    let mut languages = Vec::new();
    for (tag, _, _) in weighted {
        if !languages.contains(&tag) {
            languages.push(tag);
        }
    }
    languages
}

/// "fr-CA" -> "fr"
fn primary_subtag(tag: &str) -> Option<String> {
    let primary = tag.trim().split(['-', '_']).next()?.trim().to_lowercase();
    if primary.is_empty() {
        None
    } else {
        Some(primary)
    }
}

/// Translated name for `locale`, or `fallback` when missing or blank
pub fn localized_name(translations: &Value, fallback: &str, locale: &str) -> String {
    translations
        .get(locale)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

pub fn is_rtl(locale: &str) -> bool {
    RTL_LOCALES.contains(&locale)
}

/// "rtl" or "ltr" for the response envelope
pub fn text_direction(locale: &str) -> &'static str {
    if is_rtl(locale) {
        "rtl"
    } else {
        "ltr"
    }
}

/// Translations must be a flat object of locale -> string
pub fn validate_translations(translations: &Value) -> Result<(), String> {
    let map = translations
        .as_object()
        .ok_or_else(|| "translations must be a JSON object".to_string())?;

    for (locale, name) in map {
        if !name.is_string() {
            return Err(format!("translation for '{}' must be a string", locale));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::test_config;
    use serde_json::json;

    #[test]
    fn test_query_parameter_wins() {
        let config = test_config();
        assert_eq!(resolve_locale(Some("AR"), Some("fr"), &config), "ar");
    }

    #[test]
    fn test_unsupported_query_falls_back_to_header() {
        let config = test_config();
        assert_eq!(resolve_locale(Some("de"), Some("de-DE, fr;q=0.8"), &config), "fr");
    }

    #[test]
    fn test_default_locale() {
        let config = test_config();
        assert_eq!(resolve_locale(None, Some("de, es;q=0.5"), &config), "en");
        assert_eq!(resolve_locale(None, None, &config), "en");
    }

    #[test]
    fn test_accept_language_ordering() {
        assert_eq!(
            parse_accept_language("fr-CA;q=0.5, ar, en;q=0.9, *;q=0.1"),
            vec!["ar", "en", "fr"]
        );
        assert_eq!(parse_accept_language("en;q=0, fr"), vec!["fr"]);
        assert_eq!(parse_accept_language("fr-FR, fr-CA;q=0.7"), vec!["fr"]);
    }

    #[test]
    fn test_localized_name() {
        let translations = json!({"fr": "Plombiers", "ar": "  "});
        assert_eq!(localized_name(&translations, "Plumbers", "fr"), "Plombiers");
        assert_eq!(localized_name(&translations, "Plumbers", "ar"), "Plumbers");
        assert_eq!(localized_name(&json!(null), "Plumbers", "fr"), "Plumbers");
    }

    #[test]
    fn test_direction() {
        assert_eq!(text_direction("ar"), "rtl");
        assert_eq!(text_direction("fr"), "ltr");
    }

    #[test]
    fn test_validate_translations() {
        assert!(validate_translations(&json!({"fr": "Cafés"})).is_ok());
        assert!(validate_translations(&json!({"fr": 1})).is_err());
        assert!(validate_translations(&json!(["fr"])).is_err());
    }
}
