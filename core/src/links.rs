//! Result link selection
//!
//! DBpedia pages are English-only. For users reading in another language the
//! link is routed through a translation proxy, and the original link is kept
//! alongside it.

use reqwest::Url;

const TRANSLATE_PROXY: &str = "https://translate.google.com/translate";

/// Link to show for a game entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLink {
    /// URL to open
    pub href: String,
    /// Link text
    pub label: String,
    /// Untranslated URL, present only when `href` goes through the proxy
    pub original: Option<String>,
}

impl ResultLink {
    pub fn is_translated(&self) -> bool {
        self.original.is_some()
    }
}

/// Whether `uri` should be routed through the translation proxy for `language`.
pub fn needs_translation(uri: &str, language: &str) -> bool {
    let language = language.trim();
    uri.contains("dbpedia.org") && !language.is_empty() && !language.eq_ignore_ascii_case("en")
}

/// Build the link for an entry URI. Returns `None` when there is no URI.
pub fn result_link(uri: Option<&str>, language: &str) -> Option<ResultLink> {
    let uri = uri.map(str::trim).filter(|u| !u.is_empty())?;

    if needs_translation(uri, language) {
        let lang = language.trim().to_lowercase();
        if let Ok(proxied) = Url::parse_with_params(
            TRANSLATE_PROXY,
            &[("sl", "en"), ("tl", lang.as_str()), ("u", uri)],
        ) {
            return Some(ResultLink {
                href: proxied.into(),
                label: format!("View in {}", language_name(&lang)),
                original: Some(uri.to_string()),
            });
        }
    }

    Some(ResultLink {
        href: uri.to_string(),
        label: "View on DBpedia".to_string(),
        original: None,
    })
}

/// Native display name for a language code.
pub fn language_name(code: &str) -> String {
    match code {
        "es" => "español",
        "en" => "English",
        "fr" => "français",
        "de" => "Deutsch",
        "it" => "italiano",
        "pt" => "português",
        "ja" => "日本語",
        "zh" => "中文",
        "ko" => "한국어",
        "ru" => "русский",
        other => return other.to_uppercase(),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PORTAL: &str = "http://dbpedia.org/resource/Portal_(video_game)";

    #[test]
    fn test_english_keeps_original() {
        let link = result_link(Some(PORTAL), "en").unwrap();
        assert_eq!(link.href, PORTAL);
        assert!(!link.is_translated());
        assert_eq!(link.label, "View on DBpedia");
    }

    #[test]
    fn test_non_english_dbpedia_is_proxied() {
        let link = result_link(Some(PORTAL), "es").unwrap();
        assert!(link.is_translated());
        assert!(link.href.starts_with("https://translate.google.com/translate?sl=en&tl=es&u="));
        assert!(link.href.contains("dbpedia.org%2Fresource%2FPortal_%28video_game%29"));
        assert_eq!(link.original.as_deref(), Some(PORTAL));
        assert_eq!(link.label, "View in español");
    }

    #[test]
    fn test_local_uri_never_proxied() {
        let link = result_link(Some("http://example.org/games#Celeste"), "fr").unwrap();
        assert!(!link.is_translated());
    }

    #[test]
    fn test_missing_uri() {
        assert!(result_link(None, "es").is_none());
        assert!(result_link(Some("  "), "es").is_none());
    }

    #[test]
    fn test_empty_language_not_proxied() {
        assert!(!needs_translation(PORTAL, ""));
        assert!(!needs_translation(PORTAL, "EN"));
        assert!(needs_translation(PORTAL, "ja"));
    }

    #[test]
    fn test_language_names() {
        assert_eq!(language_name("de"), "Deutsch");
        assert_eq!(language_name("nl"), "NL");
    }
}
