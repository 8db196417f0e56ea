//! Cache-exemption policy
//!
//! Queries that ask for rankings or aggregates ("best", "newest", ...) are
//! answered by the backend from context that changes independently of the
//! query text, so they are never served from or written to the cache.

/// Decides whether a normalized query bypasses the cache.
pub trait CacheExemption: Send + Sync {
    fn is_cache_exempt(&self, query: &str) -> bool;
}

impl<F> CacheExemption for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_cache_exempt(&self, query: &str) -> bool {
        self(query)
    }
}

/// Default analytic-intent vocabulary (English and Spanish).
pub const DEFAULT_EXEMPT_TERMS: &[&str] = &[
    "best",
    "most",
    "newest",
    "latest",
    "top",
    "highest",
    "greatest",
    "award-winning",
    "goty",
    "game of the year",
    "mejor",
    "mejores",
    "más",
    "reciente",
    "recientes",
    "premiado",
    "premiados",
];

/// Vocabulary-based exemption: a query is exempt when it contains any term
/// as a whole word, or any multi-word term as a whole phrase.
#[derive(Debug, Clone)]
pub struct AnalyticVocabulary {
    terms: Vec<String>,
}

impl Default for AnalyticVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_EXEMPT_TERMS.iter().copied())
    }
}

impl AnalyticVocabulary {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| words(t.as_ref(), false))
            .filter(|t| !t.trim().is_empty())
            .collect();
        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

impl CacheExemption for AnalyticVocabulary {
    fn is_cache_exempt(&self, query: &str) -> bool {
        let haystack = words(query, true);
        self.terms.iter().any(|term| haystack.contains(term.as_str()))
    }
}

// Lowercase and reduce to " w1 w2 ... " so that contains() only matches whole
// words. Hyphens stay part of a word ("award-winning"). With `split_compounds`
// a hyphenated word is followed by its parts, so "best-selling" also yields
// "best" and "selling".
fn words(text: &str, split_compounds: bool) -> String {
    let lower = text.to_lowercase();
    let mut out = String::from(" ");
    for word in lower
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
    {
        out.push_str(word);
        out.push(' ');
        if split_compounds && word.contains('-') {
            for part in word.split('-').filter(|p| !p.is_empty()) {
                out.push_str(part);
                out.push(' ');
            }
        }
    }
    out
}
