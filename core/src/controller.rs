//! Incremental search controller
//!
//! Turns a stream of input events into at most one displayed result per
//! settled query:
//! - keystrokes are debounced; only the latest timer survives
//! - at most one request is in flight; a newer submission cancels it
//! - successful, cache-eligible results are cached by query text
//! - a response is rendered only if its request is still the current one
//!
//! The controller is a cheap `Clone` handle. All mutable state sits behind a
//! single mutex that is never held across an `.await`; rendering happens
//! under that mutex so a stale response cannot interleave with a newer render.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::backend::SearchBackend;
use crate::cache::{SearchCache, DEFAULT_CAPACITY, DEFAULT_TTL};
use crate::config::SearchConfig;
use crate::error::Error;
use crate::policy::{AnalyticVocabulary, CacheExemption};
use crate::render::Renderer;
use crate::token::CancelToken;
use crate::types::{SearchField, Severity};

/// Default debounce delay between the last keystroke and the search
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// Queries shorter than this (after trimming) never reach the network
pub const DEFAULT_MIN_QUERY_LEN: usize = 2;

/// Notice shown for queries below the minimum length.
pub fn too_short_notice(min_len: usize) -> String {
    format!("Type at least {} characters to search", min_len)
}

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub debounce: Duration,
    pub min_query_len: usize,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
            cache_ttl: DEFAULT_TTL,
            cache_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl From<&SearchConfig> for ControllerOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            debounce: config.debounce(),
            min_query_len: config.min_query_len,
            cache_ttl: config.cache_ttl(),
            cache_capacity: config.cache_capacity,
        }
    }
}

/// Which path a submission took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Query was empty; displayed results were cleared
    EmptyQuery,
    /// Query below the minimum length; a notice was shown
    QueryTooShort,
    /// Served from the cache without network I/O
    CacheHit,
    /// Fetched from the backend and rendered
    Rendered,
    /// Superseded by a newer submission; nothing was rendered
    Canceled,
    /// Transport failure or malformed response
    TransportError(String),
    /// Backend answered with `success: false`
    BackendError(String),
}

struct Pending {
    generation: u64,
    token: CancelToken,
}

struct State {
    cache: SearchCache,
    pending: Option<Pending>,
    generation: u64,
    latest_input: String,
    debounce: Option<JoinHandle<()>>,
    debounce_seq: u64,
}

impl State {
    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("Cancelling request #{}", pending.generation);
            pending.token.cancel();
        }
    }

    fn begin_request(&mut self) -> (u64, CancelToken) {
        self.cancel_pending();
        self.generation += 1;
        let token = CancelToken::new();
        self.pending = Some(Pending {
            generation: self.generation,
            token: token.clone(),
        });
        (self.generation, token)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| p.generation == generation)
    }

    fn cancel_debounce(&mut self) {
        self.debounce_seq += 1;
        if let Some(handle) = self.debounce.take() {
            handle.abort();
        }
    }
}

struct Inner {
    field: SearchField,
    backend: Arc<dyn SearchBackend>,
    renderer: Arc<dyn Renderer>,
    exemption: Arc<dyn CacheExemption>,
    options: ControllerOptions,
    state: Mutex<State>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Clone)]
pub struct SearchController {
    inner: Arc<Inner>,
}

/// Trim surrounding whitespace; the result is also the cache key.
pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_string()
}

impl SearchController {
    /// Controller with default options and the default analytic vocabulary.
    pub fn new(
        field: SearchField,
        backend: Arc<dyn SearchBackend>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self::with_options(
            field,
            backend,
            renderer,
            ControllerOptions::default(),
            Arc::new(AnalyticVocabulary::default()),
        )
    }

    pub fn with_options(
        field: SearchField,
        backend: Arc<dyn SearchBackend>,
        renderer: Arc<dyn Renderer>,
        options: ControllerOptions,
        exemption: Arc<dyn CacheExemption>,
    ) -> Self {
        let cache = SearchCache::new(options.cache_ttl, options.cache_capacity);
        Self {
            inner: Arc::new(Inner {
                field,
                backend,
                renderer,
                exemption,
                options,
                state: Mutex::new(State {
                    cache,
                    pending: None,
                    generation: 0,
                    latest_input: String::new(),
                    debounce: None,
                    debounce_seq: 0,
                }),
            }),
        }
    }

    pub fn field(&self) -> SearchField {
        self.inner.field
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.inner.options
    }

    /// Record the latest input and restart the debounce timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_input_changed(&self, raw_text: &str) {
        let text = raw_text.to_string();
        let delay = self.inner.options.debounce;

        let mut state = self.inner.state();
        state.latest_input = text.clone();
        state.cancel_debounce();
        let seq = state.debounce_seq;

        let controller = self.clone();
        state.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut state = controller.inner.state();
                // A newer keystroke replaced this timer after it woke
                if state.debounce_seq != seq {
                    return;
                }
                state.debounce = None;
            }
            controller.submit(&text).await;
        }));
    }

    /// Cancel any scheduled debounce and submit immediately.
    pub async fn on_submit_now(&self, raw_text: &str) -> SubmitOutcome {
        {
            let mut state = self.inner.state();
            state.latest_input = raw_text.to_string();
            state.cancel_debounce();
        }
        self.submit(raw_text).await
    }

    /// Like `on_submit_now`, but the request runs on its own task so the
    /// caller can keep handling input. The debounce is cancelled before this
    /// returns.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_submit_now(&self, raw_text: &str) -> JoinHandle<SubmitOutcome> {
        {
            let mut state = self.inner.state();
            state.latest_input = raw_text.to_string();
            state.cancel_debounce();
        }
        let controller = self.clone();
        let text = raw_text.to_string();
        tokio::spawn(async move { controller.submit(&text).await })
    }

    /// Cancel a scheduled debounce without submitting.
    pub fn cancel_debounce(&self) {
        self.inner.state().cancel_debounce();
    }

    /// Run one search submission. Every failure is reported through the
    /// renderer; the returned outcome is informational.
    pub async fn submit(&self, raw_query: &str) -> SubmitOutcome {
        let inner = &self.inner;
        let query = normalize_query(raw_query);

        let (generation, token, cacheable) = {
            let mut state = inner.state();

            // Short and empty submissions still supersede older requests
            if query.is_empty() {
                state.cancel_pending();
                inner.renderer.clear();
                return SubmitOutcome::EmptyQuery;
            }

            if query.chars().count() < inner.options.min_query_len {
                state.cancel_pending();
                inner.renderer.render_notice(
                    &too_short_notice(inner.options.min_query_len),
                    Severity::Warning,
                );
                return SubmitOutcome::QueryTooShort;
            }

            let cacheable = !inner.exemption.is_cache_exempt(&query);
            if cacheable {
                if let Some(entry) = state.cache.get(&query, Instant::now()) {
                    debug!("Cache hit for {:?}", query);
                    state.cancel_pending();
                    inner.renderer.render(&entry.result);
                    return SubmitOutcome::CacheHit;
                }
                debug!("Cache miss for {:?}", query);
            } else {
                debug!("Query {:?} is cache-exempt", query);
            }

            let (generation, token) = state.begin_request();
            (generation, token, cacheable)
        };

        debug!(
            "Request #{}: {} search for {:?}",
            generation,
            inner.field.as_str(),
            query
        );
        let result = inner.backend.search(inner.field, &query, &token).await;

        let mut state = inner.state();
        if token.is_cancelled() || !state.is_current(generation) {
            debug!("Dropping superseded response #{} for {:?}", generation, query);
            return SubmitOutcome::Canceled;
        }
        state.pending = None;

        match result {
            Ok(results) if results.is_success() => {
                if cacheable {
                    state
                        .cache
                        .insert(query.clone(), results.clone(), Instant::now());
                }
                inner.renderer.render(&results);
                SubmitOutcome::Rendered
            }
            Ok(results) => {
                let message = results
                    .error_message()
                    .unwrap_or("The search could not be completed")
                    .to_string();
                warn!("Backend error for {:?}: {}", query, message);
                inner
                    .renderer
                    .render_notice(&format!("Error: {}", message), Severity::Danger);
                SubmitOutcome::BackendError(message)
            }
            Err(Error::Canceled) => SubmitOutcome::Canceled,
            Err(e) => {
                warn!("Search request for {:?} failed: {}", query, e);
                inner.renderer.render_notice(
                    &format!("Connection error: {}. Try again.", e),
                    Severity::Danger,
                );
                SubmitOutcome::TransportError(e.to_string())
            }
        }
    }

    /// Drop every cached result. Call after anything that mutates the dataset.
    pub fn clear_cache(&self) -> usize {
        let removed = self.inner.state().cache.clear();
        info!("Cleared {} cached {} searches", removed, self.inner.field.as_str());
        removed
    }

    /// Drop cached results older than the TTL as of `now`.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let removed = self.inner.state().cache.sweep_expired(now);
        if removed > 0 {
            info!("Swept {} expired cache entries", removed);
        }
        removed
    }

    pub fn cache_len(&self) -> usize {
        self.inner.state().cache.len()
    }

    /// Whether results for `query` (normalized) are currently cached.
    pub fn is_cached(&self, query: &str) -> bool {
        self.inner.state().cache.contains(&normalize_query(query))
    }

    pub fn has_pending_request(&self) -> bool {
        self.inner.state().pending.is_some()
    }

    /// Text from the most recent input event.
    pub fn latest_input(&self) -> String {
        self.inner.state().latest_input.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  zelda \n"), "zelda");
        assert_eq!(normalize_query("   "), "");
        assert_eq!(normalize_query("Final  Fantasy"), "Final  Fantasy");
    }

    #[test]
    fn test_options_from_config() {
        let config = SearchConfig {
            debounce_ms: 100,
            cache_ttl_secs: 30,
            ..SearchConfig::default()
        };
        let options = ControllerOptions::from(&config);
        assert_eq!(options.debounce, Duration::from_millis(100));
        assert_eq!(options.cache_ttl, Duration::from_secs(30));
        assert_eq!(options.min_query_len, 2);
    }
}
