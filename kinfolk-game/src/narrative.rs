//! Narrative text collaborator.
//!
//! The engine asks a [`NarrativeSource`] for flavour text through a
//! [`Narrator`], which owns the response cache and turns every source failure
//! into a fixed fallback line. Narrative text is never authoritative state.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

use crate::constants::{NARRATIVE_CACHE_CAPACITY, NARRATIVE_FALLBACK};

const DEFAULT_NARRATIVE_DATA: &str = include_str!("../data/narrative.json");

/// Instructions handed to chat-style sources ahead of every request.
pub const SYSTEM_PROMPT: &str = "You are the storyteller of a family saga life-simulation game. \
Write short, vivid, plausible game content that fits the character's current situation. \
Keep replies concise.";

/// One structured block of context sent alongside a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBlock {
    pub role: String,
    pub content: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("narrative transport failed: {0}")]
    Transport(String),
    #[error("narrative request timed out")]
    Timeout,
    #[error("narrative response was malformed: {0}")]
    Malformed(String),
    #[error("narrative response was empty")]
    Empty,
}

/// Anything that can turn a prompt plus context into text.
pub trait NarrativeSource {
    /// Generate text for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying generator cannot produce text.
    fn generate(&mut self, prompt: &str, context: &[ContextBlock]) -> Result<String, NarrativeError>;

    /// Short label for logs.
    fn label(&self) -> &'static str {
        "custom"
    }
}

/// A narration request: topic key for offline templates, prompt for live sources.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeRequest {
    topic: String,
    prompt: String,
    vars: serde_json::Map<String, serde_json::Value>,
}

impl NarrativeRequest {
    #[must_use]
    pub fn new(topic: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            prompt: prompt.into(),
            vars: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn var(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn context(&self) -> Vec<ContextBlock> {
        vec![ContextBlock {
            role: "system".to_string(),
            content: serde_json::json!({
                "topic": self.topic,
                "vars": self.vars,
            }),
        }]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    prompt: String,
    context: String,
}

/// Exact-key response cache evicting the oldest insertion first.
#[derive(Debug, Clone)]
pub struct NarrativeCache {
    capacity: usize,
    entries: HashMap<CacheKey, String>,
    order: VecDeque<CacheKey>,
}

impl Default for NarrativeCache {
    fn default() -> Self {
        Self::with_capacity(NARRATIVE_CACHE_CAPACITY)
    }
}

impl NarrativeCache {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn key(prompt: &str, context: &[ContextBlock]) -> CacheKey {
        CacheKey {
            prompt: prompt.to_string(),
            context: serde_json::to_string(context).unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn get(&self, prompt: &str, context: &[ContextBlock]) -> Option<&str> {
        self.entries
            .get(&Self::key(prompt, context))
            .map(String::as_str)
    }

    pub fn insert(&mut self, prompt: &str, context: &[ContextBlock], text: String) {
        let key = Self::key(prompt, context);
        if self.entries.insert(key.clone(), text).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cached, failure-absorbing front for a narrative source. One per session.
pub struct Narrator {
    source: Box<dyn NarrativeSource>,
    cache: NarrativeCache,
    failures: u64,
}

impl fmt::Debug for Narrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Narrator")
            .field("source", &self.source.label())
            .field("cached", &self.cache.len())
            .field("failures", &self.failures)
            .finish()
    }
}

impl Narrator {
    #[must_use]
    pub fn new(source: Box<dyn NarrativeSource>) -> Self {
        Self {
            source,
            cache: NarrativeCache::default(),
            failures: 0,
        }
    }

    /// Offline narrator backed by the embedded template catalog.
    #[must_use]
    pub fn offline(seed: u64) -> Self {
        Self::new(Box::new(TemplateNarrator::new(seed)))
    }

    #[must_use]
    pub fn with_cache(mut self, cache: NarrativeCache) -> Self {
        self.cache = cache;
        self
    }

    /// Text for `prompt`, served from cache when the exact pair was seen before.
    /// Source errors degrade to the fallback line and are not cached.
    pub fn narrate(&mut self, prompt: &str, context: &[ContextBlock]) -> String {
        if let Some(hit) = self.cache.get(prompt, context) {
            return hit.to_string();
        }
        match self.source.generate(prompt, context) {
            Ok(text) if !text.trim().is_empty() => {
                let text = text.trim().to_string();
                self.cache.insert(prompt, context, text.clone());
                text
            }
            Ok(_) => self.fallback(&NarrativeError::Empty),
            Err(err) => self.fallback(&err),
        }
    }

    pub fn tell(&mut self, request: &NarrativeRequest) -> String {
        self.narrate(request.prompt(), &request.context())
    }

    fn fallback(&mut self, err: &NarrativeError) -> String {
        self.failures = self.failures.saturating_add(1);
        log::warn!("{} narrative source failed: {err}", self.source.label());
        NARRATIVE_FALLBACK.to_string()
    }

    #[must_use]
    pub const fn failures(&self) -> u64 {
        self.failures
    }

    #[must_use]
    pub const fn cache(&self) -> &NarrativeCache {
        &self.cache
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NarrativeCatalog {
    #[serde(default)]
    pub topics: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub scenarios: BTreeMap<String, Vec<String>>,
}

impl NarrativeCatalog {
    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_NARRATIVE_DATA).unwrap_or_default()
    }

    #[must_use]
    pub fn lines(&self, topic: &str) -> &[String] {
        self.topics
            .get(topic)
            .or_else(|| self.topics.get("generic"))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn scenario_pool(&self, key: &str) -> &[String] {
        self.scenarios
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[must_use]
pub fn catalog() -> &'static NarrativeCatalog {
    static CATALOG: OnceLock<NarrativeCatalog> = OnceLock::new();
    CATALOG.get_or_init(NarrativeCatalog::load_from_static)
}

/// Replace `{key}` placeholders with values from `vars`.
#[must_use]
pub fn fill_placeholders(template: &str, vars: &serde_json::Map<String, serde_json::Value>) -> String {
    let mut text = template.to_string();
    for (key, value) in vars {
        let rendered = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map_or_else(|| n.to_string(), |v| format!("{v:.0}")),
            other => other.to_string(),
        };
        text = text.replace(&format!("{{{key}}}"), &rendered);
    }
    text
}

/// Deterministic offline source that picks template lines per topic.
#[derive(Debug, Clone)]
pub struct TemplateNarrator {
    rng: ChaCha20Rng,
}

impl TemplateNarrator {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl NarrativeSource for TemplateNarrator {
    fn generate(&mut self, _prompt: &str, context: &[ContextBlock]) -> Result<String, NarrativeError> {
        let block = context
            .iter()
            .find(|block| block.content.get("topic").is_some())
            .ok_or_else(|| NarrativeError::Malformed("context carries no topic".to_string()))?;
        let topic = block
            .content
            .get("topic")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("generic");
        let empty = serde_json::Map::new();
        let vars = block
            .content
            .get("vars")
            .and_then(serde_json::Value::as_object)
            .unwrap_or(&empty);
        let line = catalog()
            .lines(topic)
            .choose(&mut self.rng)
            .ok_or(NarrativeError::Empty)?;
        Ok(fill_placeholders(line, vars))
    }

    fn label(&self) -> &'static str {
        "template"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl NarrativeSource for Failing {
        fn generate(&mut self, _: &str, _: &[ContextBlock]) -> Result<String, NarrativeError> {
            Err(NarrativeError::Transport("connection refused".to_string()))
        }
    }

    struct Counting {
        calls: std::rc::Rc<std::cell::Cell<u32>>,
    }

    impl NarrativeSource for Counting {
        fn generate(&mut self, prompt: &str, _: &[ContextBlock]) -> Result<String, NarrativeError> {
            self.calls.set(self.calls.get() + 1);
            Ok(format!("echo: {prompt}"))
        }
    }

    #[test]
    fn failing_source_yields_fallback() {
        let mut narrator = Narrator::new(Box::new(Failing));
        let text = narrator.narrate("describe a party", &[]);
        assert_eq!(text, NARRATIVE_FALLBACK);
        assert_eq!(narrator.failures(), 1);
        assert!(narrator.cache().is_empty());
    }

    #[test]
    fn identical_requests_hit_the_cache() {
        let calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut narrator = Narrator::new(Box::new(Counting {
            calls: calls.clone(),
        }));
        let request = NarrativeRequest::new("socialize", "describe a party").var("name", "Ana");
        let first = narrator.tell(&request);
        let second = narrator.tell(&request);
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        narrator.tell(&request.clone().var("name", "Bo"));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn cache_evicts_oldest_insertion() {
        let mut cache = NarrativeCache::with_capacity(2);
        cache.insert("a", &[], "1".to_string());
        cache.insert("b", &[], "2".to_string());
        cache.insert("c", &[], "3".to_string());
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a", &[]).is_none());
        assert_eq!(cache.get("c", &[]), Some("3"));
    }

    #[test]
    fn default_cache_holds_five_hundred() {
        let mut cache = NarrativeCache::default();
        for idx in 0..501 {
            cache.insert(&format!("prompt {idx}"), &[], idx.to_string());
        }
        assert_eq!(cache.len(), 500);
        assert!(cache.get("prompt 0", &[]).is_none());
        assert_eq!(cache.get("prompt 500", &[]), Some("500"));
    }

    #[test]
    fn template_narrator_fills_names() {
        let mut narrator = Narrator::offline(11);
        let request = NarrativeRequest::new("socialize", "describe a party").var("name", "Ana Reyes");
        let text = narrator.tell(&request);
        assert!(text.contains("Ana Reyes"), "{text}");
    }

    #[test]
    fn catalog_has_every_event_category() {
        for category in [
            "daily", "career", "health", "social", "economic", "family", "psychological",
            "interpersonal", "learning", "special",
        ] {
            assert!(
                catalog()
                    .topics
                    .contains_key(&format!("random_event.{category}")),
                "missing {category}"
            );
        }
    }
}
