//! Built-in application-index search provider.
//!
//! Matches query terms against an in-memory application index with fuzzy
//! matching and serves result metadata straight from the index, so both
//! result sets and metadata resolve synchronously on the calling thread.

use std::collections::HashMap;

use frizbee::{Options, match_list};
use serde::{Deserialize, Serialize};

use omnisearch_provider_api::{
    CancellationToken, MetaCallback, ProviderKind, ResultCallback, ResultId, ResultMeta,
    SearchProvider,
};

/// Registry id of the built-in application provider.
pub const PROVIDER_ID: &str = "applications";

/// Datasets at or above this size get the typo-tolerant prefilter.
const PREFILTER_ENABLE_THRESHOLD: usize = 1_000;

/// One installed application known to the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntry {
    /// Desktop-file style identifier, e.g. `org.gnome.Calculator.desktop`.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl AppEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            keywords: Vec::new(),
            icon: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    fn search_text(&self) -> String {
        let mut text = self.name.to_lowercase();
        for keyword in &self.keywords {
            text.push(' ');
            text.push_str(&keyword.to_lowercase());
        }
        text
    }
}

/// Builds fuzzy matching options for the provided query and dataset size.
fn config_for_query(query: &str, dataset_len: usize) -> Options {
    let mut config = Options {
        prefilter: false,
        ..Options::default()
    };

    let length = query.chars().count();
    let mut allowed_typos: u16 = match length {
        0 => 0,
        1 => 0,
        2..=4 => 1,
        5..=7 => 2,
        8..=12 => 3,
        _ => 4,
    };
    if let Ok(max_reasonable) = u16::try_from(length.saturating_sub(1)) {
        allowed_typos = allowed_typos.min(max_reasonable);
    }

    // Menu search wants actual matches, not a ranking of the whole index, so
    // the typo budget applies regardless of dataset size; the prefilter only
    // kicks in once the index is large enough to benefit.
    config.prefilter = dataset_len >= PREFILTER_ENABLE_THRESHOLD;
    config.max_typos = Some(allowed_typos);
    config.sort = false;

    config
}

/// Search provider over a fixed application index.
pub struct AppIndexProvider {
    entries: Vec<AppEntry>,
    search_texts: Vec<String>,
    by_id: HashMap<String, usize>,
    kind: ProviderKind,
}

impl AppIndexProvider {
    /// Build a provider from the given index. Entries with duplicate ids keep
    /// the first occurrence.
    #[must_use]
    pub fn new(entries: Vec<AppEntry>) -> Self {
        let search_texts = entries.iter().map(AppEntry::search_text).collect();
        let mut by_id = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            by_id.entry(entry.id.clone()).or_insert(index);
        }
        Self {
            entries,
            search_texts,
            by_id,
            kind: ProviderKind::AppSearch,
        }
    }

    /// Parse an index from a JSON array of entries.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<AppEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    /// Number of applications in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the index holds no applications.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank `candidates` (entry indices) against the joined query terms,
    /// best score first, ties broken by index order.
    fn rank(&self, terms: &[String], candidates: &[usize]) -> Vec<ResultId> {
        let query = terms.join(" ").trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let haystacks: Vec<&str> = candidates
            .iter()
            .map(|&index| self.search_texts[index].as_str())
            .collect();
        let config = config_for_query(&query, haystacks.len());

        let mut ranked: Vec<(u16, usize)> = match_list(&query, &haystacks, config)
            .into_iter()
            .filter(|entry| entry.score > 0)
            .map(|entry| {
                let index = candidates[entry.index_in_haystack as usize];
                (entry.score, index)
            })
            .collect();
        ranked.sort_unstable_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        ranked
            .into_iter()
            .map(|(_, index)| self.entries[index].id.clone())
            .collect()
    }

    fn all_indices(&self) -> Vec<usize> {
        (0..self.entries.len()).collect()
    }

    fn indices_for(&self, ids: &[ResultId]) -> Vec<usize> {
        ids.iter()
            .filter_map(|id| self.by_id.get(id.as_str()).copied())
            .collect()
    }
}

impl SearchProvider for AppIndexProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn kind(&self) -> &ProviderKind {
        &self.kind
    }

    fn initial_result_set(
        &self,
        terms: &[String],
        on_results: ResultCallback,
        token: CancellationToken,
    ) {
        if token.is_cancelled() {
            return;
        }
        on_results(self.rank(terms, &self.all_indices()));
    }

    fn subsearch_result_set(
        &self,
        previous: &[ResultId],
        terms: &[String],
        on_results: ResultCallback,
        token: CancellationToken,
    ) {
        if token.is_cancelled() {
            return;
        }
        on_results(self.rank(terms, &self.indices_for(previous)));
    }

    fn result_metas(&self, ids: &[ResultId], on_metas: MetaCallback, token: CancellationToken) {
        if token.is_cancelled() {
            return;
        }
        let metas = ids
            .iter()
            .filter_map(|id| self.by_id.get(id.as_str()).copied())
            .map(|index| {
                let entry = &self.entries[index];
                let mut meta = ResultMeta::new(entry.id.clone(), entry.name.clone());
                if let Some(description) = &entry.description {
                    meta = meta.with_description(description.clone());
                }
                if let Some(icon) = &entry.icon {
                    meta = meta.with_icon(icon.clone());
                }
                meta
            })
            .collect();
        on_metas(metas);
    }
}
