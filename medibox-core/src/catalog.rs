//! The in-memory medicine catalog.
//!
//! Holds the full dataset for one session in its original order, an id index
//! for detail lookups, and an LRU memo of recent filter results so that
//! backspacing to an earlier query does not rescan the dataset.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::search::{self, SearchLimits, SearchResults};
use crate::types::Medicine;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum QueryKey {
    Search(String),
    Suggest(String),
}

/// The loaded medicine dataset.
pub struct Catalog {
    medicines: Vec<Medicine>,
    by_id: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
    limits: SearchLimits,
    cache: Mutex<LruCache<QueryKey, Arc<[usize]>>>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("medicines", &self.medicines.len())
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Catalog {
    /// Build a catalog with default search limits.
    #[must_use]
    pub fn new(medicines: Vec<Medicine>) -> Self {
        Self::with_config(medicines, &SearchConfig::default())
    }

    /// Build a catalog with the given search configuration.
    ///
    /// Duplicate ids are logged; the first record with an id wins the detail
    /// lookup but every record stays searchable.
    #[must_use]
    pub fn with_config(medicines: Vec<Medicine>, config: &SearchConfig) -> Self {
        let mut by_id = HashMap::with_capacity(medicines.len());
        let mut by_name = HashMap::with_capacity(medicines.len());
        for (index, medicine) in medicines.iter().enumerate() {
            if by_id.contains_key(&medicine.id) {
                warn!(id = medicine.id, name = %medicine.name, "Duplicate medicine id in dataset");
            } else {
                by_id.insert(medicine.id, index);
            }
            by_name
                .entry(medicine.name.trim().to_lowercase())
                .or_insert(index);
        }

        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        info!(medicines = medicines.len(), "Medicine catalog loaded");

        Self {
            medicines,
            by_id,
            by_name,
            limits: SearchLimits::from(config),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// All records in dataset order.
    #[must_use]
    pub fn medicines(&self) -> &[Medicine] {
        &self.medicines
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.medicines.len()
    }

    /// Whether the dataset is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.medicines.is_empty()
    }

    /// Search limits in effect.
    #[must_use]
    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    /// Detail lookup.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Medicine> {
        self.by_id.get(&id).map(|&index| &self.medicines[index])
    }

    /// Exact, case-insensitive name lookup.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Medicine> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .map(|&index| &self.medicines[index])
    }

    /// Resolve a record's substitute names to catalog entries.
    ///
    /// Names not present in the dataset are skipped. Returns an empty list
    /// for an unknown id.
    #[must_use]
    pub fn substitutes_of(&self, id: u32) -> Vec<&Medicine> {
        let Some(medicine) = self.get(id) else {
            return Vec::new();
        };
        medicine
            .substitutes
            .iter()
            .filter_map(|name| self.find_by_name(name))
            .filter(|substitute| substitute.id != medicine.id)
            .collect()
    }

    /// Records whose name starts with `letter`, sorted by name.
    #[must_use]
    pub fn by_initial(&self, letter: char) -> Vec<&Medicine> {
        let wanted: String = letter.to_lowercase().collect();
        let mut found: Vec<&Medicine> = self
            .medicines
            .iter()
            .filter(|m| m.name.trim_start().to_lowercase().starts_with(&wanted))
            .collect();
        found.sort_by_cached_key(|m| m.name.to_lowercase());
        found
    }

    /// Search by name or use case, memoized per normalized query.
    #[must_use]
    pub fn search(&self, query: &str) -> SearchResults<'_> {
        let Some(needle) = search::normalize_query(query, &self.limits) else {
            return SearchResults::not_initiated();
        };
        let indices = self.cached(QueryKey::Search(needle), |needle| {
            search::matching_indices(&self.medicines, self.limits.max_results, |m| {
                search::matches_name_or_use(m, needle)
            })
        });
        SearchResults {
            hits: indices.iter().map(|&i| &self.medicines[i]).collect(),
            initiated: true,
        }
    }

    /// Name suggestions, memoized per normalized input.
    #[must_use]
    pub fn suggest(&self, partial: &str) -> Vec<&Medicine> {
        let Some(needle) = search::normalize_query(partial, &self.limits) else {
            return Vec::new();
        };
        let indices = self.cached(QueryKey::Suggest(needle), |needle| {
            search::matching_indices(&self.medicines, self.limits.max_suggestions, |m| {
                search::matches_name(m, needle)
            })
        });
        indices.iter().map(|&i| &self.medicines[i]).collect()
    }

    fn cached<F>(&self, key: QueryKey, compute: F) -> Arc<[usize]>
    where
        F: FnOnce(&str) -> Vec<usize>,
    {
        if let Some(hit) = self.cache.lock().get(&key) {
            return Arc::clone(hit);
        }

        let start = Instant::now();
        let needle = match &key {
            QueryKey::Search(n) | QueryKey::Suggest(n) => n.as_str(),
        };
        let indices: Arc<[usize]> = compute(needle).into();
        debug!(
            query = needle,
            hits = indices.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Filtered catalog"
        );

        self.cache.lock().put(key, Arc::clone(&indices));
        indices
    }
}
