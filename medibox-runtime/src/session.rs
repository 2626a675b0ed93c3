//! Debounced incremental search.
//!
//! Keystrokes go through [`SearchSession::input`]; once typing pauses for the
//! configured delay the catalog filter runs and the latest
//! [`SearchSnapshot`] is published to every subscriber.

use std::sync::Arc;

use medibox_core::config::SearchConfig;
use medibox_core::{Catalog, Medicine};
use tokio::sync::watch;
use tracing::debug;

use crate::debounce::Debouncer;

/// The most recent search outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSnapshot {
    /// The query as typed.
    pub query: String,
    /// Matching medicines, dataset order, capped.
    pub results: Vec<Medicine>,
    /// Whether the query was long enough to run. Distinguishes "no matches"
    /// from "not searched yet".
    pub initiated: bool,
}

/// Search-as-you-type over a shared catalog.
#[derive(Debug)]
pub struct SearchSession {
    catalog: Arc<Catalog>,
    tx: Arc<watch::Sender<SearchSnapshot>>,
    debouncer: Debouncer<String>,
}

impl SearchSession {
    /// Session over `catalog`, debounced by `config.debounce_ms`.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, config: &SearchConfig) -> Self {
        let (tx, _rx) = watch::channel(SearchSnapshot::default());
        let tx = Arc::new(tx);

        let debouncer = {
            let catalog = Arc::clone(&catalog);
            let tx = Arc::clone(&tx);
            Debouncer::new(config.debounce(), move |query: String| {
                publish(&catalog, &tx, query);
            })
        };

        Self {
            catalog,
            tx,
            debouncer,
        }
    }

    /// Feed the current input text. Must be called from within a Tokio runtime.
    pub fn input(&self, query: impl Into<String>) {
        self.debouncer.call(query.into());
    }

    /// Search immediately, dropping any pending debounced input.
    pub fn search_now(&self, query: impl Into<String>) -> SearchSnapshot {
        self.debouncer.cancel();
        publish(&self.catalog, &self.tx, query.into())
    }

    /// Name suggestions for a partially typed medicine name; not debounced.
    #[must_use]
    pub fn suggestions(&self, partial: &str) -> Vec<Medicine> {
        self.catalog.suggest(partial).into_iter().cloned().collect()
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SearchSnapshot {
        self.tx.borrow().clone()
    }

    /// Latest results.
    #[must_use]
    pub fn results(&self) -> Vec<Medicine> {
        self.tx.borrow().results.clone()
    }

    /// Whether the latest query actually ran.
    #[must_use]
    pub fn initiated(&self) -> bool {
        self.tx.borrow().initiated
    }

    /// The query behind the latest results.
    #[must_use]
    pub fn query(&self) -> String {
        self.tx.borrow().query.clone()
    }

    /// Observe published snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.tx.subscribe()
    }

    /// Whether typed input is still waiting out the debounce delay.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

fn publish(catalog: &Catalog, tx: &watch::Sender<SearchSnapshot>, query: String) -> SearchSnapshot {
    let outcome = catalog.search(&query);
    debug!(query = %query, hits = outcome.len(), initiated = outcome.initiated, "Search ran");
    let snapshot = SearchSnapshot {
        results: outcome.hits.into_iter().cloned().collect(),
        initiated: outcome.initiated,
        query,
    };
    tx.send_replace(snapshot.clone());
    snapshot
}
