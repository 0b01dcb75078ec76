use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tus_rehber_query::FacetSet;

/// Single-slot TTL cache for the whole-dataset facet summary.
pub(crate) struct FacetCache {
    ttl: Duration,
    slot: RwLock<Option<(Instant, FacetSet)>>,
}

impl FacetCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub(crate) async fn get(&self) -> Option<FacetSet> {
        let slot = self.slot.read().await;
        match &*slot {
            Some((computed_at, facets)) if computed_at.elapsed() < self.ttl => {
                Some(facets.clone())
            }
            _ => None,
        }
    }

    pub(crate) async fn put(&self, facets: FacetSet) {
        let mut slot = self.slot.write().await;
        *slot = Some((Instant::now(), facets));
    }
}
