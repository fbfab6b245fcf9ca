use crate::domain::fund::Fund;
use crate::domain::ports::{EventPublisher, FundEvent, FundId, FundStore};
use crate::error::{FundError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// A thread-safe in-memory store for fund aggregates.
///
/// Uses `Arc<RwLock<HashMap<u64, Fund>>>` to allow shared concurrent access.
/// Ideal for testing or small datasets where persistence is not required.
/// Identifiers are assigned from an atomic counter; titles are unique across
/// the store.
#[derive(Default, Clone)]
pub struct InMemoryFundStore {
    funds: Arc<RwLock<HashMap<u64, Fund>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryFundStore {
    /// Creates a new, empty in-memory fund store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FundStore for InMemoryFundStore {
    async fn insert(&self, fund: Fund) -> Result<FundId> {
        let mut funds = self.funds.write().await;

        if funds.values().any(|existing| existing.title == fund.title) {
            return Err(FundError::TitleNotUnique(fund.title));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        funds.insert(id, fund);

        Ok(FundId(id))
    }

    async fn get(&self, id: FundId) -> Result<Option<Fund>> {
        let funds = self.funds.read().await;
        Ok(funds.get(&id.0).cloned())
    }

    async fn save(&self, id: FundId, fund: Fund) -> Result<()> {
        let mut funds = self.funds.write().await;

        if !funds.contains_key(&id.0) {
            return Err(FundError::FundNotFound(id));
        }
        if funds
            .iter()
            .any(|(key, existing)| *key != id.0 && existing.title == fund.title)
        {
            return Err(FundError::TitleNotUnique(fund.title));
        }

        funds.insert(id.0, fund);

        Ok(())
    }
}

/// An event publisher that records everything it is handed.
///
/// Clones share the same buffer, so a test can keep one clone and hand the
/// other to a facade.
#[derive(Default, Clone)]
pub struct RecordingEventPublisher {
    events: Arc<RwLock<Vec<FundEvent>>>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<FundEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(&self, event: FundEvent) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}

/// An event publisher for callers with no event consumers.
#[derive(Default, Clone)]
pub struct NullEventPublisher;

#[async_trait]
impl EventPublisher for NullEventPublisher {
    async fn publish(&self, _event: FundEvent) -> Result<()> {
        Ok(())
    }
}
