use super::fund::Fund;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a fund at the storage boundary.
///
/// Assigned by the store on insert; the aggregate itself does not carry it,
/// so a fund can be built and exercised without any store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FundId(pub u64);

impl fmt::Display for FundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage port for fund aggregates.
///
/// Implementations persist the whole aggregate as one unit and enforce
/// title uniqueness. Callers are responsible for serializing mutations of
/// one fund: load, mutate, save is a single logical operation.
#[async_trait]
pub trait FundStore: Send + Sync {
    /// Persists a new fund and assigns its identifier.
    async fn insert(&self, fund: Fund) -> Result<FundId>;
    async fn get(&self, id: FundId) -> Result<Option<Fund>>;
    /// Replaces the stored aggregate wholesale.
    async fn save(&self, id: FundId, fund: Fund) -> Result<()>;
}

pub type FundStoreBox = Box<dyn FundStore>;

/// Domain events emitted by the orchestration layer after a mutation has
/// been persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundEvent {
    FundCreated(FundId),
    FundClosed(FundId),
    FundFinished(FundId),
    FundCancelled(FundId),
    FundsAdded(FundId),
    FundsRemoved(FundId),
    PaymentCreated(FundId),
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: FundEvent) -> Result<()>;
}

pub type EventPublisherBox = Box<dyn EventPublisher>;
