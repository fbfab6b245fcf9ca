use crate::domain::ports::FundId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FundError>;

/// Errors raised by fund operations and their orchestration.
///
/// Domain errors leave the aggregate's in-memory state untouched: a rejected
/// operation must not have applied any part of its effect.
#[derive(Error, Debug)]
pub enum FundError {
    #[error("invalid fund state: {0}")]
    InvalidState(&'static str),
    #[error("cannot close an empty fund")]
    EmptyFund,
    #[error("target amount exceeded")]
    TargetExceeded,
    #[error("invalid investor")]
    InvalidInvestor,
    #[error("the fund is not closed")]
    NotClosed,
    #[error("the fund {0} was not found")]
    FundNotFound(FundId),
    #[error("a fund titled '{0}' already exists")]
    TitleNotUnique(String),
    #[error("the caller does not own the fund's settlement account")]
    Forbidden,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),
    #[error("internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}
