use crate::domain::fund::Fund;
use crate::domain::ports::{FundId, FundStore};
use crate::error::{FundError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing fund aggregates.
pub const CF_FUNDS: &str = "funds";
/// Column Family for store bookkeeping (identifier sequence).
pub const CF_META: &str = "meta";

const META_NEXT_ID: &[u8] = b"next_fund_id";

/// A persistent fund store implementation using RocksDB.
///
/// Each fund aggregate is stored wholesale as one JSON value keyed by its
/// big-endian identifier; the identifier sequence survives reopening the
/// database. This struct is thread-safe (`Clone` shares the underlying
/// `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbFundStore {
    db: Arc<DB>,
    // Serializes id allocation and the title-uniqueness scan against
    // concurrent inserts.
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbFundStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("funds" and "meta") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_funds = ColumnFamilyDescriptor::new(CF_FUNDS, Options::default());
        let cf_meta = ColumnFamilyDescriptor::new(CF_META, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_funds, cf_meta])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            FundError::Internal(Box::new(std::io::Error::other(format!(
                "column family {name} not found"
            ))))
        })
    }

    fn next_id(&self) -> Result<u64> {
        let meta = self.cf(CF_META)?;

        let next = match self.db.get_cf(&meta, META_NEXT_ID)? {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    FundError::Internal(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "corrupt identifier sequence",
                    )))
                })?;
                u64::from_be_bytes(bytes)
            }
            None => 1,
        };

        self.db
            .put_cf(&meta, META_NEXT_ID, (next + 1).to_be_bytes())?;

        Ok(next)
    }

    fn assert_title_unique(&self, title: &str, skip: Option<u64>) -> Result<()> {
        let cf = self.cf(CF_FUNDS)?;

        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (key, value) = item?;

            if let Some(skip) = skip
                && key.as_ref() == skip.to_be_bytes().as_slice()
            {
                continue;
            }

            let existing: Fund = serde_json::from_slice(&value).map_err(|e| {
                FundError::Internal(Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("failed to deserialize fund: {e}"),
                )))
            })?;

            if existing.title == title {
                return Err(FundError::TitleNotUnique(title.to_string()));
            }
        }

        Ok(())
    }

    fn encode(fund: &Fund) -> Result<Vec<u8>> {
        serde_json::to_vec(fund).map_err(|e| {
            FundError::Internal(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("serialization error: {e}"),
            )))
        })
    }
}

#[async_trait]
impl FundStore for RocksDbFundStore {
    async fn insert(&self, fund: Fund) -> Result<FundId> {
        let _guard = self.write_lock.lock().await;

        self.assert_title_unique(&fund.title, None)?;

        let id = self.next_id()?;
        let cf = self.cf(CF_FUNDS)?;
        self.db.put_cf(&cf, id.to_be_bytes(), Self::encode(&fund)?)?;

        Ok(FundId(id))
    }

    async fn get(&self, id: FundId) -> Result<Option<Fund>> {
        let cf = self.cf(CF_FUNDS)?;

        match self.db.get_cf(&cf, id.0.to_be_bytes())? {
            Some(bytes) => {
                let fund = serde_json::from_slice(&bytes).map_err(|e| {
                    FundError::Internal(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("deserialization error: {e}"),
                    )))
                })?;
                Ok(Some(fund))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, id: FundId, fund: Fund) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let cf = self.cf(CF_FUNDS)?;

        if self.db.get_pinned_cf(&cf, id.0.to_be_bytes())?.is_none() {
            return Err(FundError::FundNotFound(id));
        }

        self.assert_title_unique(&fund.title, Some(id.0))?;
        self.db.put_cf(&cf, id.0.to_be_bytes(), Self::encode(&fund)?)?;

        Ok(())
    }
}
