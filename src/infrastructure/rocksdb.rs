use crate::domain::loan::{Loan, LoanId, RegistryState};
use crate::domain::ports::LoanStore;
use crate::error::{LoanError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;

/// Column Family for loan records, keyed by big-endian loan id.
pub const CF_LOANS: &str = "loans";
/// Column Family for registry bookkeeping (next id, held balance).
pub const CF_REGISTRY: &str = "registry";

const STATE_KEY: &[u8] = b"state";

/// A persistent loan store backed by RocksDB.
///
/// Loans and registry bookkeeping live in separate Column Families. Big-endian keys keep
/// iteration in id order. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path`, creating missing column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_loans = ColumnFamilyDescriptor::new(CF_LOANS, Options::default());
        let cf_registry = ColumnFamilyDescriptor::new(CF_REGISTRY, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_loans, cf_registry])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LoanError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }
}

#[async_trait]
impl LoanStore for RocksDBStore {
    async fn store(&self, loan: Loan) -> Result<()> {
        let cf = self.cf(CF_LOANS)?;
        let value = serde_json::to_vec(&loan)?;
        self.db.put_cf(cf, loan.id.to_be_bytes(), value)?;
        Ok(())
    }

    async fn get(&self, id: LoanId) -> Result<Option<Loan>> {
        let cf = self.cf(CF_LOANS)?;
        match self.db.get_cf(cf, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn get_all(&self) -> Result<Vec<Loan>> {
        let cf = self.cf(CF_LOANS)?;
        let mut loans = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            loans.push(serde_json::from_slice(&value)?);
        }
        Ok(loans)
    }

    async fn state(&self) -> Result<RegistryState> {
        let cf = self.cf(CF_REGISTRY)?;
        match self.db.get_cf(cf, STATE_KEY)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(RegistryState::default()),
        }
    }

    async fn store_state(&self, state: RegistryState) -> Result<()> {
        let cf = self.cf(CF_REGISTRY)?;
        self.db.put_cf(cf, STATE_KEY, serde_json::to_vec(&state)?)?;
        Ok(())
    }

    async fn commit(&self, loan: Loan, state: RegistryState) -> Result<()> {
        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_LOANS)?, loan.id.to_be_bytes(), serde_json::to_vec(&loan)?);
        batch.put_cf(self.cf(CF_REGISTRY)?, STATE_KEY, serde_json::to_vec(&state)?);
        self.db.write(batch)?;
        Ok(())
    }

    async fn discard(&self, id: LoanId, state: RegistryState) -> Result<()> {
        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf(CF_LOANS)?, id.to_be_bytes());
        batch.put_cf(self.cf(CF_REGISTRY)?, STATE_KEY, serde_json::to_vec(&state)?);
        self.db.write(batch)?;
        Ok(())
    }
}
