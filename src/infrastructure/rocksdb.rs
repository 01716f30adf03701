use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::domain::ports::PaymentStore;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family holding serialized records, keyed by record id.
pub const CF_PAYMENTS: &str = "payments";
/// Unique index: order id -> record id.
pub const CF_ORDER_INDEX: &str = "idx_order";
/// Unique index: gateway link id -> record id.
pub const CF_LINK_INDEX: &str = "idx_link";
/// Unique index: gateway payment id -> record id.
pub const CF_PAYMENT_INDEX: &str = "idx_payment";

/// A persistent payment ledger on RocksDB.
///
/// Records and their three unique indexes live in separate Column Families and
/// are always written together in one `WriteBatch`. Writers additionally take
/// an async mutex so the uniqueness and status checks happen in the same
/// critical section as the write.
///
/// `Clone` shares the underlying `Arc<DB>` and write lock.
#[derive(Clone)]
pub struct RocksDBPaymentStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBPaymentStore {
    /// Opens or creates a RocksDB instance at the specified path, creating any
    /// missing Column Families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_PAYMENTS, CF_ORDER_INDEX, CF_LINK_INDEX, CF_PAYMENT_INDEX]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("column family {name} not found")))
    }

    fn load(&self, id: &[u8]) -> Result<Option<PaymentRecord>, StoreError> {
        match self.db.get_cf(self.cf(CF_PAYMENTS)?, id)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Backend(format!("Deserialization error: {e}"))),
            None => Ok(None),
        }
    }

    fn lookup(&self, index: &str, key: &str) -> Result<Option<PaymentRecord>, StoreError> {
        match self.db.get_cf(self.cf(index)?, key.as_bytes())? {
            Some(id) => self.load(&id),
            None => Ok(None),
        }
    }

    fn ensure_free(
        &self,
        index: &str,
        field: &'static str,
        value: Option<&str>,
        owner: &[u8],
    ) -> Result<(), StoreError> {
        let Some(value) = value else {
            return Ok(());
        };
        match self.db.get_cf(self.cf(index)?, value.as_bytes())? {
            Some(id) if id.as_slice() != owner => Err(StoreError::Duplicate {
                field,
                value: value.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn write(&self, record: &PaymentRecord) -> Result<(), StoreError> {
        let id = record.id().to_string();
        let value = serde_json::to_vec(record)
            .map_err(|e| StoreError::Backend(format!("Serialization error: {e}")))?;

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_PAYMENTS)?, id.as_bytes(), value);
        batch.put_cf(self.cf(CF_ORDER_INDEX)?, record.order_id().as_bytes(), id.as_bytes());
        if let Some(link_id) = record.gateway_link_id() {
            batch.put_cf(self.cf(CF_LINK_INDEX)?, link_id.as_bytes(), id.as_bytes());
        }
        if let Some(payment_id) = record.gateway_payment_id() {
            batch.put_cf(self.cf(CF_PAYMENT_INDEX)?, payment_id.as_bytes(), id.as_bytes());
        }
        self.db.write(batch)?;
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for RocksDBPaymentStore {
    async fn insert(&self, mut record: PaymentRecord) -> Result<PaymentRecord, StoreError> {
        let _guard = self.write_lock.lock().await;
        let id = record.id().to_string();

        if self.load(id.as_bytes())?.is_some()
            || self
                .db
                .get_cf(self.cf(CF_ORDER_INDEX)?, record.order_id().as_bytes())?
                .is_some()
        {
            return Err(StoreError::Duplicate {
                field: "order_id",
                value: record.order_id().to_string(),
            });
        }
        self.ensure_free(
            CF_LINK_INDEX,
            "gateway_link_id",
            record.gateway_link_id(),
            id.as_bytes(),
        )?;
        self.ensure_free(
            CF_PAYMENT_INDEX,
            "gateway_payment_id",
            record.gateway_payment_id(),
            id.as_bytes(),
        )?;

        let now = Utc::now();
        record.stamp(Some(now), now);
        self.write(&record)?;
        Ok(record)
    }

    async fn update(
        &self,
        mut record: PaymentRecord,
        expected: PaymentStatus,
    ) -> Result<PaymentRecord, StoreError> {
        let _guard = self.write_lock.lock().await;
        let id = record.id().to_string();

        let stored = self
            .load(id.as_bytes())?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if stored.status() != expected {
            return Err(StoreError::Conflict {
                id,
                expected: expected.to_string(),
                actual: stored.status().to_string(),
            });
        }
        self.ensure_free(
            CF_PAYMENT_INDEX,
            "gateway_payment_id",
            record.gateway_payment_id(),
            id.as_bytes(),
        )?;

        record.stamp(Some(stored.created_at()), Utc::now());
        self.write(&record)?;
        Ok(record)
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<PaymentRecord>, StoreError> {
        self.lookup(CF_ORDER_INDEX, order_id)
    }

    async fn find_by_link_id(&self, link_id: &str) -> Result<Option<PaymentRecord>, StoreError> {
        self.lookup(CF_LINK_INDEX, link_id)
    }

    async fn find_by_payment_id(
        &self,
        payment_id: &str,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        self.lookup(CF_PAYMENT_INDEX, payment_id)
    }
}
