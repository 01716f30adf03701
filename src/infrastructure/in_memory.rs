use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::domain::ports::PaymentStore;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    records: HashMap<Uuid, PaymentRecord>,
    by_order: HashMap<String, Uuid>,
    by_link: HashMap<String, Uuid>,
    by_payment: HashMap<String, Uuid>,
}

impl Tables {
    fn lookup(&self, index: &HashMap<String, Uuid>, key: &str) -> Option<PaymentRecord> {
        index.get(key).and_then(|id| self.records.get(id)).cloned()
    }

    fn check_unique(
        index: &HashMap<String, Uuid>,
        field: &'static str,
        value: Option<&str>,
        owner: Uuid,
    ) -> Result<(), StoreError> {
        match value.and_then(|v| index.get(v).map(|id| (v, id))) {
            Some((v, id)) if *id != owner => Err(StoreError::Duplicate {
                field,
                value: v.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn index(&mut self, record: &PaymentRecord) {
        let id = record.id();
        self.by_order.insert(record.order_id().to_string(), id);
        if let Some(link_id) = record.gateway_link_id() {
            self.by_link.insert(link_id.to_string(), id);
        }
        if let Some(payment_id) = record.gateway_payment_id() {
            self.by_payment.insert(payment_id.to_string(), id);
        }
    }
}

/// A thread-safe in-memory payment ledger.
///
/// One `RwLock` guards the records and all three unique indexes, so every
/// write observes and updates them atomically.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, mut record: PaymentRecord) -> Result<PaymentRecord, StoreError> {
        let mut tables = self.tables.write().await;
        let id = record.id();
        if tables.records.contains_key(&id) || tables.by_order.contains_key(record.order_id()) {
            return Err(StoreError::Duplicate {
                field: "order_id",
                value: record.order_id().to_string(),
            });
        }
        Tables::check_unique(&tables.by_link, "gateway_link_id", record.gateway_link_id(), id)?;
        Tables::check_unique(
            &tables.by_payment,
            "gateway_payment_id",
            record.gateway_payment_id(),
            id,
        )?;

        let now = Utc::now();
        record.stamp(Some(now), now);
        tables.index(&record);
        tables.records.insert(id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        mut record: PaymentRecord,
        expected: PaymentStatus,
    ) -> Result<PaymentRecord, StoreError> {
        let mut tables = self.tables.write().await;
        let id = record.id();
        let stored = tables
            .records
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if stored.status() != expected {
            return Err(StoreError::Conflict {
                id: id.to_string(),
                expected: expected.to_string(),
                actual: stored.status().to_string(),
            });
        }
        let created_at = stored.created_at();
        Tables::check_unique(
            &tables.by_payment,
            "gateway_payment_id",
            record.gateway_payment_id(),
            id,
        )?;

        record.stamp(Some(created_at), Utc::now());
        tables.index(&record);
        tables.records.insert(id, record.clone());
        Ok(record)
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<PaymentRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.lookup(&tables.by_order, order_id))
    }

    async fn find_by_link_id(&self, link_id: &str) -> Result<Option<PaymentRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.lookup(&tables.by_link, link_id))
    }

    async fn find_by_payment_id(
        &self,
        payment_id: &str,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.lookup(&tables.by_payment, payment_id))
    }
}
