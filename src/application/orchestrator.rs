use super::locks::KeyedLocks;
use super::results::{
    Freshness, InitiateOutcome, MESSAGE_PAYMENT_LINK_EXISTS, MESSAGE_PAYMENT_LINK_GENERATED,
    MESSAGE_PAYMENT_VERIFIED, MESSAGE_REFUND_PROCESSED, NotificationOutcome,
    NotificationReceipt, RefundOutcome, StatusView, VerifyOutcome,
};
use super::selector::GatewaySelector;
use super::status_map::{canonical_status, reconcile};
use crate::domain::gateway::{CollectionRequest, GatewayPayment, PaymentRef};
use crate::domain::payment::{Amount, NewPayment, PaymentRecord, PaymentStatus};
use crate::domain::ports::{NotificationVerifier, PaymentStoreBox};
use crate::error::{PaymentError, Result, StoreError};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Input of [`PaymentOrchestrator::initiate`].
#[derive(Debug, Clone)]
pub struct InitiatePayment {
    pub order_id: String,
    pub amount: Amount,
    pub phone: String,
    pub email: String,
    /// Gateway token as supplied by the caller; `None` selects the default.
    pub gateway: Option<String>,
}

/// The payment lifecycle engine.
///
/// `PaymentOrchestrator` composes the record store, the gateway selector and the
/// adapters behind it. One instance serves concurrent calls. `initiate` is
/// serialized per order id and `refund` per payment id, from the first store
/// read until the record is written, so a gateway side effect happens at most
/// once per key. Below that, the store's uniqueness constraints and
/// compare-and-set updates keep records consistent.
///
/// Every operation makes at most one outbound gateway call, and a failed call
/// never leaves a modified record behind.
pub struct PaymentOrchestrator {
    store: PaymentStoreBox,
    selector: GatewaySelector,
    currency: String,
    verifier: Option<Arc<dyn NotificationVerifier>>,
    order_locks: KeyedLocks,
    payment_locks: KeyedLocks,
}

impl PaymentOrchestrator {
    /// Creates an orchestrator charging in `currency` (ISO code, e.g. `INR`).
    pub fn new(store: PaymentStoreBox, selector: GatewaySelector, currency: impl Into<String>) -> Self {
        Self {
            store,
            selector,
            currency: currency.into(),
            verifier: None,
            order_locks: KeyedLocks::new(),
            payment_locks: KeyedLocks::new(),
        }
    }

    /// Attaches a webhook signature verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn NotificationVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Creates a collection link for an order, or replays the outstanding one.
    ///
    /// An order whose record is still `PENDING` gets its existing link back
    /// without any gateway call. An order whose record has reached any other
    /// status is rejected with [`PaymentError::InvalidPaymentState`]; a fresh
    /// attempt needs a new order id.
    pub async fn initiate(&self, request: InitiatePayment) -> Result<InitiateOutcome> {
        let order_id = request.order_id.trim().to_string();
        if order_id.is_empty() {
            return Err(PaymentError::ValidationError(
                "Order ID is required".to_string(),
            ));
        }
        self.order_locks
            .run(&order_id, self.initiate_locked(&order_id, request))
            .await
    }

    async fn initiate_locked(
        &self,
        order_id: &str,
        request: InitiatePayment,
    ) -> Result<InitiateOutcome> {
        if let Some(existing) = self.store.find_by_order_id(order_id).await? {
            return Self::replay(existing);
        }

        let (gateway_type, gateway) = self.selector.resolve(request.gateway.as_deref())?;
        let collection = CollectionRequest {
            order_id: order_id.to_string(),
            amount: request.amount,
            currency: self.currency.clone(),
            phone: request.phone.clone(),
            email: request.email.clone(),
        };
        debug!(order_id, gateway = %gateway_type, "Creating collection link");
        let link = gateway
            .create_collection_link(&collection)
            .await
            .inspect_err(|e| {
                error!(order_id, gateway = %gateway_type, error = %e, "Gateway failed to create payment link");
            })?;

        let record = PaymentRecord::new(NewPayment {
            order_id: order_id.to_string(),
            amount: request.amount,
            currency: self.currency.clone(),
            customer_phone: request.phone,
            customer_email: request.email,
            gateway_type,
            gateway_link_id: link.link_id,
            gateway_link_url: link.link_url,
        });

        match self.store.insert(record).await {
            Ok(saved) => {
                info!(
                    order_id,
                    gateway = %gateway_type,
                    link_id = saved.gateway_link_id().unwrap_or_default(),
                    "Payment link created"
                );
                Ok(InitiateOutcome {
                    order_id: saved.order_id().to_string(),
                    payment_link_id: saved.gateway_link_id().unwrap_or_default().to_string(),
                    payment_link_url: saved.gateway_link_url().unwrap_or_default().to_string(),
                    message: MESSAGE_PAYMENT_LINK_GENERATED,
                    already_exists: false,
                })
            }
            // Another process sharing the store won the insert.
            Err(StoreError::Duplicate { field: "order_id", .. }) => {
                warn!(order_id, "Order inserted concurrently, replaying stored link");
                let winner = self.store.find_by_order_id(order_id).await?.ok_or_else(|| {
                    PaymentError::PaymentNotFound(format!("Payment not found for order: {order_id}"))
                })?;
                Self::replay(winner)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn replay(existing: PaymentRecord) -> Result<InitiateOutcome> {
        if existing.status() != PaymentStatus::Pending {
            warn!(
                order_id = existing.order_id(),
                status = %existing.status(),
                "Initiate rejected, order already settled"
            );
            return Err(PaymentError::InvalidPaymentState(format!(
                "Payment for order {} is already {}",
                existing.order_id(),
                existing.status()
            )));
        }
        info!(order_id = existing.order_id(), "Existing pending payment found");
        Ok(InitiateOutcome {
            order_id: existing.order_id().to_string(),
            payment_link_id: existing.gateway_link_id().unwrap_or_default().to_string(),
            payment_link_url: existing.gateway_link_url().unwrap_or_default().to_string(),
            message: MESSAGE_PAYMENT_LINK_EXISTS,
            already_exists: true,
        })
    }

    /// Reconciles a record with the gateway's view of the payment.
    ///
    /// The record is looked up by gateway payment id first, then by order id.
    /// A payment id that only reached the record through its order id is
    /// accepted once the gateway reports it for that order's link; otherwise
    /// the call fails with [`PaymentError::ValidationError`] and nothing is
    /// stored. Amount and currency in the result come from the live gateway
    /// response.
    pub async fn verify(
        &self,
        payment_id: Option<&str>,
        order_id: Option<&str>,
    ) -> Result<VerifyOutcome> {
        let payment_id = payment_id.map(str::trim).filter(|id| !id.is_empty());
        let order_id = order_id.map(str::trim).filter(|id| !id.is_empty());
        if payment_id.is_none() && order_id.is_none() {
            return Err(PaymentError::ValidationError(
                "Either paymentId or orderId must be provided".to_string(),
            ));
        }

        let mut record = None;
        if let Some(id) = payment_id {
            record = self.store.find_by_payment_id(id).await?;
        }
        // Set when the record was matched by order id although the caller also
        // named a payment. That payment must turn out to be the order's own.
        let mut claimed = None;
        if record.is_none()
            && let Some(id) = order_id
        {
            record = self.store.find_by_order_id(id).await?;
            claimed = payment_id;
        }
        let Some(mut record) = record else {
            warn!(?payment_id, ?order_id, "Payment not found for verification");
            return Err(PaymentError::PaymentNotFound("Payment not found".to_string()));
        };

        if let (Some(claimed), Some(known)) = (claimed, record.gateway_payment_id()) {
            check_claim(claimed, Some(known), record.order_id())?;
        }

        let reference = match (record.gateway_payment_id(), record.gateway_link_id()) {
            (Some(known), _) => PaymentRef::Payment(known.to_string()),
            (None, Some(link)) => PaymentRef::Link(link.to_string()),
            (None, None) => {
                return Err(PaymentError::InvalidPaymentState(format!(
                    "Payment for order {} has no gateway reference",
                    record.order_id()
                )));
            }
        };

        let gateway = self.selector.for_type(record.gateway_type())?;
        let remote = gateway.fetch_payment(&reference).await.inspect_err(|e| {
            error!(order_id = record.order_id(), reference = reference.as_str(), error = %e, "Gateway verification failed");
        })?;
        if let Some(claimed) = claimed
            && record.gateway_payment_id().is_none()
        {
            check_claim(claimed, remote.payment_id.as_deref(), record.order_id())?;
        }

        let previous = record.status();
        let next = reconcile(previous, &remote.status);
        let mut changed = false;
        if next != previous {
            record.transition_to(next)?;
            if next == PaymentStatus::Failed {
                record.set_failure_reason(Some(format!("gateway reported {}", remote.status)));
            }
            changed = true;
        }
        if let Some(id) = remote
            .payment_id
            .as_deref()
            .or(reference_payment_id(&reference))
        {
            changed |= record.assign_gateway_payment_id(id);
        }

        if changed {
            record = self.persist(record, previous).await?;
        }
        info!(
            order_id = record.order_id(),
            payment_id = record.gateway_payment_id().unwrap_or_default(),
            gateway_status = %remote.status,
            status = %record.status(),
            "Payment verified"
        );

        Ok(VerifyOutcome {
            payment_id: record.gateway_payment_id().map(str::to_string),
            order_id: record.order_id().to_string(),
            status: record.status(),
            amount: remote.amount,
            currency: remote.currency,
            message: MESSAGE_PAYMENT_VERIFIED,
        })
    }

    /// Refunds a successful payment in full (`amount == None`) or in part.
    ///
    /// Only `SUCCESS` records are refundable. A gateway failure leaves the
    /// record in `SUCCESS`; the caller may retry.
    pub async fn refund(&self, payment_id: &str, amount: Option<Amount>) -> Result<RefundOutcome> {
        self.payment_locks
            .run(payment_id, self.refund_locked(payment_id, amount))
            .await
    }

    async fn refund_locked(
        &self,
        payment_id: &str,
        amount: Option<Amount>,
    ) -> Result<RefundOutcome> {
        let Some(mut record) = self.store.find_by_payment_id(payment_id).await? else {
            warn!(payment_id, "Payment not found for refund");
            return Err(PaymentError::PaymentNotFound("Payment not found".to_string()));
        };

        if record.status() != PaymentStatus::Success {
            warn!(payment_id, status = %record.status(), "Invalid payment state for refund");
            return Err(PaymentError::InvalidPaymentState(
                "Only successful payments can be refunded".to_string(),
            ));
        }
        if let Some(amount) = amount
            && amount > record.amount()
        {
            return Err(PaymentError::ValidationError(format!(
                "Refund amount {amount} exceeds the original charge of {}",
                record.amount()
            )));
        }

        let gateway = self.selector.for_type(record.gateway_type())?;
        let refund = gateway.refund(payment_id, amount).await.inspect_err(|e| {
            error!(payment_id, error = %e, "Gateway refund failed");
        })?;

        record.transition_to(PaymentStatus::Refunded)?;
        self.persist(record, PaymentStatus::Success).await?;
        info!(payment_id, refund_id = %refund.refund_id, amount = refund.amount, "Refund processed");

        Ok(RefundOutcome {
            refund_id: refund.refund_id,
            payment_id: payment_id.to_string(),
            amount: refund.amount,
            status: refund.status,
            message: MESSAGE_REFUND_PROCESSED,
        })
    }

    /// Current status of a payment, refreshed from the gateway when possible.
    ///
    /// Unknown payment ids are looked up on the default gateway. For known
    /// records a gateway failure degrades to the stored status, flagged as
    /// [`Freshness::Stored`]. Nothing is persisted.
    pub async fn status(&self, payment_id: &str) -> Result<StatusView> {
        let Some(record) = self.store.find_by_payment_id(payment_id).await? else {
            warn!(payment_id, "Payment not in store, querying default gateway");
            let gateway = self.selector.default_gateway()?;
            return match gateway.fetch_status(payment_id).await {
                Ok(remote) => Ok(untracked_view(payment_id, remote)),
                Err(e) => {
                    error!(payment_id, error = %e, "Gateway status lookup failed");
                    Err(PaymentError::PaymentNotFound(format!(
                        "Payment not found: {payment_id}"
                    )))
                }
            };
        };

        let remote = match self.selector.for_type(record.gateway_type()) {
            Ok(gateway) => gateway.fetch_status(payment_id).await.map_err(PaymentError::from),
            Err(e) => Err(e),
        };
        match remote {
            Ok(remote) => Ok(StatusView {
                payment_id: Some(payment_id.to_string()),
                order_id: Some(record.order_id().to_string()),
                status: reconcile(record.status(), &remote.status),
                gateway_status: Some(remote.status),
                amount: remote.amount,
                currency: remote.currency,
                method: remote.method,
                freshness: Freshness::Live,
            }),
            Err(e) => {
                warn!(payment_id, error = %e, "Live status unavailable, using stored status");
                Ok(stored_view(&record))
            }
        }
    }

    /// Stored status of an order's payment. Never calls a gateway.
    pub async fn status_by_order_id(&self, order_id: &str) -> Result<StatusView> {
        match self.store.find_by_order_id(order_id).await? {
            Some(record) => Ok(stored_view(&record)),
            None => {
                warn!(order_id, "Payment not found for order");
                Err(PaymentError::PaymentNotFound(format!(
                    "Payment not found for order: {order_id}"
                )))
            }
        }
    }

    /// Entry point for gateway-initiated notifications.
    ///
    /// A notification is `Verified` only when a verifier is installed and
    /// accepts the signature. A verified notification is matched to a record
    /// through the collection link it names, but no record is updated yet.
    pub async fn on_gateway_notification(
        &self,
        raw_payload: &[u8],
        signature: Option<&str>,
    ) -> Result<NotificationReceipt> {
        let (Some(verifier), Some(signature)) = (self.verifier.as_ref(), signature) else {
            debug!(bytes = raw_payload.len(), "Notification ignored, no verifier or signature");
            return Ok(NotificationReceipt::ignored());
        };
        if !verifier.verify(raw_payload, signature) {
            warn!(bytes = raw_payload.len(), "Gateway notification failed signature check");
            return Ok(NotificationReceipt::ignored());
        }

        let record = match notification_link_id(raw_payload) {
            Some(link_id) => self.store.find_by_link_id(&link_id).await?,
            None => None,
        };
        match &record {
            Some(record) => info!(order_id = record.order_id(), "Gateway notification verified"),
            None => warn!(bytes = raw_payload.len(), "Verified notification matches no payment"),
        }
        Ok(NotificationReceipt {
            outcome: NotificationOutcome::Verified,
            order_id: record.map(|r| r.order_id().to_string()),
        })
    }

    async fn persist(&self, record: PaymentRecord, expected: PaymentStatus) -> Result<PaymentRecord> {
        match self.store.update(record, expected).await {
            Ok(saved) => Ok(saved),
            Err(StoreError::Conflict { id, actual, .. }) => {
                warn!(%id, %actual, "Payment changed concurrently");
                Err(PaymentError::InvalidPaymentState(format!(
                    "Payment was modified concurrently and is now {actual}"
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn check_claim(claimed: &str, actual: Option<&str>, order_id: &str) -> Result<()> {
    if actual == Some(claimed) {
        return Ok(());
    }
    warn!(payment_id = claimed, order_id, "Payment does not belong to order");
    Err(PaymentError::ValidationError(format!(
        "Payment {claimed} does not belong to order {order_id}"
    )))
}

/// Collection link named by a gateway notification body.
///
/// Razorpay puts the payment link under `payload.payment_link.entity`; Stripe
/// intent events carry the intent, which doubles as the link, in `data.object`.
fn notification_link_id(raw_payload: &[u8]) -> Option<String> {
    let body: serde_json::Value = serde_json::from_slice(raw_payload).ok()?;
    ["/payload/payment_link/entity/id", "/data/object/id"]
        .iter()
        .find_map(|pointer| body.pointer(pointer)?.as_str())
        .map(str::to_string)
}

fn reference_payment_id(reference: &PaymentRef) -> Option<&str> {
    match reference {
        PaymentRef::Payment(id) => Some(id),
        PaymentRef::Link(_) => None,
    }
}

fn stored_view(record: &PaymentRecord) -> StatusView {
    StatusView {
        payment_id: record.gateway_payment_id().map(str::to_string),
        order_id: Some(record.order_id().to_string()),
        status: record.status(),
        gateway_status: None,
        amount: record.amount().value(),
        currency: record.currency().to_string(),
        method: None,
        freshness: Freshness::Stored,
    }
}

// Nothing local to reconcile against; unmapped provider states read as pending.
fn untracked_view(payment_id: &str, remote: GatewayPayment) -> StatusView {
    StatusView {
        payment_id: Some(remote.payment_id.unwrap_or_else(|| payment_id.to_string())),
        order_id: remote.order_id,
        status: canonical_status(&remote.status).unwrap_or(PaymentStatus::Pending),
        gateway_status: Some(remote.status),
        amount: remote.amount,
        currency: remote.currency,
        method: remote.method,
        freshness: Freshness::Live,
    }
}
