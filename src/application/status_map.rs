//! Translation from provider status vocabulary to canonical status.
//!
//! Kept in one table so that adapters never decide canonical state themselves.

use crate::domain::payment::PaymentStatus;

const STATUS_TABLE: &[(&str, PaymentStatus)] = &[
    ("captured", PaymentStatus::Success),
    ("paid", PaymentStatus::Success),
    ("succeeded", PaymentStatus::Success),
    ("failed", PaymentStatus::Failed),
    ("canceled", PaymentStatus::Failed),
];

/// Canonical status for a provider status string, if the table knows it.
pub fn canonical_status(provider_status: &str) -> Option<PaymentStatus> {
    STATUS_TABLE
        .iter()
        .find(|(native, _)| *native == provider_status)
        .map(|(_, status)| *status)
}

/// Status a record should hold after the provider reported `provider_status`.
///
/// Unknown strings, and mapped statuses that are not a legal move from
/// `current`, leave the status as it is.
pub fn reconcile(current: PaymentStatus, provider_status: &str) -> PaymentStatus {
    match canonical_status(provider_status) {
        Some(target) if current.can_transition_to(target) => target,
        _ => current,
    }
}
