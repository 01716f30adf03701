//! Command-line transport.
//!
//! Each subcommand validates its arguments, calls one orchestrator operation
//! and hands back the canonical result as JSON.

pub mod validation;

use crate::application::orchestrator::{InitiatePayment, PaymentOrchestrator};
use crate::error::{ErrorCategory, PaymentError, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Payment link orchestration", long_about = None)]
pub struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a payment link for an order, or return the outstanding one
    Initiate {
        #[arg(long)]
        order_id: String,
        /// Amount in the smallest currency unit
        #[arg(long, allow_negative_numbers = true)]
        amount: i64,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
        /// RAZORPAY or STRIPE; defaults to the configured gateway
        #[arg(long)]
        gateway: Option<String>,
    },
    /// Reconcile a payment with its gateway
    Verify {
        #[arg(long)]
        payment_id: Option<String>,
        #[arg(long)]
        order_id: Option<String>,
    },
    /// Refund a successful payment, fully unless --amount is given
    Refund {
        #[arg(long)]
        payment_id: String,
        #[arg(long, allow_negative_numbers = true)]
        amount: Option<i64>,
    },
    /// Current status of a payment, refreshed from the gateway
    Status {
        #[arg(long)]
        payment_id: String,
    },
    /// Stored status of an order's payment
    StatusByOrder {
        #[arg(long)]
        order_id: String,
    },
    /// Hand a raw gateway notification to the webhook hook
    Webhook {
        /// File holding the raw notification body
        payload: PathBuf,
        #[arg(long)]
        signature: Option<String>,
    },
}

/// Runs one command and returns its result as JSON.
pub async fn execute(command: Command, orchestrator: &PaymentOrchestrator) -> Result<Value> {
    match command {
        Command::Initiate {
            order_id,
            amount,
            phone,
            email,
            gateway,
        } => {
            let request = InitiatePayment {
                order_id: validation::required(&order_id, "Order ID")?.to_string(),
                amount: validation::amount(amount)?,
                phone: validation::phone(&phone)?.to_string(),
                email: validation::email(&email)?.to_string(),
                gateway: validation::gateway(gateway.as_deref())?,
            };
            to_json(orchestrator.initiate(request).await?)
        }
        Command::Verify {
            payment_id,
            order_id,
        } => to_json(
            orchestrator
                .verify(payment_id.as_deref(), order_id.as_deref())
                .await?,
        ),
        Command::Refund { payment_id, amount } => {
            let payment_id = validation::required(&payment_id, "Payment ID")?;
            let amount = amount.map(validation::amount).transpose()?;
            to_json(orchestrator.refund(payment_id, amount).await?)
        }
        Command::Status { payment_id } => {
            let payment_id = validation::required(&payment_id, "Payment ID")?;
            to_json(orchestrator.status(payment_id).await?)
        }
        Command::StatusByOrder { order_id } => {
            let order_id = validation::required(&order_id, "Order ID")?;
            to_json(orchestrator.status_by_order_id(order_id).await?)
        }
        Command::Webhook { payload, signature } => {
            let raw = tokio::fs::read(&payload).await.map_err(|e| {
                PaymentError::ValidationError(format!(
                    "Cannot read payload {}: {e}",
                    payload.display()
                ))
            })?;
            to_json(
                orchestrator
                    .on_gateway_notification(&raw, signature.as_deref())
                    .await?,
            )
        }
    }
}

/// Process exit code for a failed command.
pub fn exit_code(err: &PaymentError) -> i32 {
    match err.category() {
        ErrorCategory::NotFound | ErrorCategory::BadRequest => 2,
        ErrorCategory::Processing => 1,
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| PaymentError::Config(format!("serialization: {e}")))
}
