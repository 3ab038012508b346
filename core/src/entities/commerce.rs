//! Tickets, payments, and ledger transactions.

use super::impl_record;
use crate::Resource;
use crate::error::ValidationError;
use crate::validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a ticket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// On sale.
    #[default]
    Available,
    /// Held for a buyer.
    Reserved,
    /// Paid for.
    Sold,
    /// Voided.
    Cancelled,
    /// Scanned at the door.
    CheckedIn,
}

impl TicketStatus {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Sold => "sold",
            Self::Cancelled => "cancelled",
            Self::CheckedIn => "checked_in",
        }
    }
}

/// An admission ticket for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Primary key.
    pub id: Uuid,
    /// Event admitted to.
    pub event_id: Uuid,
    /// Current holder, once reserved or sold.
    pub holder_id: Option<Uuid>,
    /// Tier name ("general", "vip", ...).
    pub ticket_type: String,
    /// Price in cents.
    pub price_cents: u64,
    /// Lifecycle state.
    pub status: TicketStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl_record!(Ticket, "tickets", "Ticket");

/// Create payload for [`Ticket`].
#[derive(Debug, Clone, Deserialize)]
pub struct TicketDraft {
    /// Event admitted to.
    pub event_id: Uuid,
    /// Holder.
    pub holder_id: Option<Uuid>,
    /// Tier name; defaults to "general".
    pub ticket_type: Option<String>,
    /// Price in cents.
    #[serde(default)]
    pub price_cents: u64,
    /// Initial state.
    #[serde(default)]
    pub status: TicketStatus,
}

/// Update payload for [`Ticket`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketPatch {
    /// New holder.
    pub holder_id: Option<Uuid>,
    /// New tier.
    pub ticket_type: Option<String>,
    /// New price.
    pub price_cents: Option<u64>,
    /// New state.
    pub status: Option<TicketStatus>,
}

impl Resource for Ticket {
    type Draft = TicketDraft;
    type Patch = TicketPatch;

    fn from_draft(id: Uuid, draft: TicketDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            event_id: draft.event_id,
            holder_id: draft.holder_id,
            ticket_type: validate::optional(draft.ticket_type)
                .unwrap_or_else(|| "general".to_string()),
            price_cents: draft.price_cents,
            status: draft.status,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: TicketPatch, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if patch.holder_id.is_some() {
            self.holder_id = patch.holder_id;
        }
        if let Some(ticket_type) = patch.ticket_type {
            self.ticket_type = validate::required("ticket_type", ticket_type)?;
        }
        if let Some(price_cents) = patch.price_cents {
            self.price_cents = price_cents;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Settlement state of a payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting settlement.
    #[default]
    Pending,
    /// Settled.
    Completed,
    /// Declined or errored.
    Failed,
    /// Returned to the payer.
    Refunded,
}

impl PaymentStatus {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

/// A payment for a ticket or a client booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Primary key.
    pub id: Uuid,
    /// Amount in minor units.
    pub amount_cents: u64,
    /// ISO currency code, upper-case.
    pub currency: String,
    /// Payment method ("card", "bank_transfer", ...).
    pub method: String,
    /// Settlement state.
    pub status: PaymentStatus,
    /// Ticket paid for.
    pub ticket_id: Option<Uuid>,
    /// Client billed.
    pub client_id: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl_record!(Payment, "payments", "Payment");

/// Create payload for [`Payment`].
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentDraft {
    /// Amount in minor units.
    pub amount_cents: u64,
    /// Currency; defaults to USD.
    pub currency: Option<String>,
    /// Payment method.
    pub method: String,
    /// Initial state.
    #[serde(default)]
    pub status: PaymentStatus,
    /// Ticket paid for.
    pub ticket_id: Option<Uuid>,
    /// Client billed.
    pub client_id: Option<Uuid>,
}

/// Update payload for [`Payment`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentPatch {
    /// New state.
    pub status: Option<PaymentStatus>,
    /// New method.
    pub method: Option<String>,
}

impl Resource for Payment {
    type Draft = PaymentDraft;
    type Patch = PaymentPatch;

    fn from_draft(id: Uuid, draft: PaymentDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            amount_cents: draft.amount_cents,
            currency: validate::currency(
                "currency",
                draft.currency.unwrap_or_else(|| "USD".to_string()),
            )?,
            method: validate::required("method", draft.method)?,
            status: draft.status,
            ticket_id: draft.ticket_id,
            client_id: draft.client_id,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: PaymentPatch, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(method) = patch.method {
            self.method = validate::required("method", method)?;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money in.
    Charge,
    /// Money returned.
    Refund,
    /// Money paid out to an organizer or venue.
    Payout,
}

/// A ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Primary key.
    pub id: Uuid,
    /// Direction.
    pub kind: TransactionKind,
    /// Amount in minor units.
    pub amount_cents: u64,
    /// ISO currency code.
    pub currency: String,
    /// Free-text memo.
    pub description: String,
    /// Related payment.
    pub payment_id: Option<Uuid>,
    /// When the money moved.
    pub occurred_at: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl_record!(Transaction, "transactions", "Transaction");

/// Create payload for [`Transaction`].
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionDraft {
    /// Direction.
    pub kind: TransactionKind,
    /// Amount in minor units.
    pub amount_cents: u64,
    /// Currency; defaults to USD.
    pub currency: Option<String>,
    /// Memo.
    #[serde(default)]
    pub description: String,
    /// Related payment.
    pub payment_id: Option<Uuid>,
    /// When the money moved; defaults to now.
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Update payload for [`Transaction`]; ledger amounts are immutable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionPatch {
    /// New memo.
    pub description: Option<String>,
}

impl Resource for Transaction {
    type Draft = TransactionDraft;
    type Patch = TransactionPatch;

    fn from_draft(
        id: Uuid,
        draft: TransactionDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            kind: draft.kind,
            amount_cents: draft.amount_cents,
            currency: validate::currency(
                "currency",
                draft.currency.unwrap_or_else(|| "USD".to_string()),
            )?,
            description: draft.description.trim().to_string(),
            payment_id: draft.payment_id,
            occurred_at: draft.occurred_at.unwrap_or(now),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(
        &mut self,
        patch: TransactionPatch,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        if let Some(description) = patch.description {
            self.description = description.trim().to_string();
        }
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_currency_defaults_and_normalises() {
        let now = Utc::now();
        let payment = Payment::from_draft(
            Uuid::new_v4(),
            PaymentDraft {
                amount_cents: 2500,
                currency: None,
                method: "card".into(),
                status: PaymentStatus::Completed,
                ticket_id: None,
                client_id: None,
            },
            now,
        )
        .expect("valid draft");
        assert_eq!(payment.currency, "USD");

        let err = Payment::from_draft(
            Uuid::new_v4(),
            PaymentDraft {
                amount_cents: 2500,
                currency: Some("euro".into()),
                method: "card".into(),
                status: PaymentStatus::Pending,
                ticket_id: None,
                client_id: None,
            },
            now,
        );
        assert_eq!(
            err,
            Err(ValidationError::InvalidCurrency { field: "currency" })
        );
    }

    #[test]
    fn test_negative_amount_rejected_by_serde() {
        let parsed = serde_json::from_str::<PaymentDraft>(r#"{"amount_cents":-5,"method":"card"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_transaction_occurred_at_defaults_to_now() {
        let now = Utc::now();
        let tx = Transaction::from_draft(
            Uuid::new_v4(),
            TransactionDraft {
                kind: TransactionKind::Refund,
                amount_cents: 100,
                currency: Some("eur".into()),
                description: " partial ".into(),
                payment_id: None,
                occurred_at: None,
            },
            now,
        )
        .expect("valid draft");
        assert_eq!(tx.occurred_at, now);
        assert_eq!(tx.currency, "EUR");
        assert_eq!(tx.description, "partial");
    }

    #[test]
    fn test_ticket_type_defaults() {
        let now = Utc::now();
        let ticket = Ticket::from_draft(
            Uuid::new_v4(),
            TicketDraft {
                event_id: Uuid::new_v4(),
                holder_id: None,
                ticket_type: Some(" ".into()),
                price_cents: 1000,
                status: TicketStatus::default(),
            },
            now,
        )
        .expect("valid draft");
        assert_eq!(ticket.ticket_type, "general");
        assert_eq!(ticket.status.as_str(), "available");
    }
}
