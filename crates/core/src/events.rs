//! Domain events published after a unit of work commits.
//!
//! Consumers (notification, search indexing, projections) live outside the ledger;
//! the ledger only guarantees that an event is delivered after its change is visible
//! and that rejected operations publish nothing.

use std::sync::Mutex;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_shared::types::{
    BankAccountId, FiscalPeriodId, FiscalYearId, JournalEntryId, ReconciliationId, TenantId,
};

/// Committed ledger state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A journal entry was posted.
    EntryPosted {
        /// Tenant.
        tenant_id: TenantId,
        /// The entry.
        entry_id: JournalEntryId,
        /// Entry date.
        date: NaiveDate,
        /// Sum of the entry's debits (equal to its credits).
        amount: Decimal,
    },
    /// A fiscal period closed.
    PeriodClosed {
        /// Tenant.
        tenant_id: TenantId,
        /// The period.
        period_id: FiscalPeriodId,
    },
    /// A fiscal period reopened.
    PeriodReopened {
        /// Tenant.
        tenant_id: TenantId,
        /// The period.
        period_id: FiscalPeriodId,
    },
    /// A fiscal year closed.
    FiscalYearClosed {
        /// Tenant.
        tenant_id: TenantId,
        /// The year.
        fiscal_year_id: FiscalYearId,
        /// Net result moved to retained earnings.
        net_income: Decimal,
    },
    /// A bank reconciliation completed.
    ReconciliationCompleted {
        /// Tenant.
        tenant_id: TenantId,
        /// The reconciliation.
        reconciliation_id: ReconciliationId,
        /// The bank account.
        bank_account_id: BankAccountId,
    },
    /// A bank reconciliation was cancelled.
    ReconciliationCancelled {
        /// Tenant.
        tenant_id: TenantId,
        /// The reconciliation.
        reconciliation_id: ReconciliationId,
    },
}

impl LedgerEvent {
    /// Stable event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::EntryPosted { .. } => "entry_posted",
            Self::PeriodClosed { .. } => "period_closed",
            Self::PeriodReopened { .. } => "period_reopened",
            Self::FiscalYearClosed { .. } => "fiscal_year_closed",
            Self::ReconciliationCompleted { .. } => "reconciliation_completed",
            Self::ReconciliationCancelled { .. } => "reconciliation_cancelled",
        }
    }
}

/// Receiver of committed ledger events.
pub trait EventSink: Send + Sync {
    /// Delivers one event. Must not fail the operation that produced it.
    fn publish(&self, event: &LedgerEvent);
}

/// Sink that writes every event to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: &LedgerEvent) {
        tracing::info!(event = event.name(), payload = ?event, "ledger event");
    }
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<LedgerEvent>>,
}

impl RecordingEventSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of recorded events with the given name.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name() == name).count()
    }
}

impl EventSink for RecordingEventSink {
    fn publish(&self, event: &LedgerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
