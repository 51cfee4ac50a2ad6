//! Ledger error taxonomy.
//!
//! Every public ledger operation returns either its success value or exactly one
//! `LedgerError`. Variants are grouped the way callers act on them: input shape,
//! ledger invariants, period gating, reconciliation, and infrastructure.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use tally_shared::types::{AccountId, BankTransactionId, FiscalPeriodId, LedgerLineId};

/// Result alias used throughout the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Input / Shape Errors ==========
    /// Input failed a shape or business validation rule.
    #[error("Validation error: {0}")]
    Validation(String),

    // ========== Ledger Invariant Errors ==========
    /// Journal entry debits and credits differ.
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    ImbalancedEntry {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Referenced account does not exist for the tenant.
    #[error("Unknown account: {0}")]
    UnknownAccount(AccountId),

    /// Account is inactive and cannot be posted to.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Header accounts aggregate their children and never take postings.
    #[error("Account {0} is a header account and cannot be posted to")]
    HeaderAccountNotPostable(AccountId),

    /// Account cannot be changed or deactivated while in use.
    #[error("Account {account_id} is in use: {reason}")]
    AccountInUse {
        /// The account.
        account_id: AccountId,
        /// Why the account is considered in use.
        reason: String,
    },

    /// Account type cannot change once an account references it.
    #[error("Account type '{0}' is referenced by an account")]
    AccountTypeInUse(String),

    /// Code already exists for the tenant.
    #[error("Code '{0}' already exists")]
    DuplicateCode(String),

    /// Parent assignment would create a cycle or cross a tenant boundary.
    #[error("Parent {parent_id} is not a valid parent for account {account_id}")]
    Cycle {
        /// The account being placed.
        account_id: AccountId,
        /// The rejected parent.
        parent_id: AccountId,
    },

    // ========== Period / Year Gating Errors ==========
    /// No fiscal period covers the date.
    #[error("No fiscal period found for date {0}")]
    NoFiscalPeriod(NaiveDate),

    /// The period containing the date is closed.
    #[error("Fiscal period containing {0} is closed")]
    PeriodClosed(NaiveDate),

    /// The period has not ended yet; closing it requires `force`.
    #[error("Fiscal period {period_id} does not end until {end_date}")]
    PeriodNotEnded {
        /// The period.
        period_id: FiscalPeriodId,
        /// Its end date.
        end_date: NaiveDate,
    },

    /// Periods must close and reopen in chronological (stack) order.
    #[error("Fiscal period {period_id} is out of sequence; period {blocking_period_id} blocks it")]
    SequentialCloseViolation {
        /// The period the caller tried to change.
        period_id: FiscalPeriodId,
        /// The earliest period preventing the change.
        blocking_period_id: FiscalPeriodId,
    },

    /// The period or year is already closed.
    #[error("{0} is already closed")]
    AlreadyClosed(String),

    // ========== Reconciliation Errors ==========
    /// Some items were reconciled by someone else first.
    #[error(
        "Items already reconciled: bank transactions {bank_transactions:?}, ledger lines {ledger_lines:?}"
    )]
    AlreadyReconciled {
        /// Conflicting bank transactions.
        bank_transactions: Vec<BankTransactionId>,
        /// Conflicting ledger lines.
        ledger_lines: Vec<LedgerLineId>,
    },

    /// Reconciled book balance differs from the statement.
    #[error(
        "Reconciled book balance {book_balance} does not match statement balance {statement_balance}"
    )]
    ReconciliationBalanceMismatch {
        /// Balance stated by the bank.
        statement_balance: Decimal,
        /// Opening balance plus matched amounts.
        book_balance: Decimal,
    },

    /// A state machine refused a transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    // ========== Lookup Errors ==========
    /// Entity not found for the tenant.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Identifier as supplied.
        id: String,
    },

    // ========== Infrastructure Errors ==========
    /// Storage failed; the operation had no effect.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a missing entity.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the stable error code for callers.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ImbalancedEntry { .. } => "IMBALANCED_ENTRY",
            Self::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::HeaderAccountNotPostable(_) => "HEADER_ACCOUNT_NOT_POSTABLE",
            Self::AccountInUse { .. } => "ACCOUNT_IN_USE",
            Self::AccountTypeInUse(_) => "ACCOUNT_TYPE_IN_USE",
            Self::DuplicateCode(_) => "DUPLICATE_CODE",
            Self::Cycle { .. } => "CYCLE",
            Self::NoFiscalPeriod(_) => "NO_FISCAL_PERIOD",
            Self::PeriodClosed(_) => "PERIOD_CLOSED",
            Self::PeriodNotEnded { .. } => "PERIOD_NOT_ENDED",
            Self::SequentialCloseViolation { .. } => "SEQUENTIAL_CLOSE_VIOLATION",
            Self::AlreadyClosed(_) => "ALREADY_CLOSED",
            Self::AlreadyReconciled { .. } => "ALREADY_RECONCILED",
            Self::ReconciliationBalanceMismatch { .. } => "RECONCILIATION_BALANCE_MISMATCH",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns true if repeating the call with fresh input may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AlreadyReconciled { .. } | Self::Storage(_))
    }
}
