//! Journal entry and ledger line types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_shared::types::{
    AccountId, FiscalYearId, JournalEntryId, LedgerLineId, ReconciliationId, TenantId,
};

/// One side of a posting as submitted by a caller.
///
/// Exactly one of `debit`/`credit` must be non-zero; both must be non-negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerLineInput {
    /// Account to post to.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Optional line memo.
    pub memo: Option<String>,
    /// Optional cost center tag (reporting only).
    pub cost_center: Option<String>,
}

impl LedgerLineInput {
    /// Debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            memo: None,
            cost_center: None,
        }
    }

    /// Credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            memo: None,
            cost_center: None,
        }
    }

    /// Sets the memo.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// Sets the cost center.
    #[must_use]
    pub fn with_cost_center(mut self, cost_center: impl Into<String>) -> Self {
        self.cost_center = Some(cost_center.into());
        self
    }
}

/// A journal entry as submitted for posting.
#[derive(Debug, Clone)]
pub struct JournalEntryInput {
    /// Accounting date; selects the fiscal period.
    pub date: NaiveDate,
    /// External reference (cheque number, invoice number).
    pub reference: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Lines, in order.
    pub lines: Vec<LedgerLineInput>,
}

impl JournalEntryInput {
    /// Entry with no reference or description.
    #[must_use]
    pub fn new(date: NaiveDate, lines: Vec<LedgerLineInput>) -> Self {
        Self {
            date,
            reference: None,
            description: None,
            lines,
        }
    }

    /// Sets the reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// What produced a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntrySource {
    /// Posted by a caller.
    Manual,
    /// Opening balance of a new account.
    OpeningBalance,
    /// Reversal of an earlier entry.
    Reversal {
        /// The reversed entry.
        of: JournalEntryId,
    },
    /// Year-end closing entry.
    YearEndClose {
        /// The fiscal year being closed.
        fiscal_year_id: FiscalYearId,
    },
}

/// A posted journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Per-tenant sequence number, starting at 1.
    pub entry_number: i64,
    /// Accounting date.
    pub date: NaiveDate,
    /// What produced the entry.
    pub source: EntrySource,
    /// External reference.
    pub reference: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Lines, in posting order.
    pub line_ids: Vec<LedgerLineId>,
    /// Sum of debits (equal to the sum of credits).
    pub total: Decimal,
    /// Entry that reversed this one, if any.
    pub reversed_by: Option<JournalEntryId>,
    /// Commit timestamp.
    pub posted_at: DateTime<Utc>,
}

/// A posted ledger line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    /// Store-assigned serial identity.
    pub id: LedgerLineId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Parent entry.
    pub entry_id: JournalEntryId,
    /// Accounting date (copied from the entry).
    pub date: NaiveDate,
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Line memo.
    pub memo: Option<String>,
    /// Cost center tag.
    pub cost_center: Option<String>,
    /// Entry reference (copied for matching).
    pub reference: Option<String>,
    /// Account version after this line.
    pub account_version: i64,
    /// Account balance after this line, signed per its normal balance.
    pub running_balance: Decimal,
    /// Reconciliation this line is matched in.
    pub reconciliation_id: Option<ReconciliationId>,
}

impl LedgerLine {
    /// `debit - credit`: inflow positive for a bank's ledger account.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Returns true if the line is matched in a reconciliation.
    #[must_use]
    pub fn is_reconciled(&self) -> bool {
        self.reconciliation_id.is_some()
    }
}

/// An entry together with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedEntry {
    /// The entry header.
    pub entry: JournalEntry,
    /// Its lines, in posting order.
    pub lines: Vec<LedgerLine>,
}

/// Debit and credit totals of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingTotals {
    /// Total debits.
    pub debit: Decimal,
    /// Total credits.
    pub credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

impl PostingTotals {
    /// Totals from debit and credit sums.
    #[must_use]
    pub fn new(debit: Decimal, credit: Decimal) -> Self {
        Self {
            debit,
            credit,
            is_balanced: debit == credit,
        }
    }

    /// Totals over a set of line inputs.
    #[must_use]
    pub fn of(lines: &[LedgerLineInput]) -> Self {
        Self::new(
            lines.iter().map(|l| l.debit).sum(),
            lines.iter().map(|l| l.credit).sum(),
        )
    }

    /// `debit - credit`.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}
