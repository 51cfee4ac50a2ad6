//! Bank accounts and statement lines.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_shared::types::{AccountId, BankAccountId, BankTransactionId, ReconciliationId, TenantId};

use crate::error::{LedgerError, LedgerResult};

/// A bank account linked to a ledger account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    /// Unique identifier.
    pub id: BankAccountId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// Ledger account carrying this bank account's book activity.
    pub ledger_account_id: AccountId,
    /// Balance before the first imported statement.
    pub opening_balance: Decimal,
    /// Statement balance of the last completed reconciliation.
    pub last_reconciled_balance: Option<Decimal>,
    /// Statement date of the last completed reconciliation.
    pub last_reconciled_date: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl BankAccount {
    /// Opening balance for the next reconciliation.
    #[must_use]
    pub fn reconciliation_opening_balance(&self) -> Decimal {
        self.last_reconciled_balance.unwrap_or(self.opening_balance)
    }
}

/// One line of an imported bank statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransaction {
    /// Store-assigned serial identity.
    pub id: BankTransactionId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Bank account the line belongs to.
    pub bank_account_id: BankAccountId,
    /// Value date.
    pub date: NaiveDate,
    /// Signed amount (inflow positive).
    pub amount: Decimal,
    /// Bank reference.
    pub reference: Option<String>,
    /// Description from the statement.
    pub description: String,
    /// Reconciliation this line is matched in.
    pub reconciliation_id: Option<ReconciliationId>,
}

impl BankTransaction {
    /// Returns true if the line is matched in a reconciliation.
    #[must_use]
    pub fn is_reconciled(&self) -> bool {
        self.reconciliation_id.is_some()
    }
}

/// Input for one imported statement line.
#[derive(Debug, Clone)]
pub struct StatementLineInput {
    /// Value date.
    pub date: NaiveDate,
    /// Signed amount (inflow positive).
    pub amount: Decimal,
    /// Bank reference.
    pub reference: Option<String>,
    /// Description.
    pub description: String,
}

impl StatementLineInput {
    /// Statement line without a reference.
    pub fn new(date: NaiveDate, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            reference: None,
            description: description.into(),
        }
    }

    /// Sets the reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Validates input shape.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.amount.is_zero() {
            return Err(LedgerError::validation("statement line amount cannot be zero"));
        }
        Ok(())
    }
}

/// Input for registering a bank account.
#[derive(Debug, Clone)]
pub struct RegisterBankAccountInput {
    /// Display name.
    pub name: String,
    /// Linked ledger account.
    pub ledger_account_id: AccountId,
    /// Balance before the first imported statement.
    pub opening_balance: Decimal,
}
