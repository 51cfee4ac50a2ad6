//! Reconciliation session state machine.
//!
//! `draft -> in_progress -> completed`, or `draft | in_progress -> cancelled`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_shared::types::{BankAccountId, BankTransactionId, LedgerLineId, ReconciliationId, TenantId};

use crate::error::{LedgerError, LedgerResult};

/// Reconciliation session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    /// Created, not yet accepting matches.
    Draft,
    /// Accepting matches.
    InProgress,
    /// Finalized; matches are immutable.
    Completed,
    /// Abandoned; matches released.
    Cancelled,
}

impl ReconciliationStatus {
    /// Snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true if the status is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns true if `self -> to` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Draft, Self::InProgress)
                | (Self::Draft | Self::InProgress, Self::Cancelled)
                | (Self::InProgress, Self::Completed)
        )
    }
}

/// A bank transaction matched to a ledger line within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPair {
    /// Bank side.
    pub bank_transaction_id: BankTransactionId,
    /// Ledger side.
    pub ledger_line_id: LedgerLineId,
    /// The shared signed amount.
    pub amount: Decimal,
}

/// A pair submitted to `apply_matches`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    /// Bank side.
    pub bank_transaction_id: BankTransactionId,
    /// Ledger side.
    pub ledger_line_id: LedgerLineId,
}

/// A bank reconciliation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Unique identifier.
    pub id: ReconciliationId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Bank account being reconciled.
    pub bank_account_id: BankAccountId,
    /// Closing balance stated by the bank.
    pub statement_balance: Decimal,
    /// Statement date.
    pub statement_date: NaiveDate,
    /// Opening balance used at completion.
    pub opening_balance: Option<Decimal>,
    /// Reconciled book balance recorded at completion.
    pub book_balance: Option<Decimal>,
    /// Current status.
    pub status: ReconciliationStatus,
    /// Matched pairs.
    pub matches: Vec<MatchedPair>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Completion or cancellation timestamp.
    pub finished_at: Option<DateTime<Utc>>,
}

impl Reconciliation {
    /// New session in `draft`.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        bank_account_id: BankAccountId,
        statement_balance: Decimal,
        statement_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReconciliationId::new(),
            tenant_id,
            bank_account_id,
            statement_balance,
            statement_date,
            opening_balance: None,
            book_balance: None,
            status: ReconciliationStatus::Draft,
            matches: Vec::new(),
            created_at,
            finished_at: None,
        }
    }

    /// Moves to `to` or fails with `InvalidStatusTransition`.
    pub fn transition(&mut self, to: ReconciliationStatus) -> LedgerResult<()> {
        if !self.status.can_transition_to(to) {
            return Err(LedgerError::InvalidStatusTransition {
                from: self.status.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }
        self.status = to;
        Ok(())
    }

    /// Fails unless the session accepts match changes.
    pub fn ensure_in_progress(&self) -> LedgerResult<()> {
        if self.status != ReconciliationStatus::InProgress {
            return Err(LedgerError::validation(format!(
                "reconciliation is {}, not in_progress",
                self.status.as_str()
            )));
        }
        Ok(())
    }

    /// Sum of matched amounts.
    #[must_use]
    pub fn matched_total(&self) -> Decimal {
        self.matches.iter().map(|m| m.amount).sum()
    }

    /// Opening balance plus matched amounts.
    #[must_use]
    pub fn book_balance_from(&self, opening_balance: Decimal) -> Decimal {
        opening_balance + self.matched_total()
    }

    /// Checks the book balance against the statement and returns it.
    pub fn check_balance(&self, opening_balance: Decimal) -> LedgerResult<Decimal> {
        let book_balance = self.book_balance_from(opening_balance);
        if book_balance != self.statement_balance {
            return Err(LedgerError::ReconciliationBalanceMismatch {
                statement_balance: self.statement_balance,
                book_balance,
            });
        }
        Ok(book_balance)
    }

    /// Difference between statement and book balance.
    #[must_use]
    pub fn difference(&self, opening_balance: Decimal) -> Decimal {
        self.statement_balance - self.book_balance_from(opening_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use super::ReconciliationStatus::{Cancelled, Completed, Draft, InProgress};

    fn session(statement_balance: Decimal) -> Reconciliation {
        Reconciliation::new(
            TenantId::new(),
            BankAccountId::new(),
            statement_balance,
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            Utc::now(),
        )
    }

    #[rstest]
    #[case(Draft, InProgress, true)]
    #[case(Draft, Cancelled, true)]
    #[case(InProgress, Completed, true)]
    #[case(InProgress, Cancelled, true)]
    #[case(Draft, Completed, false)]
    #[case(Completed, Cancelled, false)]
    #[case(Cancelled, InProgress, false)]
    #[case(Completed, InProgress, false)]
    fn test_transitions(
        #[case] from: ReconciliationStatus,
        #[case] to: ReconciliationStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_invalid_transition_error() {
        let mut s = session(dec!(0));
        let err = s.transition(Completed).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidStatusTransition {
                from: "draft".into(),
                to: "completed".into(),
            }
        );
    }

    #[test]
    fn test_balance_check() {
        let mut s = session(dec!(10000.00));
        s.matches.push(MatchedPair {
            bank_transaction_id: BankTransactionId::from_raw(1),
            ledger_line_id: LedgerLineId::from_raw(1),
            amount: dec!(12000.00),
        });
        s.matches.push(MatchedPair {
            bank_transaction_id: BankTransactionId::from_raw(2),
            ledger_line_id: LedgerLineId::from_raw(2),
            amount: dec!(-2000.00),
        });
        assert_eq!(s.check_balance(dec!(0)), Ok(dec!(10000.00)));
        assert_eq!(s.difference(dec!(500)), dec!(-500));

        s.statement_balance = dec!(9500.00);
        assert_eq!(
            s.check_balance(dec!(0)),
            Err(LedgerError::ReconciliationBalanceMismatch {
                statement_balance: dec!(9500.00),
                book_balance: dec!(10000.00),
            })
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!InProgress.is_terminal());
    }
}
