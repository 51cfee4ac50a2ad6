//! Posting validation.
//!
//! Pure business logic: the store supplies account and period lookups as
//! closures and persists only what passes.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use tally_shared::types::AccountId;

use super::types::{JournalEntryInput, LedgerLineInput, PostingTotals};
use crate::error::{LedgerError, LedgerResult};

/// Information about an account needed for posting validation.
#[derive(Debug, Clone, Copy)]
pub struct AccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// Whether the account is active.
    pub is_active: bool,
    /// Whether the account is a header.
    pub is_header: bool,
}

/// Ledger service for entry validation.
pub struct LedgerService;

impl LedgerService {
    /// Validates an entry before it is written.
    ///
    /// Checks run in this order and the first failure is returned:
    /// 1. at least two lines, each with exactly one positive side
    /// 2. debits equal credits
    /// 3. every account exists, is active and is not a header
    /// 4. the entry date falls in a period that accepts postings
    pub fn validate_entry<A, P>(
        input: &JournalEntryInput,
        account_lookup: A,
        period_check: P,
    ) -> LedgerResult<PostingTotals>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
        P: Fn(NaiveDate) -> LedgerResult<()>,
    {
        let totals = Self::validate_lines(&input.lines)?;

        for line in &input.lines {
            let info = account_lookup(line.account_id)
                .ok_or(LedgerError::UnknownAccount(line.account_id))?;
            if !info.is_active {
                return Err(LedgerError::AccountInactive(info.id));
            }
            if info.is_header {
                return Err(LedgerError::HeaderAccountNotPostable(info.id));
            }
        }

        period_check(input.date)?;
        Ok(totals)
    }

    /// Shape and balance checks that need no lookups.
    pub fn validate_lines(lines: &[LedgerLineInput]) -> LedgerResult<PostingTotals> {
        if lines.len() < 2 {
            return Err(LedgerError::validation(
                "journal entry must have at least 2 lines",
            ));
        }

        for (index, line) in lines.iter().enumerate() {
            if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
                return Err(LedgerError::validation(format!(
                    "line {}: amounts cannot be negative",
                    index + 1
                )));
            }
            if line.debit.is_zero() == line.credit.is_zero() {
                return Err(LedgerError::validation(format!(
                    "line {}: exactly one of debit or credit must be non-zero",
                    index + 1
                )));
            }
        }

        let totals = PostingTotals::of(lines);
        if !totals.is_balanced {
            return Err(LedgerError::ImbalancedEntry {
                debit: totals.debit,
                credit: totals.credit,
            });
        }
        Ok(totals)
    }
}
