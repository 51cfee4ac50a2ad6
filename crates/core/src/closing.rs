//! Year-end closing plan.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_shared::types::{AccountId, FiscalYearId, JournalEntryId};

use crate::ledger::LedgerLineInput;
use crate::reports::TrialBalanceRow;

/// Lines of a closing entry and the net income they transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosingPlan {
    /// Net income moved to retained earnings (negative for a loss).
    pub net_income: Decimal,
    /// Closing lines; empty when every temporary account is already zero.
    pub lines: Vec<LedgerLineInput>,
}

/// Outcome of closing a fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearEndResult {
    /// The closed year.
    pub fiscal_year_id: FiscalYearId,
    /// Net income for the year.
    pub net_income: Decimal,
    /// The closing entry, if one was needed.
    pub closing_entry: Option<JournalEntryId>,
}

/// Builds the entry that zeroes revenue and expense accounts into retained earnings.
///
/// Each temporary account with a non-zero balance gets one line on the side
/// opposite its net activity. The retained-earnings line carries the net
/// income: a credit for a profit, a debit for a loss, nothing at break-even.
#[must_use]
pub fn build_closing_plan(rows: &[TrialBalanceRow], retained_earnings: AccountId) -> ClosingPlan {
    let mut lines = Vec::new();
    let mut net_income = Decimal::ZERO;

    for row in rows.iter().filter(|r| r.category.is_temporary()) {
        let net_debit = row.net_debit();
        if net_debit.is_zero() {
            continue;
        }
        net_income -= net_debit;
        let line = if net_debit > Decimal::ZERO {
            LedgerLineInput::credit(row.account_id, net_debit)
        } else {
            LedgerLineInput::debit(row.account_id, -net_debit)
        };
        lines.push(line.with_memo(format!("Close {} {}", row.code, row.name)));
    }

    if net_income > Decimal::ZERO {
        lines.push(
            LedgerLineInput::credit(retained_earnings, net_income).with_memo("Net income"),
        );
    } else if net_income < Decimal::ZERO {
        lines.push(LedgerLineInput::debit(retained_earnings, -net_income).with_memo("Net loss"));
    }

    ClosingPlan { net_income, lines }
}
