//! Account balance rules.
//!
//! - Debit-normal accounts (asset, expense): balance += debit - credit
//! - Credit-normal accounts (liability, equity, revenue): balance += credit - debit

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side on which an account's balance naturally increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Increases with debits.
    Debit,
    /// Increases with credits.
    Credit,
}

impl NormalBalance {
    /// Balance change produced by a debit/credit pair.
    #[must_use]
    pub fn signed(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }

    /// Converts a raw `debit - credit` figure into this side's sign.
    #[must_use]
    pub fn from_net_debit(self, net_debit: Decimal) -> Decimal {
        match self {
            Self::Debit => net_debit,
            Self::Credit => -net_debit,
        }
    }

    /// Splits a balance signed on this side into a `(debit, credit)` pair
    /// with one side zero and the other non-negative.
    #[must_use]
    pub fn to_sides(self, balance: Decimal) -> (Decimal, Decimal) {
        let net_debit = self.from_net_debit(balance);
        if net_debit >= Decimal::ZERO {
            (net_debit, Decimal::ZERO)
        } else {
            (Decimal::ZERO, -net_debit)
        }
    }
}

/// Debit and credit totals accumulated for an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountActivity {
    /// Total debits.
    pub debit_total: Decimal,
    /// Total credits.
    pub credit_total: Decimal,
}

impl AccountActivity {
    /// Merges another account's activity (used for header roll-ups).
    pub fn merge(&mut self, other: &Self) {
        self.debit_total += other.debit_total;
        self.credit_total += other.credit_total;
    }

    /// Raw `debit - credit`.
    #[must_use]
    pub fn net_debit(&self) -> Decimal {
        self.debit_total - self.credit_total
    }

    /// Net balance signed on the given side.
    #[must_use]
    pub fn balance(&self, normal: NormalBalance) -> Decimal {
        normal.signed(self.debit_total, self.credit_total)
    }
}

/// Running balance recorded on a ledger line.
///
/// `current_balance[N] = previous_balance[N] + change` and
/// `previous_balance[N] = current_balance[N-1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Account version after this line (1 for the first line).
    pub account_version: i64,
    /// Balance before this line.
    pub previous_balance: Decimal,
    /// Balance after this line.
    pub current_balance: Decimal,
}

impl RunningBalance {
    /// State of an account with no postings.
    #[must_use]
    pub fn opening() -> Self {
        Self {
            account_version: 0,
            previous_balance: Decimal::ZERO,
            current_balance: Decimal::ZERO,
        }
    }

    /// Resumes from an account's stored version and balance.
    #[must_use]
    pub fn resume(account_version: i64, current_balance: Decimal) -> Self {
        Self {
            account_version,
            previous_balance: current_balance,
            current_balance,
        }
    }

    /// Applies one more line.
    #[must_use]
    pub fn next(&self, balance_change: Decimal) -> Self {
        Self {
            account_version: self.account_version + 1,
            previous_balance: self.current_balance,
            current_balance: self.current_balance + balance_change,
        }
    }
}
