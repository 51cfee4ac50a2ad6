//! Reversing entries.

use super::types::{LedgerLine, LedgerLineInput};

/// Builds the lines of a reversing entry by swapping every debit and credit.
///
/// Account, cost center and order are preserved; memos are prefixed with
/// `"Reversal: "`.
#[must_use]
pub fn reversing_lines(original: &[LedgerLine]) -> Vec<LedgerLineInput> {
    original
        .iter()
        .map(|line| LedgerLineInput {
            account_id: line.account_id,
            debit: line.credit,
            credit: line.debit,
            memo: Some(format!(
                "Reversal: {}",
                line.memo.clone().unwrap_or_default()
            )),
            cost_center: line.cost_center.clone(),
        })
        .collect()
}

/// Description of a reversing entry.
#[must_use]
pub fn reversal_description(entry_number: i64, reason: &str) -> String {
    format!("Reversal of entry #{entry_number}. Reason: {reason}")
}
