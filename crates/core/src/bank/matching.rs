//! Bank statement matching engine.
//!
//! Read-only. Pairs unreconciled bank transactions with unreconciled ledger
//! activity on the bank's linked account when amounts are exactly equal and the
//! dates fall within a window. Every candidate pair is ranked by
//! (tier, date delta, ledger line id, bank transaction id) and pairs are
//! assigned greedily one-to-one in that order. Losing candidates are kept as
//! alternatives so ambiguity is never dropped from the result.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tally_shared::types::{BankTransactionId, JournalEntryId, LedgerLineId};

use super::types::BankTransaction;
use crate::ledger::LedgerLine;

/// Confidence tier of a proposed pair. Lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Amount, date window and reference all agree.
    ExactReference,
    /// Amount and date window agree.
    AmountDateOnly,
}

/// Ledger activity on a bank's linked account, as seen by the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerActivity {
    /// Ledger line.
    pub line_id: LedgerLineId,
    /// Parent entry.
    pub entry_id: JournalEntryId,
    /// Accounting date.
    pub date: NaiveDate,
    /// `debit - credit` (inflow positive).
    pub amount: Decimal,
    /// Entry reference.
    pub reference: Option<String>,
}

impl From<&LedgerLine> for LedgerActivity {
    fn from(line: &LedgerLine) -> Self {
        Self {
            line_id: line.id,
            entry_id: line.entry_id,
            date: line.date,
            amount: line.signed_amount(),
            reference: line.reference.clone(),
        }
    }
}

/// A candidate pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// Bank side.
    pub bank_transaction_id: BankTransactionId,
    /// Ledger side.
    pub ledger_line_id: LedgerLineId,
    /// Confidence tier.
    pub tier: MatchTier,
    /// Absolute difference between the two dates, in days.
    pub date_delta_days: u32,
}

impl MatchCandidate {
    fn rank(&self) -> (MatchTier, u32, LedgerLineId, BankTransactionId) {
        (
            self.tier,
            self.date_delta_days,
            self.ledger_line_id,
            self.bank_transaction_id,
        )
    }

    fn shares_side_with(&self, other: &Self) -> bool {
        self.bank_transaction_id == other.bank_transaction_id
            || self.ledger_line_id == other.ledger_line_id
    }
}

/// The top-ranked pairing for a bank transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchProposal {
    /// The chosen pair.
    pub candidate: MatchCandidate,
    /// Every other candidate sharing either side, best first.
    pub alternatives: Vec<MatchCandidate>,
}

/// A bank transaction whose candidates were all taken by better-ranked pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestedTransaction {
    /// The bank transaction.
    pub bank_transaction_id: BankTransactionId,
    /// Its candidates, best first.
    pub candidates: Vec<MatchCandidate>,
}

/// Advisory matching result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSuggestions {
    /// One proposal per assigned bank transaction, ordered by bank transaction id.
    pub proposals: Vec<MatchProposal>,
    /// Bank transactions with candidates but no assignment.
    pub contested: Vec<ContestedTransaction>,
    /// Bank transactions with no candidate at all.
    pub unmatched: Vec<BankTransactionId>,
    /// Ledger lines with no candidate at all.
    pub unmatched_ledger_lines: Vec<LedgerLineId>,
}

/// Stateless matching engine.
pub struct MatchingEngine;

impl MatchingEngine {
    /// Proposes pairings between bank transactions and ledger activity.
    ///
    /// Reconciled items on either side are ignored.
    #[must_use]
    pub fn suggest(
        transactions: &[BankTransaction],
        activity: &[LedgerActivity],
        window_days: u32,
    ) -> MatchSuggestions {
        let mut by_amount: HashMap<Decimal, Vec<&LedgerActivity>> = HashMap::new();
        for line in activity {
            by_amount.entry(line.amount.normalize()).or_default().push(line);
        }

        let mut open_transactions: Vec<&BankTransaction> =
            transactions.iter().filter(|t| !t.is_reconciled()).collect();
        open_transactions.sort_by_key(|t| t.id);

        let mut candidates = Vec::new();
        for txn in &open_transactions {
            let Some(lines) = by_amount.get(&txn.amount.normalize()) else {
                continue;
            };
            for line in lines {
                let delta = (txn.date - line.date).num_days().unsigned_abs();
                if delta > u64::from(window_days) {
                    continue;
                }
                candidates.push(MatchCandidate {
                    bank_transaction_id: txn.id,
                    ledger_line_id: line.line_id,
                    tier: tier_for(txn.reference.as_deref(), line.reference.as_deref()),
                    date_delta_days: u32::try_from(delta).unwrap_or(u32::MAX),
                });
            }
        }
        candidates.sort_by_key(MatchCandidate::rank);

        let mut taken_banks = HashSet::new();
        let mut taken_lines = HashSet::new();
        let mut chosen = Vec::new();
        for candidate in &candidates {
            if taken_banks.contains(&candidate.bank_transaction_id)
                || taken_lines.contains(&candidate.ledger_line_id)
            {
                continue;
            }
            taken_banks.insert(candidate.bank_transaction_id);
            taken_lines.insert(candidate.ledger_line_id);
            chosen.push(*candidate);
        }

        let mut proposals: Vec<MatchProposal> = chosen
            .into_iter()
            .map(|candidate| MatchProposal {
                alternatives: candidates
                    .iter()
                    .filter(|c| **c != candidate && c.shares_side_with(&candidate))
                    .copied()
                    .collect(),
                candidate,
            })
            .collect();
        proposals.sort_by_key(|p| p.candidate.bank_transaction_id);

        let mut contested = Vec::new();
        let mut unmatched = Vec::new();
        for txn in &open_transactions {
            if taken_banks.contains(&txn.id) {
                continue;
            }
            let own: Vec<MatchCandidate> = candidates
                .iter()
                .filter(|c| c.bank_transaction_id == txn.id)
                .copied()
                .collect();
            if own.is_empty() {
                unmatched.push(txn.id);
            } else {
                contested.push(ContestedTransaction {
                    bank_transaction_id: txn.id,
                    candidates: own,
                });
            }
        }

        let lines_with_candidates: HashSet<LedgerLineId> =
            candidates.iter().map(|c| c.ledger_line_id).collect();
        let mut unmatched_ledger_lines: Vec<LedgerLineId> = activity
            .iter()
            .map(|a| a.line_id)
            .filter(|id| !lines_with_candidates.contains(id))
            .collect();
        unmatched_ledger_lines.sort();

        debug!(
            transactions = open_transactions.len(),
            ledger_lines = activity.len(),
            candidates = candidates.len(),
            proposals = proposals.len(),
            contested = contested.len(),
            unmatched = unmatched.len(),
            "Computed match suggestions"
        );

        MatchSuggestions {
            proposals,
            contested,
            unmatched,
            unmatched_ledger_lines,
        }
    }
}

fn tier_for(bank_reference: Option<&str>, ledger_reference: Option<&str>) -> MatchTier {
    match (bank_reference.map(str::trim), ledger_reference.map(str::trim)) {
        (Some(a), Some(b)) if !a.is_empty() && a == b => MatchTier::ExactReference,
        _ => MatchTier::AmountDateOnly,
    }
}
