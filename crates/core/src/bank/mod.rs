//! Bank accounts, statement matching and reconciliation sessions.

pub mod matching;
pub mod reconciliation;
pub mod types;

#[cfg(test)]
mod matching_props;

pub use matching::{
    ContestedTransaction, LedgerActivity, MatchCandidate, MatchProposal, MatchSuggestions,
    MatchTier, MatchingEngine,
};
pub use reconciliation::{MatchPair, MatchedPair, Reconciliation, ReconciliationStatus};
pub use types::{BankAccount, BankTransaction, RegisterBankAccountInput, StatementLineInput};
