//! Double-entry posting logic.
//!
//! - Entry and line types
//! - Validation of balanced entries
//! - Reversing entries

pub mod reversal;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use reversal::{reversal_description, reversing_lines};
pub use service::{AccountInfo, LedgerService};
pub use types::{
    EntrySource, JournalEntry, JournalEntryInput, LedgerLine, LedgerLineInput, PostedEntry,
    PostingTotals,
};
