//! Core ledger logic for Tally.
//!
//! This crate contains pure business logic with ZERO storage dependencies.
//! Domain types, validation rules and calculations live here; `tally-db`
//! executes them inside atomic units of work.
//!
//! # Modules
//!
//! - `account` - Chart of accounts, hierarchy and balance arithmetic
//! - `ledger` - Double-entry posting validation and reversals
//! - `fiscal` - Fiscal calendar and the period close/reopen discipline
//! - `reports` - Trial balance and income summary
//! - `bank` - Statement matching and reconciliation sessions
//! - `closing` - Year-end closing plan
//! - `clock`, `events` - Collaborator seams

pub mod account;
pub mod bank;
pub mod clock;
pub mod closing;
pub mod error;
pub mod events;
pub mod fiscal;
pub mod ledger;
pub mod reports;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{LedgerError, LedgerResult};
pub use events::{EventSink, LedgerEvent, RecordingEventSink, TracingEventSink};
