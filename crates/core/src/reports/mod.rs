//! Trial balance and income reporting.

pub mod service;
pub mod types;


pub use service::ReportService;
pub use types::*;
