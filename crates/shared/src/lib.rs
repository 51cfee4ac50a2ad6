//! Shared types and configuration for Tally.
//!
//! This crate provides common building blocks used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Configuration management
//! - Telemetry (tracing subscriber) bootstrap

pub mod config;
pub mod telemetry;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, LedgerConfig, LoggingConfig};
